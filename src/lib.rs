/*!
 * Deadline
 * The deadline (timeout) resiliency pattern with cooperative cancellation
 *
 * Work runs in the background while the caller waits at most a fixed
 * budget. On timeout the caller gets [`DeadlineError::TimedOut`] straight
 * away and the work gets a [`CancelSignal`] it is expected to honour.
 */

pub mod deadline;
pub mod errors;
pub mod monitoring;

// Re-exports
pub use deadline::{cancel, CancelSignal, CancelSource, Deadline, DeadlineConfig, DEFAULT_LABEL};
pub use errors::{ConfigError, DeadlineError};
pub use monitoring::init_tracing;
