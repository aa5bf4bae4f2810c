/*!
 * Deadline Runner
 *
 * Bounded-wait execution of work that cannot be preempted:
 * - Config: the immutable budget and its serialized form
 * - Cancel: the cooperative stop signal handed to work
 * - Runner: blocking flavour on a dedicated thread
 * - Async runner: tokio flavour on a spawned task
 */

mod async_runner;
pub mod cancel;
pub mod config;
mod runner;

pub use cancel::{CancelSignal, CancelSource};
pub use config::{Deadline, DeadlineConfig, DEFAULT_LABEL};
