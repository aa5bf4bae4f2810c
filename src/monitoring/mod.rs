/*!
 * Run Monitoring
 * Structured tracing for deadline runs
 */

mod tracer;

pub use tracer::{generate_run_id, init_tracing, RunOutcome, RunSpan};
