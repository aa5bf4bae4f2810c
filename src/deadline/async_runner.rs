/*!
 * Async Deadline Runner
 * Same race as the blocking runner, with the work on a tokio task
 */

use super::cancel::{self, CancelSignal};
use super::config::Deadline;
use crate::errors::DeadlineError;
use crate::monitoring::{RunOutcome, RunSpan};
use std::future::Future;
use tracing::{debug, Instrument};

impl Deadline {
    /// Spawn the future built by `work` and wait at most `timeout` for it
    ///
    /// Outcomes match [`Deadline::run`]. Must be awaited inside a tokio
    /// runtime.
    ///
    /// Dropping the returned future before it resolves counts as giving up:
    /// the signal fires just as it does on timeout. The spawned task is never
    /// aborted, so work that ignores the signal runs on after the caller
    /// has moved on.
    ///
    /// `work` itself is called on the caller before anything is spawned, and
    /// the clock starts only after it returns. Synchronous code in the
    /// closure body, ahead of the future it returns, runs outside the
    /// deadline; keep slow work inside the `async` block.
    pub async fn run_async<T, E, F, Fut>(&self, work: F) -> Result<T, DeadlineError<E>>
    where
        F: FnOnce(CancelSignal) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let run = RunSpan::new(self.label(), self.timeout());

        if self.is_expired_budget() {
            run.finish(RunOutcome::TimedOut);
            return Err(DeadlineError::timed_out(self.timeout()));
        }

        let (result_tx, result_rx) = flume::bounded(0);
        let (source, signal) = cancel::pair();
        let task = work(signal.clone());

        tokio::spawn(
            async move {
                let value = task.await;

                let delivered = tokio::select! {
                    sent = result_tx.send_async(value) => sent.is_ok(),
                    _ = signal.cancelled() => false,
                };

                if !delivered {
                    debug!("caller stopped waiting, dropping worker result");
                }
            }
            .instrument(run.span()),
        );

        tokio::select! {
            outcome = result_rx.recv_async() => match outcome {
                Ok(Ok(value)) => {
                    run.finish(RunOutcome::Completed);
                    Ok(value)
                }
                Ok(Err(e)) => {
                    run.finish(RunOutcome::Failed);
                    Err(DeadlineError::Work(e))
                }
                Err(_) => {
                    run.finish(RunOutcome::Abandoned);
                    Err(DeadlineError::Abandoned)
                }
            },
            _ = tokio::time::sleep(self.timeout()) => {
                source.cancel();
                run.finish(RunOutcome::TimedOut);
                Err(DeadlineError::timed_out(self.timeout()))
            }
        }
    }
}
