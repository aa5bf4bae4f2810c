/*!
 * Blocking Deadline Runner
 *
 * Runs work on its own OS thread and waits for it with a bounded
 * `recv_deadline` on a rendezvous channel.
 *
 * ## Execution
 *
 * Each run creates two channels and throws them away on return:
 * - a zero-capacity result channel: the worker blocks in `send` until the
 *   caller takes the value, so a hand-off either fully happens or not at all
 * - a cancellation pair: the caller drops its side on timeout
 *
 * The worker finishes by racing the hand-off against cancellation in a
 * `flume::Selector`. Whichever side is ready first wins, so a worker that
 * finishes after the caller gave up exits instead of blocking forever.
 */

use super::cancel::{self, CancelSignal};
use super::config::Deadline;
use crate::errors::DeadlineError;
use crate::monitoring::{RunOutcome, RunSpan};
use flume::{RecvTimeoutError, Selector, Sender};
use std::thread;
use std::time::Instant;
use tracing::{debug, error};

const WORKER_THREAD_NAME: &str = "deadline-worker";

impl Deadline {
    /// Run `work` on a background thread, waiting at most `timeout` for it
    ///
    /// `work` receives a [`CancelSignal`] that fires when the deadline
    /// passes. Returns:
    ///
    /// - `Ok(T)` / `Err(DeadlineError::Work(E))` if the work handed off its
    ///   outcome in time, unchanged
    /// - `Err(DeadlineError::TimedOut)` as soon as the budget elapses,
    ///   without waiting for the worker
    ///
    /// # Limitation
    ///
    /// The worker thread is never killed. Work that ignores the signal keeps
    /// running (and holding its thread) after this returns `TimedOut`, and
    /// work that never returns leaks its thread for good.
    ///
    /// # Example
    ///
    /// ```rust
    /// use deadline::{Deadline, DeadlineError};
    /// use std::time::Duration;
    ///
    /// let dl = Deadline::new(Duration::from_secs(1));
    ///
    /// let result = dl.run(|stop| {
    ///     // do something possibly slow, giving up if `stop` fires
    ///     if stop.is_cancelled() {
    ///         return Err("gave up");
    ///     }
    ///     Ok(42)
    /// });
    ///
    /// match result {
    ///     Ok(value) => assert_eq!(value, 42),
    ///     Err(DeadlineError::TimedOut { .. }) => { /* took too long */ }
    ///     Err(other) => panic!("{}", other),
    /// }
    /// ```
    pub fn run<T, E, F>(&self, work: F) -> Result<T, DeadlineError<E>>
    where
        F: FnOnce(CancelSignal) -> Result<T, E> + Send + 'static,
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
        let span = run.span();

        let spawned = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let _entered = span.enter();
                let value = work(signal.clone());
                hand_off(&result_tx, value, &signal);
            });

        if let Err(e) = spawned {
            error!(run_id = %run.run_id(), error = %e, "could not spawn deadline worker");
            return Err(DeadlineError::Spawn(e));
        }

        let received = match Instant::now().checked_add(self.timeout()) {
            Some(deadline) => result_rx.recv_deadline(deadline),
            // Budget runs past the end of the clock, so only the worker can end the wait
            None => result_rx
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(Ok(value)) => {
                run.finish(RunOutcome::Completed);
                Ok(value)
            }
            Ok(Err(e)) => {
                run.finish(RunOutcome::Failed);
                Err(DeadlineError::Work(e))
            }
            Err(RecvTimeoutError::Timeout) => {
                source.cancel();
                run.finish(RunOutcome::TimedOut);
                Err(DeadlineError::timed_out(self.timeout()))
            }
            Err(RecvTimeoutError::Disconnected) => {
                run.finish(RunOutcome::Abandoned);
                Err(DeadlineError::Abandoned)
            }
        }
    }
}

/// Deliver `value` to the caller unless it has already given up
///
/// Returns whether the caller took the value.
fn hand_off<V>(result_tx: &Sender<V>, value: V, signal: &CancelSignal) -> bool
where
    V: Send + 'static,
{
    let delivered = Selector::new()
        .send(result_tx, value, |sent| sent.is_ok())
        .recv(signal.receiver(), |_| false)
        .wait();

    if !delivered {
        debug!("caller stopped waiting, dropping worker result");
    }
    delivered
}
