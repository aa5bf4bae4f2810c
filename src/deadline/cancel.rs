/*!
 * Cooperative Cancellation
 *
 * A one-shot stop signal handed to work running under a deadline.
 *
 * The signal is a `flume` channel on which nothing is ever sent: firing it
 * means dropping the only sender, so every receiver observes disconnection.
 * That makes the signal usable from polling loops, blocking waits, async
 * code and `flume::Selector` alike.
 *
 * Cancellation is advisory. Nothing here stops a thread or task; work has to
 * look at the signal and return on its own.
 */

use flume::{Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// Create a connected source/signal pair
pub fn pair() -> (CancelSource, CancelSignal) {
    let (tx, rx) = flume::bounded(0);
    (CancelSource { _tx: tx }, CancelSignal { rx })
}

/// Owning side of a cancellation pair
///
/// Fires on [`CancelSource::cancel`] or when dropped.
#[derive(Debug)]
pub struct CancelSource {
    _tx: Sender<()>,
}

impl CancelSource {
    /// Fire the signal for every clone of the paired [`CancelSignal`]
    #[inline]
    pub fn cancel(self) {
        drop(self);
    }
}

/// Observing side of a cancellation pair, passed to work functions
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: Receiver<()>,
}

impl CancelSignal {
    /// Non-blocking check
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.rx.is_disconnected()
    }

    /// Sleep for `duration` or until cancelled, whichever comes first
    ///
    /// Returns `true` if the sleep was cut short by cancellation. Use this in
    /// place of `std::thread::sleep` inside looping work so a timed-out run
    /// stops within one step.
    pub fn sleep(&self, duration: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(duration) else {
            // Past the end of the clock: nothing but cancellation can end it
            self.wait();
            return true;
        };

        match self.rx.recv_deadline(deadline) {
            Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
            // Nothing is ever sent on the channel
            Ok(()) => self.is_cancelled(),
        }
    }

    /// Block the current thread until cancelled
    pub fn wait(&self) {
        while self.rx.recv().is_ok() {}
    }

    /// Resolve once cancelled
    pub async fn cancelled(&self) {
        while self.rx.recv_async().await.is_ok() {}
    }

    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}
