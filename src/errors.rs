/*!
 * Error Types
 * Run outcomes and configuration failures with thiserror and miette support
 */

use miette::Diagnostic;
use std::time::Duration;
use thiserror::Error;

/// Error returned from a deadline run
///
/// Generic over the work function's own error type `E`, which is carried
/// verbatim in [`DeadlineError::Work`]. Callers always get exactly one of
/// these per run, or the work's `Ok` value.
#[derive(Debug, Error)]
pub enum DeadlineError<E> {
    /// Budget elapsed before the work handed off its outcome
    ///
    /// Carries the configured budget at full precision, so a sub-millisecond
    /// budget stays distinguishable from a zero one.
    #[error("timed out waiting for function to finish (timeout: {timeout:?})")]
    TimedOut { timeout: Duration },

    /// Work function returned its own error
    #[error("{0}")]
    Work(#[source] E),

    /// Worker ended without handing off an outcome (panic or runtime shutdown)
    #[error("worker exited without handing off a result")]
    Abandoned,

    /// OS refused to create the worker thread
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl<E> DeadlineError<E> {
    #[cold]
    pub(crate) fn timed_out(timeout: Duration) -> Self {
        Self::TimedOut { timeout }
    }

    /// Check if this is a timeout error
    #[inline(always)]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Check if this is the work function's own error
    #[inline(always)]
    pub fn is_work_error(&self) -> bool {
        matches!(self, Self::Work(_))
    }

    /// Borrow the work error, if any
    pub fn work_error(&self) -> Option<&E> {
        match self {
            Self::Work(e) => Some(e),
            _ => None,
        }
    }

    /// Take the work error, if any
    pub fn into_work_error(self) -> Option<E> {
        match self {
            Self::Work(e) => Some(e),
            _ => None,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("Invalid deadline configuration: {0}")]
    #[diagnostic(
        code(deadline::invalid_config),
        help("Expected JSON like {{\"timeout_ms\": 250, \"label\": \"fetch\"}}.")
    )]
    Parse(#[from] serde_json::Error),

    #[error("Deadline label must not be empty")]
    #[diagnostic(
        code(deadline::empty_label),
        help("Omit the label to use the default, or give it a name for log correlation.")
    )]
    EmptyLabel,
}
