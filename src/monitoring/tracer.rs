/*!
 * Run Tracing
 * Structured tracing for deadline runs using the tracing crate
 *
 * Features:
 * - Run ID generation for correlating caller and worker events
 * - JSON-formatted logs for structured parsing
 * - One span per run, entered by both the caller and the worker
 */

use std::time::{Duration, Instant};
use tracing::{debug, error, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Initialize structured tracing
///
/// Honours `RUST_LOG` (default: info). Returns `false` if a global
/// subscriber was already installed, so this is safe to call from every test.
pub fn init_tracing(json: bool) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        // JSON output for production/parsing
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
            .is_ok()
    } else {
        // Human-readable output for development
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    }
}

/// Generate a unique run ID
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// How a run ended, as seen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed,
    TimedOut,
    Abandoned,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
            Self::Abandoned => "abandoned",
        }
    }
}

/// Span covering one deadline run
pub struct RunSpan {
    span: Span,
    start: Instant,
    run_id: String,
}

impl RunSpan {
    pub fn new(label: &str, timeout: Duration) -> Self {
        let run_id = generate_run_id();

        let span = span!(
            Level::DEBUG,
            "deadline_run",
            run_id = %run_id,
            label = label,
            timeout_ms = timeout.as_millis() as u64,
            outcome = tracing::field::Empty,
            elapsed_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            run_id,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Handle for the worker side to enter or instrument with
    pub fn span(&self) -> Span {
        self.span.clone()
    }

    /// Record how the run ended and emit the matching event
    pub fn finish(&self, outcome: RunOutcome) {
        let elapsed = self.start.elapsed();
        let _entered = self.span.enter();

        self.span.record("outcome", outcome.as_str());
        self.span.record("elapsed_us", elapsed.as_micros() as u64);

        match outcome {
            RunOutcome::Completed | RunOutcome::Failed => {
                debug!(
                    run_id = %self.run_id,
                    outcome = outcome.as_str(),
                    elapsed_us = elapsed.as_micros() as u64,
                    "deadline run finished"
                );
            }
            RunOutcome::TimedOut => {
                warn!(
                    run_id = %self.run_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "deadline expired, worker signalled to stop"
                );
            }
            RunOutcome::Abandoned => {
                error!(
                    run_id = %self.run_id,
                    "worker dropped its result channel without handing off"
                );
            }
        }
    }
}
