/*!
 * Deadline Configuration
 *
 * The immutable budget a run is measured against, and its serialized form.
 */

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::sync::Arc;
use std::time::Duration;

/// Label used in traces when none is given
pub const DEFAULT_LABEL: &str = "deadline";

/// Deadline/timeout resiliency pattern
///
/// Holds only the budget and a trace label. All per-run state lives inside
/// [`Deadline::run`] / [`Deadline::run_async`], so one value can be cloned
/// or shared across threads and used for any number of concurrent runs.
///
/// A zero budget means "always time out": runs return
/// [`DeadlineError::TimedOut`](crate::DeadlineError::TimedOut) at once and
/// never start the work.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deadline {
    #[serde(rename = "timeout_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    timeout: Duration,
    label: Arc<str>,
}

impl Deadline {
    /// Create a deadline with the given budget
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            label: Arc::from(DEFAULT_LABEL),
        }
    }

    /// Set the label reported on this deadline's trace spans
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = label.into();
        self
    }

    #[inline(always)]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[inline(always)]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the budget is already spent before any work starts
    #[inline(always)]
    pub fn is_expired_budget(&self) -> bool {
        self.timeout.is_zero()
    }
}

/// Serialized deadline configuration
///
/// `timeout_ms` is signed so callers computing budgets from remaining time
/// can pass a negative value; anything `<= 0` becomes a zero budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeadlineConfig {
    pub timeout_ms: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl DeadlineConfig {
    pub fn new(timeout_ms: i64) -> Self {
        Self {
            timeout_ms,
            label: None,
        }
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.label.as_deref() {
            Some(label) if label.trim().is_empty() => Err(ConfigError::EmptyLabel),
            _ => Ok(()),
        }
    }

    /// Budget with non-positive values clamped to zero
    pub fn timeout(&self) -> Duration {
        if self.timeout_ms <= 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(self.timeout_ms as u64)
        }
    }
}

impl TryFrom<DeadlineConfig> for Deadline {
    type Error = ConfigError;

    fn try_from(config: DeadlineConfig) -> Result<Self, Self::Error> {
        config.validate()?;
        let deadline = Deadline::new(config.timeout());
        Ok(match config.label {
            Some(label) => deadline.with_label(label),
            None => deadline,
        })
    }
}

impl From<&Deadline> for DeadlineConfig {
    fn from(deadline: &Deadline) -> Self {
        Self {
            timeout_ms: i64::try_from(deadline.timeout.as_millis()).unwrap_or(i64::MAX),
            label: Some(deadline.label.to_string()),
        }
    }
}
