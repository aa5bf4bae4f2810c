/*!
 * Property Tests
 * Outcome pass-through and budget clamping over generated inputs
 */

use deadline::{Deadline, DeadlineConfig, DeadlineError};
use proptest::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("work failed with code {0}")]
struct CodeError(u16);

proptest! {
    // Every case spawns a worker thread
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_success_value_unchanged(value in any::<i64>()) {
        let dl = Deadline::new(Duration::from_secs(5));
        prop_assert_eq!(dl.run(move |_| Ok::<_, CodeError>(value)).unwrap(), value);
    }

    #[test]
    fn prop_work_error_unchanged(code in any::<u16>()) {
        let dl = Deadline::new(Duration::from_secs(5));
        let err = dl.run(move |_| Err::<(), _>(CodeError(code))).unwrap_err();
        prop_assert_eq!(err.into_work_error(), Some(CodeError(code)));
    }

    #[test]
    fn prop_non_positive_budget_times_out_without_work(timeout_ms in i64::MIN..=0) {
        let dl = Deadline::try_from(DeadlineConfig::new(timeout_ms)).unwrap();
        let started = Arc::new(AtomicBool::new(false));
        let started_clone = started.clone();

        let result = dl.run(move |_| {
            started_clone.store(true, Ordering::SeqCst);
            Ok::<(), CodeError>(())
        });

        prop_assert!(matches!(
            result,
            Err(DeadlineError::TimedOut { timeout }) if timeout == Duration::ZERO
        ), "expected TimedOut with zero timeout");
        prop_assert!(!started.load(Ordering::SeqCst));
    }

    #[test]
    fn prop_positive_budget_preserved(timeout_ms in 1i64..=86_400_000) {
        let dl = Deadline::try_from(DeadlineConfig::new(timeout_ms)).unwrap();
        prop_assert_eq!(dl.timeout(), Duration::from_millis(timeout_ms as u64));
        prop_assert!(!dl.is_expired_budget());
    }
}
