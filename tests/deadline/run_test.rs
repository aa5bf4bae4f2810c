/*!
 * Blocking Runner Tests
 * Outcome selection, cooperative exit and isolation between runs
 */

use deadline::{init_tracing, CancelSignal, Deadline, DeadlineError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("foo")]
struct Foo;

fn setup() -> Deadline {
    init_tracing(false);
    Deadline::new(Duration::from_millis(10))
}

fn takes_five_millis(_stop: CancelSignal) -> Result<(), Foo> {
    thread::sleep(Duration::from_millis(5));
    Ok(())
}

fn takes_twenty_millis(_stop: CancelSignal) -> Result<(), Foo> {
    thread::sleep(Duration::from_millis(20));
    Ok(())
}

fn returns_error(_stop: CancelSignal) -> Result<(), Foo> {
    Err(Foo)
}

#[test]
fn test_fast_work_completes() {
    let dl = setup();
    assert!(dl.run(takes_five_millis).is_ok());
}

#[test]
fn test_slow_work_times_out() {
    let dl = setup();
    let result = dl.run(takes_twenty_millis);
    assert!(matches!(
        result,
        Err(DeadlineError::TimedOut { timeout }) if timeout == Duration::from_millis(10)
    ));
}

#[test]
fn test_work_error_passes_through() {
    let dl = setup();
    let err = dl.run(returns_error).unwrap_err();
    assert_eq!(err.to_string(), "foo");
    assert_eq!(err.into_work_error(), Some(Foo));
}

#[test]
fn test_work_error_with_large_budget() {
    init_tracing(false);
    let dl = Deadline::new(Duration::from_secs(1));

    let start = Instant::now();
    let err = dl
        .run(|_| Err::<(), _>(std::io::Error::new(std::io::ErrorKind::Other, "foo")))
        .unwrap_err();

    assert!(err.is_work_error());
    assert_eq!(err.work_error().map(|e| e.to_string()).as_deref(), Some("foo"));
    assert!(start.elapsed() < Duration::from_millis(500));
}

#[test]
fn test_polling_batch_times_out_and_stops() {
    let dl = setup();
    let iterations = Arc::new(AtomicU32::new(0));
    let iterations_clone = iterations.clone();
    let (done_tx, done_rx) = flume::bounded(1);

    let result = dl.run(move |stop| {
        while !stop.is_cancelled() {
            iterations_clone.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(4));
        }
        let _ = done_tx.send(());
        Err::<(), _>(Foo)
    });

    assert!(result.unwrap_err().is_timeout());
    let at_timeout = iterations.load(Ordering::SeqCst);

    done_rx
        .recv_timeout(Duration::from_secs(1))
        .expect("batch loop should exit once cancelled");
    let total = iterations.load(Ordering::SeqCst);

    // 4ms steps under a 10ms budget: about 3 steps, at most one started after the timeout
    assert!((1..=10).contains(&total), "ran {} iterations", total);
    assert!(total - at_timeout <= 1, "{} iterations after timeout", total - at_timeout);
}

#[test]
fn test_cooperative_worker_exits_after_timeout() {
    let dl = setup();
    let (done_tx, done_rx) = flume::bounded(1);

    let result = dl.run(move |stop| {
        stop.wait();
        let _ = done_tx.send(());
        Ok::<(), Foo>(())
    });

    assert!(result.unwrap_err().is_timeout());
    done_rx
        .recv_timeout(Duration::from_secs(1))
        .expect("worker should observe cancellation");
}

#[test]
fn test_wait_is_bounded_when_work_ignores_signal() {
    init_tracing(false);
    let dl = Deadline::new(Duration::from_millis(20));
    let start = Instant::now();

    let result = dl.run(|_| {
        thread::sleep(Duration::from_secs(2));
        Ok::<(), Foo>(())
    });

    assert!(result.unwrap_err().is_timeout());
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_cancellable_sleep_in_work() {
    init_tracing(false);
    let dl = Deadline::new(Duration::from_millis(20));
    let (done_tx, done_rx) = flume::bounded(1);

    let result = dl.run(move |stop| {
        let cut_short = stop.sleep(Duration::from_secs(30));
        let _ = done_tx.send(cut_short);
        Ok::<(), Foo>(())
    });

    assert!(result.unwrap_err().is_timeout());
    assert_eq!(done_rx.recv_timeout(Duration::from_secs(1)), Ok(true));
}

#[test]
fn test_shared_deadline_concurrent_runs() {
    init_tracing(false);
    let dl = Arc::new(Deadline::new(Duration::from_millis(200)).with_label("shared"));

    let handles: Vec<_> = (0..8u32)
        .map(|i| {
            let dl = Arc::clone(&dl);
            thread::spawn(move || {
                let result = dl.run(move |stop| {
                    if i % 2 == 1 {
                        stop.wait();
                    }
                    Ok::<u32, Foo>(i)
                });
                (i, result)
            })
        })
        .collect();

    for handle in handles {
        let (i, result) = handle.join().unwrap();
        if i % 2 == 1 {
            assert!(result.unwrap_err().is_timeout(), "run {} should time out", i);
        } else {
            assert_eq!(result.unwrap(), i);
        }
    }
}

#[test]
fn test_deadline_reusable_after_timeout() {
    let dl = setup();

    assert!(dl.run(takes_twenty_millis).unwrap_err().is_timeout());
    assert!(dl.run(takes_five_millis).is_ok());
    assert_eq!(dl.run(returns_error).unwrap_err().into_work_error(), Some(Foo));
}
