// tests/pacing_tests.rs

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use snowrake_core::models::config::CallPolicy;
use snowrake_core::pacing::{call_with_retries, Pacer};
use snowrake_core::Error;

#[tokio::test(start_paused = true)]
async fn test_first_call_is_immediate() {
    let policy = CallPolicy::default();
    let mut pacer = Pacer::new(&policy);
    let t0 = Instant::now();

    pacer.pace().await;
    assert_eq!(t0.elapsed(), Duration::ZERO);

    pacer.pace().await;
    assert_eq!(t0.elapsed(), Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_consecutive_calls_keep_the_gap() {
    let policy = CallPolicy {
        call_gap_ms: 80,
        ..CallPolicy::default()
    };
    let mut pacer = Pacer::new(&policy);
    let t0 = Instant::now();

    for _ in 0..5 {
        pacer.pace().await;
    }

    // Four gaps between five calls.
    assert_eq!(t0.elapsed(), Duration::from_millis(320));
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_exhaust_the_budget() {
    let policy = CallPolicy {
        max_attempts: 3,
        retry_delay_ms: 100,
        ..CallPolicy::default()
    };
    let calls = AtomicU32::new(0);
    let t0 = Instant::now();

    let result: Result<(), Error> = call_with_retries(&policy, "always-down", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async {
            Err(Error::Api {
                status: 500,
                message: "boom".to_string(),
            })
        }
    })
    .await;

    assert!(matches!(result, Err(Error::Api { status: 500, .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // Two fixed delays between three attempts; none after the last.
    assert_eq!(t0.elapsed(), Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_non_retryable_failures_return_at_once() {
    let policy = CallPolicy::default();
    let calls = AtomicU32::new(0);
    let t0 = Instant::now();

    let result: Result<(), Error> = call_with_retries(&policy, "forbidden", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(Error::PermissionDenied("channel 9".to_string())) }
    })
    .await;

    assert!(matches!(result, Err(Error::PermissionDenied(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(t0.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_advice_is_honored() -> Result<(), Error> {
    let policy = CallPolicy::default();
    let calls = AtomicU32::new(0);
    let t0 = Instant::now();

    let got = call_with_retries(&policy, "throttled", || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                Err(Error::RateLimited {
                    retry_after: Some(Duration::from_secs(2)),
                })
            } else {
                Ok(7_u32)
            }
        }
    })
    .await?;

    assert_eq!(got, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(t0.elapsed(), Duration::from_secs(2));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_advice_is_capped() -> Result<(), Error> {
    // Default cap is sixty seconds; the upstream asks for an hour.
    let policy = CallPolicy::default();
    let calls = AtomicU32::new(0);
    let t0 = Instant::now();

    let got = call_with_retries(&policy, "very-throttled", || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                Err(Error::RateLimited {
                    retry_after: Some(Duration::from_secs(3600)),
                })
            } else {
                Ok("done")
            }
        }
    })
    .await?;

    assert_eq!(got, "done");
    assert_eq!(t0.elapsed(), Duration::from_secs(60));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_success_needs_no_waiting() -> Result<(), Error> {
    let policy = CallPolicy::default();
    let t0 = Instant::now();

    let got = call_with_retries(&policy, "healthy", || async { Ok(41_u32 + 1) }).await?;

    assert_eq!(got, 42);
    assert_eq!(t0.elapsed(), Duration::ZERO);
    Ok(())
}
