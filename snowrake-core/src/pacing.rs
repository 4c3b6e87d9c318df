//! Call pacing and bounded retry for upstream fetches.
//!
//! Every network call a collector makes goes through here: `Pacer` keeps a
//! minimum gap between consecutive calls in one loop, and `call_with_retries`
//! runs a single call under the policy's retry budget.

use std::future::Future;

use tokio::time::sleep;
use tracing::warn;

use snowrake_common::models::config::CallPolicy;

use crate::Error;

/// Enforces the minimum gap between consecutive upstream calls.
/// The first call in a loop goes through immediately.
pub struct Pacer {
    gap: std::time::Duration,
    primed: bool,
}

impl Pacer {
    pub fn new(policy: &CallPolicy) -> Self {
        Self {
            gap: policy.call_gap(),
            primed: false,
        }
    }

    /// Waits out the inter-call gap, then records that a call is being made.
    pub async fn pace(&mut self) {
        if self.primed {
            sleep(self.gap).await;
        }
        self.primed = true;
    }
}

/// Runs `op` under the policy's retry budget. Non-retryable failures
/// (permission, not-found) are returned after the first attempt so callers
/// can skip a channel instead of hammering it. Rate-limit responses wait
/// out the server-advised delay, capped by the policy; other transient
/// failures wait the fixed retry delay.
pub async fn call_with_retries<T, F, Fut>(
    policy: &CallPolicy,
    label: &str,
    mut op: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.retryable() => return Err(e),
            Err(e) if attempt >= policy.max_attempts => {
                warn!("{label}: giving up after {attempt} attempts => {e}");
                return Err(e);
            }
            Err(e) => {
                let delay = match e.retry_after() {
                    Some(advised) => advised.min(policy.max_retry_after()),
                    None => policy.retry_delay(),
                };
                warn!(
                    "{label}: attempt {attempt}/{} failed => {e}; retrying in {delay:?}",
                    policy.max_attempts
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
