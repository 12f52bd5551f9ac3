//! Retrying waiter with exponential backoff.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::{sleep, Instant};

/// Overall budget for retries, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;
/// Delay before the first retry, in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 100;
/// Factor applied to the delay after every retry.
pub const DEFAULT_BACKOFF: f64 = 2.0;

/// How long and how often [`wait_until`] keeps retrying.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub timeout_ms: u64,
    pub interval_ms: u64,
    pub backoff: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            interval_ms: DEFAULT_INTERVAL_MS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Delay before retry number `retry` (zero-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.backoff.max(1.0).powi(retry as i32);
        Duration::from_millis((self.interval_ms as f64 * factor).round() as u64)
    }
}

/// Run `op` until it succeeds, `retry_on_fail` rejects an error, or the
/// policy's budget would be exceeded by the next delay.
///
/// The first attempt always runs. The budget only bounds the waiting between
/// attempts; an attempt in progress is never interrupted here.
pub async fn wait_until<T, E, F, Fut, P>(
    mut op: F,
    policy: &RetryPolicy,
    retry_on_fail: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let started = Instant::now();
    let budget = policy.timeout();
    let mut retry = 0;

    loop {
        let error = match op().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if !retry_on_fail(&error) {
            return Err(error);
        }

        let delay = policy.delay_for(retry);
        if started.elapsed() + delay >= budget {
            tracing::trace!("Retry budget of {:?} exhausted after {} attempts", budget, retry + 1);
            return Err(error);
        }

        tracing::trace!("Attempt {} failed, retrying in {:?}", retry + 1, delay);
        sleep(delay).await;
        retry += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio_test::{assert_err, assert_ok};

    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.timeout(), Duration::from_millis(3000));
        assert_eq!(policy.interval(), Duration::from_millis(100));
        assert_eq!(policy.backoff, 2.0);
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
    }

    #[test]
    fn test_backoff_below_one_is_constant() {
        let policy = RetryPolicy {
            backoff: 0.5,
            ..Default::default()
        };
        assert_eq!(policy.delay_for(3), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_policy_from_toml() {
        let policy: RetryPolicy = toml::from_str("timeout_ms = 500").unwrap();
        assert_eq!(policy.timeout_ms, 500);
        assert_eq!(policy.interval_ms, DEFAULT_INTERVAL_MS);
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let result: Result<u32, &str> =
            wait_until(|| async { Ok(7) }, &RetryPolicy::default(), |_| true).await;
        assert_eq!(assert_ok!(result), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let attempts = Arc::new(Mutex::new(0));

        let counter = attempts.clone();
        let result: Result<&str, &str> = wait_until(
            move || {
                let counter = counter.clone();
                async move {
                    let mut n = counter.lock().unwrap();
                    *n += 1;
                    if *n < 3 {
                        Err("not yet")
                    } else {
                        Ok("done")
                    }
                }
            },
            &RetryPolicy::default(),
            |_| true,
        )
        .await;

        assert_eq!(assert_ok!(result), "done");
        assert_eq!(*attempts.lock().unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_schedule_within_budget() {
        let times = Arc::new(Mutex::new(Vec::new()));
        let started = Instant::now();

        let recorded = times.clone();
        let result: Result<(), &str> = wait_until(
            move || {
                recorded.lock().unwrap().push(started.elapsed());
                async { Err("boom") }
            },
            &RetryPolicy::default(),
            |_| true,
        )
        .await;

        assert_eq!(assert_err!(result), "boom");

        // Attempts at 0, 100, 300, 700, 1500ms; the next delay (1600ms) would overrun 3000ms.
        let times = times.lock().unwrap();
        let gaps: Vec<u128> = times.windows(2).map(|w| (w[1] - w[0]).as_millis()).collect();
        assert_eq!(gaps.len(), 4);
        for (gap, expected) in gaps.iter().zip([100, 200, 400, 800]) {
            assert!(*gap >= expected && *gap <= expected + 2, "gap {gap}ms, expected {expected}ms");
        }
        assert!(started.elapsed() < Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_predicate_stops_retrying() {
        let attempts = Arc::new(Mutex::new(0));
        let started = Instant::now();

        let counter = attempts.clone();
        let result: Result<(), &str> = wait_until(
            move || {
                *counter.lock().unwrap() += 1;
                async { Err("cancelled") }
            },
            &RetryPolicy::default(),
            |e| *e != "cancelled",
        )
        .await;

        assert_err!(result);
        assert_eq!(*attempts.lock().unwrap(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
