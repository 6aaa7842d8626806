//! Exponential backoff for background jobs.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Tells the retry loop whether a failure may go away on its own.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for crate::errors::ServiceError {
    fn is_transient(&self) -> bool { crate::errors::ServiceError::is_transient(self) }
}

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
    backoff_max: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration, backoff_max: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), backoff_base, backoff_max }
    }

    pub fn from_config(cfg: &configs::MediaConfig) -> Self {
        Self::new(
            cfg.confirm_max_attempts,
            Duration::from_millis(cfg.confirm_backoff_base_ms),
            Duration::from_millis(cfg.confirm_backoff_max_ms),
        )
    }

    pub fn max_attempts(&self) -> u32 { self.max_attempts }

    /// Delay before retry number `attempt` (1-based): base * 2^(attempt-1), capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2_u32.saturating_pow(attempt - 1);
        self.backoff_base.saturating_mul(factor).min(self.backoff_max)
    }

    pub async fn wait_before_retry(&self, attempt: u32) {
        let d = self.backoff(attempt);
        debug!("Retrying in {:?} (attempt {})", d, attempt);
        sleep(d).await;
    }
}

pub async fn retry_with_policy<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display + Transient,
{
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            policy.wait_before_retry(attempt).await;
        }
        match operation().await {
            Ok(v) => {
                if attempt > 0 {
                    debug!("Operation succeeded after {} retries", attempt);
                }
                return Ok(v);
            }
            Err(e) => {
                warn!("Operation failed on attempt {}: {}", attempt + 1, e);
                attempt += 1;
                if attempt >= policy.max_attempts() || !e.is_transient() {
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct TestError { transient: bool }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "transient={}", self.transient) }
    }

    impl Transient for TestError {
        fn is_transient(&self) -> bool { self.transient }
    }

    fn fast(max: u32) -> RetryPolicy { RetryPolicy::new(max, Duration::from_millis(1), Duration::from_millis(5)) }

    #[test]
    fn backoff_doubles_and_caps() {
        let p = RetryPolicy::new(10, Duration::from_millis(100), Duration::from_millis(500));
        assert_eq!(p.backoff(0), Duration::ZERO);
        assert_eq!(p.backoff(1), Duration::from_millis(100));
        assert_eq!(p.backoff(2), Duration::from_millis(200));
        assert_eq!(p.backoff(3), Duration::from_millis(400));
        assert_eq!(p.backoff(4), Duration::from_millis(500));
        assert_eq!(p.backoff(40), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        let res = retry_with_policy(&fast(3), || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 { Err(TestError { transient: true }) } else { Ok(42) }
            }
        })
        .await;
        assert_eq!(res.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        let res: Result<(), _> = retry_with_policy(&fast(2), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(TestError { transient: true })
            }
        })
        .await;
        assert!(res.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        let res: Result<(), _> = retry_with_policy(&fast(5), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(TestError { transient: false })
            }
        })
        .await;
        assert!(res.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
