use crate::error::{ApiError, Result};
use fathom_protocol::ErrorKind;
use log::warn;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Backoff schedule for transient API failures.
///
/// Rate limiting gets its own (larger) retry budget; server and network failures share another.
/// Every other error kind is surfaced immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub rate_limit_retries: u32,
    pub transient_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            rate_limit_retries: 3,
            transient_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn budget_for(&self, err: &ApiError) -> u32 {
        match err.kind() {
            ErrorKind::RateLimited => self.rate_limit_retries,
            ErrorKind::UpstreamServer | ErrorKind::Network => self.transient_retries,
            _ => 0,
        }
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped. A wait the
    /// remote asked for is honoured when it is longer, within the same cap.
    pub fn delay_for(&self, attempt: u32, err: &ApiError) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);
        match err {
            ApiError::RateLimited {
                retry_after: Some(hint),
                ..
            } => exponential.max(*hint).min(self.max_delay),
            _ => exponential,
        }
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the retry budget for the
/// failure's kind is spent.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let budget = policy.budget_for(&err);
                if retries >= budget {
                    return Err(err);
                }

                let delay = policy.delay_for(retries, &err);
                warn!(
                    "{label} failed ({err}), retrying after {}ms (attempt {}/{})",
                    delay.as_millis(),
                    retries + 1,
                    budget
                );
                sleep(delay).await;
                retries += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            ..RetryPolicy::default()
        }
    }

    fn rate_limited() -> ApiError {
        ApiError::RateLimited {
            detail: "Limit: 60".to_string(),
            retry_after: None,
        }
    }

    #[tokio::test]
    async fn rate_limit_is_retried_then_surfaced() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = with_retry(&fast(), "GET /meetings", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(rate_limited())
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::RateLimited);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn authentication_is_never_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = with_retry(&fast(), "GET /teams", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::Authentication("Invalid API key".to_string()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_server_error_recovers() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = with_retry(&fast(), "GET /teams", move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ApiError::UpstreamServer {
                    status: 503,
                    message: "unavailable".to_string(),
                })
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn delay_doubles_and_is_capped() {
        let policy = RetryPolicy::default();
        let err = rate_limited();
        assert_eq!(policy.delay_for(0, &err), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2, &err), Duration::from_secs(2));
        assert_eq!(policy.delay_for(10, &err), Duration::from_secs(8));

        let hinted = ApiError::RateLimited {
            detail: String::new(),
            retry_after: Some(Duration::from_secs(3)),
        };
        assert_eq!(policy.delay_for(0, &hinted), Duration::from_secs(3));
    }

    #[test]
    fn only_transient_failures_have_a_budget() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.budget_for(&rate_limited()), 3);
        assert_eq!(policy.budget_for(&ApiError::Network("reset".into())), 2);
        assert_eq!(policy.budget_for(&ApiError::NotFound("x".into())), 0);
    }
}
