//! Host rotation with exponential backoff for search service requests.
//!
//! Every attempt goes to the next host of the client's list. Moving to a host
//! not yet tried in the current pass is immediate; once the whole list has
//! failed, the next pass starts after an exponentially growing pause. A
//! throttled answer carrying `Retry-After` holds the next attempt at least
//! that long, within `max_delay`.
//! Pipelines never retry on their own: whatever error survives this policy
//! surfaces directly as a command failure.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Retry budget and backoff between passes over the host list.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Attempts after the first one, across all hosts.
    pub max_retries: u32,
    /// Pause before the second pass.
    pub base_delay: Duration,
    /// Upper bound of any pause.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Default backoff with a custom retry budget.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Single attempt, no pause.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Pause asked for by the service, capped at `max_delay`.
    #[must_use]
    pub fn requested_pause(&self, error: &Error) -> Duration {
        match error {
            Error::RateLimit(Some(secs)) => Duration::from_secs(*secs).min(self.max_delay),
            _ => Duration::ZERO,
        }
    }

    /// Pause before `attempt` (0-based) when rotating over `host_count` hosts.
    ///
    /// Zero while the current pass still has untried hosts; otherwise
    /// `base_delay * 2^(pass - 1)`, capped at `max_delay`.
    #[must_use]
    pub fn pause_before(&self, attempt: u32, host_count: usize) -> Duration {
        let host_count = u32::try_from(host_count.max(1)).unwrap_or(u32::MAX);
        if attempt == 0 || attempt % host_count != 0 {
            return Duration::ZERO;
        }
        let pass = attempt / host_count;
        let factor = 1u32.checked_shl(pass - 1).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

/// Whether another host may succeed where this attempt failed.
///
/// Throttling, 5xx answers, request timeouts and unreachable hosts are
/// retried. Rejections of the request itself (4xx, bad credentials) are not.
#[must_use]
pub fn is_retryable_error(error: &Error) -> bool {
    match error {
        Error::RateLimit(_) => true,
        Error::Service { status, .. } => *status >= 500 || *status == 408,
        Error::Http(e) => e.is_timeout() || e.is_connect(),
        _ => false,
    }
}

/// Runs `operation` until it succeeds, fails for good, or the budget is spent.
///
/// The closure receives the 0-based attempt number; the caller maps it to a
/// host with `attempt % host_count`.
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    host_count: usize,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    let mut requested = Duration::ZERO;
    loop {
        let pause = config.pause_before(attempt, host_count).max(requested);
        if !pause.is_zero() {
            debug!("{}: next attempt in {:?}", operation_name, pause);
            sleep(pause).await;
        }

        match operation(attempt).await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("{}: succeeded on attempt {}", operation_name, attempt + 1);
                }
                return Ok(value);
            }
            Err(e) if attempt < config.max_retries && is_retryable_error(&e) => {
                warn!("{}: {} (trying next host)", operation_name, e);
                requested = config.requested_pause(&e);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn quick(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    fn unavailable() -> Error {
        Error::Service {
            status: 503,
            message: "unavailable".to_string(),
        }
    }

    #[test]
    fn test_no_pause_within_first_pass() {
        let config = RetryConfig::default();
        for attempt in 0..4 {
            assert_eq!(config.pause_before(attempt, 4), Duration::ZERO);
        }
    }

    #[test]
    fn test_pause_doubles_per_pass() {
        let config = RetryConfig {
            max_retries: 20,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
        };
        assert_eq!(config.pause_before(2, 2), Duration::from_millis(100));
        assert_eq!(config.pause_before(3, 2), Duration::ZERO);
        assert_eq!(config.pause_before(4, 2), Duration::from_millis(200));
        assert_eq!(config.pause_before(6, 2), Duration::from_millis(400));
        assert_eq!(config.pause_before(10, 2), Duration::from_secs(1));
    }

    #[test]
    fn test_single_host_pauses_every_attempt() {
        let config = quick(3);
        assert_eq!(config.pause_before(1, 1), Duration::from_millis(1));
        assert_eq!(config.pause_before(2, 1), Duration::from_millis(2));
        assert_eq!(config.pause_before(40, 1), Duration::from_millis(5));
    }

    #[test]
    fn test_requested_pause_is_capped() {
        let config = RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        };
        assert_eq!(
            config.requested_pause(&Error::RateLimit(Some(1))),
            Duration::from_secs(1)
        );
        assert_eq!(
            config.requested_pause(&Error::RateLimit(Some(60))),
            Duration::from_secs(2)
        );
        assert_eq!(config.requested_pause(&Error::RateLimit(None)), Duration::ZERO);
        assert_eq!(config.requested_pause(&unavailable()), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_waits_for_retry_after() {
        let config = RetryConfig {
            max_retries: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::from_secs(30),
        };
        let started = tokio::time::Instant::now();

        let result = with_retry(&config, 4, "batch", |attempt| async move {
            if attempt == 0 {
                Err(Error::RateLimit(Some(5)))
            } else {
                Ok(attempt)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert!(started.elapsed() >= Duration::from_secs(5));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(is_retryable_error(&Error::RateLimit(Some(1))));
        assert!(is_retryable_error(&Error::RateLimit(None)));
        assert!(is_retryable_error(&unavailable()));
        assert!(is_retryable_error(&Error::Service {
            status: 408,
            message: "timeout".to_string()
        }));
        assert!(!is_retryable_error(&Error::Service {
            status: 400,
            message: "Record too big".to_string()
        }));
        assert!(!is_retryable_error(&Error::Authentication(
            "Invalid API key".to_string()
        )));
        assert!(!is_retryable_error(&Error::Transform("bad".to_string())));
    }

    #[tokio::test]
    async fn test_with_retry_walks_hosts() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let hosts = ["a", "b", "c"];

        let result = with_retry(&quick(3), hosts.len(), "search", |attempt| {
            let seen = seen.clone();
            let host = hosts[attempt as usize % hosts.len()];
            async move {
                seen.lock().unwrap().push(host);
                if host == "c" {
                    Ok(host)
                } else {
                    Err(unavailable())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "c");
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_with_retry_gives_up_after_budget() {
        let calls = Arc::new(Mutex::new(0));

        let result: Result<()> = with_retry(&quick(2), 2, "batch", |_| {
            let calls = calls.clone();
            async move {
                *calls.lock().unwrap() += 1;
                Err(Error::RateLimit(None))
            }
        })
        .await;

        assert!(matches!(result, Err(Error::RateLimit(None))));
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_with_retry_stops_on_rejection() {
        let calls = Arc::new(Mutex::new(0));

        let result: Result<()> = with_retry(&quick(5), 4, "settings", |_| {
            let calls = calls.clone();
            async move {
                *calls.lock().unwrap() += 1;
                Err(Error::Authentication("Invalid API key".to_string()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
