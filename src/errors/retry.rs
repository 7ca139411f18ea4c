use std::future::Future;
use std::time::Duration;

use super::classification::ErrorClassification;
use super::types::DigfootError;
use tracing::{debug, warn};

/// Upper bound on any single wait between source queries.
const MAX_DELAY_SECS: u64 = 30;
/// Public APIs (Reddit, HN Algolia, GitHub) reset their quotas on a
/// window of several seconds, so a throttled source starts at 5s.
const RATE_LIMIT_BASE_SECS: u64 = 5;

impl ErrorClassification {
    /// How long a source waits before re-querying after this kind of error.
    ///
    /// A throttled platform backs off linearly (5s, 10s, 15s...). Flaky
    /// networks and 5xx responses back off exponentially with up to a second
    /// of jitter so parallel sources hitting one host don't retry in lockstep.
    /// Both are capped at 30s to keep a scan inside the per-source timeout.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        if self.error_type == "RateLimitError" {
            let secs = RATE_LIMIT_BASE_SECS * (u64::from(attempt) + 1);
            return Duration::from_secs(secs.min(MAX_DELAY_SECS));
        }
        let backoff = 2.0_f64.powi(attempt as i32) + rand::random::<f64>();
        Duration::from_secs_f64(backoff.min(MAX_DELAY_SECS as f64))
    }
}

/// How many times a failing source query is re-issued.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 2 }
    }
}

/// Query a source, re-issuing the query on transient failures.
///
/// `source` names the platform in logs. Not-found, auth and parse errors
/// are final; a source that keeps failing surfaces its last error so the
/// aggregator can mark it failed while the rest of the scan goes on.
pub async fn with_retry<F, Fut, T>(
    source: &str,
    config: &RetryConfig,
    mut query: F,
) -> Result<T, DigfootError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DigfootError>>,
{
    let mut attempt = 0;
    loop {
        let err = match query().await {
            Ok(found) => return Ok(found),
            Err(e) => e,
        };

        let classification = err.classify();
        if !classification.retryable {
            debug!(source, error_type = classification.error_type, "Source error is final");
            return Err(err);
        }
        if attempt >= config.max_retries {
            warn!(source, attempts = attempt + 1, error = %err, "Source gave up after retries");
            return Err(err);
        }

        let delay = classification.retry_delay(attempt);
        warn!(
            source,
            attempt = attempt + 1,
            error_type = classification.error_type,
            delay_secs = delay.as_secs(),
            error = %err,
            "Retrying source query"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
