use anyhow::{anyhow, Result};
use std::time::Duration;

/// Retry policy for a single logical HTTP call.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt (4 attempts total by default).
    pub max_retries: u32,
    /// Backoff after the first failed attempt; doubles on each retry.
    pub base_delay: Duration,
    /// Hard deadline per attempt; on expiry the in-flight call is dropped.
    pub timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(10),
        }
    }
}

/// 429 and 5xx are worth retrying; other client errors are final.
fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Delay before retry `attempt + 1`: base, 2×base, 4×base, ...
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt.min(16))
}

/// Send a request with bounded retries and a per-attempt timeout.
///
/// Successful responses and non-retryable statuses are returned immediately.
/// Retryable statuses, network errors, and timeouts are retried with
/// exponential backoff; once retries are exhausted the last error (or a
/// synthesized `HTTP <status>` error) is returned. There is no circuit
/// breaker: every call retries independently.
pub async fn fetch_with_retry(
    request: reqwest::RequestBuilder,
    config: &RetryConfig,
) -> Result<reqwest::Response> {
    let mut last_error: Option<anyhow::Error> = None;

    for attempt in 0..=config.max_retries {
        let Some(req) = request.try_clone() else {
            return Err(anyhow!("request body is not cloneable, cannot retry"));
        };

        match tokio::time::timeout(config.timeout, req.send()).await {
            Ok(Ok(resp)) => {
                if !is_retryable(resp.status()) {
                    return Ok(resp);
                }
                last_error = Some(anyhow!("HTTP {}", resp.status().as_u16()));
            }
            Ok(Err(e)) => {
                last_error = Some(anyhow!(e).context("request failed"));
            }
            Err(_) => {
                last_error = Some(anyhow!(
                    "request timed out after {}ms",
                    config.timeout.as_millis()
                ));
            }
        }

        if attempt < config.max_retries {
            tokio::time::sleep(backoff_delay(config.base_delay, attempt)).await;
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow!("retries exhausted")))
}
