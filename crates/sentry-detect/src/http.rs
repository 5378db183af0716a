//! Shared HTTP client config and retry helper for the fallback adapters
//! (§4.3 "HTTP YOLO/DINO/face fallback").

use std::time::Duration;

use reqwest::Client;
use tracing::warn;

use crate::error::{DetectError, DetectResult};

#[derive(Debug, Clone)]
pub struct HttpAdapterConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl HttpAdapterConfig {
    pub fn from_env(base_url_var: &str, default_base_url: &str) -> Self {
        Self {
            base_url: std::env::var(base_url_var).unwrap_or_else(|_| default_base_url.to_string()),
            // §5: HTTP round-trips are bounded by a client timeout of 10s.
            timeout: Duration::from_secs(10),
            max_retries: 2,
        }
    }
}

pub fn build_client(config: &HttpAdapterConfig) -> DetectResult<Client> {
    Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(DetectError::Http)
}

/// Retry only on transient failures (timeouts, connect errors), with
/// exponential backoff, mirroring the ML client's retry helper.
pub async fn with_retry<F, Fut, T>(max_retries: u32, operation: F) -> DetectResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = DetectResult<T>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(DetectError::Http(e)) if (e.is_timeout() || e.is_connect()) && attempt < max_retries => {
                let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                warn!(attempt = attempt + 1, ?delay, error = %e, "HTTP detector request failed, retrying");
                tokio::time::sleep(delay).await;
                last_error = Some(DetectError::Http(e));
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or(DetectError::MalformedResponse("retry loop exhausted with no error".into())))
}
