//! JSON-over-HTTP client with timeout and retry.

use crate::retry::RetryPolicy;
use crate::timeout::TimeoutConfig;
use serde::{de::DeserializeOwned, Serialize};
use storefront_commerce::cart::{REASON_HTTP_FAIL, REASON_NETWORK};
use tracing::{debug, warn};

/// Error type for fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Request error: {0}")]
    Request(String),
}

impl FetchError {
    /// Coupon rejection reason standing in for this failure.
    ///
    /// The server answered but not usefully: `HTTP_FAIL`. The server could
    /// not be reached: `NETWORK`.
    pub fn reason_code(&self) -> &'static str {
        match self {
            FetchError::Http { .. } | FetchError::Deserialization(_) => REASON_HTTP_FAIL,
            FetchError::Timeout(_) | FetchError::Connection(_) | FetchError::Request(_) => {
                REASON_NETWORK
            }
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Http {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else if err.is_decode() {
            FetchError::Deserialization(err.to_string())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// Fetch policy combining timeout and retry configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchPolicy {
    pub timeout: TimeoutConfig,
    pub retry: RetryPolicy,
}

impl FetchPolicy {
    pub fn new(timeout: TimeoutConfig, retry: RetryPolicy) -> Self {
        Self { timeout, retry }
    }
}

/// Check a response status and decode its body.
///
/// Non-2xx statuses and bodies that are not the expected JSON are errors.
pub fn interpret<T: DeserializeOwned>(status: u16, url: &str, body: &[u8]) -> Result<T, FetchError> {
    if !(200..300).contains(&status) {
        return Err(FetchError::Http {
            status,
            url: url.to_string(),
        });
    }
    serde_json::from_slice(body).map_err(|e| FetchError::Deserialization(e.to_string()))
}

/// HTTP client that applies one [`FetchPolicy`] to every request.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: reqwest::Client,
    policy: FetchPolicy,
}

impl FetchClient {
    /// Build a client for `policy`.
    pub fn new(policy: FetchPolicy) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(policy.timeout.connect)
            .timeout(policy.timeout.total)
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self { client, policy })
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// POST `body` as JSON and decode a JSON answer, retrying per policy.
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut attempt = 0;
        loop {
            match self.post_once(url, body).await {
                Ok(value) => return Ok(value),
                Err(err) if self.policy.retry.should_retry(&err, attempt) => {
                    let delay = self.policy.retry.backoff.delay_for_attempt(attempt);
                    warn!(url, attempt, ?delay, error = %err, "fetch_retry");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn post_once<B, T>(&self, url: &str, body: &B) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        debug!(url, status, bytes = bytes.len(), "fetch_response");
        interpret(status, url, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Answer {
        ok: bool,
    }

    #[test]
    fn test_interpret_success() {
        let answer: Answer = interpret(200, "http://x", br#"{"ok": true}"#).unwrap();
        assert_eq!(answer, Answer { ok: true });
    }

    #[test]
    fn test_interpret_non_2xx() {
        let err = interpret::<Answer>(502, "http://x", br#"{"ok": true}"#).unwrap_err();
        assert!(matches!(err, FetchError::Http { status: 502, .. }));
        assert_eq!(err.reason_code(), "HTTP_FAIL");
    }

    #[test]
    fn test_interpret_non_json() {
        let err = interpret::<Answer>(200, "http://x", b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, FetchError::Deserialization(_)));
        assert_eq!(err.reason_code(), "HTTP_FAIL");
    }

    #[test]
    fn test_transport_reason_codes() {
        assert_eq!(FetchError::Timeout("t".into()).reason_code(), "NETWORK");
        assert_eq!(FetchError::Connection("c".into()).reason_code(), "NETWORK");
    }
}
