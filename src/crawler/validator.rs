//! x402 endpoint validation.
//!
//! Deliberately permissive: a false positive costs one wasted probe later,
//! a false negative loses a resource for good. The network half is a thin
//! reqwest wrapper; the verdict itself is the pure [`classify_response`] so
//! the decision table is unit-testable without sockets.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

pub const VALIDATOR_USER_AGENT: &str = "x402-validator/1.0";
const VALIDATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Capability seam for endpoint validation, mockable in tests.
#[async_trait]
pub trait EndpointValidator: Send + Sync {
    /// Probe a candidate URL and decide whether it is an x402 endpoint.
    /// Network failures are a `false` verdict, never an error.
    async fn validate(&self, url: &str) -> bool;
}

/// Production validator issuing real GET probes.
pub struct HttpValidator {
    client: reqwest::Client,
}

impl HttpValidator {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(VALIDATION_TIMEOUT)
            .user_agent(VALIDATOR_USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EndpointValidator for HttpValidator {
    async fn validate(&self, url: &str) -> bool {
        let response = match self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => {
                debug!(url, error = %error, "Validation request failed");
                return false;
            }
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let body = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(error) => {
                debug!(url, error = %error, "Failed to read validation body");
                return false;
            }
        };

        let verdict = classify_response(status, content_type.as_deref(), &body);
        debug!(url, status, verdict, "Validation completed");
        verdict
    }
}

/// Decision table, first matching rule wins:
///
/// 1. status outside {200, 402} -> false
/// 2. status 200 with a non-JSON content type -> false
/// 3. unparseable body -> true iff status 402
/// 4. body has an `x402Version` field -> true
/// 5. status 402 and the body mentions x402/payment/accepts -> true
/// 6. otherwise -> false
pub(crate) fn classify_response(status: u16, content_type: Option<&str>, body: &[u8]) -> bool {
    if status != 200 && status != 402 {
        return false;
    }

    // Missing content type is allowed; endpoints often omit it on 402.
    let json_like = match content_type {
        None => true,
        Some(value) if value.is_empty() => true,
        Some(value) => value
            .parse::<mime::Mime>()
            .map(|media| media.subtype() == mime::JSON || media.suffix() == Some(mime::JSON))
            .unwrap_or(false),
    };

    if status == 200 && !json_like {
        return false;
    }

    let Ok(data) = serde_json::from_slice::<serde_json::Value>(body) else {
        return status == 402;
    };

    if data.get("x402Version").is_some_and(|v| !v.is_null()) {
        return true;
    }

    if status == 402 {
        let text = data.to_string().to_lowercase();
        if text.contains("x402") || text.contains("payment") || text.contains("accepts") {
            return true;
        }
    }

    false
}
