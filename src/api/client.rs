//! Rate-limited REST client
//!
//! All remote listing traffic goes through [`ApiClient`], which owns the
//! self-regulation state:
//! - a pacing sleep before every request after the first, whose baseline
//!   delay is raised multiplicatively after each throttling event
//! - capped exponential backoff for throttling (429), server errors (5xx)
//!   and transport failures, each with its own attempt counter
//!
//! Expected remote conditions never escape as errors: a 404 is an empty
//! result, and a path whose retries are exhausted degrades to an empty
//! result with a recorded failure description. Credentials are injected at
//! construction; the client reads no ambient state.

use crate::credentials::Credentials;
use crate::error::{ApiError, ApiResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum attempts per listing call, for each failure class
pub const MAX_ATTEMPTS: u32 = 5;

/// Initial inter-request pacing delay
const BASE_PACE_DELAY_MS: u64 = 50;

/// Ceiling for the pacing delay after repeated throttling
const MAX_PACE_DELAY_MS: u64 = 1000;

/// Backoff ceiling for throttling and server errors
const THROTTLE_BACKOFF_CAP_SECS: u64 = 32;

/// Backoff ceiling for transport failures
const TRANSPORT_BACKOFF_CAP_SECS: u64 = 16;

/// Per-request timeout applied to every call
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Backoff before throttled attempt `attempt` (1-based): 2, 4, 8, 16, 32s
pub(crate) fn throttle_backoff(attempt: u32) -> Duration {
    Duration::from_secs((1u64 << attempt.min(63)).min(THROTTLE_BACKOFF_CAP_SECS))
}

/// Backoff before transport retry `attempt` (1-based): 2, 4, 8, 16, 16s
pub(crate) fn transport_backoff(attempt: u32) -> Duration {
    Duration::from_secs((1u64 << attempt.min(63)).min(TRANSPORT_BACKOFF_CAP_SECS))
}

/// Classification of an HTTP status for the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusClass {
    Ok,
    NotFound,
    Throttled,
    ServerError,
    Other,
}

pub(crate) fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Ok,
        404 => StatusClass::NotFound,
        429 => StatusClass::Throttled,
        500..=599 => StatusClass::ServerError,
        _ => StatusClass::Other,
    }
}

/// Outcome of fetching one path's listing body
#[derive(Debug)]
pub enum Fetch {
    /// 2xx with a decodable JSON body
    Success(serde_json::Value),

    /// 404 - the path does not exist; a legitimate empty result
    Missing,

    /// The call gave up; carries a description for the caller
    Failed(String),
}

/// Rate-limited blocking HTTP client for one workspace
pub struct ApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    token: String,

    /// Requests issued by this client (pacing skips the first)
    requests_issued: AtomicU64,

    /// Current baseline inter-request delay in milliseconds
    pace_delay_ms: AtomicU64,
}

impl ApiClient {
    /// Create a client for the given credentials with a per-request timeout
    pub fn new(credentials: &Credentials, timeout: Duration) -> ApiResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: credentials.workspace_url.trim_end_matches('/').to_string(),
            token: credentials.token.clone(),
            requests_issued: AtomicU64::new(0),
            pace_delay_ms: AtomicU64::new(BASE_PACE_DELAY_MS),
        })
    }

    /// Workspace base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Total requests issued so far
    pub fn request_count(&self) -> u64 {
        self.requests_issued.load(Ordering::Relaxed)
    }

    /// Fetch the listing body for one absolute path
    ///
    /// Retries throttling, server errors and transport failures with capped
    /// exponential backoff, each class on its own attempt counter. Never
    /// panics and never returns an error: exhausted retries and unexpected
    /// statuses come back as [`Fetch::Failed`].
    pub fn fetch_listing(&self, endpoint: &str, path: &str) -> Fetch {
        let mut throttle_attempts = 0u32;
        let mut server_attempts = 0u32;
        let mut transport_attempts = 0u32;

        loop {
            self.pace();

            let url = format!("{}{}", self.base_url, endpoint);
            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.token)
                .json(&serde_json::json!({ "path": path }))
                .send();

            match response {
                Ok(response) => {
                    let status = response.status().as_u16();
                    match classify_status(status) {
                        StatusClass::Ok => match response.json::<serde_json::Value>() {
                            Ok(body) => return Fetch::Success(body),
                            Err(e) => {
                                return Fetch::Failed(format!("malformed response body: {e}"))
                            }
                        },
                        StatusClass::NotFound => return Fetch::Missing,
                        StatusClass::Throttled => {
                            throttle_attempts += 1;
                            if throttle_attempts >= MAX_ATTEMPTS {
                                return Fetch::Failed(format!(
                                    "throttled after {MAX_ATTEMPTS} attempts"
                                ));
                            }
                            let wait = throttle_backoff(throttle_attempts);
                            warn!(
                                path = %path,
                                attempt = throttle_attempts,
                                wait_secs = wait.as_secs(),
                                "rate limited, backing off"
                            );
                            self.raise_pace_delay();
                            thread::sleep(wait);
                        }
                        StatusClass::ServerError => {
                            server_attempts += 1;
                            if server_attempts >= MAX_ATTEMPTS {
                                return Fetch::Failed(format!(
                                    "server error {status} after {MAX_ATTEMPTS} attempts"
                                ));
                            }
                            let wait = throttle_backoff(server_attempts);
                            warn!(
                                path = %path,
                                status = status,
                                wait_secs = wait.as_secs(),
                                "server error, retrying"
                            );
                            thread::sleep(wait);
                        }
                        StatusClass::Other => {
                            debug!(path = %path, status = status, "unexpected listing status");
                            return Fetch::Failed(format!("unexpected status {status}"));
                        }
                    }
                }
                Err(e) => {
                    transport_attempts += 1;
                    if transport_attempts >= MAX_ATTEMPTS {
                        return Fetch::Failed(format!(
                            "request failed after {MAX_ATTEMPTS} attempts: {e}"
                        ));
                    }
                    let wait = transport_backoff(transport_attempts);
                    debug!(
                        path = %path,
                        attempt = transport_attempts,
                        wait_secs = wait.as_secs(),
                        error = %e,
                        "transport error, retrying"
                    );
                    thread::sleep(wait);
                }
            }
        }
    }

    /// Single-attempt GET with query parameters, for non-listing endpoints
    pub fn get_json(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> ApiResult<serde_json::Value> {
        self.pace();
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .map_err(|e| ApiError::Transport {
                endpoint: endpoint.to_string(),
                source: e,
            })?;

        self.decode_response(endpoint, response)
    }

    /// Single-attempt POST with a JSON body, for non-listing endpoints
    pub fn post_json(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> ApiResult<serde_json::Value> {
        self.pace();
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .map_err(|e| ApiError::Transport {
                endpoint: endpoint.to_string(),
                source: e,
            })?;

        self.decode_response(endpoint, response)
    }

    fn decode_response(
        &self,
        endpoint: &str,
        response: reqwest::blocking::Response,
    ) -> ApiResult<serde_json::Value> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        response.json().map_err(|e| ApiError::Decode {
            endpoint: endpoint.to_string(),
            detail: e.to_string(),
        })
    }

    /// Sleep for the baseline delay before every request after the first
    fn pace(&self) {
        let issued = self.requests_issued.fetch_add(1, Ordering::Relaxed);
        if issued > 0 {
            thread::sleep(Duration::from_millis(
                self.pace_delay_ms.load(Ordering::Relaxed),
            ));
        }
    }

    /// Permanently raise the baseline delay after a throttling event
    fn raise_pace_delay(&self) {
        let current = self.pace_delay_ms.load(Ordering::Relaxed);
        let raised = (current.saturating_mul(3) / 2).min(MAX_PACE_DELAY_MS);
        self.pace_delay_ms.store(raised, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn pace_delay_for_tests(&self) -> u64 {
        self.pace_delay_ms.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub(crate) fn raise_pace_delay_for_tests(&self) {
        self.raise_pace_delay()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> ApiClient {
        let credentials = Credentials {
            workspace_url: "https://example.cloud.databricks.com".into(),
            token: "dapi-test".into(),
        };
        ApiClient::new(&credentials, Duration::from_secs(30)).unwrap()
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(classify_status(200), StatusClass::Ok);
        assert_eq!(classify_status(404), StatusClass::NotFound);
        assert_eq!(classify_status(429), StatusClass::Throttled);
        assert_eq!(classify_status(500), StatusClass::ServerError);
        assert_eq!(classify_status(503), StatusClass::ServerError);
        assert_eq!(classify_status(403), StatusClass::Other);
    }

    #[test]
    fn test_throttle_backoff_sequence() {
        let waits: Vec<u64> = (1..=5).map(|a| throttle_backoff(a).as_secs()).collect();
        assert_eq!(waits, vec![2, 4, 8, 16, 32]);

        // The worst-case elapsed backoff for one path is bounded
        let total: u64 = waits.iter().sum();
        assert!(total <= 62);

        // Cap holds beyond the attempt bound
        assert_eq!(throttle_backoff(10).as_secs(), 32);
    }

    #[test]
    fn test_transport_backoff_sequence() {
        let waits: Vec<u64> = (1..=5).map(|a| transport_backoff(a).as_secs()).collect();
        assert_eq!(waits, vec![2, 4, 8, 16, 16]);
    }

    #[test]
    fn test_pace_delay_raises_and_caps() {
        let client = test_client();
        assert_eq!(client.pace_delay_for_tests(), 50);

        client.raise_pace_delay_for_tests();
        assert_eq!(client.pace_delay_for_tests(), 75);

        for _ in 0..20 {
            client.raise_pace_delay_for_tests();
        }
        assert_eq!(client.pace_delay_for_tests(), 1000);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let credentials = Credentials {
            workspace_url: "https://example.cloud.databricks.com/".into(),
            token: "dapi-test".into(),
        };
        let client = ApiClient::new(&credentials, Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "https://example.cloud.databricks.com");
    }
}
