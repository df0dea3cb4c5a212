//! Blocking HTTP client for the Databricks REST APIs
//!
//! Adds the bearer token to every request. Idempotent requests (GET,
//! DELETE) are retried on transient failures (network errors, 429, 502,
//! 503, 504) with exponential backoff. POST is sent exactly once: a
//! statement submission that timed out or got a 5xx may already be running
//! on the warehouse.

use crate::error::{EditorError, Result};
use log::{debug, warn};
use reqwest::blocking::{Client, Response};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::thread::sleep;
use std::time::Duration;

/// Connection and retry settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    pub retry_delay: Duration,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            user_agent: format!("ucedit/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug)]
pub struct DatabricksHttpClient {
    client: Client,
    host: String,
    token: String,
    config: HttpClientConfig,
}

impl DatabricksHttpClient {
    pub fn new(host: &str, token: &str, config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| EditorError::http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            token: token.to_string(),
            config,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Absolute URL for an API path such as `/api/2.0/sql/warehouses`
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.host, path.trim_start_matches('/'))
        }
    }

    pub fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self.send(Method::GET, path, query, None)?;
        Self::parse_body(response)
    }

    /// Never retried
    pub fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_vec(body)?;
        let response = self.send(Method::POST, path, &[], Some(body))?;
        Self::parse_body(response)
    }

    pub fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, &[], None)?;
        Ok(())
    }

    /// Send a request, retrying transient failures of idempotent methods.
    ///
    /// Returns the first successful response; other statuses fail with the
    /// response body in the message.
    fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> Result<Response> {
        let url = self.url(path);
        let max_retries = if Self::is_idempotent(&method) {
            self.config.max_retries
        } else {
            0
        };
        let mut attempts = 0;

        loop {
            attempts += 1;

            let mut request = self
                .client
                .request(method.clone(), &url)
                .bearer_auth(&self.token)
                .query(query);
            if let Some(ref bytes) = body {
                request = request
                    .header("Content-Type", "application/json")
                    .body(bytes.clone());
            }

            debug!(
                "{} {} (attempt {}/{})",
                method,
                url,
                attempts,
                max_retries + 1
            );

            match request.send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    if Self::is_retryable_status(status) && attempts <= max_retries {
                        warn!(
                            "Request failed with {} (attempt {}/{}), retrying...",
                            status,
                            attempts,
                            max_retries + 1
                        );
                        self.wait_for_retry(attempts);
                        continue;
                    }

                    let error_body = response.text().unwrap_or_default();
                    return Err(EditorError::http(format!(
                        "HTTP {} - {}",
                        status.as_u16(),
                        Self::error_message(&error_body)
                    )));
                }
                Err(e) => {
                    if Self::is_retryable_error(&e) && attempts <= max_retries {
                        warn!(
                            "Request failed (attempt {}/{}): {}, retrying...",
                            attempts,
                            max_retries + 1,
                            e
                        );
                        self.wait_for_retry(attempts);
                        continue;
                    }

                    return Err(EditorError::http(format!(
                        "Request to {} failed after {} attempts: {}",
                        url, attempts, e
                    )));
                }
            }
        }
    }

    fn parse_body<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.text()?;
        serde_json::from_str(&body).map_err(|e| {
            EditorError::http(format!("Failed to parse response: {} - body: {}", e, body))
        })
    }

    /// The REST APIs report failures as `{"error_code": .., "message": ..}`
    fn error_message(body: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| body.to_string())
    }

    fn is_idempotent(method: &Method) -> bool {
        *method == Method::GET || *method == Method::DELETE
    }

    fn is_retryable_status(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS
                | StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
        )
    }

    fn is_retryable_error(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect()
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        self.config.retry_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    fn wait_for_retry(&self, attempt: u32) {
        let delay = self.retry_delay(attempt);
        debug!("Waiting {:?} before retry", delay);
        sleep(delay);
    }
}
