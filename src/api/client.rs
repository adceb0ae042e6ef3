//! Retrying request layer for the Microsoft Graph API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, Response, StatusCode};
use serde_json::Value;
use tokio::time::sleep;

use crate::api::endpoint::logical_path_from_url;
use crate::auth::TokenProvider;
use crate::error::{GraphError, Result};
use crate::http::HttpClient;

/// Retry and backoff policy for transient failures.
///
/// Transient means a network-level failure (timeout, connection refused)
/// or one of the retryable server statuses. Everything else is terminal
/// and surfaces immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts per logical request.
    pub max_attempts: u32,
    /// Backoff before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied to the backoff per attempt.
    pub growth: f64,
    /// Ceiling for a single backoff sleep.
    pub max_delay: Duration,
    /// Server statuses worth retrying.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            growth: 1.7,
            max_delay: Duration::from_secs(15),
            retryable_statuses: vec![500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (zero-based), capped at
    /// `max_delay`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let grown = self.base_delay.as_secs_f64() * self.growth.powi(attempt as i32);
        self.max_delay.min(Duration::from_secs_f64(grown))
    }

    fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }
}

/// The single point through which every request reaches the network.
///
/// Injects the bearer credential per attempt, classifies failures and owns
/// the retry loop. No other component holds a raw HTTP handle.
pub(crate) struct ApiClient {
    http: HttpClient,
    token: Arc<dyn TokenProvider>,
    retry: RetryPolicy,
}

impl ApiClient {
    pub(crate) fn new(http: HttpClient, token: Arc<dyn TokenProvider>, retry: RetryPolicy) -> Self {
        Self { http, token, retry }
    }

    pub(crate) fn get(&self, url: &str) -> ApiRequest<'_> {
        self.request(Method::GET, url)
    }

    pub(crate) fn post(&self, url: &str) -> ApiRequest<'_> {
        self.request(Method::POST, url)
    }

    pub(crate) fn put(&self, url: &str) -> ApiRequest<'_> {
        self.request(Method::PUT, url)
    }

    pub(crate) fn patch(&self, url: &str) -> ApiRequest<'_> {
        self.request(Method::PATCH, url)
    }

    pub(crate) fn delete(&self, url: &str) -> ApiRequest<'_> {
        self.request(Method::DELETE, url)
    }

    pub(crate) fn request(&self, method: Method, url: &str) -> ApiRequest<'_> {
        ApiRequest {
            api: self,
            method,
            url: url.to_string(),
            query: Vec::new(),
            headers: Vec::new(),
            body: Payload::None,
            authenticated: true,
        }
    }
}

enum Payload {
    None,
    Json(Value),
    Bytes(Vec<u8>),
}

/// One logical request; `send` owns the retry loop.
pub(crate) struct ApiRequest<'a> {
    api: &'a ApiClient,
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Payload,
    authenticated: bool,
}

enum Failure {
    Transient(GraphError),
    Terminal(GraphError),
}

impl ApiRequest<'_> {
    pub(crate) fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub(crate) fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub(crate) fn json(mut self, body: Value) -> Self {
        self.body = Payload::Json(body);
        self
    }

    pub(crate) fn bytes(mut self, body: Vec<u8>) -> Self {
        self.body = Payload::Bytes(body);
        self
    }

    /// Skip credential injection. Monitor URLs carry their own time-limited
    /// token and reject the store's standard credentials.
    pub(crate) fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }

    /// Execute the request, retrying transient failures with capped
    /// exponential backoff. The final transient failure is surfaced as
    /// [`GraphError::TransientExhausted`]; terminal failures propagate on
    /// the spot.
    pub(crate) async fn send(self) -> Result<Response> {
        let mut attempt: u32 = 0;
        loop {
            let outcome = self.attempt_once().await;
            attempt += 1;
            match outcome {
                Ok(response) => return Ok(response),
                Err(Failure::Transient(err)) => {
                    if attempt >= self.api.retry.max_attempts {
                        return Err(GraphError::TransientExhausted {
                            attempts: attempt,
                            source: Box::new(err),
                        });
                    }
                    let delay = self.api.retry.backoff(attempt - 1);
                    log::debug!(
                        "retrying {} {} after transient failure (attempt {}): {}",
                        self.method,
                        self.url,
                        attempt,
                        err
                    );
                    sleep(delay).await;
                }
                Err(Failure::Terminal(err)) => return Err(err),
            }
        }
    }

    async fn attempt_once(&self) -> std::result::Result<Response, Failure> {
        let mut builder = self.api.http.request(self.method.clone(), &self.url);
        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }
        match &self.body {
            Payload::Json(value) => builder = builder.json(value),
            Payload::Bytes(data) => builder = builder.body(data.clone()),
            Payload::None => {}
        }
        if self.authenticated {
            let token = self
                .api
                .token
                .bearer_token()
                .await
                .map_err(Failure::Terminal)?;
            builder = builder.bearer_auth(token);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() || err.is_connect() => {
                return Err(Failure::Transient(GraphError::Request(err)));
            }
            Err(err) => return Err(Failure::Terminal(GraphError::Request(err))),
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(Failure::Terminal(GraphError::NotFound {
                path: logical_path_from_url(&self.url),
            }));
        }
        let code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        if self.api.retry.is_retryable_status(code) {
            return Err(Failure::Transient(GraphError::Server { status: code, body }));
        }
        log::error!(
            "HTTP error {} for {} {}: {}",
            code,
            self.method,
            self.url,
            body
        );
        Err(Failure::Terminal(GraphError::Server { status: code, body }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.retryable_statuses, vec![500, 502, 503, 504]);
        assert!(policy.is_retryable_status(503));
        assert!(!policy.is_retryable_status(404));
        assert!(!policy.is_retryable_status(409));
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy::default();
        let mut previous = Duration::ZERO;
        for attempt in 0..32 {
            let delay = policy.backoff(attempt);
            assert!(delay >= previous, "backoff must be non-decreasing");
            assert!(delay <= policy.max_delay, "backoff must honor the cap");
            previous = delay;
        }
        assert_eq!(policy.backoff(31), policy.max_delay);
    }

    #[test]
    fn test_backoff_starts_at_base_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), policy.base_delay);
    }
}
