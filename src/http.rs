//! HTTP client wrapper for Microsoft Graph requests.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};

use crate::error::{GraphError, Result};

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for talking to the Graph service.
///
/// Owns the one persistent `reqwest::Client` every request in the crate
/// goes through, so the connection pool is shared for the lifetime of the
/// drive client and released when it is dropped.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a new HTTP client with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GraphError::Request)?;
        Ok(Self { client })
    }

    /// Start building a request. Only the retrying call layer uses this;
    /// no other component issues raw requests.
    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url)
    }
}
