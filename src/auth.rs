//! Bearer-credential providers.

use async_trait::async_trait;

use crate::error::Result;

/// Source of bearer tokens for outgoing requests.
///
/// The request layer asks for a token before every attempt, so a
/// refreshing provider can rotate credentials transparently mid-retry.
/// Token acquisition and refresh themselves live outside this crate; the
/// provider only has to hand back something currently valid.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a currently-valid bearer token.
    async fn bearer_token(&self) -> Result<String>;
}

/// Provider that always returns the same token.
///
/// Useful for tests and short-lived tooling where the token outlives the
/// process.
#[derive(Debug, Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    /// Create a provider around a fixed token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}
