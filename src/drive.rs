//! The drive client: configuration, construction and handle opening.

use std::sync::Arc;
use std::time::Duration;

use crate::api::endpoint::normalize_path;
use crate::api::{ApiClient, DriveEndpoint, RetryPolicy};
use crate::auth::TokenProvider;
use crate::cache::{ListingCache, NoCache, invalidate_written_path};
use crate::error::{GraphError, Result};
use crate::fs::handle::{DriveFile, FileMode};
use crate::fs::item::ItemRef;
use crate::fs::upload_session::UPLOAD_ALIGNMENT;
use crate::http::HttpClient;

/// Tunables for one drive client.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Write-buffer threshold below which a commit takes the one-shot
    /// path, and the flush granularity above it. Must be a non-zero
    /// multiple of the 320 KiB upload alignment.
    pub blocksize: usize,
    /// Retry and backoff policy for the request layer.
    pub retry: RetryPolicy,
    /// Send deleted items to the recycle bin instead of permanently
    /// removing them.
    pub use_recycle_bin: bool,
    /// Poll interval while waiting on server-side copies.
    pub copy_poll_interval: Duration,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            blocksize: 10 * 1024 * 1024,
            retry: RetryPolicy::default(),
            use_recycle_bin: false,
            copy_poll_interval: Duration::from_secs(1),
        }
    }
}

/// Client for one Graph drive.
///
/// Owns the HTTP client (and its connection pool) for its whole lifetime:
/// opened at construction, released when the last clone is dropped.
/// Cloning is cheap; clones share the underlying client and cache.
#[derive(Clone)]
pub struct Drive {
    api: Arc<ApiClient>,
    endpoint: DriveEndpoint,
    cache: Arc<dyn ListingCache>,
    config: Arc<DriveConfig>,
    drive_id: String,
}

impl Drive {
    /// Start building a client for `drive_id`.
    pub fn builder(drive_id: impl Into<String>) -> DriveBuilder {
        DriveBuilder {
            drive_id: drive_id.into(),
            base_url: None,
            token: None,
            cache: None,
            config: DriveConfig::default(),
        }
    }

    /// Identifier of the drive this client talks to.
    pub fn drive_id(&self) -> &str {
        &self.drive_id
    }

    pub(crate) fn api(&self) -> &ApiClient {
        &self.api
    }

    pub(crate) fn endpoint(&self) -> &DriveEndpoint {
        &self.endpoint
    }

    pub(crate) fn cache(&self) -> &dyn ListingCache {
        self.cache.as_ref()
    }

    pub(crate) fn config(&self) -> &DriveConfig {
        &self.config
    }

    /// Open a file.
    ///
    /// Read and append modes require the file to exist and resolve its
    /// current size up front; write mode materializes the file on commit.
    pub async fn open(&self, path: &str, mode: FileMode) -> Result<DriveFile> {
        self.open_with_size(path, mode, None).await
    }

    /// Open with a size hint, skipping the metadata round trip when the
    /// caller already knows the current size.
    pub async fn open_with_size(
        &self,
        path: &str,
        mode: FileMode,
        size_hint: Option<u64>,
    ) -> Result<DriveFile> {
        let path = normalize_path(path)?;
        let (size, id) = match mode {
            FileMode::Read | FileMode::Append => match size_hint {
                Some(size) => (size, self.item_id(&path).await?),
                None => {
                    let item = self.info(&path).await?;
                    if !item.is_file() {
                        return Err(GraphError::NotFound { path });
                    }
                    (item.size, item.id)
                }
            },
            FileMode::Write => (size_hint.unwrap_or(0), self.item_id(&path).await?),
        };
        DriveFile::new(
            self.clone(),
            ItemRef { path, id },
            mode,
            size,
            self.config.blocksize,
        )
    }

    /// Drop the cache entries for `path` and its parent listing.
    pub(crate) fn invalidate_entry(&self, path: &str) {
        self.cache.invalidate(path);
        if let Some((parent, _)) = path.trim_end_matches('/').rsplit_once('/') {
            let parent = if parent.is_empty() { "/" } else { parent };
            self.cache.invalidate(parent);
        }
    }

    /// Prefix-walk invalidation after a successful file write.
    pub(crate) fn invalidate_after_write(&self, path: &str) {
        invalidate_written_path(self.cache.as_ref(), path);
    }
}

/// Builder for [`Drive`].
pub struct DriveBuilder {
    drive_id: String,
    base_url: Option<String>,
    token: Option<Arc<dyn TokenProvider>>,
    cache: Option<Arc<dyn ListingCache>>,
    config: DriveConfig,
}

impl DriveBuilder {
    /// Credential source consulted before every request. Required.
    pub fn token_provider(mut self, provider: impl TokenProvider + 'static) -> Self {
        self.token = Some(Arc::new(provider));
        self
    }

    /// Override the Graph base URL (national clouds, proxies, tests).
    pub fn base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = Some(base.into());
        self
    }

    /// Plug in a directory-listing cache. Defaults to no caching.
    pub fn listing_cache(mut self, cache: impl ListingCache + 'static) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: DriveConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Drive> {
        let token = self.token.ok_or_else(|| {
            GraphError::Validation("a token provider is required".to_string())
        })?;
        if self.config.blocksize == 0 || self.config.blocksize % UPLOAD_ALIGNMENT != 0 {
            return Err(GraphError::Validation(format!(
                "blocksize must be a non-zero multiple of {UPLOAD_ALIGNMENT} bytes"
            )));
        }
        let endpoint = match &self.base_url {
            Some(base) => DriveEndpoint::with_base(base, &self.drive_id),
            None => DriveEndpoint::new(&self.drive_id),
        };
        let http = HttpClient::new()?;
        let api = ApiClient::new(http, token, self.config.retry.clone());
        Ok(Drive {
            api: Arc::new(api),
            endpoint,
            cache: self.cache.unwrap_or_else(|| Arc::new(NoCache)),
            config: Arc::new(self.config),
            drive_id: self.drive_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use crate::cache::MemoryCache;

    #[test]
    fn test_builder_requires_token() {
        let result = Drive::builder("d1").build();
        assert!(matches!(result, Err(GraphError::Validation(_))));
    }

    #[test]
    fn test_builder_rejects_misaligned_blocksize() {
        let config = DriveConfig {
            blocksize: 500_000,
            ..DriveConfig::default()
        };
        let result = Drive::builder("d1")
            .token_provider(StaticToken::new("t"))
            .config(config)
            .build();
        assert!(matches!(result, Err(GraphError::Validation(_))));
    }

    #[test]
    fn test_builder_defaults() {
        let drive = Drive::builder("d1")
            .token_provider(StaticToken::new("t"))
            .build()
            .unwrap();
        assert_eq!(drive.drive_id(), "d1");
        assert_eq!(drive.config().blocksize, 10 * 1024 * 1024);
        assert!(
            drive
                .endpoint()
                .drive_url()
                .starts_with("https://graph.microsoft.com/v1.0/drives/")
        );
    }

    #[test]
    fn test_invalidate_entry_drops_path_and_parent() {
        let drive = Drive::builder("d1")
            .token_provider(StaticToken::new("t"))
            .listing_cache(MemoryCache::new())
            .build()
            .unwrap();
        drive.cache().put("/a", Vec::new());
        drive.cache().put("/a/b", Vec::new());
        drive.cache().put("/other", Vec::new());

        drive.invalidate_entry("/a/b");

        assert!(drive.cache().get("/a").is_none());
        assert!(drive.cache().get("/a/b").is_none());
        assert!(drive.cache().get("/other").is_some());
    }
}
