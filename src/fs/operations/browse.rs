//! Listing and metadata operations.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::api::endpoint::normalize_path;
use crate::drive::Drive;
use crate::error::{GraphError, Result};
use crate::fs::item::DriveItem;

impl Drive {
    /// List the children of `path`.
    ///
    /// Consults the listing cache first; a fresh listing is cached before
    /// being returned. Listing a file path returns that single item.
    pub async fn ls(&self, path: &str) -> Result<Vec<DriveItem>> {
        let path = normalize_path(path)?;
        if let Some(cached) = self.cache().get(&path) {
            return Ok(cached);
        }
        let url = self.endpoint().url_for(&path, None, Some("children"))?;
        let response = self.api().get(&url).send().await?;
        let body: Value = response.json().await?;
        let mut items: Vec<DriveItem> = body
            .get("value")
            .and_then(|v| v.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| DriveItem::from_json(entry).ok())
                    .collect()
            })
            .unwrap_or_default();
        if items.is_empty() {
            // maybe the path is a file
            match self.info(&path).await {
                Ok(item) if item.is_file() => items = vec![item],
                Ok(_) => {}
                Err(GraphError::NotFound { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        self.cache().put(&path, items.clone());
        Ok(items)
    }

    /// List child paths only.
    pub async fn ls_names(&self, path: &str) -> Result<Vec<String>> {
        Ok(self.ls(path).await?.into_iter().map(|item| item.path).collect())
    }

    /// Metadata snapshot for the item at `path`.
    pub async fn info(&self, path: &str) -> Result<DriveItem> {
        let url = self.endpoint().url_for(path, None, None)?;
        let response = self.api().get(&url).send().await?;
        let body: Value = response.json().await?;
        DriveItem::from_json(&body)
    }

    /// Metadata via a known item id.
    pub async fn info_by_id(&self, item_id: &str) -> Result<DriveItem> {
        let url = self.endpoint().url_for("", Some(item_id), None)?;
        let response = self.api().get(&url).send().await?;
        let body: Value = response.json().await?;
        DriveItem::from_json(&body)
    }

    /// Metadata with an `expand` clause (`thumbnails`, `versions`, ...).
    ///
    /// Returns the parsed item plus the raw payload so callers can pull
    /// the expanded properties out themselves; the crate does not map
    /// them.
    pub async fn info_expanded(&self, path: &str, expand: &str) -> Result<(DriveItem, Value)> {
        let url = self.endpoint().url_for(path, None, None)?;
        let response = self.api().get(&url).query("expand", expand).send().await?;
        let body: Value = response.json().await?;
        let item = DriveItem::from_json(&body)?;
        Ok((item, body))
    }

    /// Whether an item exists at `path`. A 404 here is "absent", not an
    /// error.
    pub async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.item_id(path).await?.is_some())
    }

    /// Whether `path` points at a regular file.
    pub async fn is_file(&self, path: &str) -> Result<bool> {
        match self.info(path).await {
            Ok(item) => Ok(item.is_file()),
            Err(GraphError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Whether `path` points at a directory.
    pub async fn is_dir(&self, path: &str) -> Result<bool> {
        match self.info(path).await {
            Ok(item) => Ok(item.is_directory()),
            Err(GraphError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Current size of the item in bytes.
    pub async fn size_of(&self, path: &str) -> Result<u64> {
        Ok(self.info(path).await?.size)
    }

    /// Creation timestamp.
    pub async fn created(&self, path: &str) -> Result<DateTime<Utc>> {
        Ok(self.info(path).await?.created)
    }

    /// Last-modification timestamp.
    pub async fn modified(&self, path: &str) -> Result<DateTime<Utc>> {
        Ok(self.info(path).await?.modified)
    }

    /// Item id for `path`, `None` when the item does not exist.
    pub async fn item_id(&self, path: &str) -> Result<Option<String>> {
        let url = self.endpoint().url_for(path, None, None)?;
        match self.api().get(&url).query("select", "id").send().await {
            Ok(response) => {
                let body: Value = response.json().await?;
                Ok(body
                    .get("id")
                    .and_then(|v| v.as_str())
                    .map(str::to_string))
            }
            Err(GraphError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Item id for `path`, failing with NotFound when absent.
    pub(crate) async fn require_item_id(&self, path: &str) -> Result<String> {
        match self.item_id(path).await? {
            Some(id) => Ok(id),
            None => Err(GraphError::NotFound {
                path: path.to_string(),
            }),
        }
    }

    /// Minimal itemReference (`driveId` + `id`) for copy and move bodies.
    pub async fn item_reference(&self, path: &str) -> Result<Value> {
        let id = self.require_item_id(path).await?;
        Ok(serde_json::json!({ "driveId": self.drive_id(), "id": id }))
    }
}
