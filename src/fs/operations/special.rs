//! Graph-specific extras: raw content, version history, document locking
//! and previews.

use bytes::Bytes;
use serde_json::{Value, json};

use crate::drive::Drive;
use crate::error::{GraphError, Result};
use crate::fs::item::{ItemVersion, parse_timestamp};

impl Drive {
    /// Download the full content of a file in one request.
    ///
    /// `format` asks the service to convert on the fly, e.g. `pdf` for a
    /// docx item.
    pub async fn get_content(&self, path: &str, format: Option<&str>) -> Result<Bytes> {
        let url = self.endpoint().url_for(path, None, Some("content"))?;
        let mut request = self.api().get(&url);
        if let Some(format) = format {
            request = request.query("format", format);
        }
        let response = request.send().await?;
        Ok(response.bytes().await?)
    }

    /// Version history of a file, in service order (newest first).
    pub async fn versions(&self, path: &str) -> Result<Vec<ItemVersion>> {
        self.require_file(path).await?;
        let url = self.endpoint().url_for(path, None, Some("versions"))?;
        let response = self.api().get(&url).send().await?;
        let body: Value = response.json().await?;
        let mut versions = Vec::new();
        if let Some(entries) = body.get("value").and_then(|v| v.as_array()) {
            for entry in entries {
                versions.push(ItemVersion {
                    id: entry
                        .get("id")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    size: entry.get("size").and_then(|v| v.as_u64()).unwrap_or(0),
                    modified: parse_timestamp(
                        entry.get("lastModifiedDateTime").and_then(|v| v.as_str()),
                    ),
                });
            }
        }
        Ok(versions)
    }

    /// Check a file out, hiding edits from other users until check-in.
    pub async fn checkout(&self, path: &str) -> Result<()> {
        self.require_file(path).await?;
        let url = self.endpoint().url_for(path, None, Some("checkout"))?;
        self.api().post(&url).send().await?;
        Ok(())
    }

    /// Check a checked-out file back in, publishing the pending version.
    pub async fn checkin(&self, path: &str, comment: &str) -> Result<()> {
        self.require_file(path).await?;
        let url = self.endpoint().url_for(path, None, Some("checkin"))?;
        self.api()
            .post(&url)
            .json(json!({ "comment": comment }))
            .send()
            .await?;
        Ok(())
    }

    /// Short-lived embeddable preview URL for a file.
    pub async fn preview(&self, path: &str) -> Result<String> {
        self.require_file(path).await?;
        let url = self.endpoint().url_for(path, None, Some("preview"))?;
        let response = self.api().post(&url).send().await?;
        let body: Value = response.json().await?;
        body.get("getUrl")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                GraphError::UnexpectedResponse("preview response had no getUrl".to_string())
            })
    }

    async fn require_file(&self, path: &str) -> Result<()> {
        if !self.is_file(path).await? {
            return Err(GraphError::NotFound {
                path: path.to_string(),
            });
        }
        Ok(())
    }
}
