//! Directory and item mutation operations.

use chrono::Utc;
use serde_json::json;

use super::utils::{guess_content_type, split_parent};
use crate::api::endpoint::normalize_path;
use crate::drive::Drive;
use crate::error::{GraphError, Result};

impl Drive {
    /// Create a directory, returning its item id.
    ///
    /// The service creates one level per request; with `create_parents`
    /// missing ancestors are created first.
    pub async fn mkdir(&self, path: &str, create_parents: bool) -> Result<String> {
        let path = normalize_path(path)?;
        if path == "/" {
            return Err(GraphError::Validation(
                "cannot create the drive root".to_string(),
            ));
        }
        let (parent, name) = split_parent(&path)?;
        let parent_id = match self.item_id(&parent).await? {
            Some(id) => id,
            None => {
                if !create_parents {
                    return Err(GraphError::NotFound { path: parent });
                }
                self.make_ancestors(&parent).await?
            }
        };
        let id = self.create_child_dir(&parent_id, &name, &path).await?;
        self.cache().invalidate(&parent);
        Ok(id)
    }

    /// `mkdir -p`: create with parents, optionally tolerating an existing
    /// directory.
    pub async fn makedirs(&self, path: &str, exist_ok: bool) -> Result<()> {
        match self.mkdir(path, true).await {
            Ok(_) => Ok(()),
            Err(GraphError::AlreadyExists { .. }) if exist_ok => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Delete a single file.
    pub async fn rm_file(&self, path: &str) -> Result<()> {
        if !self.is_file(path).await? {
            return Err(GraphError::NotFound {
                path: path.to_string(),
            });
        }
        self.delete_item(path, None).await
    }

    /// Delete an item. Deleting a directory without `recursive` requires
    /// it to be empty.
    pub async fn rm(&self, path: &str, recursive: bool) -> Result<()> {
        if !recursive && self.is_dir(path).await? && !self.ls(path).await?.is_empty() {
            return Err(GraphError::DirectoryNotEmpty {
                path: path.to_string(),
            });
        }
        self.delete_item(path, None).await
    }

    /// Delete an empty directory.
    pub async fn rmdir(&self, path: &str) -> Result<()> {
        if !self.is_dir(path).await? {
            return Err(GraphError::NotFound {
                path: path.to_string(),
            });
        }
        if !self.ls(path).await?.is_empty() {
            return Err(GraphError::DirectoryNotEmpty {
                path: path.to_string(),
            });
        }
        let id = self.require_item_id(path).await?;
        self.delete_item(path, Some(&id)).await
    }

    /// Move (or rename) an item.
    ///
    /// Moving onto an existing directory moves into it; otherwise the
    /// last component of `dst` becomes the new name.
    pub async fn mv(&self, src: &str, dst: &str) -> Result<()> {
        let source_id = self.require_item_id(src).await?;
        let url = self.endpoint().url_for(src, Some(&source_id), None)?;
        let dst = normalize_path(dst)?;
        let mut body = json!({});
        match self.item_id(&dst).await? {
            Some(_) => {
                body["parentReference"] = self.item_reference(&dst).await?;
            }
            None => {
                let (parent, name) = split_parent(&dst)?;
                body["parentReference"] = self.item_reference(&parent).await?;
                body["name"] = json!(name);
            }
        }
        self.api().patch(&url).json(body).send().await?;
        self.invalidate_entry(src);
        self.invalidate_entry(&dst);
        Ok(())
    }

    /// Create an empty file, truncate an existing one, or refresh its
    /// modification time.
    ///
    /// With `truncate` an existing item's content is replaced with zero
    /// bytes; without it only `lastModifiedDateTime` is bumped. A missing
    /// item is created empty either way, with a media type guessed from
    /// the path.
    pub async fn touch(&self, path: &str, truncate: bool) -> Result<()> {
        let path = normalize_path(path)?;
        match self.item_id(&path).await? {
            Some(id) if truncate => {
                let url = self.endpoint().url_for(&path, Some(&id), Some("content"))?;
                self.api()
                    .put(&url)
                    .query("@microsoft.graph.conflictBehavior", "replace")
                    .header("Content-Type", "application/octet-stream")
                    .bytes(Vec::new())
                    .send()
                    .await?;
            }
            Some(id) => {
                let url = self.endpoint().url_for(&path, Some(&id), None)?;
                self.api()
                    .patch(&url)
                    .json(json!({ "lastModifiedDateTime": Utc::now().to_rfc3339() }))
                    .send()
                    .await?;
            }
            None => {
                let (parent, name) = split_parent(&path)?;
                let parent_id = self.require_item_id(&parent).await?;
                let composite = format!("{parent_id}:/{name}:");
                let url = self
                    .endpoint()
                    .url_for(&path, Some(&composite), Some("content"))?;
                self.api()
                    .put(&url)
                    .query("@microsoft.graph.conflictBehavior", "replace")
                    .header("Content-Type", &guess_content_type(&path))
                    .bytes(Vec::new())
                    .send()
                    .await?;
            }
        }
        self.invalidate_entry(&path);
        Ok(())
    }

    /// Create every missing directory along `path`, returning the id of
    /// the deepest one.
    async fn make_ancestors(&self, path: &str) -> Result<String> {
        let mut current = "/".to_string();
        let mut current_id = self.require_item_id("/").await?;
        for part in path.trim_matches('/').split('/').filter(|p| !p.is_empty()) {
            let next = if current == "/" {
                format!("/{part}")
            } else {
                format!("{current}/{part}")
            };
            current_id = match self.item_id(&next).await? {
                Some(id) => id,
                None => {
                    let id = self.create_child_dir(&current_id, part, &next).await?;
                    self.cache().invalidate(&current);
                    id
                }
            };
            current = next;
        }
        Ok(current_id)
    }

    /// One-level directory creation under a known parent id. A 409 from
    /// the service maps to AlreadyExists.
    async fn create_child_dir(&self, parent_id: &str, name: &str, full_path: &str) -> Result<String> {
        let url = self
            .endpoint()
            .url_for(full_path, Some(parent_id), Some("children"))?;
        let response = match self
            .api()
            .post(&url)
            .json(json!({
                "name": name,
                "folder": {},
                "@microsoft.graph.conflictBehavior": "fail",
            }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(GraphError::Server { status: 409, .. }) => {
                return Err(GraphError::AlreadyExists {
                    path: full_path.to_string(),
                });
            }
            Err(err) => return Err(err),
        };
        let body: serde_json::Value = response.json().await?;
        body.get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                GraphError::UnexpectedResponse("directory creation response had no id".to_string())
            })
    }

    /// Remove an item, honoring the recycle-bin policy: a plain delete
    /// recycles, `permanentDelete` does not.
    pub(crate) async fn delete_item(&self, path: &str, item_id: Option<&str>) -> Result<()> {
        let id = match item_id {
            Some(id) => id.to_string(),
            None => self.require_item_id(path).await?,
        };
        if self.config().use_recycle_bin {
            let url = self.endpoint().url_for(path, Some(&id), None)?;
            self.api().delete(&url).send().await?;
        } else {
            let url = self
                .endpoint()
                .url_for(path, Some(&id), Some("permanentDelete"))?;
            self.api().post(&url).send().await?;
        }
        self.invalidate_entry(path);
        Ok(())
    }
}
