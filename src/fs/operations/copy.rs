//! Server-side copy orchestration.
//!
//! Copies are asynchronous on the service side: the copy request is only
//! accepted, and completion is observed by polling a monitor URL returned
//! in the `Location` header.

use serde_json::{Value, json};
use tokio::time::sleep;

use super::utils::split_parent;
use crate::api::endpoint::normalize_path;
use crate::drive::Drive;
use crate::error::{GraphError, Result};

/// State reported by a copy monitor URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyState {
    NotStarted,
    InProgress,
    Completed,
    Failed,
    /// Anything the service may add later.
    Other(String),
}

impl CopyState {
    fn parse(value: &str) -> Self {
        match value {
            "notStarted" => CopyState::NotStarted,
            "inProgress" => CopyState::InProgress,
            "completed" => CopyState::Completed,
            "failed" => CopyState::Failed,
            other => CopyState::Other(other.to_string()),
        }
    }
}

/// One poll of a copy monitor URL.
#[derive(Debug, Clone)]
pub struct CopyStatus {
    pub state: CopyState,
    pub percent_complete: Option<f64>,
    pub resource_id: Option<String>,
}

impl Drive {
    /// Copy `src` to `dst` and wait for the server-side operation to
    /// finish, polling the monitor URL at the configured interval.
    pub async fn copy(&self, src: &str, dst: &str) -> Result<()> {
        let dst = normalize_path(dst)?;
        let monitor = self.copy_nowait(src, &dst).await?;
        loop {
            let status = self.copy_status(&monitor).await?;
            match status.state {
                CopyState::Completed => break,
                CopyState::Failed => return Err(GraphError::CopyFailed),
                _ => sleep(self.config().copy_poll_interval).await,
            }
        }
        self.invalidate_entry(&dst);
        Ok(())
    }

    /// Start a copy and return the monitor URL without waiting.
    ///
    /// Monitor URLs are temporary and self-authorizing, so they can be
    /// handed to another process or machine to watch progress via
    /// [`copy_status`](Drive::copy_status).
    pub async fn copy_nowait(&self, src: &str, dst: &str) -> Result<String> {
        let source_id = self.require_item_id(src).await?;
        let url = self.endpoint().url_for(src, Some(&source_id), Some("copy"))?;
        let dst = normalize_path(dst)?;
        let (parent, name) = split_parent(&dst)?;
        let reference = self.item_reference(&parent).await?;
        let response = self
            .api()
            .post(&url)
            .json(json!({ "parentReference": reference, "name": name }))
            .send()
            .await?;
        response
            .headers()
            .get("Location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                GraphError::UnexpectedResponse(
                    "copy accepted without a monitor location".to_string(),
                )
            })
    }

    /// One status poll against a monitor URL.
    ///
    /// The URL embeds its own time-limited token and rejects the store's
    /// standard credentials, so this is a bare GET.
    pub async fn copy_status(&self, monitor_url: &str) -> Result<CopyStatus> {
        let response = self.api().get(monitor_url).unauthenticated().send().await?;
        let body: Value = response.json().await?;
        let state = body
            .get("status")
            .and_then(|v| v.as_str())
            .map(CopyState::parse)
            .unwrap_or(CopyState::Other("unknown".to_string()));
        Ok(CopyStatus {
            state,
            percent_complete: body.get("percentageComplete").and_then(|v| v.as_f64()),
            resource_id: body
                .get("resourceId")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        })
    }
}
