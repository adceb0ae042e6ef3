//! Resumable upload sessions.
//!
//! Large writes go through a server-side upload session: create, feed
//! block-aligned chunks, then commit or abort. Sessions are created in
//! deferred mode, so the remote item is not materialized until the
//! explicit commit.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::api::ApiClient;
use crate::error::{GraphError, Result};

/// Chunk alignment the service mandates for every non-final chunk.
pub const UPLOAD_ALIGNMENT: usize = 320 * 1024;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionInfo {
    upload_url: String,
    expiration_date_time: String,
}

/// State of one resumable upload.
///
/// `next_offset` only moves forward, always by a multiple of the alignment
/// except for the final chunk. Bytes that do not yet fill an aligned block
/// wait in `pending` and are prepended to the next chunk, so byte order on
/// the wire matches write order exactly.
#[derive(Debug)]
pub(crate) struct UploadSession {
    upload_url: String,
    expires_at: DateTime<Utc>,
    next_offset: u64,
    pending: Vec<u8>,
    alignment: usize,
}

impl UploadSession {
    /// Open a session against a `createUploadSession` URL.
    ///
    /// Conflict behavior is fixed to replace and the commit is deferred,
    /// so nothing becomes visible remotely before `commit`.
    pub(crate) async fn create(api: &ApiClient, create_url: &str) -> Result<Self> {
        let response = api
            .post(create_url)
            .json(json!({
                "@microsoft.graph.conflictBehavior": "replace",
                "deferCommit": true,
            }))
            .send()
            .await?;
        let info: SessionInfo = response.json().await?;
        let expires_at = parse_expiry(&info.expiration_date_time)?;
        Ok(Self {
            upload_url: info.upload_url,
            expires_at,
            next_offset: 0,
            pending: Vec::new(),
            alignment: UPLOAD_ALIGNMENT,
        })
    }

    /// Whether the server-side session has passed its expiry.
    pub(crate) fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Feed bytes into the session.
    ///
    /// Everything that fills an aligned block is sent immediately, in
    /// strictly increasing offset order; a non-final remainder stays
    /// pending. `is_final` flushes the remainder as the (possibly short)
    /// last chunk.
    pub(crate) async fn upload(
        &mut self,
        api: &ApiClient,
        data: &[u8],
        is_final: bool,
    ) -> Result<()> {
        let chunks = split_aligned(&mut self.pending, data, self.alignment, is_final);
        for chunk in chunks {
            self.send_chunk(api, chunk).await?;
        }
        Ok(())
    }

    async fn send_chunk(&mut self, api: &ApiClient, chunk: Vec<u8>) -> Result<()> {
        let start = self.next_offset;
        let length = chunk.len() as u64;
        let end = start + length - 1;
        let response = api
            .put(&self.upload_url)
            .header("Content-Range", &format!("bytes {start}-{end}/*"))
            .bytes(chunk)
            .send()
            .await?;
        // every accepted chunk refreshes the expiry window
        if let Ok(value) = response.json::<serde_json::Value>().await {
            if let Some(expiry) = value.get("expirationDateTime").and_then(|v| v.as_str()) {
                if let Ok(expires_at) = parse_expiry(expiry) {
                    self.expires_at = expires_at;
                }
            }
        }
        self.next_offset += length;
        Ok(())
    }

    /// Commit the session, materializing the item remotely.
    pub(crate) async fn commit(self, api: &ApiClient) -> Result<()> {
        if self.is_expired() {
            return Err(GraphError::UploadSessionExpired);
        }
        api.post(&self.upload_url).send().await?;
        Ok(())
    }

    /// Abort the session and drop its state.
    ///
    /// The delete is only issued while the session is live; an expired
    /// session is already server-side garbage. A failed delete is left to
    /// the session's own TTL to reclaim, so this never fails.
    pub(crate) async fn abort(self, api: &ApiClient) {
        if !self.is_expired() {
            if let Err(err) = api.delete(&self.upload_url).send().await {
                log::debug!(
                    "upload session abort failed, leaving expiry to reclaim it: {}",
                    err
                );
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests(upload_url: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            upload_url: upload_url.to_string(),
            expires_at,
            next_offset: 0,
            pending: Vec::new(),
            alignment: UPLOAD_ALIGNMENT,
        }
    }
}

/// Merge `data` into the pending tail and carve off every full aligned
/// block, in order. With `is_final` the remainder is emitted as the last
/// (possibly short) chunk instead of being retained.
fn split_aligned(
    pending: &mut Vec<u8>,
    data: &[u8],
    alignment: usize,
    is_final: bool,
) -> Vec<Vec<u8>> {
    pending.extend_from_slice(data);
    let mut chunks = Vec::new();
    while pending.len() >= alignment {
        chunks.push(pending.drain(..alignment).collect());
    }
    if is_final && !pending.is_empty() {
        chunks.push(std::mem::take(pending));
    }
    chunks
}

fn parse_expiry(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| {
            GraphError::UnexpectedResponse(format!("invalid expiration timestamp {value:?}: {err}"))
        })
}
