//! Buffered file handles.

use std::io::SeekFrom;

use bytes::Bytes;

use super::operations::utils::guess_content_type;
use crate::drive::Drive;
use crate::error::{GraphError, Result};
use crate::fs::item::ItemRef;
use crate::fs::upload_session::{UPLOAD_ALIGNMENT, UploadSession};

/// Open mode for a drive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Random-access reads.
    Read,
    /// Replace the remote content on commit.
    Write,
    /// Extend the existing remote content on commit.
    Append,
}

impl FileMode {
    fn readable(&self) -> bool {
        *self == FileMode::Read
    }

    fn writable(&self) -> bool {
        !self.readable()
    }
}

/// Buffered handle to one remote file.
///
/// Reads issue clamped byte-range requests. Writes accumulate in memory
/// and are shipped on [`commit`](DriveFile::commit): small content in a
/// single replace request, anything past the blocksize threshold through
/// a resumable upload session in block-aligned chunks. One logical
/// operation is in flight at a time; callers serialize access to a handle
/// themselves.
pub struct DriveFile {
    drive: Drive,
    item: ItemRef,
    mode: FileMode,
    /// Read cursor, or total logical bytes written (hydrated content
    /// included) in write modes.
    loc: u64,
    size: u64,
    buffer: Vec<u8>,
    session: Option<UploadSession>,
    blocksize: usize,
    write_called: bool,
    hydrated: bool,
    closed: bool,
}

impl DriveFile {
    pub(crate) fn new(
        drive: Drive,
        item: ItemRef,
        mode: FileMode,
        size: u64,
        blocksize: usize,
    ) -> Result<Self> {
        if mode.writable() && (blocksize == 0 || blocksize % UPLOAD_ALIGNMENT != 0) {
            return Err(GraphError::Validation(format!(
                "blocksize must be a non-zero multiple of {UPLOAD_ALIGNMENT} bytes"
            )));
        }
        let loc = if mode == FileMode::Append { size } else { 0 };
        Ok(Self {
            drive,
            item,
            mode,
            loc,
            size,
            buffer: Vec::new(),
            session: None,
            blocksize,
            write_called: false,
            hydrated: false,
            closed: false,
        })
    }

    /// Logical path of the target item.
    pub fn path(&self) -> &str {
        &self.item.path
    }

    /// Mode the handle was opened in.
    pub fn mode(&self) -> FileMode {
        self.mode
    }

    /// Size known at open time (read and append modes).
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Current cursor position.
    pub fn tell(&self) -> u64 {
        self.loc
    }

    /// Move the read cursor.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        if !self.mode.readable() {
            return Err(GraphError::Validation(
                "seek is only supported in read mode".to_string(),
            ));
        }
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::Current(delta) => self.loc as i64 + delta,
            SeekFrom::End(delta) => self.size as i64 + delta,
        };
        if target < 0 {
            return Err(GraphError::Validation(
                "cannot seek before the start of the file".to_string(),
            ));
        }
        self.loc = target as u64;
        Ok(self.loc)
    }

    /// Read up to `len` bytes from the cursor, advancing it.
    pub async fn read(&mut self, len: usize) -> Result<Bytes> {
        let start = self.loc;
        let end = start.saturating_add(len as u64);
        let data = self.read_range(start, end).await?;
        self.loc += data.len() as u64;
        Ok(data)
    }

    /// Read the byte range `[start, end)`.
    ///
    /// The end is clamped to the known size; a range that is empty or
    /// inverted after clamping returns empty without a network call. That
    /// is the defined behavior for reading past end of file.
    pub async fn read_range(&self, start: u64, end: u64) -> Result<Bytes> {
        if !self.mode.readable() {
            return Err(GraphError::Validation(
                "handle is not open for reading".to_string(),
            ));
        }
        let end = end.min(self.size);
        if start >= end {
            return Ok(Bytes::new());
        }
        let url = self.drive.endpoint().url_for(
            &self.item.path,
            self.item.id.as_deref(),
            Some("content"),
        )?;
        let response = self
            .drive
            .api()
            .get(&url)
            .header("Range", &format!("bytes={}-{}", start, end - 1))
            .send()
            .await?;
        Ok(response.bytes().await?)
    }

    /// Append bytes to the write buffer.
    ///
    /// The first write on an append handle hydrates the buffer with the
    /// existing remote content, exactly once, so commit re-uploads old
    /// plus new bytes. Once the buffer passes the blocksize threshold an
    /// upload session is opened and aligned chunks start flowing.
    pub async fn write(&mut self, data: &[u8]) -> Result<usize> {
        if !self.mode.writable() {
            return Err(GraphError::Validation(
                "handle is not open for writing".to_string(),
            ));
        }
        if self.closed {
            return Err(GraphError::Validation(
                "handle is already closed".to_string(),
            ));
        }
        if self.mode == FileMode::Append && !self.hydrated {
            self.hydrate().await?;
        }
        self.write_called = true;
        self.buffer.extend_from_slice(data);
        self.loc += data.len() as u64;
        if self.buffer.len() >= self.blocksize {
            self.flush_chunks(false).await?;
        }
        Ok(data.len())
    }

    /// Flush buffered content and finalize the handle.
    ///
    /// Calling commit twice is a no-op: the first call fully clears the
    /// buffered and session state. A commit on an expired session fails
    /// with [`GraphError::UploadSessionExpired`] and is reported to the
    /// caller, never swallowed.
    pub async fn commit(&mut self) -> Result<()> {
        if self.closed || self.mode == FileMode::Read {
            return Ok(());
        }
        let append_no_write = self.mode == FileMode::Append && !self.write_called;
        if append_no_write {
            // an untouched append handle must never truncate the remote
            // content, so only the session (if any) is cleaned up
            self.abort_session().await;
        } else if self.loc == 0 {
            log::debug!("empty commit of {}, touching instead of uploading", self.item.path);
            self.abort_session().await;
            self.drive.touch(&self.item.path, true).await?;
        } else if self.session.is_none() {
            log::debug!(
                "one-shot upload of {} ({} bytes)",
                self.item.path,
                self.buffer.len()
            );
            let data = std::mem::take(&mut self.buffer);
            self.upload_content_at_once(&data).await?;
        } else {
            if let Some(session) = self.session.as_ref() {
                if session.is_expired() {
                    return Err(GraphError::UploadSessionExpired);
                }
            }
            self.flush_chunks(true).await?;
            if let Some(session) = self.session.take() {
                session.commit(self.drive.api()).await?;
            }
        }
        self.buffer = Vec::new();
        self.closed = true;
        if !append_no_write {
            self.drive.invalidate_after_write(&self.item.path);
        }
        Ok(())
    }

    /// Drop buffered bytes and abort any open session without committing.
    ///
    /// Never fails: if the abort request is lost, the session's own expiry
    /// reclaims it server-side.
    pub async fn discard(&mut self) {
        self.abort_session().await;
        self.buffer = Vec::new();
        self.closed = true;
    }

    /// Pull the current remote content into the buffer before the first
    /// appended byte.
    async fn hydrate(&mut self) -> Result<()> {
        let url = self.drive.endpoint().url_for(
            &self.item.path,
            self.item.id.as_deref(),
            Some("content"),
        )?;
        let response = self.drive.api().get(&url).send().await?;
        let content = response.bytes().await?;
        self.loc = content.len() as u64;
        self.buffer = content.to_vec();
        self.hydrated = true;
        Ok(())
    }

    /// Ship the buffer through the upload session, opening it on first
    /// use.
    async fn flush_chunks(&mut self, is_final: bool) -> Result<()> {
        if self.session.is_none() {
            let create_url = self.upload_target_url("createUploadSession").await?;
            self.session = Some(UploadSession::create(self.drive.api(), &create_url).await?);
        }
        let data = std::mem::take(&mut self.buffer);
        if let Some(session) = self.session.as_mut() {
            session.upload(self.drive.api(), &data, is_final).await?;
        }
        Ok(())
    }

    /// Single content replace with a guessed media type; the small-file
    /// path that trades one extra round trip for skipping the session.
    async fn upload_content_at_once(&mut self, data: &[u8]) -> Result<()> {
        let url = self.upload_target_url("content").await?;
        self.drive
            .api()
            .put(&url)
            .query("@microsoft.graph.conflictBehavior", "replace")
            .header("Content-Type", &guess_content_type(&self.item.path))
            .bytes(data.to_vec())
            .send()
            .await?;
        Ok(())
    }

    /// URL for a content-affecting action on the target, switching to the
    /// composite `parent-id:/name:` token when the file does not exist
    /// remotely yet.
    async fn upload_target_url(&mut self, action: &str) -> Result<String> {
        if self.item.id.is_none() {
            self.item.id = self.drive.item_id(&self.item.path).await?;
        }
        match &self.item.id {
            Some(id) => {
                let id = id.clone();
                self.drive
                    .endpoint()
                    .url_for(&self.item.path, Some(&id), Some(action))
            }
            None => {
                let (parent, name) = super::operations::utils::split_parent(&self.item.path)?;
                let parent_id = self.drive.require_item_id(&parent).await?;
                let composite = format!("{parent_id}:/{name}:");
                self.drive
                    .endpoint()
                    .url_for(&self.item.path, Some(&composite), Some(action))
            }
        }
    }

    async fn abort_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.abort(self.drive.api()).await;
        }
    }
}
