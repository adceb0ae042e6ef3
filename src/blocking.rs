//! Blocking flavor of the client.
//!
//! Wraps the async types in an owned current-thread tokio runtime so every
//! network call (and every retry backoff) runs to completion on the calling
//! thread, the way `reqwest::blocking` wraps `reqwest`. Both flavors drive
//! the same handle and upload-session state, so behavior is identical by
//! construction.
//!
//! Do not use this module from inside an async runtime; call the async
//! [`crate::Drive`] directly there.

use std::io::SeekFrom;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::runtime::{Builder, Runtime};

use crate::error::Result;
use crate::fs::{CopyStatus, DriveItem, FileMode, ItemVersion};

/// Blocking client for one Graph drive.
pub struct Drive {
    inner: crate::Drive,
    runtime: Arc<Runtime>,
}

impl Drive {
    /// Wrap an async client for blocking use.
    pub fn new(inner: crate::Drive) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            inner,
            runtime: Arc::new(runtime),
        })
    }

    /// The wrapped async client.
    pub fn inner(&self) -> &crate::Drive {
        &self.inner
    }

    /// Open a file. See [`crate::Drive::open`].
    pub fn open(&self, path: &str, mode: FileMode) -> Result<DriveFile> {
        let file = self.runtime.block_on(self.inner.open(path, mode))?;
        Ok(DriveFile {
            inner: file,
            runtime: self.runtime.clone(),
        })
    }

    /// Open with a size hint. See [`crate::Drive::open_with_size`].
    pub fn open_with_size(
        &self,
        path: &str,
        mode: FileMode,
        size_hint: Option<u64>,
    ) -> Result<DriveFile> {
        let file = self
            .runtime
            .block_on(self.inner.open_with_size(path, mode, size_hint))?;
        Ok(DriveFile {
            inner: file,
            runtime: self.runtime.clone(),
        })
    }

    pub fn ls(&self, path: &str) -> Result<Vec<DriveItem>> {
        self.runtime.block_on(self.inner.ls(path))
    }

    pub fn ls_names(&self, path: &str) -> Result<Vec<String>> {
        self.runtime.block_on(self.inner.ls_names(path))
    }

    pub fn info(&self, path: &str) -> Result<DriveItem> {
        self.runtime.block_on(self.inner.info(path))
    }

    pub fn exists(&self, path: &str) -> Result<bool> {
        self.runtime.block_on(self.inner.exists(path))
    }

    pub fn is_file(&self, path: &str) -> Result<bool> {
        self.runtime.block_on(self.inner.is_file(path))
    }

    pub fn is_dir(&self, path: &str) -> Result<bool> {
        self.runtime.block_on(self.inner.is_dir(path))
    }

    pub fn size_of(&self, path: &str) -> Result<u64> {
        self.runtime.block_on(self.inner.size_of(path))
    }

    pub fn created(&self, path: &str) -> Result<DateTime<Utc>> {
        self.runtime.block_on(self.inner.created(path))
    }

    pub fn modified(&self, path: &str) -> Result<DateTime<Utc>> {
        self.runtime.block_on(self.inner.modified(path))
    }

    pub fn mkdir(&self, path: &str, create_parents: bool) -> Result<String> {
        self.runtime.block_on(self.inner.mkdir(path, create_parents))
    }

    pub fn makedirs(&self, path: &str, exist_ok: bool) -> Result<()> {
        self.runtime.block_on(self.inner.makedirs(path, exist_ok))
    }

    pub fn rm(&self, path: &str, recursive: bool) -> Result<()> {
        self.runtime.block_on(self.inner.rm(path, recursive))
    }

    pub fn rm_file(&self, path: &str) -> Result<()> {
        self.runtime.block_on(self.inner.rm_file(path))
    }

    pub fn rmdir(&self, path: &str) -> Result<()> {
        self.runtime.block_on(self.inner.rmdir(path))
    }

    pub fn mv(&self, src: &str, dst: &str) -> Result<()> {
        self.runtime.block_on(self.inner.mv(src, dst))
    }

    pub fn touch(&self, path: &str, truncate: bool) -> Result<()> {
        self.runtime.block_on(self.inner.touch(path, truncate))
    }

    pub fn copy(&self, src: &str, dst: &str) -> Result<()> {
        self.runtime.block_on(self.inner.copy(src, dst))
    }

    pub fn copy_nowait(&self, src: &str, dst: &str) -> Result<String> {
        self.runtime.block_on(self.inner.copy_nowait(src, dst))
    }

    pub fn copy_status(&self, monitor_url: &str) -> Result<CopyStatus> {
        self.runtime.block_on(self.inner.copy_status(monitor_url))
    }

    pub fn get_content(&self, path: &str, format: Option<&str>) -> Result<Bytes> {
        self.runtime.block_on(self.inner.get_content(path, format))
    }

    pub fn versions(&self, path: &str) -> Result<Vec<ItemVersion>> {
        self.runtime.block_on(self.inner.versions(path))
    }

    pub fn checkout(&self, path: &str) -> Result<()> {
        self.runtime.block_on(self.inner.checkout(path))
    }

    pub fn checkin(&self, path: &str, comment: &str) -> Result<()> {
        self.runtime.block_on(self.inner.checkin(path, comment))
    }

    pub fn preview(&self, path: &str) -> Result<String> {
        self.runtime.block_on(self.inner.preview(path))
    }
}

/// Blocking file handle; see [`crate::DriveFile`] for semantics.
pub struct DriveFile {
    inner: crate::DriveFile,
    runtime: Arc<Runtime>,
}

impl DriveFile {
    pub fn path(&self) -> &str {
        self.inner.path()
    }

    pub fn mode(&self) -> FileMode {
        self.inner.mode()
    }

    pub fn size(&self) -> u64 {
        self.inner.size()
    }

    pub fn tell(&self) -> u64 {
        self.inner.tell()
    }

    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.inner.seek(pos)
    }

    pub fn read(&mut self, len: usize) -> Result<Bytes> {
        self.runtime.block_on(self.inner.read(len))
    }

    pub fn read_range(&self, start: u64, end: u64) -> Result<Bytes> {
        self.runtime.block_on(self.inner.read_range(start, end))
    }

    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.runtime.block_on(self.inner.write(data))
    }

    pub fn commit(&mut self) -> Result<()> {
        self.runtime.block_on(self.inner.commit())
    }

    pub fn discard(&mut self) {
        self.runtime.block_on(self.inner.discard())
    }
}
