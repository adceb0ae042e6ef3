//! Directory-listing cache collaborator.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::fs::DriveItem;

/// Path-keyed cache of directory listings.
///
/// The crate only consumes this interface; callers that already hold
/// listing state (a sync engine, a FUSE layer) plug their own
/// implementation in. The crate mutates entries only after the remote
/// mutation they reflect has succeeded.
pub trait ListingCache: Send + Sync {
    /// Cached listing for `path`, if any.
    fn get(&self, path: &str) -> Option<Vec<DriveItem>>;
    /// Store a fresh listing for `path`.
    fn put(&self, path: &str, listing: Vec<DriveItem>);
    /// Drop the entry for `path`.
    fn invalidate(&self, path: &str);
}

/// Simple in-memory listing cache.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<DriveItem>>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<DriveItem>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl ListingCache for MemoryCache {
    fn get(&self, path: &str) -> Option<Vec<DriveItem>> {
        self.lock().get(path).cloned()
    }

    fn put(&self, path: &str, listing: Vec<DriveItem>) {
        self.lock().insert(path.to_string(), listing);
    }

    fn invalidate(&self, path: &str) {
        self.lock().remove(path);
    }
}

/// Cache that remembers nothing. The default when no cache is configured.
pub struct NoCache;

impl ListingCache for NoCache {
    fn get(&self, _path: &str) -> Option<Vec<DriveItem>> {
        None
    }

    fn put(&self, _path: &str, _listing: Vec<DriveItem>) {}

    fn invalidate(&self, _path: &str) {}
}

/// Repair stale parent listings after `path` was newly written.
///
/// Walks every prefix of the path (root, /a, /a/b, ...) and drops a
/// prefix's cached listing only when that listing does not already contain
/// the next component, so listings that already show the child survive.
/// The leaf entry itself is always dropped: its cached size is stale now.
pub(crate) fn invalidate_written_path(cache: &dyn ListingCache, path: &str) {
    let mut prefix = String::from("/");
    for part in path.trim_matches('/').split('/').filter(|p| !p.is_empty()) {
        let child = if prefix == "/" {
            format!("/{part}")
        } else {
            format!("{prefix}/{part}")
        };
        if let Some(listing) = cache.get(&prefix) {
            if !listing.iter().any(|item| item.path == child) {
                cache.invalidate(&prefix);
            }
        }
        prefix = child;
    }
    cache.invalidate(path);
}
