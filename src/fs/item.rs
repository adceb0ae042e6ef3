//! Drive item metadata types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::Result;

/// Item kind derived from the driveItem facets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// Regular file
    File,
    /// Folder/directory
    Directory,
    /// Anything else the service can hold (packages, remote items, ...)
    Other,
}

impl ItemKind {
    /// Check if this kind is a regular file.
    pub fn is_file(&self) -> bool {
        *self == ItemKind::File
    }

    /// Check if this kind is a directory.
    pub fn is_directory(&self) -> bool {
        *self == ItemKind::Directory
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawParentReference {
    pub path: Option<String>,
    #[allow(dead_code)]
    pub id: Option<String>,
    #[allow(dead_code)]
    pub drive_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawFileFacet {
    pub mime_type: Option<String>,
}

/// Raw driveItem payload, trimmed to the fields the crate consumes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDriveItem {
    pub id: Option<String>,
    pub name: Option<String>,
    pub size: Option<u64>,
    pub e_tag: Option<String>,
    pub created_date_time: Option<String>,
    pub last_modified_date_time: Option<String>,
    pub parent_reference: Option<RawParentReference>,
    pub file: Option<RawFileFacet>,
    pub folder: Option<serde_json::Value>,
}

/// Metadata snapshot of one drive item.
///
/// Immutable once parsed; re-fetch for fresh state. `etag` is the opaque
/// version tag the service changes whenever content or metadata change,
/// usable for change detection without interpreting its format.
#[derive(Debug, Clone)]
pub struct DriveItem {
    /// Full logical path, e.g. `/reports/q3.csv`.
    pub path: String,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// File, directory or other.
    pub kind: ItemKind,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Last modification timestamp.
    pub modified: DateTime<Utc>,
    /// Opaque version tag.
    pub etag: Option<String>,
    /// Stable item identifier.
    pub id: Option<String>,
    /// Media type reported by the service (files only).
    pub mime_type: Option<String>,
}

impl DriveItem {
    /// Last path component.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Check if this item is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Check if this item is a directory.
    pub fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }

    pub(crate) fn from_json(value: &serde_json::Value) -> Result<Self> {
        let raw: RawDriveItem = serde_json::from_value(value.clone())?;
        Ok(Self::from_raw(raw))
    }

    pub(crate) fn from_raw(raw: RawDriveItem) -> Self {
        let kind = if raw.folder.is_some() {
            ItemKind::Directory
        } else if raw.file.is_some() {
            ItemKind::File
        } else {
            ItemKind::Other
        };
        Self {
            path: item_path(&raw),
            size: raw.size.unwrap_or(0),
            kind,
            created: parse_timestamp(raw.created_date_time.as_deref()),
            modified: parse_timestamp(raw.last_modified_date_time.as_deref()),
            etag: raw.e_tag,
            id: raw.id,
            mime_type: raw.file.and_then(|f| f.mime_type),
        }
    }
}

/// Target of an open handle: the logical path plus the item id once it has
/// been resolved.
///
/// After first resolution at least one of the two is always known; the id
/// is preferred for requests because it stays stable across renames within
/// one operation chain.
#[derive(Debug, Clone)]
pub struct ItemRef {
    pub path: String,
    pub id: Option<String>,
}

/// One entry from a file's version history.
#[derive(Debug, Clone)]
pub struct ItemVersion {
    pub id: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Full path of an item: the part of `parentReference.path` after `root:`
/// joined with the item name. The drive root itself comes back as `/`.
fn item_path(raw: &RawDriveItem) -> String {
    let Some(parent) = raw
        .parent_reference
        .as_ref()
        .and_then(|p| p.path.as_deref())
    else {
        return "/".to_string();
    };
    let tail = parent.split_once("root:").map(|(_, t)| t).unwrap_or("");
    let mut parent_path = tail.to_string();
    if !parent_path.is_empty() && !parent_path.starts_with('/') {
        parent_path = format!("/{parent_path}");
    }
    let name = raw.name.as_deref().unwrap_or("");
    format!("{parent_path}/{name}")
}

/// RFC 3339 timestamp, falling back to the epoch on absent or malformed
/// input (the service is not contractually obliged to send these fields).
pub(crate) fn parse_timestamp(value: Option<&str>) -> DateTime<Utc> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_file_item() {
        let value = json!({
            "id": "ID1",
            "name": "report.csv",
            "size": 1234,
            "eTag": "\"{AAAA},1\"",
            "createdDateTime": "2024-03-01T10:00:00Z",
            "lastModifiedDateTime": "2024-03-02T11:30:00Z",
            "parentReference": {
                "driveId": "d1",
                "id": "P1",
                "path": "/drives/d1/root:/reports"
            },
            "file": { "mimeType": "text/csv" }
        });

        let item = DriveItem::from_json(&value).unwrap();
        assert_eq!(item.path, "/reports/report.csv");
        assert_eq!(item.name(), "report.csv");
        assert_eq!(item.size, 1234);
        assert!(item.is_file());
        assert_eq!(item.id.as_deref(), Some("ID1"));
        assert_eq!(item.etag.as_deref(), Some("\"{AAAA},1\""));
        assert_eq!(item.mime_type.as_deref(), Some("text/csv"));
        assert_eq!(item.created.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_parse_directory_in_root() {
        let value = json!({
            "id": "ID2",
            "name": "reports",
            "size": 0,
            "parentReference": { "driveId": "d1", "path": "/drives/d1/root:" },
            "folder": { "childCount": 3 }
        });

        let item = DriveItem::from_json(&value).unwrap();
        assert_eq!(item.path, "/reports");
        assert!(item.is_directory());
        assert!(item.mime_type.is_none());
    }

    #[test]
    fn test_parse_drive_root_itself() {
        let value = json!({
            "id": "ROOT",
            "name": "root",
            "folder": {}
        });

        let item = DriveItem::from_json(&value).unwrap();
        assert_eq!(item.path, "/");
    }

    #[test]
    fn test_missing_timestamps_fall_back_to_epoch() {
        let value = json!({ "id": "X", "name": "x", "file": {} });
        let item = DriveItem::from_json(&value).unwrap();
        assert_eq!(item.created, DateTime::UNIX_EPOCH);
        assert_eq!(item.modified, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_unknown_facet_is_other() {
        let value = json!({ "id": "X", "name": "pkg", "package": {} });
        let item = DriveItem::from_json(&value).unwrap();
        assert_eq!(item.kind, ItemKind::Other);
        assert!(!item.is_file());
        assert!(!item.is_directory());
    }
}
