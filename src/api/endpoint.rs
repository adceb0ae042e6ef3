//! Request-target resolution for drive items.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use crate::error::{GraphError, Result};

/// Characters escaped inside the path form of an item URL. `/` stays raw
/// so path separators survive.
const PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\');

/// Base URL of the public Graph service.
const DEFAULT_GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Builds concrete request targets for one drive.
///
/// Pure string work, no I/O. Every caller that holds an item id passes it
/// in: the identifier form is preferred because ids stay stable for the
/// rest of an operation chain even if a concurrent rename moves the path.
#[derive(Debug, Clone)]
pub struct DriveEndpoint {
    drive_url: String,
}

impl DriveEndpoint {
    /// Endpoint for a drive on the public Graph service.
    pub fn new(drive_id: &str) -> Self {
        Self::with_base(DEFAULT_GRAPH_BASE, drive_id)
    }

    /// Endpoint for a drive behind a custom base URL (national clouds,
    /// API proxies, test servers).
    pub fn with_base(base: &str, drive_id: &str) -> Self {
        Self {
            drive_url: format!("{}/drives/{}", base.trim_end_matches('/'), drive_id),
        }
    }

    /// Root URL of this drive.
    pub fn drive_url(&self) -> &str {
        &self.drive_url
    }

    /// Resolve a logical path plus optional id and action to a URL.
    ///
    /// With an id the identifier form `{drive}/items/{id}` is used and the
    /// path is ignored; the id may also be a composite `parent-id:/name:`
    /// token for a file that does not exist yet, which passes through
    /// untouched. Without an id the path form `{drive}/root:{path}:` is
    /// built, collapsing to bare `{drive}/root` for the drive root itself.
    pub fn url_for(&self, path: &str, item_id: Option<&str>, action: Option<&str>) -> Result<String> {
        let action = action.map(|a| format!("/{a}")).unwrap_or_default();
        if let Some(id) = item_id {
            return Ok(format!("{}/items/{}{}", self.drive_url, id, action));
        }
        let path = normalize_path(path)?;
        if path == "/" {
            return Ok(format!("{}/root{}", self.drive_url, action));
        }
        let encoded = utf8_percent_encode(&path, PATH_ESCAPE);
        Ok(format!("{}/root:{}:{}", self.drive_url, encoded, action))
    }
}

/// Normalize a logical path: strip a protocol prefix if present, collapse
/// doubled slashes, trim the trailing slash and guarantee a single leading
/// one. An empty path (with no id to fall back on) is malformed input.
pub(crate) fn normalize_path(path: &str) -> Result<String> {
    let mut rest = path.trim();
    if let Some((_, tail)) = rest.split_once("://") {
        rest = tail;
    }
    let mut result = rest.replace("//", "/");
    while result.ends_with('/') && result.len() > 1 {
        result.pop();
    }
    if result.is_empty() {
        return Err(GraphError::Validation(
            "empty path with no item id".to_string(),
        ));
    }
    if !result.starts_with('/') {
        result = format!("/{result}");
    }
    Ok(result)
}

/// Recover the logical path from a request URL for error reporting.
///
/// For path-form URLs this is the decoded part between `root:` and the
/// closing `:`; identifier-form URLs fall back to the raw URL path.
pub(crate) fn logical_path_from_url(url: &str) -> String {
    let without_query = url.split('?').next().unwrap_or(url);
    if let Some(idx) = without_query.find("root:") {
        let mut tail = &without_query[idx + "root:".len()..];
        if let Some(colon) = tail.rfind(':') {
            tail = &tail[..colon];
        }
        return percent_decode_str(tail).decode_utf8_lossy().into_owned();
    }
    let after_scheme = without_query
        .splitn(2, "://")
        .nth(1)
        .unwrap_or(without_query);
    match after_scheme.find('/') {
        Some(idx) => after_scheme[idx..].to_string(),
        None => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> DriveEndpoint {
        DriveEndpoint::new("d1")
    }

    #[test]
    fn test_path_form() {
        assert_eq!(
            endpoint().url_for("/a/b.txt", None, None).unwrap(),
            "https://graph.microsoft.com/v1.0/drives/d1/root:/a/b.txt:"
        );
        assert_eq!(
            endpoint().url_for("/a/b.txt", None, Some("content")).unwrap(),
            "https://graph.microsoft.com/v1.0/drives/d1/root:/a/b.txt:/content"
        );
    }

    #[test]
    fn test_root_form() {
        assert_eq!(
            endpoint().url_for("/", None, None).unwrap(),
            "https://graph.microsoft.com/v1.0/drives/d1/root"
        );
        assert_eq!(
            endpoint().url_for("/", None, Some("children")).unwrap(),
            "https://graph.microsoft.com/v1.0/drives/d1/root/children"
        );
    }

    #[test]
    fn test_id_form_preferred_over_path() {
        assert_eq!(
            endpoint().url_for("/a/b.txt", Some("ID42"), Some("copy")).unwrap(),
            "https://graph.microsoft.com/v1.0/drives/d1/items/ID42/copy"
        );
    }

    #[test]
    fn test_composite_id_passes_through() {
        assert_eq!(
            endpoint()
                .url_for("/a/new.txt", Some("PARENT:/new.txt:"), Some("content"))
                .unwrap(),
            "https://graph.microsoft.com/v1.0/drives/d1/items/PARENT:/new.txt:/content"
        );
    }

    #[test]
    fn test_path_is_encoded() {
        assert_eq!(
            endpoint().url_for("/my dir/100%.txt", None, None).unwrap(),
            "https://graph.microsoft.com/v1.0/drives/d1/root:/my%20dir/100%25.txt:"
        );
    }

    #[test]
    fn test_custom_base() {
        let endpoint = DriveEndpoint::with_base("http://127.0.0.1:8080/v1.0/", "d1");
        assert_eq!(
            endpoint.url_for("/x", None, None).unwrap(),
            "http://127.0.0.1:8080/v1.0/drives/d1/root:/x:"
        );
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/").unwrap(), "/");
        assert_eq!(normalize_path("/foo/").unwrap(), "/foo");
        assert_eq!(normalize_path("foo//bar").unwrap(), "/foo/bar");
        assert_eq!(normalize_path("msgd://foo/bar").unwrap(), "/foo/bar");
        assert!(normalize_path("").is_err());
    }

    #[test]
    fn test_logical_path_from_url() {
        assert_eq!(
            logical_path_from_url(
                "https://graph.microsoft.com/v1.0/drives/d1/root:/a/b.txt:?select=id"
            ),
            "/a/b.txt"
        );
        assert_eq!(
            logical_path_from_url(
                "https://graph.microsoft.com/v1.0/drives/d1/root:/my%20file.txt:/content"
            ),
            "/my file.txt"
        );
        assert_eq!(
            logical_path_from_url("https://graph.microsoft.com/v1.0/drives/d1/items/ID42"),
            "/v1.0/drives/d1/items/ID42"
        );
    }
}
