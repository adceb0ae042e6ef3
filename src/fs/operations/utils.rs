//! Shared helpers for filesystem operations.

use crate::error::{GraphError, Result};

/// Split a normalized path into parent and final component.
pub(crate) fn split_parent(path: &str) -> Result<(String, String)> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some(("", name)) if !name.is_empty() => Ok(("/".to_string(), name.to_string())),
        Some((parent, name)) if !name.is_empty() => Ok((parent.to_string(), name.to_string())),
        _ => Err(GraphError::Validation(format!(
            "path has no parent component: {path}"
        ))),
    }
}

/// Best-effort media type from the file extension, defaulting to a generic
/// binary type.
pub(crate) fn guess_content_type(path: &str) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_parent() {
        assert_eq!(
            split_parent("/a/b.txt").unwrap(),
            ("/a".to_string(), "b.txt".to_string())
        );
        assert_eq!(
            split_parent("/top").unwrap(),
            ("/".to_string(), "top".to_string())
        );
        assert!(split_parent("/").is_err());
        assert!(split_parent("no-slash").is_err());
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("/a/report.csv"), "text/csv");
        assert_eq!(guess_content_type("/a/page.html"), "text/html");
        assert_eq!(
            guess_content_type("/a/blob.xyzunknown"),
            "application/octet-stream"
        );
    }
}
