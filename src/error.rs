//! Error types for the graphfs library.

use thiserror::Error;

/// Main error type for graphfs operations.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Item does not exist (HTTP 404, any operation).
    #[error("item not found: {path}")]
    NotFound {
        /// Logical path of the missing item, stripped of routing prefixes.
        path: String,
    },

    /// Item already exists (HTTP 409 on creation).
    #[error("item already exists: {path}")]
    AlreadyExists { path: String },

    /// Non-recursive delete of a directory that still has children.
    #[error("directory not empty: {path}")]
    DirectoryNotEmpty { path: String },

    /// The upload session expired before it could be committed.
    #[error("upload session has expired")]
    UploadSessionExpired,

    /// Transient failures persisted past the retry budget. The final
    /// failure is preserved as the source.
    #[error("giving up after {attempts} attempts: {source}")]
    TransientExhausted {
        attempts: u32,
        source: Box<GraphError>,
    },

    /// Terminal, non-retryable HTTP status from the service.
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    /// Server-side copy reported failure.
    #[error("copy operation failed")]
    CopyFailed,

    /// Response from the service did not have the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Network request error.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid argument or state supplied by the caller.
    #[error("{0}")]
    Validation(String),
}

/// Result type alias for graphfs operations.
pub type Result<T> = std::result::Result<T, GraphError>;
