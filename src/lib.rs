//! # graphfs
//!
//! Rust client library for Microsoft Graph drive storage (OneDrive and
//! SharePoint document libraries).
//!
//! ## Features
//!
//! - **POSIX-like file handles**: open/seek/read/write/append with
//!   buffered writes, clamped random-access range reads and explicit
//!   commit/discard semantics.
//! - **Resumable chunked uploads**: content past the blocksize threshold
//!   flows through a deferred upload session in 320 KiB-aligned chunks;
//!   small content takes a single-request shortcut.
//! - **Retrying request layer**: transient network failures and retryable
//!   5xx statuses are retried with capped exponential backoff; 404s map
//!   to typed `NotFound` errors carrying the logical path.
//! - **Directory operations**: list, stat, mkdir, move and delete (with a
//!   recycle-bin policy), plus server-side asynchronous copy driven to
//!   completion through monitor-URL polling.
//! - **Two execution flavors**: the async client, and a [`blocking`]
//!   module with identical behavior for synchronous callers.
//! - **Pluggable collaborators**: bearer credentials through
//!   [`TokenProvider`], directory-listing caching through
//!   [`ListingCache`].
//!
//! ## Example
//!
//! ```no_run
//! use graphfs::{Drive, FileMode, StaticToken};
//!
//! # async fn example() -> graphfs::Result<()> {
//! let drive = Drive::builder("b!AbC123")
//!     .token_provider(StaticToken::new("<bearer token>"))
//!     .build()?;
//!
//! // Write a file
//! let mut file = drive.open("/reports/q3.csv", FileMode::Write).await?;
//! file.write(b"quarter,revenue\nq3,118\n").await?;
//! file.commit().await?;
//!
//! // Random-access read
//! let mut file = drive.open("/reports/q3.csv", FileMode::Read).await?;
//! let header = file.read(16).await?;
//! # let _ = header;
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: blocking flavor
//!
//! ```no_run
//! use graphfs::{Drive, FileMode, StaticToken, blocking};
//!
//! # fn example() -> graphfs::Result<()> {
//! let drive = blocking::Drive::new(
//!     Drive::builder("b!AbC123")
//!         .token_provider(StaticToken::new("<bearer token>"))
//!         .build()?,
//! )?;
//!
//! for item in drive.ls("/reports")? {
//!     println!("{} ({} bytes)", item.path, item.size);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod blocking;
pub mod cache;
pub mod error;
pub mod fs;
pub mod http;

mod drive;

// Re-export commonly used types
pub use api::{DriveEndpoint, RetryPolicy};
pub use auth::{StaticToken, TokenProvider};
pub use cache::{ListingCache, MemoryCache, NoCache};
pub use drive::{Drive, DriveBuilder, DriveConfig};
pub use error::{GraphError, Result};
pub use fs::{
    CopyState, CopyStatus, DriveFile, DriveItem, FileMode, ItemKind, ItemRef, ItemVersion,
    UPLOAD_ALIGNMENT,
};
