//! Named-blob storage behind the file routes.
//!
//! # Data Flow
//! ```text
//! file handler
//!     → BlobStore::read / BlobStore::write (flat names only)
//!     → fs.rs (tokio::fs under the configured root)
//!     → memory.rs (DashMap, for embedding and tests)
//! ```
//!
//! # Design Decisions
//! - Flat namespace: a name never addresses a subdirectory or a parent
//! - Reads distinguish "absent" (`Ok(None)`) from failures
//! - Writes create or truncate; no listing, no deletion

pub mod fs;
pub mod memory;

use std::future::Future;

use thiserror::Error;

pub use fs::FsStore;
pub use memory::MemoryStore;

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No storage root was configured.
    #[error("no storage directory configured")]
    Disabled,

    /// The name is empty or would leave the flat namespace.
    #[error("invalid blob name `{0}`")]
    InvalidName(String),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read and write named byte blobs.
pub trait BlobStore: Send + Sync + 'static {
    /// Fetch a blob; `Ok(None)` when no blob has that name.
    fn read(&self, name: &str)
        -> impl Future<Output = Result<Option<Vec<u8>>, StorageError>> + Send;

    /// Store a blob, replacing any previous content.
    fn write(&self, name: &str, bytes: &[u8])
        -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Check that `name` is a single path component.
pub fn validate_name(name: &str) -> Result<(), StorageError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        Err(StorageError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}
