//! In-memory blob store.

use dashmap::DashMap;

use crate::storage::{validate_name, BlobStore, StorageError};

/// Blobs held in a concurrent map. Safe to share across sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: DashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl BlobStore for MemoryStore {
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_name(name)?;
        Ok(self.blobs.get(name).map(|entry| entry.value().clone()))
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        validate_name(name)?;
        self.blobs.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}
