//! In-memory blob store.
//!
//! URI → bytes map behind a `DashMap`. Serves as the test double for the
//! pipeline and as the reference for `BlobStore` write semantics
//! (replace-on-write, no partial payloads).

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use crate::errors::BlobError;
use crate::storage::BlobStore;

/// Blob store keeping payloads in process memory.
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: DashMap<String, Bytes>,
}

impl InMemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the payload stored at `uri`, if any.
    pub fn get(&self, uri: &str) -> Option<Bytes> {
        self.blobs.get(uri).map(|entry| entry.value().clone())
    }

    /// Number of stored payloads.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether the store holds no payloads.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn write_bytes(&self, uri: &str, data: Bytes) -> Result<(), BlobError> {
        let _ = self.blobs.insert(uri.to_string(), data);
        Ok(())
    }

    async fn write_from_local_path(&self, uri: &str, path: &Path) -> Result<(), BlobError> {
        let data = tokio::fs::read(path).await?;
        let _ = self.blobs.insert(uri.to_string(), Bytes::from(data));
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
