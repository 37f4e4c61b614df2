//! Blob storage — durable byte storage addressed by URI.
//!
//! The pipeline hands payloads to a [`BlobStore`] either as in-memory bytes
//! or as a path to a file already on local disk; implementations choose how
//! to move the data and must not require the caller to buffer file-backed
//! sources.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::BlobError;

pub mod local;
pub mod memory;

pub use local::LocalBlobStore;
pub use memory::InMemoryBlobStore;

/// Durable byte storage addressed by URI.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write an in-memory buffer to `uri`, replacing any existing payload.
    async fn write_bytes(&self, uri: &str, data: Bytes) -> Result<(), BlobError>;

    /// Write the file at `path` to `uri`, replacing any existing payload.
    async fn write_from_local_path(&self, uri: &str, path: &Path) -> Result<(), BlobError>;
}
