//! Filesystem-backed blob store.
//!
//! URIs use the `file://` scheme; the remainder is a path relative to the
//! store root. Parent directories are created on demand and writes replace
//! whatever was at the target path.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::BlobError;
use crate::storage::BlobStore;

const FILE_SCHEME: &str = "file://";

/// Blob store rooted at a local directory.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store rooted at `root`. The directory itself is created
    /// lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a `file://` URI to a path under the store root.
    fn resolve(&self, uri: &str) -> Result<PathBuf, BlobError> {
        let Some(rest) = uri.strip_prefix(FILE_SCHEME) else {
            return Err(BlobError::InvalidUri(uri.to_string()));
        };
        let rest = rest.trim_start_matches('/');
        if rest.is_empty() || rest.split('/').any(|seg| seg == "..") {
            return Err(BlobError::InvalidUri(uri.to_string()));
        }
        Ok(self.root.join(rest))
    }
}

async fn ensure_parent(path: &Path) -> Result<(), BlobError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn write_bytes(&self, uri: &str, data: Bytes) -> Result<(), BlobError> {
        let target = self.resolve(uri)?;
        ensure_parent(&target).await?;
        tokio::fs::write(&target, &data).await?;
        Ok(())
    }

    async fn write_from_local_path(&self, uri: &str, path: &Path) -> Result<(), BlobError> {
        let target = self.resolve(uri)?;
        ensure_parent(&target).await?;
        let _ = tokio::fs::copy(path, &target).await?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
