//! Error types for the artifact pipeline and blob store.

use thiserror::Error;

/// Errors from blob store implementations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// Filesystem I/O failed.
    #[error("blob io error: {0}")]
    Io(#[from] std::io::Error),

    /// URI could not be mapped to a storage location.
    #[error("invalid blob uri: {0}")]
    InvalidUri(String),
}

/// Errors surfaced by [`crate::manager::ArtifactManager`].
///
/// Background upload failures never appear here — they are contained in the
/// upload unit and logged.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Persistence gateway rejected the metadata write.
    #[error(transparent)]
    Store(#[from] berth_store::StoreError),

    /// Blob store error on a synchronous path.
    #[error(transparent)]
    Blob(#[from] BlobError),

    /// Neither a task id nor a workflow run id was supplied.
    #[error("artifact requires a task id or workflow run id")]
    MissingAssociation,
}

/// Convenience type alias for pipeline results.
pub type Result<T> = std::result::Result<T, ArtifactError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
