//! Error types for session lifecycle operations.

use thiserror::Error;

use berth_store::StoreError;

/// Errors surfaced by [`crate::manager::SessionManager`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// Session or organization scope does not match any record.
    #[error("session not found: {0}")]
    NotFound(String),

    /// Session is already held by a different runnable unit. The caller
    /// picks another session or fails its unit of work; the manager never
    /// blocks or overwrites.
    #[error("session conflict: {0} is held by another runnable")]
    Conflict(String),

    /// Underlying store failure.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SessionNotFound(id) => Self::NotFound(id),
            StoreError::SessionConflict(id) => Self::Conflict(id),
            other => Self::Store(other),
        }
    }
}

/// Convenience type alias for session results.
pub type Result<T> = std::result::Result<T, SessionError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
