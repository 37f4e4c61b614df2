//! Error types for the persistence gateway.
//!
//! [`StoreError`] is returned by all store operations. Conflict and
//! not-found get their own variants so callers can match on them without
//! string inspection.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// Referenced session does not exist in the organization scope.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Session is already held by a different runnable unit.
    #[error("session already occupied: {0}")]
    SessionConflict(String),

    /// Referenced artifact does not exist in the organization scope.
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
