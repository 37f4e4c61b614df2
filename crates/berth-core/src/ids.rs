//! Prefixed id generation.
//!
//! Every record gets a `{prefix}_{uuidv7}` id. UUIDv7 keeps ids
//! lexicographically ordered by creation time, which the history listing
//! relies on as a tiebreaker.

use uuid::Uuid;

/// Generate a persistent session id (`pbs_…`).
pub fn new_session_id() -> String {
    format!("pbs_{}", Uuid::now_v7())
}

/// Generate an artifact id (`art_…`).
pub fn new_artifact_id() -> String {
    format!("art_{}", Uuid::now_v7())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
