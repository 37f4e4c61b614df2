//! Live-stream mirrors — the latest screenshot per run/task on local disk.
//!
//! A mirror lives at `{root}/{organization_id}/{workflow_run_id or
//! task_id}.{extension}`, keyed by run/task rather than artifact id, so each
//! write replaces the previous one and a poller always reads the newest
//! frame. A stale overwrite is tolerated; this is a best-effort live view,
//! not durable storage.

use std::path::{Path, PathBuf};

/// Configuration for the live-stream mirror root.
#[derive(Clone, Debug)]
pub struct StreamingConfig {
    /// Directory under which per-organization mirror files are written.
    pub root: PathBuf,
}

impl StreamingConfig {
    /// Create a config rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Compute the mirror path for an artifact's run/task key.
///
/// The workflow run id takes precedence; the task id is the fallback.
/// Returns `None` when neither is present.
pub fn mirror_path(
    root: &Path,
    organization_id: &str,
    workflow_run_id: Option<&str>,
    task_id: Option<&str>,
    extension: &str,
) -> Option<PathBuf> {
    let key = workflow_run_id.or(task_id)?;
    Some(root.join(organization_id).join(format!("{key}.{extension}")))
}

/// Overwrite the mirror file at `path` with `data`, creating parent
/// directories as needed.
pub async fn write_mirror(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, data).await
}

/// Overwrite the mirror file at `path` with a copy of the file at `source`.
pub async fn copy_mirror(path: &Path, source: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let _ = tokio::fs::copy(source, path).await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
