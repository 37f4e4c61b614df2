//! Domain types for sessions and artifacts.
//!
//! Timestamps are RFC 3339 UTC strings, matching how they are stored.
//! Status and type enums round-trip through their `as_str` forms for SQL
//! storage and serialize as `snake_case` JSON.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a persistent browser session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Not held by any runnable unit; can be claimed.
    Available,
    /// Held by exactly one runnable unit.
    Running,
}

impl SessionStatus {
    /// SQL storage form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Running => "running",
        }
    }

    /// Parse the SQL storage form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(Self::Available),
            "running" => Some(Self::Running),
            _ => None,
        }
    }
}

/// The kind of runnable unit holding a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnableType {
    /// A workflow run.
    WorkflowRun,
    /// A standalone task run.
    Task,
}

impl RunnableType {
    /// SQL storage form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WorkflowRun => "workflow_run",
            Self::Task => "task",
        }
    }

    /// Parse the SQL storage form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "workflow_run" => Some(Self::WorkflowRun),
            "task" => Some(Self::Task),
            _ => None,
        }
    }
}

/// A reusable remote-browser session that outlives a single unit of work.
///
/// Invariant (after read-repair): `status == Running` exactly when both
/// `runnable_id` and `started_at` are set. A session belongs to one
/// organization for its whole lifetime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentSession {
    /// Session id (`pbs_…`).
    pub session_id: String,
    /// Owning organization.
    pub organization_id: String,
    /// Current lifecycle state.
    pub status: SessionStatus,
    /// Kind of the holding runnable unit, when held.
    pub runnable_type: Option<RunnableType>,
    /// Id of the holding runnable unit, when held.
    pub runnable_id: Option<String>,
    /// Idle timeout in minutes.
    pub timeout_minutes: i64,
    /// When the holding unit started activity (RFC 3339).
    pub started_at: Option<String>,
    /// Creation time (RFC 3339).
    pub created_at: String,
}

/// Kind of captured execution artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    /// Screenshot taken while an action executes.
    ScreenshotAction,
    /// Final screenshot after a unit of work completes.
    ScreenshotFinal,
    /// Browser recording.
    Recording,
    /// Anything else.
    Other,
}

impl ArtifactType {
    /// SQL storage form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ScreenshotAction => "screenshot_action",
            Self::ScreenshotFinal => "screenshot_final",
            Self::Recording => "recording",
            Self::Other => "other",
        }
    }

    /// Parse the SQL storage form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "screenshot_action" => Some(Self::ScreenshotAction),
            "screenshot_final" => Some(Self::ScreenshotFinal),
            "recording" => Some(Self::Recording),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Whether this type is mirrored to the local streaming path.
    ///
    /// The live-stream set is fixed: the two screenshot variants.
    pub fn is_streamed(self) -> bool {
        matches!(self, Self::ScreenshotAction | Self::ScreenshotFinal)
    }

    /// File extension for payloads of this type.
    pub fn extension(self) -> &'static str {
        match self {
            Self::ScreenshotAction | Self::ScreenshotFinal => "png",
            Self::Recording => "webm",
            Self::Other => "bin",
        }
    }
}

/// A captured execution byproduct with durable metadata.
///
/// `(artifact_id, uri)` is immutable once created. The payload at `uri` is
/// eventually consistent with this record: the metadata row is written
/// first, the payload upload follows in the background.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Artifact id (`art_…`).
    pub artifact_id: String,
    /// Owning organization.
    pub organization_id: String,
    /// Associated task, if any. At least one of `task_id` /
    /// `workflow_run_id` is present.
    pub task_id: Option<String>,
    /// Associated workflow run, if any.
    pub workflow_run_id: Option<String>,
    /// Artifact kind.
    pub artifact_type: ArtifactType,
    /// Blob store address of the payload.
    pub uri: String,
    /// Creation time (RFC 3339).
    pub created_at: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
