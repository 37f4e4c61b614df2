//! Artifact capture pipeline.
//!
//! [`ArtifactManager::create_artifact`] writes the metadata row first
//! (awaited, so the record is durable and queryable when the call returns),
//! then schedules exactly one background upload unit and returns without
//! awaiting it. [`ArtifactManager::wait_for_upload_tasks`] is the join
//! point: it blocks until every upload registered under the given keys has
//! resolved, then forgets them.
//!
//! Upload failures are logged and contained — the metadata row is never
//! rolled back, so a row may transiently (or, on failure, permanently)
//! reference a URI with no payload behind it.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use berth_core::types::{Artifact, ArtifactType};
use berth_store::ArtifactGateway;

use crate::errors::{ArtifactError, Result};
use crate::storage::BlobStore;
use crate::streaming::{StreamingConfig, copy_mirror, mirror_path, write_mirror};

/// Payload handed to the pipeline.
#[derive(Clone, Debug)]
pub enum ArtifactSource {
    /// In-memory payload.
    Bytes(Bytes),
    /// Payload already on local disk; the pipeline passes the path through
    /// to the blob store without reading the file itself.
    LocalPath(PathBuf),
}

/// Inputs for [`ArtifactManager::create_artifact`].
pub struct CreateArtifactOptions {
    /// Key the background upload is registered under; the join call
    /// ([`ArtifactManager::wait_for_upload_tasks`]) drains by this key.
    pub registry_key: String,
    /// Artifact id (`art_…`); see [`berth_core::ids::new_artifact_id`].
    pub artifact_id: String,
    /// Artifact kind.
    pub artifact_type: ArtifactType,
    /// Blob store address for the payload.
    pub uri: String,
    /// Owning organization.
    pub organization_id: String,
    /// Associated task, if any.
    pub task_id: Option<String>,
    /// Associated workflow run, if any.
    pub workflow_run_id: Option<String>,
    /// The payload.
    pub data: ArtifactSource,
}

/// Artifact capture pipeline over a persistence gateway and a blob store.
pub struct ArtifactManager {
    gateway: Arc<dyn ArtifactGateway>,
    blob_store: Arc<dyn BlobStore>,
    streaming: StreamingConfig,
    uploads: DashMap<String, Vec<JoinHandle<()>>>,
}

impl ArtifactManager {
    /// Create a pipeline instance.
    pub fn new(
        gateway: Arc<dyn ArtifactGateway>,
        blob_store: Arc<dyn BlobStore>,
        streaming: StreamingConfig,
    ) -> Self {
        Self {
            gateway,
            blob_store,
            streaming,
            uploads: DashMap::new(),
        }
    }

    /// Record an artifact: durable metadata now, payload upload in the
    /// background.
    ///
    /// The returned [`Artifact`] reflects the committed metadata row. The
    /// payload upload (and, for live-stream types, the mirror write) runs as
    /// an independently-scheduled task registered under
    /// `options.registry_key`; this call never waits for it.
    pub async fn create_artifact(&self, options: CreateArtifactOptions) -> Result<Artifact> {
        if options.task_id.is_none() && options.workflow_run_id.is_none() {
            return Err(ArtifactError::MissingAssociation);
        }

        let artifact = Artifact {
            artifact_id: options.artifact_id,
            organization_id: options.organization_id,
            task_id: options.task_id,
            workflow_run_id: options.workflow_run_id,
            artifact_type: options.artifact_type,
            uri: options.uri,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        // Metadata first; the upload is scheduled strictly after this commits.
        let artifact = self.gateway.create_artifact_record(artifact).await?;

        let handle = tokio::spawn(run_upload(
            Arc::clone(&self.blob_store),
            self.streaming.root.clone(),
            artifact.clone(),
            options.data,
        ));
        self.uploads
            .entry(options.registry_key)
            .or_default()
            .push(handle);

        Ok(artifact)
    }

    /// Block until every upload registered under the given keys has
    /// completed (success or failure), then forget them.
    ///
    /// Keys with no registered uploads are skipped. Completion only:
    /// upload failures were already logged inside the unit and are not
    /// reported here.
    pub async fn wait_for_upload_tasks<I, S>(&self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            let key = key.as_ref();
            let Some((_, handles)) = self.uploads.remove(key) else {
                continue;
            };
            debug!(key, count = handles.len(), "waiting for upload tasks");
            for handle in handles {
                if let Err(error) = handle.await {
                    warn!(key, %error, "upload task panicked or was cancelled");
                }
            }
        }
    }

    /// Number of uploads currently registered under `key`.
    pub fn pending_upload_count(&self, key: &str) -> usize {
        self.uploads.get(key).map_or(0, |entry| entry.len())
    }
}

/// One background upload unit: payload to the blob store, then (for
/// live-stream types) the local mirror. Failures are logged, never
/// propagated — the metadata row stands either way.
async fn run_upload(
    blob_store: Arc<dyn BlobStore>,
    streaming_root: PathBuf,
    artifact: Artifact,
    data: ArtifactSource,
) {
    let upload = match &data {
        ArtifactSource::Bytes(bytes) => blob_store.write_bytes(&artifact.uri, bytes.clone()).await,
        ArtifactSource::LocalPath(path) => {
            blob_store.write_from_local_path(&artifact.uri, path).await
        }
    };
    if let Err(error) = upload {
        error!(
            artifact_id = %artifact.artifact_id,
            uri = %artifact.uri,
            %error,
            "artifact payload upload failed"
        );
    }

    if !artifact.artifact_type.is_streamed() {
        return;
    }
    let Some(path) = mirror_path(
        &streaming_root,
        &artifact.organization_id,
        artifact.workflow_run_id.as_deref(),
        artifact.task_id.as_deref(),
        artifact.artifact_type.extension(),
    ) else {
        return;
    };
    let mirrored = match &data {
        ArtifactSource::Bytes(bytes) => write_mirror(&path, bytes).await,
        ArtifactSource::LocalPath(source) => copy_mirror(&path, source).await,
    };
    if let Err(error) = mirrored {
        error!(
            artifact_id = %artifact.artifact_id,
            path = %path.display(),
            %error,
            "live-stream mirror write failed"
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
