//! # berth-artifacts
//!
//! Artifact capture pipeline for the Berth session coordinator.
//!
//! This crate provides:
//!
//! - **Pipeline**: [`manager::ArtifactManager`] — synchronous metadata
//!   writes, background payload uploads, and an explicit join point
//! - **Blob store**: the [`storage::BlobStore`] trait with
//!   [`storage::LocalBlobStore`] (filesystem) and
//!   [`storage::InMemoryBlobStore`] (test double) implementations
//! - **Live-stream mirrors**: [`streaming`] — the latest screenshot per
//!   run/task mirrored to a deterministic local path for near-real-time
//!   observation
//!
//! The hot path never waits on storage I/O: `create_artifact` returns as
//! soon as the metadata row is durable and the upload unit is scheduled.

#![deny(unsafe_code)]

pub mod errors;
pub mod manager;
pub mod storage;
pub mod streaming;

pub use errors::{ArtifactError, BlobError};
pub use manager::{ArtifactManager, ArtifactSource, CreateArtifactOptions};
pub use storage::{BlobStore, InMemoryBlobStore, LocalBlobStore};
pub use streaming::StreamingConfig;
