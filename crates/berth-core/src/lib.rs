//! # berth-core
//!
//! Shared vocabulary for the Berth session coordinator.
//!
//! This crate provides the types every other Berth crate depends on:
//!
//! - **Sessions**: [`types::PersistentSession`] with [`types::SessionStatus`]
//!   and [`types::RunnableType`]
//! - **Artifacts**: [`types::Artifact`] and [`types::ArtifactType`] with the
//!   live-stream classification
//! - **IDs**: prefixed UUIDv7 generators in [`ids`]
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other berth crates.

#![deny(unsafe_code)]

pub mod ids;
pub mod types;
