//! # berth-store
//!
//! SQLite-backed Persistence Gateway for the Berth session coordinator.
//!
//! This crate provides:
//!
//! - **Gateway traits**: [`gateway::SessionGateway`] and
//!   [`gateway::ArtifactGateway`] — the narrow async interfaces the lifecycle
//!   manager and artifact pipeline consume
//! - **SQLite implementation**: [`gateway::SqliteGateway`] over an r2d2
//!   connection pool with WAL mode and embedded migrations
//! - **Repositories**: stateless SQL in [`repositories`] — every method takes
//!   `&Connection`
//! - **Errors**: [`errors::StoreError`] hierarchy via `thiserror`
//!
//! Session claims are a single atomic conditional `UPDATE` at the SQL layer,
//! never a read-then-write pair, so concurrent claimants cannot both win.

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod gateway;
pub mod migrations;
pub mod repositories;

pub use errors::{Result, StoreError};
pub use gateway::{ArtifactGateway, SessionGateway, SqliteGateway};
