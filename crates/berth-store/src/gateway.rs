//! Persistence gateway traits and their `SQLite` implementation.
//!
//! [`SessionGateway`] and [`ArtifactGateway`] are the narrow interfaces the
//! lifecycle manager and artifact pipeline consume. [`SqliteGateway`]
//! implements both over a pooled connection and the stateless repositories.
//!
//! Gateway calls are the suspension points of the coordinator: callers
//! `await` them, and everything else (claim arbitration, scoping) happens
//! inside a single SQL statement per mutation.

use async_trait::async_trait;

use berth_core::types::{Artifact, PersistentSession, RunnableType, SessionStatus};

use crate::connection::{ConnectionConfig, ConnectionPool, PooledConnection, new_file};
use crate::errors::{Result, StoreError};
use crate::migrations::run_migrations;
use crate::repositories::artifact::{ArtifactRepo, ListArtifactsOptions};
use crate::repositories::session::{ListSessionsOptions, SessionRepo};

/// Durable record store for sessions.
#[async_trait]
pub trait SessionGateway: Send + Sync {
    /// Create a session in the `available` state with no runnable bound.
    async fn create_session(
        &self,
        organization_id: &str,
        timeout_minutes: i64,
    ) -> Result<PersistentSession>;

    /// Fetch a session by id within an organization scope.
    async fn get_session(
        &self,
        session_id: &str,
        organization_id: &str,
    ) -> Result<Option<PersistentSession>>;

    /// Atomically claim an available session for a runnable unit.
    ///
    /// Exactly one of any number of concurrent callers succeeds. A repeat
    /// claim by the current holder returns the session unchanged. Fails
    /// with [`StoreError::SessionConflict`] when a different runnable holds
    /// the session, [`StoreError::SessionNotFound`] when the id or
    /// organization scope does not match.
    async fn occupy_session(
        &self,
        session_id: &str,
        runnable_type: RunnableType,
        runnable_id: &str,
        organization_id: &str,
    ) -> Result<PersistentSession>;

    /// Idempotently mark a session started, binding the runnable if the
    /// session is unclaimed. No-op when already started or held elsewhere.
    async fn mark_session_started(
        &self,
        session_id: &str,
        runnable_type: RunnableType,
        runnable_id: &str,
        organization_id: &str,
    ) -> Result<()>;

    /// Clear the runnable binding and return the session to `available`.
    /// No-op on an already-available or missing session.
    async fn release_session(&self, session_id: &str, organization_id: &str) -> Result<()>;

    /// List sessions for an organization, newest first, 1-based page.
    async fn list_sessions(
        &self,
        organization_id: &str,
        status: Option<SessionStatus>,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<PersistentSession>>;
}

/// Durable record store for artifact metadata.
#[async_trait]
pub trait ArtifactGateway: Send + Sync {
    /// Insert an artifact metadata row and return it.
    async fn create_artifact_record(&self, artifact: Artifact) -> Result<Artifact>;

    /// Fetch an artifact row by id within an organization scope.
    async fn get_artifact_record(
        &self,
        artifact_id: &str,
        organization_id: &str,
    ) -> Result<Option<Artifact>>;

    /// List artifact rows for an organization, optionally filtered by task
    /// and/or workflow run.
    async fn list_artifact_records(
        &self,
        organization_id: &str,
        task_id: Option<&str>,
        workflow_run_id: Option<&str>,
    ) -> Result<Vec<Artifact>>;
}

/// `SQLite`-backed gateway over a connection pool.
pub struct SqliteGateway {
    pool: ConnectionPool,
}

impl SqliteGateway {
    /// Wrap an existing pool. The schema must already be migrated.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Open a file-backed gateway and run pending migrations.
    pub fn open_file(path: &str, config: &ConnectionConfig) -> Result<Self> {
        let pool = new_file(path, config)?;
        let conn = pool.get()?;
        let _ = run_migrations(&conn)?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }
}

#[async_trait]
impl SessionGateway for SqliteGateway {
    async fn create_session(
        &self,
        organization_id: &str,
        timeout_minutes: i64,
    ) -> Result<PersistentSession> {
        let conn = self.conn()?;
        SessionRepo::create(&conn, organization_id, timeout_minutes)
    }

    async fn get_session(
        &self,
        session_id: &str,
        organization_id: &str,
    ) -> Result<Option<PersistentSession>> {
        let conn = self.conn()?;
        SessionRepo::get_by_id(&conn, session_id, organization_id)
    }

    async fn occupy_session(
        &self,
        session_id: &str,
        runnable_type: RunnableType,
        runnable_id: &str,
        organization_id: &str,
    ) -> Result<PersistentSession> {
        let conn = self.conn()?;
        let won = SessionRepo::occupy(&conn, session_id, organization_id, runnable_type, runnable_id)?;

        let session = SessionRepo::get_by_id(&conn, session_id, organization_id)?
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;

        if won || session.runnable_id.as_deref() == Some(runnable_id) {
            return Ok(session);
        }
        Err(StoreError::SessionConflict(session_id.to_string()))
    }

    async fn mark_session_started(
        &self,
        session_id: &str,
        runnable_type: RunnableType,
        runnable_id: &str,
        organization_id: &str,
    ) -> Result<()> {
        let conn = self.conn()?;
        let _ = SessionRepo::mark_started(
            &conn,
            session_id,
            organization_id,
            runnable_type,
            runnable_id,
        )?;
        Ok(())
    }

    async fn release_session(&self, session_id: &str, organization_id: &str) -> Result<()> {
        let conn = self.conn()?;
        let _ = SessionRepo::release(&conn, session_id, organization_id)?;
        Ok(())
    }

    async fn list_sessions(
        &self,
        organization_id: &str,
        status: Option<SessionStatus>,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<PersistentSession>> {
        let conn = self.conn()?;
        SessionRepo::list(
            &conn,
            organization_id,
            &ListSessionsOptions {
                status,
                page: Some(page),
                page_size: Some(page_size),
            },
        )
    }
}

#[async_trait]
impl ArtifactGateway for SqliteGateway {
    async fn create_artifact_record(&self, artifact: Artifact) -> Result<Artifact> {
        let conn = self.conn()?;
        ArtifactRepo::insert(&conn, &artifact)?;
        Ok(artifact)
    }

    async fn get_artifact_record(
        &self,
        artifact_id: &str,
        organization_id: &str,
    ) -> Result<Option<Artifact>> {
        let conn = self.conn()?;
        ArtifactRepo::get_by_id(&conn, artifact_id, organization_id)
    }

    async fn list_artifact_records(
        &self,
        organization_id: &str,
        task_id: Option<&str>,
        workflow_run_id: Option<&str>,
    ) -> Result<Vec<Artifact>> {
        let conn = self.conn()?;
        ArtifactRepo::list(
            &conn,
            organization_id,
            &ListArtifactsOptions {
                task_id,
                workflow_run_id,
            },
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
