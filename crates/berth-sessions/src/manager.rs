//! Session lifecycle manager.
//!
//! Wraps the persistence gateway with claim/release semantics and
//! read-repair reconciliation. The mutual-exclusion invariant (one runnable
//! unit per session) is enforced by the gateway's atomic conditional
//! update; this layer maps outcomes onto caller-facing errors and repairs
//! inconsistent rows on every read path.
//!
//! Reconciliation is lazy by design: a session left occupied-but-unstarted
//! by a crash is corrected the next time any listing or fetch observes it,
//! not by a background sweep.

use std::sync::Arc;

use tracing::{debug, info, warn};

use berth_core::types::{PersistentSession, RunnableType, SessionStatus};
use berth_store::SessionGateway;

use crate::errors::{Result, SessionError};

/// Session lifecycle manager over a [`SessionGateway`].
pub struct SessionManager {
    gateway: Arc<dyn SessionGateway>,
}

impl SessionManager {
    /// Create a manager over the given gateway.
    pub fn new(gateway: Arc<dyn SessionGateway>) -> Self {
        Self { gateway }
    }

    /// Create a new available session for an organization.
    pub async fn create_session(
        &self,
        organization_id: &str,
        timeout_minutes: i64,
    ) -> Result<PersistentSession> {
        let session = self
            .gateway
            .create_session(organization_id, timeout_minutes)
            .await?;
        info!(
            session_id = %session.session_id,
            organization_id,
            timeout_minutes,
            "created persistent session"
        );
        Ok(session)
    }

    /// Fetch a session, repairing it if it is occupied but unstarted.
    pub async fn get_session(
        &self,
        session_id: &str,
        organization_id: &str,
    ) -> Result<PersistentSession> {
        let session = self
            .gateway
            .get_session(session_id, organization_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        self.reconcile(session).await
    }

    /// Atomically claim a session for a runnable unit.
    ///
    /// Exactly one of any number of concurrent callers succeeds; the rest
    /// receive [`SessionError::Conflict`]. Claiming a session already held
    /// by the same runnable returns it unchanged.
    pub async fn occupy(
        &self,
        session_id: &str,
        runnable_type: RunnableType,
        runnable_id: &str,
        organization_id: &str,
    ) -> Result<PersistentSession> {
        let session = self
            .gateway
            .occupy_session(session_id, runnable_type, runnable_id, organization_id)
            .await?;
        info!(
            session_id,
            runnable_type = runnable_type.as_str(),
            runnable_id,
            "occupied persistent session"
        );
        Ok(session)
    }

    /// Idempotently mark a session's activity as started, binding the
    /// runnable if the session is not yet claimed. No-op when already
    /// started.
    pub async fn begin_session(
        &self,
        session_id: &str,
        runnable_type: RunnableType,
        runnable_id: &str,
        organization_id: &str,
    ) -> Result<()> {
        self.gateway
            .mark_session_started(session_id, runnable_type, runnable_id, organization_id)
            .await?;
        debug!(session_id, runnable_id, "session marked started");
        Ok(())
    }

    /// Release a session back to the available pool. Safe to call on an
    /// already-available session.
    pub async fn release(&self, session_id: &str, organization_id: &str) -> Result<()> {
        self.gateway
            .release_session(session_id, organization_id)
            .await?;
        info!(session_id, organization_id, "released persistent session");
        Ok(())
    }

    /// Release whichever session the given runnable currently holds.
    ///
    /// No-op when the runnable holds nothing. Units of work that did not
    /// track their session id release through this path when they finish.
    pub async fn release_for_runnable(
        &self,
        runnable_id: &str,
        organization_id: &str,
    ) -> Result<()> {
        let running = self
            .gateway
            .list_sessions(organization_id, Some(SessionStatus::Running), 1, i64::MAX)
            .await?;
        for session in running {
            if session.runnable_id.as_deref() == Some(runnable_id) {
                return self.release(&session.session_id, organization_id).await;
            }
        }
        Ok(())
    }

    /// All sessions currently running for an organization, reconciled.
    ///
    /// Any row observed occupied-but-unstarted is repaired (started-now,
    /// persisted) before it is returned, so callers never see a running
    /// session without a start time.
    pub async fn get_active_sessions(
        &self,
        organization_id: &str,
    ) -> Result<Vec<PersistentSession>> {
        let sessions = self
            .gateway
            .list_sessions(organization_id, Some(SessionStatus::Running), 1, i64::MAX)
            .await?;
        self.reconcile_all(sessions).await
    }

    /// Paginated session history for an organization, newest first,
    /// reconciled like the active listing.
    pub async fn get_history(
        &self,
        organization_id: &str,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<PersistentSession>> {
        let sessions = self
            .gateway
            .list_sessions(organization_id, None, page, page_size)
            .await?;
        self.reconcile_all(sessions).await
    }

    async fn reconcile_all(
        &self,
        sessions: Vec<PersistentSession>,
    ) -> Result<Vec<PersistentSession>> {
        let mut reconciled = Vec::with_capacity(sessions.len());
        for session in sessions {
            reconciled.push(self.reconcile(session).await?);
        }
        Ok(reconciled)
    }

    /// Read-repair: persist a start time for a session that is occupied but
    /// has none, returning the repaired record. Consistent rows pass
    /// through untouched.
    async fn reconcile(&self, session: PersistentSession) -> Result<PersistentSession> {
        match (&session.runnable_id, &session.started_at) {
            (Some(runnable_id), None) => {
                warn!(
                    session_id = %session.session_id,
                    runnable_id = %runnable_id,
                    "occupied session missing started_at; repairing"
                );
                // Type is normally set alongside the id; the store keeps an
                // existing value either way.
                let runnable_type = session.runnable_type.unwrap_or(RunnableType::Task);
                self.gateway
                    .mark_session_started(
                        &session.session_id,
                        runnable_type,
                        runnable_id,
                        &session.organization_id,
                    )
                    .await?;
                self.gateway
                    .get_session(&session.session_id, &session.organization_id)
                    .await?
                    .ok_or_else(|| SessionError::NotFound(session.session_id.clone()))
            }
            _ => Ok(session),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
