//! Session repository — persistent browser session rows.
//!
//! Claim and start-marking are single conditional `UPDATE`s. The `WHERE`
//! clause carries the full precondition, so mutual exclusion holds without
//! any application-level read-then-write.

use rusqlite::{Connection, OptionalExtension, params};

use berth_core::ids::new_session_id;
use berth_core::types::{PersistentSession, RunnableType, SessionStatus};

use crate::errors::Result;

/// Filter for listing sessions.
#[derive(Default)]
pub struct ListSessionsOptions {
    /// Filter by lifecycle state.
    pub status: Option<SessionStatus>,
    /// 1-based page number (default 1).
    pub page: Option<i64>,
    /// Page size (default 10).
    pub page_size: Option<i64>,
}

/// Session repository — stateless, every method takes `&Connection`.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new `available` session with no runnable bound.
    pub fn create(
        conn: &Connection,
        organization_id: &str,
        timeout_minutes: i64,
    ) -> Result<PersistentSession> {
        let id = new_session_id();
        let now = chrono::Utc::now().to_rfc3339();

        let _ = conn.execute(
            "INSERT INTO browser_sessions (id, organization_id, status, timeout_minutes, created_at)
             VALUES (?1, ?2, 'available', ?3, ?4)",
            params![id, organization_id, timeout_minutes, now],
        )?;

        Ok(PersistentSession {
            session_id: id,
            organization_id: organization_id.to_string(),
            status: SessionStatus::Available,
            runnable_type: None,
            runnable_id: None,
            timeout_minutes,
            started_at: None,
            created_at: now,
        })
    }

    /// Get a session by id within an organization scope.
    pub fn get_by_id(
        conn: &Connection,
        session_id: &str,
        organization_id: &str,
    ) -> Result<Option<PersistentSession>> {
        let row = conn
            .query_row(
                "SELECT id, organization_id, status, runnable_type, runnable_id,
                        timeout_minutes, started_at, created_at
                 FROM browser_sessions WHERE id = ?1 AND organization_id = ?2",
                params![session_id, organization_id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Atomically claim an available session for a runnable unit.
    ///
    /// The precondition (available, no runnable bound) lives in the `WHERE`
    /// clause; exactly one of any number of concurrent claimants observes
    /// a changed row. Returns whether this caller won.
    pub fn occupy(
        conn: &Connection,
        session_id: &str,
        organization_id: &str,
        runnable_type: RunnableType,
        runnable_id: &str,
    ) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE browser_sessions
                SET status = 'running', runnable_type = ?3, runnable_id = ?4, started_at = ?5
              WHERE id = ?1 AND organization_id = ?2
                AND status = 'available' AND runnable_id IS NULL",
            params![
                session_id,
                organization_id,
                runnable_type.as_str(),
                runnable_id,
                now
            ],
        )?;
        Ok(changed > 0)
    }

    /// Mark a session started, binding the runnable if nothing holds it yet.
    ///
    /// Conditional on `started_at IS NULL` and the row being either unclaimed
    /// or claimed by this same runnable. Already-started rows and rows held
    /// by a different runnable are left untouched. Returns whether a row
    /// changed.
    pub fn mark_started(
        conn: &Connection,
        session_id: &str,
        organization_id: &str,
        runnable_type: RunnableType,
        runnable_id: &str,
    ) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE browser_sessions
                SET status = 'running', started_at = ?5,
                    runnable_type = COALESCE(runnable_type, ?3),
                    runnable_id = COALESCE(runnable_id, ?4)
              WHERE id = ?1 AND organization_id = ?2
                AND started_at IS NULL
                AND (runnable_id IS NULL OR runnable_id = ?4)",
            params![
                session_id,
                organization_id,
                runnable_type.as_str(),
                runnable_id,
                now
            ],
        )?;
        Ok(changed > 0)
    }

    /// Clear the runnable binding and return the session to `available`.
    ///
    /// Unconditional; releasing an already-available or missing session
    /// changes nothing. Returns whether a row changed.
    pub fn release(conn: &Connection, session_id: &str, organization_id: &str) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE browser_sessions
                SET status = 'available', runnable_type = NULL, runnable_id = NULL,
                    started_at = NULL
              WHERE id = ?1 AND organization_id = ?2",
            params![session_id, organization_id],
        )?;
        Ok(changed > 0)
    }

    /// List sessions for an organization, newest first.
    pub fn list(
        conn: &Connection,
        organization_id: &str,
        opts: &ListSessionsOptions,
    ) -> Result<Vec<PersistentSession>> {
        let page = opts.page.unwrap_or(1).max(1);
        let page_size = opts.page_size.unwrap_or(10).max(1);
        let offset = (page - 1) * page_size;

        let rows = if let Some(status) = opts.status {
            let mut stmt = conn.prepare(
                "SELECT id, organization_id, status, runnable_type, runnable_id,
                        timeout_minutes, started_at, created_at
                 FROM browser_sessions WHERE organization_id = ?1 AND status = ?2
                 ORDER BY created_at DESC, id DESC LIMIT ?3 OFFSET ?4",
            )?;
            stmt.query_map(
                params![organization_id, status.as_str(), page_size, offset],
                Self::map_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            let mut stmt = conn.prepare(
                "SELECT id, organization_id, status, runnable_type, runnable_id,
                        timeout_minutes, started_at, created_at
                 FROM browser_sessions WHERE organization_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            )?;
            stmt.query_map(params![organization_id, page_size, offset], Self::map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };
        Ok(rows)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PersistentSession> {
        let status_str: String = row.get("status")?;
        let status = SessionStatus::parse(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("invalid session status: {status_str}").into(),
            )
        })?;
        let runnable_type_str: Option<String> = row.get("runnable_type")?;
        let runnable_type = match runnable_type_str {
            Some(s) => Some(RunnableType::parse(&s).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    format!("invalid runnable type: {s}").into(),
                )
            })?),
            None => None,
        };

        Ok(PersistentSession {
            session_id: row.get("id")?,
            organization_id: row.get("organization_id")?,
            status,
            runnable_type,
            runnable_id: row.get("runnable_id")?,
            timeout_minutes: row.get("timeout_minutes")?,
            started_at: row.get("started_at")?,
            created_at: row.get("created_at")?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn create_session_is_available() {
        let conn = setup();
        let session = SessionRepo::create(&conn, "o_1", 60).unwrap();

        assert!(session.session_id.starts_with("pbs_"));
        assert_eq!(session.status, SessionStatus::Available);
        assert!(session.runnable_id.is_none());
        assert!(session.started_at.is_none());
        assert_eq!(session.timeout_minutes, 60);
    }

    #[test]
    fn get_by_id_scoped_to_organization() {
        let conn = setup();
        let session = SessionRepo::create(&conn, "o_1", 60).unwrap();

        assert!(
            SessionRepo::get_by_id(&conn, &session.session_id, "o_1")
                .unwrap()
                .is_some()
        );
        assert!(
            SessionRepo::get_by_id(&conn, &session.session_id, "o_other")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn occupy_claims_available_session() {
        let conn = setup();
        let session = SessionRepo::create(&conn, "o_1", 60).unwrap();

        let won = SessionRepo::occupy(
            &conn,
            &session.session_id,
            "o_1",
            RunnableType::WorkflowRun,
            "wr_1",
        )
        .unwrap();
        assert!(won);

        let found = SessionRepo::get_by_id(&conn, &session.session_id, "o_1")
            .unwrap()
            .unwrap();
        assert_eq!(found.status, SessionStatus::Running);
        assert_eq!(found.runnable_type, Some(RunnableType::WorkflowRun));
        assert_eq!(found.runnable_id.as_deref(), Some("wr_1"));
        assert!(found.started_at.is_some());
    }

    #[test]
    fn occupy_loses_against_existing_claim() {
        let conn = setup();
        let session = SessionRepo::create(&conn, "o_1", 60).unwrap();

        assert!(
            SessionRepo::occupy(
                &conn,
                &session.session_id,
                "o_1",
                RunnableType::WorkflowRun,
                "wr_1"
            )
            .unwrap()
        );
        assert!(
            !SessionRepo::occupy(
                &conn,
                &session.session_id,
                "o_1",
                RunnableType::Task,
                "t_2"
            )
            .unwrap()
        );

        // Winner's binding is untouched
        let found = SessionRepo::get_by_id(&conn, &session.session_id, "o_1")
            .unwrap()
            .unwrap();
        assert_eq!(found.runnable_id.as_deref(), Some("wr_1"));
    }

    #[test]
    fn occupy_wrong_organization_changes_nothing() {
        let conn = setup();
        let session = SessionRepo::create(&conn, "o_1", 60).unwrap();

        assert!(
            !SessionRepo::occupy(
                &conn,
                &session.session_id,
                "o_other",
                RunnableType::Task,
                "t_1"
            )
            .unwrap()
        );
    }

    #[test]
    fn mark_started_binds_unclaimed_session() {
        let conn = setup();
        let session = SessionRepo::create(&conn, "o_1", 60).unwrap();

        let changed = SessionRepo::mark_started(
            &conn,
            &session.session_id,
            "o_1",
            RunnableType::WorkflowRun,
            "wr_1",
        )
        .unwrap();
        assert!(changed);

        let found = SessionRepo::get_by_id(&conn, &session.session_id, "o_1")
            .unwrap()
            .unwrap();
        assert_eq!(found.status, SessionStatus::Running);
        assert_eq!(found.runnable_id.as_deref(), Some("wr_1"));
        assert!(found.started_at.is_some());
    }

    #[test]
    fn mark_started_is_idempotent() {
        let conn = setup();
        let session = SessionRepo::create(&conn, "o_1", 60).unwrap();

        assert!(
            SessionRepo::mark_started(
                &conn,
                &session.session_id,
                "o_1",
                RunnableType::Task,
                "t_1"
            )
            .unwrap()
        );
        let first = SessionRepo::get_by_id(&conn, &session.session_id, "o_1")
            .unwrap()
            .unwrap();

        // Second call is a no-op: started_at is untouched
        assert!(
            !SessionRepo::mark_started(
                &conn,
                &session.session_id,
                "o_1",
                RunnableType::Task,
                "t_1"
            )
            .unwrap()
        );
        let second = SessionRepo::get_by_id(&conn, &session.session_id, "o_1")
            .unwrap()
            .unwrap();
        assert_eq!(first.started_at, second.started_at);
    }

    #[test]
    fn mark_started_ignores_other_holders_session() {
        let conn = setup();
        let session = SessionRepo::create(&conn, "o_1", 60).unwrap();
        SessionRepo::occupy(
            &conn,
            &session.session_id,
            "o_1",
            RunnableType::WorkflowRun,
            "wr_1",
        )
        .unwrap();

        // Simulate the crash window: occupied but not yet marked started
        conn.execute(
            "UPDATE browser_sessions SET started_at = NULL WHERE id = ?1",
            params![session.session_id],
        )
        .unwrap();

        assert!(
            !SessionRepo::mark_started(
                &conn,
                &session.session_id,
                "o_1",
                RunnableType::Task,
                "t_other"
            )
            .unwrap()
        );
        let found = SessionRepo::get_by_id(&conn, &session.session_id, "o_1")
            .unwrap()
            .unwrap();
        assert_eq!(found.runnable_id.as_deref(), Some("wr_1"));
        assert!(found.started_at.is_none());
    }

    #[test]
    fn mark_started_repairs_occupied_session() {
        let conn = setup();
        let session = SessionRepo::create(&conn, "o_1", 60).unwrap();
        SessionRepo::occupy(
            &conn,
            &session.session_id,
            "o_1",
            RunnableType::WorkflowRun,
            "wr_1",
        )
        .unwrap();
        conn.execute(
            "UPDATE browser_sessions SET started_at = NULL WHERE id = ?1",
            params![session.session_id],
        )
        .unwrap();

        // Same holder marks started: repair succeeds
        assert!(
            SessionRepo::mark_started(
                &conn,
                &session.session_id,
                "o_1",
                RunnableType::WorkflowRun,
                "wr_1"
            )
            .unwrap()
        );
        let found = SessionRepo::get_by_id(&conn, &session.session_id, "o_1")
            .unwrap()
            .unwrap();
        assert!(found.started_at.is_some());
    }

    #[test]
    fn release_clears_binding() {
        let conn = setup();
        let session = SessionRepo::create(&conn, "o_1", 60).unwrap();
        SessionRepo::occupy(
            &conn,
            &session.session_id,
            "o_1",
            RunnableType::Task,
            "t_1",
        )
        .unwrap();

        assert!(SessionRepo::release(&conn, &session.session_id, "o_1").unwrap());

        let found = SessionRepo::get_by_id(&conn, &session.session_id, "o_1")
            .unwrap()
            .unwrap();
        assert_eq!(found.status, SessionStatus::Available);
        assert!(found.runnable_type.is_none());
        assert!(found.runnable_id.is_none());
        assert!(found.started_at.is_none());
    }

    #[test]
    fn release_then_occupy_by_other_runnable() {
        let conn = setup();
        let session = SessionRepo::create(&conn, "o_1", 60).unwrap();
        SessionRepo::occupy(
            &conn,
            &session.session_id,
            "o_1",
            RunnableType::Task,
            "t_1",
        )
        .unwrap();
        SessionRepo::release(&conn, &session.session_id, "o_1").unwrap();

        assert!(
            SessionRepo::occupy(
                &conn,
                &session.session_id,
                "o_1",
                RunnableType::WorkflowRun,
                "wr_2"
            )
            .unwrap()
        );
        let found = SessionRepo::get_by_id(&conn, &session.session_id, "o_1")
            .unwrap()
            .unwrap();
        assert_eq!(found.runnable_type, Some(RunnableType::WorkflowRun));
        assert_eq!(found.runnable_id.as_deref(), Some("wr_2"));
    }

    #[test]
    fn list_filters_by_status() {
        let conn = setup();
        let s1 = SessionRepo::create(&conn, "o_1", 60).unwrap();
        SessionRepo::create(&conn, "o_1", 60).unwrap();
        SessionRepo::occupy(&conn, &s1.session_id, "o_1", RunnableType::Task, "t_1").unwrap();

        let running = SessionRepo::list(
            &conn,
            "o_1",
            &ListSessionsOptions {
                status: Some(SessionStatus::Running),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].session_id, s1.session_id);

        let all = SessionRepo::list(&conn, "o_1", &ListSessionsOptions::default()).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn list_scoped_to_organization() {
        let conn = setup();
        SessionRepo::create(&conn, "o_1", 60).unwrap();
        SessionRepo::create(&conn, "o_2", 60).unwrap();

        let sessions = SessionRepo::list(&conn, "o_1", &ListSessionsOptions::default()).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].organization_id, "o_1");
    }

    #[test]
    fn list_paginates_newest_first() {
        let conn = setup();
        for _ in 0..5 {
            SessionRepo::create(&conn, "o_1", 60).unwrap();
        }

        let page1 = SessionRepo::list(
            &conn,
            "o_1",
            &ListSessionsOptions {
                page: Some(1),
                page_size: Some(2),
                ..Default::default()
            },
        )
        .unwrap();
        let page2 = SessionRepo::list(
            &conn,
            "o_1",
            &ListSessionsOptions {
                page: Some(2),
                page_size: Some(2),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(page2.len(), 2);
        // Newest first, no overlap across pages
        assert!(page1[0].created_at >= page1[1].created_at);
        for s in &page2 {
            assert!(!page1.iter().any(|p| p.session_id == s.session_id));
        }
    }
}
