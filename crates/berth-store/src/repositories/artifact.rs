//! Artifact repository — immutable metadata rows for captured artifacts.
//!
//! Rows are insert-only. The payload at `uri` is written by the pipeline
//! after the row exists, so a row may reference a not-yet-uploaded blob.

use rusqlite::{Connection, OptionalExtension, params};

use berth_core::types::{Artifact, ArtifactType};

use crate::errors::Result;

/// Filter for listing artifact rows.
#[derive(Default)]
pub struct ListArtifactsOptions<'a> {
    /// Filter by associated task.
    pub task_id: Option<&'a str>,
    /// Filter by associated workflow run.
    pub workflow_run_id: Option<&'a str>,
}

/// Artifact repository — stateless, every method takes `&Connection`.
pub struct ArtifactRepo;

impl ArtifactRepo {
    /// Insert an artifact metadata row.
    pub fn insert(conn: &Connection, artifact: &Artifact) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO artifacts (id, organization_id, task_id, workflow_run_id,
                                    artifact_type, uri, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                artifact.artifact_id,
                artifact.organization_id,
                artifact.task_id,
                artifact.workflow_run_id,
                artifact.artifact_type.as_str(),
                artifact.uri,
                artifact.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get an artifact row by id within an organization scope.
    pub fn get_by_id(
        conn: &Connection,
        artifact_id: &str,
        organization_id: &str,
    ) -> Result<Option<Artifact>> {
        let row = conn
            .query_row(
                "SELECT id, organization_id, task_id, workflow_run_id, artifact_type, uri, created_at
                 FROM artifacts WHERE id = ?1 AND organization_id = ?2",
                params![artifact_id, organization_id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// List artifact rows for an organization, oldest first.
    pub fn list(
        conn: &Connection,
        organization_id: &str,
        opts: &ListArtifactsOptions<'_>,
    ) -> Result<Vec<Artifact>> {
        use std::fmt::Write;
        let mut sql = String::from(
            "SELECT id, organization_id, task_id, workflow_run_id, artifact_type, uri, created_at
             FROM artifacts WHERE organization_id = ?1",
        );
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> =
            vec![Box::new(organization_id.to_string())];

        if let Some(task_id) = opts.task_id {
            let _ = write!(sql, " AND task_id = ?{}", param_values.len() + 1);
            param_values.push(Box::new(task_id.to_string()));
        }
        if let Some(workflow_run_id) = opts.workflow_run_id {
            let _ = write!(sql, " AND workflow_run_id = ?{}", param_values.len() + 1);
            param_values.push(Box::new(workflow_run_id.to_string()));
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC");

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(Box::as_ref).collect();
        let rows = stmt
            .query_map(params_refs.as_slice(), Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Artifact> {
        let type_str: String = row.get("artifact_type")?;
        let artifact_type = ArtifactType::parse(&type_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("invalid artifact type: {type_str}").into(),
            )
        })?;

        Ok(Artifact {
            artifact_id: row.get("id")?,
            organization_id: row.get("organization_id")?,
            task_id: row.get("task_id")?,
            workflow_run_id: row.get("workflow_run_id")?,
            artifact_type,
            uri: row.get("uri")?,
            created_at: row.get("created_at")?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
