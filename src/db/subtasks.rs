//! Subtask CRUD and status updates.

use super::{Database, now};
use crate::status::{LifecycleStamps, apply_transition};
use crate::types::{NewSubtask, Status, Subtask};
use anyhow::Result;
use rusqlite::{Connection, Row, params};

fn parse_subtask_row(row: &Row) -> rusqlite::Result<Subtask> {
    Ok(Subtask {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: row.get("status")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        started_at: row.get("started_at")?,
        completed_at: row.get("completed_at")?,
    })
}

/// Internal helper to list a task's subtasks using an existing connection.
pub(crate) fn subtasks_for_task_internal(conn: &Connection, task_id: i64) -> Result<Vec<Subtask>> {
    let mut stmt = conn.prepare("SELECT * FROM subtask WHERE task_id = ?1 ORDER BY id ASC")?;
    let subtasks = stmt
        .query_map(params![task_id], parse_subtask_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(subtasks)
}

fn get_subtask_internal(conn: &Connection, subtask_id: i64) -> Result<Option<Subtask>> {
    let mut stmt = conn.prepare("SELECT * FROM subtask WHERE id = ?1")?;

    let result = stmt.query_row(params![subtask_id], parse_subtask_row);

    match result {
        Ok(subtask) => Ok(Some(subtask)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Attach a new Pending subtask to an existing task.
    ///
    /// Returns `None` if the task does not exist.
    pub fn create_subtask(&self, task_id: i64, input: &NewSubtask) -> Result<Option<Subtask>> {
        let created_at = now();

        self.with_conn(|conn| {
            let task_exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM task WHERE id = ?1)",
                params![task_id],
                |row| row.get(0),
            )?;
            if !task_exists {
                return Ok(None);
            }

            conn.execute(
                "INSERT INTO subtask (task_id, title, description, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    task_id,
                    &input.title,
                    &input.description,
                    Status::Pending,
                    created_at,
                    created_at,
                ],
            )?;

            get_subtask_internal(conn, conn.last_insert_rowid())
        })
    }

    /// Get a subtask by id.
    pub fn get_subtask(&self, subtask_id: i64) -> Result<Option<Subtask>> {
        self.with_conn(|conn| get_subtask_internal(conn, subtask_id))
    }

    /// Transition a subtask to the requested status.
    ///
    /// Timestamp bookkeeping follows the transition engine: Pending clears
    /// both lifecycle timestamps, In progress preserves an existing start and
    /// clears completion, Completed backfills the start and refreshes the
    /// completion time. Returns `None` if the subtask does not exist.
    pub fn update_subtask_status(
        &self,
        subtask_id: i64,
        status: Status,
    ) -> Result<Option<Subtask>> {
        self.with_conn(|conn| {
            let Some(subtask) = get_subtask_internal(conn, subtask_id)? else {
                return Ok(None);
            };

            let prior = LifecycleStamps {
                started_at: subtask.started_at,
                completed_at: subtask.completed_at,
                updated_at: subtask.updated_at,
            };
            let next = apply_transition(&prior, status, now());

            conn.execute(
                "UPDATE subtask
                 SET status = ?1, started_at = ?2, completed_at = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    status,
                    next.started_at,
                    next.completed_at,
                    next.updated_at,
                    subtask_id,
                ],
            )?;

            get_subtask_internal(conn, subtask_id)
        })
    }

    /// Delete a subtask. Returns `true` if a subtask was deleted.
    pub fn delete_subtask(&self, subtask_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM subtask WHERE id = ?1", params![subtask_id])?;
            Ok(changed > 0)
        })
    }
}
