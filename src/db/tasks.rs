//! Task CRUD and lifecycle transitions.

use super::{Database, now};
use crate::types::{NewTask, Status, Task};
use anyhow::Result;
use rusqlite::{Connection, Row, params};

pub(crate) fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        page_name: row.get("page_name")?,
        name: row.get("name")?,
        description: row.get("description")?,
        status: row.get("status")?,
        created_at: row.get("created_at")?,
        started_at: row.get("started_at")?,
        completed_at: row.get("completed_at")?,
        subtasks: Vec::new(),
    })
}

/// Internal helper to get a task on a page using an existing connection.
fn get_task_internal(conn: &Connection, page_name: &str, task_id: i64) -> Result<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM task WHERE id = ?1 AND page_name = ?2")?;

    let result = stmt.query_row(params![task_id, page_name], parse_task_row);

    match result {
        Ok(mut task) => {
            task.subtasks = super::subtasks::subtasks_for_task_internal(conn, task.id)?;
            Ok(Some(task))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Load tasks matching a WHERE fragment and attach their subtasks.
fn load_tasks(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(sql)?;
    let mut tasks = stmt
        .query_map(params, parse_task_row)?
        .collect::<Result<Vec<_>, _>>()?;

    for task in &mut tasks {
        task.subtasks = super::subtasks::subtasks_for_task_internal(conn, task.id)?;
    }

    Ok(tasks)
}

impl Database {
    /// Create a task on a page, with any nested subtasks, atomically.
    ///
    /// The task and all its subtasks are inserted in one transaction; a
    /// failure part-way through rolls everything back.
    pub fn create_task(&self, page_name: &str, input: &NewTask) -> Result<Task> {
        let created_at = now();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO task (page_name, name, description, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    page_name,
                    &input.name,
                    &input.description,
                    Status::Pending,
                    created_at,
                ],
            )?;
            let task_id = tx.last_insert_rowid();

            for subtask in &input.subtasks {
                tx.execute(
                    "INSERT INTO subtask (task_id, title, description, status, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        task_id,
                        &subtask.title,
                        &subtask.description,
                        Status::Pending,
                        created_at,
                        created_at,
                    ],
                )?;
            }

            let task = get_task_internal(&tx, page_name, task_id)?
                .ok_or_else(|| anyhow::anyhow!("task vanished during creation"))?;

            tx.commit()?;
            Ok(task)
        })
    }

    /// Get a task on a page by id, with its subtasks.
    pub fn get_task(&self, page_name: &str, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, page_name, task_id))
    }

    /// List all tasks for a page, with subtasks, oldest first.
    pub fn list_tasks_by_page(&self, page_name: &str) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            load_tasks(
                conn,
                "SELECT * FROM task WHERE page_name = ?1 ORDER BY id ASC",
                &[&page_name],
            )
        })
    }

    /// List all tasks across every page, with subtasks, oldest first.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        self.with_conn(|conn| load_tasks(conn, "SELECT * FROM task ORDER BY id ASC", &[]))
    }

    /// Transition a task to In progress, stamping `started_at`.
    ///
    /// Calling this on an already-started task re-stamps `started_at`
    /// (idempotent in status, overwriting in time). Returns `None` if the
    /// task does not exist on this page.
    pub fn start_task(&self, page_name: &str, task_id: i64) -> Result<Option<Task>> {
        let started_at = now();

        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE task SET status = ?1, started_at = ?2
                 WHERE id = ?3 AND page_name = ?4",
                params![Status::InProgress, started_at, task_id, page_name],
            )?;

            if changed == 0 {
                return Ok(None);
            }
            get_task_internal(conn, page_name, task_id)
        })
    }

    /// Transition a task to Completed, stamping `completed_at`.
    ///
    /// `started_at` is left as-is: completing a never-started task keeps it
    /// null. Returns `None` if the task does not exist on this page.
    pub fn complete_task(&self, page_name: &str, task_id: i64) -> Result<Option<Task>> {
        let completed_at = now();

        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE task SET status = ?1, completed_at = ?2
                 WHERE id = ?3 AND page_name = ?4",
                params![Status::Completed, completed_at, task_id, page_name],
            )?;

            if changed == 0 {
                return Ok(None);
            }
            get_task_internal(conn, page_name, task_id)
        })
    }

    /// Delete a task and, via cascade, all its subtasks.
    ///
    /// Returns `true` if a task was deleted.
    pub fn delete_task(&self, page_name: &str, task_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM task WHERE id = ?1 AND page_name = ?2",
                params![task_id, page_name],
            )?;
            Ok(changed > 0)
        })
    }
}
