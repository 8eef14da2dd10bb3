//! Aggregation queries for task analytics.

use super::Database;
use crate::types::{Analytics, OverallCounts, Status, SubtaskCounts};
use anyhow::Result;

impl Database {
    /// Aggregate counts over all tasks: totals per status label and
    /// with/without-subtask split. Read-only; an empty store yields zeros.
    pub fn analytics(&self) -> Result<Analytics> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.status,
                        EXISTS(SELECT 1 FROM subtask s WHERE s.task_id = t.id)
                 FROM task t",
            )?;

            let mut overall = OverallCounts::default();
            let mut by_subtasks = SubtaskCounts::default();

            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let status: Option<Status> = row.get(0).ok();
                let has_subtasks: bool = row.get(1)?;

                overall.total += 1;
                // Anything unreadable counts as Pending
                match status.unwrap_or(Status::Pending) {
                    Status::Pending => overall.pending += 1,
                    Status::InProgress => overall.in_progress += 1,
                    Status::Completed => overall.completed += 1,
                }

                if has_subtasks {
                    by_subtasks.with_subtasks += 1;
                } else {
                    by_subtasks.without_subtasks += 1;
                }
            }

            Ok(Analytics {
                overall,
                by_subtasks,
            })
        })
    }
}
