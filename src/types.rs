//! Core types for the taskpages tracker.

use chrono::{DateTime, Utc};
use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status shared by tasks and subtasks.
///
/// The wire and database representation is the human-readable label
/// ("Pending", "In progress", "Completed"); nothing else may persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Pending,
    #[serde(rename = "In progress")]
    InProgress,
    Completed,
}

impl Status {
    /// The canonical string label stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "In progress",
            Status::Completed => "Completed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Status::Pending),
            "In progress" => Ok(Status::InProgress),
            "Completed" => Ok(Status::Completed),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Status::from_str(s).map_err(|e| FromSqlError::Other(e.into()))
    }
}

/// A task scoped to a page, with its subtasks embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub page_name: String,
    pub name: String,
    pub description: Option<String>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub subtasks: Vec<Subtask>,
}

/// A subtask belonging to exactly one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub id: i64,
    pub task_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Input for creating a task, optionally with nested subtasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<NewSubtask>,
}

/// Input for creating a subtask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubtask {
    pub title: String,
    pub description: Option<String>,
}

/// Aggregate analytics over all tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analytics {
    pub overall: OverallCounts,
    pub by_subtasks: SubtaskCounts,
}

/// Per-status task counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallCounts {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
}

/// Counts of tasks with and without subtasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskCounts {
    pub with_subtasks: i64,
    pub without_subtasks: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_round_trip() {
        for status in [Status::Pending, Status::InProgress, Status::Completed] {
            assert_eq!(Status::from_str(status.as_str()), Ok(status));
        }
    }

    #[test]
    fn status_rejects_unknown_labels() {
        assert!(Status::from_str("Bogus").is_err());
        assert!(Status::from_str("pending").is_err());
        assert!(Status::from_str("").is_err());
    }

    #[test]
    fn status_serde_uses_labels() {
        assert_eq!(
            serde_json::to_string(&Status::InProgress).unwrap(),
            "\"In progress\""
        );
        let parsed: Status = serde_json::from_str("\"Completed\"").unwrap();
        assert_eq!(parsed, Status::Completed);
    }
}
