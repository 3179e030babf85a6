//! Shared type definitions for the database layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::TaskState;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),
}

impl DbError {
    /// True when the underlying SQLite error is a UNIQUE constraint violation.
    /// Used to map the `daily_tasks(employee_id, date)` constraint to a
    /// duplicate-task error at the services layer. Matches the extended code:
    /// other constraint failures (foreign keys, NOT NULL) are not duplicates.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => {
                err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            }
            _ => false,
        }
    }
}

/// A row from the `daily_tasks` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbTask {
    pub id: String,
    pub employee_id: String,
    /// Calendar date, `YYYY-MM-DD`. Immutable after creation.
    pub date: String,
    pub department_id: Option<String>,
    pub manager_id: Option<String>,
    /// Plan of the Day. Locked once `plan_submitted` is true.
    pub pod_text: Option<String>,
    /// Summary of the Day. Locked once the task has been marked done.
    pub sod_text: Option<String>,
    pub plan_submitted: bool,
    pub plan_submitted_at: Option<String>,
    pub state: TaskState,
    /// Set exactly once, the first time the task is marked done. Keeps the
    /// summary locked even if the task is later reverted to draft.
    pub done_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl DbTask {
    /// Human-readable record label: "{employee} - {date}".
    pub fn display_label(&self, employee_name: Option<&str>) -> String {
        match (employee_name, self.date.is_empty()) {
            (Some(name), false) => format!("{} - {}", name, self.date),
            (None, false) => format!("Task - {}", self.date),
            _ => "Daily Task".to_string(),
        }
    }
}

/// A row from the `employees` table. Organization directory data — consumed
/// by this subsystem, never computed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbEmployee {
    pub id: String,
    pub name: String,
    /// Contact address for notifications.
    pub email: Option<String>,
    /// Mapped login identity, if the employee has one.
    pub user_login: Option<String>,
    pub department_id: Option<String>,
    /// Direct organizational superior.
    pub manager_id: Option<String>,
    pub active: bool,
    pub updated_at: String,
}

/// A row from the `departments` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbDepartment {
    pub id: String,
    pub name: String,
    pub updated_at: String,
}
