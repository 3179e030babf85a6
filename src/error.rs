//! Error types for task lifecycle operations
//!
//! Errors are classified by who can fix them:
//! - User errors: duplicate creation, empty plan submission — surfaced
//!   synchronously to the caller and never retried.
//! - Internal errors: storage failures, bad configuration.

use thiserror::Error;

use crate::db::DbError;

/// Error types for task lifecycle and escalation operations
#[derive(Debug, Error)]
pub enum TaskError {
    // User errors
    #[error("A task already exists for employee {employee_id} on {date}")]
    DuplicateTask { employee_id: String, date: String },

    #[error("Cannot submit an empty Plan of the Day")]
    EmptyPlan,

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("No employee mapped to login '{0}'")]
    EmployeeNotFound(String),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },

    // Internal errors
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TaskError {
    /// Returns true if this error is caused by caller input and should be
    /// shown to the user rather than logged as a system failure.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            TaskError::DuplicateTask { .. }
                | TaskError::EmptyPlan
                | TaskError::TaskNotFound(_)
                | TaskError::EmployeeNotFound(_)
                | TaskError::InvalidField { .. }
        )
    }
}

impl From<rusqlite::Error> for TaskError {
    fn from(err: rusqlite::Error) -> Self {
        TaskError::Db(DbError::Sqlite(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_classification() {
        let err = TaskError::DuplicateTask {
            employee_id: "emp-1".to_string(),
            date: "2024-05-01".to_string(),
        };
        assert!(err.is_user_error());
        assert!(TaskError::EmptyPlan.is_user_error());
        assert!(!TaskError::Configuration("bad tz".to_string()).is_user_error());
    }

    #[test]
    fn test_duplicate_message_names_the_pair() {
        let err = TaskError::DuplicateTask {
            employee_id: "emp-1".to_string(),
            date: "2024-05-01".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("emp-1"));
        assert!(message.contains("2024-05-01"));
    }
}
