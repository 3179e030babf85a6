//! SQLite-based store for daily tasks, the employee directory, and the
//! escalation marker.
//!
//! The database lives at `~/.taskday/taskday.db`. Task rows are the system of
//! record for the per-employee-per-day lifecycle; the `UNIQUE(employee_id,
//! date)` constraint is the real duplicate guard (the services-layer pre-check
//! only exists for a friendlier error). `app_meta` holds the "last notified
//! date" marker the escalation sweep uses for once-per-day delivery.

use std::path::PathBuf;

use rusqlite::Connection;

pub mod types;
pub use types::*;

mod employees;
mod meta;
mod tasks;

pub use meta::ESCALATION_MARKER_KEY;

pub struct TaskDb {
    conn: Connection,
}

impl TaskDb {
    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, String>
    where
        F: FnOnce(&Self) -> Result<T, String>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| format!("Failed to begin transaction: {e}"))?;
        match f(self) {
            Ok(val) => {
                self.conn
                    .execute_batch("COMMIT")
                    .map_err(|e| format!("Failed to commit transaction: {e}"))?;
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Open (or create) the database at `~/.taskday/taskday.db` and apply the
    /// schema.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::db_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path. Useful for testing.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.taskday/taskday.db`.
    fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".taskday").join("taskday.db"))
    }
}
