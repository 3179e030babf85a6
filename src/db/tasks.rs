use rusqlite::{params, Row};

use super::{DbError, DbTask, TaskDb};
use crate::types::TaskState;

const TASK_COLUMNS: &str = "id, employee_id, date, department_id, manager_id, pod_text, sod_text,
     plan_submitted, plan_submitted_at, state, done_at, created_at, updated_at";

impl TaskDb {
    // =========================================================================
    // Daily tasks
    // =========================================================================

    fn map_task_row(row: &Row) -> rusqlite::Result<DbTask> {
        let state: String = row.get(9)?;
        Ok(DbTask {
            id: row.get(0)?,
            employee_id: row.get(1)?,
            date: row.get(2)?,
            department_id: row.get(3)?,
            manager_id: row.get(4)?,
            pod_text: row.get(5)?,
            sod_text: row.get(6)?,
            plan_submitted: row.get(7)?,
            plan_submitted_at: row.get(8)?,
            state: TaskState::parse(&state),
            done_at: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    /// Insert a new task row. A `UNIQUE(employee_id, date)` violation comes
    /// back as a `DbError` for which `is_unique_violation()` is true.
    pub fn insert_task(&self, task: &DbTask) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO daily_tasks (id, employee_id, date, department_id, manager_id,
                pod_text, sod_text, plan_submitted, plan_submitted_at, state, done_at,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                task.id,
                task.employee_id,
                task.date,
                task.department_id,
                task.manager_id,
                task.pod_text,
                task.sod_text,
                task.plan_submitted,
                task.plan_submitted_at,
                task.state.as_str(),
                task.done_at,
                task.created_at,
                task.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Write back every mutable column of an existing task row.
    pub fn update_task(&self, task: &DbTask) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE daily_tasks
             SET department_id = ?2, manager_id = ?3, pod_text = ?4, sod_text = ?5,
                 plan_submitted = ?6, plan_submitted_at = ?7, state = ?8, done_at = ?9,
                 updated_at = ?10
             WHERE id = ?1",
            params![
                task.id,
                task.department_id,
                task.manager_id,
                task.pod_text,
                task.sod_text,
                task.plan_submitted,
                task.plan_submitted_at,
                task.state.as_str(),
                task.done_at,
                task.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> Result<Option<DbTask>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM daily_tasks WHERE id = ?1"
        ))?;
        let mut rows = stmt.query_map(params![id], Self::map_task_row)?;
        rows.next().transpose().map_err(DbError::from)
    }

    /// Look up the single task for an (employee, date) pair, if any.
    pub fn get_task_for_day(
        &self,
        employee_id: &str,
        date: &str,
    ) -> Result<Option<DbTask>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM daily_tasks
             WHERE employee_id = ?1 AND date = ?2"
        ))?;
        let mut rows = stmt.query_map(params![employee_id, date], Self::map_task_row)?;
        rows.next().transpose().map_err(DbError::from)
    }

    /// All tasks for a calendar date. Read-only input to the escalation
    /// sweep.
    pub fn get_tasks_for_date(&self, date: &str) -> Result<Vec<DbTask>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM daily_tasks
             WHERE date = ?1
             ORDER BY employee_id"
        ))?;
        let rows = stmt.query_map(params![date], Self::map_task_row)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    /// Tasks for an employee, most recent date first.
    pub fn get_tasks_for_employee(
        &self,
        employee_id: &str,
        limit: i32,
    ) -> Result<Vec<DbTask>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM daily_tasks
             WHERE employee_id = ?1
             ORDER BY date DESC
             LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![employee_id, limit], Self::map_task_row)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }
}
