use rusqlite::{params, Row};

use super::{DbDepartment, DbEmployee, DbError, TaskDb};

const EMPLOYEE_COLUMNS: &str =
    "id, name, email, user_login, department_id, manager_id, active, updated_at";

impl TaskDb {
    // =========================================================================
    // Employee directory (consumed, not computed here)
    // =========================================================================

    fn map_employee_row(row: &Row) -> rusqlite::Result<DbEmployee> {
        Ok(DbEmployee {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            user_login: row.get(3)?,
            department_id: row.get(4)?,
            manager_id: row.get(5)?,
            active: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    pub fn upsert_employee(&self, employee: &DbEmployee) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO employees (id, name, email, user_login, department_id, manager_id,
                active, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                user_login = excluded.user_login,
                department_id = excluded.department_id,
                manager_id = excluded.manager_id,
                active = excluded.active,
                updated_at = excluded.updated_at",
            params![
                employee.id,
                employee.name,
                employee.email,
                employee.user_login,
                employee.department_id,
                employee.manager_id,
                employee.active,
                employee.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_employee(&self, id: &str) -> Result<Option<DbEmployee>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1"
        ))?;
        let mut rows = stmt.query_map(params![id], Self::map_employee_row)?;
        rows.next().transpose().map_err(DbError::from)
    }

    /// Resolve the acting principal's login to an employee, if one is mapped.
    pub fn get_employee_by_login(&self, login: &str) -> Result<Option<DbEmployee>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE user_login = ?1"
        ))?;
        let mut rows = stmt.query_map(params![login], Self::map_employee_row)?;
        rows.next().transpose().map_err(DbError::from)
    }

    /// Active employees with a mapped login identity — the population the
    /// escalation sweep enumerates.
    pub fn get_active_employees_with_login(&self) -> Result<Vec<DbEmployee>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees
             WHERE active = 1 AND user_login IS NOT NULL
             ORDER BY name"
        ))?;
        let rows = stmt.query_map([], Self::map_employee_row)?;

        let mut employees = Vec::new();
        for row in rows {
            employees.push(row?);
        }
        Ok(employees)
    }

    pub fn upsert_department(&self, department: &DbDepartment) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO departments (id, name, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                updated_at = excluded.updated_at",
            params![department.id, department.name, department.updated_at],
        )?;
        Ok(())
    }

    pub fn get_department(&self, id: &str) -> Result<Option<DbDepartment>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, updated_at FROM departments WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], |row| {
            Ok(DbDepartment {
                id: row.get(0)?,
                name: row.get(1)?,
                updated_at: row.get(2)?,
            })
        })?;
        rows.next().transpose().map_err(DbError::from)
    }
}
