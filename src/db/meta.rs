use rusqlite::params;

use super::{DbError, TaskDb};

/// Marker key recording the last local date on which the escalation sweep ran.
pub const ESCALATION_MARKER_KEY: &str = "escalation_last_notified";

impl TaskDb {
    // =========================================================================
    // app_meta key-value store
    // =========================================================================

    pub fn get_meta(&self, key: &str) -> Result<Option<String>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM app_meta WHERE key = ?1")?;
        let mut rows = stmt.query_map(params![key], |row| row.get::<_, String>(0))?;
        rows.next().transpose().map_err(DbError::from)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO app_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Compare-and-swap claim on a date marker.
    ///
    /// Atomically sets `key` to `date` unless it already holds that value.
    /// Returns true when this caller changed the row (the claim is won) and
    /// false when the marker already held `date` (someone else ran today).
    /// A corrupt or missing value simply compares unequal and gets
    /// overwritten, which gives the treat-as-unset semantics the sweep needs.
    pub fn try_claim_meta_date(&self, key: &str, date: &str) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "INSERT INTO app_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value
             WHERE app_meta.value IS NOT excluded.value",
            params![key, date],
        )?;
        Ok(changed > 0)
    }
}
