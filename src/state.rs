use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::types::Config;

/// Shared application state for the daemon.
pub struct AppState {
    pub config: Mutex<Option<Config>>,
    pub db: Mutex<Option<crate::db::TaskDb>>,
    /// In-memory dedup for the trigger loop. The durable per-day idempotency
    /// lives in the `app_meta` marker, so losing this on restart is fine.
    pub last_scheduled_run: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    pub fn new() -> Self {
        let config = match load_config() {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("No usable config: {e}. Using defaults.");
                Some(Config::default())
            }
        };

        let db = match crate::db::TaskDb::open() {
            Ok(db) => Some(db),
            Err(e) => {
                log::warn!("Failed to open task database: {e}. DB features disabled.");
                None
            }
        };

        Self {
            config: Mutex::new(config),
            db: Mutex::new(db),
            last_scheduled_run: Mutex::new(None),
        }
    }

    /// Record when a scheduled run last occurred
    pub fn set_last_scheduled_run(&self, time: DateTime<Utc>) {
        if let Ok(mut guard) = self.last_scheduled_run.lock() {
            *guard = Some(time);
        }
    }

    /// Get when the trigger last fired on schedule
    pub fn get_last_scheduled_run(&self) -> Option<DateTime<Utc>> {
        self.last_scheduled_run
            .lock()
            .ok()
            .and_then(|guard| *guard)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the canonical config file path (~/.taskday/config.json)
pub fn config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".taskday").join("config.json"))
}

/// Load configuration from ~/.taskday/config.json.
///
/// A missing file is an error (callers fall back to `Config::default()`);
/// partial files parse thanks to serde defaults.
pub fn load_config() -> Result<Config, String> {
    let path = config_path()?;

    if !path.exists() {
        return Err(format!("Config file not found at {}", path.display()));
    }

    let content =
        fs::read_to_string(&path).map_err(|e| format!("Failed to read config: {}", e))?;

    serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))
}

/// Write the config to disk and update the in-memory copy.
pub fn save_config(state: &AppState, config: Config) -> Result<(), String> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| format!("Failed to create config dir: {}", e))?;
        }
    }

    let content = serde_json::to_string_pretty(&config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(&path, content).map_err(|e| format!("Failed to write config: {}", e))?;

    let mut guard = state.config.lock().map_err(|_| "Lock poisoned")?;
    *guard = Some(config);
    Ok(())
}
