//! Shared type definitions: domain enums and configuration.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a daily task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Draft,
    Done,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Draft => "draft",
            TaskState::Done => "done",
        }
    }

    /// Parse the stored column value. Unknown values fall back to Draft so a
    /// hand-edited row never breaks reads.
    pub fn parse(value: &str) -> Self {
        match value {
            "done" => TaskState::Done,
            _ => TaskState::Draft,
        }
    }
}

/// Where an employee stands for a given day, as seen by the escalation sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Task exists and the plan was submitted.
    Submitted,
    /// Task exists but the plan was never submitted.
    NotSubmitted,
    /// No task was created for the day at all.
    NoTask,
}

/// Application configuration, stored at `~/.taskday/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub escalation: EscalationSchedule,
    /// When false, POD/SOD submission notifications to managers are disabled
    /// (the escalation sweep is governed by `escalation.enabled` instead).
    #[serde(default = "default_true")]
    pub submission_notifications: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            escalation: EscalationSchedule::default(),
            submission_notifications: true,
        }
    }
}

/// Schedule entry for the escalation sweep.
///
/// `cron` controls how often the trigger fires (the sweep itself is safe to
/// invoke more often than once a day); `hour` and `rest_weekday` gate when the
/// sweep actually does work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationSchedule {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cron")]
    pub cron: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Local hour during which the sweep fires (0-23).
    #[serde(default = "default_hour")]
    pub hour: u32,
    /// Weekday on which no escalation is sent. chrono numbering, Mon=0..Sun=6.
    #[serde(default = "default_rest_weekday")]
    pub rest_weekday: u32,
    /// When true, employees with no task row at all are escalated alongside
    /// those with an unsubmitted plan.
    #[serde(default)]
    pub escalate_no_task: bool,
}

impl Default for EscalationSchedule {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: default_cron(),
            timezone: default_timezone(),
            hour: default_hour(),
            rest_weekday: default_rest_weekday(),
            escalate_no_task: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cron() -> String {
    // Top of every hour; the in-sweep hour gate picks the one that counts.
    "0 * * * *".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_hour() -> u32 {
    11
}

fn default_rest_weekday() -> u32 {
    6 // Sunday
}
