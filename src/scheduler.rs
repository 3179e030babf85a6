//! Recurring trigger for the escalation sweep.
//!
//! A cron-gated poll loop: every minute it checks whether the configured cron
//! expression fired, and if so invokes the sweep. The loop only supplies
//! cadence — the sweep's own hour/rest-day/marker gates are what guarantee
//! at-most-one notification burst per day, so an over-eager trigger is
//! harmless.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;

use crate::error::TaskError;
use crate::escalation;
use crate::notifier::Notifier;
use crate::state::AppState;
use crate::types::EscalationSchedule;

/// Poll interval for scheduler loop (1 minute)
const POLL_INTERVAL_SECS: u64 = 60;

/// Scheduler for the periodic escalation check
pub struct Scheduler {
    state: Arc<AppState>,
    notifier: Arc<dyn Notifier>,
}

impl Scheduler {
    pub fn new(state: Arc<AppState>, notifier: Arc<dyn Notifier>) -> Self {
        Self { state, notifier }
    }

    /// Start the scheduler loop. Runs indefinitely, checking for a due
    /// trigger every minute.
    pub async fn run(&self) {
        loop {
            tokio::time::sleep(Duration::from_secs(POLL_INTERVAL_SECS)).await;

            let now = Utc::now();
            self.check_and_run(now);
        }
    }

    /// Run the sweep if the cron trigger is due at `now`.
    fn check_and_run(&self, now: DateTime<Utc>) {
        let schedule = match self.state.config.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(config) if config.escalation.enabled => config.escalation.clone(),
                _ => return,
            },
            Err(_) => return,
        };

        match self.should_run_now(&schedule, now) {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                log::warn!("Escalation trigger misconfigured: {}", e);
                return;
            }
        }

        self.state.set_last_scheduled_run(now);

        let db_guard = match self.state.db.lock() {
            Ok(guard) => guard,
            Err(_) => return,
        };
        let Some(db) = db_guard.as_ref() else {
            log::warn!("Escalation trigger fired but database is unavailable");
            return;
        };

        match escalation::check_and_notify(db, self.notifier.as_ref(), now, &schedule) {
            Ok(outcome) => log::debug!("Escalation trigger outcome: {:?}", outcome),
            Err(e) => log::warn!("Escalation sweep failed: {}", e),
        }
    }

    /// Check if the trigger should fire at the given time.
    fn should_run_now(
        &self,
        entry: &EscalationSchedule,
        now: DateTime<Utc>,
    ) -> Result<bool, TaskError> {
        let schedule = parse_cron(&entry.cron)?;
        let tz: Tz = entry.timezone.parse().map_err(|_| {
            TaskError::Configuration(format!("Invalid timezone: {}", entry.timezone))
        })?;

        let now_local = now.with_timezone(&tz);

        let last_run = self.state.get_last_scheduled_run();

        // Find the most recent scheduled time around now
        let mut scheduled_times = schedule.after(&(now_local - chrono::Duration::minutes(2)));

        if let Some(next_time) = scheduled_times.next() {
            let next_utc = next_time.with_timezone(&Utc);
            let diff = (now - next_utc).num_seconds().abs();

            // Within 2 minutes of the scheduled time
            if diff < 120 {
                if let Some(last) = last_run {
                    if (last - next_utc).num_seconds().abs() < 60 {
                        return Ok(false); // Already ran
                    }
                }
                return Ok(true);
            }
        }

        Ok(false)
    }
}

/// Parse a cron expression
pub fn parse_cron(expr: &str) -> Result<Schedule, TaskError> {
    // The cron crate expects 6 fields (with seconds), but config uses the
    // 5-field format. Add "0" for seconds at the start.
    let full_expr = format!("0 {}", expr);

    full_expr.parse::<Schedule>().map_err(|e| {
        TaskError::Configuration(format!("Invalid cron expression '{}': {}", expr, e))
    })
}

/// Get the next trigger time for a schedule entry
pub fn get_next_run_time(entry: &EscalationSchedule) -> Result<DateTime<Utc>, TaskError> {
    let schedule = parse_cron(&entry.cron)?;
    let tz: Tz = entry
        .timezone
        .parse()
        .map_err(|_| TaskError::Configuration(format!("Invalid timezone: {}", entry.timezone)))?;

    let next = schedule
        .upcoming(tz)
        .next()
        .ok_or_else(|| TaskError::Configuration("No upcoming scheduled time".to_string()))?;

    Ok(next.with_timezone(&Utc))
}
