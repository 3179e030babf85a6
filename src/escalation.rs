//! Daily escalation sweep.
//!
//! `check_and_notify` reconciles "who has not submitted a plan today" against
//! the manager hierarchy and sends one summary notification per manager. The
//! sweep is safe to invoke as often as the trigger likes: a target-hour gate,
//! a rest-day gate, and a persisted date marker keep it to at most one
//! notification burst per local calendar day.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::db::{DbEmployee, DbTask, TaskDb, ESCALATION_MARKER_KEY};
use crate::error::TaskError;
use crate::notifier::Notifier;
use crate::types::{EscalationSchedule, SubmissionStatus};

/// Which classifications trigger escalation. The baseline scope is
/// plan-not-submitted only; `escalateNoTask` in the schedule widens it to
/// employees with no task row at all.
#[derive(Debug, Clone)]
pub struct EscalationScope {
    escalated: Vec<SubmissionStatus>,
}

impl Default for EscalationScope {
    fn default() -> Self {
        Self {
            escalated: vec![SubmissionStatus::NotSubmitted],
        }
    }
}

impl EscalationScope {
    pub fn from_schedule(schedule: &EscalationSchedule) -> Self {
        let mut scope = Self::default();
        if schedule.escalate_no_task {
            scope.escalated.push(SubmissionStatus::NoTask);
        }
        scope
    }

    pub fn includes(&self, status: SubmissionStatus) -> bool {
        self.escalated.contains(&status)
    }
}

/// Classify an employee's day from their task row (or its absence).
pub fn classify(task: Option<&DbTask>) -> SubmissionStatus {
    match task {
        Some(task) if task.plan_submitted => SubmissionStatus::Submitted,
        Some(_) => SubmissionStatus::NotSubmitted,
        None => SubmissionStatus::NoTask,
    }
}

/// What a sweep invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Local hour is not the target hour.
    OutsideWindow,
    /// Local weekday is the configured rest day.
    RestDay,
    /// The marker already records today — notifications went out earlier.
    AlreadyNotified,
    /// The sweep ran. Counts cover this invocation only.
    Completed {
        flagged_employees: usize,
        notified_managers: usize,
    },
}

/// Run the once-per-day escalation check.
///
/// `now` is whatever instant the trigger fired at; all gating happens in the
/// configured timezone. Per-manager failures (missing contact, delivery
/// error) are logged and skipped, never fatal to the sweep.
pub fn check_and_notify(
    db: &TaskDb,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
    schedule: &EscalationSchedule,
) -> Result<SweepOutcome, TaskError> {
    let tz: Tz = schedule
        .timezone
        .parse()
        .map_err(|_| TaskError::Configuration(format!("Invalid timezone: {}", schedule.timezone)))?;

    let local = now.with_timezone(&tz);

    if local.hour() != schedule.hour {
        return Ok(SweepOutcome::OutsideWindow);
    }

    if weekday_index(local.weekday()) == schedule.rest_weekday {
        return Ok(SweepOutcome::RestDay);
    }

    let today = local.format("%Y-%m-%d").to_string();

    // Claim the marker before dispatching. The compare-and-swap means exactly
    // one of any overlapping invocations wins; the claim is also the durable
    // "handled" record for days where no manager ends up notified.
    if !db.try_claim_meta_date(ESCALATION_MARKER_KEY, &today)? {
        return Ok(SweepOutcome::AlreadyNotified);
    }

    let scope = EscalationScope::from_schedule(schedule);
    let employees = db.get_active_employees_with_login()?;

    // manager id -> employees flagged under them, in stable name order
    let mut by_manager: BTreeMap<String, Vec<DbEmployee>> = BTreeMap::new();
    let mut flagged_employees = 0usize;

    for employee in employees {
        let task = db.get_task_for_day(&employee.id, &today)?;
        let status = classify(task.as_ref());
        if !scope.includes(status) {
            continue;
        }
        flagged_employees += 1;

        // Employees without a manager are excluded from escalation.
        let Some(ref manager_id) = employee.manager_id else {
            continue;
        };
        by_manager
            .entry(manager_id.clone())
            .or_default()
            .push(employee);
    }

    let mut notified_managers = 0usize;
    for (manager_id, reports) in &by_manager {
        let manager = match db.get_employee(manager_id) {
            Ok(Some(manager)) => manager,
            Ok(None) => {
                log::warn!("Escalation: manager {} not found, skipping", manager_id);
                continue;
            }
            Err(e) => {
                log::warn!("Escalation: manager {} lookup failed: {}", manager_id, e);
                continue;
            }
        };
        let Some(ref contact) = manager.email else {
            log::warn!("Escalation: manager {} has no contact address, skipping", manager_id);
            continue;
        };

        let names: Vec<&str> = reports.iter().map(|emp| emp.name.as_str()).collect();
        let subject = format!("Missing plan submissions for {}", today);
        let body = format!(
            "The following team members have not submitted a Plan of the Day for {}:\n{}",
            today,
            names.join("\n")
        );
        match notifier.notify(contact, &subject, &body) {
            Ok(()) => notified_managers += 1,
            Err(e) => {
                log::warn!("Escalation notification to {} failed: {}", contact, e);
            }
        }
    }

    log::info!(
        "Escalation sweep for {}: {} employee(s) flagged, {} manager(s) notified",
        today,
        flagged_employees,
        notified_managers
    );

    Ok(SweepOutcome::Completed {
        flagged_employees,
        notified_managers,
    })
}

/// chrono `Weekday` to the Mon=0..Sun=6 numbering used in config.
fn weekday_index(weekday: Weekday) -> u32 {
    weekday.num_days_from_monday()
}
