// Task lifecycle service.
// Business logic for the one-record-per-employee-per-day rule, POD/SOD field
// locking, and the draft/done transitions.

use chrono::{DateTime, NaiveDate, Utc};

use crate::db::{DbEmployee, DbTask, TaskDb};
use crate::error::TaskError;
use crate::notifier::Notifier;
use crate::types::TaskState;

const POD_MAX_LEN: usize = 8000;
const SOD_MAX_LEN: usize = 8000;

/// Request to create a task.
///
/// `employee_id` falls back to the employee mapped to `acting_login`;
/// `date` falls back to `today` (the current date in the acting user's
/// timezone, resolved by the caller).
#[derive(Debug, Clone, Default)]
pub struct CreateTaskRequest {
    pub employee_id: Option<String>,
    pub acting_login: Option<String>,
    pub date: Option<String>,
    pub pod_text: Option<String>,
    pub sod_text: Option<String>,
}

/// Proposed change set for the general update entry point. Fields left as
/// `None` are untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateTaskRequest {
    pub id: String,
    pub pod_text: Option<String>,
    pub sod_text: Option<String>,
}

/// Compute (department, manager) for an employee — the derived task fields.
///
/// Pure function: usable as a live preview while editing, and invoked after
/// create and on any employee change so the stored columns always match the
/// employee's current organizational position.
pub fn employee_details(employee: Option<&DbEmployee>) -> (Option<String>, Option<String>) {
    match employee {
        Some(emp) => (emp.department_id.clone(), emp.manager_id.clone()),
        None => (None, None),
    }
}

/// Create the single task for an (employee, date) pair.
///
/// The in-process duplicate check gives a friendly error on the common path;
/// the `UNIQUE(employee_id, date)` constraint is what actually guarantees
/// uniqueness when two creates race, and a constraint violation maps to the
/// same `DuplicateTask` error.
pub fn create_task(
    db: &TaskDb,
    request: CreateTaskRequest,
    today: NaiveDate,
) -> Result<DbTask, TaskError> {
    let employee = resolve_employee(db, &request)?;
    let date = match request.date {
        Some(date) => {
            crate::util::validate_yyyy_mm_dd(&date, "date").map_err(|reason| {
                TaskError::InvalidField {
                    field: "date".to_string(),
                    reason,
                }
            })?;
            date
        }
        None => today.format("%Y-%m-%d").to_string(),
    };

    if db.get_task_for_day(&employee.id, &date)?.is_some() {
        return Err(TaskError::DuplicateTask {
            employee_id: employee.id,
            date,
        });
    }

    let (department_id, manager_id) = employee_details(Some(&employee));
    let now = Utc::now().to_rfc3339();
    let task = DbTask {
        id: uuid::Uuid::new_v4().to_string(),
        employee_id: employee.id.clone(),
        date: date.clone(),
        department_id,
        manager_id,
        pod_text: normalize_text(request.pod_text),
        sod_text: normalize_text(request.sod_text),
        plan_submitted: false,
        plan_submitted_at: None,
        state: TaskState::Draft,
        done_at: None,
        created_at: now.clone(),
        updated_at: now,
    };

    match db.insert_task(&task) {
        Ok(()) => {}
        Err(e) if e.is_unique_violation() => {
            // Lost the race between pre-check and insert.
            return Err(TaskError::DuplicateTask {
                employee_id: employee.id,
                date,
            });
        }
        Err(e) => return Err(e.into()),
    }

    log::info!("Created task {} for {} on {}", task.id, task.employee_id, task.date);
    Ok(task)
}

/// Apply a proposed change set, silently dropping writes to locked fields.
///
/// Locked fields are removed from the change set rather than failing the
/// whole update: once the plan is submitted `pod_text` never changes, and
/// once the task has been marked done `sod_text` never changes. Other fields
/// in the same request still apply.
pub fn update_task(db: &TaskDb, request: UpdateTaskRequest) -> Result<DbTask, TaskError> {
    let mut task = db
        .get_task(&request.id)?
        .ok_or_else(|| TaskError::TaskNotFound(request.id.clone()))?;

    let change = apply_field_locks(&task, request);

    if let Some(pod) = change.pod_text {
        task.pod_text = Some(validate_text(&pod, "podText", POD_MAX_LEN)?);
    }
    if let Some(sod) = change.sod_text {
        task.sod_text = Some(validate_text(&sod, "sodText", SOD_MAX_LEN)?);
    }

    task.updated_at = Utc::now().to_rfc3339();
    db.update_task(&task)?;
    Ok(task)
}

/// Filter a change set down to the fields the task's current locks allow.
fn apply_field_locks(task: &DbTask, mut change: UpdateTaskRequest) -> UpdateTaskRequest {
    if task.plan_submitted && change.pod_text.is_some() {
        log::debug!("Dropping podText write on {}: plan already submitted", task.id);
        change.pod_text = None;
    }
    if summary_locked(task) && change.sod_text.is_some() {
        log::debug!("Dropping sodText write on {}: task already done", task.id);
        change.sod_text = None;
    }
    change
}

/// The summary lock engages the first time the task is marked done and never
/// releases, even if the task is reverted to draft afterwards.
fn summary_locked(task: &DbTask) -> bool {
    task.state == TaskState::Done || task.done_at.is_some()
}

/// Submit the Plan of the Day.
///
/// Fails with `EmptyPlan` when no plan text is present. Re-submitting an
/// already-submitted plan is allowed and refreshes the timestamp; the text
/// itself stays locked either way. The manager notification is best-effort.
pub fn submit_plan(
    db: &TaskDb,
    notifier: &dyn Notifier,
    id: &str,
    now: DateTime<Utc>,
) -> Result<DbTask, TaskError> {
    let mut task = db
        .get_task(id)?
        .ok_or_else(|| TaskError::TaskNotFound(id.to_string()))?;

    if task.pod_text.as_deref().map(str::trim).unwrap_or("").is_empty() {
        return Err(TaskError::EmptyPlan);
    }

    task.plan_submitted = true;
    task.plan_submitted_at = Some(now.to_rfc3339());
    task.updated_at = Utc::now().to_rfc3339();
    db.update_task(&task)?;

    notify_manager(db, notifier, &task, "POD submitted");
    Ok(task)
}

/// Mark the task done, engaging the summary lock. `done_at` is written only
/// the first time through.
pub fn mark_done(
    db: &TaskDb,
    notifier: &dyn Notifier,
    id: &str,
    now: DateTime<Utc>,
) -> Result<DbTask, TaskError> {
    let mut task = db
        .get_task(id)?
        .ok_or_else(|| TaskError::TaskNotFound(id.to_string()))?;

    task.state = TaskState::Done;
    if task.done_at.is_none() {
        task.done_at = Some(now.to_rfc3339());
    }
    task.updated_at = Utc::now().to_rfc3339();
    db.update_task(&task)?;

    notify_manager(db, notifier, &task, "SOD submitted");
    Ok(task)
}

/// Revert the task to draft. Does not release the summary lock.
pub fn mark_draft(db: &TaskDb, id: &str) -> Result<DbTask, TaskError> {
    let mut task = db
        .get_task(id)?
        .ok_or_else(|| TaskError::TaskNotFound(id.to_string()))?;

    task.state = TaskState::Draft;
    task.updated_at = Utc::now().to_rfc3339();
    db.update_task(&task)?;
    Ok(task)
}

fn resolve_employee(db: &TaskDb, request: &CreateTaskRequest) -> Result<DbEmployee, TaskError> {
    if let Some(ref id) = request.employee_id {
        return db
            .get_employee(id)?
            .ok_or_else(|| TaskError::EmployeeNotFound(id.clone()));
    }
    let login = request
        .acting_login
        .as_deref()
        .ok_or_else(|| TaskError::EmployeeNotFound("<no acting login>".to_string()))?;
    db.get_employee_by_login(login)?
        .ok_or_else(|| TaskError::EmployeeNotFound(login.to_string()))
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn validate_text(value: &str, field: &str, max: usize) -> Result<String, TaskError> {
    crate::util::validate_bounded_string(value, field, 1, max).map_err(|reason| {
        TaskError::InvalidField {
            field: field.to_string(),
            reason,
        }
    })
}

/// Best-effort notification to the task's manager. Failures and missing
/// contact addresses are logged, never surfaced to the caller.
fn notify_manager(db: &TaskDb, notifier: &dyn Notifier, task: &DbTask, event: &str) {
    let Some(ref manager_id) = task.manager_id else {
        return;
    };
    let manager = match db.get_employee(manager_id) {
        Ok(Some(manager)) => manager,
        Ok(None) => return,
        Err(e) => {
            log::warn!("Manager lookup failed for task {}: {}", task.id, e);
            return;
        }
    };
    let Some(ref contact) = manager.email else {
        return;
    };

    let employee_name = db
        .get_employee(&task.employee_id)
        .ok()
        .flatten()
        .map(|emp| emp.name);
    let subject = format!(
        "{}: {}",
        event,
        task.display_label(employee_name.as_deref())
    );
    let body = match event {
        "POD submitted" => task.pod_text.clone().unwrap_or_default(),
        _ => task.sod_text.clone().unwrap_or_default(),
    };
    if let Err(e) = notifier.notify(contact, &subject, &body) {
        log::warn!("Notification to {} failed: {}", contact, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_department, seed_employee, test_db};
    use crate::notifier::{NoopNotifier, RecordingNotifier};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    /// Directory fixture: Sarah reports to Maya in engineering.
    fn seed_org(db: &TaskDb) {
        seed_department(db, "eng", "Engineering");
        seed_employee(db, "maya", "Maya Patel", Some("maya"), Some("eng"), None);
        seed_employee(db, "sarah", "Sarah Chen", Some("sarah"), Some("eng"), Some("maya"));
    }

    fn create_for(db: &TaskDb, login: &str) -> DbTask {
        create_task(
            db,
            CreateTaskRequest {
                acting_login: Some(login.to_string()),
                ..Default::default()
            },
            today(),
        )
        .expect("create")
    }

    #[test]
    fn test_create_defaults_employee_and_date() {
        let db = test_db();
        seed_org(&db);

        let task = create_for(&db, "sarah");
        assert_eq!(task.employee_id, "sarah");
        assert_eq!(task.date, "2024-05-01");
        assert_eq!(task.state, TaskState::Draft);
    }

    #[test]
    fn test_create_populates_derived_fields() {
        let db = test_db();
        seed_org(&db);

        let task = create_for(&db, "sarah");
        assert_eq!(task.department_id.as_deref(), Some("eng"));
        assert_eq!(task.manager_id.as_deref(), Some("maya"));
    }

    #[test]
    fn test_employee_details_pure_preview() {
        let db = test_db();
        seed_org(&db);

        let sarah = db.get_employee("sarah").unwrap().unwrap();
        assert_eq!(
            employee_details(Some(&sarah)),
            (Some("eng".to_string()), Some("maya".to_string()))
        );
        assert_eq!(employee_details(None), (None, None));
    }

    #[test]
    fn test_second_create_same_day_is_duplicate() {
        let db = test_db();
        seed_org(&db);
        create_for(&db, "sarah");

        let err = create_task(
            &db,
            CreateTaskRequest {
                employee_id: Some("sarah".to_string()),
                date: Some("2024-05-01".to_string()),
                ..Default::default()
            },
            today(),
        )
        .expect_err("duplicate must fail");
        assert!(matches!(err, TaskError::DuplicateTask { .. }));
    }

    #[test]
    fn test_create_next_day_succeeds() {
        let db = test_db();
        seed_org(&db);
        create_for(&db, "sarah");

        let next = create_task(
            &db,
            CreateTaskRequest {
                acting_login: Some("sarah".to_string()),
                ..Default::default()
            },
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        )
        .expect("next day is a fresh pair");
        assert_eq!(next.date, "2024-05-02");
    }

    #[test]
    fn test_create_unknown_login_fails() {
        let db = test_db();
        seed_org(&db);
        let err = create_task(
            &db,
            CreateTaskRequest {
                acting_login: Some("ghost".to_string()),
                ..Default::default()
            },
            today(),
        )
        .expect_err("unmapped login");
        assert!(matches!(err, TaskError::EmployeeNotFound(_)));
    }

    #[test]
    fn test_submit_empty_plan_fails_and_leaves_state() {
        let db = test_db();
        seed_org(&db);
        let task = create_for(&db, "sarah");

        let err = submit_plan(&db, &NoopNotifier, &task.id, Utc::now())
            .expect_err("blank plan");
        assert!(matches!(err, TaskError::EmptyPlan));

        let reread = db.get_task(&task.id).unwrap().unwrap();
        assert!(!reread.plan_submitted);
        assert!(reread.plan_submitted_at.is_none());
    }

    #[test]
    fn test_submit_sets_flag_and_timestamp() {
        let db = test_db();
        seed_org(&db);
        let task = create_for(&db, "sarah");
        update_task(
            &db,
            UpdateTaskRequest {
                id: task.id.clone(),
                pod_text: Some("Review PRs".to_string()),
                ..Default::default()
            },
        )
        .expect("set plan");

        let submitted = submit_plan(&db, &NoopNotifier, &task.id, Utc::now()).expect("submit");
        assert!(submitted.plan_submitted);
        assert!(submitted.plan_submitted_at.is_some());
    }

    #[test]
    fn test_submit_notifies_manager() {
        let db = test_db();
        seed_org(&db);
        let task = create_for(&db, "sarah");
        update_task(
            &db,
            UpdateTaskRequest {
                id: task.id.clone(),
                pod_text: Some("Review PRs".to_string()),
                ..Default::default()
            },
        )
        .expect("set plan");

        let notifier = RecordingNotifier::default();
        submit_plan(&db, &notifier, &task.id, Utc::now()).expect("submit");
        assert_eq!(notifier.recipients(), vec!["maya@example.com".to_string()]);
    }

    #[test]
    fn test_submit_swallows_notifier_failure() {
        let db = test_db();
        seed_org(&db);
        let task = create_for(&db, "sarah");
        update_task(
            &db,
            UpdateTaskRequest {
                id: task.id.clone(),
                pod_text: Some("Review PRs".to_string()),
                ..Default::default()
            },
        )
        .expect("set plan");

        let notifier = RecordingNotifier {
            fail: true,
            ..Default::default()
        };
        submit_plan(&db, &notifier, &task.id, Utc::now())
            .expect("submission succeeds despite delivery failure");
    }

    #[test]
    fn test_disabled_submission_notifier_does_not_block_submit() {
        let db = test_db();
        seed_org(&db);
        let task = create_for(&db, "sarah");
        update_task(
            &db,
            UpdateTaskRequest {
                id: task.id.clone(),
                pod_text: Some("Review PRs".to_string()),
                ..Default::default()
            },
        )
        .expect("set plan");

        let config = crate::types::Config {
            submission_notifications: false,
            ..Default::default()
        };
        let sink = crate::notifier::submission_notifier(&config);
        let submitted =
            submit_plan(&db, sink.as_ref(), &task.id, Utc::now()).expect("submit succeeds");
        assert!(submitted.plan_submitted);
    }

    #[test]
    fn resubmit_refreshes_timestamp() {
        let db = test_db();
        seed_org(&db);
        let task = create_for(&db, "sarah");
        update_task(
            &db,
            UpdateTaskRequest {
                id: task.id.clone(),
                pod_text: Some("Review PRs".to_string()),
                ..Default::default()
            },
        )
        .expect("set plan");

        let first = chrono::DateTime::parse_from_rfc3339("2024-05-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let second = chrono::DateTime::parse_from_rfc3339("2024-05-01T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        submit_plan(&db, &NoopNotifier, &task.id, first).expect("first submit");
        let resubmitted =
            submit_plan(&db, &NoopNotifier, &task.id, second).expect("re-submit allowed");
        assert_eq!(
            resubmitted.plan_submitted_at.as_deref(),
            Some("2024-05-01T10:30:00+00:00")
        );
    }

    #[test]
    fn test_locked_plan_update_is_silently_dropped() {
        let db = test_db();
        seed_org(&db);
        let task = create_for(&db, "sarah");
        update_task(
            &db,
            UpdateTaskRequest {
                id: task.id.clone(),
                pod_text: Some("Review PRs".to_string()),
                ..Default::default()
            },
        )
        .expect("set plan");
        submit_plan(&db, &NoopNotifier, &task.id, Utc::now()).expect("submit");

        // The write is dropped, not rejected; the sibling field still applies.
        let updated = update_task(
            &db,
            UpdateTaskRequest {
                id: task.id.clone(),
                pod_text: Some("Changed".to_string()),
                sod_text: Some("Shipped the release".to_string()),
            },
        )
        .expect("update succeeds");
        assert_eq!(updated.pod_text.as_deref(), Some("Review PRs"));
        assert_eq!(updated.sod_text.as_deref(), Some("Shipped the release"));
    }

    #[test]
    fn test_done_locks_summary() {
        let db = test_db();
        seed_org(&db);
        let task = create_for(&db, "sarah");
        update_task(
            &db,
            UpdateTaskRequest {
                id: task.id.clone(),
                sod_text: Some("Done reviewing".to_string()),
                ..Default::default()
            },
        )
        .expect("set summary");
        mark_done(&db, &NoopNotifier, &task.id, Utc::now()).expect("done");

        let updated = update_task(
            &db,
            UpdateTaskRequest {
                id: task.id.clone(),
                sod_text: Some("Rewritten".to_string()),
                ..Default::default()
            },
        )
        .expect("update succeeds");
        assert_eq!(updated.sod_text.as_deref(), Some("Done reviewing"));
    }

    #[test]
    fn mark_draft_does_not_unlock_summary() {
        let db = test_db();
        seed_org(&db);
        let task = create_for(&db, "sarah");
        update_task(
            &db,
            UpdateTaskRequest {
                id: task.id.clone(),
                sod_text: Some("Done reviewing".to_string()),
                ..Default::default()
            },
        )
        .expect("set summary");
        mark_done(&db, &NoopNotifier, &task.id, Utc::now()).expect("done");
        let drafted = mark_draft(&db, &task.id).expect("back to draft");
        assert_eq!(drafted.state, TaskState::Draft);
        assert!(drafted.done_at.is_some(), "done_at survives the revert");

        let updated = update_task(
            &db,
            UpdateTaskRequest {
                id: task.id.clone(),
                sod_text: Some("Rewritten".to_string()),
                ..Default::default()
            },
        )
        .expect("update succeeds");
        assert_eq!(
            updated.sod_text.as_deref(),
            Some("Done reviewing"),
            "summary stays locked after draft revert"
        );
    }

    #[test]
    fn test_done_at_set_once() {
        let db = test_db();
        seed_org(&db);
        let task = create_for(&db, "sarah");

        let first = chrono::DateTime::parse_from_rfc3339("2024-05-01T17:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = chrono::DateTime::parse_from_rfc3339("2024-05-01T18:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        mark_done(&db, &NoopNotifier, &task.id, first).expect("done");
        mark_draft(&db, &task.id).expect("draft");
        let redone = mark_done(&db, &NoopNotifier, &task.id, later).expect("done again");
        assert_eq!(
            redone.done_at.as_deref(),
            Some("2024-05-01T17:00:00+00:00"),
            "done_at keeps the first completion time"
        );
    }

    /// End-to-end: create, submit, attempt locked edits, mark done.
    #[test]
    fn test_full_day_lifecycle() {
        let db = test_db();
        seed_org(&db);

        let task = create_task(
            &db,
            CreateTaskRequest {
                acting_login: Some("sarah".to_string()),
                date: Some("2024-05-01".to_string()),
                pod_text: Some("Review PRs".to_string()),
                ..Default::default()
            },
            today(),
        )
        .expect("create");

        submit_plan(&db, &NoopNotifier, &task.id, Utc::now()).expect("submit");
        let after_submit = db.get_task(&task.id).unwrap().unwrap();
        assert!(after_submit.plan_submitted);

        let after_edit = update_task(
            &db,
            UpdateTaskRequest {
                id: task.id.clone(),
                pod_text: Some("Changed".to_string()),
                ..Default::default()
            },
        )
        .expect("update");
        assert_eq!(after_edit.pod_text.as_deref(), Some("Review PRs"));

        mark_done(&db, &NoopNotifier, &task.id, Utc::now()).expect("done");
        let after_done = update_task(
            &db,
            UpdateTaskRequest {
                id: task.id.clone(),
                sod_text: Some("Done reviewing".to_string()),
                ..Default::default()
            },
        )
        .expect("update");
        assert!(after_done.sod_text.is_none(), "summary write dropped after done");
    }
}
