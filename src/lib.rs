//! taskday — daily POD/SOD task tracking with manager escalation.
//!
//! Two cooperating pieces: the task lifecycle service
//! ([`services::tasks`]) owns the one-record-per-employee-per-day rule and
//! the POD/SOD field locks; the escalation sweep ([`escalation`]) runs once
//! per day and tells each manager which direct reports have an open task but
//! no submitted plan. Task state flows one way into the sweep — notifications
//! never feed back into task state.

pub mod db;
pub mod error;
pub mod escalation;
mod migrations;
pub mod notifier;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod types;
pub mod util;
