//! taskdayd — runs the escalation trigger loop against the local database.

use std::sync::Arc;

use taskday::notifier::{LogNotifier, Notifier};
use taskday::scheduler::Scheduler;
use taskday::state::AppState;
use taskday::types::Config;

#[tokio::main]
async fn main() {
    env_logger::init();

    let state = Arc::new(AppState::new());

    // First run: persist the defaults so the schedule is inspectable on disk.
    if let Ok(path) = taskday::state::config_path() {
        if !path.exists() {
            if let Err(e) = taskday::state::save_config(&state, Config::default()) {
                log::warn!("Failed to write default config: {}", e);
            }
        }
    }

    // Escalation alerts are not governed by the submission-notifications
    // flag; the sweep always gets a real sink. The flag only selects the
    // sink for POD/SOD submission dispatch (notifier::submission_notifier).
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

    if let Ok(guard) = state.config.lock() {
        if let Some(config) = guard.as_ref() {
            match taskday::scheduler::get_next_run_time(&config.escalation) {
                Ok(next) => log::info!("Next escalation trigger at {}", next),
                Err(e) => log::warn!("Escalation schedule invalid: {}", e),
            }
        }
    }

    log::info!("taskdayd started");
    Scheduler::new(state, notifier).run().await;
}
