//! Notification dispatch boundary.
//!
//! Delivery transport (mail, chat, native notifications) lives behind this
//! trait so the lifecycle and escalation code never change when notifications
//! are toggled off. Failures are reported as strings; callers decide whether
//! to surface or swallow them.

#[cfg(test)]
use std::sync::Mutex;

/// Pluggable notification sink.
pub trait Notifier: Send + Sync {
    fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), String>;
}

/// Disabled-delivery revision: accepts everything, delivers nothing.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _recipient: &str, _subject: &str, _body: &str) -> Result<(), String> {
        Ok(())
    }
}

/// Log-backed notifier used by the daemon: makes dispatches observable
/// without any transport dependency.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), String> {
        log::info!("notify {recipient}: {subject} ({} chars)", body.len());
        Ok(())
    }
}

/// Sink for POD/SOD submission notifications, selected by the
/// `submissionNotifications` config flag. Escalation alerts never route
/// through this choice — the sweep's notifier is wired unconditionally.
pub fn submission_notifier(config: &crate::types::Config) -> Box<dyn Notifier> {
    if config.submission_notifications {
        Box::new(LogNotifier)
    } else {
        Box::new(NoopNotifier)
    }
}

/// Test double that records every dispatch.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String, String)>>,
    /// When true, every notify call fails. Exercises skip-and-continue paths.
    pub fail: bool,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|guard| guard.iter().map(|(to, _, _)| to.clone()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), String> {
        if self.fail {
            return Err("delivery refused".to_string());
        }
        if let Ok(mut guard) = self.sent.lock() {
            guard.push((
                recipient.to_string(),
                subject.to_string(),
                body.to_string(),
            ));
        }
        Ok(())
    }
}
