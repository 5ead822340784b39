//! Notification boundary: guard rejections, failures, and cancellations
//! surface to the user through a single notify(kind, message) sink.

use std::sync::Mutex;

/// Kind of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Sink for user-facing notices. Implementations must not block the turn.
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NoticeKind, message: &str);
}

/// Notifier that routes notices to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Error => log::error!("{}", message),
            NoticeKind::Warning => log::warn!("{}", message),
            NoticeKind::Info | NoticeKind::Success => log::info!("{}", message),
        }
    }
}

/// Notifier that keeps notices in memory so tests can assert on them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeKind, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notices seen so far, in order.
    pub fn notices(&self) -> Vec<(NoticeKind, String)> {
        self.notices.lock().unwrap().clone()
    }

    /// Number of notices of the given kind.
    pub fn count(&self, kind: NoticeKind) -> usize {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        self.notices.lock().unwrap().push((kind, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_notifier_counts_by_kind() {
        let n = RecordingNotifier::new();
        n.notify(NoticeKind::Warning, "a");
        n.notify(NoticeKind::Error, "b");
        n.notify(NoticeKind::Warning, "c");
        assert_eq!(n.count(NoticeKind::Warning), 2);
        assert_eq!(n.count(NoticeKind::Error), 1);
        assert_eq!(n.count(NoticeKind::Info), 0);
        assert_eq!(n.notices().len(), 3);
    }
}
