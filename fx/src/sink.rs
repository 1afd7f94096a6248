//! Outbound seams: notifications and status display.

/// Sink for alarm notifications.
///
/// Implementations must not block and must swallow their own delivery
/// errors; the engine never learns whether a notification was shown.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Display surface for the human-readable status summary.
pub trait StatusSink: Send + Sync {
    fn set_status_text(&self, text: &str);
}

/// Notifier that keeps every message, for assertions in tests.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Default)]
pub struct RecordingNotifier {
    sent: parking_lot::Mutex<Vec<(String, String)>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(title, message)` pairs received so far.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        self.sent.lock().push((title.to_string(), message.to_string()));
    }
}

/// Status sink that keeps the latest text, for assertions in tests.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Default)]
pub struct RecordingStatus {
    text: parking_lot::Mutex<Option<String>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest status text, if any was set.
    pub fn text(&self) -> Option<String> {
        self.text.lock().clone()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl StatusSink for RecordingStatus {
    fn set_status_text(&self, text: &str) {
        *self.text.lock() = Some(text.to_string());
    }
}
