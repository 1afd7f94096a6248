//! Notification delivery and status display collaborators.

use std::process::Command;
use std::sync::Arc;

use fxwatch_fx::{Notifier, StatusSink};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A notification waiting for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

/// Receiving half of the notification channel.
pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

/// Notifier that enqueues messages for a delivery task and returns at once.
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

/// Create a connected notifier and receiver.
pub fn notification_channel() -> (ChannelNotifier, NotificationReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelNotifier { tx }, rx)
}

impl Notifier for ChannelNotifier {
    fn notify(&self, title: &str, message: &str) {
        let notification = Notification {
            title: title.to_string(),
            message: message.to_string(),
        };
        if self.tx.send(notification).is_err() {
            warn!(body = message, "Notification delivery stopped, dropping message");
        }
    }
}

/// Deliver queued notifications to `backend` until every sender is gone.
///
/// Each delivery runs on the blocking pool so a slow backend only delays
/// later notifications, never the refresh engine.
pub async fn run_delivery(mut rx: NotificationReceiver, backend: Arc<dyn Notifier>) {
    while let Some(notification) = rx.recv().await {
        let backend = backend.clone();
        let delivered = tokio::task::spawn_blocking(move || {
            backend.notify(&notification.title, &notification.message)
        })
        .await;

        if let Err(e) = delivered {
            warn!(error = %e, "Notification backend panicked");
        }
    }
    debug!("Notification delivery finished");
}

/// Backend that writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        info!(title, body = message, "Notification");
    }
}

/// Backend that runs `<program> <title> <message>`, e.g. `notify-send`.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
}

impl CommandNotifier {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Notifier for CommandNotifier {
    fn notify(&self, title: &str, message: &str) {
        match Command::new(&self.program).arg(title).arg(message).status() {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(program = %self.program, %status, "Notification command failed"),
            Err(e) => warn!(program = %self.program, error = %e, "Cannot run notification command"),
        }
    }
}

/// Display that logs the status summary whenever it changes.
#[derive(Debug, Default)]
pub struct LogStatus {
    last: Mutex<Option<String>>,
}

impl LogStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent status text.
    pub fn current(&self) -> Option<String> {
        self.last.lock().clone()
    }
}

impl StatusSink for LogStatus {
    fn set_status_text(&self, text: &str) {
        let mut last = self.last.lock();
        if last.as_deref() == Some(text) {
            return;
        }
        for line in text.lines() {
            info!(status = line, "Rates");
        }
        *last = Some(text.to_string());
    }
}
