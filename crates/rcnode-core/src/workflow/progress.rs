//! Progress reports, notifications and observers.
//!
//! The executor hands each new [`ProgressReport`] to a caller-owned
//! [`ProgressObserver`] by value. Failures are additionally surfaced as
//! [`Notification`]s so a front end that does not watch every report still
//! sees them.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Stage name carried by the final report of a successful run.
pub const COMPLETED_STAGE: &str = "Completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::Idle => "idle",
            ProgressStatus::Running => "running",
            ProgressStatus::Completed => "completed",
            ProgressStatus::Error => "error",
        }
    }
}

/// Snapshot of a workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub current_stage: String,
    pub current_command: Option<String>,
    /// 0–100
    pub percent_complete: u8,
    pub status: ProgressStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProgressReport {
    pub fn running(stage: &str, command: Option<String>, percent: u8) -> Self {
        Self {
            current_stage: stage.to_string(),
            current_command: command,
            percent_complete: percent,
            status: ProgressStatus::Running,
            message: None,
        }
    }

    pub fn completed() -> Self {
        Self {
            current_stage: COMPLETED_STAGE.to_string(),
            current_command: None,
            percent_complete: 100,
            status: ProgressStatus::Completed,
            message: None,
        }
    }

    pub fn error(stage: &str, command: Option<String>, percent: u8, message: impl Into<String>) -> Self {
        Self {
            current_stage: stage.to_string(),
            current_command: command,
            percent_complete: percent,
            status: ProgressStatus::Error,
            message: Some(message.into()),
        }
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(level: NotificationLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Receives progress during workflow execution.
///
/// Called synchronously from the executor, in emission order.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, report: ProgressReport);

    fn on_notification(&self, _notification: Notification) {}
}

/// Discards everything.
#[derive(Debug, Clone, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _report: ProgressReport) {}
}

/// Anything the executor emits, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Progress(ProgressReport),
    Notification(Notification),
}

/// Forwards events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelObserver {
    pub fn new(sender: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, report: ProgressReport) {
        // Receiver may have been dropped
        let _ = self.sender.send(ProgressEvent::Progress(report));
    }

    fn on_notification(&self, notification: Notification) {
        let _ = self.sender.send(ProgressEvent::Notification(notification));
    }
}

/// An observer plus the stream of everything it receives.
///
/// The stream ends once the observer (and all its clones) are dropped.
pub fn progress_channel() -> (ChannelObserver, UnboundedReceiverStream<ProgressEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelObserver::new(tx), UnboundedReceiverStream::new(rx))
}
