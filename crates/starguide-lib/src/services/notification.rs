// Transient notification fan-out
// Provides typed in-app notifications for recoverable failures.
//
// Every network-boundary failure surfaces here (except rate limits, which
// route to the cooldown gate, and suggestion parse failures, which stay
// silent). Nothing is fatal; subscribers render toasts and move on.

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 32;

/// Notification categories matching the failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Session creation or initial history fetch failed
    InitializationFailed,
    /// A chat message failed to deliver; the optimistic message stays
    SendFailed,
    /// Loading older history failed; the log is unchanged
    PaginationFailed,
    /// City search failed
    SearchFailed,
}

impl NotificationKind {
    pub fn title(&self) -> &'static str {
        match self {
            NotificationKind::InitializationFailed => "Chat Unavailable",
            NotificationKind::SendFailed => "Message Not Sent",
            NotificationKind::PaginationFailed => "Could Not Load History",
            NotificationKind::SearchFailed => "Search Failed",
        }
    }
}

/// A single transient notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/// Broadcast hub the UI layer subscribes to
pub struct NotificationCenter {
    tx: broadcast::Sender<Notification>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Publish a notification; dropped silently when nobody is listening
    pub fn publish(&self, kind: NotificationKind, message: impl Into<String>) {
        let notification = Notification {
            kind,
            message: message.into(),
        };
        log::warn!(
            "[notify] {}: {}",
            notification.kind.title(),
            notification.message
        );
        let _ = self.tx.send(notification);
    }
}
