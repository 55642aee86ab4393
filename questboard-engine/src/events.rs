/// Reconciler events
///
/// Besides the state snapshot, the reconciler reports two kinds of
/// happenings to the presentation layer:
///
/// - **Point events**: points earned by completing a task, spent on a
///   purchase, refunded by a sale or revoked when a task is un-completed
/// - **Notifications**: short success/error messages meant to be shown for a
///   limited time (`ttl`) and then dismissed
///
/// Events travel over an unbounded `mpsc` channel. Emitting never blocks and
/// never fails the operation that produced the event: if nobody listens, the
/// event is dropped.
///
/// # Example
///
/// ```
/// use questboard_engine::events::{EventSink, NoticeLevel, ReconcilerEvent};
/// use std::time::Duration;
///
/// let (sink, mut rx) = EventSink::channel(Duration::from_secs(3));
/// sink.notify(NoticeLevel::Success, "Task added successfully!");
///
/// match rx.try_recv().unwrap() {
///     ReconcilerEvent::Notification(notice) => {
///         assert_eq!(notice.message, "Task added successfully!");
///         assert_eq!(notice.ttl, Duration::from_secs(3));
///     }
///     other => panic!("unexpected event: {:?}", other),
/// }
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeLevel::Success => write!(f, "success"),
            NoticeLevel::Info => write!(f, "info"),
            NoticeLevel::Error => write!(f, "error"),
        }
    }
}

/// Transient message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NoticeLevel,
    pub message: String,

    /// How long the message should stay visible
    #[serde(with = "ttl_millis")]
    pub ttl: Duration,
}

/// Event emitted by the reconciler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconcilerEvent {
    /// A task was completed and its points credited
    PointsEarned { task_id: i64, points: i64, balance: i64 },

    /// A task was un-completed and its points taken back
    PointsRevoked { task_id: i64, points: i64, balance: i64 },

    /// A shop item was bought
    PointsSpent { item_id: i64, price: i64, balance: i64 },

    /// A storage item was sold back
    PointsRefunded { unique_id: String, amount: i64, balance: i64 },

    /// Message to display
    Notification(Notification),
}

impl ReconcilerEvent {
    /// The notification carried by this event, if any
    pub fn as_notification(&self) -> Option<&Notification> {
        match self {
            ReconcilerEvent::Notification(notice) => Some(notice),
            _ => None,
        }
    }
}

/// Sending half of the event channel
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<ReconcilerEvent>,
    notice_ttl: Duration,
}

impl EventSink {
    /// Creates a sink and its receiver
    pub fn channel(notice_ttl: Duration) -> (Self, mpsc::UnboundedReceiver<ReconcilerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventSink { tx, notice_ttl }, rx)
    }

    /// Emits an event, dropping it if the receiver is gone
    pub fn emit(&self, event: ReconcilerEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Event receiver dropped; discarding event");
        }
    }

    /// Emits a notification with the configured ttl
    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        self.emit(ReconcilerEvent::Notification(Notification {
            level,
            message: message.into(),
            ttl: self.notice_ttl,
        }));
    }

    pub fn notice_ttl(&self) -> Duration {
        self.notice_ttl
    }
}

mod ttl_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(ttl.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
