//! Single-slot transient notifications with timed auto-dismiss.
//!
//! Time never advances on its own: the host calls [`Notifier::tick`] with the
//! current instant and an expired notification is cleared then.

use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_DURATION_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Monotonic per-notifier sequence number; a presentation layer can key
    /// on it to restart its fade animation.
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    pub shown_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Notifier {
    current: Option<Notification>,
    duration: Duration,
    next_id: u64,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(std::time::Duration::from_millis(DEFAULT_DURATION_MS))
    }
}

impl Notifier {
    #[must_use]
    pub fn new(duration: std::time::Duration) -> Self {
        Self {
            current: None,
            duration: Duration::from_std(duration).unwrap_or(Duration::MAX),
            next_id: 0,
        }
    }

    /// Show `message`, replacing whatever is visible and restarting the timer.
    pub fn show(
        &mut self,
        kind: NotificationKind,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> u64 {
        self.next_id += 1;
        let message = message.into();
        tracing::debug!(id = self.next_id, ?kind, message = %message, "notification shown");
        self.current = Some(Notification {
            id: self.next_id,
            kind,
            message,
            shown_at: now,
            expires_at: now.checked_add_signed(self.duration).unwrap_or(DateTime::<Utc>::MAX_UTC),
        });
        self.next_id
    }

    #[must_use]
    pub const fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    /// Close the visible notification early, cancelling its timer.
    pub fn dismiss(&mut self) -> Option<Notification> {
        self.current.take()
    }

    /// Clear the visible notification if it has expired at `now`, returning it.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Notification> {
        if self.current.as_ref().is_some_and(|n| now >= n.expires_at) {
            return self.current.take();
        }
        None
    }
}
