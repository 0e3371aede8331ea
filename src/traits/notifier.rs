//! Local notification trait abstraction.
//!
//! The platform shims that own notification channels and permission prompts
//! live outside this crate; they plug in through this trait. The dispatcher
//! only decides *what* to show and at which urgency tier.

use async_trait::async_trait;

/// Urgency tier for a local notification.
///
/// `Critical` implies a full-screen/interruptive presentation where the host
/// platform allows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationTier {
    Standard,
    Elevated,
    Critical,
}

/// A rendered local notification, ready for the platform shim.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalNotification {
    /// Stable key derived from the gift id. Re-delivery of the same id is
    /// coalesced by the host notification system.
    pub key: u32,
    /// Notification title
    pub title: String,
    /// Notification body
    pub body: String,
    /// Urgency tier
    pub tier: NotificationTier,
    /// Sound name, when the user has sounds enabled
    pub sound: Option<String>,
    /// Whether to vibrate
    pub vibrate: bool,
}

/// Notification dispatch errors.
#[derive(Debug, Clone)]
pub enum NotifyError {
    /// Notification permission is missing or was revoked
    PermissionDenied,
    /// The platform shim rejected the notification
    DispatchFailed(String),
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::PermissionDenied => write!(f, "Notification permission denied"),
            NotifyError::DispatchFailed(msg) => write!(f, "Notification dispatch failed: {}", msg),
        }
    }
}

impl std::error::Error for NotifyError {}

/// Trait for emitting local notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Emit a single notification.
    ///
    /// Failures are recoverable: the dispatcher logs them and continues with
    /// the rest of the queue.
    async fn notify(&self, notification: &LocalNotification) -> Result<(), NotifyError>;
}
