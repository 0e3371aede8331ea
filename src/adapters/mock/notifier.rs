//! Recording notifier for testing.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::traits::{LocalNotification, Notifier, NotifyError};

/// A [`Notifier`] that records every emitted notification.
///
/// Tests inspect the recorded list to verify dispatch order, tier
/// selection, and throttling behavior. Can be configured to fail to
/// exercise the continue-on-error path.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    sent: Arc<Mutex<Vec<LocalNotification>>>,
    fail_with: Arc<Mutex<Option<NotifyError>>>,
}

impl MockNotifier {
    /// Create a new recording notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure every subsequent dispatch to fail with `error`.
    pub fn set_failure(&self, error: Option<NotifyError>) {
        *self.fail_with.lock().unwrap() = error;
    }

    /// All notifications emitted so far, in dispatch order.
    pub fn sent(&self) -> Vec<LocalNotification> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of notifications emitted.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Clear the recorded notifications.
    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, notification: &LocalNotification) -> Result<(), NotifyError> {
        if let Some(err) = self.fail_with.lock().unwrap().clone() {
            return Err(err);
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
