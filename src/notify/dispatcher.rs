//! Notification dispatcher.
//!
//! Emits one local notification per qualifying gift, in discovery order,
//! with a fixed minimum delay between successive notifications so the host
//! OS does not throttle the burst as a notification storm.

use std::sync::Arc;
use std::time::Duration;

use crate::gifts::GiftEnvelope;
use crate::prefs::NotificationPrefs;
use crate::traits::{LocalNotification, Notifier};

use super::render::{notification_key, render_body, render_title, tier_for};

/// Minimum delay between successive notifications within one cycle.
const DISPATCH_GAP: Duration = Duration::from_millis(500);

/// Renders and emits local notifications for qualifying gifts.
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    gap: Duration,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            gap: DISPATCH_GAP,
        }
    }

    /// Override the inter-notification delay.
    pub fn with_gap(mut self, gap: Duration) -> Self {
        self.gap = gap;
        self
    }

    /// Build the notification for one gift.
    pub fn render(&self, envelope: &GiftEnvelope, prefs: &NotificationPrefs) -> LocalNotification {
        let gift = &envelope.gift_data;
        LocalNotification {
            key: notification_key(envelope.gift_id().unwrap_or_default()),
            title: render_title(gift),
            body: render_body(envelope),
            tier: tier_for(gift, prefs.sound_enabled),
            sound: prefs
                .sound_enabled
                .then(|| prefs.sound_name.clone()),
            vibrate: prefs.vibration_enabled,
        }
    }

    /// Emit one notification per gift, in order.
    ///
    /// Dispatch failures (missing permission, shim errors) are logged and
    /// do not abort the remaining queue. Returns the number of
    /// notifications successfully emitted.
    pub async fn dispatch_all(
        &self,
        gifts: &[GiftEnvelope],
        prefs: &NotificationPrefs,
    ) -> usize {
        let mut emitted = 0;
        for (index, envelope) in gifts.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.gap).await;
            }
            let notification = self.render(envelope, prefs);
            match self.notifier.notify(&notification).await {
                Ok(()) => emitted += 1,
                Err(e) => {
                    tracing::warn!(
                        key = notification.key,
                        error = %e,
                        "Notification dispatch failed, continuing with queue"
                    );
                }
            }
        }
        emitted
    }
}
