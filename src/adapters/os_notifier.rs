//! Native OS notification adapter.
//!
//! Sends desktop notification banners. Uses `osascript` on macOS for
//! reliable delivery from terminal apps (no bundle identifier or
//! permissions needed); other platforms log the notification only, so the
//! core keeps working headless.

use async_trait::async_trait;

use crate::traits::{LocalNotification, NotificationTier, Notifier, NotifyError};

/// Notifier backed by the host OS notification facility.
#[derive(Debug, Default)]
pub struct OsNotifier;

impl OsNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for OsNotifier {
    async fn notify(&self, notification: &LocalNotification) -> Result<(), NotifyError> {
        tracing::debug!(
            key = notification.key,
            tier = ?notification.tier,
            "Sending OS notification: {}",
            notification.title
        );

        let n = notification.clone();
        let result = tokio::task::spawn_blocking(move || send_notification(&n))
            .await
            .map_err(|e| NotifyError::DispatchFailed(e.to_string()))?;
        result
    }
}

#[cfg(target_os = "macos")]
fn send_notification(notification: &LocalNotification) -> Result<(), NotifyError> {
    use std::process::Command;

    // Escape double quotes and backslashes for AppleScript string literals
    let escaped_title = notification
        .title
        .replace('\\', "\\\\")
        .replace('"', "\\\"");
    let escaped_body = notification.body.replace('\\', "\\\\").replace('"', "\\\"");

    let mut script = format!(
        "display notification \"{}\" with title \"{}\"",
        escaped_body, escaped_title
    );
    if let Some(sound) = &notification.sound {
        let escaped_sound = sound.replace('\\', "\\\\").replace('"', "\\\"");
        script.push_str(&format!(" sound name \"{}\"", escaped_sound));
    } else if notification.tier == NotificationTier::Critical {
        script.push_str(" sound name \"Glass\"");
    }

    match Command::new("osascript").arg("-e").arg(&script).output() {
        Ok(output) if !output.status.success() => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(NotifyError::DispatchFailed(stderr.trim().to_string()))
        }
        Err(e) => Err(NotifyError::DispatchFailed(format!(
            "Failed to spawn osascript: {}",
            e
        ))),
        _ => Ok(()),
    }
}

#[cfg(not(target_os = "macos"))]
fn send_notification(notification: &LocalNotification) -> Result<(), NotifyError> {
    tracing::info!(
        tier = ?notification.tier,
        "[notification] {}: {}",
        notification.title,
        notification.body
    );
    Ok(())
}
