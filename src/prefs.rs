//! Per-user notification preferences.

use serde::{Deserialize, Serialize};

use crate::vault::SecretVault;

/// Vault key for the persisted preferences.
const PREFS_KEY: &str = "prefs";

/// User-configured notification preferences.
///
/// Persisted through the vault; absent or unreadable stored preferences
/// fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationPrefs {
    /// Play a sound with notifications.
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    /// Vibrate with notifications.
    #[serde(default = "default_true")]
    pub vibration_enabled: bool,
    /// Minimum qualifying price; 0 disables the filter.
    #[serde(default)]
    pub min_price: u64,
    /// Channels the user wants notifications from; `None` means all
    /// monitored channels.
    #[serde(default)]
    pub selected_channels: Option<Vec<String>>,
    /// Sound to play for notifications.
    #[serde(default = "default_sound")]
    pub sound_name: String,
}

fn default_true() -> bool {
    true
}

fn default_sound() -> String {
    "alarm_sound".to_string()
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            vibration_enabled: true,
            min_price: 0,
            selected_channels: None,
            sound_name: default_sound(),
        }
    }
}

impl NotificationPrefs {
    /// Load preferences from the vault, defaulting when absent or
    /// unreadable.
    pub async fn load(vault: &SecretVault) -> Self {
        match vault.get(PREFS_KEY).await {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Stored preferences unreadable, using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Persist preferences through the vault.
    pub async fn save(&self, vault: &SecretVault) {
        match serde_json::to_string(self) {
            Ok(json) => vault.put(PREFS_KEY, &json).await,
            Err(e) => tracing::warn!(error = %e, "Failed to serialize preferences"),
        }
    }
}
