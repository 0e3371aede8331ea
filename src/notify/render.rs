//! Notification rendering and tier selection.

use sha2::{Digest, Sha256};

use crate::gifts::{Gift, GiftEnvelope};
use crate::traits::NotificationTier;

/// Stable notification key for a gift id.
///
/// The host notification system coalesces re-deliveries under the same
/// key, so the same gift can never stack duplicate banners.
pub fn notification_key(gift_id: &str) -> u32 {
    let digest = Sha256::digest(gift_id.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Select the urgency tier for a gift.
///
/// Pure function of the gift's flags and the user's sound preference:
/// sold-out gifts are informational, limited gifts interrupt when sounds
/// are allowed and escalate visually when they are not.
pub fn tier_for(gift: &Gift, sound_enabled: bool) -> NotificationTier {
    if gift.is_sold_out {
        return NotificationTier::Standard;
    }
    if gift.is_limited {
        if sound_enabled {
            NotificationTier::Critical
        } else {
            NotificationTier::Elevated
        }
    } else {
        NotificationTier::Standard
    }
}

/// Render the notification title for a gift.
pub fn render_title(gift: &Gift) -> String {
    let emoji = gift.emoji.as_deref().unwrap_or("🎁");
    let headline = if gift.is_limited {
        "Limited gift detected!"
    } else {
        "New gift detected"
    };
    match &gift.name {
        Some(name) => format!("{} {}: {}", emoji, headline, name),
        None => format!("{} {}", emoji, headline),
    }
}

/// Render the notification body for a gift.
pub fn render_body(envelope: &GiftEnvelope) -> String {
    let gift = &envelope.gift_data;
    let mut lines = Vec::new();

    if let Some(price) = &gift.price {
        lines.push(format!("Price: {} ⭐", price));
    }
    if let Some(percent) = gift.available_percent {
        lines.push(format!("Available: {}%", percent));
    } else if let (Some(available), Some(total)) = (gift.available, gift.total) {
        lines.push(format!("Available: {}/{}", available, total));
    }
    if gift.is_sold_out {
        lines.push("Sold out".to_string());
    }
    if let Some(channel) = &envelope.channel_username {
        lines.push(format!("From {}", channel));
    }
    if let Some(description) = &gift.description {
        lines.push(description.clone());
    }

    lines.join("\n")
}
