//! Signed remote configuration document.
//!
//! The backend signs the document over a canonical serialization (keys
//! sorted recursively, Python-style `", "` / `": "` separators) with the
//! shared secret appended, SHA-256, hex. The `signature` and `timestamp`
//! fields are attached after signing and are therefore excluded from
//! verification.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Channels shipped as built-in defaults, used until a signed document has
/// ever loaded so the app is operable fully offline on first launch.
static DEFAULT_CHANNELS: Lazy<Vec<String>> = Lazy::new(|| {
    vec![
        "@News_Collections".to_string(),
        "@gifts_detector".to_string(),
        "@GiftsTracker".to_string(),
        "@new_gifts_alert_news".to_string(),
    ]
});

/// Feature flags carried by the config document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureFlags {
    #[serde(default = "default_true")]
    pub background_monitoring: bool,
    #[serde(default = "default_true")]
    pub sound_notifications: bool,
    #[serde(default)]
    pub max_price_filter: Option<u64>,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            background_monitoring: true,
            sound_notifications: true,
            max_price_filter: Some(100_000),
        }
    }
}

/// Security policy carried by the config document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecurityPolicy {
    #[serde(default = "default_min_version")]
    pub min_app_version: String,
    #[serde(default)]
    pub force_update: bool,
    #[serde(default)]
    pub blocked_regions: Vec<String>,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            min_app_version: default_min_version(),
            force_update: false,
            blocked_regions: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_min_version() -> String {
    "1.0.0".to_string()
}

/// Server-issued configuration document.
///
/// Replaced wholesale on every successful fetch. The `Default` instance is
/// the hard-coded fallback served by accessors before any document loads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigDocument {
    #[serde(default)]
    pub monitoring_channels: Vec<String>,
    #[serde(default)]
    pub required_channel: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub min_update_interval: Option<u64>,
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub security: SecurityPolicy,
    #[serde(default)]
    pub signature: String,
    /// Issue timestamp attached by the server alongside the signature.
    #[serde(default, rename = "timestamp")]
    pub issued_at: Option<String>,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            monitoring_channels: DEFAULT_CHANNELS.clone(),
            required_channel: Some("@analizatorNFT".to_string()),
            api_url: None,
            min_update_interval: Some(30),
            features: FeatureFlags::default(),
            security: SecurityPolicy::default(),
            signature: String::new(),
            issued_at: None,
        }
    }
}

/// Serialize a JSON value canonically: keys sorted recursively, `", "` and
/// `": "` separators. Matches the backend's signing serialization exactly.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let entries: Vec<String> = keys
                .iter()
                .map(|k| {
                    format!(
                        "{}: {}",
                        serde_json::to_string(k).unwrap_or_default(),
                        canonical_json(&map[k.as_str()])
                    )
                })
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        Value::Array(items) => {
            let entries: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", entries.join(", "))
        }
        other => other.to_string(),
    }
}

/// Verify a raw config document's signature.
///
/// The signature covers every top-level field except `signature` itself and
/// the server-attached `timestamp`, serialized canonically and concatenated
/// with `:{shared_secret}`.
pub fn verify_signature(raw: &Value, shared_secret: &str) -> bool {
    let Value::Object(map) = raw else {
        return false;
    };
    let Some(Value::String(signature)) = map.get("signature") else {
        return false;
    };

    let mut unsigned = map.clone();
    unsigned.remove("signature");
    unsigned.remove("timestamp");

    let base = format!(
        "{}:{}",
        canonical_json(&Value::Object(unsigned)),
        shared_secret
    );
    let mut hasher = Sha256::new();
    hasher.update(base.as_bytes());
    let expected = hex::encode(hasher.finalize());

    expected == *signature
}

/// Sign a raw config document the way the backend does. Test helper, also
/// used to re-seal documents cached locally.
pub fn sign_document(raw: &mut Value, shared_secret: &str) {
    let Value::Object(map) = raw else {
        return;
    };
    let mut unsigned = map.clone();
    unsigned.remove("signature");
    unsigned.remove("timestamp");

    let base = format!(
        "{}:{}",
        canonical_json(&Value::Object(unsigned)),
        shared_secret
    );
    let mut hasher = Sha256::new();
    hasher.update(base.as_bytes());
    map.insert(
        "signature".to_string(),
        Value::String(hex::encode(hasher.finalize())),
    );
}
