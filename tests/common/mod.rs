//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde_json::{json, Value};

use giftwatch::adapters::mock::{MemoryStore, MockHttpClient, MockNotifier};
use giftwatch::auth::{AppIdentity, TokenAuthority};
use giftwatch::config::{sign_document, ConfigSynchronizer};
use giftwatch::gifts::{DedupFilterEngine, GiftFeed};
use giftwatch::notify::NotificationDispatcher;
use giftwatch::poll::SyncCycle;
use giftwatch::prefs::NotificationPrefs;
use giftwatch::vault::SecretVault;

pub const BASE: &str = "https://api.example.com";
pub const SECRET: &str = "test-shared-secret";

pub fn identity() -> AppIdentity {
    AppIdentity {
        app_version: "1.2.0".to_string(),
        shared_secret: SECRET.to_string(),
        device_id: "device-1".to_string(),
    }
}

/// Test fixture bundling one fully wired component graph over mocks.
pub struct Harness {
    pub http: MockHttpClient,
    pub store: MemoryStore,
    pub notifier: MockNotifier,
    pub vault: Arc<SecretVault>,
    pub authority: Arc<TokenAuthority>,
    pub config: Arc<ConfigSynchronizer>,
    pub engine: Arc<DedupFilterEngine>,
    pub prefs: Arc<RwLock<NotificationPrefs>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::over_store(MemoryStore::new())
    }

    /// Build a harness over an existing store, simulating a process restart
    /// with persisted state.
    pub fn over_store(store: MemoryStore) -> Self {
        let http = MockHttpClient::new();
        let notifier = MockNotifier::new();
        let vault = Arc::new(SecretVault::new(Arc::new(store.clone())));
        let authority = Arc::new(TokenAuthority::new(
            Arc::new(http.clone()),
            Arc::clone(&vault),
            BASE,
            identity(),
        ));
        let config = Arc::new(ConfigSynchronizer::new(
            Arc::new(http.clone()),
            Arc::clone(&vault),
            Arc::clone(&authority),
            BASE,
        ));
        let engine = Arc::new(DedupFilterEngine::new(Arc::clone(&vault)));
        let prefs = Arc::new(RwLock::new(NotificationPrefs::default()));

        Self {
            http,
            store,
            notifier,
            vault,
            authority,
            config,
            engine,
            prefs,
        }
    }

    /// Build the cycle over this harness's components.
    pub fn cycle(&self) -> Arc<SyncCycle> {
        let feed = GiftFeed::new(Arc::new(self.http.clone()), BASE);
        let dispatcher = NotificationDispatcher::new(Arc::new(self.notifier.clone()))
            .with_gap(Duration::from_millis(0));
        Arc::new(SyncCycle::new(
            Arc::clone(&self.authority),
            Arc::clone(&self.config),
            feed,
            Arc::clone(&self.engine),
            dispatcher,
            Arc::clone(&self.prefs),
        ))
    }

    pub fn set_min_price(&self, min_price: u64) {
        self.prefs.write().unwrap().min_price = min_price;
    }
}

/// A signed config document as the backend would serve it.
pub fn signed_config_with(channels: &[&str]) -> Value {
    let mut raw = json!({
        "monitoring_channels": channels,
        "required_channel": "@analizatorNFT",
        "min_update_interval": 30,
        "features": {
            "background_monitoring": true,
            "sound_notifications": true,
            "max_price_filter": 100000
        },
        "security": {"min_app_version": "1.0.0", "force_update": false}
    });
    sign_document(&mut raw, SECRET);
    raw["timestamp"] = json!("2026-08-08T12:00:00");
    raw
}

pub fn signed_config() -> Value {
    signed_config_with(&["@News_Collections", "@gifts_detector"])
}

/// A gift feed row as the backend serves it.
pub fn feed_row(id: &str, price: &str, channel: &str) -> Value {
    json!({
        "id": id,
        "gift_id": id,
        "gift_data": {
            "id": id,
            "name": format!("Gift #{}", id),
            "price": price,
            "is_limited": false,
            "is_sold_out": false,
            "urgency_score": 0.5
        },
        "channel_username": channel,
        "message_link": format!("https://t.me/{}/1", channel.trim_start_matches('@')),
        "created_at": "2026-08-08T10:00:00"
    })
}

pub fn auth_url() -> String {
    format!("{}/api/auth/app", BASE)
}

pub fn config_url() -> String {
    format!("{}/api/config", BASE)
}

pub fn gifts_url() -> String {
    format!("{}/api/v1/gifts/recent", BASE)
}

pub fn secret_url() -> String {
    format!("{}/api/bot-token", BASE)
}
