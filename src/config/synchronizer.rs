//! Configuration synchronizer.
//!
//! Fetches the signed configuration document, verifies its signature,
//! caches it with a validity window, and falls back to the last-known-good
//! cache on any failure. Accessors serve hard-coded defaults until a
//! document has ever loaded, so the app is operable fully offline on first
//! launch.

use serde_json::Value;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::auth::TokenAuthority;
use crate::error::ConfigError;
use crate::traits::{Headers, HttpClient, HttpError, Response};
use crate::vault::SecretVault;

use super::document::{verify_signature, ConfigDocument};
use super::version::is_older_than;

/// Config endpoint path.
const CONFIG_ENDPOINT: &str = "/api/config";

/// Vault key for the cached raw document.
const DOCUMENT_KEY: &str = "config.document";

/// Vault key for the cache timestamp.
const FETCHED_AT_KEY: &str = "config.fetched_at";

/// Cache validity window in seconds.
const CACHE_VALIDITY_SECS: i64 = 30 * 60;

/// Synchronizer lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No document has been loaded yet.
    Uninitialized,
    /// Serving a cached document younger than the validity window.
    Cached,
    /// Serving a document fetched and verified this process lifetime.
    Fresh,
}

/// Result of a refresh attempt that did not replace the document.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// A fresh, verified document was installed.
    Fresh,
    /// The fetch failed but a cached document stays authoritative.
    CacheRetained { reason: ConfigError },
}

struct CachedDocument {
    doc: ConfigDocument,
    fetched_at: i64,
}

/// Fetches, verifies, and caches the remote configuration document.
pub struct ConfigSynchronizer {
    http: Arc<dyn HttpClient>,
    vault: Arc<SecretVault>,
    authority: Arc<TokenAuthority>,
    base_url: String,
    state: RwLock<SyncState>,
    current: RwLock<Option<CachedDocument>>,
}

impl ConfigSynchronizer {
    pub fn new(
        http: Arc<dyn HttpClient>,
        vault: Arc<SecretVault>,
        authority: Arc<TokenAuthority>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            vault,
            authority,
            base_url: base_url.into(),
            state: RwLock::new(SyncState::Uninitialized),
            current: RwLock::new(None),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SyncState {
        *self.state.read().unwrap()
    }

    /// Load the cached document from the vault.
    ///
    /// A cache younger than the validity window moves the state to
    /// `Cached`. A stale cache is still loaded as a last resort for when
    /// the first refresh fails, but the state stays `Uninitialized`.
    pub async fn initialize(&self) {
        let Some(raw_text) = self.vault.get(DOCUMENT_KEY).await else {
            return;
        };
        let fetched_at = match self.vault.get(FETCHED_AT_KEY).await {
            Some(ts) => ts.parse::<i64>().unwrap_or(0),
            None => 0,
        };

        let raw: Value = match serde_json::from_str(&raw_text) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Cached config unreadable, ignoring");
                return;
            }
        };
        if !verify_signature(&raw, &self.authority.identity().shared_secret) {
            tracing::warn!("Cached config failed signature verification, ignoring");
            return;
        }
        let doc: ConfigDocument = match serde_json::from_value(raw) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = %e, "Cached config failed to parse, ignoring");
                return;
            }
        };

        let age = chrono::Utc::now().timestamp() - fetched_at;
        *self.current.write().unwrap() = Some(CachedDocument { doc, fetched_at });
        if age < CACHE_VALIDITY_SECS {
            *self.state.write().unwrap() = SyncState::Cached;
            tracing::debug!(age_secs = age, "Loaded cached config");
        } else {
            tracing::debug!(age_secs = age, "Loaded stale config as last resort");
        }
    }

    /// Fetch a fresh document from the backend.
    ///
    /// On HTTP 401 the authority re-authenticates once and the fetch is
    /// retried exactly once. Transport failures keep the current state; the
    /// cached document stays authoritative. `InvalidSignature` is always an
    /// error and never replaces the cache.
    pub async fn refresh(&self) -> Result<RefreshOutcome, ConfigError> {
        let token = match self.authority.current_token() {
            Some(token) => token,
            None => match self.authority.authenticate().await {
                Ok(token) => token,
                Err(e) => return self.fetch_failed(ConfigError::Auth(e)),
            },
        };

        let response = match self.fetch(&token).await {
            Ok(response) => response,
            Err(e) => return self.fetch_failed(ConfigError::Fetch(e)),
        };

        // Single re-authentication, single retry, no further recursion
        let response = if response.status == 401 {
            let fresh = match self.authority.authenticate().await {
                Ok(token) => token,
                Err(e) => return self.fetch_failed(ConfigError::Auth(e)),
            };
            match self.fetch(&fresh).await {
                Ok(response) => response,
                Err(e) => return self.fetch_failed(ConfigError::Fetch(e)),
            }
        } else {
            response
        };

        if !response.is_success() {
            return self.fetch_failed(ConfigError::Fetch(HttpError::ServerError {
                status: response.status,
                message: response.text().unwrap_or_default(),
            }));
        }

        let raw: Value = match response.json() {
            Ok(raw) => raw,
            Err(e) => {
                return self.fetch_failed(ConfigError::InvalidResponse {
                    message: e.to_string(),
                })
            }
        };

        if !verify_signature(&raw, &self.authority.identity().shared_secret) {
            tracing::warn!(
                code = ConfigError::InvalidSignature.error_code(),
                "Config signature mismatch, possible tampering; keeping previous document"
            );
            return Err(ConfigError::InvalidSignature);
        }

        let doc: ConfigDocument = match serde_json::from_value(raw.clone()) {
            Ok(doc) => doc,
            Err(e) => {
                return self.fetch_failed(ConfigError::InvalidResponse {
                    message: e.to_string(),
                })
            }
        };

        let fetched_at = chrono::Utc::now().timestamp();
        self.vault
            .put(DOCUMENT_KEY, &raw.to_string())
            .await;
        self.vault
            .put(FETCHED_AT_KEY, &fetched_at.to_string())
            .await;
        *self.current.write().unwrap() = Some(CachedDocument { doc, fetched_at });
        *self.state.write().unwrap() = SyncState::Fresh;
        tracing::debug!("Config refreshed");
        Ok(RefreshOutcome::Fresh)
    }

    async fn fetch(&self, token: &str) -> Result<Response, HttpError> {
        let url = format!("{}{}", self.base_url, CONFIG_ENDPOINT);
        let mut headers = Headers::new();
        headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        headers.insert(
            "X-App-Version".to_string(),
            self.authority.identity().app_version.clone(),
        );
        self.http.get(&url, &headers).await
    }

    /// A fetch attempt failed. With a cached document the fetch is
    /// best-effort; without one the failure is terminal for this attempt.
    fn fetch_failed(&self, reason: ConfigError) -> Result<RefreshOutcome, ConfigError> {
        if self.current.read().unwrap().is_some() {
            tracing::warn!(
                code = reason.error_code(),
                error = %reason,
                "Config refresh failed, cached document stays authoritative"
            );
            Ok(RefreshOutcome::CacheRetained { reason })
        } else {
            tracing::warn!(code = reason.error_code(), error = %reason, "Config refresh failed with no cache");
            match reason {
                ConfigError::Auth(e) => Err(ConfigError::Auth(e)),
                _ => Err(ConfigError::NoConfigAvailable),
            }
        }
    }

    fn with_document<T>(&self, read: impl FnOnce(&ConfigDocument) -> T) -> T {
        let current = self.current.read().unwrap();
        match current.as_ref() {
            Some(cached) => read(&cached.doc),
            None => read(&ConfigDocument::default()),
        }
    }

    /// Channels to monitor for gifts.
    pub fn monitoring_channels(&self) -> Vec<String> {
        self.with_document(|doc| doc.monitoring_channels.clone())
    }

    /// Channel the user must be subscribed to.
    pub fn required_channel(&self) -> Option<String> {
        self.with_document(|doc| doc.required_channel.clone())
    }

    /// Whether polling should continue under a background facility.
    pub fn is_background_monitoring_enabled(&self) -> bool {
        self.with_document(|doc| doc.features.background_monitoring)
    }

    /// Upper bound for the user's minimum-price filter.
    pub fn max_price_filter(&self) -> u64 {
        self.with_document(|doc| doc.features.max_price_filter.unwrap_or(100_000))
    }

    /// Minimum app version accepted by the backend.
    pub fn min_app_version(&self) -> String {
        self.with_document(|doc| doc.security.min_app_version.clone())
    }

    /// Whether this install must update before continuing.
    pub fn is_update_required(&self) -> bool {
        self.with_document(|doc| {
            doc.security.force_update
                || is_older_than(
                    &self.authority.identity().app_version,
                    &doc.security.min_app_version,
                )
        })
    }

    /// Polling period requested by the backend.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.with_document(|doc| doc.min_update_interval.unwrap_or(30)))
    }
}
