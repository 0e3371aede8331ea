//! App-level token authority.
//!
//! Obtains and refreshes the app authentication token by signing a request
//! with the app/device fingerprint, and exposes the current token to the
//! other components. The signing secret is compiled in and therefore
//! extractable from the binary; a server-issued per-install key would close
//! that hole but the backend's wire contract pins this scheme.

use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::{Arc, RwLock};

use crate::error::AuthError;
use crate::traits::{Headers, HttpClient};
use crate::vault::SecretVault;

use super::Credentials;

/// Authentication endpoint path.
const AUTH_ENDPOINT: &str = "/api/auth/app";

/// Vault key for the persisted credential record.
const CREDENTIALS_KEY: &str = "credentials";

/// Vault key for the per-install device id.
const DEVICE_ID_KEY: &str = "device_id";

/// Identity of this app install, sent with every authentication request.
#[derive(Debug, Clone)]
pub struct AppIdentity {
    /// App version string, e.g. "1.2.0"
    pub app_version: String,
    /// Shared signing secret configured at build time
    pub shared_secret: String,
    /// Per-install device identifier
    pub device_id: String,
}

impl AppIdentity {
    /// Compute the app signature: hex(SHA-256("{app_version}:{secret}")).
    pub fn signature(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}:{}", self.app_version, self.shared_secret).as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Load the per-install device id from the vault, assigning and
    /// persisting a fresh UUID on first launch.
    pub async fn load_or_assign_device_id(vault: &SecretVault) -> String {
        if let Some(existing) = vault.get(DEVICE_ID_KEY).await {
            return existing;
        }
        let device_id = uuid::Uuid::new_v4().to_string();
        vault.put(DEVICE_ID_KEY, &device_id).await;
        device_id
    }
}

/// Response from the authentication endpoint (POST /api/auth/app).
#[derive(Debug, Clone, Deserialize)]
struct AuthResponse {
    token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Obtains, caches, and exposes the app-level authentication token.
///
/// Explicitly constructed and shared via `Arc`; holds the only mutable
/// reference to the credential record.
pub struct TokenAuthority {
    http: Arc<dyn HttpClient>,
    vault: Arc<SecretVault>,
    base_url: String,
    identity: AppIdentity,
    current: RwLock<Credentials>,
}

impl TokenAuthority {
    /// Create a new authority. Call [`initialize`](Self::initialize) before
    /// first use to warm the in-memory record from the vault.
    pub fn new(
        http: Arc<dyn HttpClient>,
        vault: Arc<SecretVault>,
        base_url: impl Into<String>,
        identity: AppIdentity,
    ) -> Self {
        Self {
            http,
            vault,
            base_url: base_url.into(),
            identity,
            current: RwLock::new(Credentials::default()),
        }
    }

    /// Load previously persisted credentials into memory.
    pub async fn initialize(&self) {
        if let Some(json) = self.vault.get(CREDENTIALS_KEY).await {
            match serde_json::from_str::<Credentials>(&json) {
                Ok(creds) => {
                    *self.current.write().unwrap() = creds;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Stored credentials unreadable, starting clean");
                }
            }
        }
    }

    /// The identity this authority signs requests with.
    pub fn identity(&self) -> &AppIdentity {
        &self.identity
    }

    /// Return the last successfully obtained or cached token without
    /// triggering network I/O.
    pub fn current_token(&self) -> Option<String> {
        self.current.read().unwrap().app_token.clone()
    }

    /// The signed-in user's identifier, when one has been recorded.
    pub fn user_id(&self) -> Option<String> {
        self.current.read().unwrap().user_id.clone()
    }

    /// Record the signed-in user's identifier alongside the token.
    pub async fn set_user_id(&self, user_id: &str) {
        let creds = {
            let mut current = self.current.write().unwrap();
            current.user_id = Some(user_id.to_string());
            current.clone()
        };
        self.persist(&creds).await;
    }

    /// Obtain an app token.
    ///
    /// On a successful network round trip the fresh token replaces the
    /// cached one. On any failure the cached token is returned silently
    /// (with a warning); the error surfaces only when no cached token
    /// exists either.
    pub async fn authenticate(&self) -> Result<String, AuthError> {
        match self.request_token().await {
            Ok(response) => {
                let expires_at = response
                    .expires_in
                    .map(|secs| chrono::Utc::now().timestamp() + secs as i64);
                let creds = {
                    let mut current = self.current.write().unwrap();
                    current.app_token = Some(response.token.clone());
                    current.expires_at = expires_at;
                    current.clone()
                };
                self.persist(&creds).await;
                tracing::debug!("App token refreshed");
                Ok(response.token)
            }
            Err(err) => {
                if let Some(cached) = self.current_token() {
                    tracing::warn!(
                        code = err.error_code(),
                        error = %err,
                        "Authentication failed, falling back to cached token"
                    );
                    Ok(cached)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Clear the credential record, in memory and in the vault.
    pub async fn logout(&self) {
        *self.current.write().unwrap() = Credentials::default();
        self.vault.remove(CREDENTIALS_KEY).await;
    }

    async fn request_token(&self) -> Result<AuthResponse, AuthError> {
        let url = format!("{}{}", self.base_url, AUTH_ENDPOINT);
        let mut headers = Headers::new();
        headers.insert("app-version".to_string(), self.identity.app_version.clone());
        headers.insert("app-signature".to_string(), self.identity.signature());
        headers.insert("device-id".to_string(), self.identity.device_id.clone());

        let response = self
            .http
            .post(&url, "", &headers)
            .await
            .map_err(|e| AuthError::RequestFailed {
                message: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(AuthError::Rejected {
                status: response.status,
                message: response.text().unwrap_or_default(),
            });
        }

        response.json().map_err(|e| AuthError::InvalidResponse {
            message: e.to_string(),
        })
    }

    async fn persist(&self, creds: &Credentials) {
        match serde_json::to_string(creds) {
            Ok(json) => self.vault.put(CREDENTIALS_KEY, &json).await,
            Err(e) => tracing::warn!(error = %e, "Failed to serialize credentials"),
        }
    }
}
