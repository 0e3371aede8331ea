//! Short-lived channel-access secret broker.
//!
//! Fetches the encrypted channel-access token on demand, decrypts it
//! locally, and caches the plaintext until the server-declared expiry. The
//! wire obfuscation (XOR against the repeated SHA-256 digest of the user
//! id) is fixed by the backend and reversible by anyone holding the user
//! id; it protects against casual inspection only.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

use crate::auth::TokenAuthority;
use crate::error::SecretError;
use crate::traits::{Headers, HttpClient, HttpError, Response};

/// Secret endpoint path.
const SECRET_ENDPOINT: &str = "/api/bot-token";

/// Cache lifetime when the server omits `expires_in`. Finite on purpose:
/// the secret must never outlive the server's intent.
const DEFAULT_TTL_SECS: u64 = 3600;

/// Response from the secret endpoint (GET /api/bot-token).
#[derive(Debug, Clone, Deserialize)]
struct SecretResponse {
    token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedSecret {
    value: String,
    expires_at: Instant,
}

/// Fetches and caches the channel-access secret.
pub struct SecretBroker {
    http: Arc<dyn HttpClient>,
    authority: Arc<TokenAuthority>,
    base_url: String,
    cache: Arc<Mutex<Option<CachedSecret>>>,
    expiry_task: Mutex<Option<JoinHandle<()>>>,
}

impl SecretBroker {
    pub fn new(
        http: Arc<dyn HttpClient>,
        authority: Arc<TokenAuthority>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            authority,
            base_url: base_url.into(),
            cache: Arc::new(Mutex::new(None)),
            expiry_task: Mutex::new(None),
        }
    }

    /// Get the channel-access secret for `user_id`.
    ///
    /// Serves the in-memory cache while unexpired; otherwise fetches,
    /// decrypts, caches, and arms a one-shot expiry timer for the
    /// server-declared `expires_in`. On HTTP 401 the authority
    /// re-authenticates once and the fetch is retried exactly once.
    pub async fn get_secret(&self, user_id: &str) -> Result<String, SecretError> {
        if let Some(value) = self.cached_value() {
            return Ok(value);
        }

        let token = match self.authority.current_token() {
            Some(token) => token,
            None => self
                .authority
                .authenticate()
                .await
                .map_err(SecretError::Unavailable)?,
        };

        let response = self.fetch(&token, user_id).await?;
        let response = if response.status == 401 {
            let fresh = self
                .authority
                .authenticate()
                .await
                .map_err(SecretError::Unavailable)?;
            self.fetch(&fresh, user_id).await?
        } else {
            response
        };

        if !response.is_success() {
            return Err(SecretError::Fetch(HttpError::ServerError {
                status: response.status,
                message: response.text().unwrap_or_default(),
            }));
        }

        let parsed: SecretResponse =
            response.json().map_err(|e| SecretError::InvalidResponse {
                message: e.to_string(),
            })?;

        let plaintext = decrypt_wire(&parsed.token, user_id).ok_or(SecretError::Decrypt)?;

        let ttl = Duration::from_secs(parsed.expires_in.unwrap_or(DEFAULT_TTL_SECS));
        self.install(plaintext.clone(), ttl);
        tracing::debug!(ttl_secs = ttl.as_secs(), "Channel-access secret cached");
        Ok(plaintext)
    }

    /// Drop the cached secret immediately.
    pub fn invalidate(&self) {
        *self.cache.lock().unwrap() = None;
        if let Some(task) = self.expiry_task.lock().unwrap().take() {
            task.abort();
        }
    }

    fn cached_value(&self) -> Option<String> {
        let cache = self.cache.lock().unwrap();
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// Cache the plaintext and arm a one-shot timer that clears the cache
    /// entry only; persisted vault state is untouched.
    fn install(&self, value: String, ttl: Duration) {
        *self.cache.lock().unwrap() = Some(CachedSecret {
            value,
            expires_at: Instant::now() + ttl,
        });

        let cache = Arc::clone(&self.cache);
        let task = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            *cache.lock().unwrap() = None;
            tracing::debug!("Channel-access secret expired");
        });

        if let Some(previous) = self.expiry_task.lock().unwrap().replace(task) {
            previous.abort();
        }
    }

    async fn fetch(&self, token: &str, user_id: &str) -> Result<Response, SecretError> {
        let url = format!("{}{}", self.base_url, SECRET_ENDPOINT);
        let mut headers = Headers::new();
        headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        headers.insert("user-id".to_string(), user_id.to_string());
        self.http
            .get(&url, &headers)
            .await
            .map_err(SecretError::Fetch)
    }
}

impl Drop for SecretBroker {
    fn drop(&mut self) {
        if let Some(task) = self.expiry_task.lock().unwrap().take() {
            task.abort();
        }
    }
}

/// Reverse the backend's wire obfuscation.
///
/// The server XORs each character's code point against the repeated
/// SHA-256 digest of the user id, UTF-8-encodes the result, and base64s
/// it. Any decode failure returns `None`.
pub fn decrypt_wire(ciphertext_b64: &str, user_id: &str) -> Option<String> {
    let bytes = BASE64.decode(ciphertext_b64).ok()?;
    let obfuscated = String::from_utf8(bytes).ok()?;
    let key = Sha256::digest(user_id.as_bytes());

    obfuscated
        .chars()
        .enumerate()
        .map(|(i, c)| char::from_u32((c as u32) ^ (key[i % key.len()] as u32)))
        .collect()
}

/// Apply the backend's wire obfuscation. Test helper mirroring the server.
pub fn encrypt_wire(plaintext: &str, user_id: &str) -> String {
    let key = Sha256::digest(user_id.as_bytes());
    let obfuscated: String = plaintext
        .chars()
        .enumerate()
        .filter_map(|(i, c)| char::from_u32((c as u32) ^ (key[i % key.len()] as u32)))
        .collect();
    BASE64.encode(obfuscated.as_bytes())
}
