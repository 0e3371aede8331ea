//! Encrypted key/value persistence for credentials and cached blobs.
//!
//! The vault sits between the components that own secrets (token authority,
//! config synchronizer, dedup engine, preferences) and a plain
//! [`KeyValueStore`]. Values are sealed with AES-256-GCM under a key derived
//! from a master key and salt pair that is provisioned lazily on first use.
//!
//! Error taxonomy: storage and decrypt failures collapse to "absent" on
//! read and a logged warning on write, so callers stay resilient to
//! corruption without special-casing.

mod cipher;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::traits::KeyValueStore;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;

type HmacSha256 = Hmac<Sha256>;

/// Reserved store key for the master key.
const MASTER_KEY: &str = "vault.master_key";

/// Reserved store key for the salt.
const SALT_KEY: &str = "vault.salt";

/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// Encrypted key/value vault.
///
/// Construct one per process and share it via `Arc`; the encryption key is
/// provisioned exactly once even under concurrent first access.
pub struct SecretVault {
    store: Arc<dyn KeyValueStore>,
    derived_key: OnceCell<[u8; 32]>,
}

impl SecretVault {
    /// Create a vault over the given backing store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            derived_key: OnceCell::new(),
        }
    }

    /// Store `plaintext` under `key`, encrypted.
    ///
    /// Storage failures are logged, not raised; the value is simply absent
    /// on the next read.
    pub async fn put(&self, key: &str, plaintext: &str) {
        let Some(derived) = self.encryption_key().await else {
            tracing::warn!(key, "Vault put dropped: no encryption key available");
            return;
        };
        let Some(sealed) = cipher::seal(&derived, plaintext) else {
            tracing::warn!(key, "Vault put dropped: encryption failed");
            return;
        };
        if let Err(e) = self.store.write(key, &sealed).await {
            tracing::warn!(key, error = %e, "Vault put failed");
        }
    }

    /// Read and decrypt the value under `key`.
    ///
    /// Returns `None` when the key is absent or the stored bytes fail to
    /// decrypt (corruption or tamper).
    pub async fn get(&self, key: &str) -> Option<String> {
        let derived = self.encryption_key().await?;
        let stored = self.store.read(key).await.ok()??;
        match cipher::open(&derived, &stored) {
            Some(value) => Some(value),
            None => {
                tracing::warn!(key, "Vault value failed to decrypt, treating as absent");
                None
            }
        }
    }

    /// Remove the value under `key`.
    pub async fn remove(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            tracing::warn!(key, error = %e, "Vault remove failed");
        }
    }

    /// Remove every stored value.
    ///
    /// The master key and salt survive so values written afterwards remain
    /// decryptable by this install.
    pub async fn clear_all(&self) {
        let keys = match self.store.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(error = %e, "Vault clear_all could not list keys");
                return;
            }
        };
        for key in keys {
            if key == MASTER_KEY || key == SALT_KEY {
                continue;
            }
            if let Err(e) = self.store.delete(&key).await {
                tracing::warn!(key, error = %e, "Vault clear_all failed to delete");
            }
        }
    }

    /// Get the derived encryption key, provisioning the master key and salt
    /// on first use. Single-flight: concurrent first callers share one
    /// provisioning attempt. A failed attempt is not cached, so a later
    /// call retries once the store recovers.
    async fn encryption_key(&self) -> Option<[u8; 32]> {
        self.derived_key
            .get_or_try_init(|| async { self.load_or_provision().await.ok_or(()) })
            .await
            .ok()
            .copied()
    }

    async fn load_or_provision(&self) -> Option<[u8; 32]> {
        let master = match self.store.read(MASTER_KEY).await {
            Ok(Some(hex_key)) => hex::decode(hex_key).ok()?,
            Ok(None) => {
                let mut key = [0u8; 32];
                OsRng.fill_bytes(&mut key);
                if let Err(e) = self.store.write(MASTER_KEY, &hex::encode(key)).await {
                    tracing::warn!(error = %e, "Failed to persist vault master key");
                    return None;
                }
                key.to_vec()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read vault master key");
                return None;
            }
        };

        let salt = match self.store.read(SALT_KEY).await {
            Ok(Some(hex_salt)) => hex::decode(hex_salt).ok()?,
            Ok(None) => {
                let mut salt = [0u8; SALT_LEN];
                OsRng.fill_bytes(&mut salt);
                if let Err(e) = self.store.write(SALT_KEY, &hex::encode(salt)).await {
                    tracing::warn!(error = %e, "Failed to persist vault salt");
                    return None;
                }
                salt.to_vec()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read vault salt");
                return None;
            }
        };

        let mut mac = HmacSha256::new_from_slice(&salt).ok()?;
        mac.update(&master);
        let derived = mac.finalize().into_bytes();

        let mut key = [0u8; 32];
        key.copy_from_slice(&derived);
        Some(key)
    }
}
