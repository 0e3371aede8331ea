//! Key/value store trait abstraction.
//!
//! The vault encrypts values before they reach this seam; implementations
//! only ever see opaque hex/JSON strings. Production storage is a JSON file
//! under the app data directory, tests use an in-memory map.

use async_trait::async_trait;

/// Store operation errors.
#[derive(Debug, Clone)]
pub enum StoreError {
    /// Failed to read from the backing store
    ReadFailed(String),
    /// Failed to write to the backing store
    WriteFailed(String),
    /// IO error
    Io(String),
    /// Serialization/deserialization error
    Serialization(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::ReadFailed(msg) => write!(f, "Failed to read store: {}", msg),
            StoreError::WriteFailed(msg) => write!(f, "Failed to write store: {}", msg),
            StoreError::Io(msg) => write!(f, "IO error: {}", msg),
            StoreError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Trait for persistent key/value storage.
///
/// This trait abstracts local persistence to enable dependency injection
/// and mocking in tests. Values are opaque strings; encryption happens
/// above this layer.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Returns
    /// - `Ok(Some(value))` if the key exists
    /// - `Ok(None)` if the key is absent
    /// - `Err(error)` if reading failed
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any existing value.
    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete the value stored under `key`. Deleting an absent key is not
    /// an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// List all stored keys.
    async fn keys(&self) -> Result<Vec<String>, StoreError>;
}
