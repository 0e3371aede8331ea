//! File-backed key/value store.
//!
//! Persists the store as a single pretty-printed JSON object at
//! `~/.giftwatch/store.json`, creating the directory on first write.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::traits::{KeyValueStore, StoreError};

/// The data directory name.
const STORE_DIR: &str = ".giftwatch";

/// The store file name.
const STORE_FILE: &str = "store.json";

/// JSON-file implementation of [`KeyValueStore`].
///
/// All operations serialize through a single lock so concurrent writers
/// cannot interleave partial file contents.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Create a FileStore at the default location under the home directory.
    ///
    /// Returns `None` if the home directory cannot be determined.
    pub fn new() -> Option<Self> {
        let home = dirs::home_dir()?;
        Some(Self::at_path(home.join(STORE_DIR).join(STORE_FILE)))
    }

    /// Create a FileStore at an explicit path.
    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Path to the backing file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn load_map(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| StoreError::Io(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn save_map(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }
        let json = serde_json::to_string_pretty(map)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| StoreError::WriteFailed(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load_map()?.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load_map()?;
        map.insert(key.to_string(), value.to_string());
        self.save_map(&map)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load_map()?;
        if map.remove(key).is_some() {
            self.save_map(&map)?;
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load_map()?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store(dir: &TempDir) -> FileStore {
        FileStore::at_path(dir.path().join(STORE_DIR).join(STORE_FILE))
    }

    #[tokio::test]
    async fn test_read_missing_file_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        assert_eq!(store.read("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.write("k1", "v1").await.unwrap();
        assert_eq!(store.read("k1").await.unwrap(), Some("v1".to_string()));
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.write("k", "old").await.unwrap();
        store.write("k", "new").await.unwrap();
        assert_eq!(store.read("k").await.unwrap(), Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.write("k", "v").await.unwrap();
        store.delete("k").await.unwrap();
        assert_eq!(store.read("k").await.unwrap(), None);
        // Deleting again is not an error
        store.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_keys() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.write("b", "2").await.unwrap();
        store.write("a", "1").await.unwrap();
        let keys = store.keys().await.unwrap();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STORE_DIR).join(STORE_FILE);
        {
            let store = FileStore::at_path(path.clone());
            store.write("k", "v").await.unwrap();
        }
        let store = FileStore::at_path(path);
        assert_eq!(store.read("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STORE_DIR).join(STORE_FILE);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();
        let store = FileStore::at_path(path);
        assert!(store.read("k").await.is_err());
    }
}
