// Local key-value store
// Persistent client-side state (favorites, usage snapshot) as a JSON file
// under fixed keys, read once on open and written on every change.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Store file name under the platform config directory
pub const STORE_FILENAME: &str = "starguide.json";
/// Favorites chart-id list
pub const KEY_FAVORITES: &str = "favorites";
/// Last known chat usage snapshot
pub const KEY_CHAT_USAGE: &str = "chat_usage";

/// Local store error
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Config directory unavailable")]
    NoConfigDir,

    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Typed JSON-file key-value store
pub struct LocalStore {
    path: PathBuf,
    data: RwLock<HashMap<String, serde_json::Value>>,
}

impl LocalStore {
    /// Open (or create) the store at the default platform location
    pub fn open_default() -> Result<Self, StoreError> {
        let mut dir = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        dir.push("starguide");
        fs::create_dir_all(&dir)?;
        Self::open(dir.join(STORE_FILENAME))
    }

    /// Open (or create) a store at an explicit path
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                log::warn!("[store] corrupt store file, starting fresh: {}", e);
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a typed value; `None` when absent or of the wrong shape
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let data = self.data.read().unwrap_or_else(|e| e.into_inner());
        data.get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Write a typed value and flush to disk
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let serialized = serde_json::to_value(value)?;
        let snapshot = {
            let mut data = self.data.write().unwrap_or_else(|e| e.into_inner());
            data.insert(key.to_string(), serialized);
            data.clone()
        };
        let contents = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_roundtrip_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STORE_FILENAME);

        {
            let store = LocalStore::open(&path).unwrap();
            store
                .set(KEY_FAVORITES, &vec!["chart-1".to_string(), "chart-2".to_string()])
                .unwrap();
        }

        let reopened = LocalStore::open(&path).unwrap();
        let favorites: Vec<String> = reopened.get(KEY_FAVORITES).unwrap();
        assert_eq!(favorites, vec!["chart-1", "chart-2"]);
    }

    #[test]
    fn test_missing_key_is_none() {
        let dir = tempdir().unwrap();
        let store = LocalStore::open(dir.path().join(STORE_FILENAME)).unwrap();
        assert!(store.get::<Vec<String>>(KEY_FAVORITES).is_none());
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STORE_FILENAME);
        fs::write(&path, "not json at all").unwrap();

        let store = LocalStore::open(&path).unwrap();
        assert!(store.get::<Vec<String>>(KEY_FAVORITES).is_none());
        store.set(KEY_FAVORITES, &vec!["c1".to_string()]).unwrap();
    }

    #[test]
    fn test_wrong_shape_is_none() {
        let dir = tempdir().unwrap();
        let store = LocalStore::open(dir.path().join(STORE_FILENAME)).unwrap();
        store.set(KEY_CHAT_USAGE, &42u32).unwrap();
        assert!(store.get::<Vec<String>>(KEY_CHAT_USAGE).is_none());
    }
}
