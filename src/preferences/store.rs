//! Key-value storage for client-local preferences
//!
//! The preference types only see `KeyValueStore`, so the medium can be a
//! JSON file, memory, or anything else that maps string keys to strings.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::domain::{DomainError, DomainResult};

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> DomainResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> DomainResult<()>;
    fn remove(&self, key: &str) -> DomainResult<()>;
}

fn poisoned() -> DomainError {
    DomainError::Internal("Preference store lock poisoned".to_string())
}

/// Process-local store; nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> DomainResult<Option<String>> {
        Ok(self.values.lock().map_err(|_| poisoned())?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> DomainResult<()> {
        self.values
            .lock()
            .map_err(|_| poisoned())?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> DomainResult<()> {
        self.values.lock().map_err(|_| poisoned())?.remove(key);
        Ok(())
    }
}

/// All keys in one JSON object file, rewritten on every change
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the file, starting empty when it is missing or unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring malformed preferences file");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> DomainResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| DomainError::Internal(e.to_string()))?;
            }
        }
        let text = serde_json::to_string_pretty(values).map_err(|e| DomainError::Internal(e.to_string()))?;
        // Never leave a half-written file in place
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(|e| DomainError::Internal(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| DomainError::Internal(e.to_string()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> DomainResult<Option<String>> {
        Ok(self.values.lock().map_err(|_| poisoned())?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> DomainResult<()> {
        let mut values = self.values.lock().map_err(|_| poisoned())?;
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> DomainResult<()> {
        let mut values = self.values.lock().map_err(|_| poisoned())?;
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs").join("preferences.json");

        let store = JsonFileStore::open(&path);
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.remove("b").unwrap();

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get("a").unwrap(), Some("1".to_string()));
        assert_eq!(reopened.get("b").unwrap(), None);
    }

    #[test]
    fn test_malformed_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::open(&path);
        assert_eq!(store.get("menu-editor-sort-mode").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(JsonFileStore::open(&path).get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
