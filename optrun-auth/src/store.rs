//! Local token store
//!
//! The token record lives in a small key-value store owned by the current
//! process invocation. The file-backed implementation keeps one TOML table
//! per resource server under the user's home directory; the in-memory
//! implementation backs tests.

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

/// Table name for tokens scoped to the optrun service
pub const RESOURCE_SERVER: &str = "optrun_service";

/// Store key for the refresh token
pub const REFRESH_TOKEN_OPT: &str = "refresh_token";
/// Store key for the cached access token
pub const ACCESS_TOKEN_OPT: &str = "access_token";
/// Store key for the access token expiry (unix seconds)
pub const ACCESS_TOKEN_EXPIRES_OPT: &str = "access_token_expires_at";

/// Errors from the local token store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access the credential store: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential store is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize the credential store: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("could not determine home directory")]
    NoHomeDir,
}

/// Key-value persistence for token records
///
/// Injected into the credential manager so tests can substitute an in-memory
/// store for the file-backed one.
pub trait TokenStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn delete(&mut self, key: &str) -> Result<Option<String>, StoreError>;
}

/// File-backed token store
///
/// Persists one TOML table per resource server, e.g.
///
/// ```toml
/// [optrun_service]
/// refresh_token = "..."
/// access_token = "..."
/// access_token_expires_at = "1767225600"
/// ```
pub struct FileTokenStore {
    path: PathBuf,
    namespace: String,
}

impl FileTokenStore {
    /// Creates a store backed by the given file and resource-server table
    pub fn new(path: PathBuf, namespace: impl Into<String>) -> Self {
        Self {
            path,
            namespace: namespace.into(),
        }
    }

    /// Opens the default store at `~/.optrun/credentials.toml`
    pub fn open_default() -> Result<Self, StoreError> {
        let home = dirs::home_dir().ok_or(StoreError::NoHomeDir)?;
        let path = home.join(".optrun").join("credentials.toml");
        Ok(Self::new(path, RESOURCE_SERVER))
    }

    fn read_root(&self) -> Result<toml::Value, StoreError> {
        if !self.path.exists() {
            return Ok(toml::Value::Table(toml::map::Map::new()));
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&contents)?)
    }

    fn write_root(&self, root: &toml::Value) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml::to_string(root)?)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let root = self.read_root()?;
        Ok(root
            .get(&self.namespace)
            .and_then(|table| table.get(key))
            .and_then(|value| value.as_str())
            .map(str::to_string))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut root = self.read_root()?;
        if let Some(tables) = root.as_table_mut() {
            if !tables.contains_key(&self.namespace) {
                tables.insert(
                    self.namespace.clone(),
                    toml::Value::Table(toml::map::Map::new()),
                );
            }
            if let Some(table) = tables
                .get_mut(&self.namespace)
                .and_then(|entry| entry.as_table_mut())
            {
                table.insert(key.to_string(), toml::Value::String(value.to_string()));
            }
        }
        self.write_root(&root)
    }

    fn delete(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        let mut root = self.read_root()?;
        let removed = root
            .get_mut(&self.namespace)
            .and_then(|table| table.as_table_mut())
            .and_then(|table| table.remove(key))
            .and_then(|value| value.as_str().map(str::to_string));
        if removed.is_some() {
            self.write_root(&root)?;
        }
        Ok(removed)
    }
}

/// In-memory token store for tests
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: HashMap<String, String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store preloaded with entries
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.remove(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        let mut store = FileTokenStore::new(path.clone(), RESOURCE_SERVER);

        assert_eq!(store.get(REFRESH_TOKEN_OPT).unwrap(), None);

        store.set(REFRESH_TOKEN_OPT, "rt-1").unwrap();
        store.set(ACCESS_TOKEN_OPT, "at-1").unwrap();
        assert_eq!(
            store.get(REFRESH_TOKEN_OPT).unwrap(),
            Some("rt-1".to_string())
        );

        // A fresh handle sees the persisted state
        let reopened = FileTokenStore::new(path, RESOURCE_SERVER);
        assert_eq!(
            reopened.get(ACCESS_TOKEN_OPT).unwrap(),
            Some("at-1".to_string())
        );
    }

    #[test]
    fn test_file_store_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileTokenStore::new(dir.path().join("credentials.toml"), RESOURCE_SERVER);

        store.set(ACCESS_TOKEN_OPT, "at-1").unwrap();
        assert_eq!(
            store.delete(ACCESS_TOKEN_OPT).unwrap(),
            Some("at-1".to_string())
        );
        assert_eq!(store.delete(ACCESS_TOKEN_OPT).unwrap(), None);
        assert_eq!(store.get(ACCESS_TOKEN_OPT).unwrap(), None);
    }

    #[test]
    fn test_file_store_namespaces_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        let mut first = FileTokenStore::new(path.clone(), "optrun_service");
        let mut second = FileTokenStore::new(path, "other_service");

        first.set(REFRESH_TOKEN_OPT, "rt-first").unwrap();
        second.set(REFRESH_TOKEN_OPT, "rt-second").unwrap();

        assert_eq!(
            first.get(REFRESH_TOKEN_OPT).unwrap(),
            Some("rt-first".to_string())
        );
        assert_eq!(
            second.get(REFRESH_TOKEN_OPT).unwrap(),
            Some("rt-second".to_string())
        );
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryTokenStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        assert_eq!(store.delete("k").unwrap(), Some("v".to_string()));
        assert_eq!(store.get("k").unwrap(), None);
    }
}
