//! File-backed JSON document store.
//!
//! The durable memory of frontdesk: a flat directory of named JSON
//! documents, loaded and saved whole. Saves are full-file overwrites; a
//! crash between passes loses at most one pass of updates, which the next
//! reconciliation pass re-derives.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

const MAX_DOCUMENT_NAME_LENGTH: usize = 64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid document name: {0}")]
    InvalidName(String),
    #[error("document missing: {0}")]
    Missing(String),
}

/// A key-to-document store over a single data directory. Document `name`
/// maps to `<dir>/<name>.json`.
pub struct DataStore {
    data_dir: PathBuf,
}

impl DataStore {
    pub fn new(data_dir: PathBuf) -> Result<Self, StoreError> {
        if !data_dir.exists() {
            debug!("no data store, creating {}", data_dir.display());
            std::fs::create_dir_all(&data_dir)?;
        }
        let data_dir = std::fs::canonicalize(data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn exists(&self, name: &str) -> bool {
        self.document_path(name)
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T, StoreError> {
        let path = self.document_path(name)?;
        if !path.exists() {
            return Err(StoreError::Missing(name.to_string()));
        }
        let content = std::fs::read_to_string(&path)?;
        let value = serde_json::from_str(&content)?;
        Ok(value)
    }

    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let path = self.document_path(name)?;
        let content = serde_json::to_string(value)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn document_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        Self::validate_name(name)?;
        Ok(self.data_dir.join(format!("{}.json", name)))
    }

    fn validate_name(name: &str) -> Result<(), StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidName(
                "document name cannot be empty".to_string(),
            ));
        }
        if name.len() > MAX_DOCUMENT_NAME_LENGTH {
            return Err(StoreError::InvalidName(format!(
                "document name too long (max {})",
                MAX_DOCUMENT_NAME_LENGTH
            )));
        }
        if !name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'))
        {
            return Err(StoreError::InvalidName(
                "document name contains unsupported characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn store() -> (tempfile::TempDir, DataStore) {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = DataStore::new(temp.path().join("data")).expect("store");
        (temp, store)
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let (_temp, store) = store();
        let mut doc = BTreeMap::new();
        doc.insert("alpha".to_string(), 1u32);
        store.save("member_seen", &doc).unwrap();
        assert!(store.exists("member_seen"));
        let loaded: BTreeMap<String, u32> = store.load("member_seen").unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_missing_document_is_an_error() {
        let (_temp, store) = store();
        let result = store.load::<serde_json::Value>("last_switch");
        assert!(matches!(result, Err(StoreError::Missing(_))));
    }

    #[test]
    fn test_save_overwrites_whole_document() {
        let (_temp, store) = store();
        store.save("doc", &vec![1, 2, 3]).unwrap();
        store.save("doc", &vec![9]).unwrap();
        let loaded: Vec<u32> = store.load("doc").unwrap();
        assert_eq!(loaded, vec![9]);
    }

    #[test]
    fn test_rejects_path_like_names() {
        let (_temp, store) = store();
        assert!(matches!(
            store.save("../escape", &1),
            Err(StoreError::InvalidName(_))
        ));
        assert!(matches!(
            store.load::<u32>("a/b"),
            Err(StoreError::InvalidName(_))
        ));
    }
}
