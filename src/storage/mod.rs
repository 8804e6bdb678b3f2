//! JsonStore - persistent key-value storage
//!
//! ## Responsibilities
//!
//! - One JSON document per key under the storage directory
//! - Load-on-start, save-on-write
//! - Atomic replace (unique temp file + rename)
//!
//! Callers treat persistence as best-effort: a failed save is logged and the
//! in-memory state stays authoritative.

use crate::error::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Storage keys
pub mod keys {
    pub const PRESETS: &str = "imou_control.presets";
    pub const USAGE: &str = "imou_control.usage";
}

/// File-backed JSON store
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load a document; a missing file is `None`
    pub async fn load(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => {
                let value = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Replace a document
    pub async fn save(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).await?;

        let bytes = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &path).await?;

        tracing::debug!(key = %key, path = %path.display(), bytes = bytes.len(), "Store saved");
        Ok(())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
            || key.starts_with('.')
        {
            return Err(Error::Validation(format!("Invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_key_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        assert!(store.load(keys::PRESETS).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("nested"));
        let doc = json!({"dev1": {"door": {"h": 0.1, "v": 0.2, "z": 0.0}}});
        store.save(keys::PRESETS, &doc).await.unwrap();
        assert_eq!(store.load(keys::PRESETS).await.unwrap(), Some(doc));

        store.save(keys::PRESETS, &json!({})).await.unwrap();
        assert_eq!(store.load(keys::PRESETS).await.unwrap(), Some(json!({})));
    }

    #[tokio::test]
    async fn test_corrupt_document_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("imou_control.usage.json"), b"{not json").unwrap();
        let store = JsonStore::new(dir.path());
        assert!(matches!(
            store.load(keys::USAGE).await.unwrap_err(),
            Error::Serialization(_)
        ));
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let store = JsonStore::new("/tmp/unused");
        assert!(store.load("../etc/passwd").await.is_err());
        assert!(store.load("").await.is_err());
        assert!(store.load(".hidden").await.is_err());
    }
}
