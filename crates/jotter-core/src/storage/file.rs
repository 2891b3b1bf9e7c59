//! JSON-file backed `LocalStore`.
//!
//! The whole store is a single JSON object of string values. Writes go to a
//! sibling temp file first and are renamed into place.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use super::LocalStore;
use crate::error::{Error, Result};

const STORE_FILE_NAME: &str = "local-storage.json";

#[derive(Debug)]
pub struct FileLocalStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileLocalStore {
    /// Store backed by `local-storage.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::at_path(dir.as_ref().join(STORE_FILE_NAME))
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new())
            }
            Err(error) => return Err(error.into()),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|error| {
            Error::Storage(format!(
                "failed to parse local storage at {}: {error}",
                self.path.display()
            ))
        })
    }

    async fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let serialized = serde_json::to_string_pretty(values)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, serialized).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

impl LocalStore for FileLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut values = self.read_all().await?;
        if values.remove(key).is_some() {
            self.write_all(&values).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_persist_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileLocalStore::in_dir(dir.path().join("nested"));
        store.set("NotesBackups", "[]").await.unwrap();
        store.set("envVariables", "[\"APIKEY: \\\"k\\\"\"]").await.unwrap();

        let reopened = FileLocalStore::in_dir(dir.path().join("nested"));
        assert_eq!(
            reopened.get("NotesBackups").await.unwrap().as_deref(),
            Some("[]")
        );
        reopened.remove("NotesBackups").await.unwrap();
        assert_eq!(reopened.get("NotesBackups").await.unwrap(), None);
        assert!(reopened.get("envVariables").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::in_dir(dir.path());
        assert_eq!(store.get("anything").await.unwrap(), None);
        store.remove("anything").await.unwrap();
    }

    #[tokio::test]
    async fn corrupted_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::in_dir(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();

        let error = store.get("k").await.unwrap_err();
        assert!(matches!(error, Error::Storage(_)));
    }
}
