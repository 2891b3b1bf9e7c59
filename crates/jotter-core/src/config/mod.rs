//! Client runtime configuration.
//!
//! Credentials are not stored here; they live in the saved environment
//! profiles. This file only tunes how the client talks to the backend.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::remote::{IMAGES_COLLECTION, NOTES_COLLECTION};
use crate::repository::DEFAULT_REMOTE_TIMEOUT;
use crate::util::normalize_text_option;
use crate::view::DEFAULT_CATEGORY_PAGE_SIZE;

/// Overrides `remote_timeout_secs`.
pub const REMOTE_TIMEOUT_ENV: &str = "JOTTER_REMOTE_TIMEOUT_SECS";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub remote_timeout_secs: u64,
    pub notes_collection: String,
    pub images_collection: String,
    pub category_page_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            remote_timeout_secs: DEFAULT_REMOTE_TIMEOUT.as_secs(),
            notes_collection: NOTES_COLLECTION.to_string(),
            images_collection: IMAGES_COLLECTION.to_string(),
            category_page_size: DEFAULT_CATEGORY_PAGE_SIZE,
        }
    }
}

impl ClientConfig {
    /// `<config dir>/jotter/config.json`.
    pub fn default_path(config_dir: &Path) -> PathBuf {
        config_dir.join("jotter").join(CONFIG_FILE_NAME)
    }

    /// Read the config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let config = match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str::<Self>(&raw).map_err(|error| {
                Error::InvalidInput(format!("invalid config {}: {error}", path.display()))
            })?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(error) => return Err(error.into()),
        };
        config.with_env_overrides().validated()
    }

    /// Apply `JOTTER_REMOTE_TIMEOUT_SECS` when it is set to a number.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        let raw = normalize_text_option(std::env::var(REMOTE_TIMEOUT_ENV).ok());
        if let Some(raw) = raw {
            match raw.parse::<u64>() {
                Ok(secs) => self.remote_timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring non-numeric {REMOTE_TIMEOUT_ENV}={raw}"),
            }
        }
        self
    }

    fn validated(self) -> Result<Self> {
        if self.remote_timeout_secs == 0 {
            return Err(Error::InvalidInput(
                "remote_timeout_secs must be at least 1".into(),
            ));
        }
        if self.notes_collection.trim().is_empty() || self.images_collection.trim().is_empty() {
            return Err(Error::InvalidInput("collection names must not be empty".into()));
        }
        if self.category_page_size == 0 {
            return Err(Error::InvalidInput(
                "category_page_size must be at least 1".into(),
            ));
        }
        Ok(self)
    }

    pub const fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.notes_collection, "Notes");
        assert_eq!(config.category_page_size, 5);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"notes_collection":"Scratch"}"#).unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.notes_collection, "Scratch");
        assert_eq!(config.images_collection, "Images");
    }

    #[test]
    fn unknown_fields_and_zero_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        std::fs::write(&path, r#"{"colour":"blue"}"#).unwrap();
        assert!(matches!(ClientConfig::load(&path), Err(Error::InvalidInput(_))));

        std::fs::write(&path, r#"{"category_page_size":0}"#).unwrap();
        assert!(matches!(ClientConfig::load(&path), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn default_path_is_namespaced() {
        assert_eq!(
            ClientConfig::default_path(Path::new("/etc")),
            PathBuf::from("/etc/jotter/config.json")
        );
    }
}
