//! Local durable key-value storage.
//!
//! Everything the client persists locally (note backups, the overflow buffer,
//! saved environment profiles, pending extension notes) goes through the
//! [`LocalStore`] collaborator so callers can inject a test double.

mod backup;
mod file;
mod memory;

use std::sync::Arc;

use crate::error::Result;

pub use backup::{BackupCache, NOTES_BACKUP_KEY, OVERFLOW_KEY};
pub use file::FileLocalStore;
pub use memory::MemoryLocalStore;

/// String key-value storage that survives across sessions.
#[allow(async_fn_in_trait)]
pub trait LocalStore {
    /// Read a value; `None` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

impl<T: LocalStore> LocalStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.as_ref().get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.as_ref().set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.as_ref().remove(key).await
    }
}
