//! Local mirror of the note list, read back when the remote fetch fails.

use super::LocalStore;
use crate::error::Result;
use crate::models::Note;

/// Key holding the serialized note list backup.
pub const NOTES_BACKUP_KEY: &str = "NotesBackups";
/// Key holding notes whose remote write failed.
pub const OVERFLOW_KEY: &str = "NotesOverflow";

#[derive(Debug, Clone)]
pub struct BackupCache<S> {
    store: S,
}

impl<S: LocalStore> BackupCache<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Mirror the given list into local storage.
    pub async fn save(&self, notes: &[Note]) -> Result<()> {
        let serialized = serde_json::to_string(notes)?;
        self.store.set(NOTES_BACKUP_KEY, &serialized).await?;
        tracing::debug!(count = notes.len(), "note backup saved");
        Ok(())
    }

    /// Strict read: `None` when no backup was ever written.
    pub async fn load(&self) -> Result<Option<Vec<Note>>> {
        self.load_key(NOTES_BACKUP_KEY).await
    }

    /// Lenient read used by the offline fallback.
    ///
    /// A missing, unreadable, or malformed backup yields an empty list.
    pub async fn restore(&self) -> Vec<Note> {
        match self.load().await {
            Ok(notes) => notes.unwrap_or_default(),
            Err(error) => {
                tracing::warn!("Ignoring unreadable note backup: {error}");
                Vec::new()
            }
        }
    }

    pub async fn save_overflow(&self, notes: &[Note]) -> Result<()> {
        if notes.is_empty() {
            return self.store.remove(OVERFLOW_KEY).await;
        }
        let serialized = serde_json::to_string(notes)?;
        self.store.set(OVERFLOW_KEY, &serialized).await
    }

    pub async fn load_overflow(&self) -> Vec<Note> {
        match self.load_key(OVERFLOW_KEY).await {
            Ok(notes) => notes.unwrap_or_default(),
            Err(error) => {
                tracing::warn!("Ignoring unreadable overflow buffer: {error}");
                Vec::new()
            }
        }
    }

    async fn load_key(&self, key: &str) -> Result<Option<Vec<Note>>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryLocalStore;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<Note> {
        vec![
            Note::new("A", "<p>alpha</p>").with_id("1").at(10),
            Note::new("B", "<p>beta</p>")
                .with_id("2")
                .with_category("work")
                .pinned(true)
                .at(20),
            Note::new("Unsaved", "<p>draft</p>").at(30),
        ]
    }

    #[tokio::test]
    async fn save_then_load_preserves_every_field() {
        let cache = BackupCache::new(MemoryLocalStore::new());
        let notes = sample();

        cache.save(&notes).await.unwrap();
        assert_eq!(cache.load().await.unwrap(), Some(notes));
    }

    #[tokio::test]
    async fn load_without_backup_is_none() {
        let cache = BackupCache::new(MemoryLocalStore::new());
        assert_eq!(cache.load().await.unwrap(), None);
        assert!(cache.restore().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_backup_restores_empty_list() {
        let store = MemoryLocalStore::new();
        store.set(NOTES_BACKUP_KEY, "[{\"id\":").await.unwrap();
        let cache = BackupCache::new(store);

        assert!(cache.load().await.is_err());
        assert!(cache.restore().await.is_empty());
    }

    #[tokio::test]
    async fn empty_overflow_removes_key() {
        let cache = BackupCache::new(MemoryLocalStore::new());
        cache.save_overflow(&sample()).await.unwrap();
        assert_eq!(cache.load_overflow().await.len(), 3);

        cache.save_overflow(&[]).await.unwrap();
        assert!(cache.store().snapshot().await.get(OVERFLOW_KEY).is_none());
    }
}
