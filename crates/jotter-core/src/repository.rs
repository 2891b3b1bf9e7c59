//! Note CRUD against the remote collection with local fallbacks.
//!
//! Reads fall back to the local backup. Failed writes land in an overflow
//! buffer that is shown in the list, persisted locally, and can be replayed
//! with [`NoteRepository::retry_overflow`].

use std::future::Future;
use std::time::Duration;

use tokio::time;

use crate::error::{Error, Result};
use crate::models::{Note, NoteId};
use crate::notifications::{Notice, NoticeDuration};
use crate::remote::{Connector, DocumentStore, RemoteConnection, NOTES_COLLECTION};
use crate::state::{AppState, SyncState};
use crate::storage::{BackupCache, LocalStore};
use crate::util::now_millis;

/// Upper bound on any single remote call.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(15);

/// Result of [`NoteRepository::fetch_all`].
#[derive(Debug)]
#[must_use]
pub enum FetchOutcome {
    /// The list reflects the remote collection.
    Fresh,
    /// The remote read failed and the list was restored from the backup.
    Degraded(Error),
}

impl FetchOutcome {
    pub const fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh)
    }
}

pub struct NoteRepository<C: Connector, L: LocalStore> {
    connection: RemoteConnection<C>,
    backup: BackupCache<L>,
    overflow: Vec<Note>,
    collection: String,
    timeout: Duration,
}

impl<C: Connector, L: LocalStore> NoteRepository<C, L> {
    pub fn new(connection: RemoteConnection<C>, backup: BackupCache<L>) -> Self {
        Self {
            connection,
            backup,
            overflow: Vec::new(),
            collection: NOTES_COLLECTION.to_string(),
            timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub const fn connection(&self) -> &RemoteConnection<C> {
        &self.connection
    }

    pub const fn backup(&self) -> &BackupCache<L> {
        &self.backup
    }

    /// Notes whose remote write has not succeeded yet.
    pub fn overflow(&self) -> &[Note] {
        &self.overflow
    }

    /// Restore the overflow buffer persisted by an earlier run.
    pub async fn load_overflow(&mut self) {
        self.overflow = self.backup.load_overflow().await;
        if !self.overflow.is_empty() {
            tracing::info!(count = self.overflow.len(), "pending notes restored");
        }
    }

    /// Replace the note list with the remote collection.
    ///
    /// On failure the list is restored from the local backup (empty when
    /// there is none) and the read error is returned as a warning.
    pub async fn fetch_all(&mut self, state: &mut AppState) -> FetchOutcome {
        state.sync_state = SyncState::Syncing;
        match self.read_notes().await {
            Ok(mut notes) => {
                merge_pending(&mut notes, &self.overflow);
                tracing::debug!(count = notes.len(), "notes fetched");
                state.view.replace_all(notes);
                state.categories.reset();
                state.refresh_categories();
                self.save_backup(state).await;
                state.sync_state = SyncState::Synced;
                FetchOutcome::Fresh
            }
            Err(error) => {
                let error = read_failure(error);
                tracing::warn!("Falling back to local backup: {error}");
                state.view.replace_all(self.backup.restore().await);
                state.categories.reset();
                state.refresh_categories();
                state.sync_state = SyncState::Offline;
                state
                    .notices
                    .push(Notice::warning("Error getting documents", NoticeDuration::Long));
                FetchOutcome::Degraded(error)
            }
        }
    }

    /// Create `note` (no id) or overwrite it (with id).
    ///
    /// Returns the remote id, or `None` when the write failed and the note
    /// was kept locally in the overflow buffer. Only validation errors are
    /// returned as `Err`.
    pub async fn upsert(&mut self, state: &mut AppState, mut note: Note) -> Result<Option<NoteId>> {
        note.normalize();
        if let Err(error) = note.validate() {
            state.notices.push(error.notice());
            return Err(error);
        }
        note.updated_at = now_millis();

        match self.write_note(&note).await {
            Ok(id) => {
                tracing::debug!(id = %id, "note saved");
                state
                    .notices
                    .push(Notice::info("Note added successfully", NoticeDuration::Medium));
                self.refresh(state).await;
                Ok(Some(id))
            }
            Err(error) => {
                tracing::warn!("Keeping note locally after failed write: {error}");
                self.push_overflow(note.clone());
                state.view.upsert_local(note);
                state.refresh_categories();
                state.sync_state = SyncState::Error;
                self.save_backup(state).await;
                self.save_overflow().await;
                state
                    .notices
                    .push(Notice::warning("Error adding document", NoticeDuration::Long));
                Ok(None)
            }
        }
    }

    /// Delete a note and re-fetch. Ignored while browsing environments.
    pub async fn delete(&mut self, state: &mut AppState, id: &NoteId) -> Result<()> {
        if state.view.is_browsing_environments() {
            tracing::debug!(id = %id, "delete ignored while browsing environments");
            return Ok(());
        }

        let result = match self.connection.session().await {
            Ok(session) => {
                self.within(
                    session.store().delete_document(&self.collection, id.as_str()),
                    Error::RemoteWrite,
                )
                .await
            }
            Err(error) => Err(error),
        };

        match result {
            Ok(()) => {
                let before = self.overflow.len();
                self.overflow.retain(|note| note.id.as_ref() != Some(id));
                if self.overflow.len() != before {
                    self.save_overflow().await;
                }
                state
                    .notices
                    .push(Notice::warning("Note removed successfully", NoticeDuration::Medium));
                self.refresh(state).await;
                Ok(())
            }
            Err(error) => {
                let error = write_failure(error);
                tracing::warn!(id = %id, "Failed to delete note: {error}");
                state
                    .notices
                    .push(Notice::danger("Error removing document", NoticeDuration::Long));
                Err(error)
            }
        }
    }

    /// Flip the pin flag locally, then update the remote record.
    ///
    /// The local change and the backup stay in place when the remote update
    /// fails; the next successful fetch restores the remote value.
    pub async fn set_pinned(&mut self, state: &mut AppState, id: &NoteId, is_pinned: bool) -> Result<()> {
        if !state.view.set_pinned_local(id, is_pinned) {
            let error = Error::NotFound(id.to_string());
            state.notices.push(error.notice());
            return Err(error);
        }

        let result = match self.connection.session().await {
            Ok(session) => {
                self.within(
                    session.store().update_document(
                        &self.collection,
                        id.as_str(),
                        Note::pin_record(is_pinned),
                    ),
                    Error::RemoteWrite,
                )
                .await
            }
            Err(error) => Err(error),
        };
        self.save_backup(state).await;

        match result {
            Ok(()) => {
                let message = if is_pinned {
                    "Note pinned successfully"
                } else {
                    "Note unpinned successfully"
                };
                state.notices.push(Notice::info(message, NoticeDuration::Short));
                Ok(())
            }
            Err(error) => {
                let error = write_failure(error);
                tracing::warn!(id = %id, "Failed to update pin flag: {error}");
                state
                    .notices
                    .push(Notice::danger("Error pinning note", NoticeDuration::Long));
                Err(error)
            }
        }
    }

    /// Replay every buffered write. Notes that fail again stay buffered.
    /// Returns how many were written.
    pub async fn retry_overflow(&mut self, state: &mut AppState) -> usize {
        if self.overflow.is_empty() {
            return 0;
        }

        let pending = std::mem::take(&mut self.overflow);
        let mut recovered = 0;
        for note in pending {
            match self.write_note(&note).await {
                Ok(id) => {
                    tracing::debug!(id = %id, "pending note written");
                    recovered += 1;
                }
                Err(error) => {
                    tracing::warn!("Pending note still failing: {error}");
                    self.overflow.push(note);
                }
            }
        }
        self.save_overflow().await;

        if self.overflow.is_empty() {
            state.notices.push(Notice::info(
                format!("Recovered {recovered} pending note(s)"),
                NoticeDuration::Medium,
            ));
        } else {
            state.notices.push(Notice::warning(
                format!("{} note(s) still pending", self.overflow.len()),
                NoticeDuration::Long,
            ));
        }
        self.refresh(state).await;
        recovered
    }

    async fn read_notes(&self) -> Result<Vec<Note>> {
        let session = self.connection.session().await?;
        let documents = self
            .within(
                session.store().get_all_documents(&self.collection),
                Error::RemoteRead,
            )
            .await?;
        Ok(documents
            .iter()
            .map(|(id, record)| Note::from_record(id.as_str(), record))
            .collect())
    }

    async fn write_note(&self, note: &Note) -> Result<NoteId> {
        let session = self.connection.session().await?;
        let store = session.store();
        let record = note.to_record();
        match &note.id {
            Some(id) => {
                self.within(
                    store.update_document(&self.collection, id.as_str(), record),
                    Error::RemoteWrite,
                )
                .await?;
                Ok(id.clone())
            }
            None => self
                .within(store.add_document(&self.collection, record), Error::RemoteWrite)
                .await
                .map(NoteId::from),
        }
    }

    async fn within<T>(
        &self,
        call: impl Future<Output = Result<T>>,
        timed_out: fn(String) -> Error,
    ) -> Result<T> {
        time::timeout(self.timeout, call).await.map_err(|_| {
            timed_out(format!(
                "no response within {}s",
                self.timeout.as_secs_f32()
            ))
        })?
    }

    /// Best-effort re-fetch after a successful write.
    async fn refresh(&mut self, state: &mut AppState) {
        if let FetchOutcome::Degraded(error) = self.fetch_all(state).await {
            tracing::debug!("Re-fetch after write degraded: {error}");
        }
    }

    fn push_overflow(&mut self, note: Note) {
        if let Some(existing) = self
            .overflow
            .iter_mut()
            .find(|pending| pending.id.is_some() && pending.id == note.id)
        {
            *existing = note;
        } else {
            self.overflow.push(note);
        }
    }

    async fn save_backup(&self, state: &AppState) {
        if let Err(error) = self.backup.save(state.view.notes()).await {
            tracing::warn!("Failed to save note backup: {error}");
        }
    }

    async fn save_overflow(&self) {
        if let Err(error) = self.backup.save_overflow(&self.overflow).await {
            tracing::warn!("Failed to persist pending notes: {error}");
        }
    }
}

/// Overlay locally pending writes on a freshly read list.
fn merge_pending(notes: &mut Vec<Note>, pending: &[Note]) {
    for note in pending {
        match notes
            .iter_mut()
            .find(|existing| note.id.is_some() && existing.id == note.id)
        {
            Some(existing) => *existing = note.clone(),
            None => notes.push(note.clone()),
        }
    }
}

fn read_failure(error: Error) -> Error {
    match error {
        Error::RemoteRead(_) => error,
        other => Error::RemoteRead(other.to_string()),
    }
}

fn write_failure(error: Error) -> Error {
    match error {
        Error::RemoteWrite(_) | Error::NotFound(_) => error,
        other => Error::RemoteWrite(other.to_string()),
    }
}
