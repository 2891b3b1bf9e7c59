//! One running client: saved environments, the remote connection, the note
//! repository, and the state a renderer reads.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::ClientConfig;
use crate::environments::EnvironmentStore;
use crate::error::{Error, Result};
use crate::media::{ImageHost, ImageLibrary};
use crate::messaging::{AppMessage, PendingNote};
use crate::models::{EnvironmentProfile, Note, NoteId};
use crate::notifications::{Notice, NoticeDuration};
use crate::remote::{Connector, RemoteConnection};
use crate::repository::{FetchOutcome, NoteRepository};
use crate::state::AppState;
use crate::storage::{BackupCache, LocalStore};

pub struct Session<C: Connector, L: LocalStore> {
    local: Arc<L>,
    environments: EnvironmentStore,
    connection: RemoteConnection<C>,
    repository: NoteRepository<C, Arc<L>>,
    state: AppState,
    images_collection: String,
    timeout: Duration,
}

impl<C: Connector, L: LocalStore> Session<C, L> {
    /// Load saved environments and pending notes. Nothing is opened yet.
    pub async fn new(connector: C, local: Arc<L>, config: &ClientConfig) -> Result<Self> {
        let environments = match EnvironmentStore::load(local.as_ref()).await {
            Ok(environments) => environments,
            Err(Error::Storage(message)) => {
                tracing::warn!("Ignoring saved environments: {message}");
                EnvironmentStore::default()
            }
            Err(error) => return Err(error),
        };

        let connection = RemoteConnection::new(connector);
        let mut repository =
            NoteRepository::new(connection.clone(), BackupCache::new(Arc::clone(&local)))
                .with_timeout(config.remote_timeout())
                .with_collection(config.notes_collection.clone());
        repository.load_overflow().await;

        Ok(Self {
            local,
            environments,
            connection,
            repository,
            state: AppState::with_category_page_size(config.category_page_size),
            images_collection: config.images_collection.clone(),
            timeout: config.remote_timeout(),
        })
    }

    /// Open the most recently used environment and load the list.
    ///
    /// Without a saved environment, or when it cannot be opened, the list is
    /// loaded from the local backup.
    pub async fn resume(&mut self) -> FetchOutcome {
        if let Some(profile) = self.environments.current().cloned() {
            if let Err(error) = self.connection.open(&profile).await {
                tracing::warn!("Could not reopen last environment: {error}");
                self.state.notices.push(error.notice());
            }
        }
        self.repository.fetch_all(&mut self.state).await
    }

    /// Tear down the current connection, open `profile`, remember it as the
    /// most recent environment, and reload the list.
    ///
    /// Configuration and connection errors leave the saved environments
    /// untouched.
    pub async fn switch_environment(&mut self, profile: EnvironmentProfile) -> Result<FetchOutcome> {
        if let Err(error) = self.connection.open(&profile).await {
            self.state.notices.push(error.notice());
            return Err(error);
        }

        self.environments.upsert(profile)?;
        if let Err(error) = self.environments.save(self.local.as_ref()).await {
            tracing::warn!("Failed to save environments: {error}");
            self.state.notices.push(error.notice());
        }
        self.state.categories.reset();
        self.state.view.clear_category();
        self.state.view.set_browsing_environments(false);
        self.state.notices.push(Notice::info(
            "Environment switched successfully",
            NoticeDuration::Medium,
        ));

        Ok(self.repository.fetch_all(&mut self.state).await)
    }

    /// Switch to a saved environment by API key.
    pub async fn switch_to_saved(&mut self, api_key: &str) -> Result<FetchOutcome> {
        let profile = self
            .environments
            .find(api_key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("environment {api_key}")))?;
        self.switch_environment(profile).await
    }

    /// Forget a saved environment. Removing the open one closes it.
    pub async fn remove_environment(&mut self, api_key: &str) -> Result<bool> {
        if !self.environments.remove(api_key) {
            return Ok(false);
        }
        self.environments.save(self.local.as_ref()).await?;
        if self.connection.api_key().await.as_deref() == Some(api_key) {
            self.connection.close().await;
        }
        Ok(true)
    }

    /// Enter or leave environment browsing. Leaving reloads the list.
    pub async fn set_browsing_environments(&mut self, browsing: bool) -> Option<FetchOutcome> {
        self.state.view.set_browsing_environments(browsing);
        if browsing {
            None
        } else {
            Some(self.repository.fetch_all(&mut self.state).await)
        }
    }

    pub async fn refresh(&mut self) -> FetchOutcome {
        self.repository.fetch_all(&mut self.state).await
    }

    pub async fn save_note(&mut self, note: Note) -> Result<Option<NoteId>> {
        self.repository.upsert(&mut self.state, note).await
    }

    pub async fn delete_note(&mut self, id: &NoteId) -> Result<()> {
        self.repository.delete(&mut self.state, id).await
    }

    pub async fn set_pinned(&mut self, id: &NoteId, is_pinned: bool) -> Result<()> {
        self.repository.set_pinned(&mut self.state, id, is_pinned).await
    }

    pub async fn retry_overflow(&mut self) -> usize {
        self.repository.retry_overflow(&mut self.state).await
    }

    pub fn search(&mut self, query: &str) {
        self.state.view.apply_search(query);
        self.state.refresh_categories();
    }

    pub fn toggle_category(&mut self, name: &str) {
        self.state.view.toggle_category(name);
        self.state.refresh_categories();
    }

    pub fn show_more_categories(&mut self) {
        self.state.categories.show_more();
    }

    /// Plain text of a note for the clipboard.
    pub fn copy_note(&mut self, id: &NoteId) -> Option<String> {
        let text = self.state.view.copy_text(id)?;
        self.state
            .notices
            .push(Notice::info("Text copied to clipboard", NoticeDuration::Short));
        Some(text)
    }

    /// React to a message from the context-menu hook. Returns whether a
    /// pending note was turned into a note.
    pub async fn handle_message(&mut self, message: AppMessage) -> Result<bool> {
        match message {
            AppMessage::AutoUpdateEditor => self.consume_pending_note().await,
        }
    }

    /// Handle every message already queued on `receiver`.
    pub async fn drain_messages(&mut self, receiver: &mut mpsc::Receiver<AppMessage>) -> Result<usize> {
        let mut consumed = 0;
        while let Ok(message) = receiver.try_recv() {
            if self.handle_message(message).await? {
                consumed += 1;
            }
        }
        Ok(consumed)
    }

    /// Create a note from the pending capture, if one is flagged.
    pub async fn consume_pending_note(&mut self) -> Result<bool> {
        let Some(pending) = PendingNote::take(self.local.as_ref()).await? else {
            return Ok(false);
        };
        tracing::debug!("creating note from captured selection");
        self.repository
            .upsert(&mut self.state, pending.into_note())
            .await?;
        Ok(true)
    }

    /// Image library bound to this session's connection.
    pub fn image_library<H: ImageHost>(&self, host: H) -> ImageLibrary<H, C> {
        ImageLibrary::new(host, self.connection.clone())
            .with_collection(self.images_collection.clone())
            .with_timeout(self.timeout)
    }

    /// Delete uploaded images no note references. Requires a fresh list.
    pub async fn prune_images<H: ImageHost>(&mut self, host: H) -> Result<usize> {
        let credentials = self
            .environments
            .current()
            .and_then(EnvironmentProfile::image_service)
            .ok_or_else(|| Error::Configuration("CLOUDNAME".into()))?;
        if let FetchOutcome::Degraded(error) = self.repository.fetch_all(&mut self.state).await {
            return Err(error);
        }
        self.image_library(host)
            .prune_orphans(self.state.view.notes(), &credentials)
            .await
    }

    pub const fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub const fn environments(&self) -> &EnvironmentStore {
        &self.environments
    }

    pub const fn connection(&self) -> &RemoteConnection<C> {
        &self.connection
    }

    pub fn pending_notes(&self) -> &[Note] {
        self.repository.overflow()
    }

    /// Shared handle to the local store, e.g. for a [`crate::messaging::ContextMenuHook`].
    pub fn local_store(&self) -> Arc<L> {
        Arc::clone(&self.local)
    }
}
