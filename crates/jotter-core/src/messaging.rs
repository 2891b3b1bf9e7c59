//! Context-menu capture of selected text.
//!
//! The hook writes a pending-note record to local storage and then signals
//! the application over a channel. When nothing is listening the caller is
//! asked to open the application, which picks the record up at startup.

use tokio::sync::mpsc;

use crate::error::Result;
use crate::models::Note;
use crate::storage::LocalStore;

pub const PENDING_TITLE_KEY: &str = "title";
pub const PENDING_CATEGORY_KEY: &str = "category";
pub const PENDING_TEXT_KEY: &str = "selectedText";
pub const PENDING_FLAG_KEY: &str = "addToNote";

/// Title and category given to captured selections.
pub const UNKNOWN_LABEL: &str = "unknown";

const MESSAGE_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMessage {
    /// A pending note is waiting in local storage.
    AutoUpdateEditor,
}

/// What happened to the signal sent after a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// No application instance is listening; it should be opened.
    OpenRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNote {
    pub title: String,
    pub category: String,
    pub selected_text: String,
    pub add_to_note: bool,
}

impl PendingNote {
    pub fn from_selection(text: impl Into<String>) -> Self {
        Self {
            title: UNKNOWN_LABEL.to_string(),
            category: UNKNOWN_LABEL.to_string(),
            selected_text: text.into(),
            add_to_note: true,
        }
    }

    pub async fn store(&self, store: &impl LocalStore) -> Result<()> {
        store.set(PENDING_TITLE_KEY, &self.title).await?;
        store.set(PENDING_CATEGORY_KEY, &self.category).await?;
        store.set(PENDING_TEXT_KEY, &self.selected_text).await?;
        store
            .set(PENDING_FLAG_KEY, if self.add_to_note { "true" } else { "false" })
            .await
    }

    /// Read the record, or `None` when no selection was ever captured.
    pub async fn load(store: &impl LocalStore) -> Result<Option<Self>> {
        let Some(selected_text) = store.get(PENDING_TEXT_KEY).await? else {
            return Ok(None);
        };
        let label = |value: Option<String>| value.unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        Ok(Some(Self {
            title: label(store.get(PENDING_TITLE_KEY).await?),
            category: label(store.get(PENDING_CATEGORY_KEY).await?),
            selected_text,
            add_to_note: store.get(PENDING_FLAG_KEY).await?.as_deref() == Some("true"),
        }))
    }

    /// Claim the record: returns it only when its flag is set, and clears
    /// the flag so it is consumed once.
    pub async fn take(store: &impl LocalStore) -> Result<Option<Self>> {
        match Self::load(store).await? {
            Some(pending) if pending.add_to_note => {
                store.set(PENDING_FLAG_KEY, "false").await?;
                Ok(Some(pending))
            }
            _ => Ok(None),
        }
    }

    /// Note to create from this selection, one paragraph per line.
    pub fn into_note(self) -> Note {
        let body = self
            .selected_text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| format!("<p>{}</p>", escape_html(line)))
            .collect::<String>();
        Note::new(self.title, body).with_category(self.category)
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Channel carrying [`AppMessage`]s from the hook to a session.
pub fn message_channel() -> (mpsc::Sender<AppMessage>, mpsc::Receiver<AppMessage>) {
    mpsc::channel(MESSAGE_BUFFER)
}

pub struct ContextMenuHook<S> {
    store: S,
    sender: mpsc::Sender<AppMessage>,
}

impl<S: LocalStore> ContextMenuHook<S> {
    pub const fn new(store: S, sender: mpsc::Sender<AppMessage>) -> Self {
        Self { store, sender }
    }

    /// Save `text` as the pending note and notify the application.
    pub async fn add_selection(&self, text: &str) -> Result<Delivery> {
        PendingNote::from_selection(text).store(&self.store).await?;
        match self.sender.try_send(AppMessage::AutoUpdateEditor) {
            // A full queue already holds a wake-up for the same record.
            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => Ok(Delivery::Delivered),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("no application listening; requesting open");
                Ok(Delivery::OpenRequested)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryLocalStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn capture_stores_record_and_signals() {
        let store = Arc::new(MemoryLocalStore::new());
        let (sender, mut receiver) = message_channel();
        let hook = ContextMenuHook::new(Arc::clone(&store), sender);

        let delivery = hook.add_selection("picked text").await.unwrap();

        assert_eq!(delivery, Delivery::Delivered);
        assert_eq!(receiver.recv().await, Some(AppMessage::AutoUpdateEditor));
        let pending = PendingNote::load(&store).await.unwrap().unwrap();
        assert_eq!(pending, PendingNote::from_selection("picked text"));
    }

    #[tokio::test]
    async fn capture_without_listener_requests_open() {
        let store = MemoryLocalStore::new();
        let (sender, receiver) = message_channel();
        drop(receiver);
        let hook = ContextMenuHook::new(store, sender);

        assert_eq!(
            hook.add_selection("x").await.unwrap(),
            Delivery::OpenRequested
        );
    }

    #[tokio::test]
    async fn take_consumes_the_record_once() {
        let store = MemoryLocalStore::new();
        PendingNote::from_selection("once").store(&store).await.unwrap();

        assert!(PendingNote::take(&store).await.unwrap().is_some());
        assert!(PendingNote::take(&store).await.unwrap().is_none());
        assert!(PendingNote::take(&MemoryLocalStore::new()).await.unwrap().is_none());
    }

    #[test]
    fn selection_becomes_escaped_paragraphs() {
        let note = PendingNote::from_selection("a < b\n\n  second line ").into_note();

        assert_eq!(note.title, "unknown");
        assert_eq!(note.category.as_deref(), Some("unknown"));
        assert_eq!(note.body, "<p>a &lt; b</p><p>second line</p>");
        assert!(note.validate().is_ok());
    }
}
