//! Per-session application state.

use crate::notifications::NotificationCenter;
use crate::view::{CategoryIndex, ViewReconciler};

/// Outcome of the last remote round trip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncState {
    /// Showing local data; nothing has been read from the remote yet or
    /// the last read failed
    #[default]
    Offline,
    Syncing,
    Synced,
    /// The last write only reached the local overflow buffer
    Error,
}

/// Everything a renderer reads. Owned by one [`crate::session::Session`].
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub view: ViewReconciler,
    pub categories: CategoryIndex,
    pub notices: NotificationCenter,
    pub sync_state: SyncState,
}

impl AppState {
    pub fn with_category_page_size(page_size: usize) -> Self {
        Self {
            categories: CategoryIndex::with_page_size(page_size),
            ..Self::default()
        }
    }

    /// Rebuild the category index from the current list and selection.
    pub fn refresh_categories(&mut self) {
        self.categories
            .recompute(self.view.notes(), self.view.selected_category());
    }
}
