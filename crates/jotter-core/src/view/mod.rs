//! Client-side presentation of the note list.

mod categories;
mod reconciler;

pub use categories::{CategoryIndex, CategoryPage, DEFAULT_CATEGORY_PAGE_SIZE};
pub use reconciler::ViewReconciler;
