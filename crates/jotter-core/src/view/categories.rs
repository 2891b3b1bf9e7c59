//! Distinct categories of the note list, paged for display.

use crate::models::Note;

pub const DEFAULT_CATEGORY_PAGE_SIZE: usize = 5;
const PAGE_STEP: usize = 5;

/// Visible slice of the category list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryPage<'a> {
    pub categories: &'a [String],
    /// More categories exist beyond this page
    pub has_more: bool,
}

#[derive(Debug, Clone)]
pub struct CategoryIndex {
    categories: Vec<String>,
    page_size: usize,
    default_page_size: usize,
}

impl Default for CategoryIndex {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_CATEGORY_PAGE_SIZE)
    }
}

impl CategoryIndex {
    pub fn with_page_size(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            categories: Vec::new(),
            page_size,
            default_page_size: page_size,
        }
    }

    /// Rebuild from `notes` in first-seen order, with `selected` moved to the
    /// front when some note carries it.
    pub fn recompute(&mut self, notes: &[Note], selected: Option<&str>) {
        let mut categories: Vec<String> = Vec::new();
        for category in notes.iter().filter_map(|note| note.category.as_deref()) {
            if !categories.iter().any(|seen| seen == category) {
                categories.push(category.to_string());
            }
        }
        if let Some(position) =
            selected.and_then(|selected| categories.iter().position(|seen| seen == selected))
        {
            let promoted = categories.remove(position);
            categories.insert(0, promoted);
        }
        self.categories = categories;
    }

    pub fn page(&self) -> CategoryPage<'_> {
        let end = self.page_size.min(self.categories.len());
        CategoryPage {
            categories: &self.categories[..end],
            has_more: self.categories.len() > end,
        }
    }

    pub fn show_more(&mut self) {
        self.page_size += PAGE_STEP;
    }

    /// Back to the default page size.
    pub fn reset(&mut self) {
        self.page_size = self.default_page_size;
    }

    pub fn all(&self) -> &[String] {
        &self.categories
    }

    pub const fn page_size(&self) -> usize {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn notes(categories: &[Option<&str>]) -> Vec<Note> {
        categories
            .iter()
            .map(|category| {
                let note = Note::new("t", "b");
                match category {
                    Some(category) => note.with_category(*category),
                    None => note,
                }
            })
            .collect()
    }

    #[test]
    fn distinct_in_first_seen_order_skipping_uncategorized() {
        let mut index = CategoryIndex::default();
        index.recompute(
            &notes(&[Some("b"), None, Some("a"), Some("b"), Some("c")]),
            None,
        );
        assert_eq!(index.all(), ["b", "a", "c"]);
    }

    #[test]
    fn selected_category_is_promoted() {
        let mut index = CategoryIndex::default();
        index.recompute(&notes(&[Some("b"), Some("a"), Some("c")]), Some("c"));
        assert_eq!(index.all(), ["c", "b", "a"]);

        index.recompute(&notes(&[Some("b")]), Some("gone"));
        assert_eq!(index.all(), ["b"]);
    }

    #[test]
    fn paging_grows_by_five_and_resets() {
        let names = (0..12).map(|i| format!("c{i}")).collect::<Vec<_>>();
        let list = notes(&names.iter().map(|name| Some(name.as_str())).collect::<Vec<_>>());
        let mut index = CategoryIndex::default();
        index.recompute(&list, None);

        let page = index.page();
        assert_eq!(page.categories.len(), 5);
        assert!(page.has_more);

        index.show_more();
        index.show_more();
        let page = index.page();
        assert_eq!(page.categories.len(), 12);
        assert!(!page.has_more);

        index.reset();
        assert_eq!(index.page_size(), DEFAULT_CATEGORY_PAGE_SIZE);
    }

    #[test]
    fn empty_list_has_no_more_marker() {
        let index = CategoryIndex::default();
        let page = index.page();
        assert!(page.categories.is_empty());
        assert!(!page.has_more);
    }
}
