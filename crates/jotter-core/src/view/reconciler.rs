//! Canonical note list plus its sorted, filtered projection.
//!
//! The projection is recomputed from scratch after every change, so applying
//! the same search or sort twice leaves it unchanged.

use std::cmp::Ordering;

use crate::models::{Note, NoteId};
use crate::search::{matches_query, normalize_query};

#[derive(Debug, Clone, Default)]
pub struct ViewReconciler {
    notes: Vec<Note>,
    projection: Vec<Note>,
    /// Lowercased active search query
    query: String,
    selected_category: Option<String>,
    browsing_environments: bool,
}

impl ViewReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the list wholesale.
    pub fn replace_all(&mut self, notes: Vec<Note>) {
        self.notes = notes;
        self.apply_sort();
    }

    /// Put a locally written note into the list: replaces the entry with the
    /// same id, otherwise appends.
    pub fn upsert_local(&mut self, note: Note) {
        match self
            .notes
            .iter_mut()
            .find(|existing| existing.id.is_some() && existing.id == note.id)
        {
            Some(existing) => *existing = note,
            None => self.notes.push(note),
        }
        self.apply_sort();
    }

    /// Filter by a case-insensitive substring of the title or plain-text
    /// body. Clears the category selection and leaves environment browsing.
    pub fn apply_search(&mut self, query: &str) {
        self.query = normalize_query(query);
        self.selected_category = None;
        self.browsing_environments = false;
        self.apply_sort();
    }

    /// Order: selected category first, then pinned, then newest.
    pub fn apply_sort(&mut self) {
        let selected = self.selected_category.as_deref();
        self.notes
            .sort_by(|a, b| presentation_order(a, b, selected));
        self.projection = self
            .notes
            .iter()
            .filter(|note| matches_query(&note.title, &note.body_text(), &self.query))
            .cloned()
            .collect();
    }

    /// Select `name`, or clear the selection when it is already selected.
    pub fn toggle_category(&mut self, name: &str) {
        if self.selected_category.as_deref() == Some(name) {
            self.selected_category = None;
        } else {
            self.selected_category = Some(name.to_string());
        }
        tracing::debug!(category = ?self.selected_category, "category selection changed");
        self.apply_sort();
    }

    pub fn clear_category(&mut self) {
        self.selected_category = None;
        self.apply_sort();
    }

    pub fn selected_category(&self) -> Option<&str> {
        self.selected_category.as_deref()
    }

    pub fn set_browsing_environments(&mut self, browsing: bool) {
        self.browsing_environments = browsing;
    }

    pub const fn is_browsing_environments(&self) -> bool {
        self.browsing_environments
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn find(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id.as_ref() == Some(id))
    }

    /// Flip the pin flag in memory and re-sort. Returns `false` when no note
    /// has `id`.
    pub fn set_pinned_local(&mut self, id: &NoteId, is_pinned: bool) -> bool {
        let Some(note) = self
            .notes
            .iter_mut()
            .find(|note| note.id.as_ref() == Some(id))
        else {
            return false;
        };
        note.is_pinned = is_pinned;
        self.apply_sort();
        true
    }

    /// Plain text of a note body, as placed on the clipboard.
    pub fn copy_text(&self, id: &NoteId) -> Option<String> {
        self.find(id).map(Note::body_text)
    }

    /// Notes to render, in display order.
    pub fn projection(&self) -> &[Note] {
        &self.projection
    }

    /// The canonical list, in display order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}

fn presentation_order(a: &Note, b: &Note, selected: Option<&str>) -> Ordering {
    let in_selected =
        |note: &Note| selected.is_some_and(|category| note.category.as_deref() == Some(category));

    in_selected(b)
        .cmp(&in_selected(a))
        .then_with(|| b.is_pinned.cmp(&a.is_pinned))
        .then_with(|| b.updated_at.cmp(&a.updated_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn titles(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|note| note.title.as_str()).collect()
    }

    fn sample() -> Vec<Note> {
        vec![
            Note::new("old", "<p>first entry</p>").with_id("1").at(100),
            Note::new("pinned-old", "<p>keep</p>")
                .with_id("2")
                .pinned(true)
                .at(50),
            Note::new("work-new", "<p>standup notes</p>")
                .with_id("3")
                .with_category("work")
                .at(300),
            Note::new("home", "<p>Groceries</p>")
                .with_id("4")
                .with_category("home")
                .at(200),
        ]
    }

    #[test]
    fn pinned_notes_come_first_then_newest() {
        let mut view = ViewReconciler::new();
        view.replace_all(sample());

        assert_eq!(
            titles(view.projection()),
            vec!["pinned-old", "work-new", "home", "old"]
        );
    }

    #[test]
    fn selected_category_outranks_pin() {
        let mut view = ViewReconciler::new();
        view.replace_all(sample());
        view.toggle_category("home");

        assert_eq!(
            titles(view.projection()),
            vec!["home", "pinned-old", "work-new", "old"]
        );
    }

    #[test]
    fn toggling_same_category_twice_clears_selection() {
        let mut view = ViewReconciler::new();
        view.replace_all(sample());
        view.toggle_category("work");
        view.toggle_category("work");

        assert_eq!(view.selected_category(), None);
        assert_eq!(
            titles(view.projection()),
            vec!["pinned-old", "work-new", "home", "old"]
        );
    }

    #[test]
    fn sort_is_idempotent() {
        let mut view = ViewReconciler::new();
        view.replace_all(sample());
        view.toggle_category("work");
        let once = view.projection().to_vec();
        view.apply_sort();

        assert_eq!(view.projection(), once.as_slice());
    }

    #[test]
    fn search_matches_title_or_body_text_case_insensitively() {
        let mut view = ViewReconciler::new();
        view.replace_all(sample());

        view.apply_search("GROCER");
        assert_eq!(titles(view.projection()), vec!["home"]);

        view.apply_search("old");
        assert_eq!(titles(view.projection()), vec!["pinned-old", "old"]);

        view.apply_search("");
        assert_eq!(view.projection().len(), 4);
    }

    #[test]
    fn search_ignores_markup() {
        let mut view = ViewReconciler::new();
        view.replace_all(vec![Note::new("t", "<p>a<b>bold</b></p>").with_id("1")]);

        view.apply_search("<b>");
        assert!(view.projection().is_empty());
        view.apply_search("abold");
        assert_eq!(view.projection().len(), 1);
    }

    #[test]
    fn search_clears_category_and_browsing_mode() {
        let mut view = ViewReconciler::new();
        view.replace_all(sample());
        view.toggle_category("work");
        view.set_browsing_environments(true);

        view.apply_search("note");
        assert_eq!(view.selected_category(), None);
        assert!(!view.is_browsing_environments());
    }

    #[test]
    fn repeated_search_is_idempotent() {
        let mut view = ViewReconciler::new();
        view.replace_all(sample());
        view.apply_search("e");
        let once = view.projection().to_vec();
        view.apply_search("e");

        assert_eq!(view.projection(), once.as_slice());
    }

    #[test]
    fn local_pin_resorts_and_reports_missing_ids() {
        let mut view = ViewReconciler::new();
        view.replace_all(sample());

        assert!(view.set_pinned_local(&NoteId::new("1"), true));
        assert_eq!(titles(view.projection())[0], "old");
        assert!(!view.set_pinned_local(&NoteId::new("missing"), true));
    }

    #[test]
    fn copy_text_uses_plain_body() {
        let mut view = ViewReconciler::new();
        view.replace_all(vec![
            Note::new("t", "<p>Line one</p><p>Line two!</p>").with_id("1"),
        ]);

        assert_eq!(
            view.copy_text(&NoteId::new("1")).as_deref(),
            Some("Line one.\nLine two!")
        );
        assert_eq!(view.copy_text(&NoteId::new("2")), None);
    }
}
