//! Note model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Error, Result};
use crate::search::plain_text;
use crate::util::{normalize_text_option, now_millis};

/// Remote-assigned identifier of a note document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A note in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Remote identifier; `None` until the note has been persisted
    #[serde(default)]
    pub id: Option<NoteId>,
    pub title: String,
    /// Rich-text body as produced by the editor (opaque HTML)
    pub body: String,
    /// Free-form category, trimmed and case-sensitive
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_pinned: bool,
    /// Created-or-updated timestamp (Unix ms)
    #[serde(default)]
    pub updated_at: i64,
}

impl Note {
    /// Create an unsaved note stamped with the current time
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            body: body.into(),
            category: None,
            is_pinned: false,
            updated_at: now_millis(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<NoteId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = normalize_text_option(Some(category.into()));
        self
    }

    #[must_use]
    pub const fn pinned(mut self, is_pinned: bool) -> Self {
        self.is_pinned = is_pinned;
        self
    }

    #[must_use]
    pub const fn at(mut self, updated_at: i64) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Plain-text rendering of the body, used for search and copy
    #[must_use]
    pub fn body_text(&self) -> String {
        plain_text(&self.body)
    }

    /// Title and body are both required before a note can be persisted
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidInput("note title cannot be empty".into()));
        }
        if plain_text(&self.body).is_empty() && !self.body.contains("<img") {
            return Err(Error::InvalidInput("note body cannot be empty".into()));
        }
        Ok(())
    }

    /// Normalize user-entered fields in place
    pub fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
        self.category = normalize_text_option(self.category.take());
    }

    /// Full remote document for this note.
    ///
    /// `category` is always present (`null` when absent) so that an update
    /// merged into an existing document clears a removed category.
    #[must_use]
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("title".into(), Value::String(self.title.clone()));
        record.insert("body".into(), Value::String(self.body.clone()));
        record.insert(
            "category".into(),
            self.category.clone().map_or(Value::Null, Value::String),
        );
        record.insert("isPinned".into(), Value::Bool(self.is_pinned));
        record.insert("timestamp".into(), Value::from(self.updated_at));
        record
    }

    /// Build a note from a remote document, tolerating missing optional fields
    pub fn from_record(id: impl Into<NoteId>, record: &Map<String, Value>) -> Self {
        let text = |key: &str| {
            record
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Self {
            id: Some(id.into()),
            title: text("title"),
            body: text("body"),
            category: normalize_text_option(
                record
                    .get("category")
                    .and_then(Value::as_str)
                    .map(ToString::to_string),
            ),
            is_pinned: record
                .get("isPinned")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            updated_at: record
                .get("timestamp")
                .and_then(Value::as_i64)
                .unwrap_or_default(),
        }
    }

    /// Single-field update document for the pin flag
    #[must_use]
    pub fn pin_record(is_pinned: bool) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("isPinned".into(), Value::Bool(is_pinned));
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_new() {
        let note = Note::new("Title", "<p>Body</p>");
        assert!(note.id.is_none());
        assert!(!note.is_pinned);
        assert!(note.updated_at > 0);
    }

    #[test]
    fn test_with_category_trims_and_drops_blank() {
        let note = Note::new("t", "b").with_category("  Work ");
        assert_eq!(note.category.as_deref(), Some("Work"));

        let note = Note::new("t", "b").with_category("   ");
        assert_eq!(note.category, None);
    }

    #[test]
    fn test_validate_requires_title_and_body() {
        assert!(Note::new("", "<p>x</p>").validate().is_err());
        assert!(Note::new("x", "<p> </p>").validate().is_err());
        assert!(Note::new("x", "<p>y</p>").validate().is_ok());
        assert!(Note::new("x", "<img src=\"a.png\">").validate().is_ok());
    }

    #[test]
    fn test_record_roundtrip_keeps_fields() {
        let note = Note::new("Title", "<b>Body</b>")
            .with_category("work")
            .pinned(true)
            .at(42)
            .with_id("abc");

        let parsed = Note::from_record("abc", &note.to_record());
        assert_eq!(parsed, note);
    }

    #[test]
    fn test_record_without_category_carries_null() {
        let record = Note::new("Title", "<p>b</p>").to_record();
        assert_eq!(record.get("category"), Some(&Value::Null));
        assert_eq!(Note::from_record("1", &record).category, None);
    }

    #[test]
    fn test_from_record_defaults_missing_fields() {
        let mut record = Map::new();
        record.insert("title".into(), Value::String("Old".into()));
        record.insert("body".into(), Value::String("legacy".into()));

        let note = Note::from_record("1", &record);
        assert_eq!(note.category, None);
        assert!(!note.is_pinned);
        assert_eq!(note.updated_at, 0);
    }

    #[test]
    fn test_backup_json_accepts_missing_optionals() {
        let note: Note = serde_json::from_str(r#"{"id":"1","title":"A","body":""}"#).unwrap();
        assert_eq!(note.id, Some(NoteId::new("1")));
        assert!(!note.is_pinned);
    }
}
