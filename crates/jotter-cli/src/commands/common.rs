use std::env;
use std::path::PathBuf;

use chrono::Utc;
use jotter_core::notifications::{Notice, NoticeLevel};
use jotter_core::{Note, NoteId};
use serde::Serialize;

use crate::error::CliError;

pub const DATA_DIR_ENV: &str = "JOTTER_DATA_DIR";

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    /// `None` for notes that only exist locally
    pub id: Option<String>,
    pub title: String,
    pub preview: String,
    pub text: String,
    pub category: Option<String>,
    pub is_pinned: bool,
    pub updated_at: i64,
    pub relative_time: String,
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    let text = note.body_text();
    NoteListItem {
        id: note.id.as_ref().map(ToString::to_string),
        title: note.title.clone(),
        preview: note_preview(&text, 80),
        text,
        category: note.category.clone(),
        is_pinned: note.is_pinned,
        updated_at: note.updated_at,
        relative_time: format_relative_time(note.updated_at, now_ms),
    }
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .map(|note| {
            let id = note
                .id
                .as_ref()
                .map_or_else(|| "(pending)".to_string(), ToString::to_string);
            let short_id = id.chars().take(13).collect::<String>();
            let pin = if note.is_pinned { '*' } else { ' ' };
            let title = note_preview(&note.title, 24);
            let preview = note_preview(&note.body_text(), 40);
            let relative_time = format_relative_time(note.updated_at, now_ms);

            match &note.category {
                Some(category) => format!(
                    "{short_id:<13} {pin} {title:<24}  {preview:<40}  {relative_time:<10}  [{category}]"
                ),
                None => format!("{short_id:<13} {pin} {title:<24}  {preview:<40}  {relative_time}"),
            }
        })
        .collect()
}

/// First line of `text`, whitespace-collapsed and truncated with `...`.
pub fn note_preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<NoteId, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(CliError::EmptyNoteId);
    }
    Ok(NoteId::new(trimmed))
}

/// Plain text becomes one paragraph per line; markup is kept as given.
pub fn body_from_input(body: &str) -> String {
    if body.contains('<') {
        return body.to_string();
    }
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("<p>{}</p>", line.replace('&', "&amp;")))
        .collect()
}

pub fn format_notice(notice: &Notice) -> String {
    let level = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Danger => "error",
    };
    format!("{level}: {}", notice.message)
}

pub fn resolve_data_dir(cli_data_dir: Option<PathBuf>) -> PathBuf {
    cli_data_dir
        .or_else(|| env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(default_data_dir)
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jotter")
}

pub fn default_config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from("."))
}
