//! Plain-text rendering of rich-text note bodies and query matching.
//!
//! Note bodies are opaque HTML produced by the editor. Search and the copy
//! action both work on a flattened text form where each paragraph or line
//! break becomes its own sentence-terminated line.

use std::sync::LazyLock;

use regex::Regex;

static LINE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<\s*br\s*/?\s*>|<\s*/\s*p\s*>").expect("Invalid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

/// Flatten an HTML body to plain text.
///
/// # Examples
///
/// ```
/// use jotter_core::search::plain_text;
///
/// assert_eq!(plain_text("<p>Hello</p><p>World!</p>"), "Hello.\nWorld!");
/// ```
#[must_use]
pub fn plain_text(html: &str) -> String {
    let with_breaks = LINE_BREAK_RE.replace_all(html, "\n");
    let without_tags = TAG_RE.replace_all(&with_breaks, "");
    let text = decode_entities(&without_tags);

    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.ends_with(['.', '!', '?', '…']) {
                line.to_string()
            } else {
                format!("{line}.")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Case-insensitive substring match against a title or a plain-text body.
///
/// `query` must already be lowercased; an empty query matches everything.
#[must_use]
pub fn matches_query(title: &str, body_text: &str, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    title.to_lowercase().contains(query) || body_text.to_lowercase().contains(query)
}

/// Lowercase a raw search query. Whitespace is part of the query.
#[must_use]
pub fn normalize_query(raw: &str) -> String {
    raw.to_lowercase()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_splits_paragraphs_and_breaks() {
        let html = "<p>First line<br>second line</p><p>Third?</p>";
        assert_eq!(plain_text(html), "First line.\nsecond line.\nThird?");
    }

    #[test]
    fn plain_text_keeps_existing_terminators() {
        assert_eq!(plain_text("<p>Done.</p><p>Wow!</p><p>Hmm…</p>"), "Done.\nWow!\nHmm…");
    }

    #[test]
    fn plain_text_decodes_entities_and_drops_blank_lines() {
        let html = "<div>Tom &amp; Jerry&nbsp;</div><br/><br /><p>  </p>";
        assert_eq!(plain_text(html), "Tom & Jerry.");
    }

    #[test]
    fn plain_text_of_empty_body_is_empty() {
        assert_eq!(plain_text(""), "");
        assert_eq!(plain_text("<p></p>"), "");
    }

    #[test]
    fn matches_query_checks_title_and_body() {
        assert!(matches_query("Groceries", "", "groc"));
        assert!(matches_query("Misc", "Buy MILK.", "milk"));
        assert!(!matches_query("Misc", "Buy milk.", "bread"));
        assert!(matches_query("Anything", "", ""));
    }

    #[test]
    fn normalize_query_keeps_whitespace() {
        assert_eq!(normalize_query("Milk "), "milk ");
        assert!(!matches_query("Misc", "Buy milk.", &normalize_query("Milk ")));
        assert!(matches_query("Misc", "Buy milk now.", &normalize_query("Milk ")));
    }
}
