use std::io::Write;

use jotter_core::remote::Connector;
use jotter_core::storage::LocalStore;
use jotter_core::Session;

use crate::commands::common::{format_note_lines, note_to_list_item, NoteListItem};
use crate::error::CliError;

pub fn run_list<C: Connector, L: LocalStore>(
    session: &mut Session<C, L>,
    search: Option<&str>,
    category: Option<&str>,
    as_json: bool,
    more: usize,
    out: &mut impl Write,
) -> Result<(), CliError> {
    // Searching clears the category selection, so it goes first.
    if let Some(query) = search {
        session.search(query);
    }
    if let Some(category) = category {
        session.toggle_category(category);
    }

    let notes = session.state().view.projection();
    if as_json {
        let items = notes.iter().map(note_to_list_item).collect::<Vec<NoteListItem>>();
        writeln!(out, "{}", serde_json::to_string_pretty(&items)?)?;
        return Ok(());
    }

    for line in format_note_lines(notes) {
        writeln!(out, "{line}")?;
    }
    if !session.state().categories.all().is_empty() {
        writeln!(out)?;
        write_categories(session, more, out)?;
    }
    Ok(())
}

pub fn run_categories<C: Connector, L: LocalStore>(
    session: &mut Session<C, L>,
    more: usize,
    out: &mut impl Write,
) -> Result<(), CliError> {
    write_categories(session, more, out)
}

fn write_categories<C: Connector, L: LocalStore>(
    session: &mut Session<C, L>,
    more: usize,
    out: &mut impl Write,
) -> Result<(), CliError> {
    for _ in 0..more {
        session.show_more_categories();
    }
    let selected = session.state().view.selected_category().map(ToString::to_string);
    let page = session.state().categories.page();
    for category in page.categories {
        let marker = if selected.as_deref() == Some(category.as_str()) {
            '>'
        } else {
            ' '
        };
        writeln!(out, "{marker} {category}")?;
    }
    if page.has_more {
        writeln!(out, "  ... (--more {} to show more)", more + 1)?;
    }
    Ok(())
}
