use std::io::Write;

use jotter_core::remote::Connector;
use jotter_core::storage::LocalStore;
use jotter_core::Session;

use crate::commands::common::normalize_note_identifier;
use crate::error::CliError;

pub async fn run_pin<C: Connector, L: LocalStore>(
    session: &mut Session<C, L>,
    id: &str,
    is_pinned: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let id = normalize_note_identifier(id)?;
    session.set_pinned(&id, is_pinned).await.map_err(|error| match error {
        jotter_core::Error::NotFound(_) => CliError::NoteNotFound(id.to_string()),
        other => other.into(),
    })?;
    writeln!(out, "{id}")?;
    Ok(())
}

pub fn run_copy<C: Connector, L: LocalStore>(
    session: &mut Session<C, L>,
    id: &str,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let id = normalize_note_identifier(id)?;
    let text = session
        .copy_note(&id)
        .ok_or_else(|| CliError::NoteNotFound(id.to_string()))?;
    writeln!(out, "{text}")?;
    Ok(())
}
