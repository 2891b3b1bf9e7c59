use std::io::Write;

use jotter_core::remote::Connector;
use jotter_core::storage::LocalStore;
use jotter_core::Session;

use crate::commands::common::normalize_note_identifier;
use crate::error::CliError;

pub async fn run_delete<C: Connector, L: LocalStore>(
    session: &mut Session<C, L>,
    id: &str,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let id = normalize_note_identifier(id)?;
    if session.state().view.find(&id).is_none() {
        return Err(CliError::NoteNotFound(id.to_string()));
    }

    session.delete_note(&id).await?;
    writeln!(out, "{id}")?;
    Ok(())
}
