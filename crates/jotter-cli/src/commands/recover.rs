use std::io::Write;

use jotter_core::remote::Connector;
use jotter_core::storage::LocalStore;
use jotter_core::Session;

use crate::error::CliError;

pub async fn run_recover<C: Connector, L: LocalStore>(
    session: &mut Session<C, L>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if session.pending_notes().is_empty() {
        writeln!(out, "Nothing to recover")?;
        return Ok(());
    }

    let recovered = session.retry_overflow().await;
    writeln!(out, "Recovered {recovered} note(s)")?;
    match session.pending_notes().len() {
        0 => Ok(()),
        remaining => Err(CliError::PendingNotes(remaining)),
    }
}
