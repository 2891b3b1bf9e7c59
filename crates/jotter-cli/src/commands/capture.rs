use std::io::Write;

use jotter_core::media::CloudinaryHost;
use jotter_core::messaging::{message_channel, ContextMenuHook, Delivery};
use jotter_core::remote::Connector;
use jotter_core::storage::LocalStore;
use jotter_core::Session;

use crate::error::CliError;

/// Store the selection the way the context-menu hook does, then let the
/// session pick it up.
pub async fn run_capture<C: Connector, L: LocalStore>(
    session: &mut Session<C, L>,
    text_parts: &[String],
    out: &mut impl Write,
) -> Result<(), CliError> {
    let text = text_parts.join(" ");
    if text.trim().is_empty() {
        return Err(CliError::EmptySelection);
    }

    let (sender, mut receiver) = message_channel();
    let hook = ContextMenuHook::new(session.local_store(), sender);
    let delivery = hook.add_selection(text.trim()).await?;
    if delivery == Delivery::OpenRequested {
        // Picked up on the next start.
        writeln!(out, "Selection saved")?;
        return Ok(());
    }

    let created = session.drain_messages(&mut receiver).await?;
    writeln!(out, "Captured {created} selection(s)")?;
    Ok(())
}

pub async fn run_prune_images<C: Connector, L: LocalStore>(
    session: &mut Session<C, L>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let removed = session.prune_images(CloudinaryHost::new()?).await?;
    writeln!(out, "Removed {removed} unused image(s)")?;
    Ok(())
}
