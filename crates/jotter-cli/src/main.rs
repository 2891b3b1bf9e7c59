//! Jotter CLI - manage notes from the terminal, online or from the local backup

mod cli;
mod commands;
mod error;

use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use jotter_core::config::ClientConfig;
use jotter_core::remote::firestore::FirestoreConnector;
use jotter_core::remote::memory::{MemoryCloud, MemoryConnector};
use jotter_core::remote::Connector;
use jotter_core::repository::FetchOutcome;
use jotter_core::storage::{FileLocalStore, LocalStore};
use jotter_core::Session;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, EnvCommands};
use crate::commands::add::{run_add, run_edit};
use crate::commands::capture::{run_capture, run_prune_images};
use crate::commands::common::{default_config_dir, format_notice, resolve_data_dir};
use crate::commands::delete::run_delete;
use crate::commands::env::{
    run_env_import, run_env_list, run_env_remove, run_env_switch, run_env_use,
};
use crate::commands::list::{run_categories, run_list};
use crate::commands::pin::{run_copy, run_pin};
use crate::commands::recover::run_recover;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jotter=warn")),
        )
        .init();

    let cli = Cli::parse();
    let data_dir = resolve_data_dir(cli.data_dir);
    let config = ClientConfig::load(&ClientConfig::default_path(&default_config_dir()))?;
    let local = Arc::new(FileLocalStore::in_dir(&data_dir));
    tracing::debug!(data_dir = %data_dir.display(), "starting");

    let mut stdout = io::stdout();
    if cli.offline_demo {
        let connector = MemoryConnector::new(MemoryCloud::new());
        let session = Session::new(connector, local, &config).await?;
        execute(cli.command, session, &mut stdout).await
    } else {
        let connector = FirestoreConnector::new(config.remote_timeout());
        let session = Session::new(connector, local, &config).await?;
        execute(cli.command, session, &mut stdout).await
    }
}

async fn execute<C: Connector, L: LocalStore>(
    command: Commands,
    mut session: Session<C, L>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let result = dispatch(command, &mut session, out).await;
    for notice in session.state().notices.history() {
        eprintln!("{}", format_notice(notice));
    }
    result
}

async fn dispatch<C: Connector, L: LocalStore>(
    command: Commands,
    session: &mut Session<C, L>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    // Environment commands connect on their own.
    if let Commands::Env { command } = command {
        return match command {
            EnvCommands::List => run_env_list(session, out).await,
            EnvCommands::Use { text } => run_env_use(session, &text, out).await,
            EnvCommands::Import { path } => run_env_import(session, &path, out).await,
            EnvCommands::Remove { api_key } => run_env_remove(session, &api_key, out).await,
            EnvCommands::Switch { api_key } => run_env_switch(session, &api_key, out).await,
        };
    }

    open(session).await?;
    match command {
        Commands::List {
            search,
            category,
            json,
            more,
        } => run_list(
            session,
            search.as_deref(),
            category.as_deref(),
            json,
            more,
            out,
        ),
        Commands::Add {
            title,
            body,
            category,
            image,
        } => run_add(session, &title, &body, category.as_deref(), &image, out).await,
        Commands::Edit {
            id,
            title,
            body,
            category,
        } => run_edit(session, &id, &title, &body, category.as_deref(), out).await,
        Commands::Delete { id } => run_delete(session, &id, out).await,
        Commands::Pin { id } => run_pin(session, &id, true, out).await,
        Commands::Unpin { id } => run_pin(session, &id, false, out).await,
        Commands::Copy { id } => run_copy(session, &id, out),
        Commands::Categories { more } => run_categories(session, more, out),
        Commands::Recover => run_recover(session, out).await,
        Commands::Capture { text } => run_capture(session, &text, out).await,
        Commands::PruneImages => run_prune_images(session, out).await,
        Commands::Env { .. } => Ok(()),
    }
}

/// Connect to the saved environment, load notes, and pick up any selection
/// captured while the app was closed.
async fn open<C: Connector, L: LocalStore>(session: &mut Session<C, L>) -> Result<(), CliError> {
    if let FetchOutcome::Degraded(error) = session.resume().await {
        tracing::warn!("Working from the local backup: {error}");
    }
    session.consume_pending_note().await?;
    Ok(())
}
