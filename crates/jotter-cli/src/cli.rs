use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "jotter")]
#[command(about = "Rich-text notes backed by a remote document store, usable offline")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the local backup and saved environments
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Use an in-process backend instead of Firestore
    #[arg(long, global = true)]
    pub offline_demo: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List notes, pinned first, newest first
    List {
        /// Only notes whose title or text contains this
        #[arg(short, long)]
        search: Option<String>,
        /// Rank notes in this category first
        #[arg(short, long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Show N more pages of categories
        #[arg(long, value_name = "N", default_value_t = 0)]
        more: usize,
    },
    /// Create a note
    #[command(alias = "new")]
    Add {
        title: String,
        /// Note body (HTML or plain text)
        body: String,
        #[arg(short, long)]
        category: Option<String>,
        /// Upload an image and append it to the body
        #[arg(long, value_name = "PATH")]
        image: Vec<PathBuf>,
    },
    /// Replace a note's title, body, and category
    Edit {
        id: String,
        title: String,
        body: String,
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Delete a note
    Delete { id: String },
    /// Pin a note to the top of the list
    Pin { id: String },
    /// Unpin a note
    Unpin { id: String },
    /// Print a note's plain text
    Copy { id: String },
    /// List categories
    Categories {
        /// Show N more pages
        #[arg(long, value_name = "N", default_value_t = 0)]
        more: usize,
    },
    /// Manage backend environments
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },
    /// Retry notes whose upload failed earlier
    Recover,
    /// Turn a text selection into a note, as the context menu does
    Capture {
        /// Selected text
        text: Vec<String>,
    },
    /// Delete uploaded images no note references any more
    PruneImages,
}

#[derive(Subcommand)]
pub enum EnvCommands {
    /// List saved environments, most recent first
    List,
    /// Connect with credentials given as `KEY: value` text
    Use {
        /// Credential text, comma- or newline-separated
        text: String,
    },
    /// Connect with credentials read from a .env file
    Import { path: PathBuf },
    /// Forget a saved environment
    Remove {
        /// API key of the environment
        api_key: String,
    },
    /// Connect to a saved environment
    Switch {
        /// API key of the environment
        api_key: String,
    },
}
