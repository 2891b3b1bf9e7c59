use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] jotter_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Note ID cannot be empty")]
    EmptyNoteId,
    #[error("No text selected")]
    EmptySelection,
    #[error("Note not found: {0}")]
    NoteNotFound(String),
    #[error("Environment not found: {0}")]
    EnvironmentNotFound(String),
    #[error("Remote collection is unreachable; showing the local backup")]
    Offline,
    #[error("{0} note(s) are still waiting to be uploaded")]
    PendingNotes(usize),
}
