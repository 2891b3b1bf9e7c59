//! jotter-core - Core library for Jotter
//!
//! This crate holds the note model, the reconciliation of the in-memory list
//! with a remote document collection, the local backup and overflow cache,
//! environment (credential) switching, and the remote and image adapters
//! used by every Jotter interface.

pub mod config;
pub mod environments;
pub mod error;
pub mod media;
pub mod messaging;
pub mod models;
pub mod notifications;
pub mod remote;
pub mod repository;
pub mod search;
pub mod session;
pub mod state;
pub mod storage;
pub mod util;
pub mod view;

pub use error::{Error, Result};
pub use models::{EnvironmentProfile, Note, NoteId};
pub use session::Session;
