//! Data models for Jotter

mod note;
mod profile;

pub use note::{Note, NoteId};
pub use profile::{
    parse_pairs, Delimiter, EnvironmentProfile, ImageServiceCredentials, PROFILE_SEPARATOR,
    REQUIRED_KEYS,
};
