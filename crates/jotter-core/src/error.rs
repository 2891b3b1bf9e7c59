//! Error types for jotter-core

use thiserror::Error;

use crate::notifications::{Notice, NoticeDuration, NoticeLevel};

/// Result type alias using jotter-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in jotter-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Required credential fields are missing
    #[error("Missing required environment variables: {0}")]
    Configuration(String),

    /// Handshake with the remote document database failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// The remote connection is closed or was replaced by a newer one
    #[error("Remote connection is closed")]
    ConnectionClosed,

    /// Reading from the remote collection failed
    #[error("Error getting documents: {0}")]
    RemoteRead(String),

    /// Writing to the remote collection failed
    #[error("Error writing document: {0}")]
    RemoteWrite(String),

    /// Image upload or deletion failed
    #[error("Image upload failed: {0}")]
    Upload(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Local durable storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Whether the failure was absorbed locally (backup or overflow buffer).
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::RemoteRead(_) | Self::RemoteWrite(_) | Self::Upload(_))
    }

    /// User-facing transient notice for this error.
    pub fn notice(&self) -> Notice {
        let level = if self.is_recoverable() {
            NoticeLevel::Warning
        } else {
            NoticeLevel::Danger
        };
        Notice::new(level, self.to_string(), NoticeDuration::Long)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_lists_missing_fields() {
        let error = Error::Configuration("APIKEY, APPID".to_string());
        assert_eq!(
            error.to_string(),
            "Missing required environment variables: APIKEY, APPID"
        );
    }

    #[test]
    fn recoverable_errors_map_to_warnings() {
        let notice = Error::RemoteRead("offline".to_string()).notice();
        assert_eq!(notice.level, NoticeLevel::Warning);

        let notice = Error::Connection("bad key".to_string()).notice();
        assert_eq!(notice.level, NoticeLevel::Danger);
        assert_eq!(notice.duration, NoticeDuration::Long);
    }
}
