//! Remote document database access.
//!
//! The database is a plain document-collection service. [`Connector`]
//! performs the handshake for one credential set and yields a
//! [`DocumentStore`]; [`RemoteConnection`] owns the single active store.

mod connection;
pub mod firestore;
pub mod memory;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::EnvironmentProfile;

pub use connection::{RemoteConnection, SessionGuard};

/// A document body: field name to JSON value.
pub type Document = Map<String, Value>;

/// Collection holding notes.
pub const NOTES_COLLECTION: &str = "Notes";
/// Collection holding uploaded image references (`{url, signature}`).
pub const IMAGES_COLLECTION: &str = "Images";

/// CRUD over named document collections.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Insert a document and return its generated id.
    async fn add_document(&self, collection: &str, record: Document) -> Result<String>;

    /// Every document of a collection with its id.
    async fn get_all_documents(&self, collection: &str) -> Result<Vec<(String, Document)>>;

    /// Merge `partial` into an existing document.
    async fn update_document(&self, collection: &str, id: &str, partial: Document) -> Result<()>;

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()>;

    /// Release the session; later calls on this store must fail.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// Opens a [`DocumentStore`] for a credential set.
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Store: DocumentStore;

    /// Perform the handshake. Credentials have already been validated.
    async fn connect(&self, profile: &EnvironmentProfile) -> Result<Self::Store>;
}
