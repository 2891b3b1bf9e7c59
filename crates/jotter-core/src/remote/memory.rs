//! In-process document database with failure injection.
//!
//! Used by the test suites and by the CLI's offline demo mode. Data is kept
//! per project id, so switching between profiles of different projects shows
//! different collections.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use super::{Connector, Document, DocumentStore};
use crate::error::{Error, Result};
use crate::models::EnvironmentProfile;

type Collections = BTreeMap<String, BTreeMap<String, Document>>;

#[derive(Debug, Default)]
struct CloudState {
    projects: BTreeMap<String, Collections>,
    rejected_keys: BTreeSet<String>,
    fail_reads: bool,
    fail_writes: bool,
    events: Vec<String>,
}

/// Shared backing data for every store opened by a [`MemoryConnector`].
#[derive(Debug, Clone, Default)]
pub struct MemoryCloud {
    state: Arc<Mutex<CloudState>>,
}

impl MemoryCloud {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CloudState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handshakes with this API key fail.
    pub fn reject_api_key(&self, api_key: &str) {
        self.lock().rejected_keys.insert(api_key.to_string());
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Ordered log of connects, shutdowns, and operations.
    pub fn events(&self) -> Vec<String> {
        self.lock().events.clone()
    }

    /// Seed a document directly, bypassing failure injection.
    pub fn insert(&self, project: &str, collection: &str, id: &str, record: Document) {
        self.lock()
            .projects
            .entry(project.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), record);
    }

    /// Copy of one collection.
    pub fn documents(&self, project: &str, collection: &str) -> BTreeMap<String, Document> {
        self.lock()
            .projects
            .get(project)
            .and_then(|collections| collections.get(collection))
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct MemoryConnector {
    cloud: MemoryCloud,
}

impl MemoryConnector {
    pub const fn new(cloud: MemoryCloud) -> Self {
        Self { cloud }
    }

    pub const fn cloud(&self) -> &MemoryCloud {
        &self.cloud
    }
}

impl Connector for MemoryConnector {
    type Store = MemoryDocumentStore;

    async fn connect(&self, profile: &EnvironmentProfile) -> Result<Self::Store> {
        let api_key = profile.api_key.clone().unwrap_or_default();
        let project = profile.project_id.clone().unwrap_or_default();

        let mut state = self.cloud.lock();
        if state.rejected_keys.contains(&api_key) {
            return Err(Error::Connection(format!("API key '{api_key}' was rejected")));
        }
        state.events.push(format!("connect:{api_key}"));
        drop(state);

        Ok(MemoryDocumentStore {
            cloud: self.cloud.clone(),
            api_key,
            project,
            closed: AtomicBool::new(false),
        })
    }
}

#[derive(Debug)]
pub struct MemoryDocumentStore {
    cloud: MemoryCloud,
    api_key: String,
    project: String,
    closed: AtomicBool,
}

impl MemoryDocumentStore {
    fn begin(&self, op: &str, collection: &str, write: bool) -> Result<MutexGuard<'_, CloudState>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::ConnectionClosed);
        }
        let mut state = self.cloud.lock();
        if write && state.fail_writes {
            return Err(Error::RemoteWrite("simulated network error".into()));
        }
        if !write && state.fail_reads {
            return Err(Error::RemoteRead("simulated network error".into()));
        }
        state
            .events
            .push(format!("{op}:{}:{collection}", self.api_key));
        Ok(state)
    }

    fn collection<'a>(&self, state: &'a mut CloudState, collection: &str) -> &'a mut BTreeMap<String, Document> {
        state
            .projects
            .entry(self.project.clone())
            .or_default()
            .entry(collection.to_string())
            .or_default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    async fn add_document(&self, collection: &str, record: Document) -> Result<String> {
        let mut state = self.begin("add", collection, true)?;
        let id = Uuid::now_v7().simple().to_string();
        self.collection(&mut state, collection)
            .insert(id.clone(), record);
        Ok(id)
    }

    async fn get_all_documents(&self, collection: &str) -> Result<Vec<(String, Document)>> {
        let mut state = self.begin("get_all", collection, false)?;
        Ok(self
            .collection(&mut state, collection)
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect())
    }

    async fn update_document(&self, collection: &str, id: &str, partial: Document) -> Result<()> {
        let mut state = self.begin("update", collection, true)?;
        let record = self
            .collection(&mut state, collection)
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        record.extend(partial);
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        let mut state = self.begin("delete", collection, true)?;
        self.collection(&mut state, collection).remove(id);
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.cloud
            .lock()
            .events
            .push(format!("shutdown:{}", self.api_key));
        Ok(())
    }
}
