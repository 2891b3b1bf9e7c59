//! Lifecycle of the single active remote session.
//!
//! State machine: `Closed -> Open -> Closed`. Repository calls hold a read
//! guard for their whole duration; opening and closing take the write guard,
//! so a credential switch waits for in-flight calls, tears the old session
//! down completely, and only then lets new calls through.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};

use super::{Connector, DocumentStore};
use crate::error::{Error, Result};
use crate::models::EnvironmentProfile;

struct OpenSession<S> {
    store: S,
    api_key: String,
}

struct Inner<S> {
    session: Option<OpenSession<S>>,
    /// Incremented on every successful open
    generation: u64,
}

/// Owns at most one open [`DocumentStore`].
pub struct RemoteConnection<C: Connector> {
    connector: Arc<C>,
    inner: Arc<RwLock<Inner<C::Store>>>,
}

impl<C: Connector> Clone for RemoteConnection<C> {
    fn clone(&self) -> Self {
        Self {
            connector: Arc::clone(&self.connector),
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Read access to the open store, valid for one generation.
pub struct SessionGuard<'a, S> {
    store: tokio::sync::RwLockReadGuard<'a, S>,
    generation: u64,
}

impl<S> SessionGuard<'_, S> {
    pub fn store(&self) -> &S {
        &self.store
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

impl<C: Connector> RemoteConnection<C> {
    /// A closed connection using `connector` for handshakes.
    pub fn new(connector: C) -> Self {
        Self {
            connector: Arc::new(connector),
            inner: Arc::new(RwLock::new(Inner {
                session: None,
                generation: 0,
            })),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Open a session for `profile`, closing any existing one first.
    ///
    /// Credentials are validated before anything is torn down. When the
    /// handshake fails the connection is left closed. Returns the new
    /// generation number.
    pub async fn open(&self, profile: &EnvironmentProfile) -> Result<u64> {
        profile.validate()?;
        let api_key = profile
            .identity()
            .ok_or_else(|| Error::Configuration("APIKEY".to_string()))?
            .to_string();

        let mut inner = self.inner.write().await;
        Self::close_locked(&mut inner).await;

        let store = self.connector.connect(profile).await.map_err(|error| match error {
            Error::Configuration(_) | Error::Connection(_) => error,
            other => Error::Connection(other.to_string()),
        })?;

        inner.generation += 1;
        inner.session = Some(OpenSession { store, api_key });
        tracing::info!(generation = inner.generation, "remote connection opened");
        Ok(inner.generation)
    }

    /// Close the active session. Closing a closed connection is a no-op.
    pub async fn close(&self) {
        let mut inner = self.inner.write().await;
        Self::close_locked(&mut inner).await;
    }

    async fn close_locked(inner: &mut Inner<C::Store>) {
        let Some(open) = inner.session.take() else {
            return;
        };
        if let Err(error) = open.store.shutdown().await {
            tracing::warn!("Remote session shutdown reported an error: {error}");
        }
        tracing::info!(generation = inner.generation, "remote connection closed");
    }

    /// Read guard on the open store.
    ///
    /// Waits while a switch is in progress; fails with
    /// [`Error::ConnectionClosed`] when nothing is open.
    pub async fn session(&self) -> Result<SessionGuard<'_, C::Store>> {
        let guard = self.inner.read().await;
        let generation = guard.generation;
        let store = RwLockReadGuard::try_map(guard, |inner| {
            inner.session.as_ref().map(|open| &open.store)
        })
        .map_err(|_| Error::ConnectionClosed)?;
        Ok(SessionGuard { store, generation })
    }

    /// Like [`Self::session`], but only for the session opened as
    /// `generation`. Calls bound to a replaced session fail instead of
    /// reaching its successor.
    pub async fn session_at(&self, generation: u64) -> Result<SessionGuard<'_, C::Store>> {
        let guard = self.session().await?;
        if guard.generation() == generation {
            Ok(guard)
        } else {
            Err(Error::ConnectionClosed)
        }
    }

    pub async fn is_open(&self) -> bool {
        self.inner.read().await.session.is_some()
    }

    /// Generation of the open session, if any.
    pub async fn generation(&self) -> Option<u64> {
        let inner = self.inner.read().await;
        inner.session.as_ref().map(|_| inner.generation)
    }

    /// API key the open session was created with.
    pub async fn api_key(&self) -> Option<String> {
        let inner = self.inner.read().await;
        inner.session.as_ref().map(|open| open.api_key.clone())
    }
}
