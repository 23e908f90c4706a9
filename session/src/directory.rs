//! User directory cache.
//!
//! Session-scoped cache of enrolled names. Fetched once at startup and
//! updated optimistically after a successful enrollment; `reload` re-fetches
//! from the server when strict reconciliation is wanted. A failed load
//! leaves any previous content untouched.

use std::collections::BTreeSet;

use voiceid_gateway::Client;

use crate::error::SessionError;

/// Cache of enrolled user names.
///
/// Names are unique; insertion order is irrelevant (kept sorted for stable
/// listing). Only the session controller mutates the cache.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    users: BTreeSet<String>,
    loaded: bool,
}

impl Directory {
    /// Creates an empty, unloaded directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches the full user set, replacing the cache content.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::DirectoryUnavailable`] on any non-2xx or
    /// transport failure; the previous cache content is left untouched.
    pub async fn load(&mut self, client: &Client) -> Result<(), SessionError> {
        match client.users().await {
            Ok(names) => {
                self.users = names.into_iter().filter(|n| !n.is_empty()).collect();
                self.loaded = true;
                tracing::debug!(count = self.users.len(), "user directory loaded");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "user directory unavailable");
                Err(SessionError::DirectoryUnavailable(e))
            }
        }
    }

    /// Re-fetches from the server to reconcile optimistic inserts.
    pub async fn reload(&mut self, client: &Client) -> Result<(), SessionError> {
        self.load(client).await
    }

    /// Records a successful enrollment locally. Idempotent; never removes
    /// entries and performs no network call. Returns true if the name was
    /// newly inserted.
    pub fn record_enrollment(&mut self, name: &str) -> bool {
        let inserted = self.users.insert(name.to_string());
        if inserted {
            tracing::debug!(name, "enrollment recorded in directory");
        }
        inserted
    }

    /// Returns true if `name` is an enrolled user.
    pub fn contains(&self, name: &str) -> bool {
        self.users.contains(name)
    }

    /// Returns the cached names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.users.iter().cloned().collect()
    }

    /// Returns true once an initial fetch has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of cached names.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns true if no names are cached.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
