//! In-memory statement fetcher.
//!
//! Serves tokens from maps keyed by entity id (configurations) and by
//! `(authority, subject)` (subordinate statements). Useful for resolving
//! against a bundle of statements collected earlier, and in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::entity::EntityId;
use crate::error::FetchError;

use super::StatementFetcher;

/// Fetcher backed by in-memory maps.
///
/// The maps hold plain tokens, so a lock poisoned by a panicking writer is
/// recovered rather than reported.
#[derive(Debug, Default)]
pub struct InMemoryFetcher {
    configurations: RwLock<HashMap<EntityId, String>>,
    subordinates: RwLock<HashMap<(EntityId, EntityId), String>>,
    failures: RwLock<HashMap<(EntityId, EntityId), FetchError>>,
    fetches: AtomicUsize,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the configuration statement of `entity`.
    pub fn insert_configuration(&self, entity: impl Into<EntityId>, token: impl Into<String>) {
        self.configurations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity.into(), token.into());
    }

    /// Register the statement `authority` issued about `subject`.
    pub fn insert_subordinate(
        &self,
        authority: impl Into<EntityId>,
        subject: impl Into<EntityId>,
        token: impl Into<String>,
    ) {
        self.subordinates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((authority.into(), subject.into()), token.into());
    }

    /// Make the subordinate fetch for `(authority, subject)` fail with `error`.
    pub fn fail_subordinate(
        &self,
        authority: impl Into<EntityId>,
        subject: impl Into<EntityId>,
        error: FetchError,
    ) {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((authority.into(), subject.into()), error);
    }

    /// Total number of fetch calls served (successful or not).
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatementFetcher for InMemoryFetcher {
    async fn fetch_configuration_statement(
        &self,
        entity: &EntityId,
    ) -> Result<String, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.configurations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("configuration of {entity}")))
    }

    async fn fetch_subordinate_statement(
        &self,
        authority: &EntityId,
        subject: &EntityId,
    ) -> Result<String, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let key = (authority.clone(), subject.clone());
        let injected = self
            .failures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(err) = injected {
            return Err(err);
        }
        self.subordinates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("statement by {authority} about {subject}")))
    }
}
