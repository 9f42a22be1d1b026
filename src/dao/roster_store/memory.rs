//! Process-local repository used for local runs and tests.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;

use super::{RosterRepository, version_conflict};
use crate::{
    dao::storage::{StorageError, StorageResult},
    state::roster::{Division, DivisionKey},
};

#[derive(Clone, Default)]
pub struct InMemoryRosterStore {
    documents: Arc<DashMap<DivisionKey, Division>>,
}

impl InMemoryRosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing documents, as persisted.
    pub fn with_documents(documents: impl IntoIterator<Item = Division>) -> Self {
        let store = Self::new();
        for division in documents {
            store.documents.insert(division.key(), division);
        }
        store
    }
}

impl RosterRepository for InMemoryRosterStore {
    fn list(&self, season: Option<String>) -> BoxFuture<'static, StorageResult<Vec<Division>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut divisions: Vec<Division> = store
                .documents
                .iter()
                .filter(|entry| season.as_ref().is_none_or(|s| &entry.key().season == s))
                .map(|entry| entry.value().clone())
                .collect();
            divisions.sort_by(|a, b| a.key().cmp(&b.key()));
            Ok(divisions)
        })
    }

    fn find(&self, key: DivisionKey) -> BoxFuture<'static, StorageResult<Option<Division>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.documents.get(&key).map(|entry| entry.clone())) })
    }

    fn create(&self, division: Division) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            match store.documents.entry(division.key()) {
                Entry::Occupied(entry) => Err(StorageError::conflict(format!(
                    "division {} already exists",
                    entry.key()
                ))),
                Entry::Vacant(entry) => {
                    entry.insert(division);
                    Ok(())
                }
            }
        })
    }

    fn replace(
        &self,
        division: Division,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let key = division.key();
            let Some(mut stored) = store.documents.get_mut(&key) else {
                return Err(StorageError::not_found(format!("division {key} not found")));
            };
            if stored.version != expected_version {
                return Err(StorageError::conflict(version_conflict(
                    &key,
                    expected_version,
                    Some(stored.version),
                )));
            }
            *stored = division;
            Ok(())
        })
    }

    fn delete(&self, key: DivisionKey) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.documents.remove(&key).is_some()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
