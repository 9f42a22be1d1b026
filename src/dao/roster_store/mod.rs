#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::storage::StorageResult;
use crate::state::roster::{Division, DivisionKey};

/// Document store holding one roster document per `(ageGroup, season)`.
pub trait RosterRepository: Send + Sync {
    /// Every division of `season`, or of all seasons when `None`.
    fn list(&self, season: Option<String>) -> BoxFuture<'static, StorageResult<Vec<Division>>>;
    fn find(&self, key: DivisionKey) -> BoxFuture<'static, StorageResult<Option<Division>>>;
    /// Insert a new division; fails with a conflict when the key is taken.
    fn create(&self, division: Division) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace the whole document, provided the stored version still equals `expected_version`.
    fn replace(
        &self,
        division: Division,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete a division and everything it owns. Returns whether a document was removed.
    fn delete(&self, key: DivisionKey) -> BoxFuture<'static, StorageResult<bool>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Message used when a replace targets a stale version.
pub(crate) fn version_conflict(key: &DivisionKey, expected: u64, actual: Option<u64>) -> String {
    match actual {
        Some(actual) => format!(
            "division {key} was modified concurrently (expected version {expected}, found {actual})"
        ),
        None => format!("division {key} was modified concurrently (expected version {expected})"),
    }
}
