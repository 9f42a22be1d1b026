mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::CouchDaoError;
pub use store::CouchRosterStore;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        match err {
            CouchDaoError::DocumentConflict { .. }
            | CouchDaoError::DuplicateDivision { .. }
            | CouchDaoError::VersionConflict { .. } => StorageError::conflict(err.to_string()),
            CouchDaoError::DivisionNotFound { .. } => StorageError::not_found(err.to_string()),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
