mod config;
mod connection;
mod error;
mod models;
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoRosterStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::DuplicateDivision { key } => {
                StorageError::conflict(format!("division {key} already exists"))
            }
            MongoDaoError::VersionConflict { message } => StorageError::conflict(message),
            MongoDaoError::DivisionNotFound { key } => {
                StorageError::not_found(format!("division {key} not found"))
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
