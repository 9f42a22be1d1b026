use mongodb::error::Error as MongoError;
use thiserror::Error;

use crate::state::roster::DivisionKey;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to list divisions")]
    ListDivisions {
        #[source]
        source: MongoError,
    },
    #[error("failed to load division {key}")]
    LoadDivision {
        key: DivisionKey,
        #[source]
        source: MongoError,
    },
    #[error("failed to save division {key}")]
    SaveDivision {
        key: DivisionKey,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete division {key}")]
    DeleteDivision {
        key: DivisionKey,
        #[source]
        source: MongoError,
    },
    #[error("division {key} already exists")]
    DuplicateDivision { key: DivisionKey },
    #[error("division {key} not found")]
    DivisionNotFound { key: DivisionKey },
    #[error("{message}")]
    VersionConflict { message: String },
}
