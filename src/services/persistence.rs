//! Whole-document writes against the roster repository. Every write is bounded by the
//! configured timeout and reported through the shared save status.

use std::future::Future;

use time::{OffsetDateTime, UtcOffset, macros::format_description};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::{
    dao::storage::StorageResult,
    error::ServiceError,
    state::{
        SharedState,
        roster::{Division, DivisionKey},
    },
};

/// Render a write time the way it is shown to administrators, e.g. `19 October 2026, 14:05 UTC`.
pub fn format_last_updated(at: OffsetDateTime) -> String {
    at.to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[day padding:none] [month repr:long] [year], [hour]:[minute] UTC"
        ))
        .unwrap_or_else(|_| "unknown".into())
}

/// Write `next` over the stored document it was derived from.
///
/// `next.version` must still hold the version that was read; the stored copy receives the
/// incremented version and a fresh `lastUpdated`. Returns exactly what was written.
pub async fn replace(state: &SharedState, mut next: Division) -> Result<Division, ServiceError> {
    let repository = state.require_repository().await?;
    let expected_version = next.version;
    next.version = expected_version + 1;
    next.last_updated = format_last_updated(OffsetDateTime::now_utc());

    let key = next.key();
    let written = next.clone();
    tracked_write(state, &key, repository.replace(next, expected_version)).await?;
    debug!(
        age_group = %key.age_group,
        season = %key.season,
        version = written.version,
        "division replaced"
    );
    Ok(written)
}

/// Store a brand new division at version 0.
pub async fn create(state: &SharedState, mut division: Division) -> Result<Division, ServiceError> {
    let repository = state.require_repository().await?;
    division.version = 0;
    division.last_updated = format_last_updated(OffsetDateTime::now_utc());

    let key = division.key();
    let written = division.clone();
    tracked_write(state, &key, repository.create(division)).await?;
    Ok(written)
}

/// Remove a division and everything it owns. Returns whether a document existed.
pub async fn delete(state: &SharedState, key: &DivisionKey) -> Result<bool, ServiceError> {
    let repository = state.require_repository().await?;
    tracked_write(state, key, repository.delete(key.clone())).await
}

/// Run a repository read bounded by the configured timeout.
pub async fn bounded<T, F>(state: &SharedState, read: F) -> Result<T, ServiceError>
where
    F: Future<Output = StorageResult<T>>,
{
    match timeout(state.write_timeout(), read).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(ServiceError::Timeout),
    }
}

async fn tracked_write<T, F>(
    state: &SharedState,
    key: &DivisionKey,
    write: F,
) -> Result<T, ServiceError>
where
    F: Future<Output = StorageResult<T>>,
{
    let tracker = state.save_status();
    let ticket = tracker.begin();

    let result = bounded(state, write).await;
    match &result {
        Ok(_) => tracker.succeed(ticket),
        Err(err) => {
            warn!(
                age_group = %key.age_group,
                season = %key.season,
                error = %err,
                "division write failed"
            );
            tracker.fail(ticket, err.to_string());
        }
    }
    result
}
