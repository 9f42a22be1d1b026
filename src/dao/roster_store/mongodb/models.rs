use mongodb::{
    bson::{Document, doc},
    error::{Error as MongoError, ErrorKind, WriteFailure},
};

use crate::state::roster::DivisionKey;

/// Server error code reported when a unique index rejects a write.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Filter matching the document of one division.
pub fn key_filter(key: &DivisionKey) -> Document {
    doc! { "ageGroup": &key.age_group, "season": &key.season }
}

/// Filter matching the document of one division at a given version.
pub fn versioned_filter(key: &DivisionKey, version: u64) -> Document {
    let mut filter = key_filter(key);
    filter.insert("version", version as i64);
    filter
}

pub fn season_filter(season: Option<&str>) -> Document {
    match season {
        Some(season) => doc! { "season": season },
        None => doc! {},
    }
}

pub fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}
