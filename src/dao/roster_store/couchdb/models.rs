use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::roster::{Division, DivisionKey};

pub const ROSTER_PREFIX: &str = "roster::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[allow(dead_code)]
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

/// A division as stored in CouchDB: the roster body plus the document bookkeeping fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchRosterDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub division: Division,
}

impl CouchRosterDocument {
    pub fn new(division: Division, rev: Option<String>) -> Self {
        Self {
            id: roster_doc_id(&division.key()),
            rev,
            division,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DocumentRevision {
    #[serde(rename = "_rev")]
    pub rev: String,
    #[serde(default)]
    pub version: u64,
}

pub fn roster_doc_id(key: &DivisionKey) -> String {
    format!("{ROSTER_PREFIX}{}::{}", key.season, key.age_group)
}

/// Key prefix matching every division of `season`, or every division when `None`.
pub fn season_prefix(season: Option<&str>) -> String {
    match season {
        Some(season) => format!("{ROSTER_PREFIX}{season}::"),
        None => ROSTER_PREFIX.to_owned(),
    }
}
