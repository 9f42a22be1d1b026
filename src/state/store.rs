//! Canonical in-memory snapshot of every loaded division.

use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::state::{
    commands::{self, Outcome, RosterCommand, RosterPolicy},
    roster::{Division, DivisionKey, RosterError},
};

/// Owns the division snapshot shared by every request handler.
///
/// Commands are computed against the snapshot without publishing the result; the snapshot only
/// changes through [`RosterStore::upsert`], [`RosterStore::remove`] or a full resync once the
/// repository accepted a write.
pub struct RosterStore {
    divisions: RwLock<IndexMap<DivisionKey, Division>>,
    policy: RosterPolicy,
}

impl RosterStore {
    /// Empty snapshot applying commands under `policy`.
    pub fn new(policy: RosterPolicy) -> Self {
        Self {
            divisions: RwLock::new(IndexMap::new()),
            policy,
        }
    }

    /// Snapshot of one division, if loaded.
    pub async fn get(&self, key: &DivisionKey) -> Option<Division> {
        self.divisions.read().await.get(key).cloned()
    }

    /// Divisions of `season`, or of every season when `None`, ordered by age group.
    pub async fn list(&self, season: Option<&str>) -> Vec<Division> {
        let guard = self.divisions.read().await;
        let mut divisions: Vec<Division> = guard
            .values()
            .filter(|division| season.is_none_or(|season| division.season == season))
            .cloned()
            .collect();
        divisions.sort_by(|a, b| a.key().cmp(&b.key()));
        divisions
    }

    /// Compute the effect of `command` on the current snapshot of `key`.
    pub async fn apply(
        &self,
        key: &DivisionKey,
        command: &RosterCommand,
    ) -> Result<Outcome, RosterError> {
        let guard = self.divisions.read().await;
        let division = guard
            .get(key)
            .ok_or_else(|| RosterError::DivisionNotFound(key.clone()))?;
        commands::apply(division, command, &self.policy)
    }

    /// Insert or overwrite a single division.
    pub async fn upsert(&self, division: Division) {
        let mut guard = self.divisions.write().await;
        guard.insert(division.key(), division);
    }

    /// Drop a division from the snapshot.
    pub async fn remove(&self, key: &DivisionKey) -> Option<Division> {
        let mut guard = self.divisions.write().await;
        guard.shift_remove(key)
    }

    /// Replace every division of `season` (or everything when `None`) with freshly fetched
    /// documents.
    pub async fn resync(&self, season: Option<&str>, divisions: Vec<Division>) {
        let mut guard = self.divisions.write().await;
        guard.retain(|key, _| season.is_some_and(|season| key.season != season));
        for mut division in divisions {
            division.backfill_ids();
            guard.insert(division.key(), division);
        }
    }
}
