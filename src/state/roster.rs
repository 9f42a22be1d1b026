//! Division roster documents and the invariants every persisted snapshot must satisfy.

use std::{
    collections::{HashMap, HashSet},
    fmt::{self, Display},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Maximum number of seats on a division's selection panel.
pub const MAX_SELECTORS: usize = 5;

/// Namespace used to derive stable identifiers for legacy entries persisted without one.
const LEGACY_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6c65_6167_7565_2d72_6f73_7465_722d_6964);

/// Identifies a division: one age group within one season.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DivisionKey {
    pub age_group: String,
    pub season: String,
}

impl DivisionKey {
    /// Key of `age_group` in `season`.
    pub fn new(age_group: impl Into<String>, season: impl Into<String>) -> Self {
        Self {
            age_group: age_group.into(),
            season: season.into(),
        }
    }
}

impl Display for DivisionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.age_group, self.season)
    }
}

/// A player entry. The identifier is assigned once at creation and survives moves between pools.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub club: String,
    pub icon: Option<String>,
}

impl Player {
    /// Build a player with a freshly generated identifier.
    pub fn new(name: impl Into<String>, club: impl Into<String>, icon: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            club: club.into(),
            icon,
        }
    }
}

/// A player parked in the withdrawn pool, tagged with the reason for withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WithdrawnPlayer {
    #[serde(flatten)]
    pub player: Player,
    #[serde(default)]
    pub reason: String,
}

/// Occupant of one of a team's staff roles.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    pub club: Option<String>,
    pub icon: Option<String>,
}

/// Fixed staff roles a team can fill, one occupant each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum StaffRole {
    Coach,
    AsstCoach,
    Manager,
    Umpire,
}

impl StaffRole {
    pub const ALL: [StaffRole; 4] = [
        StaffRole::Coach,
        StaffRole::AsstCoach,
        StaffRole::Manager,
        StaffRole::Umpire,
    ];
}

impl Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StaffRole::Coach => "coach",
            StaffRole::AsstCoach => "asstCoach",
            StaffRole::Manager => "manager",
            StaffRole::Umpire => "umpire",
        };
        f.write_str(label)
    }
}

/// Staff assignments of a team.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamStaff {
    pub coach: Option<Staff>,
    pub asst_coach: Option<Staff>,
    pub manager: Option<Staff>,
    pub umpire: Option<Staff>,
}

impl TeamStaff {
    pub fn get(&self, role: StaffRole) -> Option<&Staff> {
        match role {
            StaffRole::Coach => self.coach.as_ref(),
            StaffRole::AsstCoach => self.asst_coach.as_ref(),
            StaffRole::Manager => self.manager.as_ref(),
            StaffRole::Umpire => self.umpire.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, role: StaffRole) -> &mut Option<Staff> {
        match role {
            StaffRole::Coach => &mut self.coach,
            StaffRole::AsstCoach => &mut self.asst_coach,
            StaffRole::Manager => &mut self.manager,
            StaffRole::Umpire => &mut self.umpire,
        }
    }
}

/// A team inside a division with its active player list and staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub staff: TeamStaff,
}

impl Team {
    /// Empty team with no players and no staff.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            players: Vec::new(),
            staff: TeamStaff::default(),
        }
    }
}

/// A seat on the division's selection panel.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub club: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub is_chair: bool,
}

/// Roster document for one division. Every mutation rewrites the whole document.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub age_group: String,
    pub season: String,
    /// Incremented by the store on every successful replace.
    #[serde(default)]
    pub version: u64,
    /// Human readable timestamp of the last write.
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub shadow_players: Vec<Player>,
    #[serde(default)]
    pub withdrawn: Vec<WithdrawnPlayer>,
    #[serde(default)]
    pub selectors: Vec<Selector>,
    #[schema(value_type = Option<Object>)]
    pub trial_info: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub training_info: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub tournament_info: Option<Value>,
}

impl Division {
    /// Create an empty division for the given age group and season.
    pub fn new(age_group: impl Into<String>, season: impl Into<String>) -> Self {
        Self {
            age_group: age_group.into(),
            season: season.into(),
            version: 0,
            last_updated: String::new(),
            teams: Vec::new(),
            shadow_players: Vec::new(),
            withdrawn: Vec::new(),
            selectors: Vec::new(),
            trial_info: None,
            training_info: None,
            tournament_info: None,
        }
    }

    /// The `(ageGroup, season)` pair identifying this division.
    pub fn key(&self) -> DivisionKey {
        DivisionKey::new(self.age_group.clone(), self.season.clone())
    }

    /// Team named `name`, compared after trimming.
    pub fn team(&self, name: &str) -> Option<&Team> {
        let name = name.trim();
        self.teams.iter().find(|team| team.name.trim() == name)
    }

    /// Mutable counterpart of [`Division::team`].
    pub fn team_mut(&mut self, name: &str) -> Option<&mut Team> {
        let name = name.trim();
        self.teams.iter_mut().find(|team| team.name.trim() == name)
    }

    /// Number of selectors currently flagged as chair.
    pub fn chair_count(&self) -> usize {
        self.selectors.iter().filter(|s| s.is_chair).count()
    }

    /// Player identifiers that occur more than once across teams, shadow and withdrawn pools.
    pub fn placement_conflicts(&self) -> Vec<Uuid> {
        let mut seen: HashMap<Uuid, usize> = HashMap::new();
        let players = self
            .teams
            .iter()
            .flat_map(|team| team.players.iter())
            .chain(self.shadow_players.iter())
            .chain(self.withdrawn.iter().map(|w| &w.player));
        for player in players {
            *seen.entry(player.id).or_default() += 1;
        }

        let mut conflicts: Vec<Uuid> = seen
            .into_iter()
            .filter_map(|(id, count)| (count > 1).then_some(id))
            .collect();
        conflicts.sort();
        conflicts
    }

    /// Verify unique team names, placement exclusivity, the single-chair rule and the panel
    /// capacity.
    pub fn check_invariants(&self) -> Result<(), RosterError> {
        let mut names = HashSet::new();
        if let Some(team) = self.teams.iter().find(|t| !names.insert(t.name.trim())) {
            return Err(RosterError::InvariantViolated(format!(
                "team `{}` appears more than once in {}",
                team.name.trim(),
                self.key()
            )));
        }

        let conflicts = self.placement_conflicts();
        if let Some(id) = conflicts.first() {
            return Err(RosterError::InvariantViolated(format!(
                "player `{id}` is placed more than once in {}",
                self.key()
            )));
        }

        let chairs = self.chair_count();
        if chairs > 1 {
            return Err(RosterError::InvariantViolated(format!(
                "{chairs} chairs on the selection panel of {}",
                self.key()
            )));
        }

        if self.selectors.len() > MAX_SELECTORS {
            return Err(RosterError::InvariantViolated(format!(
                "{} selectors exceed the panel capacity of {MAX_SELECTORS}",
                self.selectors.len()
            )));
        }

        Ok(())
    }

    /// Assign stable identifiers to entries persisted before identifiers existed.
    ///
    /// Identifiers are derived from the division key, pool and position so repeated loads of
    /// the same legacy document yield the same ids until the document is written back.
    /// Returns whether any identifier was assigned.
    pub fn backfill_ids(&mut self) -> bool {
        let prefix = format!("{}/{}", self.season, self.age_group);
        let mut assigned = false;
        let mut derive = |id: &mut Uuid, path: String| {
            if id.is_nil() {
                *id = Uuid::new_v5(&LEGACY_ID_NAMESPACE, format!("{prefix}/{path}").as_bytes());
                assigned = true;
            }
        };

        for team in self.teams.iter_mut() {
            for (index, player) in team.players.iter_mut().enumerate() {
                derive(&mut player.id, format!("team/{}/{index}/{}", team.name, player.name));
            }
            for role in StaffRole::ALL {
                if let Some(staff) = team.staff.slot_mut(role) {
                    derive(&mut staff.id, format!("staff/{}/{role}/{}", team.name, staff.name));
                }
            }
        }
        for (index, player) in self.shadow_players.iter_mut().enumerate() {
            derive(&mut player.id, format!("shadow/{index}/{}", player.name));
        }
        for (index, withdrawn) in self.withdrawn.iter_mut().enumerate() {
            derive(
                &mut withdrawn.player.id,
                format!("withdrawn/{index}/{}", withdrawn.player.name),
            );
        }
        for (index, selector) in self.selectors.iter_mut().enumerate() {
            derive(&mut selector.id, format!("selector/{index}/{}", selector.name));
        }

        assigned
    }
}

/// Failures raised while computing a new division snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("division {0} not found")]
    DivisionNotFound(DivisionKey),
    #[error("team `{0}` not found")]
    TeamNotFound(String),
    #[error("team `{0}` already exists")]
    DuplicateTeam(String),
    #[error("player `{0}` not found")]
    PlayerNotFound(Uuid),
    #[error("selector `{0}` not found")]
    SelectorNotFound(Uuid),
    #[error("the selection panel already has {MAX_SELECTORS} selectors")]
    SelectorCapReached,
    #[error("{0} must not be empty")]
    EmptyName(&'static str),
    #[error("moving to a team requires a destination team name")]
    MissingDestinationTeam,
    #[error("cannot move a player from {from} into {to}")]
    CrossDivisionMove { from: DivisionKey, to: DivisionKey },
    #[error("roster invariant violated: {0}")]
    InvariantViolated(String),
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn player(name: &str) -> Player {
        Player::new(name, "Riverside", None)
    }

    pub fn selector(name: &str, is_chair: bool) -> Selector {
        Selector {
            id: Uuid::new_v4(),
            name: name.into(),
            club: "Riverside".into(),
            icon: None,
            is_chair,
        }
    }

    /// U15 division with teams Green and Gold, all pools empty.
    pub fn u15() -> Division {
        let mut division = Division::new("U15", "2026");
        division.teams.push(Team::new("Green"));
        division.teams.push(Team::new("Gold"));
        division
    }
}

#[cfg(test)]
mod tests {
    use super::{fixtures::*, *};

    #[test]
    fn placement_conflicts_detects_player_in_two_pools() {
        let mut division = u15();
        let alice = player("Alice");
        division.teams[0].players.push(alice.clone());
        division.shadow_players.push(alice.clone());

        assert_eq!(division.placement_conflicts(), vec![alice.id]);
        assert!(matches!(
            division.check_invariants(),
            Err(RosterError::InvariantViolated(_))
        ));
    }

    #[test]
    fn team_names_must_be_unique_after_trimming() {
        let mut division = u15();
        division.teams.push(Team::new(" Green "));

        assert!(matches!(
            division.check_invariants(),
            Err(RosterError::InvariantViolated(message)) if message.contains("`Green`")
        ));
    }

    #[test]
    fn two_chairs_violate_invariants() {
        let mut division = u15();
        division.selectors.push(selector("Ann", true));
        division.selectors.push(selector("Ben", true));

        assert_eq!(division.chair_count(), 2);
        assert!(division.check_invariants().is_err());
    }

    #[test]
    fn legacy_document_without_ids_gets_stable_ids() {
        let raw = r#"{
            "ageGroup": "U13",
            "season": "2025",
            "teams": [{ "name": "Blue", "players": [{ "name": "Cara", "club": "North" }],
                        "staff": { "asstCoach": { "name": "Dee" } } }],
            "shadowPlayers": [{ "name": "Eli", "club": "South" }],
            "withdrawn": [{ "name": "Fay", "club": "East", "reason": "Injured" }],
            "selectors": [{ "name": "Gus", "club": "West", "isChair": true }]
        }"#;

        let mut first: Division = serde_json::from_str(raw).unwrap();
        let mut second: Division = serde_json::from_str(raw).unwrap();
        assert!(first.teams[0].players[0].id.is_nil());

        assert!(first.backfill_ids());
        second.backfill_ids();

        assert_eq!(first, second);
        assert!(!first.teams[0].players[0].id.is_nil());
        assert!(!first.teams[0].staff.asst_coach.as_ref().unwrap().id.is_nil());
        assert_eq!(first.withdrawn[0].reason, "Injured");
        assert!(first.selectors[0].is_chair);
        assert!(!first.backfill_ids());
    }

    #[test]
    fn serializes_camel_case_document() {
        let mut division = u15();
        division.withdrawn.push(WithdrawnPlayer {
            player: player("Bob"),
            reason: "Injured".into(),
        });

        let value = serde_json::to_value(&division).unwrap();
        assert_eq!(value["ageGroup"], "U15");
        assert!(value["shadowPlayers"].as_array().unwrap().is_empty());
        assert_eq!(value["withdrawn"][0]["name"], "Bob");
        assert_eq!(value["withdrawn"][0]["reason"], "Injured");
        assert!(value.get("trialInfo").is_none());
    }
}
