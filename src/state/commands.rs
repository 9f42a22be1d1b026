//! Roster mutations as pure functions of a division snapshot.
//!
//! [`apply`] never touches its input: it returns either a new snapshot that satisfies every
//! roster invariant or a reason why nothing changed.

use serde_json::Value;
use uuid::Uuid;

use crate::state::{
    placement::{self, MoveRequest, NoOp, Transition},
    roster::{
        Division, Player, RosterError, Selector, Staff, StaffRole, Team, WithdrawnPlayer,
    },
    selectors,
};

/// Default reason recorded when a player is withdrawn without one.
pub const DEFAULT_WITHDRAWN_REASON: &str = "No reason given";

/// Tunables applied while computing roster mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterPolicy {
    pub withdrawn_reason_fallback: String,
}

impl Default for RosterPolicy {
    fn default() -> Self {
        Self {
            withdrawn_reason_fallback: DEFAULT_WITHDRAWN_REASON.into(),
        }
    }
}

/// Free-form information blocks attached to a division. `None` leaves a block untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoUpdate {
    pub trial_info: Option<Value>,
    pub training_info: Option<Value>,
    pub tournament_info: Option<Value>,
}

/// Every mutation a division document supports.
#[derive(Debug, Clone, PartialEq)]
pub enum RosterCommand {
    MovePlayer(MoveRequest),
    AddTeam { name: String },
    RenameTeam { team: String, name: String },
    DeleteTeam { team: String },
    AddPlayer { team: String, player: Player },
    UpdatePlayer { team: String, id: Uuid, player: Player },
    DeletePlayer { team: String, id: Uuid },
    AssignStaff { team: String, role: StaffRole, staff: Staff },
    RemoveStaff { team: String, role: StaffRole },
    AddShadowPlayer { player: Player },
    UpdateShadowPlayer { id: Uuid, player: Player },
    DeleteShadowPlayer { id: Uuid },
    AddWithdrawnPlayer { player: Player, reason: Option<String> },
    DeleteWithdrawnPlayer { id: Uuid },
    AddSelector { selector: Selector },
    UpdateSelector { id: Uuid, selector: Selector },
    SetChair { id: Uuid },
    DeleteSelector { id: Uuid },
    UpdateInfo(InfoUpdate),
}

impl RosterCommand {
    /// Short label used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            RosterCommand::MovePlayer(_) => "move_player",
            RosterCommand::AddTeam { .. } => "add_team",
            RosterCommand::RenameTeam { .. } => "rename_team",
            RosterCommand::DeleteTeam { .. } => "delete_team",
            RosterCommand::AddPlayer { .. } => "add_player",
            RosterCommand::UpdatePlayer { .. } => "update_player",
            RosterCommand::DeletePlayer { .. } => "delete_player",
            RosterCommand::AssignStaff { .. } => "assign_staff",
            RosterCommand::RemoveStaff { .. } => "remove_staff",
            RosterCommand::AddShadowPlayer { .. } => "add_shadow_player",
            RosterCommand::UpdateShadowPlayer { .. } => "update_shadow_player",
            RosterCommand::DeleteShadowPlayer { .. } => "delete_shadow_player",
            RosterCommand::AddWithdrawnPlayer { .. } => "add_withdrawn_player",
            RosterCommand::DeleteWithdrawnPlayer { .. } => "delete_withdrawn_player",
            RosterCommand::AddSelector { .. } => "add_selector",
            RosterCommand::UpdateSelector { .. } => "update_selector",
            RosterCommand::SetChair { .. } => "set_chair",
            RosterCommand::DeleteSelector { .. } => "delete_selector",
            RosterCommand::UpdateInfo(_) => "update_info",
        }
    }
}

/// Result of applying a command to a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The command produced a new snapshot that must be persisted.
    Applied(Division),
    /// Nothing changed; no write is needed.
    Unchanged(NoOp),
}

/// Compute the snapshot produced by `command`.
pub fn apply(
    division: &Division,
    command: &RosterCommand,
    policy: &RosterPolicy,
) -> Result<Outcome, RosterError> {
    let mut next = division.clone();
    if let Some(reason) = mutate(&mut next, command, policy)? {
        return Ok(Outcome::Unchanged(reason));
    }
    next.check_invariants()?;
    Ok(Outcome::Applied(next))
}

fn mutate(
    division: &mut Division,
    command: &RosterCommand,
    policy: &RosterPolicy,
) -> Result<Option<NoOp>, RosterError> {
    match command.clone() {
        RosterCommand::MovePlayer(request) => {
            match placement::move_player(division, &request, &policy.withdrawn_reason_fallback)? {
                Transition::Moved(moved) => *division = moved,
                Transition::Unchanged(reason) => return Ok(Some(reason)),
            }
        }
        RosterCommand::AddTeam { name } => {
            let name = required(name, "team name")?;
            if division.team(&name).is_some() {
                return Err(RosterError::DuplicateTeam(name));
            }
            division.teams.push(Team::new(name));
        }
        RosterCommand::RenameTeam { team, name } => {
            let name = required(name, "team name")?;
            let index = division
                .teams
                .iter()
                .position(|t| t.name.trim() == team.trim())
                .ok_or_else(|| RosterError::TeamNotFound(team.trim().to_owned()))?;
            let taken = division
                .teams
                .iter()
                .enumerate()
                .any(|(i, t)| i != index && t.name.trim() == name);
            if taken {
                return Err(RosterError::DuplicateTeam(name));
            }
            division.teams[index].name = name;
        }
        RosterCommand::DeleteTeam { team } => {
            let index = division
                .teams
                .iter()
                .position(|t| t.name.trim() == team.trim())
                .ok_or_else(|| RosterError::TeamNotFound(team.clone()))?;
            division.teams.remove(index);
        }
        RosterCommand::AddPlayer { team, player } => {
            let player = new_player(player)?;
            team_mut(division, &team)?.players.push(player);
        }
        RosterCommand::UpdatePlayer { team, id, player } => {
            let player = replacement(player, id)?;
            let slot = team_mut(division, &team)?
                .players
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(RosterError::PlayerNotFound(id))?;
            *slot = player;
        }
        RosterCommand::DeletePlayer { team, id } => {
            let players = &mut team_mut(division, &team)?.players;
            let index = players
                .iter()
                .position(|p| p.id == id)
                .ok_or(RosterError::PlayerNotFound(id))?;
            players.remove(index);
        }
        RosterCommand::AssignStaff { team, role, mut staff } => {
            staff.name = required(staff.name, "staff name")?;
            let slot = team_mut(division, &team)?.staff.slot_mut(role);
            // Re-assigning the same person keeps their identifier.
            staff.id = match slot.as_ref() {
                Some(existing) if staff.id.is_nil() && existing.name == staff.name => existing.id,
                _ if staff.id.is_nil() => Uuid::new_v4(),
                _ => staff.id,
            };
            *slot = Some(staff);
        }
        RosterCommand::RemoveStaff { team, role } => {
            *team_mut(division, &team)?.staff.slot_mut(role) = None;
        }
        RosterCommand::AddShadowPlayer { player } => {
            let player = new_player(player)?;
            division.shadow_players.push(player);
        }
        RosterCommand::UpdateShadowPlayer { id, player } => {
            let player = replacement(player, id)?;
            let slot = division
                .shadow_players
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(RosterError::PlayerNotFound(id))?;
            *slot = player;
        }
        RosterCommand::DeleteShadowPlayer { id } => {
            let index = division
                .shadow_players
                .iter()
                .position(|p| p.id == id)
                .ok_or(RosterError::PlayerNotFound(id))?;
            division.shadow_players.remove(index);
        }
        RosterCommand::AddWithdrawnPlayer { player, reason } => {
            let player = new_player(player)?;
            let reason =
                placement::withdrawal_reason(reason.as_deref(), &policy.withdrawn_reason_fallback);
            division.withdrawn.push(WithdrawnPlayer { player, reason });
        }
        RosterCommand::DeleteWithdrawnPlayer { id } => {
            let index = division
                .withdrawn
                .iter()
                .position(|w| w.player.id == id)
                .ok_or(RosterError::PlayerNotFound(id))?;
            division.withdrawn.remove(index);
        }
        RosterCommand::AddSelector { mut selector } => {
            if selector.id.is_nil() {
                selector.id = Uuid::new_v4();
            }
            selectors::add_selector(&mut division.selectors, selector)?;
        }
        RosterCommand::UpdateSelector { id, selector } => {
            selectors::update_selector(&mut division.selectors, id, selector)?;
        }
        RosterCommand::SetChair { id } => selectors::set_chair(&mut division.selectors, id)?,
        RosterCommand::DeleteSelector { id } => {
            selectors::delete_selector(&mut division.selectors, id)?;
        }
        RosterCommand::UpdateInfo(update) => {
            if let Some(info) = update.trial_info {
                division.trial_info = Some(info);
            }
            if let Some(info) = update.training_info {
                division.training_info = Some(info);
            }
            if let Some(info) = update.tournament_info {
                division.tournament_info = Some(info);
            }
        }
    }
    Ok(None)
}

fn team_mut<'a>(division: &'a mut Division, name: &str) -> Result<&'a mut Team, RosterError> {
    division
        .team_mut(name)
        .ok_or_else(|| RosterError::TeamNotFound(name.trim().to_owned()))
}

fn required(value: String, what: &'static str) -> Result<String, RosterError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RosterError::EmptyName(what));
    }
    Ok(trimmed.to_owned())
}

/// Prepare a player entering a pool for the first time.
fn new_player(mut player: Player) -> Result<Player, RosterError> {
    player.name = required(player.name, "player name")?;
    if player.id.is_nil() {
        player.id = Uuid::new_v4();
    }
    Ok(player)
}

/// Prepare replacement data for an existing player, preserving its identifier.
fn replacement(mut player: Player, id: Uuid) -> Result<Player, RosterError> {
    player.name = required(player.name, "player name")?;
    player.id = id;
    Ok(player)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::{
        placement::{Placement, Pool},
        roster::{
            TeamStaff,
            fixtures::{player, selector, u15},
        },
    };

    fn applied(outcome: Outcome) -> Division {
        match outcome {
            Outcome::Applied(division) => division,
            Outcome::Unchanged(reason) => panic!("expected a change, got {reason:?}"),
        }
    }

    fn run(division: &Division, command: RosterCommand) -> Result<Outcome, RosterError> {
        apply(division, &command, &RosterPolicy::default())
    }

    fn unnamed(name: &str) -> Player {
        Player {
            id: Uuid::nil(),
            ..player(name)
        }
    }

    #[test]
    fn add_team_rejects_duplicates_and_blank_names() {
        let division = u15();

        let next = applied(run(&division, RosterCommand::AddTeam { name: " Red ".into() }).unwrap());
        assert_eq!(next.teams.last().unwrap().name, "Red");
        assert!(next.teams.last().unwrap().players.is_empty());

        assert_eq!(
            run(&division, RosterCommand::AddTeam { name: "Gold".into() }),
            Err(RosterError::DuplicateTeam("Gold".into()))
        );
        assert_eq!(
            run(&division, RosterCommand::AddTeam { name: "  ".into() }),
            Err(RosterError::EmptyName("team name"))
        );
    }

    #[test]
    fn rename_team_checks_existence_then_uniqueness() {
        let mut division = u15();
        division.teams[0].players.push(player("Alice"));

        let next = applied(
            run(
                &division,
                RosterCommand::RenameTeam {
                    team: "Green".into(),
                    name: " Emerald ".into(),
                },
            )
            .unwrap(),
        );
        let names: Vec<_> = next.teams.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Emerald", "Gold"]);
        assert_eq!(next.team("Emerald").unwrap().players.len(), 1);

        assert_eq!(
            run(
                &division,
                RosterCommand::RenameTeam {
                    team: "Green".into(),
                    name: "Gold".into(),
                }
            ),
            Err(RosterError::DuplicateTeam("Gold".into()))
        );
        assert_eq!(
            run(
                &division,
                RosterCommand::RenameTeam {
                    team: "Blue".into(),
                    name: "Gold".into(),
                }
            ),
            Err(RosterError::TeamNotFound("Blue".into()))
        );
    }

    #[test]
    fn rename_team_to_its_trimmed_name_is_allowed() {
        let mut division = u15();
        division.teams[0].name = " Green ".into();

        let next = applied(
            run(
                &division,
                RosterCommand::RenameTeam {
                    team: "Green".into(),
                    name: "Green".into(),
                },
            )
            .unwrap(),
        );

        assert_eq!(next.teams[0].name, "Green");
        assert_eq!(next.teams.len(), 2);
    }

    #[test]
    fn shadow_players_are_updated_and_deleted_by_id() {
        let mut division = u15();
        let carl = player("Carl");
        division.shadow_players.push(carl.clone());
        division.shadow_players.push(player("Dana"));

        let next = applied(
            run(
                &division,
                RosterCommand::UpdateShadowPlayer {
                    id: carl.id,
                    player: Player {
                        club: "Northside".into(),
                        ..unnamed("Carlos")
                    },
                },
            )
            .unwrap(),
        );
        let updated = &next.shadow_players[0];
        assert_eq!(updated.id, carl.id);
        assert_eq!((updated.name.as_str(), updated.club.as_str()), ("Carlos", "Northside"));

        let next = applied(run(&next, RosterCommand::DeleteShadowPlayer { id: carl.id }).unwrap());
        let names: Vec<_> = next.shadow_players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Dana"]);

        let missing = Uuid::new_v4();
        assert_eq!(
            run(&next, RosterCommand::DeleteShadowPlayer { id: missing }),
            Err(RosterError::PlayerNotFound(missing))
        );
        assert_eq!(
            run(
                &next,
                RosterCommand::UpdateShadowPlayer {
                    id: carl.id,
                    player: unnamed("Carl"),
                }
            ),
            Err(RosterError::PlayerNotFound(carl.id))
        );
    }

    #[test]
    fn delete_team_cascades_players_and_staff() {
        let mut division = u15();
        division.teams[0].players.push(player("Alice"));
        division.teams[0].staff.coach = Some(Staff {
            id: Uuid::new_v4(),
            name: "Coach Carter".into(),
            club: None,
            icon: None,
        });

        let next = applied(run(&division, RosterCommand::DeleteTeam { team: "Green".into() }).unwrap());

        assert_eq!(next.teams.len(), 1);
        assert_eq!(next.teams[0].name, "Gold");
        assert_eq!(
            run(&next, RosterCommand::DeleteTeam { team: "Green".into() }),
            Err(RosterError::TeamNotFound("Green".into()))
        );
    }

    #[test]
    fn player_crud_is_addressed_by_id() {
        let division = u15();
        let next = applied(
            run(
                &division,
                RosterCommand::AddPlayer {
                    team: "Gold".into(),
                    player: unnamed("Alice"),
                },
            )
            .unwrap(),
        );
        let id = next.team("Gold").unwrap().players[0].id;
        assert!(!id.is_nil());

        let next = applied(
            run(
                &next,
                RosterCommand::UpdatePlayer {
                    team: "Gold".into(),
                    id,
                    player: unnamed("Alicia"),
                },
            )
            .unwrap(),
        );
        let updated = &next.team("Gold").unwrap().players[0];
        assert_eq!((updated.id, updated.name.as_str()), (id, "Alicia"));

        let next = applied(
            run(
                &next,
                RosterCommand::DeletePlayer {
                    team: "Gold".into(),
                    id,
                },
            )
            .unwrap(),
        );
        assert!(next.team("Gold").unwrap().players.is_empty());

        assert_eq!(
            run(
                &next,
                RosterCommand::DeletePlayer {
                    team: "Gold".into(),
                    id
                }
            ),
            Err(RosterError::PlayerNotFound(id))
        );
    }

    #[test]
    fn adding_an_already_placed_player_is_refused() {
        let mut division = u15();
        let alice = player("Alice");
        division.teams[0].players.push(alice.clone());

        let result = run(&division, RosterCommand::AddShadowPlayer { player: alice });

        assert!(matches!(result, Err(RosterError::InvariantViolated(_))));
    }

    #[test]
    fn staff_roles_hold_one_occupant_each() {
        let division = u15();
        let coach = |name: &str| Staff {
            id: Uuid::nil(),
            name: name.into(),
            club: Some("Riverside".into()),
            icon: None,
        };

        let next = applied(
            run(
                &division,
                RosterCommand::AssignStaff {
                    team: "Green".into(),
                    role: StaffRole::Coach,
                    staff: coach("Pat"),
                },
            )
            .unwrap(),
        );
        let first_id = next.team("Green").unwrap().staff.coach.as_ref().unwrap().id;

        let next = applied(
            run(
                &next,
                RosterCommand::AssignStaff {
                    team: "Green".into(),
                    role: StaffRole::Coach,
                    staff: coach("Sam"),
                },
            )
            .unwrap(),
        );
        let staff = &next.team("Green").unwrap().staff;
        assert_eq!(staff.coach.as_ref().unwrap().name, "Sam");
        assert_ne!(staff.coach.as_ref().unwrap().id, first_id);
        assert!(staff.manager.is_none());

        let next = applied(
            run(
                &next,
                RosterCommand::RemoveStaff {
                    team: "Green".into(),
                    role: StaffRole::Coach,
                },
            )
            .unwrap(),
        );
        assert_eq!(next.team("Green").unwrap().staff, TeamStaff::default());
    }

    #[test]
    fn withdrawn_entries_get_a_reason() {
        let division = u15();
        let next = applied(
            run(
                &division,
                RosterCommand::AddWithdrawnPlayer {
                    player: unnamed("Bob"),
                    reason: None,
                },
            )
            .unwrap(),
        );
        assert_eq!(next.withdrawn[0].reason, DEFAULT_WITHDRAWN_REASON);

        let id = next.withdrawn[0].player.id;
        let next = applied(run(&next, RosterCommand::DeleteWithdrawnPlayer { id }).unwrap());
        assert!(next.withdrawn.is_empty());
    }

    #[test]
    fn selector_cap_leaves_snapshot_untouched() {
        let mut division = u15();
        for name in ["Ann", "Ben", "Cat", "Dov", "Eve"] {
            division.selectors.push(selector(name, false));
        }

        let result = run(
            &division,
            RosterCommand::AddSelector {
                selector: selector("Fin", true),
            },
        );

        assert_eq!(result, Err(RosterError::SelectorCapReached));
        assert_eq!(division.selectors.len(), 5);
        assert_eq!(division.chair_count(), 0);
    }

    #[test]
    fn move_command_reports_noop_without_copying_changes() {
        let mut division = u15();
        let alice = player("Alice");
        division.teams[0].players.push(alice.clone());

        let command = RosterCommand::MovePlayer(MoveRequest {
            source: Placement {
                division: division.key(),
                pool: Pool::Team {
                    name: "Green".into(),
                },
                player_id: alice.id,
            },
            destination: Pool::Team {
                name: "Green".into(),
            },
            reason: None,
        });

        assert_eq!(
            run(&division, command).unwrap(),
            Outcome::Unchanged(NoOp::SamePlacement)
        );
    }

    #[test]
    fn info_update_only_touches_provided_blocks() {
        let mut division = u15();
        division.training_info = Some(json!({ "day": "Tuesday" }));

        let next = applied(
            run(
                &division,
                RosterCommand::UpdateInfo(InfoUpdate {
                    trial_info: Some(json!("Trials on 3 May")),
                    ..Default::default()
                }),
            )
            .unwrap(),
        );

        assert_eq!(next.trial_info, Some(json!("Trials on 3 May")));
        assert_eq!(next.training_info, Some(json!({ "day": "Tuesday" })));
        assert!(next.tournament_info.is_none());
    }
}
