//! Moves a player between the mutually exclusive placements of a division: a team's active
//! list, the shadow pool and the withdrawn pool.
//!
//! A move is computed on a private copy of the division; callers only ever observe the fully
//! applied snapshot, never a player removed from the source but not yet added to the target.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::roster::{Division, DivisionKey, Player, RosterError, WithdrawnPlayer};

/// Pool a player currently occupies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Pool {
    /// Active list of the named team.
    Team {
        #[serde(rename = "teamName")]
        name: String,
    },
    /// Shadow pool of reserve players.
    Shadow,
    /// Withdrawn pool; entries carry a reason.
    Withdrawn,
}

/// Where a player currently sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub division: DivisionKey,
    pub pool: Pool,
    pub player_id: Uuid,
}

/// Fully formed move command; the engine never asks for missing input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub source: Placement,
    pub destination: Pool,
    /// Only used when the destination is the withdrawn pool.
    pub reason: Option<String>,
}

/// Why a move left the division untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoOp {
    /// Source and destination are the same pool (or the same team).
    SamePlacement,
    /// The player is not in the source pool, or the source team does not exist.
    SourceNotFound,
    /// The destination team does not exist in the division.
    UnknownDestinationTeam,
}

/// Result of a move computation.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Moved(Division),
    Unchanged(NoOp),
}

/// Compute the division snapshot resulting from `request`.
///
/// `fallback_reason` is recorded when a player enters the withdrawn pool without a usable
/// reason.
pub fn move_player(
    division: &Division,
    request: &MoveRequest,
    fallback_reason: &str,
) -> Result<Transition, RosterError> {
    let key = division.key();
    if request.source.division != key {
        return Err(RosterError::CrossDivisionMove {
            from: request.source.division.clone(),
            to: key,
        });
    }

    if let Pool::Team { name } = &request.destination {
        if name.trim().is_empty() {
            return Err(RosterError::MissingDestinationTeam);
        }
    }

    if same_pool(&request.source.pool, &request.destination) {
        return Ok(Transition::Unchanged(NoOp::SamePlacement));
    }

    if let Pool::Team { name } = &request.destination {
        if division.team(name).is_none() {
            return Ok(Transition::Unchanged(NoOp::UnknownDestinationTeam));
        }
    }

    let mut next = division.clone();
    let Some(player) = take_player(&mut next, &request.source) else {
        return Ok(Transition::Unchanged(NoOp::SourceNotFound));
    };

    match &request.destination {
        Pool::Team { name } => {
            // Existence was checked on the original snapshot, and removal never drops a team.
            let Some(team) = next.team_mut(name) else {
                return Ok(Transition::Unchanged(NoOp::UnknownDestinationTeam));
            };
            team.players.push(player);
        }
        Pool::Shadow => next.shadow_players.push(player),
        Pool::Withdrawn => next.withdrawn.push(WithdrawnPlayer {
            player,
            reason: withdrawal_reason(request.reason.as_deref(), fallback_reason),
        }),
    }

    Ok(Transition::Moved(next))
}

/// Resolve the reason recorded for a withdrawal, replacing blank input with the fallback.
pub fn withdrawal_reason(reason: Option<&str>, fallback: &str) -> String {
    reason
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .unwrap_or(fallback)
        .to_owned()
}

fn same_pool(source: &Pool, destination: &Pool) -> bool {
    match (source, destination) {
        (Pool::Team { name: from }, Pool::Team { name: to }) => from.trim() == to.trim(),
        (Pool::Shadow, Pool::Shadow) | (Pool::Withdrawn, Pool::Withdrawn) => true,
        _ => false,
    }
}

/// Remove the player from its source pool, dropping pool-specific fields such as the
/// withdrawal reason.
fn take_player(division: &mut Division, source: &Placement) -> Option<Player> {
    let id = source.player_id;
    match &source.pool {
        Pool::Team { name } => {
            let team = division.team_mut(name)?;
            let index = team.players.iter().position(|p| p.id == id)?;
            Some(team.players.remove(index))
        }
        Pool::Shadow => {
            let index = division.shadow_players.iter().position(|p| p.id == id)?;
            Some(division.shadow_players.remove(index))
        }
        Pool::Withdrawn => {
            let index = division.withdrawn.iter().position(|w| w.player.id == id)?;
            Some(division.withdrawn.remove(index).player)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::roster::fixtures::{player, u15};

    const FALLBACK: &str = "No reason given";

    fn team(name: &str) -> Pool {
        Pool::Team { name: name.into() }
    }

    fn request(division: &Division, from: Pool, id: Uuid, to: Pool) -> MoveRequest {
        MoveRequest {
            source: Placement {
                division: division.key(),
                pool: from,
                player_id: id,
            },
            destination: to,
            reason: None,
        }
    }

    fn moved(transition: Transition) -> Division {
        match transition {
            Transition::Moved(division) => division,
            Transition::Unchanged(reason) => panic!("expected a move, got {reason:?}"),
        }
    }

    #[test]
    fn team_to_shadow_moves_player() {
        let mut division = u15();
        let alice = player("Alice");
        division.teams[0].players.push(alice.clone());

        let req = request(&division, team("Green"), alice.id, Pool::Shadow);
        let next = moved(move_player(&division, &req, FALLBACK).unwrap());

        assert!(next.team("Green").unwrap().players.is_empty());
        assert_eq!(next.shadow_players, vec![alice]);
        // The input snapshot is never touched.
        assert_eq!(division.teams[0].players.len(), 1);
    }

    #[test]
    fn withdrawn_to_team_drops_reason() {
        let mut division = u15();
        let bob = player("Bob");
        division.withdrawn.push(WithdrawnPlayer {
            player: bob.clone(),
            reason: "Injured".into(),
        });

        let req = request(&division, Pool::Withdrawn, bob.id, team("Gold"));
        let next = moved(move_player(&division, &req, FALLBACK).unwrap());

        assert_eq!(next.team("Gold").unwrap().players, vec![bob]);
        assert!(next.withdrawn.is_empty());
        let value = serde_json::to_value(&next.team("Gold").unwrap().players[0]).unwrap();
        assert!(value.get("reason").is_none());
    }

    #[test]
    fn moving_into_withdrawn_always_records_a_reason() {
        let mut division = u15();
        let cara = player("Cara");
        let dan = player("Dan");
        division.shadow_players.push(cara.clone());
        division.shadow_players.push(dan.clone());

        let mut with_reason = request(&division, Pool::Shadow, cara.id, Pool::Withdrawn);
        with_reason.reason = Some("  Travelling ".into());
        let next = moved(move_player(&division, &with_reason, FALLBACK).unwrap());
        assert_eq!(next.withdrawn[0].reason, "Travelling");

        let mut blank = request(&next, Pool::Shadow, dan.id, Pool::Withdrawn);
        blank.reason = Some("   ".into());
        let next = moved(move_player(&next, &blank, FALLBACK).unwrap());
        assert_eq!(next.withdrawn[1].reason, FALLBACK);
        assert!(next.shadow_players.is_empty());
    }

    #[test]
    fn same_team_move_is_a_noop() {
        let mut division = u15();
        let alice = player("Alice");
        division.teams[0].players.push(alice.clone());

        let req = request(&division, team("Green"), alice.id, team(" Green "));
        assert_eq!(
            move_player(&division, &req, FALLBACK).unwrap(),
            Transition::Unchanged(NoOp::SamePlacement)
        );
    }

    #[test]
    fn unknown_player_or_team_is_a_noop() {
        let mut division = u15();
        let alice = player("Alice");
        division.teams[0].players.push(alice.clone());

        let missing = request(&division, Pool::Shadow, alice.id, team("Gold"));
        assert_eq!(
            move_player(&division, &missing, FALLBACK).unwrap(),
            Transition::Unchanged(NoOp::SourceNotFound)
        );

        let unknown_team = request(&division, team("Green"), alice.id, team("Purple"));
        assert_eq!(
            move_player(&division, &unknown_team, FALLBACK).unwrap(),
            Transition::Unchanged(NoOp::UnknownDestinationTeam)
        );
    }

    #[test]
    fn rejects_cross_division_and_blank_destination() {
        let mut division = u15();
        let alice = player("Alice");
        division.teams[0].players.push(alice.clone());

        let mut foreign = request(&division, team("Green"), alice.id, Pool::Shadow);
        foreign.source.division = DivisionKey::new("U17", "2026");
        assert!(matches!(
            move_player(&division, &foreign, FALLBACK),
            Err(RosterError::CrossDivisionMove { .. })
        ));

        let blank = request(&division, team("Green"), alice.id, team("  "));
        assert_eq!(
            move_player(&division, &blank, FALLBACK),
            Err(RosterError::MissingDestinationTeam)
        );
    }

    #[test]
    fn move_sequences_keep_every_player_in_exactly_one_pool() {
        let mut division = u15();
        let players: Vec<Player> = ["Ann", "Ben", "Cy", "Dot"].into_iter().map(player).collect();
        division.teams[0].players.extend(players.iter().cloned());

        let pools = [team("Green"), team("Gold"), Pool::Shadow, Pool::Withdrawn];
        let mut current: Vec<Pool> = vec![team("Green"); players.len()];

        for step in 0..40 {
            let who = step % players.len();
            let to = pools[(step * 7 + who) % pools.len()].clone();
            let req = request(&division, current[who].clone(), players[who].id, to.clone());
            match move_player(&division, &req, FALLBACK).unwrap() {
                Transition::Moved(next) => {
                    division = next;
                    current[who] = to;
                }
                Transition::Unchanged(reason) => assert_eq!(reason, NoOp::SamePlacement),
            }

            assert!(division.placement_conflicts().is_empty());
            let total = division.teams.iter().map(|t| t.players.len()).sum::<usize>()
                + division.shadow_players.len()
                + division.withdrawn.len();
            assert_eq!(total, players.len());
        }
    }
}
