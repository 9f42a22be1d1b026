//! Business logic behind the admin roster routes.
//!
//! Every mutation follows the same cycle under the mutation gate: make sure the division is in
//! the snapshot, compute the new document with [`RosterStore::apply`], write the whole document
//! with a version check, then re-fetch the season so the snapshot mirrors storage. A command
//! that changes nothing is answered from the snapshot without touching storage.
//!
//! [`RosterStore::apply`]: crate::state::RosterStore::apply

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    dao::roster_store::RosterRepository,
    dto::roster::{CreateDivisionRequest, MutationResponse},
    error::ServiceError,
    services::persistence::{self, bounded},
    state::{
        SharedState,
        commands::{Outcome, RosterCommand},
        roster::{Division, DivisionKey, RosterError},
    },
};

/// Address a division, falling back to the configured default season.
pub fn division_key(state: &SharedState, age_group: &str, season: Option<String>) -> DivisionKey {
    let season = non_blank(season).unwrap_or_else(|| state.config().default_season().to_owned());
    DivisionKey::new(age_group.trim(), season)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// List divisions of one season (or all), refreshing the snapshot from storage when reachable.
pub async fn list_divisions(
    state: &SharedState,
    season: Option<String>,
) -> Result<Vec<Division>, ServiceError> {
    let season = non_blank(season);
    match state.repository().await {
        Some(repository) => {
            let divisions = bounded(state, repository.list(season.clone())).await?;
            state.rosters().resync(season.as_deref(), divisions).await;
        }
        None => warn!("storage unavailable (degraded mode); listing divisions from snapshot"),
    }
    Ok(state.rosters().list(season.as_deref()).await)
}

/// Read one division from storage, or from the snapshot while degraded.
pub async fn get_division(state: &SharedState, key: DivisionKey) -> Result<Division, ServiceError> {
    let Some(repository) = state.repository().await else {
        return state
            .rosters()
            .get(&key)
            .await
            .ok_or(ServiceError::Degraded);
    };

    match bounded(state, repository.find(key.clone())).await? {
        Some(mut division) => {
            division.backfill_ids();
            state.rosters().upsert(division.clone()).await;
            Ok(division)
        }
        None => {
            state.rosters().remove(&key).await;
            Err(RosterError::DivisionNotFound(key).into())
        }
    }
}

pub async fn create_division(
    state: &SharedState,
    request: CreateDivisionRequest,
) -> Result<Division, ServiceError> {
    let key = division_key(state, &request.age_group, request.season);
    let mut division = Division::new(key.age_group.clone(), key.season.clone());
    division.trial_info = request.trial_info;
    division.training_info = request.training_info;
    division.tournament_info = request.tournament_info;

    let _gate = state.lock_mutations().await;
    let written = persistence::create(state, division).await?;
    info!(age_group = %key.age_group, season = %key.season, "division created");
    Ok(resync_season(state, written).await)
}

/// Overwrite a division with a complete document. `division.version` must be the version the
/// caller read.
pub async fn replace_division(
    state: &SharedState,
    key: DivisionKey,
    mut division: Division,
) -> Result<Division, ServiceError> {
    if division.key() != key {
        return Err(ServiceError::InvalidInput(format!(
            "document describes division {} but {key} was addressed",
            division.key()
        )));
    }
    division.backfill_ids();
    division
        .check_invariants()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    let _gate = state.lock_mutations().await;
    let written = match persistence::replace(state, division).await {
        Ok(written) => written,
        Err(err) => return Err(after_failed_write(state, &key, err).await),
    };
    info!(
        age_group = %key.age_group,
        season = %key.season,
        version = written.version,
        "division replaced"
    );
    Ok(resync_season(state, written).await)
}

/// Delete a division with all its teams, pools and selectors.
pub async fn delete_division(state: &SharedState, key: DivisionKey) -> Result<(), ServiceError> {
    let _gate = state.lock_mutations().await;
    if !persistence::delete(state, &key).await? {
        return Err(RosterError::DivisionNotFound(key).into());
    }
    state.rosters().remove(&key).await;
    info!(age_group = %key.age_group, season = %key.season, "division deleted");
    Ok(())
}

/// Apply `command` to the division and persist the result.
pub async fn execute(
    state: &SharedState,
    key: DivisionKey,
    command: RosterCommand,
) -> Result<MutationResponse, ServiceError> {
    let _gate = state.lock_mutations().await;
    let repository = state.require_repository().await?;
    ensure_loaded(state, &repository, &key).await?;

    let outcome = state
        .rosters()
        .apply(&key, &command)
        .await
        .inspect_err(|err| {
            warn!(
                age_group = %key.age_group,
                season = %key.season,
                command = command.name(),
                error = %err,
                "roster command rejected"
            );
        })?;

    match outcome {
        Outcome::Unchanged(reason) => {
            debug!(
                age_group = %key.age_group,
                season = %key.season,
                command = command.name(),
                reason = ?reason,
                "roster command left division unchanged"
            );
            let division = state
                .rosters()
                .get(&key)
                .await
                .ok_or_else(|| RosterError::DivisionNotFound(key.clone()))?;
            Ok(MutationResponse {
                changed: false,
                noop: Some(reason),
                division,
            })
        }
        Outcome::Applied(next) => {
            let written = match persistence::replace(state, next).await {
                Ok(written) => written,
                Err(err) => return Err(after_failed_write(state, &key, err).await),
            };
            info!(
                age_group = %key.age_group,
                season = %key.season,
                version = written.version,
                command = command.name(),
                "roster updated"
            );
            let division = resync_season(state, written).await;
            Ok(MutationResponse {
                changed: true,
                noop: None,
                division,
            })
        }
    }
}

/// Pull a division into the snapshot before the first command touches it.
async fn ensure_loaded(
    state: &SharedState,
    repository: &Arc<dyn RosterRepository>,
    key: &DivisionKey,
) -> Result<(), ServiceError> {
    if state.rosters().get(key).await.is_some() {
        return Ok(());
    }
    match bounded(state, repository.find(key.clone())).await? {
        Some(mut division) => {
            division.backfill_ids();
            state.rosters().upsert(division).await;
            Ok(())
        }
        None => Err(RosterError::DivisionNotFound(key.clone()).into()),
    }
}

/// The snapshot is left as it was, except after a version conflict where the stored document
/// is reloaded so the next attempt starts from current data.
async fn after_failed_write(
    state: &SharedState,
    key: &DivisionKey,
    err: ServiceError,
) -> ServiceError {
    if !matches!(err, ServiceError::Conflict(_)) {
        return err;
    }
    warn!(
        age_group = %key.age_group,
        season = %key.season,
        error = %err,
        "division modified elsewhere; reloading"
    );
    if let Some(repository) = state.repository().await {
        match bounded(state, repository.find(key.clone())).await {
            Ok(Some(mut division)) => {
                division.backfill_ids();
                state.rosters().upsert(division).await;
            }
            Ok(None) => {
                state.rosters().remove(key).await;
            }
            Err(reload_err) => {
                warn!(error = %reload_err, "failed to reload division after conflict");
            }
        }
    }
    err
}

/// Re-fetch every division of the written season; falls back to the written document alone.
async fn resync_season(state: &SharedState, written: Division) -> Division {
    let key = written.key();
    let refreshed = match state.repository().await {
        Some(repository) => bounded(state, repository.list(Some(key.season.clone()))).await,
        None => Err(ServiceError::Degraded),
    };

    match refreshed {
        Ok(divisions) => state.rosters().resync(Some(key.season.as_str()), divisions).await,
        Err(err) => {
            warn!(
                age_group = %key.age_group,
                season = %key.season,
                error = %err,
                "failed to resync season after write; keeping written division"
            );
            state.rosters().upsert(written.clone()).await;
        }
    }

    state.rosters().get(&key).await.unwrap_or(written)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::roster_store::memory::InMemoryRosterStore,
        state::{
            AppState, SaveStatus,
            commands::DEFAULT_WITHDRAWN_REASON,
            placement::{MoveRequest, NoOp, Placement, Pool},
            roster::fixtures::{player, selector, u15},
        },
    };

    async fn setup(documents: Vec<Division>) -> (SharedState, InMemoryRosterStore) {
        let config = AppConfig::from_json(r#"{ "defaultSeason": "2026" }"#).unwrap();
        let state = AppState::new(config);
        let repository = InMemoryRosterStore::with_documents(documents);
        state.set_repository(Arc::new(repository.clone())).await;
        (state, repository)
    }

    fn key() -> DivisionKey {
        DivisionKey::new("U15", "2026")
    }

    fn move_to(player_id: Uuid, from: Pool, to: Pool, reason: Option<&str>) -> RosterCommand {
        RosterCommand::MovePlayer(MoveRequest {
            source: Placement {
                division: key(),
                pool: from,
                player_id,
            },
            destination: to,
            reason: reason.map(String::from),
        })
    }

    fn team(name: &str) -> Pool {
        Pool::Team { name: name.into() }
    }

    async fn stored(repository: &InMemoryRosterStore) -> Division {
        repository.find(key()).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn withdrawing_without_reason_persists_default_reason() {
        let mut division = u15();
        let alice = player("Alice");
        division.teams[0].players.push(alice.clone());
        let (state, repository) = setup(vec![division]).await;

        let response = execute(
            &state,
            key(),
            move_to(alice.id, team("Green"), Pool::Withdrawn, Some("   ")),
        )
        .await
        .unwrap();

        assert!(response.changed);
        assert!(response.division.teams[0].players.is_empty());
        assert_eq!(response.division.withdrawn[0].player.id, alice.id);
        assert_eq!(response.division.withdrawn[0].reason, DEFAULT_WITHDRAWN_REASON);
        assert_eq!(response.division.version, 1);
        assert_eq!(stored(&repository).await, response.division);
        assert_eq!(state.rosters().get(&key()).await.unwrap(), response.division);
        assert_eq!(state.save_status().current(), SaveStatus::Saved);
    }

    #[tokio::test]
    async fn reinstating_from_withdrawn_drops_reason() {
        let mut division = u15();
        let bob = player("Bob");
        division.withdrawn.push(crate::state::roster::WithdrawnPlayer {
            player: bob.clone(),
            reason: "Injured".into(),
        });
        let (state, repository) = setup(vec![division]).await;

        let response = execute(&state, key(), move_to(bob.id, Pool::Withdrawn, team("Gold"), None))
            .await
            .unwrap();

        assert!(response.division.withdrawn.is_empty());
        assert_eq!(response.division.teams[1].players, vec![bob]);
        assert_eq!(stored(&repository).await.version, 1);
    }

    #[tokio::test]
    async fn same_team_move_writes_nothing() {
        let mut division = u15();
        let alice = player("Alice");
        division.teams[0].players.push(alice.clone());
        let (state, repository) = setup(vec![division.clone()]).await;

        let response = execute(&state, key(), move_to(alice.id, team("Green"), team("Green"), None))
            .await
            .unwrap();

        assert!(!response.changed);
        assert_eq!(response.noop, Some(NoOp::SamePlacement));
        assert_eq!(response.division, division);
        assert_eq!(stored(&repository).await.version, 0);
        assert_eq!(state.save_status().current(), SaveStatus::Idle);
    }

    #[tokio::test]
    async fn adding_a_chair_demotes_the_previous_one() {
        let mut division = u15();
        let ann = selector("Ann", true);
        division.selectors.push(ann.clone());
        division.selectors.push(selector("Ben", false));
        let (state, _repository) = setup(vec![division]).await;

        let response = execute(
            &state,
            key(),
            RosterCommand::AddSelector {
                selector: selector("Cara", true),
            },
        )
        .await
        .unwrap();

        let chairs: Vec<_> = response
            .division
            .selectors
            .iter()
            .filter(|s| s.is_chair)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(chairs, ["Cara"]);
        assert_eq!(response.division.selectors.len(), 3);
    }

    #[tokio::test]
    async fn sixth_selector_is_rejected_without_writing() {
        let mut division = u15();
        for name in ["A", "B", "C", "D", "E"] {
            division.selectors.push(selector(name, false));
        }
        let (state, repository) = setup(vec![division]).await;

        let err = execute(
            &state,
            key(),
            RosterCommand::AddSelector {
                selector: selector("F", false),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(stored(&repository).await.selectors.len(), 5);
        assert_eq!(state.save_status().current(), SaveStatus::Idle);
    }

    #[tokio::test]
    async fn stale_snapshot_conflicts_then_reloads() {
        let (state, repository) = setup(vec![u15()]).await;
        get_division(&state, key()).await.unwrap();

        // Another process writes version 1 behind our back.
        let mut external = u15();
        external.version = 1;
        external.teams.push(crate::state::roster::Team::new("Blue"));
        repository.replace(external, 0).await.unwrap();

        let add_team = || RosterCommand::AddTeam {
            name: "Red".into(),
        };
        let err = execute(&state, key(), add_team()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert!(matches!(
            state.save_status().current(),
            SaveStatus::Error { .. }
        ));
        assert_eq!(state.rosters().get(&key()).await.unwrap().version, 1);

        let response = execute(&state, key(), add_team()).await.unwrap();
        let names: Vec<_> = response.division.teams.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Green", "Gold", "Blue", "Red"]);
        assert_eq!(response.division.version, 2);
    }

    #[tokio::test]
    async fn commands_on_unknown_division_are_not_found() {
        let (state, _repository) = setup(vec![]).await;

        let err = execute(&state, key(), RosterCommand::AddTeam { name: "Red".into() })
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn degraded_mode_refuses_commands_but_serves_snapshot() {
        let state = AppState::new(AppConfig::default());
        state.rosters().upsert(u15()).await;

        let err = execute(&state, key(), RosterCommand::AddTeam { name: "Red".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));

        let division = get_division(&state, key()).await.unwrap();
        assert_eq!(division.teams.len(), 2);
    }

    #[tokio::test]
    async fn create_list_and_delete_divisions() {
        let (state, _repository) = setup(vec![]).await;

        let created = create_division(
            &state,
            CreateDivisionRequest {
                age_group: " U13 ".into(),
                season: None,
                trial_info: None,
                training_info: None,
                tournament_info: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(created.key(), DivisionKey::new("U13", "2026"));
        assert!(!created.last_updated.is_empty());

        let again = create_division(
            &state,
            CreateDivisionRequest {
                age_group: "U13".into(),
                season: Some("2026".into()),
                trial_info: None,
                training_info: None,
                tournament_info: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(again, ServiceError::Conflict(_)));

        assert_eq!(list_divisions(&state, Some("2026".into())).await.unwrap().len(), 1);
        assert!(list_divisions(&state, Some("2025".into())).await.unwrap().is_empty());

        delete_division(&state, created.key()).await.unwrap();
        assert!(state.rosters().get(&created.key()).await.is_none());
        let err = delete_division(&state, created.key()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn replace_rejects_documents_breaking_invariants() {
        let (state, repository) = setup(vec![u15()]).await;

        let mut document = u15();
        document.selectors.push(selector("Ann", true));
        document.selectors.push(selector("Ben", true));
        let err = replace_division(&state, key(), document).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let mut document = u15();
        document.trial_info = Some(serde_json::json!({ "venue": "North field" }));
        let written = replace_division(&state, key(), document).await.unwrap();
        assert_eq!(written.version, 1);
        assert_eq!(stored(&repository).await.trial_info, written.trial_info);

        let err = replace_division(&state, DivisionKey::new("U13", "2026"), u15())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn replace_rejects_duplicate_team_names() {
        let (state, repository) = setup(vec![u15()]).await;

        let mut document = u15();
        let mut second_green = crate::state::roster::Team::new("Green ");
        second_green.players.push(player("Alice"));
        document.teams.push(second_green);

        let err = replace_division(&state, key(), document).await.unwrap_err();

        assert!(matches!(err, ServiceError::InvalidInput(_)));
        let names: Vec<_> = stored(&repository)
            .await
            .teams
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, ["Green", "Gold"]);
        assert_eq!(state.save_status().current(), SaveStatus::Idle);
    }

    #[tokio::test]
    async fn set_chair_persists_a_single_chair() {
        let mut division = u15();
        for (name, is_chair) in [("Ann", true), ("Ben", false), ("Cat", false), ("Dov", false), ("Eve", false)] {
            division.selectors.push(selector(name, is_chair));
        }
        let target = division.selectors[2].id;
        let (state, repository) = setup(vec![division]).await;

        let response = execute(&state, key(), RosterCommand::SetChair { id: target })
            .await
            .unwrap();
        assert!(response.changed);

        let saved = stored(&repository).await;
        let chairs: Vec<_> = saved.selectors.iter().filter(|s| s.is_chair).map(|s| s.id).collect();
        assert_eq!(chairs, [target]);
        assert_eq!(saved.selectors.len(), 5);
        assert_eq!(saved.version, 1);
        assert_eq!(state.rosters().get(&key()).await.unwrap(), saved);
    }

    #[tokio::test]
    async fn selector_update_and_delete_keep_one_chair_at_most() {
        let mut division = u15();
        let ann = selector("Ann", true);
        let ben = selector("Ben", false);
        division.selectors.push(ann.clone());
        division.selectors.push(ben.clone());
        let (state, repository) = setup(vec![division]).await;

        let promoted = crate::state::roster::Selector {
            name: "Benjamin".into(),
            is_chair: true,
            ..ben.clone()
        };
        execute(
            &state,
            key(),
            RosterCommand::UpdateSelector {
                id: ben.id,
                selector: promoted,
            },
        )
        .await
        .unwrap();

        let saved = stored(&repository).await;
        assert_eq!(saved.chair_count(), 1);
        let chair = saved.selectors.iter().find(|s| s.is_chair).unwrap();
        assert_eq!((chair.id, chair.name.as_str()), (ben.id, "Benjamin"));
        assert_eq!(saved.version, 1);

        execute(&state, key(), RosterCommand::DeleteSelector { id: ben.id })
            .await
            .unwrap();

        let saved = stored(&repository).await;
        assert_eq!(saved.selectors.len(), 1);
        assert_eq!(saved.selectors[0].id, ann.id);
        assert_eq!(saved.chair_count(), 0);
        assert_eq!(saved.version, 2);

        let err = execute(&state, key(), RosterCommand::DeleteSelector { id: ben.id })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn blank_season_uses_default() {
        let config = AppConfig::from_json(r#"{ "defaultSeason": "2030" }"#).unwrap();
        let state = AppState::new(config);

        assert_eq!(
            division_key(&state, "U15", Some("  ".into())),
            DivisionKey::new("U15", "2030")
        );
        assert_eq!(
            division_key(&state, "U15", Some("2024".into())),
            DivisionKey::new("U15", "2024")
        );
    }
}
