use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::roster::{
        CreateDivisionRequest, MetadataResponse, MoveRequestDto, MutationResponse, PlayerInput,
        SeasonQuery, SelectorInput, StaffInput, TeamRequest, UpdateInfoRequest, WithdrawnInput,
        YearQuery,
    },
    error::AppError,
    services::{metadata_service, roster_service},
    state::{
        SharedState,
        commands::RosterCommand,
        roster::{Division, DivisionKey, StaffRole},
    },
};

/// Admin routes managing division rosters and selection panels.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/admin/rosters", get(list_rosters).post(create_roster))
        .route(
            "/api/admin/rosters/{ageGroup}",
            get(get_roster).put(replace_roster).delete(delete_roster),
        )
        .route("/api/admin/rosters/{ageGroup}/info", put(update_info))
        .route("/api/admin/rosters/{ageGroup}/moves", post(move_player))
        .route("/api/admin/rosters/{ageGroup}/teams", post(add_team))
        .route(
            "/api/admin/rosters/{ageGroup}/teams/{team}",
            put(rename_team).delete(delete_team),
        )
        .route(
            "/api/admin/rosters/{ageGroup}/teams/{team}/players",
            post(add_player),
        )
        .route(
            "/api/admin/rosters/{ageGroup}/teams/{team}/players/{id}",
            put(update_player).delete(delete_player),
        )
        .route(
            "/api/admin/rosters/{ageGroup}/teams/{team}/staff/{role}",
            put(assign_staff).delete(remove_staff),
        )
        .route("/api/admin/rosters/{ageGroup}/shadow", post(add_shadow_player))
        .route(
            "/api/admin/rosters/{ageGroup}/shadow/{id}",
            put(update_shadow_player).delete(delete_shadow_player),
        )
        .route(
            "/api/admin/rosters/{ageGroup}/withdrawn",
            post(add_withdrawn_player),
        )
        .route(
            "/api/admin/rosters/{ageGroup}/withdrawn/{id}",
            delete(delete_withdrawn_player),
        )
        .route("/api/admin/rosters/{ageGroup}/selectors", post(add_selector))
        .route(
            "/api/admin/rosters/{ageGroup}/selectors/{id}",
            put(update_selector).delete(delete_selector),
        )
        .route(
            "/api/admin/rosters/{ageGroup}/selectors/{id}/chair",
            post(set_chair),
        )
        .route("/api/admin/metadata", get(metadata))
}

async fn run(
    state: &SharedState,
    age_group: &str,
    query: SeasonQuery,
    command: RosterCommand,
) -> Result<Json<MutationResponse>, AppError> {
    let key = roster_service::division_key(state, age_group, query.season);
    Ok(Json(roster_service::execute(state, key, command).await?))
}

fn key(state: &SharedState, age_group: &str, query: SeasonQuery) -> DivisionKey {
    roster_service::division_key(state, age_group, query.season)
}

// ---------------------------------------------------------------------------
// Divisions
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/admin/rosters",
    tag = "rosters",
    params(YearQuery),
    responses(
        (status = 200, description = "Divisions of the season, or of every season", body = [Division]),
        (status = 503, description = "Storage unavailable")
    )
)]
/// List divisions, refreshing the in-memory snapshot from storage.
pub async fn list_rosters(
    State(state): State<SharedState>,
    Query(query): Query<YearQuery>,
) -> Result<Json<Vec<Division>>, AppError> {
    Ok(Json(roster_service::list_divisions(&state, query.year).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/rosters",
    tag = "rosters",
    request_body = CreateDivisionRequest,
    responses(
        (status = 201, description = "Division created", body = Division),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Division already exists")
    )
)]
/// Create an empty division.
pub async fn create_roster(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateDivisionRequest>>,
) -> Result<(StatusCode, Json<Division>), AppError> {
    let division = roster_service::create_division(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(division)))
}

#[utoipa::path(
    get,
    path = "/api/admin/rosters/{ageGroup}",
    tag = "rosters",
    params(("ageGroup" = String, Path, description = "Age group of the division"), SeasonQuery),
    responses(
        (status = 200, description = "Division document", body = Division),
        (status = 404, description = "Division not found")
    )
)]
pub async fn get_roster(
    State(state): State<SharedState>,
    Path(age_group): Path<String>,
    Query(query): Query<SeasonQuery>,
) -> Result<Json<Division>, AppError> {
    let key = key(&state, &age_group, query);
    Ok(Json(roster_service::get_division(&state, key).await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/rosters/{ageGroup}",
    tag = "rosters",
    params(("ageGroup" = String, Path, description = "Age group of the division"), SeasonQuery),
    request_body = Division,
    responses(
        (status = 200, description = "Division replaced", body = Division),
        (status = 400, description = "Document breaks roster rules"),
        (status = 409, description = "Division changed since it was read")
    )
)]
/// Replace the complete document. The body's `version` must match the stored version.
pub async fn replace_roster(
    State(state): State<SharedState>,
    Path(age_group): Path<String>,
    Query(query): Query<SeasonQuery>,
    Json(division): Json<Division>,
) -> Result<Json<Division>, AppError> {
    let query = SeasonQuery {
        season: query.season.or_else(|| Some(division.season.clone())),
    };
    let key = key(&state, &age_group, query);
    Ok(Json(
        roster_service::replace_division(&state, key, division).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/admin/rosters/{ageGroup}",
    tag = "rosters",
    params(("ageGroup" = String, Path, description = "Age group of the division"), SeasonQuery),
    responses(
        (status = 204, description = "Division and everything it owns deleted"),
        (status = 404, description = "Division not found")
    )
)]
pub async fn delete_roster(
    State(state): State<SharedState>,
    Path(age_group): Path<String>,
    Query(query): Query<SeasonQuery>,
) -> Result<StatusCode, AppError> {
    let key = key(&state, &age_group, query);
    roster_service::delete_division(&state, key).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/admin/rosters/{ageGroup}/info",
    tag = "rosters",
    params(("ageGroup" = String, Path, description = "Age group of the division"), SeasonQuery),
    request_body = UpdateInfoRequest,
    responses((status = 200, description = "Information updated", body = MutationResponse))
)]
/// Update the trial, training and tournament information blocks.
pub async fn update_info(
    State(state): State<SharedState>,
    Path(age_group): Path<String>,
    Query(query): Query<SeasonQuery>,
    Valid(Json(payload)): Valid<Json<UpdateInfoRequest>>,
) -> Result<Json<MutationResponse>, AppError> {
    run(&state, &age_group, query, RosterCommand::UpdateInfo(payload.into())).await
}

#[utoipa::path(
    post,
    path = "/api/admin/rosters/{ageGroup}/moves",
    tag = "rosters",
    params(("ageGroup" = String, Path, description = "Age group of the division"), SeasonQuery),
    request_body = MoveRequestDto,
    responses(
        (status = 200, description = "Move applied, or `changed: false` when nothing moved", body = MutationResponse),
        (status = 400, description = "Missing destination team or cross-division move"),
        (status = 409, description = "Division changed since it was read")
    )
)]
/// Move a player between a team, the shadow pool and the withdrawn pool.
pub async fn move_player(
    State(state): State<SharedState>,
    Path(age_group): Path<String>,
    Query(query): Query<SeasonQuery>,
    Valid(Json(payload)): Valid<Json<MoveRequestDto>>,
) -> Result<Json<MutationResponse>, AppError> {
    let key = key(&state, &age_group, query);
    let command = RosterCommand::MovePlayer(payload.into_request(&key));
    Ok(Json(roster_service::execute(&state, key, command).await?))
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/admin/rosters/{ageGroup}/teams",
    tag = "teams",
    params(("ageGroup" = String, Path, description = "Age group of the division"), SeasonQuery),
    request_body = TeamRequest,
    responses(
        (status = 200, description = "Team added", body = MutationResponse),
        (status = 400, description = "Blank or duplicate team name")
    )
)]
pub async fn add_team(
    State(state): State<SharedState>,
    Path(age_group): Path<String>,
    Query(query): Query<SeasonQuery>,
    Valid(Json(payload)): Valid<Json<TeamRequest>>,
) -> Result<Json<MutationResponse>, AppError> {
    run(&state, &age_group, query, RosterCommand::AddTeam { name: payload.name }).await
}

#[utoipa::path(
    put,
    path = "/api/admin/rosters/{ageGroup}/teams/{team}",
    tag = "teams",
    params(
        ("ageGroup" = String, Path, description = "Age group of the division"),
        ("team" = String, Path, description = "Current team name"),
        SeasonQuery
    ),
    request_body = TeamRequest,
    responses(
        (status = 200, description = "Team renamed", body = MutationResponse),
        (status = 404, description = "Team not found")
    )
)]
pub async fn rename_team(
    State(state): State<SharedState>,
    Path((age_group, team)): Path<(String, String)>,
    Query(query): Query<SeasonQuery>,
    Valid(Json(payload)): Valid<Json<TeamRequest>>,
) -> Result<Json<MutationResponse>, AppError> {
    let command = RosterCommand::RenameTeam {
        team,
        name: payload.name,
    };
    run(&state, &age_group, query, command).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/rosters/{ageGroup}/teams/{team}",
    tag = "teams",
    params(
        ("ageGroup" = String, Path, description = "Age group of the division"),
        ("team" = String, Path, description = "Team name"),
        SeasonQuery
    ),
    responses(
        (status = 200, description = "Team and its players removed", body = MutationResponse),
        (status = 404, description = "Team not found")
    )
)]
pub async fn delete_team(
    State(state): State<SharedState>,
    Path((age_group, team)): Path<(String, String)>,
    Query(query): Query<SeasonQuery>,
) -> Result<Json<MutationResponse>, AppError> {
    run(&state, &age_group, query, RosterCommand::DeleteTeam { team }).await
}

#[utoipa::path(
    post,
    path = "/api/admin/rosters/{ageGroup}/teams/{team}/players",
    tag = "teams",
    params(
        ("ageGroup" = String, Path, description = "Age group of the division"),
        ("team" = String, Path, description = "Team name"),
        SeasonQuery
    ),
    request_body = PlayerInput,
    responses((status = 200, description = "Player added", body = MutationResponse))
)]
pub async fn add_player(
    State(state): State<SharedState>,
    Path((age_group, team)): Path<(String, String)>,
    Query(query): Query<SeasonQuery>,
    Valid(Json(payload)): Valid<Json<PlayerInput>>,
) -> Result<Json<MutationResponse>, AppError> {
    let command = RosterCommand::AddPlayer {
        team,
        player: payload.into(),
    };
    run(&state, &age_group, query, command).await
}

#[utoipa::path(
    put,
    path = "/api/admin/rosters/{ageGroup}/teams/{team}/players/{id}",
    tag = "teams",
    params(
        ("ageGroup" = String, Path, description = "Age group of the division"),
        ("team" = String, Path, description = "Team name"),
        ("id" = Uuid, Path, description = "Player identifier"),
        SeasonQuery
    ),
    request_body = PlayerInput,
    responses(
        (status = 200, description = "Player updated", body = MutationResponse),
        (status = 404, description = "Player not found")
    )
)]
pub async fn update_player(
    State(state): State<SharedState>,
    Path((age_group, team, id)): Path<(String, String, Uuid)>,
    Query(query): Query<SeasonQuery>,
    Valid(Json(payload)): Valid<Json<PlayerInput>>,
) -> Result<Json<MutationResponse>, AppError> {
    let command = RosterCommand::UpdatePlayer {
        team,
        id,
        player: payload.into(),
    };
    run(&state, &age_group, query, command).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/rosters/{ageGroup}/teams/{team}/players/{id}",
    tag = "teams",
    params(
        ("ageGroup" = String, Path, description = "Age group of the division"),
        ("team" = String, Path, description = "Team name"),
        ("id" = Uuid, Path, description = "Player identifier"),
        SeasonQuery
    ),
    responses(
        (status = 200, description = "Player removed", body = MutationResponse),
        (status = 404, description = "Player not found")
    )
)]
pub async fn delete_player(
    State(state): State<SharedState>,
    Path((age_group, team, id)): Path<(String, String, Uuid)>,
    Query(query): Query<SeasonQuery>,
) -> Result<Json<MutationResponse>, AppError> {
    run(&state, &age_group, query, RosterCommand::DeletePlayer { team, id }).await
}

#[utoipa::path(
    put,
    path = "/api/admin/rosters/{ageGroup}/teams/{team}/staff/{role}",
    tag = "teams",
    params(
        ("ageGroup" = String, Path, description = "Age group of the division"),
        ("team" = String, Path, description = "Team name"),
        ("role" = StaffRole, Path, description = "coach, asstCoach, manager or umpire"),
        SeasonQuery
    ),
    request_body = StaffInput,
    responses((status = 200, description = "Staff role filled", body = MutationResponse))
)]
pub async fn assign_staff(
    State(state): State<SharedState>,
    Path((age_group, team, role)): Path<(String, String, StaffRole)>,
    Query(query): Query<SeasonQuery>,
    Valid(Json(payload)): Valid<Json<StaffInput>>,
) -> Result<Json<MutationResponse>, AppError> {
    let command = RosterCommand::AssignStaff {
        team,
        role,
        staff: payload.into(),
    };
    run(&state, &age_group, query, command).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/rosters/{ageGroup}/teams/{team}/staff/{role}",
    tag = "teams",
    params(
        ("ageGroup" = String, Path, description = "Age group of the division"),
        ("team" = String, Path, description = "Team name"),
        ("role" = StaffRole, Path, description = "coach, asstCoach, manager or umpire"),
        SeasonQuery
    ),
    responses((status = 200, description = "Staff role cleared", body = MutationResponse))
)]
pub async fn remove_staff(
    State(state): State<SharedState>,
    Path((age_group, team, role)): Path<(String, String, StaffRole)>,
    Query(query): Query<SeasonQuery>,
) -> Result<Json<MutationResponse>, AppError> {
    run(&state, &age_group, query, RosterCommand::RemoveStaff { team, role }).await
}

// ---------------------------------------------------------------------------
// Shadow and withdrawn pools
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/admin/rosters/{ageGroup}/shadow",
    tag = "pools",
    params(("ageGroup" = String, Path, description = "Age group of the division"), SeasonQuery),
    request_body = PlayerInput,
    responses((status = 200, description = "Shadow player added", body = MutationResponse))
)]
pub async fn add_shadow_player(
    State(state): State<SharedState>,
    Path(age_group): Path<String>,
    Query(query): Query<SeasonQuery>,
    Valid(Json(payload)): Valid<Json<PlayerInput>>,
) -> Result<Json<MutationResponse>, AppError> {
    let command = RosterCommand::AddShadowPlayer {
        player: payload.into(),
    };
    run(&state, &age_group, query, command).await
}

#[utoipa::path(
    put,
    path = "/api/admin/rosters/{ageGroup}/shadow/{id}",
    tag = "pools",
    params(
        ("ageGroup" = String, Path, description = "Age group of the division"),
        ("id" = Uuid, Path, description = "Player identifier"),
        SeasonQuery
    ),
    request_body = PlayerInput,
    responses(
        (status = 200, description = "Shadow player updated", body = MutationResponse),
        (status = 404, description = "Player not found")
    )
)]
pub async fn update_shadow_player(
    State(state): State<SharedState>,
    Path((age_group, id)): Path<(String, Uuid)>,
    Query(query): Query<SeasonQuery>,
    Valid(Json(payload)): Valid<Json<PlayerInput>>,
) -> Result<Json<MutationResponse>, AppError> {
    let command = RosterCommand::UpdateShadowPlayer {
        id,
        player: payload.into(),
    };
    run(&state, &age_group, query, command).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/rosters/{ageGroup}/shadow/{id}",
    tag = "pools",
    params(
        ("ageGroup" = String, Path, description = "Age group of the division"),
        ("id" = Uuid, Path, description = "Player identifier"),
        SeasonQuery
    ),
    responses(
        (status = 200, description = "Shadow player removed", body = MutationResponse),
        (status = 404, description = "Player not found")
    )
)]
pub async fn delete_shadow_player(
    State(state): State<SharedState>,
    Path((age_group, id)): Path<(String, Uuid)>,
    Query(query): Query<SeasonQuery>,
) -> Result<Json<MutationResponse>, AppError> {
    run(&state, &age_group, query, RosterCommand::DeleteShadowPlayer { id }).await
}

#[utoipa::path(
    post,
    path = "/api/admin/rosters/{ageGroup}/withdrawn",
    tag = "pools",
    params(("ageGroup" = String, Path, description = "Age group of the division"), SeasonQuery),
    request_body = WithdrawnInput,
    responses((status = 200, description = "Withdrawn player added", body = MutationResponse))
)]
/// Record a withdrawn player directly. A blank reason is stored as the default reason.
pub async fn add_withdrawn_player(
    State(state): State<SharedState>,
    Path(age_group): Path<String>,
    Query(query): Query<SeasonQuery>,
    Valid(Json(payload)): Valid<Json<WithdrawnInput>>,
) -> Result<Json<MutationResponse>, AppError> {
    let (player, reason) = payload.into_parts();
    run(
        &state,
        &age_group,
        query,
        RosterCommand::AddWithdrawnPlayer { player, reason },
    )
    .await
}

#[utoipa::path(
    delete,
    path = "/api/admin/rosters/{ageGroup}/withdrawn/{id}",
    tag = "pools",
    params(
        ("ageGroup" = String, Path, description = "Age group of the division"),
        ("id" = Uuid, Path, description = "Player identifier"),
        SeasonQuery
    ),
    responses(
        (status = 200, description = "Withdrawn player removed", body = MutationResponse),
        (status = 404, description = "Player not found")
    )
)]
pub async fn delete_withdrawn_player(
    State(state): State<SharedState>,
    Path((age_group, id)): Path<(String, Uuid)>,
    Query(query): Query<SeasonQuery>,
) -> Result<Json<MutationResponse>, AppError> {
    run(&state, &age_group, query, RosterCommand::DeleteWithdrawnPlayer { id }).await
}

// ---------------------------------------------------------------------------
// Selection panel
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/admin/rosters/{ageGroup}/selectors",
    tag = "selectors",
    params(("ageGroup" = String, Path, description = "Age group of the division"), SeasonQuery),
    request_body = SelectorInput,
    responses(
        (status = 200, description = "Selector added; a new chair demotes the previous one", body = MutationResponse),
        (status = 400, description = "Panel already full")
    )
)]
pub async fn add_selector(
    State(state): State<SharedState>,
    Path(age_group): Path<String>,
    Query(query): Query<SeasonQuery>,
    Valid(Json(payload)): Valid<Json<SelectorInput>>,
) -> Result<Json<MutationResponse>, AppError> {
    let command = RosterCommand::AddSelector {
        selector: payload.into(),
    };
    run(&state, &age_group, query, command).await
}

#[utoipa::path(
    put,
    path = "/api/admin/rosters/{ageGroup}/selectors/{id}",
    tag = "selectors",
    params(
        ("ageGroup" = String, Path, description = "Age group of the division"),
        ("id" = Uuid, Path, description = "Selector identifier"),
        SeasonQuery
    ),
    request_body = SelectorInput,
    responses(
        (status = 200, description = "Selector updated", body = MutationResponse),
        (status = 404, description = "Selector not found")
    )
)]
pub async fn update_selector(
    State(state): State<SharedState>,
    Path((age_group, id)): Path<(String, Uuid)>,
    Query(query): Query<SeasonQuery>,
    Valid(Json(payload)): Valid<Json<SelectorInput>>,
) -> Result<Json<MutationResponse>, AppError> {
    let command = RosterCommand::UpdateSelector {
        id,
        selector: payload.into(),
    };
    run(&state, &age_group, query, command).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/rosters/{ageGroup}/selectors/{id}",
    tag = "selectors",
    params(
        ("ageGroup" = String, Path, description = "Age group of the division"),
        ("id" = Uuid, Path, description = "Selector identifier"),
        SeasonQuery
    ),
    responses(
        (status = 200, description = "Selector removed; no chair is promoted", body = MutationResponse),
        (status = 404, description = "Selector not found")
    )
)]
pub async fn delete_selector(
    State(state): State<SharedState>,
    Path((age_group, id)): Path<(String, Uuid)>,
    Query(query): Query<SeasonQuery>,
) -> Result<Json<MutationResponse>, AppError> {
    run(&state, &age_group, query, RosterCommand::DeleteSelector { id }).await
}

#[utoipa::path(
    post,
    path = "/api/admin/rosters/{ageGroup}/selectors/{id}/chair",
    tag = "selectors",
    params(
        ("ageGroup" = String, Path, description = "Age group of the division"),
        ("id" = Uuid, Path, description = "Selector identifier"),
        SeasonQuery
    ),
    responses(
        (status = 200, description = "Selector is now the only chair", body = MutationResponse),
        (status = 404, description = "Selector not found")
    )
)]
pub async fn set_chair(
    State(state): State<SharedState>,
    Path((age_group, id)): Path<(String, Uuid)>,
    Query(query): Query<SeasonQuery>,
) -> Result<Json<MutationResponse>, AppError> {
    run(&state, &age_group, query, RosterCommand::SetChair { id }).await
}

#[utoipa::path(
    get,
    path = "/api/admin/metadata",
    tag = "rosters",
    responses((status = 200, description = "Age group and season suggestions", body = MetadataResponse))
)]
pub async fn metadata(State(state): State<SharedState>) -> Json<MetadataResponse> {
    Json(metadata_service::metadata(&state).await)
}
