use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for League Roster Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::save_status,
        crate::routes::sse::save_status_stream,
        crate::routes::admin::list_rosters,
        crate::routes::admin::create_roster,
        crate::routes::admin::get_roster,
        crate::routes::admin::replace_roster,
        crate::routes::admin::delete_roster,
        crate::routes::admin::update_info,
        crate::routes::admin::move_player,
        crate::routes::admin::add_team,
        crate::routes::admin::rename_team,
        crate::routes::admin::delete_team,
        crate::routes::admin::add_player,
        crate::routes::admin::update_player,
        crate::routes::admin::delete_player,
        crate::routes::admin::assign_staff,
        crate::routes::admin::remove_staff,
        crate::routes::admin::add_shadow_player,
        crate::routes::admin::update_shadow_player,
        crate::routes::admin::delete_shadow_player,
        crate::routes::admin::add_withdrawn_player,
        crate::routes::admin::delete_withdrawn_player,
        crate::routes::admin::add_selector,
        crate::routes::admin::update_selector,
        crate::routes::admin::delete_selector,
        crate::routes::admin::set_chair,
        crate::routes::admin::metadata,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::roster::CreateDivisionRequest,
            crate::dto::roster::UpdateInfoRequest,
            crate::dto::roster::MoveSource,
            crate::dto::roster::MoveRequestDto,
            crate::dto::roster::TeamRequest,
            crate::dto::roster::PlayerInput,
            crate::dto::roster::WithdrawnInput,
            crate::dto::roster::StaffInput,
            crate::dto::roster::SelectorInput,
            crate::dto::roster::MutationResponse,
            crate::dto::roster::MetadataResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::state::SaveStatus,
            crate::state::placement::Pool,
            crate::state::placement::NoOp,
            crate::state::roster::Division,
            crate::state::roster::DivisionKey,
            crate::state::roster::Team,
            crate::state::roster::Player,
            crate::state::roster::WithdrawnPlayer,
            crate::state::roster::Staff,
            crate::state::roster::StaffRole,
            crate::state::roster::TeamStaff,
            crate::state::roster::Selector,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Save status endpoints and stream"),
        (name = "rosters", description = "Division documents and player moves"),
        (name = "teams", description = "Teams, their players and staff"),
        (name = "pools", description = "Shadow and withdrawn player pools"),
        (name = "selectors", description = "Selection panel management"),
    )
)]
pub struct ApiDoc;
