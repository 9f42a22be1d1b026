//! Request and response bodies of the admin roster API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::validation::{validate_name, validate_season},
    state::{
        commands::InfoUpdate,
        placement::{MoveRequest, NoOp, Placement, Pool},
        roster::{Division, DivisionKey, Player, Selector, Staff},
    },
};

/// Longest withdrawal reason accepted.
const MAX_REASON_LEN: u64 = 500;

/// Optional season selector; the configured default season applies when absent.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SeasonQuery {
    pub season: Option<String>,
}

/// Optional season filter for listings, named after the admin UI's year picker.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct YearQuery {
    pub year: Option<String>,
}

/// Payload creating an empty division.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDivisionRequest {
    #[validate(custom(function = "validate_name"))]
    pub age_group: String,
    #[validate(custom(function = "validate_season"))]
    pub season: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub trial_info: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub training_info: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub tournament_info: Option<Value>,
}

/// Replacement for the free-form information blocks; omitted blocks are left as they are.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfoRequest {
    #[schema(value_type = Option<Object>)]
    pub trial_info: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub training_info: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub tournament_info: Option<Value>,
}

impl From<UpdateInfoRequest> for InfoUpdate {
    fn from(value: UpdateInfoRequest) -> Self {
        Self {
            trial_info: value.trial_info,
            training_info: value.training_info,
            tournament_info: value.tournament_info,
        }
    }
}

/// Where the moved player currently sits. The division defaults to the one named in the path.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveSource {
    pub age_group: Option<String>,
    pub season: Option<String>,
    pub pool: Pool,
    pub player_id: Uuid,
}

/// Move a player between a team, the shadow pool and the withdrawn pool.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequestDto {
    pub source: MoveSource,
    pub destination: Pool,
    /// Recorded when the destination is the withdrawn pool; blank uses the default reason.
    #[validate(length(max = MAX_REASON_LEN))]
    pub reason: Option<String>,
}

impl MoveRequestDto {
    /// Resolve the request against the division addressed by the route.
    pub fn into_request(self, key: &DivisionKey) -> MoveRequest {
        let division = DivisionKey::new(
            self.source
                .age_group
                .unwrap_or_else(|| key.age_group.clone()),
            self.source.season.unwrap_or_else(|| key.season.clone()),
        );
        MoveRequest {
            source: Placement {
                division,
                pool: self.source.pool,
                player_id: self.source.player_id,
            },
            destination: self.destination,
            reason: self.reason,
        }
    }
}

/// Name of a team to create, or the new name of an existing one.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TeamRequest {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
}

/// Player details for a team list or the shadow pool.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PlayerInput {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[serde(default)]
    pub club: String,
    pub icon: Option<String>,
}

impl From<PlayerInput> for Player {
    fn from(value: PlayerInput) -> Self {
        Self {
            id: Uuid::nil(),
            name: value.name,
            club: value.club,
            icon: value.icon,
        }
    }
}

/// Player entered straight into the withdrawn pool.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct WithdrawnInput {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[serde(default)]
    pub club: String,
    pub icon: Option<String>,
    #[validate(length(max = MAX_REASON_LEN))]
    pub reason: Option<String>,
}

impl WithdrawnInput {
    pub fn into_parts(self) -> (Player, Option<String>) {
        let player = Player {
            id: Uuid::nil(),
            name: self.name,
            club: self.club,
            icon: self.icon,
        };
        (player, self.reason)
    }
}

/// Occupant for a staff role.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct StaffInput {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    pub club: Option<String>,
    pub icon: Option<String>,
}

impl From<StaffInput> for Staff {
    fn from(value: StaffInput) -> Self {
        Self {
            id: Uuid::nil(),
            name: value.name,
            club: value.club,
            icon: value.icon,
        }
    }
}

/// Selection panel member.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SelectorInput {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[serde(default)]
    pub club: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub is_chair: bool,
}

impl From<SelectorInput> for Selector {
    fn from(value: SelectorInput) -> Self {
        Self {
            id: Uuid::nil(),
            name: value.name,
            club: value.club,
            icon: value.icon,
            is_chair: value.is_chair,
        }
    }
}

/// Result of a roster mutation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    /// `false` when the command left the division untouched and nothing was written.
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noop: Option<NoOp>,
    /// The division as stored after the mutation.
    pub division: Division,
}

/// Input suggestions for the admin UI.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetadataResponse {
    pub age_groups: Vec<String>,
    /// Newest season first.
    pub seasons: Vec<String>,
}
