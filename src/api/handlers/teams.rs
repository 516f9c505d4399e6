use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::handlers::members::MemberResponse;
use crate::api::middleware::AuthUser;
use crate::api::AppState;
use crate::domain::repositories::MembershipWithTeam;
use crate::domain::team::{CreateTeam, Team, TeamDetails, UpdateTeam};

/// Request body for creating a team
#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

/// Request body for updating a team; absent fields are left untouched
#[derive(Debug, Deserialize)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

/// Request body for handing a team to another member
#[derive(Debug, Deserialize)]
pub struct TransferOwnershipRequest {
    pub new_owner_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub is_personal: bool,
    pub owner_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id(),
            name: team.name().to_string(),
            description: team.description().map(str::to_string),
            avatar_url: team.avatar_url().map(str::to_string),
            is_personal: team.is_personal(),
            owner_id: team.owner_id(),
            created_by: team.created_by(),
            created_at: team.created_at(),
            updated_at: team.updated_at(),
        }
    }
}

/// A team seen through one of the caller's memberships
#[derive(Debug, Serialize)]
pub struct TeamMembershipResponse {
    pub team: TeamResponse,
    pub membership: MemberResponse,
}

impl From<&MembershipWithTeam> for TeamMembershipResponse {
    fn from(row: &MembershipWithTeam) -> Self {
        Self {
            team: TeamResponse::from(&row.team),
            membership: MemberResponse::from(&row.membership),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TeamDetailsResponse {
    pub team: TeamResponse,
    pub members: Vec<MemberResponse>,
}

impl From<&TeamDetails> for TeamDetailsResponse {
    fn from(details: &TeamDetails) -> Self {
        Self {
            team: TeamResponse::from(&details.team),
            members: details.members.iter().map(MemberResponse::from).collect(),
        }
    }
}

/// List the caller's teams, pending invites included
///
/// GET /api/teams
pub async fn list_teams(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<TeamMembershipResponse>>, ApiError> {
    let rows = state.service.list_teams_for_user(user.user_id, true).await?;

    Ok(Json(rows.iter().map(TeamMembershipResponse::from).collect()))
}

/// Create a new team owned by the caller
///
/// POST /api/teams
pub async fn create_team(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateTeamRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    let Json(req) = payload?;

    let team = state
        .service
        .create_team(
            user.user_id,
            CreateTeam {
                name: req.name,
                description: req.description,
                avatar_url: req.avatar_url,
                is_personal: false,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TeamResponse::from(&team))))
}

/// Return the caller's personal team, creating it on first use
///
/// POST /api/teams/personal
pub async fn ensure_personal_team(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = state.service.ensure_personal_team(user.user_id).await?;

    Ok(Json(TeamResponse::from(&team)))
}

/// Pending invites addressed to the caller
///
/// GET /api/teams/invites
pub async fn list_invites(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<TeamMembershipResponse>>, ApiError> {
    let rows = state.service.list_pending_invites(user.user_id).await?;

    Ok(Json(rows.iter().map(TeamMembershipResponse::from).collect()))
}

/// Get a team with its active and pending members
///
/// GET /api/teams/:team_id
pub async fn get_team(
    State(state): State<AppState>,
    user: AuthUser,
    Path(team_id): Path<Uuid>,
) -> Result<Json<TeamDetailsResponse>, ApiError> {
    let details = state.service.team_details(team_id, user.user_id).await?;

    Ok(Json(TeamDetailsResponse::from(&details)))
}

/// PATCH /api/teams/:team_id
pub async fn update_team(
    State(state): State<AppState>,
    user: AuthUser,
    Path(team_id): Path<Uuid>,
    payload: Result<Json<UpdateTeamRequest>, JsonRejection>,
) -> Result<Json<TeamResponse>, ApiError> {
    let Json(req) = payload?;

    let team = state
        .service
        .update_team(
            team_id,
            user.user_id,
            UpdateTeam {
                name: req.name,
                description: req.description,
                avatar_url: req.avatar_url,
            },
        )
        .await?;

    Ok(Json(TeamResponse::from(&team)))
}

/// DELETE /api/teams/:team_id
pub async fn delete_team(
    State(state): State<AppState>,
    user: AuthUser,
    Path(team_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_team(team_id, user.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Hand the team to another active member
///
/// POST /api/teams/:team_id/transfer
pub async fn transfer_ownership(
    State(state): State<AppState>,
    user: AuthUser,
    Path(team_id): Path<Uuid>,
    payload: Result<Json<TransferOwnershipRequest>, JsonRejection>,
) -> Result<Json<TeamResponse>, ApiError> {
    let Json(req) = payload?;

    let team = state
        .service
        .transfer_ownership(team_id, user.user_id, req.new_owner_id)
        .await?;

    Ok(Json(TeamResponse::from(&team)))
}
