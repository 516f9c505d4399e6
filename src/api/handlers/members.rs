use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::AuthUser;
use crate::api::AppState;
use crate::domain::team::{
    InviteMember, Membership, MembershipStatus, TeamRole, UpdateMember,
};

/// Request body for inviting a member
#[derive(Debug, Deserialize)]
pub struct InviteMemberRequest {
    pub email: String,
    pub user_id: Option<Uuid>,
    /// Defaults to `member`
    pub role: Option<String>,
}

/// Request body for changing a member's role and/or status
#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub role: TeamRole,
    pub status: MembershipStatus,
    pub invited_by: Option<Uuid>,
    pub invited_at: Option<DateTime<Utc>>,
    pub joined_at: Option<DateTime<Utc>>,
    pub left_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Membership> for MemberResponse {
    fn from(m: &Membership) -> Self {
        Self {
            id: m.id(),
            team_id: m.team_id(),
            user_id: m.user_id(),
            email: m.email().map(str::to_string),
            role: m.role(),
            status: m.status(),
            invited_by: m.invited_by(),
            invited_at: m.invited_at(),
            joined_at: m.joined_at(),
            left_at: m.left_at(),
            created_at: m.created_at(),
            updated_at: m.updated_at(),
        }
    }
}

/// Resolves the `:user_id` path segment; `me` stands for the caller
fn resolve_target(raw: &str, user: &AuthUser) -> Result<Uuid, ApiError> {
    if raw.eq_ignore_ascii_case("me") {
        return Ok(user.user_id);
    }
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid user id: {}", raw)))
}

/// GET /api/teams/:team_id/members
pub async fn list_members(
    State(state): State<AppState>,
    user: AuthUser,
    Path(team_id): Path<Uuid>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let members = state.service.list_members(team_id, user.user_id).await?;

    Ok(Json(members.iter().map(MemberResponse::from).collect()))
}

/// Invite a user or e-mail address
///
/// POST /api/teams/:team_id/members
pub async fn invite_member(
    State(state): State<AppState>,
    user: AuthUser,
    Path(team_id): Path<Uuid>,
    payload: Result<Json<InviteMemberRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MemberResponse>), ApiError> {
    let Json(req) = payload?;

    let role = match req.role.as_deref() {
        Some(role) => role.parse::<TeamRole>()?,
        None => TeamRole::Member,
    };

    let membership = state
        .service
        .invite_member(
            team_id,
            user.user_id,
            InviteMember {
                user_id: req.user_id,
                email: req.email,
                role,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(MemberResponse::from(&membership))))
}

/// Update a member, or accept an invite when the caller activates themselves
///
/// PATCH /api/teams/:team_id/members/:user_id
pub async fn update_member(
    State(state): State<AppState>,
    user: AuthUser,
    Path((team_id, target)): Path<(Uuid, String)>,
    payload: Result<Json<UpdateMemberRequest>, JsonRejection>,
) -> Result<Json<MemberResponse>, ApiError> {
    let Json(req) = payload?;
    let target = resolve_target(&target, &user)?;

    let request = UpdateMember {
        role: req.role.as_deref().map(str::parse::<TeamRole>).transpose()?,
        status: req
            .status
            .as_deref()
            .map(str::parse::<MembershipStatus>)
            .transpose()?,
    };

    let accepting = target == user.user_id
        && request.role.is_none()
        && request.status == Some(MembershipStatus::Active);

    let membership = if accepting {
        state
            .service
            .accept_invite(team_id, user.user_id, user.email.as_deref())
            .await?
    } else {
        state
            .service
            .update_member(team_id, target, user.user_id, request)
            .await?
    };

    Ok(Json(MemberResponse::from(&membership)))
}

/// Remove a member, or leave the team with `me`
///
/// DELETE /api/teams/:team_id/members/:user_id
pub async fn remove_member(
    State(state): State<AppState>,
    user: AuthUser,
    Path((team_id, target)): Path<(Uuid, String)>,
) -> Result<Json<MemberResponse>, ApiError> {
    let target = resolve_target(&target, &user)?;

    let membership = state
        .service
        .remove_member(team_id, target, user.user_id)
        .await?;

    Ok(Json(MemberResponse::from(&membership)))
}
