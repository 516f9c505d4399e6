// Request payloads accepted by the membership service
//
// Plain data validated at the service boundary. Role and status values are
// already parsed into closed enums by the time they get here.

use uuid::Uuid;

use super::value_objects::{MembershipStatus, TeamRole};

/// Create a team owned by the caller
#[derive(Debug, Clone, Default)]
pub struct CreateTeam {
    pub name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub is_personal: bool,
}

impl CreateTeam {
    /// A regular, non-personal team with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A personal team with the default name and description
    pub fn personal() -> Self {
        Self {
            name: super::Team::PERSONAL_TEAM_NAME.to_string(),
            description: Some(super::Team::PERSONAL_TEAM_DESCRIPTION.to_string()),
            avatar_url: None,
            is_personal: true,
        }
    }
}

/// Partial update of a team's editable fields
#[derive(Debug, Clone, Default)]
pub struct UpdateTeam {
    pub name: Option<String>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

/// Invite a user, or a not-yet-registered e-mail, into a team
#[derive(Debug, Clone)]
pub struct InviteMember {
    pub user_id: Option<Uuid>,
    pub email: String,
    pub role: TeamRole,
}

impl InviteMember {
    /// Invite by e-mail only, as a regular member
    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            user_id: None,
            email: email.into(),
            role: TeamRole::Member,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_role(mut self, role: TeamRole) -> Self {
        self.role = role;
        self
    }
}

/// Change a member's role and/or status
#[derive(Debug, Clone, Default)]
pub struct UpdateMember {
    pub role: Option<TeamRole>,
    pub status: Option<MembershipStatus>,
}

impl UpdateMember {
    pub fn role(role: TeamRole) -> Self {
        Self {
            role: Some(role),
            status: None,
        }
    }

    pub fn status(status: MembershipStatus) -> Self {
        Self {
            role: None,
            status: Some(status),
        }
    }
}
