use thiserror::Error;
use uuid::Uuid;

use crate::domain::repositories::StoreError;

/// Status classification carried by every [`TeamError`]
///
/// Maps one-to-one onto HTTP status codes at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorClass {
    /// Returns the HTTP-style status code for this class
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorClass::Validation => 400,
            ErrorClass::Forbidden => 403,
            ErrorClass::NotFound => 404,
            ErrorClass::Conflict => 409,
            ErrorClass::Internal => 500,
        }
    }
}

/// Errors produced by the membership domain
#[derive(Debug, Error)]
pub enum TeamError {
    // ===== 400 =====
    #[error("Team name is required")]
    InvalidTeamName,

    #[error("Invalid role specified: {0}")]
    InvalidRole(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Unsupported status transition")]
    UnsupportedStatusTransition,

    #[error("Use ownership transfer or leave actions for yourself")]
    SelfRoleChangeForbidden,

    #[error("Self-activation handled via accept endpoint")]
    SelfActivationViaAccept,

    #[error("Cannot invite members to personal teams")]
    CannotInvitePersonal,

    #[error("New owner must be an active team member")]
    InvalidOwnerTarget,

    #[error("Use ownership transfer to change owner role")]
    UseTransferForOwner,

    // ===== 403 =====
    #[error("You are not a member of this team")]
    NotAMember,

    #[error("Your membership status prohibits this action")]
    StatusProhibited,

    #[error("Insufficient permissions for this action")]
    InsufficientPermissions,

    #[error("You have reached the maximum limit of {limit} teams")]
    TeamLimitReached { limit: u32 },

    #[error("Cannot remove the team owner")]
    CannotRemoveOwner,

    #[error("Transfer ownership before leaving the team")]
    TransferOwnershipRequired,

    // ===== 404 =====
    #[error("Team not found")]
    TeamNotFound,

    #[error("Team member not found")]
    MemberNotFound,

    #[error("Invite not found")]
    InviteNotFound,

    // ===== 409 =====
    #[error("Personal team already exists")]
    PersonalTeamExists,

    #[error("User is already a team member")]
    AlreadyMember,

    #[error("Invite is no longer pending")]
    InviteNotPending,

    // ===== 500 =====
    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("Failed to create team membership: {source}")]
    MembershipCreationFailed {
        #[source]
        source: StoreError,
    },

    #[error("Failed to transfer ownership: {source}")]
    OwnershipTransferFailed {
        #[source]
        source: StoreError,
    },

    #[error("Operation partially applied on team {team_id}: {detail}")]
    PartiallyApplied { team_id: Uuid, detail: String },
}

impl TeamError {
    /// Returns the status classification of this error
    pub fn class(&self) -> ErrorClass {
        use TeamError::*;
        match self {
            InvalidTeamName
            | InvalidRole(_)
            | InvalidEmail(_)
            | UnsupportedStatusTransition
            | SelfRoleChangeForbidden
            | SelfActivationViaAccept
            | CannotInvitePersonal
            | InvalidOwnerTarget
            | UseTransferForOwner => ErrorClass::Validation,
            NotAMember
            | StatusProhibited
            | InsufficientPermissions
            | TeamLimitReached { .. }
            | CannotRemoveOwner
            | TransferOwnershipRequired => ErrorClass::Forbidden,
            TeamNotFound | MemberNotFound | InviteNotFound => ErrorClass::NotFound,
            PersonalTeamExists | AlreadyMember | InviteNotPending => ErrorClass::Conflict,
            Storage(_)
            | MembershipCreationFailed { .. }
            | OwnershipTransferFailed { .. }
            | PartiallyApplied { .. } => ErrorClass::Internal,
        }
    }

    /// Returns a stable machine-readable identifier
    pub fn code(&self) -> &'static str {
        use TeamError::*;
        match self {
            InvalidTeamName => "invalid_team_name",
            InvalidRole(_) => "invalid_role",
            InvalidEmail(_) => "invalid_email",
            UnsupportedStatusTransition => "unsupported_status_transition",
            SelfRoleChangeForbidden => "self_role_change_forbidden",
            SelfActivationViaAccept => "self_activation_via_accept",
            CannotInvitePersonal => "cannot_invite_personal",
            InvalidOwnerTarget => "invalid_owner_target",
            UseTransferForOwner => "use_transfer_for_owner",
            NotAMember => "not_a_member",
            StatusProhibited => "status_prohibited",
            InsufficientPermissions => "insufficient_permissions",
            TeamLimitReached { .. } => "team_limit_reached",
            CannotRemoveOwner => "cannot_remove_owner",
            TransferOwnershipRequired => "transfer_ownership_required",
            TeamNotFound => "team_not_found",
            MemberNotFound => "member_not_found",
            InviteNotFound => "invite_not_found",
            PersonalTeamExists => "personal_team_exists",
            AlreadyMember => "already_member",
            InviteNotPending => "invite_not_pending",
            Storage(_) => "storage_failure",
            MembershipCreationFailed { .. } => "membership_creation_failed",
            OwnershipTransferFailed { .. } => "ownership_transfer_failed",
            PartiallyApplied { .. } => "partially_applied",
        }
    }

    /// Returns the HTTP-style status code of this error
    pub fn http_status(&self) -> u16 {
        self.class().http_status()
    }
}

pub type TeamResult<T> = Result<T, TeamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_400() {
        assert_eq!(TeamError::InvalidTeamName.http_status(), 400);
        assert_eq!(TeamError::SelfActivationViaAccept.http_status(), 400);
        assert_eq!(TeamError::InvalidOwnerTarget.http_status(), 400);
    }

    #[test]
    fn authorization_errors_are_403() {
        assert_eq!(TeamError::NotAMember.http_status(), 403);
        assert_eq!(TeamError::TeamLimitReached { limit: 2 }.http_status(), 403);
        assert_eq!(TeamError::TransferOwnershipRequired.http_status(), 403);
    }

    #[test]
    fn conflicts_and_not_found() {
        assert_eq!(TeamError::PersonalTeamExists.class(), ErrorClass::Conflict);
        assert_eq!(TeamError::InviteNotFound.class(), ErrorClass::NotFound);
    }

    #[test]
    fn storage_errors_are_internal() {
        let error = TeamError::from(StoreError::Database("connection reset".to_string()));
        assert_eq!(error.http_status(), 500);
        assert_eq!(error.code(), "storage_failure");
    }

    #[test]
    fn team_limit_message() {
        let error = TeamError::TeamLimitReached { limit: 2 };
        assert_eq!(
            error.to_string(),
            "You have reached the maximum limit of 2 teams"
        );
    }

    #[test]
    fn partially_applied_is_distinct_from_storage() {
        let error = TeamError::PartiallyApplied {
            team_id: Uuid::new_v4(),
            detail: "orphaned team".to_string(),
        };
        assert_eq!(error.class(), ErrorClass::Internal);
        assert_eq!(error.code(), "partially_applied");
    }
}
