use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::errors::TeamError;

/// Role a member holds inside a team
///
/// `Owner` and `Admin` are managers; `Member` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "team_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    /// Exactly one active owner per team
    Owner,
    /// Can invite, update and remove members
    Admin,
    /// Regular member
    Member,
}

impl TeamRole {
    /// Every role a member may hold
    pub const ALL: [TeamRole; 3] = [TeamRole::Owner, TeamRole::Admin, TeamRole::Member];

    /// Roles allowed to manage membership
    pub const MANAGERS: [TeamRole; 2] = [TeamRole::Owner, TeamRole::Admin];

    /// Returns true for owners and admins
    ///
    /// # Example
    /// ```
    /// use prompt_teams_api::domain::team::value_objects::TeamRole;
    ///
    /// assert!(TeamRole::Admin.is_manager());
    /// assert!(!TeamRole::Member.is_manager());
    /// ```
    pub fn is_manager(&self) -> bool {
        matches!(self, TeamRole::Owner | TeamRole::Admin)
    }
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamRole::Owner => write!(f, "owner"),
            TeamRole::Admin => write!(f, "admin"),
            TeamRole::Member => write!(f, "member"),
        }
    }
}

impl FromStr for TeamRole {
    type Err = TeamError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(TeamRole::Owner),
            "admin" => Ok(TeamRole::Admin),
            "member" => Ok(TeamRole::Member),
            _ => Err(TeamError::InvalidRole(value.to_string())),
        }
    }
}

/// Lifecycle status of a membership
///
/// # Status Transitions
/// ```text
/// (none) -> Pending -> Active -> Left
///                         |----> Removed
///                         `----> Blocked
/// Left | Removed | Blocked | Pending -> Pending   (re-invite only)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    /// Invited, not yet accepted
    Pending,
    /// Full member
    Active,
    /// Member left on their own
    Left,
    /// Removed by a manager
    Removed,
    /// Blocked by a manager
    Blocked,
}

impl MembershipStatus {
    /// Checks if a direct transition from current status to next status is valid
    ///
    /// Re-invites are not covered here, see [`MembershipStatus::can_reinvite`].
    ///
    /// # Valid Transitions
    /// - Pending -> Active
    /// - Active -> Left
    /// - Active -> Removed
    /// - Active -> Blocked
    ///
    /// # Example
    /// ```
    /// use prompt_teams_api::domain::team::value_objects::MembershipStatus;
    ///
    /// assert!(MembershipStatus::Pending.can_transition_to(MembershipStatus::Active));
    /// assert!(!MembershipStatus::Active.can_transition_to(MembershipStatus::Pending));
    /// ```
    pub fn can_transition_to(&self, next: MembershipStatus) -> bool {
        use MembershipStatus::*;
        matches!(
            (self, next),
            (Pending, Active) | (Active, Left) | (Active, Removed) | (Active, Blocked)
        )
    }

    /// Every status except `Active` may be reopened as `Pending` by an invite
    pub fn can_reinvite(&self) -> bool {
        !matches!(self, MembershipStatus::Active)
    }

    /// Left, removed and blocked memberships are retained but inert
    pub fn is_departed(&self) -> bool {
        matches!(
            self,
            MembershipStatus::Left | MembershipStatus::Removed | MembershipStatus::Blocked
        )
    }
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipStatus::Pending => write!(f, "pending"),
            MembershipStatus::Active => write!(f, "active"),
            MembershipStatus::Left => write!(f, "left"),
            MembershipStatus::Removed => write!(f, "removed"),
            MembershipStatus::Blocked => write!(f, "blocked"),
        }
    }
}

impl FromStr for MembershipStatus {
    type Err = TeamError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(MembershipStatus::Pending),
            "active" => Ok(MembershipStatus::Active),
            "left" => Ok(MembershipStatus::Left),
            "removed" => Ok(MembershipStatus::Removed),
            "blocked" => Ok(MembershipStatus::Blocked),
            _ => Err(TeamError::UnsupportedStatusTransition),
        }
    }
}

/// Trimmed, non-blank team name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamName(String);

impl TeamName {
    /// Validates and trims a team name
    ///
    /// # Example
    /// ```
    /// use prompt_teams_api::domain::team::value_objects::TeamName;
    ///
    /// let name = TeamName::new("  Prompt Lab ").expect("valid name");
    /// assert_eq!(name.as_str(), "Prompt Lab");
    /// assert!(TeamName::new("   ").is_err());
    /// ```
    pub fn new(name: impl AsRef<str>) -> Result<Self, TeamError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TeamError::InvalidTeamName);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for TeamName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transition_pending_to_active() {
        assert!(MembershipStatus::Pending.can_transition_to(MembershipStatus::Active));
    }

    #[test]
    fn valid_transitions_out_of_active() {
        assert!(MembershipStatus::Active.can_transition_to(MembershipStatus::Left));
        assert!(MembershipStatus::Active.can_transition_to(MembershipStatus::Removed));
        assert!(MembershipStatus::Active.can_transition_to(MembershipStatus::Blocked));
    }

    #[test]
    fn invalid_transition_active_to_pending() {
        assert!(!MembershipStatus::Active.can_transition_to(MembershipStatus::Pending));
    }

    #[test]
    fn departed_statuses_are_terminal() {
        for status in [
            MembershipStatus::Left,
            MembershipStatus::Removed,
            MembershipStatus::Blocked,
        ] {
            assert!(status.is_departed());
            assert!(!status.can_transition_to(MembershipStatus::Active));
            assert!(!status.can_transition_to(MembershipStatus::Pending));
            assert!(status.can_reinvite());
        }
    }

    #[test]
    fn pending_cannot_skip_to_departed() {
        assert!(!MembershipStatus::Pending.can_transition_to(MembershipStatus::Left));
        assert!(!MembershipStatus::Pending.can_transition_to(MembershipStatus::Removed));
    }

    #[test]
    fn active_cannot_be_reinvited() {
        assert!(!MembershipStatus::Active.can_reinvite());
        assert!(MembershipStatus::Pending.can_reinvite());
    }

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!("Admin".parse::<TeamRole>().unwrap(), TeamRole::Admin);
        assert_eq!(" member ".parse::<TeamRole>().unwrap(), TeamRole::Member);
        assert!(matches!(
            "superuser".parse::<TeamRole>(),
            Err(TeamError::InvalidRole(_))
        ));
    }

    #[test]
    fn unknown_status_is_unsupported() {
        assert!(matches!(
            "archived".parse::<MembershipStatus>(),
            Err(TeamError::UnsupportedStatusTransition)
        ));
    }

    #[test]
    fn status_display() {
        assert_eq!(MembershipStatus::Pending.to_string(), "pending");
        assert_eq!(MembershipStatus::Active.to_string(), "active");
        assert_eq!(MembershipStatus::Left.to_string(), "left");
        assert_eq!(MembershipStatus::Removed.to_string(), "removed");
        assert_eq!(MembershipStatus::Blocked.to_string(), "blocked");
    }

    #[test]
    fn blank_team_name_rejected() {
        assert!(matches!(TeamName::new(""), Err(TeamError::InvalidTeamName)));
        assert!(matches!(TeamName::new(" \t "), Err(TeamError::InvalidTeamName)));
    }
}
