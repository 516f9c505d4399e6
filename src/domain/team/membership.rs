use super::errors::TeamError;
use super::events::TeamEvent;
use super::value_objects::{MembershipStatus, TeamRole};
use crate::domain::user::Email;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Membership entity binding one user (or one invited e-mail) to one team
///
/// Every role or status change goes through a method on this type, which
/// checks the transition and stamps the matching timestamps.
///
/// # Invariants
/// - An `Owner` membership is always `Active`
/// - `Active` never returns to `Pending`
/// - `Left`, `Removed` and `Blocked` only reopen through a re-invite
#[derive(Debug, Clone, PartialEq)]
pub struct Membership {
    id: Uuid,
    team_id: Uuid,
    user_id: Option<Uuid>,
    email: Option<String>,
    role: TeamRole,
    status: MembershipStatus,
    invited_by: Option<Uuid>,
    invited_at: Option<DateTime<Utc>>,
    joined_at: Option<DateTime<Utc>>,
    left_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Membership {
    /// Creates the active owner membership that accompanies a new team
    pub fn owner(team_id: Uuid, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            team_id,
            user_id: Some(user_id),
            email: None,
            role: TeamRole::Owner,
            status: MembershipStatus::Active,
            invited_by: None,
            invited_at: None,
            joined_at: Some(now),
            left_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a pending invite
    ///
    /// `user_id` may be unknown; the invite is then claimable by e-mail.
    ///
    /// # Example
    /// ```
    /// use prompt_teams_api::domain::team::{Membership, MembershipStatus, TeamRole};
    /// use prompt_teams_api::domain::user::Email;
    /// use uuid::Uuid;
    ///
    /// let email = Email::new("bob@example.com").unwrap();
    /// let (invite, _) = Membership::invite(Uuid::new_v4(), None, email, TeamRole::Member, Uuid::new_v4())
    ///     .expect("valid invite");
    ///
    /// assert_eq!(invite.status(), MembershipStatus::Pending);
    /// assert_eq!(invite.user_id(), None);
    /// ```
    pub fn invite(
        team_id: Uuid,
        user_id: Option<Uuid>,
        email: Email,
        role: TeamRole,
        invited_by: Uuid,
    ) -> Result<(Self, TeamEvent), TeamError> {
        if role == TeamRole::Owner {
            return Err(TeamError::UseTransferForOwner);
        }

        let now = Utc::now();
        let membership = Self {
            id: Uuid::new_v4(),
            team_id,
            user_id,
            email: Some(email.as_str().to_string()),
            role,
            status: MembershipStatus::Pending,
            invited_by: Some(invited_by),
            invited_at: Some(now),
            joined_at: None,
            left_at: None,
            created_at: now,
            updated_at: now,
        };

        let event = membership.invited_event();
        Ok((membership, event))
    }

    /// Refreshes a pending invite or reopens a departed membership as pending
    ///
    /// # Business Rules
    /// - Active members cannot be re-invited (`AlreadyMember`)
    /// - Reopening clears `joined_at` and `left_at`
    pub fn reinvite(
        &mut self,
        user_id: Option<Uuid>,
        email: Email,
        role: TeamRole,
        invited_by: Uuid,
    ) -> Result<TeamEvent, TeamError> {
        if !self.status.can_reinvite() {
            return Err(TeamError::AlreadyMember);
        }
        if role == TeamRole::Owner {
            return Err(TeamError::UseTransferForOwner);
        }

        let now = Utc::now();
        if self.status.is_departed() {
            self.status = MembershipStatus::Pending;
            self.joined_at = None;
            self.left_at = None;
        }
        if user_id.is_some() {
            self.user_id = user_id;
        }
        self.email = Some(email.as_str().to_string());
        self.role = role;
        self.invited_by = Some(invited_by);
        self.invited_at = Some(now);
        self.updated_at = now;

        Ok(self.invited_event())
    }

    /// Reopens a departed membership as pending with the terms of `invite`
    ///
    /// Used when a departed user was re-invited by e-mail only, which
    /// produced a second, unbound row. Role, inviter, invite time and
    /// e-mail are taken from that invite; the caller retires its row.
    pub(crate) fn reopen_from(&mut self, invite: &Membership) -> Result<(), TeamError> {
        if !self.status.is_departed() {
            return Err(TeamError::InviteNotPending);
        }

        self.status = MembershipStatus::Pending;
        self.role = invite.role;
        self.email = invite.email.clone();
        self.invited_by = invite.invited_by;
        self.invited_at = invite.invited_at;
        self.joined_at = None;
        self.left_at = None;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Accepts a pending invite on behalf of `user_id`
    ///
    /// Binds the user id and e-mail when the invite did not carry them yet.
    pub fn accept(&mut self, user_id: Uuid, email: Option<&Email>) -> Result<TeamEvent, TeamError> {
        if self.status != MembershipStatus::Pending {
            return Err(TeamError::InviteNotPending);
        }

        if self.user_id.is_none() {
            self.user_id = Some(user_id);
        }
        if self.email.is_none() {
            self.email = email.map(|e| e.as_str().to_string());
        }

        self.activate()
    }

    /// Moves a pending membership to active
    pub fn activate(&mut self) -> Result<TeamEvent, TeamError> {
        self.transition(MembershipStatus::Active)?;
        self.joined_at = Some(self.updated_at);

        Ok(TeamEvent::MemberJoined {
            team_id: self.team_id,
            membership_id: self.id,
            user_id: self.user_id,
        })
    }

    /// Member leaves the team on their own
    pub fn leave(&mut self) -> Result<TeamEvent, TeamError> {
        if self.role == TeamRole::Owner {
            return Err(TeamError::TransferOwnershipRequired);
        }
        self.depart(MembershipStatus::Left)
    }

    /// A manager removes the member
    pub fn remove(&mut self) -> Result<TeamEvent, TeamError> {
        if self.role == TeamRole::Owner {
            return Err(TeamError::CannotRemoveOwner);
        }
        self.depart(MembershipStatus::Removed)
    }

    /// A manager blocks the member
    pub fn block(&mut self) -> Result<TeamEvent, TeamError> {
        if self.role == TeamRole::Owner {
            return Err(TeamError::CannotRemoveOwner);
        }
        self.depart(MembershipStatus::Blocked)
    }

    /// Changes the role of a non-owner member
    ///
    /// Returns `Ok(None)` when the role is unchanged. The owner role is
    /// neither granted nor revoked here; that is what transfer is for.
    pub fn change_role(&mut self, role: TeamRole) -> Result<Option<TeamEvent>, TeamError> {
        if self.role == TeamRole::Owner || role == TeamRole::Owner {
            if self.role == role {
                return Ok(None);
            }
            return Err(TeamError::UseTransferForOwner);
        }
        if self.role == role {
            return Ok(None);
        }

        let from = self.role;
        self.role = role;
        self.updated_at = Utc::now();

        Ok(Some(TeamEvent::RoleChanged {
            team_id: self.team_id,
            membership_id: self.id,
            from,
            to: role,
        }))
    }

    /// Step one of an ownership transfer: the owner becomes an admin
    pub(crate) fn demote_owner(&mut self) {
        self.role = TeamRole::Admin;
        self.updated_at = Utc::now();
    }

    /// Step two of an ownership transfer: the target becomes the active owner
    pub(crate) fn promote_to_owner(&mut self) {
        self.role = TeamRole::Owner;
        self.status = MembershipStatus::Active;
        self.updated_at = Utc::now();
    }

    /// Compensation for a failed transfer
    pub(crate) fn restore_role(&mut self, role: TeamRole) {
        self.role = role;
        self.updated_at = Utc::now();
    }

    /// Repairs the owner membership of a personal team
    pub(crate) fn reinstate_owner(&mut self) {
        let now = Utc::now();
        self.role = TeamRole::Owner;
        self.status = MembershipStatus::Active;
        self.joined_at.get_or_insert(now);
        self.left_at = None;
        self.updated_at = now;
    }

    fn depart(&mut self, next: MembershipStatus) -> Result<TeamEvent, TeamError> {
        self.transition(next)?;
        self.left_at = Some(self.updated_at);

        Ok(TeamEvent::MemberDeparted {
            team_id: self.team_id,
            membership_id: self.id,
            status: next,
        })
    }

    fn transition(&mut self, next: MembershipStatus) -> Result<(), TeamError> {
        if !self.status.can_transition_to(next) {
            return Err(TeamError::UnsupportedStatusTransition);
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn invited_event(&self) -> TeamEvent {
        TeamEvent::MemberInvited {
            team_id: self.team_id,
            membership_id: self.id,
            invited_by: self.invited_by.unwrap_or_default(),
            role: self.role,
        }
    }

    /// Returns true if this membership is bound to `user_id`
    pub fn belongs_to(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn team_id(&self) -> Uuid {
        self.team_id
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn role(&self) -> TeamRole {
        self.role
    }

    pub fn status(&self) -> MembershipStatus {
        self.status
    }

    pub fn invited_by(&self) -> Option<Uuid> {
        self.invited_by
    }

    pub fn invited_at(&self) -> Option<DateTime<Utc>> {
        self.invited_at
    }

    pub fn joined_at(&self) -> Option<DateTime<Utc>> {
        self.joined_at
    }

    pub fn left_at(&self) -> Option<DateTime<Utc>> {
        self.left_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Reconstructs a Membership from persistence layer data
    ///
    /// Bypasses validation; only for store implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        team_id: Uuid,
        user_id: Option<Uuid>,
        email: Option<String>,
        role: TeamRole,
        status: MembershipStatus,
        invited_by: Option<Uuid>,
        invited_at: Option<DateTime<Utc>>,
        joined_at: Option<DateTime<Utc>>,
        left_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            team_id,
            user_id,
            email,
            role,
            status,
            invited_by,
            invited_at,
            joined_at,
            left_at,
            created_at,
            updated_at,
        }
    }
}
