//! Membership domain service
//!
//! Owns every team/membership decision: the authorization gates, the
//! status state machine and the orchestration of multi-row writes. Storage
//! is delegated to an injected [`TeamStore`]; when the store can run
//! transactions the multi-step writes go through it atomically, otherwise
//! the service applies them one by one and compensates on failure.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::commands::{CreateTeam, InviteMember, UpdateMember, UpdateTeam};
use super::errors::{TeamError, TeamResult};
use super::events::TeamEvent;
use super::membership::Membership;
use super::team::Team;
use super::value_objects::{MembershipStatus, TeamRole};
use crate::domain::repositories::{MembershipWithTeam, StoreError, TeamStore};
use crate::domain::user::Email;

/// Tunable limits applied by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipPolicy {
    /// Maximum number of non-personal teams a user may own
    pub max_owned_teams: u32,
}

impl Default for MembershipPolicy {
    fn default() -> Self {
        Self { max_owned_teams: 2 }
    }
}

/// A team together with its active and pending members
#[derive(Debug, Clone)]
pub struct TeamDetails {
    pub team: Team,
    pub members: Vec<Membership>,
}

const VISIBLE_STATUSES: [MembershipStatus; 2] =
    [MembershipStatus::Active, MembershipStatus::Pending];

/// Membership domain service
///
/// Stateless between calls; every public method takes the caller's
/// verified user id and runs to completion.
pub struct MembershipService {
    store: Arc<dyn TeamStore>,
    policy: MembershipPolicy,
}

impl MembershipService {
    /// Create a service with the default policy
    pub fn new(store: Arc<dyn TeamStore>) -> Self {
        Self::with_policy(store, MembershipPolicy::default())
    }

    /// Create a service with an explicit policy
    pub fn with_policy(store: Arc<dyn TeamStore>, policy: MembershipPolicy) -> Self {
        Self { store, policy }
    }

    // ===== Authorization gates =====

    /// Loads the caller's membership and checks its status and role
    ///
    /// # Errors
    /// * `NotAMember` - No membership row for `(team_id, user_id)`
    /// * `StatusProhibited` - Status not in `allowed_statuses`
    /// * `InsufficientPermissions` - Role not in `allowed_roles`
    pub async fn require_membership(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        allowed_statuses: &[MembershipStatus],
        allowed_roles: &[TeamRole],
    ) -> TeamResult<Membership> {
        let membership = self
            .store
            .find_membership(team_id, user_id)
            .await?
            .ok_or(TeamError::NotAMember)?;

        if !allowed_statuses.contains(&membership.status()) {
            debug!(%team_id, %user_id, status = %membership.status(), "Membership status rejected");
            return Err(TeamError::StatusProhibited);
        }
        if !allowed_roles.contains(&membership.role()) {
            debug!(%team_id, %user_id, role = %membership.role(), "Membership role rejected");
            return Err(TeamError::InsufficientPermissions);
        }

        Ok(membership)
    }

    /// Any active member
    pub async fn require_active_member(&self, team_id: Uuid, user_id: Uuid) -> TeamResult<Membership> {
        self.require_membership(team_id, user_id, &[MembershipStatus::Active], &TeamRole::ALL)
            .await
    }

    /// Active owner or admin
    pub async fn assert_manager(&self, team_id: Uuid, user_id: Uuid) -> TeamResult<Membership> {
        self.require_membership(
            team_id,
            user_id,
            &[MembershipStatus::Active],
            &TeamRole::MANAGERS,
        )
        .await
    }

    /// Active owner
    pub async fn assert_owner(&self, team_id: Uuid, user_id: Uuid) -> TeamResult<Membership> {
        self.require_membership(
            team_id,
            user_id,
            &[MembershipStatus::Active],
            &[TeamRole::Owner],
        )
        .await
    }

    // ===== Queries =====

    /// Get a team by ID
    pub async fn get_team(&self, team_id: Uuid) -> TeamResult<Team> {
        self.store
            .find_team(team_id)
            .await?
            .ok_or(TeamError::TeamNotFound)
    }

    /// Get the membership bound to `(team_id, user_id)`, if any
    pub async fn get_membership(&self, team_id: Uuid, user_id: Uuid) -> TeamResult<Option<Membership>> {
        Ok(self.store.find_membership(team_id, user_id).await?)
    }

    /// Team plus its active and pending members, for active members only
    pub async fn team_details(&self, team_id: Uuid, actor: Uuid) -> TeamResult<TeamDetails> {
        self.require_active_member(team_id, actor).await?;

        let team = self.get_team(team_id).await?;
        let members = self.store.list_for_team(team_id, &VISIBLE_STATUSES).await?;

        Ok(TeamDetails { team, members })
    }

    /// Active and pending members of a team, for active members only
    pub async fn list_members(&self, team_id: Uuid, actor: Uuid) -> TeamResult<Vec<Membership>> {
        self.require_active_member(team_id, actor).await?;
        Ok(self.store.list_for_team(team_id, &VISIBLE_STATUSES).await?)
    }

    /// Teams the user belongs to, each with the user's membership
    pub async fn list_teams_for_user(
        &self,
        user_id: Uuid,
        include_pending: bool,
    ) -> TeamResult<Vec<MembershipWithTeam>> {
        Ok(self.store.list_for_user(user_id, include_pending).await?)
    }

    /// Pending invites addressed to the user, newest first
    pub async fn list_pending_invites(&self, user_id: Uuid) -> TeamResult<Vec<MembershipWithTeam>> {
        let mut invites: Vec<_> = self
            .store
            .list_for_user(user_id, true)
            .await?
            .into_iter()
            .filter(|row| row.membership.status() == MembershipStatus::Pending)
            .collect();
        invites.sort_by(|a, b| b.membership.invited_at().cmp(&a.membership.invited_at()));

        Ok(invites)
    }

    // ===== Team lifecycle =====

    /// Create a team together with its active owner membership
    ///
    /// # Business Rules
    /// - Name must not be blank
    /// - At most one personal team per user
    /// - At most `max_owned_teams` non-personal teams per owner
    /// - If the owner membership cannot be written the team is deleted again
    pub async fn create_team(&self, owner_id: Uuid, request: CreateTeam) -> TeamResult<Team> {
        let (team, event) = Team::new(
            &request.name,
            request.description,
            request.avatar_url,
            request.is_personal,
            owner_id,
        )?;

        if team.is_personal() {
            if self.store.has_personal_team(owner_id).await? {
                return Err(TeamError::PersonalTeamExists);
            }
        } else {
            let owned = self.store.count_non_personal_teams(owner_id).await?;
            if owned >= self.policy.max_owned_teams {
                return Err(TeamError::TeamLimitReached {
                    limit: self.policy.max_owned_teams,
                });
            }
        }

        let owner = Membership::owner(team.id(), owner_id);

        let created = if self.store.supports_transactions() {
            let (created, _) = self
                .store
                .create_team_with_owner(&team, &owner)
                .await
                .map_err(|source| match source {
                    StoreError::Conflict(_) if team.is_personal() => TeamError::PersonalTeamExists,
                    source => TeamError::MembershipCreationFailed { source },
                })?;
            created
        } else {
            self.create_team_compensating(&team, &owner).await?
        };

        self.record(&event);
        Ok(created)
    }

    async fn create_team_compensating(&self, team: &Team, owner: &Membership) -> TeamResult<Team> {
        let created = self
            .store
            .create_team(team)
            .await
            .map_err(|source| match source {
                StoreError::Conflict(_) if team.is_personal() => TeamError::PersonalTeamExists,
                source => TeamError::Storage(source),
            })?;

        if let Err(source) = self.store.create_membership(owner).await {
            warn!(team_id = %created.id(), error = %source, "Owner membership insert failed, deleting team");

            if let Err(rollback) = self.store.delete_team(created.id()).await {
                error!(
                    team_id = %created.id(),
                    error = %rollback,
                    "Compensating team delete failed, team left without owner membership"
                );
                return Err(TeamError::PartiallyApplied {
                    team_id: created.id(),
                    detail: format!(
                        "owner membership insert failed ({source}) and the team could not be deleted ({rollback})"
                    ),
                });
            }

            return Err(TeamError::MembershipCreationFailed { source });
        }

        Ok(created)
    }

    /// Return the user's personal team, creating it on first use
    ///
    /// An existing personal team gets its owner membership repaired if it
    /// is missing or not an active owner.
    pub async fn ensure_personal_team(&self, user_id: Uuid) -> TeamResult<Team> {
        if let Some(team) = self.store.find_personal_team(user_id).await? {
            self.ensure_owner_membership(&team, user_id).await?;
            return Ok(team);
        }

        match self.create_team(user_id, CreateTeam::personal()).await {
            Err(TeamError::PersonalTeamExists) => {
                // lost a race with a concurrent creator
                self.store
                    .find_personal_team(user_id)
                    .await?
                    .ok_or(TeamError::TeamNotFound)
            }
            other => other,
        }
    }

    async fn ensure_owner_membership(&self, team: &Team, user_id: Uuid) -> TeamResult<()> {
        match self.store.find_membership(team.id(), user_id).await? {
            None => {
                info!(team_id = %team.id(), %user_id, "Restoring missing personal owner membership");
                self.store
                    .create_membership(&Membership::owner(team.id(), user_id))
                    .await?;
            }
            Some(mut membership)
                if membership.role() != TeamRole::Owner
                    || membership.status() != MembershipStatus::Active =>
            {
                info!(team_id = %team.id(), %user_id, "Repairing personal owner membership");
                membership.reinstate_owner();
                self.store.update_membership(&membership).await?;
            }
            Some(_) => {}
        }
        Ok(())
    }

    /// Update name, description or avatar; managers only
    pub async fn update_team(&self, team_id: Uuid, actor: Uuid, request: UpdateTeam) -> TeamResult<Team> {
        self.assert_manager(team_id, actor).await?;

        let mut team = self.get_team(team_id).await?;
        let Some(event) = team.apply_update(
            request.name.as_deref(),
            request.description,
            request.avatar_url,
        )?
        else {
            return Ok(team);
        };

        let saved = self.store.update_team(&team).await.map_err(|source| match source {
            StoreError::NotFound(_) => TeamError::TeamNotFound,
            source => TeamError::Storage(source),
        })?;

        self.record(&event);
        Ok(saved)
    }

    /// Delete a team; owner only
    pub async fn delete_team(&self, team_id: Uuid, actor: Uuid) -> TeamResult<()> {
        self.assert_owner(team_id, actor).await?;

        self.store.delete_team(team_id).await.map_err(|source| match source {
            StoreError::NotFound(_) => TeamError::TeamNotFound,
            source => TeamError::Storage(source),
        })?;

        info!(%team_id, %actor, "Team deleted");
        Ok(())
    }

    /// Hand ownership from `actor` to the active member `target`
    ///
    /// The current owner is demoted to admin before the target is promoted,
    /// so the team never has two active owners.
    pub async fn transfer_ownership(&self, team_id: Uuid, actor: Uuid, target: Uuid) -> TeamResult<Team> {
        let mut outgoing = self.assert_owner(team_id, actor).await?;

        if target == actor {
            return Err(TeamError::InvalidOwnerTarget);
        }
        let mut incoming = match self.store.find_membership(team_id, target).await? {
            Some(membership) if membership.status() == MembershipStatus::Active => membership,
            _ => return Err(TeamError::InvalidOwnerTarget),
        };
        let mut team = self.get_team(team_id).await?;

        let previous_role = incoming.role();
        outgoing.demote_owner();
        incoming.promote_to_owner();
        let event = team.transfer_to(target);

        let saved = if self.store.supports_transactions() {
            self.store
                .transfer_ownership(&team, &outgoing, &incoming)
                .await
                .map_err(|source| TeamError::OwnershipTransferFailed { source })?
        } else {
            self.transfer_compensating(&team, &mut outgoing, &mut incoming, previous_role)
                .await?
        };

        self.record(&event);
        Ok(saved)
    }

    async fn transfer_compensating(
        &self,
        team: &Team,
        outgoing: &mut Membership,
        incoming: &mut Membership,
        previous_role: TeamRole,
    ) -> TeamResult<Team> {
        // nothing applied yet if the demotion itself fails
        self.store.update_membership(outgoing).await?;

        if let Err(source) = self.store.update_membership(incoming).await {
            outgoing.restore_role(TeamRole::Owner);
            return Err(self.revert_transfer(team.id(), &[&*outgoing], source).await);
        }

        match self.store.update_team(team).await {
            Ok(saved) => Ok(saved),
            Err(source) => {
                incoming.restore_role(previous_role);
                outgoing.restore_role(TeamRole::Owner);
                Err(self
                    .revert_transfer(team.id(), &[&*incoming, &*outgoing], source)
                    .await)
            }
        }
    }

    async fn revert_transfer(
        &self,
        team_id: Uuid,
        rollback: &[&Membership],
        source: StoreError,
    ) -> TeamError {
        warn!(%team_id, error = %source, "Ownership transfer failed, reverting");

        for membership in rollback {
            if let Err(revert) = self.store.update_membership(membership).await {
                error!(
                    %team_id,
                    membership_id = %membership.id(),
                    error = %revert,
                    "Ownership transfer revert failed"
                );
                return TeamError::PartiallyApplied {
                    team_id,
                    detail: format!(
                        "ownership transfer failed ({source}) and membership {} could not be restored ({revert})",
                        membership.id()
                    ),
                };
            }
        }

        TeamError::OwnershipTransferFailed { source }
    }

    // ===== Membership lifecycle =====

    /// Invite a user or e-mail address into a non-personal team; managers only
    ///
    /// Refreshes an existing pending invite and reopens departed
    /// memberships as pending. Active members cannot be invited again.
    pub async fn invite_member(
        &self,
        team_id: Uuid,
        actor: Uuid,
        request: InviteMember,
    ) -> TeamResult<Membership> {
        let email = Email::new(&request.email)?;

        let team = self.get_team(team_id).await?;
        if team.is_personal() {
            return Err(TeamError::CannotInvitePersonal);
        }
        self.assert_manager(team_id, actor).await?;

        let existing = match request.user_id {
            Some(user_id) => match self.store.find_membership(team_id, user_id).await? {
                Some(membership) => Some(membership),
                None => self
                    .store
                    .find_pending_by_email(team_id, email.as_str())
                    .await?
                    .filter(|membership| membership.user_id().is_none()),
            },
            None => self.store.find_by_email(team_id, email.as_str()).await?,
        };

        let (membership, event) = match existing {
            Some(mut membership) => {
                let event = membership.reinvite(request.user_id, email, request.role, actor)?;
                (self.store.update_membership(&membership).await?, event)
            }
            None => {
                let (membership, event) =
                    Membership::invite(team_id, request.user_id, email, request.role, actor)?;
                let created = self
                    .store
                    .create_membership(&membership)
                    .await
                    .map_err(|source| match source {
                        StoreError::Conflict(_) => TeamError::AlreadyMember,
                        source => TeamError::Storage(source),
                    })?;
                (created, event)
            }
        };

        self.record(&event);
        Ok(membership)
    }

    /// Accept a pending invite as `user_id`
    ///
    /// Looks the invite up by user id first, then by the caller's verified
    /// e-mail for invites that were sent before the user had an account.
    /// An invite bound to a different user id is never claimable by e-mail.
    ///
    /// A departed user who was re-invited by e-mail only has two rows: their
    /// old one and an unbound invite. The old row is reopened with the
    /// invite's terms and activated, and the invite row is deleted.
    pub async fn accept_invite(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        email: Option<&str>,
    ) -> TeamResult<Membership> {
        let email = email.map(Email::new).transpose()?;

        let by_user = self.store.find_membership(team_id, user_id).await?;
        let needs_invite = by_user
            .as_ref()
            .map_or(true, |membership| membership.status().is_departed());
        let by_email = match &email {
            Some(email) if needs_invite => self
                .store
                .find_pending_by_email(team_id, email.as_str())
                .await?
                .filter(|invite| invite.user_id().is_none() || invite.belongs_to(user_id)),
            _ => None,
        };

        let (saved, event) = match (by_user, by_email) {
            (Some(own), Some(invite)) => {
                self.accept_into_departed(user_id, own, &invite, email.as_ref())
                    .await?
            }
            (Some(mut membership), None) | (None, Some(mut membership)) => {
                let event = membership.accept(user_id, email.as_ref())?;
                (self.store.update_membership(&membership).await?, event)
            }
            (None, None) => return Err(TeamError::InviteNotFound),
        };

        self.record(&event);
        Ok(saved)
    }

    async fn accept_into_departed(
        &self,
        user_id: Uuid,
        departed: Membership,
        invite: &Membership,
        email: Option<&Email>,
    ) -> TeamResult<(Membership, TeamEvent)> {
        let mut reopened = departed.clone();
        reopened.reopen_from(invite)?;
        let event = reopened.accept(user_id, email)?;

        let saved = if self.store.supports_transactions() {
            self.store.reopen_from_invite(&reopened, invite).await?
        } else {
            let saved = self.store.update_membership(&reopened).await?;

            if let Err(source) = self.store.delete_membership(invite.id()).await {
                warn!(
                    team_id = %invite.team_id(),
                    membership_id = %invite.id(),
                    error = %source,
                    "Retiring accepted invite failed, restoring departed membership"
                );
                if let Err(revert) = self.store.update_membership(&departed).await {
                    error!(
                        team_id = %departed.team_id(),
                        membership_id = %departed.id(),
                        error = %revert,
                        "Restoring departed membership failed"
                    );
                    return Err(TeamError::PartiallyApplied {
                        team_id: departed.team_id(),
                        detail: format!(
                            "invite {} could not be retired ({source}) and membership {} could not be restored ({revert})",
                            invite.id(),
                            departed.id()
                        ),
                    });
                }
                return Err(TeamError::Storage(source));
            }
            saved
        };

        Ok((saved, event))
    }

    /// Change another member's role or status; managers only
    ///
    /// # Business Rules
    /// - Nobody changes their own role here (transfer or leave instead)
    /// - The owner role is only moved by [`MembershipService::transfer_ownership`]
    /// - Pending users activate themselves through [`MembershipService::accept_invite`]
    /// - Status changes follow the membership state machine
    pub async fn update_member(
        &self,
        team_id: Uuid,
        target: Uuid,
        actor: Uuid,
        request: UpdateMember,
    ) -> TeamResult<Membership> {
        let is_self = target == actor;

        if is_self && request.status == Some(MembershipStatus::Active) {
            if let Some(own) = self.store.find_membership(team_id, actor).await? {
                if own.status() == MembershipStatus::Pending {
                    return Err(TeamError::SelfActivationViaAccept);
                }
            }
        }

        let actor_membership = self.assert_manager(team_id, actor).await?;
        let mut membership = self
            .store
            .find_membership(team_id, target)
            .await?
            .ok_or(TeamError::MemberNotFound)?;

        let mut events = Vec::new();

        if let Some(role) = request.role {
            if is_self && role != membership.role() {
                return Err(TeamError::SelfRoleChangeForbidden);
            }
            if !actor_membership.role().is_manager() {
                return Err(TeamError::InsufficientPermissions);
            }
            events.extend(membership.change_role(role)?);
        }

        if let Some(status) = request.status {
            let event = match status {
                MembershipStatus::Active => membership.activate()?,
                MembershipStatus::Left if is_self => membership.leave()?,
                MembershipStatus::Removed if !is_self => membership.remove()?,
                MembershipStatus::Blocked if !is_self => membership.block()?,
                _ => return Err(TeamError::UnsupportedStatusTransition),
            };
            events.push(event);
        }

        if events.is_empty() {
            return Ok(membership);
        }

        let saved = self.store.update_membership(&membership).await?;
        for event in &events {
            self.record(event);
        }
        Ok(saved)
    }

    /// Remove `target` from the team, or leave it when `target == actor`
    pub async fn remove_member(&self, team_id: Uuid, target: Uuid, actor: Uuid) -> TeamResult<Membership> {
        let (mut membership, leaving) = if target == actor {
            (self.require_active_member(team_id, actor).await?, true)
        } else {
            self.assert_manager(team_id, actor).await?;
            let membership = self
                .store
                .find_membership(team_id, target)
                .await?
                .ok_or(TeamError::MemberNotFound)?;
            (membership, false)
        };

        let event = if leaving {
            membership.leave()?
        } else {
            membership.remove()?
        };
        let saved = self.store.update_membership(&membership).await?;

        self.record(&event);
        Ok(saved)
    }

    fn record(&self, event: &TeamEvent) {
        info!(event = event.name(), team_id = %event.team_id(), details = ?event, "Team event");
    }
}
