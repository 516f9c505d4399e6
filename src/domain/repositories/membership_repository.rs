use async_trait::async_trait;
use uuid::Uuid;

use super::errors::StoreResult;
use crate::domain::team::{Membership, MembershipStatus, Team};

/// A membership row joined with its parent team
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipWithTeam {
    pub membership: Membership,
    pub team: Team,
}

/// Repository trait for Membership entities
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Insert a new membership
    async fn create_membership(&self, membership: &Membership) -> StoreResult<Membership>;

    /// Persist role, status, binding and timestamps of an existing membership
    async fn update_membership(&self, membership: &Membership) -> StoreResult<Membership>;

    /// Delete a single membership row
    async fn delete_membership(&self, id: Uuid) -> StoreResult<()>;

    /// Find the membership bound to `(team_id, user_id)`
    async fn find_membership(&self, team_id: Uuid, user_id: Uuid)
        -> StoreResult<Option<Membership>>;

    /// Find a pending invite addressed to `email` (already normalized)
    async fn find_pending_by_email(
        &self,
        team_id: Uuid,
        email: &str,
    ) -> StoreResult<Option<Membership>>;

    /// Find the most recent membership of any status addressed to `email`
    async fn find_by_email(&self, team_id: Uuid, email: &str) -> StoreResult<Option<Membership>>;

    /// Active memberships of a user (plus pending ones if asked), oldest first
    async fn list_for_user(
        &self,
        user_id: Uuid,
        include_pending: bool,
    ) -> StoreResult<Vec<MembershipWithTeam>>;

    /// Memberships of a team restricted to `statuses`, oldest first
    async fn list_for_team(
        &self,
        team_id: Uuid,
        statuses: &[MembershipStatus],
    ) -> StoreResult<Vec<Membership>>;
}
