use async_trait::async_trait;

use super::errors::{StoreError, StoreResult};
use super::membership_repository::MembershipRepository;
use super::team_repository::TeamRepository;
use crate::domain::team::{Membership, Team};

/// The Team Store collaborator used by the membership service
///
/// Stores that can run several writes inside one transaction report it via
/// [`TeamStore::supports_transactions`] and implement the atomic operations.
/// Otherwise the service falls back to step-by-step writes with
/// compensating actions.
#[async_trait]
pub trait TeamStore: TeamRepository + MembershipRepository {
    /// Whether the atomic operations below are available
    fn supports_transactions(&self) -> bool {
        false
    }

    /// Insert a team and its owner membership atomically
    async fn create_team_with_owner(
        &self,
        _team: &Team,
        _owner: &Membership,
    ) -> StoreResult<(Team, Membership)> {
        Err(StoreError::Unsupported("create_team_with_owner"))
    }

    /// Persist demotion, promotion and the new team owner atomically
    ///
    /// Returns the team as stored.
    async fn transfer_ownership(
        &self,
        _team: &Team,
        _demoted: &Membership,
        _promoted: &Membership,
    ) -> StoreResult<Team> {
        Err(StoreError::Unsupported("transfer_ownership"))
    }

    /// Save a reopened membership and delete the invite it absorbed, atomically
    async fn reopen_from_invite(
        &self,
        _reopened: &Membership,
        _invite: &Membership,
    ) -> StoreResult<Membership> {
        Err(StoreError::Unsupported("reopen_from_invite"))
    }
}
