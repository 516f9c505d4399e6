use async_trait::async_trait;
use uuid::Uuid;

use super::errors::StoreResult;
use crate::domain::team::Team;

/// Repository trait for the Team aggregate
///
/// Defines the contract for persisting and retrieving teams.
/// Implementations should handle database-specific details.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Insert a new team
    async fn create_team(&self, team: &Team) -> StoreResult<Team>;

    /// Persist the editable fields and owner of an existing team
    async fn update_team(&self, team: &Team) -> StoreResult<Team>;

    /// Delete a team and, by cascade, its memberships
    async fn delete_team(&self, id: Uuid) -> StoreResult<()>;

    /// Find a team by its ID
    async fn find_team(&self, id: Uuid) -> StoreResult<Option<Team>>;

    /// Find the personal team owned by a user
    async fn find_personal_team(&self, user_id: Uuid) -> StoreResult<Option<Team>>;

    /// Whether the user already owns a personal team
    async fn has_personal_team(&self, user_id: Uuid) -> StoreResult<bool> {
        Ok(self.find_personal_team(user_id).await?.is_some())
    }

    /// Number of non-personal teams owned by a user
    async fn count_non_personal_teams(&self, user_id: Uuid) -> StoreResult<u32>;
}
