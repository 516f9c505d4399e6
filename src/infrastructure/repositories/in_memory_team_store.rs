//! In-memory Team Store
//!
//! Mirrors the constraints of the PostgreSQL schema (one personal team per
//! owner, one membership per `(team, user)`, one active owner per team,
//! cascading deletes) so the service sees the same failures it would in
//! production. Writes are applied one at a time; it does not offer
//! transactions, which makes the service take its compensating path.
//!
//! Failures can be injected per operation with
//! [`InMemoryTeamStore::fail_nth`] to exercise those compensating paths.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::repositories::{
    MembershipRepository, MembershipWithTeam, StoreError, StoreResult, TeamRepository, TeamStore,
};
use crate::domain::team::{Membership, MembershipStatus, Team, TeamRole};

/// Write operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    CreateTeam,
    UpdateTeam,
    DeleteTeam,
    CreateMembership,
    UpdateMembership,
    DeleteMembership,
}

#[derive(Debug, Default)]
struct State {
    teams: HashMap<Uuid, Team>,
    // insertion order doubles as creation order
    memberships: Vec<Membership>,
    calls: HashMap<StoreOp, u64>,
    failures: HashMap<StoreOp, HashSet<u64>>,
}

impl State {
    fn check_fault(&mut self, op: StoreOp) -> StoreResult<()> {
        let call = self.calls.entry(op).or_insert(0);
        *call += 1;

        if self
            .failures
            .get_mut(&op)
            .is_some_and(|planned| planned.remove(call))
        {
            return Err(StoreError::Database(format!("injected failure on {op:?}")));
        }
        Ok(())
    }

    fn check_single_owner(&self, membership: &Membership) -> StoreResult<()> {
        if membership.role() != TeamRole::Owner || membership.status() != MembershipStatus::Active {
            return Ok(());
        }
        let clash = self.memberships.iter().any(|m| {
            m.team_id() == membership.team_id()
                && m.id() != membership.id()
                && m.role() == TeamRole::Owner
                && m.status() == MembershipStatus::Active
        });
        if clash {
            return Err(StoreError::Conflict(format!(
                "team {} already has an active owner",
                membership.team_id()
            )));
        }
        Ok(())
    }

    fn with_team(&self, membership: &Membership) -> Option<MembershipWithTeam> {
        self.teams
            .get(&membership.team_id())
            .map(|team| MembershipWithTeam {
                membership: membership.clone(),
                team: team.clone(),
            })
    }
}

/// In-memory implementation of [`TeamStore`]
#[derive(Debug, Default)]
pub struct InMemoryTeamStore {
    state: RwLock<State>,
}

impl InMemoryTeamStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `nth` future call of `op` fail (1 = the next call)
    ///
    /// Can be called several times to fail several calls.
    pub async fn fail_nth(&self, op: StoreOp, nth: u64) {
        let mut state = self.state.write().await;
        let made = state.calls.get(&op).copied().unwrap_or(0);
        state.failures.entry(op).or_default().insert(made + nth);
    }

    /// Every team currently stored
    pub async fn teams(&self) -> Vec<Team> {
        self.state.read().await.teams.values().cloned().collect()
    }

    /// Every membership of a team regardless of status
    pub async fn memberships_of(&self, team_id: Uuid) -> Vec<Membership> {
        self.state
            .read()
            .await
            .memberships
            .iter()
            .filter(|m| m.team_id() == team_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TeamRepository for InMemoryTeamStore {
    async fn create_team(&self, team: &Team) -> StoreResult<Team> {
        let mut state = self.state.write().await;
        state.check_fault(StoreOp::CreateTeam)?;

        if state.teams.contains_key(&team.id()) {
            return Err(StoreError::Conflict(format!("team {} already exists", team.id())));
        }
        if team.is_personal()
            && state
                .teams
                .values()
                .any(|t| t.is_personal() && t.owner_id() == team.owner_id())
        {
            return Err(StoreError::Conflict(format!(
                "user {} already owns a personal team",
                team.owner_id()
            )));
        }

        state.teams.insert(team.id(), team.clone());
        Ok(team.clone())
    }

    async fn update_team(&self, team: &Team) -> StoreResult<Team> {
        let mut state = self.state.write().await;
        state.check_fault(StoreOp::UpdateTeam)?;

        match state.teams.get_mut(&team.id()) {
            Some(stored) => {
                *stored = team.clone();
                Ok(team.clone())
            }
            None => Err(StoreError::NotFound(format!("team {}", team.id()))),
        }
    }

    async fn delete_team(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.check_fault(StoreOp::DeleteTeam)?;

        if state.teams.remove(&id).is_none() {
            return Err(StoreError::NotFound(format!("team {id}")));
        }
        state.memberships.retain(|m| m.team_id() != id);
        Ok(())
    }

    async fn find_team(&self, id: Uuid) -> StoreResult<Option<Team>> {
        Ok(self.state.read().await.teams.get(&id).cloned())
    }

    async fn find_personal_team(&self, user_id: Uuid) -> StoreResult<Option<Team>> {
        let state = self.state.read().await;
        Ok(state
            .teams
            .values()
            .find(|t| t.is_personal() && t.owner_id() == user_id)
            .cloned())
    }

    async fn count_non_personal_teams(&self, user_id: Uuid) -> StoreResult<u32> {
        let state = self.state.read().await;
        let count = state
            .teams
            .values()
            .filter(|t| !t.is_personal() && t.owner_id() == user_id)
            .count();
        Ok(count as u32)
    }
}

#[async_trait]
impl MembershipRepository for InMemoryTeamStore {
    async fn create_membership(&self, membership: &Membership) -> StoreResult<Membership> {
        let mut state = self.state.write().await;
        state.check_fault(StoreOp::CreateMembership)?;

        if !state.teams.contains_key(&membership.team_id()) {
            return Err(StoreError::NotFound(format!("team {}", membership.team_id())));
        }
        if let Some(user_id) = membership.user_id() {
            let duplicate = state
                .memberships
                .iter()
                .any(|m| m.team_id() == membership.team_id() && m.belongs_to(user_id));
            if duplicate {
                return Err(StoreError::Conflict(format!(
                    "user {user_id} already has a membership in team {}",
                    membership.team_id()
                )));
            }
        }
        state.check_single_owner(membership)?;

        state.memberships.push(membership.clone());
        Ok(membership.clone())
    }

    async fn update_membership(&self, membership: &Membership) -> StoreResult<Membership> {
        let mut state = self.state.write().await;
        state.check_fault(StoreOp::UpdateMembership)?;
        state.check_single_owner(membership)?;

        match state.memberships.iter_mut().find(|m| m.id() == membership.id()) {
            Some(stored) => {
                *stored = membership.clone();
                Ok(membership.clone())
            }
            None => Err(StoreError::NotFound(format!("membership {}", membership.id()))),
        }
    }

    async fn delete_membership(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.check_fault(StoreOp::DeleteMembership)?;

        let before = state.memberships.len();
        state.memberships.retain(|m| m.id() != id);
        if state.memberships.len() == before {
            return Err(StoreError::NotFound(format!("membership {id}")));
        }
        Ok(())
    }

    async fn find_membership(&self, team_id: Uuid, user_id: Uuid) -> StoreResult<Option<Membership>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .find(|m| m.team_id() == team_id && m.belongs_to(user_id))
            .cloned())
    }

    async fn find_pending_by_email(&self, team_id: Uuid, email: &str) -> StoreResult<Option<Membership>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .find(|m| {
                m.team_id() == team_id
                    && m.status() == MembershipStatus::Pending
                    && m.email() == Some(email)
            })
            .cloned())
    }

    async fn find_by_email(&self, team_id: Uuid, email: &str) -> StoreResult<Option<Membership>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .rev()
            .find(|m| m.team_id() == team_id && m.email() == Some(email))
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        include_pending: bool,
    ) -> StoreResult<Vec<MembershipWithTeam>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .filter(|m| m.belongs_to(user_id))
            .filter(|m| {
                m.status() == MembershipStatus::Active
                    || (include_pending && m.status() == MembershipStatus::Pending)
            })
            .filter_map(|m| state.with_team(m))
            .collect())
    }

    async fn list_for_team(
        &self,
        team_id: Uuid,
        statuses: &[MembershipStatus],
    ) -> StoreResult<Vec<Membership>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .filter(|m| m.team_id() == team_id && statuses.contains(&m.status()))
            .cloned()
            .collect())
    }
}

impl TeamStore for InMemoryTeamStore {}
