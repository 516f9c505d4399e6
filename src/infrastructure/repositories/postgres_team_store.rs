use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgExecutor;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::repositories::{
    MembershipRepository, MembershipWithTeam, StoreError, StoreResult, TeamRepository, TeamStore,
};
use crate::domain::team::{Membership, MembershipStatus, Team, TeamRole};

const TEAM_COLUMNS: &str = "id, name, description, avatar_url, is_personal, owner_id, \
                            created_by, created_at, updated_at";

const MEMBER_COLUMNS: &str = "id, team_id, user_id, email, role, status, invited_by, \
                              invited_at, joined_at, left_at, created_at, updated_at";

/// PostgreSQL implementation of TeamStore
///
/// Persists teams and memberships using SQLx against PostgreSQL. Supports
/// transactions, so team creation and ownership transfer are atomic.
pub struct PostgresTeamStore {
    pool: PgPool,
}

impl PostgresTeamStore {
    /// Creates a new PostgresTeamStore
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TeamRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    avatar_url: Option<String>,
    is_personal: bool,
    owner_id: Uuid,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TeamRow> for Team {
    fn from(r: TeamRow) -> Self {
        Team::from_persistence(
            r.id,
            r.name,
            r.description,
            r.avatar_url,
            r.is_personal,
            r.owner_id,
            r.created_by,
            r.created_at,
            r.updated_at,
        )
    }
}

#[derive(Debug, FromRow)]
struct MembershipRow {
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

impl From<MembershipRow> for Membership {
    fn from(r: MembershipRow) -> Self {
        Membership::from_persistence(
            r.id,
            r.team_id,
            r.user_id,
            r.email,
            r.role,
            r.status,
            r.invited_by,
            r.invited_at,
            r.joined_at,
            r.left_at,
            r.created_at,
            r.updated_at,
        )
    }
}

/// Membership joined with its team, column names prefixed to avoid clashes
#[derive(Debug, FromRow)]
struct MembershipTeamRow {
    #[sqlx(flatten)]
    membership: MembershipRow,
    team_name: String,
    team_description: Option<String>,
    team_avatar_url: Option<String>,
    team_is_personal: bool,
    team_owner_id: Uuid,
    team_created_by: Uuid,
    team_created_at: DateTime<Utc>,
    team_updated_at: DateTime<Utc>,
}

impl From<MembershipTeamRow> for MembershipWithTeam {
    fn from(r: MembershipTeamRow) -> Self {
        let team = Team::from_persistence(
            r.membership.team_id,
            r.team_name,
            r.team_description,
            r.team_avatar_url,
            r.team_is_personal,
            r.team_owner_id,
            r.team_created_by,
            r.team_created_at,
            r.team_updated_at,
        );
        MembershipWithTeam {
            membership: r.membership.into(),
            team,
        }
    }
}

fn map_err(context: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(format!("{context}: {db_err}"));
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::NotFound(format!("{context}: {db_err}"));
        }
    }
    StoreError::Database(format!("Failed to {context}: {err}"))
}

// Statement helpers shared by the pooled and transactional paths

async fn insert_team<'e>(executor: impl PgExecutor<'e>, team: &Team) -> StoreResult<Team> {
    let sql = format!(
        "INSERT INTO teams ({TEAM_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {TEAM_COLUMNS}"
    );
    let row = sqlx::query_as::<_, TeamRow>(&sql)
        .bind(team.id())
        .bind(team.name())
        .bind(team.description())
        .bind(team.avatar_url())
        .bind(team.is_personal())
        .bind(team.owner_id())
        .bind(team.created_by())
        .bind(team.created_at())
        .bind(team.updated_at())
        .fetch_one(executor)
        .await
        .map_err(|e| map_err("insert team", e))?;

    Ok(row.into())
}

async fn save_team<'e>(executor: impl PgExecutor<'e>, team: &Team) -> StoreResult<Team> {
    let sql = format!(
        "UPDATE teams \
         SET name = $2, description = $3, avatar_url = $4, owner_id = $5, updated_at = $6 \
         WHERE id = $1 \
         RETURNING {TEAM_COLUMNS}"
    );
    let row = sqlx::query_as::<_, TeamRow>(&sql)
        .bind(team.id())
        .bind(team.name())
        .bind(team.description())
        .bind(team.avatar_url())
        .bind(team.owner_id())
        .bind(team.updated_at())
        .fetch_optional(executor)
        .await
        .map_err(|e| map_err("update team", e))?;

    row.map(Team::from)
        .ok_or_else(|| StoreError::NotFound(format!("team {}", team.id())))
}

async fn insert_membership<'e>(
    executor: impl PgExecutor<'e>,
    membership: &Membership,
) -> StoreResult<Membership> {
    let sql = format!(
        "INSERT INTO team_members ({MEMBER_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING {MEMBER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, MembershipRow>(&sql)
        .bind(membership.id())
        .bind(membership.team_id())
        .bind(membership.user_id())
        .bind(membership.email())
        .bind(membership.role())
        .bind(membership.status())
        .bind(membership.invited_by())
        .bind(membership.invited_at())
        .bind(membership.joined_at())
        .bind(membership.left_at())
        .bind(membership.created_at())
        .bind(membership.updated_at())
        .fetch_one(executor)
        .await
        .map_err(|e| map_err("insert membership", e))?;

    Ok(row.into())
}

async fn save_membership<'e>(
    executor: impl PgExecutor<'e>,
    membership: &Membership,
) -> StoreResult<Membership> {
    let sql = format!(
        "UPDATE team_members \
         SET user_id = $2, email = $3, role = $4, status = $5, invited_by = $6, \
             invited_at = $7, joined_at = $8, left_at = $9, updated_at = $10 \
         WHERE id = $1 \
         RETURNING {MEMBER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, MembershipRow>(&sql)
        .bind(membership.id())
        .bind(membership.user_id())
        .bind(membership.email())
        .bind(membership.role())
        .bind(membership.status())
        .bind(membership.invited_by())
        .bind(membership.invited_at())
        .bind(membership.joined_at())
        .bind(membership.left_at())
        .bind(membership.updated_at())
        .fetch_optional(executor)
        .await
        .map_err(|e| map_err("update membership", e))?;

    row.map(Membership::from)
        .ok_or_else(|| StoreError::NotFound(format!("membership {}", membership.id())))
}

async fn remove_membership<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM team_members WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .map_err(|e| map_err("delete membership", e))?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!("membership {id}")));
    }
    Ok(())
}

#[async_trait]
impl TeamRepository for PostgresTeamStore {
    async fn create_team(&self, team: &Team) -> StoreResult<Team> {
        insert_team(&self.pool, team).await
    }

    async fn update_team(&self, team: &Team) -> StoreResult<Team> {
        save_team(&self.pool, team).await
    }

    async fn delete_team(&self, id: Uuid) -> StoreResult<()> {
        // team_members rows go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_err("delete team", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("team {id}")));
        }
        Ok(())
    }

    async fn find_team(&self, id: Uuid) -> StoreResult<Option<Team>> {
        let sql = format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1");
        let row = sqlx::query_as::<_, TeamRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_err("find team by id", e))?;

        Ok(row.map(Team::from))
    }

    async fn find_personal_team(&self, user_id: Uuid) -> StoreResult<Option<Team>> {
        let sql = format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE owner_id = $1 AND is_personal = TRUE LIMIT 1"
        );
        let row = sqlx::query_as::<_, TeamRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_err("find personal team", e))?;

        Ok(row.map(Team::from))
    }

    async fn has_personal_team(&self, user_id: Uuid) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM teams WHERE owner_id = $1 AND is_personal = TRUE)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err("check personal team", e))?;

        Ok(exists)
    }

    async fn count_non_personal_teams(&self, user_id: Uuid) -> StoreResult<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM teams WHERE owner_id = $1 AND is_personal = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err("count owned teams", e))?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

#[async_trait]
impl MembershipRepository for PostgresTeamStore {
    async fn create_membership(&self, membership: &Membership) -> StoreResult<Membership> {
        insert_membership(&self.pool, membership).await
    }

    async fn update_membership(&self, membership: &Membership) -> StoreResult<Membership> {
        save_membership(&self.pool, membership).await
    }

    async fn delete_membership(&self, id: Uuid) -> StoreResult<()> {
        remove_membership(&self.pool, id).await
    }

    async fn find_membership(&self, team_id: Uuid, user_id: Uuid) -> StoreResult<Option<Membership>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members WHERE team_id = $1 AND user_id = $2"
        );
        let row = sqlx::query_as::<_, MembershipRow>(&sql)
            .bind(team_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_err("find membership", e))?;

        Ok(row.map(Membership::from))
    }

    async fn find_pending_by_email(&self, team_id: Uuid, email: &str) -> StoreResult<Option<Membership>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members \
             WHERE team_id = $1 AND email = $2 AND status = 'pending' \
             ORDER BY created_at ASC LIMIT 1"
        );
        let row = sqlx::query_as::<_, MembershipRow>(&sql)
            .bind(team_id)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_err("find pending invite", e))?;

        Ok(row.map(Membership::from))
    }

    async fn find_by_email(&self, team_id: Uuid, email: &str) -> StoreResult<Option<Membership>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members \
             WHERE team_id = $1 AND email = $2 \
             ORDER BY created_at DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, MembershipRow>(&sql)
            .bind(team_id)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_err("find membership by email", e))?;

        Ok(row.map(Membership::from))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        include_pending: bool,
    ) -> StoreResult<Vec<MembershipWithTeam>> {
        let mut statuses = vec![MembershipStatus::Active.to_string()];
        if include_pending {
            statuses.push(MembershipStatus::Pending.to_string());
        }

        let rows = sqlx::query_as::<_, MembershipTeamRow>(
            r#"
            SELECT
                m.id, m.team_id, m.user_id, m.email, m.role, m.status, m.invited_by,
                m.invited_at, m.joined_at, m.left_at, m.created_at, m.updated_at,
                t.name AS team_name,
                t.description AS team_description,
                t.avatar_url AS team_avatar_url,
                t.is_personal AS team_is_personal,
                t.owner_id AS team_owner_id,
                t.created_by AS team_created_by,
                t.created_at AS team_created_at,
                t.updated_at AS team_updated_at
            FROM team_members m
            JOIN teams t ON t.id = m.team_id
            WHERE m.user_id = $1 AND m.status::text = ANY($2)
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(statuses)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_err("list memberships for user", e))?;

        Ok(rows.into_iter().map(MembershipWithTeam::from).collect())
    }

    async fn list_for_team(
        &self,
        team_id: Uuid,
        statuses: &[MembershipStatus],
    ) -> StoreResult<Vec<Membership>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members \
             WHERE team_id = $1 AND status::text = ANY($2) \
             ORDER BY created_at ASC"
        );
        let statuses: Vec<String> = statuses.iter().map(ToString::to_string).collect();
        let rows = sqlx::query_as::<_, MembershipRow>(&sql)
            .bind(team_id)
            .bind(statuses)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_err("list team members", e))?;

        Ok(rows.into_iter().map(Membership::from).collect())
    }
}

#[async_trait]
impl TeamStore for PostgresTeamStore {
    fn supports_transactions(&self) -> bool {
        true
    }

    async fn create_team_with_owner(
        &self,
        team: &Team,
        owner: &Membership,
    ) -> StoreResult<(Team, Membership)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_err("begin transaction", e))?;

        let team = insert_team(&mut *tx, team).await?;
        let owner = insert_membership(&mut *tx, owner).await?;

        tx.commit()
            .await
            .map_err(|e| map_err("commit team creation", e))?;

        Ok((team, owner))
    }

    async fn transfer_ownership(
        &self,
        team: &Team,
        demoted: &Membership,
        promoted: &Membership,
    ) -> StoreResult<Team> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_err("begin transaction", e))?;

        // demote first; the partial unique index allows one active owner
        save_membership(&mut *tx, demoted).await?;
        save_membership(&mut *tx, promoted).await?;
        let team = save_team(&mut *tx, team).await?;

        tx.commit()
            .await
            .map_err(|e| map_err("commit ownership transfer", e))?;

        Ok(team)
    }

    async fn reopen_from_invite(
        &self,
        reopened: &Membership,
        invite: &Membership,
    ) -> StoreResult<Membership> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_err("begin transaction", e))?;

        remove_membership(&mut *tx, invite.id()).await?;
        let membership = save_membership(&mut *tx, reopened).await?;

        tx.commit()
            .await
            .map_err(|e| map_err("commit invite acceptance", e))?;

        Ok(membership)
    }
}
