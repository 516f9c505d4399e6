//! PostgreSQL Team Store integration tests
//!
//! Need a reachable database in `DATABASE_URL`; run with
//! `cargo test -- --ignored`. Migrations are applied on connect and every
//! test works on its own freshly generated users and teams.

use std::sync::Arc;

use prompt_teams_api::domain::repositories::{
    MembershipRepository, StoreError, TeamRepository, TeamStore,
};
use prompt_teams_api::domain::team::{
    CreateTeam, InviteMember, Membership, MembershipService, MembershipStatus, Team, TeamRole,
};
use prompt_teams_api::infrastructure::repositories::PostgresTeamStore;
use sqlx::PgPool;
use uuid::Uuid;

/// Setup test database connection
async fn setup_test_db() -> PgPool {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

fn new_team(owner: Uuid, personal: bool) -> Team {
    Team::new("Store Test Team", None, None, personal, owner)
        .expect("valid team")
        .0
}

#[tokio::test]
#[ignore]
async fn test_create_team_with_owner_and_find() {
    let store = PostgresTeamStore::new(setup_test_db().await);
    let owner = Uuid::new_v4();
    let team = new_team(owner, false);

    let (created, membership) = store
        .create_team_with_owner(&team, &Membership::owner(team.id(), owner))
        .await
        .expect("Failed to create team");

    assert_eq!(created.id(), team.id());
    assert_eq!(membership.role(), TeamRole::Owner);

    let found = store.find_team(team.id()).await.unwrap().expect("team exists");
    assert_eq!(found.name(), "Store Test Team");
    assert_eq!(store.count_non_personal_teams(owner).await.unwrap(), 1);

    let member = store
        .find_membership(team.id(), owner)
        .await
        .unwrap()
        .expect("membership exists");
    assert_eq!(member.status(), MembershipStatus::Active);

    store.delete_team(team.id()).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_second_personal_team_is_a_conflict() {
    let store = PostgresTeamStore::new(setup_test_db().await);
    let owner = Uuid::new_v4();
    let first = new_team(owner, true);
    store.create_team(&first).await.unwrap();

    let result = store.create_team(&new_team(owner, true)).await;

    assert!(matches!(result, Err(StoreError::Conflict(_))));
    assert!(store.has_personal_team(owner).await.unwrap());

    store.delete_team(first.id()).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_second_active_owner_is_a_conflict() {
    let store = PostgresTeamStore::new(setup_test_db().await);
    let owner = Uuid::new_v4();
    let team = new_team(owner, false);
    store
        .create_team_with_owner(&team, &Membership::owner(team.id(), owner))
        .await
        .unwrap();

    let result = store
        .create_membership(&Membership::owner(team.id(), Uuid::new_v4()))
        .await;

    assert!(matches!(result, Err(StoreError::Conflict(_))));

    store.delete_team(team.id()).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_failed_team_insert_rolls_back_transaction() {
    let store = PostgresTeamStore::new(setup_test_db().await);
    let owner = Uuid::new_v4();
    let team = new_team(owner, false);
    // owner membership pointing at another team violates the foreign key
    let stray = Membership::owner(Uuid::new_v4(), owner);

    let result = store.create_team_with_owner(&team, &stray).await;

    assert!(result.is_err());
    assert!(store.find_team(team.id()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn test_delete_cascades_memberships() {
    let store = PostgresTeamStore::new(setup_test_db().await);
    let owner = Uuid::new_v4();
    let team = new_team(owner, false);
    store
        .create_team_with_owner(&team, &Membership::owner(team.id(), owner))
        .await
        .unwrap();

    store.delete_team(team.id()).await.unwrap();

    assert!(store.find_membership(team.id(), owner).await.unwrap().is_none());
    assert!(matches!(
        store.delete_team(team.id()).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore]
async fn test_service_flow_over_postgres() {
    let store = Arc::new(PostgresTeamStore::new(setup_test_db().await));
    let service = MembershipService::new(store.clone());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let email = format!("bob-{}@example.com", bob);

    let team = service
        .create_team(alice, CreateTeam::named("Postgres Flow"))
        .await
        .unwrap();
    service
        .invite_member(team.id(), alice, InviteMember::by_email(email.as_str()))
        .await
        .unwrap();
    service
        .accept_invite(team.id(), bob, Some(email.as_str()))
        .await
        .unwrap();

    let team = service
        .transfer_ownership(team.id(), alice, bob)
        .await
        .unwrap();
    assert_eq!(team.owner_id(), bob);

    let members = store
        .list_for_team(team.id(), &[MembershipStatus::Active])
        .await
        .unwrap();
    let owners: Vec<_> = members
        .iter()
        .filter(|m| m.role() == TeamRole::Owner)
        .collect();
    assert_eq!(owners.len(), 1);
    assert!(owners[0].belongs_to(bob));

    let listed = store.list_for_user(bob, false).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].team.owner_id(), bob);

    service.delete_team(team.id(), bob).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_departed_member_reinvited_by_email_over_postgres() {
    let store = Arc::new(PostgresTeamStore::new(setup_test_db().await));
    let service = MembershipService::new(store.clone());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let email = format!("bob-{}@example.com", bob);

    let team = service
        .create_team(alice, CreateTeam::named("Postgres Reinvite"))
        .await
        .unwrap();
    service
        .invite_member(
            team.id(),
            alice,
            InviteMember::by_email(email.as_str()).with_user(bob),
        )
        .await
        .unwrap();
    let first = service.accept_invite(team.id(), bob, None).await.unwrap();
    service.remove_member(team.id(), bob, bob).await.unwrap();
    // a later invite by e-mail only cannot know bob's id
    let stray = Membership::invite(
        team.id(),
        None,
        prompt_teams_api::domain::user::Email::new(&email).unwrap(),
        TeamRole::Admin,
        alice,
    )
    .unwrap()
    .0;
    store.create_membership(&stray).await.unwrap();

    let accepted = service
        .accept_invite(team.id(), bob, Some(email.as_str()))
        .await
        .unwrap();

    assert_eq!(accepted.id(), first.id());
    assert_eq!(accepted.status(), MembershipStatus::Active);
    assert_eq!(accepted.role(), TeamRole::Admin);
    assert!(store
        .find_pending_by_email(team.id(), &email)
        .await
        .unwrap()
        .is_none());

    service.delete_team(team.id(), alice).await.unwrap();
}
