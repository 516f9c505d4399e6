// API layer module (adapters for controllers)
// Follows Hexagonal Architecture - API is an adapter

pub mod errors;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::domain::team::MembershipService;
use handlers::{health, members, teams};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MembershipService>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(service: MembershipService, jwt_secret: impl Into<Arc<str>>) -> Self {
        Self {
            service: Arc::new(service),
            jwt_secret: jwt_secret.into(),
        }
    }
}

/// Builds the application router without transport middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Team routes
        .route("/api/teams", get(teams::list_teams).post(teams::create_team))
        .route("/api/teams/personal", post(teams::ensure_personal_team))
        .route("/api/teams/invites", get(teams::list_invites))
        .route(
            "/api/teams/:team_id",
            get(teams::get_team)
                .patch(teams::update_team)
                .delete(teams::delete_team),
        )
        .route("/api/teams/:team_id/transfer", post(teams::transfer_ownership))
        // Member routes
        .route(
            "/api/teams/:team_id/members",
            get(members::list_members).post(members::invite_member),
        )
        .route(
            "/api/teams/:team_id/members/:user_id",
            patch(members::update_member).delete(members::remove_member),
        )
        .with_state(state)
}
