use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use prompt_teams_api::api::{self, AppState};
use prompt_teams_api::config::Settings;
use prompt_teams_api::domain::team::MembershipService;
use prompt_teams_api::infrastructure::logging::init_logging;
use prompt_teams_api::infrastructure::repositories::PostgresTeamStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_logging(&settings.logging);

    if settings.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set, using the development secret");
    }

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(settings.database_max_connections)
        .connect(&settings.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database connected and migrated");

    let store = Arc::new(PostgresTeamStore::new(pool));
    let service = MembershipService::with_policy(store, settings.policy);
    let state = AppState::new(service, settings.jwt_secret.as_str());

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("Server listening on {}", settings.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
