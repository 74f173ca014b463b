use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use auth_api::{
    auth::{
        repository::{ensure_user, spawn_purge_task},
        JwtIdentityProvider, PgTokenDenylist, PgUserStore, TokenDenylist, TokenService, UserStore,
    },
    config::AppConfig,
    create_router, db, AppState,
};

/// How often expired revoked-token rows are deleted
const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Auth API - Starting...");

    let config = AppConfig::from_env()?;
    tracing::info!(
        "Token TTL: {} minutes, issuer: {}",
        config.jwt.ttl_minutes,
        config.jwt.issuer
    );

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
    let denylist: Arc<dyn TokenDenylist> = Arc::new(PgTokenDenylist::new(pool));

    if let Some(seed) = &config.seed_user {
        ensure_user(users.as_ref(), seed).await?;
    }

    spawn_purge_task(denylist.clone(), PURGE_INTERVAL);

    let provider = JwtIdentityProvider::new(users, denylist, TokenService::from_config(&config.jwt))?;
    let app = create_router(AppState {
        auth: Arc::new(provider),
    });

    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Auth API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
