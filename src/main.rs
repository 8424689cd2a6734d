use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use collab_admin::app::{self, AppState};
use collab_admin::config;
use collab_admin::database::{DatabaseManager, PgStore};
use collab_admin::is_production;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("collab_admin=info,tower_http=info")),
        )
        .init();

    let config = config::config();
    tracing::info!("Starting collab-admin in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        if is_production!() {
            tracing::warn!("JWT_SECRET is not set; every /api request will be rejected");
        } else {
            tracing::warn!("JWT_SECRET is empty; sessions cannot be issued or verified");
        }
    }

    let store = PgStore::connect().await?;
    store.migrate().await?;
    tracing::info!(
        "Store ready; user access tokens default to {}",
        if config.service.enable_user_access_tokens { "enabled" } else { "disabled" }
    );

    let state = AppState::from_store(Arc::new(store));

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;
    tracing::info!("collab-admin listening on http://{}", bind_addr);

    let served = app::serve(listener, state).await;
    DatabaseManager::close_all().await;
    served?;
    Ok(())
}
