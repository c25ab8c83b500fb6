//! Keygate account and authentication service

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keygate_server::{
    routes, AppState, Config, GoogleOauth, InMemoryRevocationLedger, InMemoryUserStore,
    SqliteStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keygate_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(env = config.env.as_str(), port = config.port, "Loaded configuration");

    // Federated login is only wired up when Google is configured
    let oauth = match &config.google {
        Some(google) => {
            google.validate()?;
            tracing::info!(client_id = %google.client_id, "Google OAuth configured");
            Some(GoogleOauth::new(google.clone())?)
        }
        None => {
            tracing::warn!("Google OAuth is not configured; federated login disabled");
            None
        }
    };

    let tokens = config.token_engine();
    let addr = format!("0.0.0.0:{}", config.port);

    let app = match config.database.clone() {
        Some(path) => {
            tracing::info!(path = %path, "Using SQLite store");
            let store = Arc::new(SqliteStore::open(&path)?);
            routes::create_router(Arc::new(AppState::new(
                config,
                tokens,
                store.clone(),
                store,
                oauth,
            )))
        }
        None => {
            tracing::warn!("No DATABASE_PATH configured; state is in-memory only");
            routes::create_router(Arc::new(AppState::new(
                config,
                tokens,
                InMemoryUserStore::new(),
                InMemoryRevocationLedger::new(),
                oauth,
            )))
        }
    };

    // Start server
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Keygate listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
