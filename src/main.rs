use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use ster::config::AppConfig;
use ster::db;
use ster::handlers;
use ster::services::storage::local::LocalBlobStore;
use ster::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let blobs = LocalBlobStore::new(&config.upload_dir, &config.public_upload_path);
    tracing::info!(
        "storing uploads in {} (served at {})",
        config.upload_dir,
        config.public_upload_path
    );
    if config.api_token.is_empty() {
        tracing::warn!("API_TOKEN is not set, mutating routes are open");
    }

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        blobs: Box::new(blobs),
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
