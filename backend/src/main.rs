use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chore_tracker_backend::{create_router, initialize_backend, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chore_tracker_backend=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::load()?;
    info!("Data directory: {}", config.data_directory.display());

    let app_state = initialize_backend(&config)?;
    let app = create_router(app_state, &config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!("Listening on {}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
