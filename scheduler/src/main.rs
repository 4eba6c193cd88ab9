use anyhow::{Context, Result};
use log::{error, info};
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;

use schedule_logger::backend::{create_router, initialize_backend};
use schedule_logger::config::{AppConfig, CONFIG_FILE};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let config = AppConfig::load(&config_path)?;
    info!("Using data directory {}", config.data_dir.display());

    let app_state = initialize_backend(&config)?;

    let holiday_cache = app_state.holiday_cache.clone();
    tokio::spawn(async move {
        if let Err(e) = holiday_cache.preload().await {
            error!("Holiday preload failed: {}", e);
        }
    });

    if config.auto_sync_minutes > 0 {
        info!("Auto-sync every {} minutes", config.auto_sync_minutes);
        app_state
            .sync_service
            .spawn_auto_sync(Duration::from_secs(config.auto_sync_minutes * 60));
    }

    let router = create_router(app_state, &config.cors_origin)?;
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, router).await?;
    Ok(())
}
