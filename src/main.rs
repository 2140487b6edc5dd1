// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use expiry_scan::{
    api::{start_server, AppState},
    config::AppConfig,
    version,
};
use std::env;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("📦 {}", version::get_version_string());
    info!("🔖 Build: {}", version::VERSION);

    let config = AppConfig::from_env()?;
    config.validate()?;

    info!("Upload directory: {}", config.upload_dir.display());
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    match config.camera {
        Some(ref camera) => info!(
            "Camera snapshots from {} every {}ms",
            camera.url,
            camera.frame_interval.as_millis()
        ),
        None => warn!("CAMERA_SNAPSHOT_URL not set, /video_feed disabled"),
    }

    let state = AppState::from_config(&config).await?;

    start_server(&config.listen_addr, state, async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received");
    })
    .await
}
