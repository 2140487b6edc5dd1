// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::feed::{findex_handler, results_handler, video_feed_handler};
use super::handlers::{health_handler, index_handler};
use super::process::process_handler;
use crate::config::AppConfig;
use crate::freshness::FreshnessAnalyzer;
use crate::pipeline::ExpiryPipeline;
use crate::stream::StreamContext;
use crate::vision::image_utils::MAX_IMAGE_SIZE;

/// Request body cap: the largest image plus room for multipart framing
pub const MAX_UPLOAD_BYTES: usize = MAX_IMAGE_SIZE + 64 * 1024;

struct Shared {
    pipeline: ExpiryPipeline,
    stream: StreamContext,
    upload_dir: PathBuf,
    brand: String,
}

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    shared: Arc<Shared>,
}

impl AppState {
    pub fn new(
        pipeline: ExpiryPipeline,
        stream: StreamContext,
        upload_dir: impl Into<PathBuf>,
        brand: impl Into<String>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                pipeline,
                stream,
                upload_dir: upload_dir.into(),
                brand: brand.into(),
            }),
        }
    }

    /// Build the backends described by `config`
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let detector = config.build_detector().await?;
        let reader = config.build_reader()?;

        let stream = StreamContext::new(
            detector.clone(),
            FreshnessAnalyzer::new(config.lifespans.clone()),
            config.results_capacity,
            config.camera.clone(),
        );

        Ok(Self::new(
            ExpiryPipeline::new(detector, reader),
            stream,
            config.upload_dir.clone(),
            config.brand.clone(),
        ))
    }

    pub fn pipeline(&self) -> &ExpiryPipeline {
        &self.shared.pipeline
    }

    pub fn stream(&self) -> &StreamContext {
        &self.shared.stream
    }

    pub fn upload_dir(&self) -> &Path {
        &self.shared.upload_dir
    }

    pub fn brand(&self) -> &str {
        &self.shared.brand
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/process", post(process_handler))
        .route("/findex", get(findex_handler))
        .route("/video_feed", get(video_feed_handler))
        .route("/results", get(results_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn start_server<F>(listen_addr: &str, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address: {}", listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🚀 HTTP server listening on {}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;

    info!("HTTP server stopped");
    Ok(())
}
