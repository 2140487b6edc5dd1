// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::extract::State;
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::render::index_page;
use super::server::AppState;
use crate::version;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub detector: String,
    pub ocr: String,
    pub camera: bool,
    pub readings: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<String>>,
}

/// GET / - Upload form
pub async fn index_handler() -> Html<String> {
    Html(index_page(None))
}

/// GET /health - Backend names, OCR reachability and buffer size
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut issues = Vec::new();
    let reader = state.pipeline().reader();
    if !reader.health_check().await {
        warn!("OCR backend {} failed its health check", reader.name());
        issues.push(format!("OCR service ({}) unreachable", reader.name()));
    }
    if !state.stream().has_camera() {
        issues.push("No camera configured; /video_feed disabled".to_string());
    }

    let readings = state.stream().results().read().await.len();

    Json(HealthResponse {
        status: if issues.is_empty() { "healthy" } else { "degraded" }.to_string(),
        version: version::VERSION_NUMBER.to_string(),
        detector: state.pipeline().detector().name().to_string(),
        ocr: reader.name().to_string(),
        camera: state.stream().has_camera(),
        readings,
        issues: if issues.is_empty() { None } else { Some(issues) },
    })
}
