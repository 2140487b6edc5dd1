// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use tracing::{info, warn};

use crate::api::errors::ApiError;
use crate::api::render::findex_page;
use crate::api::server::AppState;
use crate::freshness::ProduceReading;
use crate::stream::MJPEG_BOUNDARY;

/// GET /video_feed - Annotated MJPEG stream from the configured camera
///
/// Each frame is run through the detector and its produce readings are
/// appended to the shared results buffer before the frame is sent.
///
/// # Errors
/// - 503: no camera configured
pub async fn video_feed_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let session = state.stream().open_session().map_err(|e| {
        warn!("Failed to open camera session: {}", e);
        ApiError::from(e)
    })?;

    let Some(session) = session else {
        return Err(ApiError::ServiceUnavailable(
            "No camera configured".to_string(),
        ));
    };

    info!("Video feed client connected");

    Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/x-mixed-replace; boundary={}", MJPEG_BOUNDARY),
        )
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(session.into_stream()))
        .map_err(|e| ApiError::InternalError(e.to_string()))
}

/// GET /results - Accumulated produce readings, oldest first
pub async fn results_handler(State(state): State<AppState>) -> Json<Vec<ProduceReading>> {
    Json(state.stream().snapshot().await)
}

/// GET /findex - Live feed page with the readings table
pub async fn findex_handler(State(state): State<AppState>) -> impl IntoResponse {
    let readings = state.stream().snapshot().await;
    Html(findex_page(&readings, state.stream().has_camera()))
}
