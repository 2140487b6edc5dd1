// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use axum::http::StatusCode;
use expiry_scan::api::{create_router, HealthResponse};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use super::common::{
    body_string, get, state_with, FixedDetector, ScriptedReader, UnreachableReader,
};
use expiry_scan::stream::SnapshotCameraConfig;

#[tokio::test]
async fn test_health_reports_backends() {
    let dir = TempDir::new().unwrap();
    let state = state_with(
        Arc::new(FixedDetector(vec![])),
        Arc::new(ScriptedReader::new(&[])),
        dir.path(),
        None,
    );

    let response = create_router(state).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthResponse =
        serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    assert_eq!(health.detector, "fixed");
    assert_eq!(health.ocr, "scripted");
    assert!(!health.camera);
    assert_eq!(health.status, "degraded");
    assert_eq!(health.readings, 0);
}

#[tokio::test]
async fn test_health_with_camera_is_healthy() {
    let dir = TempDir::new().unwrap();
    let camera = SnapshotCameraConfig {
        url: "http://127.0.0.1:59998/snapshot.jpg".to_string(),
        frame_interval: Duration::from_millis(100),
        timeout: Duration::from_secs(1),
    };
    let state = state_with(
        Arc::new(FixedDetector(vec![])),
        Arc::new(ScriptedReader::new(&[])),
        dir.path(),
        Some(camera),
    );

    let response = create_router(state).oneshot(get("/health")).await.unwrap();
    let health: HealthResponse =
        serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert!(health.camera);
    assert!(health.issues.is_none());
}

#[tokio::test]
async fn test_unreachable_ocr_backend_degrades_health() {
    let dir = TempDir::new().unwrap();
    let camera = SnapshotCameraConfig {
        url: "http://127.0.0.1:59998/snapshot.jpg".to_string(),
        frame_interval: Duration::from_millis(100),
        timeout: Duration::from_secs(1),
    };
    let state = state_with(
        Arc::new(FixedDetector(vec![])),
        Arc::new(UnreachableReader),
        dir.path(),
        Some(camera),
    );

    let response = create_router(state).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthResponse =
        serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    assert_eq!(health.status, "degraded");
    assert_eq!(health.ocr, "offline");
    assert_eq!(
        health.issues,
        Some(vec!["OCR service (offline) unreachable".to_string()])
    );
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let dir = TempDir::new().unwrap();
    let state = state_with(
        Arc::new(FixedDetector(vec![])),
        Arc::new(ScriptedReader::new(&[])),
        dir.path(),
        None,
    );

    let response = create_router(state).oneshot(get("/v1/models")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
