// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Webcam endpoints: /video_feed, /results and /findex

use axum::http::{header, StatusCode};
use axum::routing::get as get_route;
use axum::Router;
use expiry_scan::api::create_router;
use expiry_scan::stream::SnapshotCameraConfig;
use futures::StreamExt;
use image::ImageFormat;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use super::common::{body_string, get, region, state_with, test_image, FixedDetector, ScriptedReader};

/// Serve a fixed JPEG at /snapshot.jpg on an ephemeral port
async fn spawn_camera() -> String {
    let jpeg = test_image(ImageFormat::Jpeg);
    let app = Router::new().route(
        "/snapshot.jpg",
        get_route(move || {
            let jpeg = jpeg.clone();
            async move { ([(header::CONTENT_TYPE, "image/jpeg")], jpeg) }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/snapshot.jpg", addr)
}

fn camera(url: String) -> SnapshotCameraConfig {
    SnapshotCameraConfig {
        url,
        frame_interval: Duration::from_millis(10),
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_video_feed_without_camera_returns_503() {
    let dir = TempDir::new().unwrap();
    let state = state_with(
        Arc::new(FixedDetector(vec![])),
        Arc::new(ScriptedReader::new(&[])),
        dir.path(),
        None,
    );

    let response = create_router(state).oneshot(get("/video_feed")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json: serde_json::Value =
        serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    assert_eq!(json["error"], "No camera configured");
}

#[tokio::test]
async fn test_video_feed_streams_annotated_frames() {
    let dir = TempDir::new().unwrap();
    let url = spawn_camera().await;
    let state = state_with(
        Arc::new(FixedDetector(vec![
            region(30.0, "broccoli", 0.64),
            region(60.0, "mango", 0.3),
        ])),
        Arc::new(ScriptedReader::new(&[])),
        dir.path(),
        Some(camera(url)),
    );
    let router = create_router(state.clone());

    let response = router.oneshot(get("/video_feed")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "multipart/x-mixed-replace; boundary=frame"
    );

    let mut body = response.into_body().into_data_stream();
    let first = body.next().await.unwrap().unwrap();
    assert!(first.starts_with(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n"));
    assert!(first.ends_with(b"\r\n"));
    // JPEG SOI marker right after the part header
    let header_len = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".len();
    assert_eq!(&first[header_len..header_len + 2], &[0xFF, 0xD8]);
    drop(body);

    // Readings recorded while streaming are visible through /results
    let response = create_router(state)
        .oneshot(get("/results"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let readings: serde_json::Value =
        serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    let readings = readings.as_array().unwrap();
    assert!(readings.len() >= 2);
    assert_eq!(readings[0]["produce"], "broccoli");
    assert_eq!(readings[0]["freshness"], 6);
    assert_eq!(readings[0]["lifespan"], 5);
    assert_eq!(readings[1]["produce"], "mango");
    assert_eq!(readings[1]["freshness"], 3);
    assert_eq!(readings[1]["lifespan"], "N/A");
}

#[tokio::test]
async fn test_results_empty_initially() {
    let dir = TempDir::new().unwrap();
    let state = state_with(
        Arc::new(FixedDetector(vec![])),
        Arc::new(ScriptedReader::new(&[])),
        dir.path(),
        None,
    );

    let response = create_router(state).oneshot(get("/results")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response.into_body()).await, "[]");
}

#[tokio::test]
async fn test_findex_renders_readings() {
    let dir = TempDir::new().unwrap();
    let url = spawn_camera().await;
    let state = state_with(
        Arc::new(FixedDetector(vec![region(30.0, "onion", 0.91)])),
        Arc::new(ScriptedReader::new(&[])),
        dir.path(),
        Some(camera(url)),
    );

    // Pull one frame to populate the buffer
    let response = create_router(state.clone())
        .oneshot(get("/video_feed"))
        .await
        .unwrap();
    let mut body = response.into_body().into_data_stream();
    body.next().await.unwrap().unwrap();
    drop(body);

    let response = create_router(state).oneshot(get("/findex")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response.into_body()).await;
    assert!(html.contains("src=\"/video_feed\""));
    assert!(html.contains("<td>onion</td><td>9</td><td>12</td>"));
}
