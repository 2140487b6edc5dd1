// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /process tests: form validation, storage, scan and rendering

use axum::body::Body;
use axum::http::{Request, StatusCode};
use expiry_scan::api::create_router;
use image::ImageFormat;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use super::common::{
    body_string, get, multipart_body, multipart_text_body, region, state_with, test_image, upload_request,
    FailingDetector, FixedDetector, ScriptedReader,
};

#[tokio::test]
async fn test_index_serves_upload_form() {
    let dir = TempDir::new().unwrap();
    let state = state_with(
        Arc::new(FixedDetector(vec![])),
        Arc::new(ScriptedReader::new(&[])),
        dir.path(),
        None,
    );

    let response = create_router(state).oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response.into_body()).await;
    assert!(html.contains("enctype=\"multipart/form-data\""));
    assert!(html.contains("name=\"image\""));
}

#[tokio::test]
async fn test_missing_image_field_returns_400() {
    let dir = TempDir::new().unwrap();
    let state = state_with(
        Arc::new(FixedDetector(vec![])),
        Arc::new(ScriptedReader::new(&[])),
        dir.path(),
        None,
    );

    let body = multipart_body("document", "milk.png", &test_image(ImageFormat::Png));
    let response = create_router(state).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value =
        serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    assert_eq!(json["error"], "No file part");
}

#[tokio::test]
async fn test_non_multipart_request_returns_no_file_part() {
    let dir = TempDir::new().unwrap();
    let state = state_with(
        Arc::new(FixedDetector(vec![])),
        Arc::new(ScriptedReader::new(&[])),
        dir.path(),
        None,
    );

    // No Content-Type, empty body
    let request = Request::builder()
        .method("POST")
        .uri("/process")
        .body(Body::empty())
        .unwrap();
    let response = create_router(state).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value =
        serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    assert_eq!(json["error"], "No file part");
}

#[tokio::test]
async fn test_image_text_field_is_not_a_file_part() {
    let dir = TempDir::new().unwrap();
    let state = state_with(
        Arc::new(FixedDetector(vec![])),
        Arc::new(ScriptedReader::new(&[])),
        dir.path(),
        None,
    );

    let body = multipart_text_body("image", "milk.png");
    let response = create_router(state).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value =
        serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    assert_eq!(json["error"], "No file part");
}

#[tokio::test]
async fn test_empty_filename_returns_400() {
    let dir = TempDir::new().unwrap();
    let state = state_with(
        Arc::new(FixedDetector(vec![])),
        Arc::new(ScriptedReader::new(&[])),
        dir.path(),
        None,
    );

    let body = multipart_body("image", "", b"");
    let response = create_router(state).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value =
        serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    assert_eq!(json["error"], "No selected file");
}

#[tokio::test]
async fn test_upload_renders_expiry_table() {
    let dir = TempDir::new().unwrap();
    let reader = Arc::new(ScriptedReader::new(&["2030.01.01", "12-05-2020"]));
    let state = state_with(
        Arc::new(FixedDetector(vec![
            region(20.0, "date", 0.9),
            region(70.0, "date", 0.8),
        ])),
        reader.clone(),
        dir.path(),
        None,
    );

    let body = multipart_body("image", "milk carton.png", &test_image(ImageFormat::Png));
    let response = create_router(state).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response.into_body()).await;
    assert!(html.contains("<td>2030-01-01</td><td>No</td>"));
    assert!(html.contains("<td>2020-05-12</td><td>Yes</td><td>0</td>"));
    assert!(html.contains("2 date region(s) detected"));
    assert_eq!(reader.calls(), 2);

    // Stored under the sanitised name
    assert!(dir.path().join("milk_carton.png").exists());
}

#[tokio::test]
async fn test_invalid_calendar_date_is_listed_not_fatal() {
    let dir = TempDir::new().unwrap();
    let state = state_with(
        Arc::new(FixedDetector(vec![region(20.0, "date", 0.9)])),
        Arc::new(ScriptedReader::new(&["2024.13.45"])),
        dir.path(),
        None,
    );

    let body = multipart_body("image", "milk.png", &test_image(ImageFormat::Png));
    let response = create_router(state).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response.into_body()).await;
    assert!(html.contains("No expiry dates found."));
    assert!(html.contains("Unreadable dates"));
    assert!(html.contains("2024-13-45"));
}

#[tokio::test]
async fn test_no_text_renders_empty_result() {
    let dir = TempDir::new().unwrap();
    let state = state_with(
        Arc::new(FixedDetector(vec![region(20.0, "date", 0.9)])),
        Arc::new(ScriptedReader::new(&["expires soon"])),
        dir.path(),
        None,
    );

    let body = multipart_body("image", "milk.jpg", &test_image(ImageFormat::Jpeg));
    let response = create_router(state).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response.into_body()).await;
    assert!(html.contains("No expiry dates found."));
    assert!(!html.contains("Unreadable dates"));
}

#[tokio::test]
async fn test_detector_failure_returns_500() {
    let dir = TempDir::new().unwrap();
    let state = state_with(
        Arc::new(FailingDetector),
        Arc::new(ScriptedReader::new(&[])),
        dir.path(),
        None,
    );

    let body = multipart_body("image", "milk.png", &test_image(ImageFormat::Png));
    let response = create_router(state).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value =
        serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    assert_eq!(json["error_type"], "internal_error");
    assert!(json["error"].as_str().unwrap().contains("inference backend down"));
}

#[tokio::test]
async fn test_undecodable_upload_returns_500() {
    let dir = TempDir::new().unwrap();
    let state = state_with(
        Arc::new(FixedDetector(vec![])),
        Arc::new(ScriptedReader::new(&[])),
        dir.path(),
        None,
    );

    let body = multipart_body("image", "notes.txt", b"definitely not an image");
    let response = create_router(state).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    // The raw upload is still stored
    assert!(dir.path().join("notes.txt").exists());
}
