// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Roboflow and OCR clients talking to in-process fake services

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use expiry_scan::dates::DateCandidate;
use expiry_scan::pipeline::ExpiryPipeline;
use expiry_scan::vision::detector::{RoboflowConfig, RoboflowDetector};
use expiry_scan::vision::ocr::{HttpTextReader, OcrClientConfig};
use expiry_scan::vision::{DetectionError, Detector, OcrError, TextReader};
use image::{DynamicImage, RgbImage};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const API_KEY: &str = "test-key";

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn fake_roboflow(
    Query(params): Query<HashMap<String, String>>,
    body: String,
) -> (StatusCode, Json<Value>) {
    if params.get("api_key").map(String::as_str) != Some(API_KEY) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"message": "invalid api key"})),
        );
    }
    if body.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "no image"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "time": 0.05,
            "image": {"width": 120, "height": 40},
            "predictions": [
                {"x": 30.0, "y": 20.0, "width": 40.0, "height": 16.0,
                 "confidence": 0.91, "class": "date", "class_id": 0},
                {"x": 90.0, "y": 20.0, "width": 40.0, "height": 16.0,
                 "confidence": 0.72, "class": "date", "class_id": 0}
            ]
        })),
    )
}

fn roboflow_app() -> Router {
    Router::new().route("/expiredatedetection/4", post(fake_roboflow))
}

fn ocr_app() -> Router {
    let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/ocr",
            post(move |Json(request): Json<Value>| {
                let calls = calls.clone();
                async move {
                    assert_eq!(request["language"], "en");
                    assert!(request["image"].as_str().is_some_and(|s| !s.is_empty()));
                    let text = match calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) {
                        0 => "2031.03.15",
                        _ => "15-03-2031",
                    };
                    Json(json!({
                        "boxes": [
                            {"box": [[0, 0], [40, 0], [40, 16], [0, 16]],
                             "text": text, "score": 0.88}
                        ]
                    }))
                }
            }),
        )
}

fn image() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(120, 40, image::Rgb([200, 200, 200])))
}

fn roboflow(api_url: String, api_key: &str) -> RoboflowDetector {
    RoboflowDetector::new(RoboflowConfig {
        api_url,
        api_key: api_key.to_string(),
        model_id: "expiredatedetection/4".to_string(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn ocr(endpoint: String) -> HttpTextReader {
    HttpTextReader::new(OcrClientConfig {
        endpoint,
        language: "en".to_string(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn test_roboflow_detects_regions() {
    let url = spawn(roboflow_app()).await;
    let detector = roboflow(format!("{}/", url), API_KEY);

    let detections = detector.detect(&image()).await.unwrap();
    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0].class, "date");
    assert!((detections[0].confidence - 0.91).abs() < 1e-6);
    assert_eq!(detections[1].x, 90.0);
}

#[tokio::test]
async fn test_roboflow_rejected_key_is_status_error() {
    let url = spawn(roboflow_app()).await;
    let detector = roboflow(url, "wrong");

    match detector.detect(&image()).await {
        Err(DetectionError::Status { status, body }) => {
            assert_eq!(status, 403);
            assert!(body.contains("invalid api key"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_ocr_reads_spans() {
    let url = spawn(ocr_app()).await;
    let reader = ocr(url);

    assert!(reader.health_check().await);
    let spans = reader.read_text(&image()).await.unwrap();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].text, "2031.03.15");
    assert_eq!(spans[0].polygon.len(), 4);
}

#[tokio::test]
async fn test_ocr_malformed_response() {
    let app = Router::new().route("/ocr", post(|| async { "not json" }));
    let reader = ocr(spawn(app).await);

    assert!(matches!(
        reader.read_text(&image()).await,
        Err(OcrError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn test_pipeline_over_http_backends() {
    let detector = roboflow(spawn(roboflow_app()).await, API_KEY);
    let reader = ocr(spawn(ocr_app()).await);
    let pipeline = ExpiryPipeline::new(Arc::new(detector), Arc::new(reader));

    let outcome = pipeline.scan(&image()).await.unwrap();
    assert_eq!(outcome.detections.len(), 2);
    assert_eq!(outcome.spans.len(), 2);
    assert_eq!(
        outcome.dates,
        vec![
            DateCandidate::new("2031", "03", "15"),
            DateCandidate::new("2031", "03", "15"),
        ]
    );
}
