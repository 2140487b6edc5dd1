// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Client for the Roboflow hosted inference API

use async_trait::async_trait;
use image::DynamicImage;
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{Detection, DetectionError, Detector};
use crate::vision::image_utils::encode_jpeg_base64;

pub const DEFAULT_API_URL: &str = "https://detect.roboflow.com";
pub const DEFAULT_MODEL_ID: &str = "expiredatedetection/4";

#[derive(Debug, Clone)]
pub struct RoboflowConfig {
    pub api_url: String,
    pub api_key: String,
    /// Project and version, e.g. "expiredatedetection/4"
    pub model_id: String,
    pub timeout: Duration,
}

impl Default for RoboflowConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

// --- Wire format ---

#[derive(Debug, Deserialize)]
struct InferResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    class: String,
}

impl From<Prediction> for Detection {
    fn from(p: Prediction) -> Self {
        Detection {
            x: p.x,
            y: p.y,
            width: p.width,
            height: p.height,
            class: p.class,
            confidence: p.confidence,
        }
    }
}

/// Parse an inference response body into detections
pub fn parse_predictions(body: &str) -> Result<Vec<Detection>, DetectionError> {
    let response: InferResponse = serde_json::from_str(body)
        .map_err(|e| DetectionError::MalformedResponse(e.to_string()))?;
    Ok(response.predictions.into_iter().map(Detection::from).collect())
}

/// Detector backed by the hosted Roboflow API
pub struct RoboflowDetector {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl RoboflowDetector {
    pub fn new(config: RoboflowConfig) -> Result<Self, DetectionError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        let endpoint = format!(
            "{}/{}",
            config.api_url.trim_end_matches('/'),
            config.model_id.trim_matches('/')
        );
        info!("Roboflow detector configured: endpoint={}", endpoint);

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Detector for RoboflowDetector {
    fn name(&self) -> &str {
        "roboflow"
    }

    async fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, DetectionError> {
        let start = Instant::now();
        let payload =
            encode_jpeg_base64(image).map_err(|e| DetectionError::Encode(e.to_string()))?;

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("api_key", self.api_key.as_str())])
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(DetectionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let detections = parse_predictions(&body)?;
        debug!(
            "Roboflow returned {} predictions in {}ms",
            detections.len(),
            start.elapsed().as_millis()
        );

        Ok(detections)
    }
}
