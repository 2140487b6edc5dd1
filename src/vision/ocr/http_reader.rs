// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP client for an OCR sidecar service
//!
//! The sidecar accepts `POST /ocr` with `{"image": <base64 PNG>, "language": "en"}`
//! and answers `{"boxes": [{"box": [[x, y]; 4], "text": "...", "score": 0.98}]}`.

use async_trait::async_trait;
use image::DynamicImage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{OcrError, TextReader, TextSpan};
use crate::vision::image_utils::encode_png_base64;

pub const DEFAULT_OCR_ENDPOINT: &str = "http://127.0.0.1:8866";

#[derive(Debug, Clone)]
pub struct OcrClientConfig {
    pub endpoint: String,
    pub language: String,
    pub timeout: Duration,
}

impl Default for OcrClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OCR_ENDPOINT.to_string(),
            language: "en".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

// --- Wire format ---

#[derive(Serialize)]
struct OcrRequest<'a> {
    image: String,
    language: &'a str,
}

#[derive(Deserialize)]
struct OcrResponse {
    #[serde(default)]
    boxes: Vec<OcrBox>,
}

#[derive(Deserialize)]
struct OcrBox {
    #[serde(rename = "box", default)]
    bbox: Vec<[f32; 2]>,
    text: String,
    #[serde(default)]
    score: f32,
}

/// Parse a sidecar response body into text spans
pub fn parse_spans(body: &str) -> Result<Vec<TextSpan>, OcrError> {
    let response: OcrResponse =
        serde_json::from_str(body).map_err(|e| OcrError::MalformedResponse(e.to_string()))?;

    Ok(response
        .boxes
        .into_iter()
        .map(|b| TextSpan {
            polygon: b.bbox,
            text: b.text,
            confidence: b.score,
        })
        .collect())
}

/// OCR over HTTP
pub struct HttpTextReader {
    client: Client,
    endpoint: String,
    language: String,
}

impl HttpTextReader {
    pub fn new(config: OcrClientConfig) -> Result<Self, OcrError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        info!(
            "OCR client configured: endpoint={}, language={}",
            endpoint, config.language
        );

        Ok(Self {
            client,
            endpoint,
            language: config.language,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextReader for HttpTextReader {
    fn name(&self) -> &str {
        "http-ocr"
    }

    async fn read_text(&self, image: &DynamicImage) -> Result<Vec<TextSpan>, OcrError> {
        let start = Instant::now();
        let request = OcrRequest {
            image: encode_png_base64(image).map_err(|e| OcrError::Encode(e.to_string()))?,
            language: &self.language,
        };

        let response = self
            .client
            .post(format!("{}/ocr", self.endpoint))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(OcrError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let spans = parse_spans(&body)?;
        debug!(
            "OCR returned {} spans in {}ms",
            spans.len(),
            start.elapsed().as_millis()
        );

        Ok(spans)
    }

    /// GET {endpoint}/health
    async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.endpoint))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("OCR health check failed: {}", e);
                false
            }
        }
    }
}
