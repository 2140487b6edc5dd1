// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR backends
//!
//! Text recognition is delegated to an external engine. `HttpTextReader`
//! talks to an OCR sidecar over HTTP.

pub mod http_reader;

use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http_reader::{HttpTextReader, OcrClientConfig};

/// A recognised piece of text inside a crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSpan {
    /// Four corner points, clockwise from top-left, in crop pixels
    pub polygon: Vec<[f32; 2]>,
    pub text: String,
    /// Recognition confidence (0.0-1.0)
    pub confidence: f32,
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("OCR service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed OCR response: {0}")]
    MalformedResponse(String),

    #[error("Failed to encode image for OCR: {0}")]
    Encode(String),
}

/// Capability: read text spans out of an image region
#[async_trait]
pub trait TextReader: Send + Sync {
    /// Backend name, reported by the health endpoint
    fn name(&self) -> &str;

    async fn read_text(&self, image: &DynamicImage) -> Result<Vec<TextSpan>, OcrError>;

    /// Whether the backend can currently serve requests
    async fn health_check(&self) -> bool {
        true
    }
}
