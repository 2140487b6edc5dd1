// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection backends
//!
//! - `roboflow` - hosted inference API over HTTP
//! - `yolo` - local YOLOv8 model run through ONNX Runtime

pub mod roboflow;
pub mod yolo;

use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use roboflow::{RoboflowConfig, RoboflowDetector};
pub use yolo::{YoloConfig, YoloDetector};

/// A detected region with its class and confidence.
///
/// Coordinates are in source-image pixels, box given by its center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub class: String,
    pub confidence: f32,
}

impl Detection {
    /// Corners as (left, top, right, bottom)
    pub fn corners(&self) -> (f32, f32, f32, f32) {
        (
            self.x - self.width / 2.0,
            self.y - self.height / 2.0,
            self.x + self.width / 2.0,
            self.y + self.height / 2.0,
        )
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection over union with another detection
    pub fn iou(&self, other: &Detection) -> f32 {
        let (l1, t1, r1, b1) = self.corners();
        let (l2, t2, r2, b2) = other.corners();

        let inter_w = (r1.min(r2) - l1.max(l2)).max(0.0);
        let inter_h = (b1.min(b2) - t1.max(t2)).max(0.0);
        let inter = inter_w * inter_h;

        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            return 0.0;
        }
        inter / union
    }
}

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Detector request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Detector returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed detector response: {0}")]
    MalformedResponse(String),

    #[error("Failed to encode image for detector: {0}")]
    Encode(String),

    #[error("Model inference failed: {0}")]
    Inference(String),

    #[error("Model not available: {0}")]
    ModelUnavailable(String),
}

/// Capability: find regions of interest in an image
#[async_trait]
pub trait Detector: Send + Sync {
    /// Backend name, reported by the health endpoint
    fn name(&self) -> &str;

    async fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, DetectionError>;
}
