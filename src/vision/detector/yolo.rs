// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Local YOLOv8 detector on ONNX Runtime
//!
//! The model is expected to be a YOLOv8 export with a single output of shape
//! `[1, 4 + classes, anchors]`, boxes given as (cx, cy, w, h) in input pixels.

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::DynamicImage;
use ndarray::{ArrayViewD, IxDyn};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::{Detection, DetectionError, Detector};
use crate::vision::preprocessing::{letterbox, to_nchw_tensor, LetterboxInfo};

/// Square input size of the exported model
pub const YOLO_INPUT_SIZE: u32 = 640;

#[derive(Debug, Clone)]
pub struct YoloConfig {
    pub model_path: PathBuf,
    /// One class name per line, in class-id order
    pub labels_path: Option<PathBuf>,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./models/best.onnx"),
            labels_path: Some(PathBuf::from("./models/labels.txt")),
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
        }
    }
}

/// YOLO detector running on CPU
#[derive(Clone)]
pub struct YoloDetector {
    session: Arc<Mutex<Session>>,
    input_name: String,
    labels: Arc<Vec<String>>,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl std::fmt::Debug for YoloDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloDetector")
            .field("input_name", &self.input_name)
            .field("labels", &self.labels.len())
            .field("confidence_threshold", &self.confidence_threshold)
            .field("iou_threshold", &self.iou_threshold)
            .finish_non_exhaustive()
    }
}

impl YoloDetector {
    /// Load the model and its labels
    pub async fn new(config: YoloConfig) -> Result<Self> {
        let model_path = config.model_path.as_path();

        if !model_path.exists() {
            anyhow::bail!("YOLO model not found: {}", model_path.display());
        }

        info!("Loading YOLO model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load YOLO model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        let labels = match config.labels_path {
            Some(ref path) => load_labels(path).await?,
            None => Vec::new(),
        };

        info!(
            "✅ YOLO model loaded (input: {}, {} labels)",
            input_name,
            labels.len()
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            labels: Arc::new(labels),
            confidence_threshold: config.confidence_threshold.clamp(0.0, 1.0),
            iou_threshold: config.iou_threshold.clamp(0.0, 1.0),
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

async fn load_labels(path: &Path) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read labels from {}", path.display()))?;
    Ok(parse_labels(&content))
}

/// One label per non-empty line
pub fn parse_labels(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn label_for(labels: &[String], class_id: usize) -> String {
    labels
        .get(class_id)
        .cloned()
        .unwrap_or_else(|| format!("class_{}", class_id))
}

/// Decode a `[1, 4 + classes, anchors]` output into source-space detections
pub fn decode_output(
    output: ArrayViewD<f32>,
    labels: &[String],
    info: &LetterboxInfo,
    confidence_threshold: f32,
) -> Result<Vec<Detection>, DetectionError> {
    let shape = output.shape();
    if shape.len() != 3 || shape[0] != 1 || shape[1] < 5 {
        return Err(DetectionError::Inference(format!(
            "Unexpected output shape: {:?}",
            shape
        )));
    }

    let num_classes = shape[1] - 4;
    let num_anchors = shape[2];
    let mut detections = Vec::new();

    for anchor in 0..num_anchors {
        let (class_id, score) = (0..num_classes)
            .map(|c| (c, output[IxDyn(&[0, 4 + c, anchor])]))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if score < confidence_threshold {
            continue;
        }

        let cx = output[IxDyn(&[0, 0, anchor])];
        let cy = output[IxDyn(&[0, 1, anchor])];
        let w = output[IxDyn(&[0, 2, anchor])];
        let h = output[IxDyn(&[0, 3, anchor])];

        let (x, y) = info.to_source(cx, cy);
        detections.push(Detection {
            x,
            y,
            width: w / info.scale,
            height: h / info.scale,
            class: label_for(labels, class_id),
            confidence: score,
        });
    }

    Ok(detections)
}

/// Greedy per-class non-maximum suppression, highest confidence first
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let suppressed = kept
            .iter()
            .any(|k| k.class == candidate.class && k.iou(&candidate) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }

    kept
}

impl YoloDetector {
    fn run_blocking(&self, image: &DynamicImage) -> Result<Vec<Detection>, DetectionError> {
        let (boxed, info) = letterbox(image, YOLO_INPUT_SIZE);
        let tensor = to_nchw_tensor(&boxed);

        let input_value = Value::from_array(tensor)
            .map_err(|e| DetectionError::Inference(format!("Failed to create input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectionError::ModelUnavailable("YOLO session poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let raw = decode_output(output.view(), &self.labels, &info, self.confidence_threshold)?;
        let kept = non_max_suppression(raw, self.iou_threshold);

        debug!("YOLO kept {} detections", kept.len());
        Ok(kept)
    }
}

#[async_trait]
impl Detector for YoloDetector {
    fn name(&self) -> &str {
        "yolo"
    }

    async fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, DetectionError> {
        let detector = self.clone();
        let image = image.clone();

        tokio::task::spawn_blocking(move || detector.run_blocking(&image))
            .await
            .map_err(|e| DetectionError::Inference(format!("Inference task failed: {}", e)))?
    }
}
