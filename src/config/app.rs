// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Context;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::freshness::LifespanTable;
use crate::stream::{SnapshotCameraConfig, DEFAULT_RESULTS_CAPACITY};
use crate::vision::detector::{RoboflowConfig, RoboflowDetector, YoloConfig, YoloDetector};
use crate::vision::ocr::{HttpTextReader, OcrClientConfig};
use crate::vision::{Detector, TextReader};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Missing required setting {0}")]
    Missing(String),
}

/// Which detector serves requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorBackend {
    Roboflow,
    Yolo,
}

impl FromStr for DetectorBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "roboflow" => Ok(DetectorBackend::Roboflow),
            "yolo" => Ok(DetectorBackend::Yolo),
            other => Err(format!("unknown detector backend '{}' (roboflow|yolo)", other)),
        }
    }
}

/// Configuration for the whole service
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: String,
    /// Where uploaded images are stored
    pub upload_dir: PathBuf,
    pub detector_backend: DetectorBackend,
    pub roboflow: RoboflowConfig,
    pub yolo: YoloConfig,
    pub ocr: OcrClientConfig,
    /// Snapshot camera for the video feed, if any
    pub camera: Option<SnapshotCameraConfig>,
    /// Maximum produce readings kept for `/results`
    pub results_capacity: usize,
    pub lifespans: LifespanTable,
    /// Brand column placeholder in the expiry table
    pub brand: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:5000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            detector_backend: DetectorBackend::Roboflow,
            roboflow: RoboflowConfig::default(),
            yolo: YoloConfig::default(),
            ocr: OcrClientConfig::default(),
            camera: None,
            results_capacity: DEFAULT_RESULTS_CAPACITY,
            lifespans: LifespanTable::default(),
            brand: "Unknown".to_string(),
        }
    }
}

fn parse_var<T: FromStr>(key: &str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let http_timeout = Duration::from_secs(
            parse_var::<u64>("HTTP_TIMEOUT_SECS", get("HTTP_TIMEOUT_SECS"))?.unwrap_or(60),
        );

        let detector_backend = parse_var::<DetectorBackend>("DETECTOR_BACKEND", get("DETECTOR_BACKEND"))?
            .unwrap_or(defaults.detector_backend);

        let roboflow = RoboflowConfig {
            api_url: get("ROBOFLOW_API_URL").unwrap_or(defaults.roboflow.api_url),
            api_key: get("ROBOFLOW_API_KEY").unwrap_or_default(),
            model_id: get("ROBOFLOW_MODEL_ID").unwrap_or(defaults.roboflow.model_id),
            timeout: http_timeout,
        };

        let yolo = YoloConfig {
            model_path: get("YOLO_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.yolo.model_path),
            labels_path: get("YOLO_LABELS_PATH")
                .map(PathBuf::from)
                .or(defaults.yolo.labels_path),
            confidence_threshold: parse_var("YOLO_CONFIDENCE", get("YOLO_CONFIDENCE"))?
                .unwrap_or(defaults.yolo.confidence_threshold),
            iou_threshold: parse_var("YOLO_IOU", get("YOLO_IOU"))?
                .unwrap_or(defaults.yolo.iou_threshold),
        };

        let ocr = OcrClientConfig {
            endpoint: get("OCR_ENDPOINT").unwrap_or(defaults.ocr.endpoint),
            language: get("OCR_LANGUAGE").unwrap_or(defaults.ocr.language),
            timeout: http_timeout,
        };

        let frame_interval = Duration::from_millis(
            parse_var::<u64>("CAMERA_FRAME_INTERVAL_MS", get("CAMERA_FRAME_INTERVAL_MS"))?
                .unwrap_or(100),
        );
        let camera = get("CAMERA_SNAPSHOT_URL").map(|url| SnapshotCameraConfig {
            url,
            frame_interval,
            timeout: http_timeout,
        });

        let lifespans = match get("PRODUCE_LIFESPANS") {
            Some(overrides) => defaults
                .lifespans
                .with_overrides(&overrides)
                .map_err(|message| ConfigError::InvalidValue {
                    key: "PRODUCE_LIFESPANS".to_string(),
                    message,
                })?,
            None => defaults.lifespans,
        };

        Ok(Self {
            listen_addr: get("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            upload_dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            detector_backend,
            roboflow,
            yolo,
            ocr,
            camera,
            results_capacity: parse_var("STREAM_RESULTS_CAPACITY", get("STREAM_RESULTS_CAPACITY"))?
                .unwrap_or(defaults.results_capacity),
            lifespans,
            brand: get("EXPIRY_BRAND").unwrap_or(defaults.brand),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                key: "LISTEN_ADDR".to_string(),
                message: e.to_string(),
            })?;

        if self.detector_backend == DetectorBackend::Roboflow && self.roboflow.api_key.is_empty() {
            return Err(ConfigError::Missing("ROBOFLOW_API_KEY".to_string()));
        }

        if self.results_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "STREAM_RESULTS_CAPACITY".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl AppConfig {
    /// Build the configured detector backend
    pub async fn build_detector(&self) -> anyhow::Result<Arc<dyn Detector>> {
        let detector: Arc<dyn Detector> = match self.detector_backend {
            DetectorBackend::Roboflow => Arc::new(
                RoboflowDetector::new(self.roboflow.clone())
                    .context("Failed to create Roboflow client")?,
            ),
            DetectorBackend::Yolo => Arc::new(YoloDetector::new(self.yolo.clone()).await?),
        };
        info!("Detector backend: {}", detector.name());
        Ok(detector)
    }

    /// Build the OCR client
    pub fn build_reader(&self) -> anyhow::Result<Arc<dyn TextReader>> {
        let reader =
            HttpTextReader::new(self.ocr.clone()).context("Failed to create OCR client")?;
        info!("OCR endpoint: {}", reader.endpoint());
        Ok(Arc::new(reader))
    }
}
