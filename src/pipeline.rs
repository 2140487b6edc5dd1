// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Expiry date pipeline: detect → crop → binarise → OCR → extract

use image::DynamicImage;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::dates::{extract_date, DateCandidate};
use crate::vision::preprocessing::{binarize, crop_detection};
use crate::vision::{Detection, DetectionError, Detector, OcrError, TextReader, TextSpan};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Detection failed: {0}")]
    Detection(#[from] DetectionError),

    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),
}

/// Everything one scan produced
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub detections: Vec<Detection>,
    pub spans: Vec<TextSpan>,
    pub dates: Vec<DateCandidate>,
    pub processing_time_ms: u64,
}

/// Runs the detector and reader over an image
#[derive(Clone)]
pub struct ExpiryPipeline {
    detector: Arc<dyn Detector>,
    reader: Arc<dyn TextReader>,
}

impl ExpiryPipeline {
    pub fn new(detector: Arc<dyn Detector>, reader: Arc<dyn TextReader>) -> Self {
        Self { detector, reader }
    }

    pub fn detector(&self) -> &Arc<dyn Detector> {
        &self.detector
    }

    pub fn reader(&self) -> &Arc<dyn TextReader> {
        &self.reader
    }

    /// Scan an image for expiry dates.
    ///
    /// Regions that fall outside the image are skipped. The first detector or
    /// OCR error aborts the scan.
    pub async fn scan(&self, image: &DynamicImage) -> Result<ScanOutcome, PipelineError> {
        let start = Instant::now();
        let detections = self.detector.detect(image).await?;
        debug!("{} regions detected by {}", detections.len(), self.detector.name());

        let mut spans = Vec::new();
        let mut dates = Vec::new();

        for (index, detection) in detections.iter().enumerate() {
            let Some(crop) = crop_detection(image, detection) else {
                debug!("Region {} lies outside the image, skipping", index);
                continue;
            };

            let processed = binarize(&crop);
            let region_spans = self.reader.read_text(&processed).await?;

            for span in &region_spans {
                if let Some(date) = extract_date(&span.text) {
                    debug!("Region {}: '{}' -> {}", index, span.text, date.display());
                    dates.push(date);
                }
            }
            spans.extend(region_spans);
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Scan complete: {} regions, {} spans, {} dates, {}ms",
            detections.len(),
            spans.len(),
            dates.len(),
            processing_time_ms
        );

        Ok(ScanOutcome {
            detections,
            spans,
            dates,
            processing_time_ms,
        })
    }
}
