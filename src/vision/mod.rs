// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision adapters
//!
//! This module provides:
//! - Object detection (hosted Roboflow API or local YOLO via ONNX Runtime)
//! - OCR of detected regions through an external engine
//! - Image decoding, cropping and binarisation helpers

pub mod detector;
pub mod image_utils;
pub mod ocr;
pub mod preprocessing;

pub use detector::{Detection, DetectionError, Detector};
pub use image_utils::{decode_image_bytes, detect_format, ImageError, ImageInfo};
pub use ocr::{OcrError, TextReader, TextSpan};
