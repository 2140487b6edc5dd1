// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Camera streaming with per-frame produce analysis
//!
//! - `camera` - frame sources
//! - `buffer` - bounded results buffer shared with the results endpoint
//! - `session` - per-connection detect/annotate/encode loop

pub mod buffer;
pub mod camera;
pub mod session;

use thiserror::Error;

pub use buffer::{ResultsBuffer, DEFAULT_RESULTS_CAPACITY};
pub use camera::{FrameSource, SnapshotCamera, SnapshotCameraConfig};
pub use session::{multipart_part, StreamContext, StreamSession, MJPEG_BOUNDARY};

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Camera request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Camera returned HTTP {0}")]
    CameraStatus(u16),

    #[error("Invalid frame: {0}")]
    Frame(#[from] crate::vision::ImageError),

    #[error("Detection failed: {0}")]
    Detection(#[from] crate::vision::DetectionError),
}
