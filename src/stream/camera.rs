// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Frame sources for the video feed

use async_trait::async_trait;
use image::DynamicImage;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::StreamError;
use crate::vision::decode_image_bytes;

/// Produces frames until it returns `None`
#[async_trait]
pub trait FrameSource: Send {
    async fn next_frame(&mut self) -> Result<Option<DynamicImage>, StreamError>;
}

#[derive(Debug, Clone)]
pub struct SnapshotCameraConfig {
    /// URL answering GET with a single JPEG/PNG frame
    pub url: String,
    /// Delay between consecutive snapshots
    pub frame_interval: Duration,
    pub timeout: Duration,
}

/// Camera polled over HTTP, one snapshot per frame
pub struct SnapshotCamera {
    client: Client,
    url: String,
    frame_interval: Duration,
    frames_read: u64,
}

impl SnapshotCamera {
    pub fn new(config: SnapshotCameraConfig) -> Result<Self, StreamError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        info!("Snapshot camera configured: {}", config.url);

        Ok(Self {
            client,
            url: config.url,
            frame_interval: config.frame_interval,
            frames_read: 0,
        })
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

#[async_trait]
impl FrameSource for SnapshotCamera {
    async fn next_frame(&mut self) -> Result<Option<DynamicImage>, StreamError> {
        if self.frames_read > 0 && !self.frame_interval.is_zero() {
            tokio::time::sleep(self.frame_interval).await;
        }

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::CameraStatus(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let (frame, info) = decode_image_bytes(&bytes)?;
        self.frames_read += 1;
        debug!(
            "Frame {} read: {}x{}",
            self.frames_read, info.width, info.height
        );

        Ok(Some(frame))
    }
}
