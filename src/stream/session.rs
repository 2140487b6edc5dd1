// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-connection video feed sessions

use bytes::Bytes;
use futures::Stream;
use image::DynamicImage;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::buffer::ResultsBuffer;
use super::camera::{FrameSource, SnapshotCamera, SnapshotCameraConfig};
use super::StreamError;
use crate::freshness::{FreshnessAnalyzer, ProduceReading};
use crate::vision::image_utils::encode_jpeg;
use crate::vision::preprocessing::draw_detections;
use crate::vision::Detector;

/// Multipart boundary of the video feed
pub const MJPEG_BOUNDARY: &str = "frame";

/// Wrap a JPEG as one `multipart/x-mixed-replace` part
pub fn multipart_part(jpeg: &[u8]) -> Bytes {
    let header = format!("--{}\r\nContent-Type: image/jpeg\r\n\r\n", MJPEG_BOUNDARY);
    let mut part = Vec::with_capacity(header.len() + jpeg.len() + 2);
    part.extend_from_slice(header.as_bytes());
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    Bytes::from(part)
}

/// Shared streaming state: detector, scoring and the results buffer.
///
/// Every video feed connection gets its own `StreamSession`; all sessions
/// append into the same bounded buffer that `/results` reads from.
#[derive(Clone)]
pub struct StreamContext {
    detector: Arc<dyn Detector>,
    analyzer: FreshnessAnalyzer,
    results: Arc<RwLock<ResultsBuffer>>,
    camera: Option<SnapshotCameraConfig>,
}

impl StreamContext {
    pub fn new(
        detector: Arc<dyn Detector>,
        analyzer: FreshnessAnalyzer,
        capacity: usize,
        camera: Option<SnapshotCameraConfig>,
    ) -> Self {
        Self {
            detector,
            analyzer,
            results: Arc::new(RwLock::new(ResultsBuffer::new(capacity))),
            camera,
        }
    }

    pub fn results(&self) -> &Arc<RwLock<ResultsBuffer>> {
        &self.results
    }

    /// Copy of the accumulated readings, oldest first
    pub async fn snapshot(&self) -> Vec<ProduceReading> {
        self.results.read().await.snapshot()
    }

    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    /// Open a session on the configured camera, `None` if there is none
    pub fn open_session(&self) -> Result<Option<StreamSession>, StreamError> {
        match self.camera {
            Some(ref config) => {
                let camera = SnapshotCamera::new(config.clone())?;
                Ok(Some(self.session_with_source(Box::new(camera))))
            }
            None => Ok(None),
        }
    }

    pub fn session_with_source(&self, source: Box<dyn FrameSource>) -> StreamSession {
        StreamSession {
            source,
            detector: self.detector.clone(),
            analyzer: self.analyzer.clone(),
            results: self.results.clone(),
            frames: 0,
        }
    }
}

/// Reads frames, records readings and yields annotated JPEG parts
pub struct StreamSession {
    source: Box<dyn FrameSource>,
    detector: Arc<dyn Detector>,
    analyzer: FreshnessAnalyzer,
    results: Arc<RwLock<ResultsBuffer>>,
    frames: u64,
}

impl StreamSession {
    /// Process the next frame. `Ok(None)` once the source is exhausted.
    pub async fn next_part(&mut self) -> Result<Option<Bytes>, StreamError> {
        let Some(frame) = self.source.next_frame().await? else {
            debug!("Frame source exhausted after {} frames", self.frames);
            return Ok(None);
        };

        let detections = self.detector.detect(&frame).await.map_err(|e| {
            warn!("Frame {} detection failed: {}", self.frames, e);
            e
        })?;

        let readings = self
            .analyzer
            .analyze(&detections, chrono::Local::now().naive_local());
        self.results.write().await.extend(readings);

        let mut annotated = frame.to_rgb8();
        draw_detections(&mut annotated, &detections);
        let jpeg = encode_jpeg(&DynamicImage::ImageRgb8(annotated))?;

        self.frames += 1;
        Ok(Some(multipart_part(&jpeg)))
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Turn the session into a stream of multipart parts
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, StreamError>> + Send {
        futures::stream::try_unfold(self, |mut session| async move {
            let next = session.next_part().await?;
            Ok::<_, StreamError>(next.map(|part| (part, session)))
        })
    }
}
