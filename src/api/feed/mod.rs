// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Webcam produce feed endpoints

pub mod handler;

pub use handler::{findex_handler, results_handler, video_feed_handler};
