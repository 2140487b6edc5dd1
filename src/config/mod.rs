// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration loaded from environment variables

pub mod app;

pub use app::{AppConfig, ConfigError, DetectorBackend};
