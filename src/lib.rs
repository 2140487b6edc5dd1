// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod dates;
pub mod freshness;
pub mod pipeline;
pub mod stream;
pub mod version;
pub mod vision;

// Re-export main types
pub use config::{AppConfig, DetectorBackend};
pub use dates::{classify_all, extract_date, extract_dates, DateCandidate, ExpiryRecord, ExpiryReport};
pub use freshness::{FreshnessAnalyzer, LifespanTable, ProduceReading};
pub use pipeline::{ExpiryPipeline, PipelineError, ScanOutcome};
pub use stream::{ResultsBuffer, StreamContext};
pub use vision::{Detection, Detector, TextReader, TextSpan};
