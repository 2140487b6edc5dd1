// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod feed;
pub mod handlers;
pub mod process;
pub mod render;
pub mod server;

pub use errors::{ApiError, ErrorResponse};
pub use feed::{findex_handler, results_handler, video_feed_handler};
pub use handlers::{health_handler, index_handler, HealthResponse};
pub use process::{process_handler, sanitize_filename};
pub use server::{create_router, start_server, AppState, MAX_UPLOAD_BYTES};
