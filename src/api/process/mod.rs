// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image upload endpoint (POST /process)

pub mod filename;
pub mod handler;

pub use filename::sanitize_filename;
pub use handler::{process_handler, UPLOAD_FIELD};
