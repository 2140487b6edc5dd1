// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload handler

use axum::extract::State;
use axum::response::Html;
use axum_extra::extract::multipart::MultipartRejection;
use axum_extra::extract::Multipart;
use bytes::Bytes;
use tracing::{debug, info, warn};

use super::filename::sanitize_filename;
use crate::api::errors::ApiError;
use crate::api::render::{index_page, ScanView};
use crate::api::server::AppState;
use crate::dates::classify_all;
use crate::vision::decode_image_bytes;

/// Multipart field carrying the image
pub const UPLOAD_FIELD: &str = "image";

struct Upload {
    filename: String,
    data: Bytes,
}

/// Pull the `image` file part out of the form.
///
/// Other fields, and an `image` field sent without a filename (a plain text
/// field), are skipped.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<Upload>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Skipping form field {:?}", field.name());
            continue;
        }

        let Some(filename) = field.file_name().map(str::to_string) else {
            debug!("Skipping non-file field {}", UPLOAD_FIELD);
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to read upload: {}", e)))?;

        return Ok(Some(Upload { filename, data }));
    }

    Ok(None)
}

/// POST /process - Scan an uploaded image for expiry dates
///
/// The file is stored under the upload directory with a sanitised name, run
/// through the detector and OCR, and the extracted dates are rendered as an
/// HTML table below the upload form.
///
/// # Errors
/// - 400: not a multipart form or no `image` file part (`No file part`), or an
///   empty filename (`No selected file`)
/// - 500: storage, decoding, detection or OCR failure
pub async fn process_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Html<String>, ApiError> {
    // Not a multipart form at all: no file part either
    let mut multipart = multipart.map_err(|e| {
        warn!("Upload rejected: {}", e);
        ApiError::InvalidRequest("No file part".to_string())
    })?;

    let Some(upload) = read_upload(&mut multipart).await? else {
        warn!("Upload rejected: no image field");
        return Err(ApiError::InvalidRequest("No file part".to_string()));
    };

    if upload.filename.is_empty() {
        warn!("Upload rejected: empty filename");
        return Err(ApiError::InvalidRequest("No selected file".to_string()));
    }

    let filename = sanitize_filename(&upload.filename);
    let path = state.upload_dir().join(&filename);
    tokio::fs::create_dir_all(state.upload_dir()).await?;
    tokio::fs::write(&path, &upload.data).await.map_err(|e| {
        warn!("Failed to store upload {}: {}", path.display(), e);
        ApiError::from(e)
    })?;
    info!("Stored upload {} ({} bytes)", path.display(), upload.data.len());

    let (image, image_info) = decode_image_bytes(&upload.data).map_err(|e| {
        warn!("Failed to decode {}: {}", filename, e);
        ApiError::from(e)
    })?;
    debug!(
        "Decoded {}: {}x{} {:?}",
        filename, image_info.width, image_info.height, image_info.format
    );

    let outcome = state.pipeline().scan(&image).await.map_err(|e| {
        warn!("Scan of {} failed: {}", filename, e);
        ApiError::from(e)
    })?;

    let now = chrono::Local::now().naive_local();
    let report = classify_all(&outcome.dates, now, state.brand());

    info!(
        "Scanned {}: {} regions, {} dates, {} rejected, {}ms",
        filename,
        outcome.detections.len(),
        report.records.len(),
        report.rejected.len(),
        outcome.processing_time_ms
    );

    Ok(Html(index_page(Some(&ScanView {
        filename: &filename,
        regions: outcome.detections.len(),
        report: &report,
    }))))
}
