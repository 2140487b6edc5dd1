// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Date extraction and expiry classification
//!
//! OCR text spans are scanned for year-first and day-first digit groups,
//! producing unvalidated `DateCandidate`s. Candidates are then classified
//! against a reference time into `ExpiryRecord`s.

pub mod expiry;
pub mod extract;

pub use expiry::{classify_all, ExpiryError, ExpiryRecord, ExpiryReport, RejectedCandidate};
pub use extract::{extract_date, extract_dates, DateCandidate};
