// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Expiry classification of extracted date candidates

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::extract::DateCandidate;

const SECONDS_PER_DAY: i64 = 86_400;

/// Timestamp format used in rendered records
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date format used for the expiry column
pub const EXPIRY_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExpiryError {
    #[error("Invalid calendar date: {year}-{month}-{day}")]
    InvalidDate {
        year: String,
        month: String,
        day: String,
    },
}

impl DateCandidate {
    /// Interpret the triple as a calendar date
    pub fn to_date(&self) -> Result<NaiveDate, ExpiryError> {
        let invalid = || ExpiryError::InvalidDate {
            year: self.year.clone(),
            month: self.month.clone(),
            day: self.day.clone(),
        };

        let year: i32 = self.year.parse().map_err(|_| invalid())?;
        let month: u32 = self.month.parse().map_err(|_| invalid())?;
        let day: u32 = self.day.parse().map_err(|_| invalid())?;

        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
    }
}

/// One row of the expiry table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryRecord {
    pub serial: usize,
    pub analyzed_at: String,
    pub brand: String,
    pub expiry_date: String,
    pub expired: bool,
    pub lifespan_days: i64,
}

impl ExpiryRecord {
    /// Classify a candidate relative to `now`.
    ///
    /// The expiry date is taken at midnight and the difference to `now` is
    /// floored to whole days, so an expiry later today counts as expired.
    pub fn classify(
        serial: usize,
        candidate: &DateCandidate,
        now: NaiveDateTime,
        brand: &str,
    ) -> Result<Self, ExpiryError> {
        let expiry = candidate.to_date()?;
        let days = days_until(expiry, now);

        Ok(Self {
            serial,
            analyzed_at: now.format(TIMESTAMP_FORMAT).to_string(),
            brand: brand.to_string(),
            expiry_date: expiry.format(EXPIRY_DATE_FORMAT).to_string(),
            expired: days <= 0,
            lifespan_days: days.max(0),
        })
    }

    /// "Yes"/"No" label for the expired column
    pub fn expired_label(&self) -> &'static str {
        if self.expired {
            "Yes"
        } else {
            "No"
        }
    }
}

/// Whole days from `now` until midnight of `expiry`, floored
pub fn days_until(expiry: NaiveDate, now: NaiveDateTime) -> i64 {
    let delta = expiry.and_time(chrono::NaiveTime::MIN) - now;
    delta.num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// A candidate that could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedCandidate {
    pub candidate: DateCandidate,
    pub reason: String,
}

/// Classified records plus the candidates that were not real dates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryReport {
    pub records: Vec<ExpiryRecord>,
    pub rejected: Vec<RejectedCandidate>,
}

/// Classify every candidate. Valid records are numbered from 1 in input order.
pub fn classify_all(candidates: &[DateCandidate], now: NaiveDateTime, brand: &str) -> ExpiryReport {
    let mut report = ExpiryReport::default();

    for candidate in candidates {
        let serial = report.records.len() + 1;
        match ExpiryRecord::classify(serial, candidate, now, brand) {
            Ok(record) => report.records.push(record),
            Err(e) => {
                warn!("Rejecting date candidate {}: {}", candidate.display(), e);
                report.rejected.push(RejectedCandidate {
                    candidate: candidate.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}
