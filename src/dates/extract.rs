// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Regex-based date extraction from OCR text

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Four digits, then two, then two, anchored at the start of the span
const YEAR_FIRST_PATTERN: &str = r"^(\d{4})\D*(\d{2})\D*(\d{2})";

/// Two digits, then two, then four, anchored at the start of the span
const DAY_FIRST_PATTERN: &str = r"^(\d{2})\D*(\d{2})\D*(\d{4})";

fn year_first() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(YEAR_FIRST_PATTERN).expect("year-first pattern is valid"))
}

fn day_first() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DAY_FIRST_PATTERN).expect("day-first pattern is valid"))
}

/// A {year, month, day} triple read from a text span.
///
/// The fields are kept as the digit strings that matched. Nothing checks that
/// they form a real calendar date: "2024.13.45" is a valid candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCandidate {
    pub year: String,
    pub month: String,
    pub day: String,
}

impl DateCandidate {
    pub fn new(year: &str, month: &str, day: &str) -> Self {
        Self {
            year: year.to_string(),
            month: month.to_string(),
            day: day.to_string(),
        }
    }

    /// Render as `YYYY-MM-DD` without validation
    pub fn display(&self) -> String {
        format!("{}-{}-{}", self.year, self.month, self.day)
    }
}

/// Extract a date candidate from one text span.
///
/// The year-first pattern is tried first; the day-first pattern is only
/// consulted when it does not match.
pub fn extract_date(text: &str) -> Option<DateCandidate> {
    if let Some(caps) = year_first().captures(text) {
        return Some(DateCandidate {
            year: caps[1].to_string(),
            month: caps[2].to_string(),
            day: caps[3].to_string(),
        });
    }

    day_first().captures(text).map(|caps| DateCandidate {
        year: caps[3].to_string(),
        month: caps[2].to_string(),
        day: caps[1].to_string(),
    })
}

/// Extract candidates from every span, in span order
pub fn extract_dates<I, S>(spans: I) -> Vec<DateCandidate>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    spans
        .into_iter()
        .filter_map(|span| extract_date(span.as_ref()))
        .collect()
}
