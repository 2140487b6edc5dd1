// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Produce freshness scoring for the camera stream

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

use crate::vision::Detection;

/// Expected shelf life of a produce type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifespan {
    Days(u32),
    Unknown,
}

impl Serialize for Lifespan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Lifespan::Days(days) => serializer.serialize_u32(*days),
            Lifespan::Unknown => serializer.serialize_str("N/A"),
        }
    }
}

impl std::fmt::Display for Lifespan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifespan::Days(days) => write!(f, "{}", days),
            Lifespan::Unknown => write!(f, "N/A"),
        }
    }
}

/// Produce label → expected lifespan in days
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifespanTable {
    entries: HashMap<String, u32>,
}

impl Default for LifespanTable {
    fn default() -> Self {
        let entries = [("broccoli", 5), ("onion", 12), ("papaya", 2)]
            .into_iter()
            .map(|(name, days)| (name.to_string(), days))
            .collect();
        Self { entries }
    }
}

impl LifespanTable {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, produce: &str, days: u32) {
        self.entries.insert(produce.to_string(), days);
    }

    pub fn lookup(&self, produce: &str) -> Lifespan {
        self.entries
            .get(produce)
            .map(|d| Lifespan::Days(*d))
            .unwrap_or(Lifespan::Unknown)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply `name=days` pairs separated by commas on top of this table
    pub fn with_overrides(mut self, overrides: &str) -> Result<Self, String> {
        for pair in overrides.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, days) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected name=days, got '{}'", pair))?;
            let days: u32 = days
                .trim()
                .parse()
                .map_err(|_| format!("invalid day count in '{}'", pair))?;
            self.insert(name.trim(), days);
        }
        Ok(self)
    }
}

/// One produce observation from a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProduceReading {
    pub timestamp: String,
    pub produce: String,
    /// Detection confidence scaled to 0-10
    pub freshness: u8,
    pub lifespan: Lifespan,
}

/// Confidence in [0, 1] scaled to a 0-10 score, ties rounded to even
pub fn freshness_score(confidence: f32) -> u8 {
    (confidence.clamp(0.0, 1.0) * 10.0).round_ties_even() as u8
}

#[derive(Debug, Clone, Default)]
pub struct FreshnessAnalyzer {
    lifespans: LifespanTable,
}

impl FreshnessAnalyzer {
    pub fn new(lifespans: LifespanTable) -> Self {
        Self { lifespans }
    }

    pub fn lifespans(&self) -> &LifespanTable {
        &self.lifespans
    }

    /// One reading per detection, stamped with `now`
    pub fn analyze(&self, detections: &[Detection], now: NaiveDateTime) -> Vec<ProduceReading> {
        let timestamp = now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string();

        detections
            .iter()
            .map(|d| ProduceReading {
                timestamp: timestamp.clone(),
                produce: d.class.clone(),
                freshness: freshness_score(d.confidence),
                lifespan: self.lifespans.lookup(&d.class),
            })
            .collect()
    }
}
