// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bounded FIFO of produce readings

use std::collections::VecDeque;

use crate::freshness::ProduceReading;

pub const DEFAULT_RESULTS_CAPACITY: usize = 1000;

/// Keeps the most recent `capacity` readings; older ones are evicted first
#[derive(Debug, Clone)]
pub struct ResultsBuffer {
    readings: VecDeque<ProduceReading>,
    capacity: usize,
}

impl Default for ResultsBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_RESULTS_CAPACITY)
    }
}

impl ResultsBuffer {
    /// A capacity of 0 is treated as 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            readings: VecDeque::with_capacity(capacity.min(DEFAULT_RESULTS_CAPACITY)),
            capacity,
        }
    }

    pub fn push(&mut self, reading: ProduceReading) {
        if self.readings.len() == self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    pub fn extend<I: IntoIterator<Item = ProduceReading>>(&mut self, readings: I) {
        for reading in readings {
            self.push(reading);
        }
    }

    /// Readings oldest first
    pub fn snapshot(&self) -> Vec<ProduceReading> {
        self.readings.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.readings.clear();
    }
}
