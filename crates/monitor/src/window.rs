//! Time-bounded FIFO of recent samples.
//!
//! Samples are appended in clock order and only ever removed from the front,
//! so the buffer is always chronological without sorting.

use std::collections::vec_deque::{self, VecDeque};

use serde::{Deserialize, Serialize};

use crate::curve::Reading;

/// One timestamped reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp_ms: u64,
    pub reading: Reading,
}

impl Sample {
    pub fn new(timestamp_ms: u64, reading: Reading) -> Self {
        Self {
            timestamp_ms,
            reading,
        }
    }

    pub fn voltage(&self) -> f32 {
        self.reading.voltage
    }

    pub fn is_charging(&self) -> bool {
        self.reading.is_charging()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Window {
    samples: VecDeque<Sample>,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sample: Sample) {
        debug_assert!(
            self.newest()
                .map_or(true, |last| last.timestamp_ms <= sample.timestamp_ms),
            "window samples must arrive in clock order"
        );
        self.samples.push_back(sample);
    }

    /// Drop samples older than `retention_ms` relative to `now_ms`.
    /// Returns how many were removed.
    pub fn evict(&mut self, now_ms: u64, retention_ms: u64) -> usize {
        let mut removed = 0;
        while let Some(oldest) = self.samples.front() {
            if now_ms.saturating_sub(oldest.timestamp_ms) <= retention_ms {
                break;
            }
            self.samples.pop_front();
            removed += 1;
        }
        removed
    }

    /// True when the newest sample is at least `recheck_ms` old, or there is
    /// none.
    pub fn is_due(&self, now_ms: u64, recheck_ms: u64) -> bool {
        match self.newest() {
            Some(newest) => now_ms.saturating_sub(newest.timestamp_ms) >= recheck_ms,
            None => true,
        }
    }

    pub fn newest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn oldest(&self) -> Option<&Sample> {
        self.samples.front()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Unrounded arithmetic mean of the stored voltages.
    pub fn mean_voltage(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|s| s.voltage() as f64).sum();
        Some((sum / self.samples.len() as f64) as f32)
    }
}

impl<'a> IntoIterator for &'a Window {
    type Item = &'a Sample;
    type IntoIter = vec_deque::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
