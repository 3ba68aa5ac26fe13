//! Time-windowed running mean.
//!
//! Samples older than `window` relative to the newest sample are evicted on
//! every ingest. Timestamps must be non-decreasing. A negative window is
//! treated as zero.

use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: TimeDelta,
    samples: VecDeque<(f64, DateTime<Utc>)>,
    sum: f64,
}

impl MovingAverage {
    pub fn new(window: TimeDelta) -> Self {
        MovingAverage {
            window: window.max(TimeDelta::zero()),
            samples: VecDeque::new(),
            sum: 0.0,
        }
    }

    /// Add a sample, then drop every sample strictly older than `timestamp - window`.
    pub fn ingest(&mut self, value: f64, timestamp: DateTime<Utc>) {
        self.samples.push_back((value, timestamp));
        self.sum += value;

        // Window reaching before the representable range: nothing to evict
        let Some(oldest_allowed) = timestamp.checked_sub_signed(self.window) else {
            return;
        };
        while let Some(&(old_value, old_ts)) = self.samples.front() {
            if old_ts >= oldest_allowed {
                break;
            }
            self.samples.pop_front();
            self.sum -= old_value;
        }
    }

    /// Mean of the samples in the window, NaN when empty.
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return f64::NAN;
        }
        self.sum / self.samples.len() as f64
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn window(&self) -> TimeDelta {
        self.window
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
