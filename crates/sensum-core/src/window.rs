//! Bounded, duration-limited sample window.
//!
//! The window is the unit of analysis shared by all estimators: a
//! timestamp-ordered run of recent samples. It enforces monotonicity by
//! resynchronizing on a timestamp regression, evicts samples older than the
//! configured duration, and caps the total count so a stalled-then-resumed
//! source can never grow it without bound.

use std::collections::VecDeque;

use crate::domain::Sample;

#[derive(Debug, Clone)]
pub struct SampleWindow {
    window_us: i64,
    capacity: usize,
    samples: VecDeque<Sample>,
}

impl SampleWindow {
    /// Create a window spanning `window_us` microseconds, holding at most
    /// `capacity` samples.
    pub fn new(window_us: i64, capacity: usize) -> Self {
        SampleWindow {
            window_us,
            capacity,
            samples: VecDeque::with_capacity(capacity.min(4096)),
        }
    }

    /// Append a sample and evict anything now out of the window.
    ///
    /// A timestamp older than the newest retained sample means the source
    /// resynchronized (stall, restart); the stale backlog is dropped and the
    /// window restarts from this sample. Returns `false` in that case.
    pub fn push(&mut self, sample: Sample) -> bool {
        let mut in_order = true;
        if let Some(last) = self.samples.back() {
            if sample.ts_us < last.ts_us {
                self.samples.clear();
                in_order = false;
            }
        }
        self.samples.push_back(sample);
        self.evict_before(sample.ts_us - self.window_us);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        in_order
    }

    /// Drop all samples with `ts_us < cutoff_us`.
    pub fn evict_before(&mut self, cutoff_us: i64) {
        while let Some(front) = self.samples.front() {
            if front.ts_us < cutoff_us {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Copy of the full window contents, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    /// The most recent `n` samples, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Sample> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip).copied().collect()
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

    /// Time covered by the retained samples, in microseconds.
    pub fn span_us(&self) -> i64 {
        match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) => last.ts_us - first.ts_us,
            _ => 0,
        }
    }

    pub fn newest_ts_us(&self) -> Option<i64> {
        self.samples.back().map(|s| s.ts_us)
    }
}
