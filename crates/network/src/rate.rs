// crates/network/src/rate.rs
//! Sliding-window transfer-rate estimation

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

/// Measured throughput over a short sliding window.
///
/// Callers feed (instant, cumulative-bytes) samples; the estimate is
/// Δbytes/Δt across the retained window, so short bursts and long
/// stalls both show up quickly instead of being averaged away over the
/// life of the transfer.
#[derive(Debug, Clone)]
pub struct RateEstimator {
    window: Duration,
    samples: VecDeque<(Instant, u64)>,
}

impl RateEstimator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    /// Records the current cumulative byte count
    pub fn record(&mut self, cumulative_bytes: u64) {
        self.record_at(Instant::now(), cumulative_bytes);
    }

    /// Records a sample at an explicit instant. Samples must be
    /// monotonic in both time and bytes; reset between chapters.
    pub fn record_at(&mut self, at: Instant, cumulative_bytes: u64) {
        self.samples.push_back((at, cumulative_bytes));

        // Retain one sample older than the window so the rate always
        // spans at least the full window once enough data exists.
        while self.samples.len() > 2 {
            let second_oldest = self.samples[1].0;
            if at.duration_since(second_oldest) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Estimated bytes per second over the window; 0.0 until two
    /// samples exist.
    pub fn rate(&self) -> f64 {
        let (Some(&(first_at, first_bytes)), Some(&(last_at, last_bytes))) =
            (self.samples.front(), self.samples.back())
        else {
            return 0.0;
        };

        let elapsed = last_at.duration_since(first_at).as_secs_f64();
        if elapsed <= 0.0 || last_bytes <= first_bytes {
            return 0.0;
        }
        (last_bytes - first_bytes) as f64 / elapsed
    }

    /// Drops all samples, e.g. when a new chapter starts
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}

impl Default for RateEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
