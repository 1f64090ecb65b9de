//! Lightweight in-process metrics for the worker.
//!
//! Counters plus a bounded latency histogram with percentile readout.  Good
//! enough for log-line snapshots; nothing here is exported.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

const HISTOGRAM_WINDOW: usize = 500;

#[derive(Default)]
pub struct Metrics {
    pub jobs_processed: AtomicU64,
    pub jobs_failed: AtomicU64,
    pub passthroughs: AtomicU64,
    latency_secs: Mutex<VecDeque<f64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe_latency(&self, seconds: f64) {
        let mut window = self.latency_secs.lock().unwrap_or_else(|e| e.into_inner());
        if window.len() == HISTOGRAM_WINDOW {
            window.pop_front();
        }
        window.push_back(seconds);
    }

    /// Latency percentile over the rolling window (`pct` in `0.0..=1.0`).
    pub fn latency_percentile(&self, pct: f64) -> f64 {
        let window = self.latency_secs.lock().unwrap_or_else(|e| e.into_inner());
        if window.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = window.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let index = ((sorted.len() as f64) * pct) as usize;
        sorted[index.min(sorted.len() - 1)]
    }

    pub fn processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_over_window() {
        let metrics = Metrics::new();
        for i in 1..=100 {
            metrics.observe_latency(i as f64 / 100.0);
        }
        assert!(metrics.latency_percentile(0.5) > 0.4);
        assert!(metrics.latency_percentile(0.99) > 0.9);
        assert_eq!(Metrics::new().latency_percentile(0.5), 0.0);
    }

    #[test]
    fn window_is_bounded() {
        let metrics = Metrics::new();
        for _ in 0..(HISTOGRAM_WINDOW + 50) {
            metrics.observe_latency(1.0);
        }
        let window = metrics.latency_secs.lock().unwrap();
        assert_eq!(window.len(), HISTOGRAM_WINDOW);
    }
}
