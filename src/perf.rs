//! Performance Metrics - per-call latency sampling
//!
//! Collects timing data from workload runs for percentile analysis.

use serde::Serialize;

/// Latency samples and per-operation time totals
/// Collected per worker thread, then merged
#[derive(Debug, Default, Clone, Serialize)]
pub struct PerfMetrics {
    // Timing breakdown (nanoseconds)
    pub total_charge_ns: u64,
    pub total_use_ns: u64,

    // Per-call latency samples (nanoseconds)
    // We sample every Nth call to keep memory bounded
    #[serde(skip)]
    pub latency_samples: Vec<u64>,
    #[serde(skip)]
    sample_rate: usize,
    #[serde(skip)]
    sample_counter: usize,
}

impl PerfMetrics {
    /// Create new metrics collector with given sample rate
    ///
    /// # Arguments
    /// * `sample_rate` - Sample every Nth call for latency percentiles
    pub fn new(sample_rate: usize) -> Self {
        PerfMetrics {
            sample_rate: sample_rate.max(1),
            latency_samples: Vec::with_capacity(1_024),
            ..Default::default()
        }
    }

    /// Record per-call latency (sampled)
    #[inline]
    pub fn add_call_latency(&mut self, latency_ns: u64) {
        self.sample_counter += 1;
        if self.sample_counter >= self.sample_rate {
            self.latency_samples.push(latency_ns);
            self.sample_counter = 0;
        }
    }

    #[inline]
    pub fn add_charge_time(&mut self, ns: u64) {
        self.total_charge_ns += ns;
    }

    #[inline]
    pub fn add_use_time(&mut self, ns: u64) {
        self.total_use_ns += ns;
    }

    /// Fold another collector (e.g. from a worker thread) into this one
    pub fn merge(&mut self, other: PerfMetrics) {
        self.total_charge_ns += other.total_charge_ns;
        self.total_use_ns += other.total_use_ns;
        self.latency_samples.extend(other.latency_samples);
    }

    /// Calculate percentile from samples
    ///
    /// # Arguments
    /// * `p` - Percentile (0-100), e.g., 50.0 for median, 99.0 for P99
    pub fn percentile(&self, p: f64) -> Option<u64> {
        if self.latency_samples.is_empty() {
            return None;
        }
        let mut sorted = self.latency_samples.clone();
        sorted.sort_unstable();
        let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        Some(sorted[idx.min(sorted.len() - 1)])
    }

    pub fn min_latency(&self) -> Option<u64> {
        self.latency_samples.iter().copied().min()
    }

    pub fn max_latency(&self) -> Option<u64> {
        self.latency_samples.iter().copied().max()
    }

    pub fn avg_latency(&self) -> Option<u64> {
        if self.latency_samples.is_empty() {
            return None;
        }
        Some(self.latency_samples.iter().sum::<u64>() / self.latency_samples.len() as u64)
    }

    /// Share of tracked time spent in (charge, use), in percent
    pub fn breakdown_pct(&self) -> (f64, f64) {
        let total = (self.total_charge_ns + self.total_use_ns) as f64;
        if total == 0.0 {
            return (0.0, 0.0);
        }
        (
            self.total_charge_ns as f64 / total * 100.0,
            self.total_use_ns as f64 / total * 100.0,
        )
    }
}
