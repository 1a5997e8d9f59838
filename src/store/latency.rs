use rand::Rng;
use std::thread;
use std::time::Duration;

use crate::config::LatencyConfig;

/// Block the calling thread for a random duration in `[min_ms, max_ms]`.
pub(crate) fn simulate(latency: LatencyConfig) {
    if latency.is_zero() {
        return;
    }
    let ms = if latency.min_ms >= latency.max_ms {
        latency.max_ms
    } else {
        rand::thread_rng().gen_range(latency.min_ms..=latency.max_ms)
    };
    thread::sleep(Duration::from_millis(ms));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_zero_latency_returns_immediately() {
        let start = Instant::now();
        simulate(LatencyConfig::ZERO);
        assert!(start.elapsed() < Duration::from_millis(5));
    }

    #[test]
    fn test_fixed_latency_sleeps_at_least_min() {
        let start = Instant::now();
        simulate(LatencyConfig::fixed(10));
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
