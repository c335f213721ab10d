//! Metrics collection
//!
//! Three kinds: monotonic counters (relaxed atomic increments once the
//! entry exists), last-write-wins gauges, and per-operation latency
//! reservoirs summarized to percentiles on demand. Metric names are
//! caller-supplied; every distinct name pins a map entry for the
//! collector's lifetime.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Summary of one latency reservoir, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub min_us: f64,
    pub max_us: f64,
    pub mean_us: f64,
    pub p50_us: f64,
    pub p95_us: f64,
    pub p99_us: f64,
}

/// Thread-safe collector for counters, gauges, and latency reservoirs.
#[derive(Default)]
pub struct MetricsCollector {
    counters: DashMap<String, AtomicU64>,
    gauges: DashMap<String, f64>,
    latencies: Mutex<HashMap<String, Vec<u64>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter by one
    pub fn increment_counter(&self, name: &str) {
        self.add_to_counter(name, 1);
    }

    pub fn add_to_counter(&self, name: &str, delta: u64) {
        if let Some(counter) = self.counters.get(name) {
            counter.fetch_add(delta, Ordering::Relaxed);
            return;
        }
        self.counters
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(delta, Ordering::Relaxed);
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Record a gauge value; the last write wins.
    pub fn record_gauge(&self, name: &str, value: f64) {
        self.gauges.insert(name.to_string(), value);
    }

    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.gauges.get(name).map(|g| *g)
    }

    /// Append one latency sample to an operation's reservoir.
    pub fn record_latency(&self, operation: &str, latency_us: u64) {
        self.latencies
            .lock()
            .entry(operation.to_string())
            .or_default()
            .push(latency_us);
    }

    /// Summarize an operation's reservoir. Unknown operations yield zeros.
    pub fn latency_stats(&self, operation: &str) -> LatencyStats {
        let latencies = self.latencies.lock();
        let Some(samples) = latencies.get(operation) else {
            return LatencyStats::default();
        };
        if samples.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted = samples.clone();
        drop(latencies);
        sorted.sort_unstable();

        let count = sorted.len() as u64;
        let sum: u64 = sorted.iter().sum();

        LatencyStats {
            count,
            min_us: sorted[0] as f64,
            max_us: sorted[sorted.len() - 1] as f64,
            mean_us: sum as f64 / count as f64,
            p50_us: percentile(&sorted, 0.50),
            p95_us: percentile(&sorted, 0.95),
            p99_us: percentile(&sorted, 0.99),
        }
    }

    /// Clear all counters, gauges, and reservoirs.
    pub fn reset(&self) {
        self.counters.clear();
        self.gauges.clear();
        self.latencies.lock().clear();
    }

    /// Render every metric as a human-readable text dump.
    pub fn render(&self) -> String {
        let mut out = String::new();

        let mut counter_names: Vec<String> =
            self.counters.iter().map(|e| e.key().clone()).collect();
        counter_names.sort();
        for name in counter_names {
            let _ = writeln!(out, "counter {} = {}", name, self.counter(&name));
        }

        let mut gauge_names: Vec<String> = self.gauges.iter().map(|e| e.key().clone()).collect();
        gauge_names.sort();
        for name in gauge_names {
            if let Some(value) = self.gauge(&name) {
                let _ = writeln!(out, "gauge {} = {}", name, value);
            }
        }

        let mut operations: Vec<String> = self.latencies.lock().keys().cloned().collect();
        operations.sort();
        for operation in operations {
            let stats = self.latency_stats(&operation);
            let _ = writeln!(
                out,
                "latency {} count={} mean={:.1}us p50={:.1}us p95={:.1}us p99={:.1}us min={:.1}us max={:.1}us",
                operation,
                stats.count,
                stats.mean_us,
                stats.p50_us,
                stats.p95_us,
                stats.p99_us,
                stats.min_us,
                stats.max_us
            );
        }

        out
    }
}

/// Linear-interpolation percentile over a sorted sample set: the value at
/// fractional index `p * (n - 1)`.
pub fn percentile(sorted: &[u64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0] as f64;
    }

    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    sorted[lower] as f64 + (sorted[upper] as f64 - sorted[lower] as f64) * fraction
}

/// Records one latency sample to a named reservoir when dropped.
pub struct ScopedTimer<'a> {
    collector: &'a MetricsCollector,
    operation: &'a str,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(collector: &'a MetricsCollector, operation: &'a str) -> Self {
        Self {
            collector,
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        let elapsed_us = self.start.elapsed().as_micros() as u64;
        self.collector.record_latency(self.operation, elapsed_us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = MetricsCollector::new();
        assert_eq!(metrics.counter("requests"), 0);

        metrics.increment_counter("requests");
        metrics.increment_counter("requests");
        metrics.add_to_counter("requests", 3);

        assert_eq!(metrics.counter("requests"), 5);
    }

    #[test]
    fn test_gauges_last_write_wins() {
        let metrics = MetricsCollector::new();
        assert_eq!(metrics.gauge("load"), None);

        metrics.record_gauge("load", 0.25);
        metrics.record_gauge("load", 0.75);
        assert_eq!(metrics.gauge("load"), Some(0.75));
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = vec![10, 20, 30, 40, 50];

        assert_eq!(percentile(&sorted, 0.0), 10.0);
        assert_eq!(percentile(&sorted, 1.0), 50.0);
        assert_eq!(percentile(&sorted, 0.5), 30.0);
        // rank 0.25 * 4 = 1.0 exactly
        assert_eq!(percentile(&sorted, 0.25), 20.0);
        // rank 0.95 * 4 = 3.8 -> 40 + 0.8 * 10
        assert!((percentile(&sorted, 0.95) - 48.0).abs() < 1e-9);

        assert_eq!(percentile(&[], 0.5), 0.0);
        assert_eq!(percentile(&[7], 0.99), 7.0);
    }

    #[test]
    fn test_latency_stats_summary() {
        let metrics = MetricsCollector::new();
        for sample in [100, 200, 300, 400, 500] {
            metrics.record_latency("op", sample);
        }

        let stats = metrics.latency_stats("op");
        assert_eq!(stats.count, 5);
        assert_eq!(stats.min_us, 100.0);
        assert_eq!(stats.max_us, 500.0);
        assert_eq!(stats.mean_us, 300.0);
        assert_eq!(stats.p50_us, 300.0);

        assert_eq!(metrics.latency_stats("unknown"), LatencyStats::default());
    }

    #[test]
    fn test_scoped_timer_records_one_sample() {
        let metrics = MetricsCollector::new();
        {
            let _timer = ScopedTimer::new(&metrics, "scoped");
        }

        let stats = metrics.latency_stats("scoped");
        assert_eq!(stats.count, 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let metrics = MetricsCollector::new();
        metrics.increment_counter("c");
        metrics.record_gauge("g", 1.0);
        metrics.record_latency("l", 10);

        metrics.reset();

        assert_eq!(metrics.counter("c"), 0);
        assert_eq!(metrics.gauge("g"), None);
        assert_eq!(metrics.latency_stats("l").count, 0);
    }

    #[test]
    fn test_render_lists_all_kinds() {
        let metrics = MetricsCollector::new();
        metrics.increment_counter("hits");
        metrics.record_gauge("load", 0.5);
        metrics.record_latency("op", 123);

        let dump = metrics.render();
        assert!(dump.contains("counter hits = 1"));
        assert!(dump.contains("gauge load = 0.5"));
        assert!(dump.contains("latency op count=1"));
    }
}
