use std::collections::BTreeMap;

/// Well-known metric names used across the overlay pipeline.
pub mod names {
    pub const ADMITTED: &str = "admission.admitted";
    pub const EVICTED: &str = "admission.evicted";
    pub const PRUNED: &str = "admission.pruned";
    pub const ACTIVATED: &str = "fetch.activated";
    pub const FETCH_FAILED: &str = "fetch.failed";
    pub const FETCH_STALE: &str = "fetch.stale";
    pub const FETCH_LATENCY_FRAMES: &str = "fetch.latency_frames";
    pub const ACTIVE: &str = "active.count";
    pub const VISIBLE: &str = "visible.count";
    pub const TICKS: &str = "layout.ticks";
}

/// Deterministic metrics aggregation.
///
/// Metrics must not depend on wall-clock time or unordered iteration.
/// Sorted maps keep snapshots in a stable order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<&'static str, u64>,
    gauges: BTreeMap<&'static str, i64>,
    histograms: BTreeMap<&'static str, Histogram>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Histogram {
    pub count: u64,
    pub sum: i64,
    pub min: i64,
    pub max: i64,
}

impl Histogram {
    pub fn record(&mut self, value: i64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub counters: Vec<(&'static str, u64)>,
    pub gauges: Vec<(&'static str, i64)>,
    pub histograms: Vec<(&'static str, Histogram)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn inc_counter(&mut self, name: &'static str, by: u64) {
        *self.counters.entry(name).or_insert(0) += by;
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges.get(name).copied()
    }

    pub fn set_gauge(&mut self, name: &'static str, value: i64) {
        self.gauges.insert(name, value);
    }

    pub fn record_histogram(&mut self, name: &'static str, value: i64) {
        self.histograms.entry(name).or_default().record(value);
    }

    pub fn histogram(&self, name: &str) -> Option<Histogram> {
        self.histograms.get(name).copied()
    }

    /// Returns a stable, sorted snapshot suitable for logs.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (*k, *v)).collect(),
            gauges: self.gauges.iter().map(|(k, v)| (*k, *v)).collect(),
            histograms: self.histograms.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }

    pub fn log_snapshot(&self) {
        for (name, value) in &self.counters {
            tracing::debug!(metric = *name, value = *value, "counter");
        }
        for (name, value) in &self.gauges {
            tracing::debug!(metric = *name, value = *value, "gauge");
        }
        for (name, h) in &self.histograms {
            tracing::debug!(
                metric = *name,
                count = h.count,
                min = h.min,
                max = h.max,
                mean = h.mean().unwrap_or(0.0),
                "histogram"
            );
        }
    }
}
