use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Overlay activity counters, shared by every tile in a registry.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Default)]
struct Metrics {
    renders: usize,
    fetch_failures: usize,
    discarded_responses: usize,
}

/// Point-in-time copy of the counters, exposed on the dashboard bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub renders: usize,
    pub fetch_failures: usize,
    pub discarded_responses: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_render(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.renders += 1;
        }
    }

    pub fn record_fetch_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.fetch_failures += 1;
        }
    }

    pub fn record_discarded(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.discarded_responses += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            MetricsSnapshot {
                renders: metrics.renders,
                fetch_failures: metrics.fetch_failures,
                discarded_responses: metrics.discarded_responses,
            }
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
