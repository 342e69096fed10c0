//! Process-wide cycle counters
//!
//! Atomic counters updated by the monitor loop. A snapshot is logged with
//! every sleep so operators can spot a monitor that keeps skipping cycles.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

/// Thread-safe metrics collector using atomics
#[derive(Debug, Default)]
pub struct MetricsCollector {
    cycles_started: AtomicU64,
    measurements_succeeded: AtomicU64,
    cycles_skipped: AtomicU64,
    messages_published: AtomicU64,
    publish_failures: AtomicU64,
    recoveries: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub cycles_started: u64,
    pub measurements_succeeded: u64,
    pub cycles_skipped: u64,
    pub messages_published: u64,
    pub publish_failures: u64,
    pub recoveries: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cycle_started(&self) {
        self.cycles_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn measurement_succeeded(&self) {
        self.measurements_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cycle_skipped(&self) {
        self.cycles_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn messages_published(&self, count: usize) {
        self.messages_published
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn publish_failed(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn recovery_triggered(&self) {
        self.recoveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_started: self.cycles_started.load(Ordering::Relaxed),
            measurements_succeeded: self.measurements_succeeded.load(Ordering::Relaxed),
            cycles_skipped: self.cycles_skipped.load(Ordering::Relaxed),
            messages_published: self.messages_published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            recoveries: self.recoveries.load(Ordering::Relaxed),
        }
    }
}
