//! Metrics for sluice ring buffers.
//!
//! Lightweight per-buffer counters for observability

use std::sync::atomic::{ AtomicU64, Ordering };

/// Counters owned by a single ring buffer
#[derive(Debug)]
pub struct Metrics {
    pub items_published: AtomicU64,
    pub items_consumed: AtomicU64,
    pub producer_waits: AtomicU64,
    pub consumer_waits: AtomicU64,
    pub shutdown_returns: AtomicU64,
    pub full_rejections: AtomicU64,
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            items_published: AtomicU64::new(0),
            items_consumed: AtomicU64::new(0),
            producer_waits: AtomicU64::new(0),
            consumer_waits: AtomicU64::new(0),
            shutdown_returns: AtomicU64::new(0),
            full_rejections: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_publish(&self, count: u64) {
        self.items_published.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_consume(&self, count: u64) {
        self.items_consumed.fetch_add(count, Ordering::Relaxed);
    }

    /// Producer had to wait for the slowest consumer
    #[inline]
    pub fn record_producer_wait(&self) {
        self.producer_waits.fetch_add(1, Ordering::Relaxed);
    }

    /// Consumer had to wait for a producer to publish
    #[inline]
    pub fn record_consumer_wait(&self) {
        self.consumer_waits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_shutdown_return(&self) {
        self.shutdown_returns.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_full_rejection(&self) {
        self.full_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_published: self.items_published.load(Ordering::Relaxed),
            items_consumed: self.items_consumed.load(Ordering::Relaxed),
            producer_waits: self.producer_waits.load(Ordering::Relaxed),
            consumer_waits: self.consumer_waits.load(Ordering::Relaxed),
            shutdown_returns: self.shutdown_returns.load(Ordering::Relaxed),
            full_rejections: self.full_rejections.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.items_published.store(0, Ordering::Relaxed);
        self.items_consumed.store(0, Ordering::Relaxed);
        self.producer_waits.store(0, Ordering::Relaxed);
        self.consumer_waits.store(0, Ordering::Relaxed);
        self.shutdown_returns.store(0, Ordering::Relaxed);
        self.full_rejections.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub items_published: u64,
    /// Summed over all consumers: each consumer counts every item it reads
    pub items_consumed: u64,
    pub producer_waits: u64,
    pub consumer_waits: u64,
    pub shutdown_returns: u64,
    pub full_rejections: u64,
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "published={} consumed={} producer_waits={} consumer_waits={} shutdown_returns={} full={}",
            self.items_published,
            self.items_consumed,
            self.producer_waits,
            self.consumer_waits,
            self.shutdown_returns,
            self.full_rejections
        )
    }
}
