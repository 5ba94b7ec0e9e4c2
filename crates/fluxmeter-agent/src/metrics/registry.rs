//! Registry of metric instances keyed by `(name, LabelSet)`.
//!
//! Backed by `DashMap`, one map per metric kind. Instances are created on first
//! lookup via `entry().or_insert_with`, which holds the shard lock across the
//! check and the insert, and are never removed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use fluxmeter_core::histogram::{Bucket, QuantileHistogram};
use fluxmeter_core::labels::LabelSet;

/// Identity of one metric instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricKey {
    pub name: String,
    pub labels: LabelSet,
}

impl MetricKey {
    pub fn new(name: impl Into<String>, labels: LabelSet) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }
}

/// `f64` stored as bits in an `AtomicU64`; all operations are `SeqCst`.
#[derive(Debug, Default)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(v: f64) -> Self {
        Self(AtomicU64::new(v.to_bits()))
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::SeqCst))
    }

    pub fn store(&self, v: f64) {
        self.0.store(v.to_bits(), Ordering::SeqCst);
    }

    /// Add `delta` with a CAS loop; returns the previous value.
    pub fn fetch_add(&self, delta: f64) -> f64 {
        let prev = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |bits| {
                Some((f64::from_bits(bits) + delta).to_bits())
            })
            .unwrap_or_else(|bits| bits);
        f64::from_bits(prev)
    }
}

/// Point-in-time copy of every instance, sorted by key.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub counters: Vec<(MetricKey, f64)>,
    pub gauges: Vec<(MetricKey, f64)>,
    pub histograms: Vec<(MetricKey, Vec<Bucket>)>,
}

pub struct Registry {
    counters: DashMap<MetricKey, Arc<AtomicF64>>,
    gauges: DashMap<MetricKey, Arc<AtomicF64>>,
    histograms: DashMap<MetricKey, Arc<QuantileHistogram>>,
    histogram_buckets: usize,
}

impl Registry {
    pub fn new(histogram_buckets: usize) -> Self {
        Self {
            counters: DashMap::new(),
            gauges: DashMap::new(),
            histograms: DashMap::new(),
            histogram_buckets,
        }
    }

    pub fn histogram_buckets(&self) -> usize {
        self.histogram_buckets
    }

    /// Get or create the counter cell for `key`.
    pub fn counter(&self, key: &MetricKey) -> Arc<AtomicF64> {
        get_or_insert(&self.counters, key, AtomicF64::default)
    }

    /// Get or create the gauge cell for `key`.
    pub fn gauge(&self, key: &MetricKey) -> Arc<AtomicF64> {
        get_or_insert(&self.gauges, key, AtomicF64::default)
    }

    /// Get or create the histogram for `key`.
    pub fn histogram(&self, key: &MetricKey) -> Arc<QuantileHistogram> {
        let buckets = self.histogram_buckets;
        get_or_insert(&self.histograms, key, || QuantileHistogram::new(buckets))
    }

    /// Number of live instances across all kinds.
    pub fn len(&self) -> usize {
        self.counters.len() + self.gauges.len() + self.histograms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read every instance. Updates racing with the walk may or may not be included.
    pub fn snapshot(&self) -> Snapshot {
        let mut counters: Vec<_> = self
            .counters
            .iter()
            .map(|r| (r.key().clone(), r.value().load()))
            .collect();
        let mut gauges: Vec<_> = self
            .gauges
            .iter()
            .map(|r| (r.key().clone(), r.value().load()))
            .collect();
        let mut histograms: Vec<_> = self
            .histograms
            .iter()
            .map(|r| (r.key().clone(), r.value().buckets()))
            .collect();

        counters.sort_by(|a, b| a.0.cmp(&b.0));
        gauges.sort_by(|a, b| a.0.cmp(&b.0));
        histograms.sort_by(|a, b| a.0.cmp(&b.0));

        Snapshot {
            counters,
            gauges,
            histograms,
        }
    }
}

fn get_or_insert<T>(
    map: &DashMap<MetricKey, Arc<T>>,
    key: &MetricKey,
    init: impl FnOnce() -> T,
) -> Arc<T> {
    // Read-lock fast path; the hot case is an existing instance.
    if let Some(existing) = map.get(key) {
        return Arc::clone(existing.value());
    }
    let entry = map
        .entry(key.clone())
        .or_insert_with(|| Arc::new(init()));
    Arc::clone(entry.value())
}
