//! Counter, gauge and histogram handles.
//!
//! `with` takes a flat `[k1, v1, k2, v2, ...]` list; an odd trailing key is
//! paired with `"unknown"`. Non-finite inputs to `add`/`set`/`observe` are
//! dropped.
//!
//! A handle resolves its registry instance on first use, so handles that are
//! created but never touched do not show up in exports.

use std::sync::{Arc, OnceLock};

use fluxmeter_core::histogram::QuantileHistogram;
use fluxmeter_core::labels::LabelSet;

use super::registry::{AtomicF64, MetricKey, Registry};

/// Monotone accumulator exported as field `count`.
#[derive(Clone)]
pub struct Counter {
    registry: Arc<Registry>,
    key: MetricKey,
    cell: OnceLock<Arc<AtomicF64>>,
}

impl Counter {
    pub(crate) fn new(registry: Arc<Registry>, key: MetricKey) -> Self {
        Self {
            registry,
            key,
            cell: OnceLock::new(),
        }
    }

    fn cell(&self) -> &AtomicF64 {
        self.cell.get_or_init(|| self.registry.counter(&self.key))
    }

    /// Derive a handle for the same name with extra labels.
    pub fn with(&self, label_values: &[&str]) -> Self {
        let key = MetricKey::new(self.key.name.clone(), self.key.labels.with_flat(label_values));
        Self::new(Arc::clone(&self.registry), key)
    }

    pub fn add(&self, delta: f64) {
        if !delta.is_finite() {
            tracing::trace!(metric = %self.key.name, delta, "dropping non-finite counter delta");
            return;
        }
        self.cell().fetch_add(delta);
    }

    pub fn value(&self) -> f64 {
        self.cell().load()
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn labels(&self) -> &LabelSet {
        &self.key.labels
    }
}

/// Last-value metric exported as field `value`.
#[derive(Clone)]
pub struct Gauge {
    registry: Arc<Registry>,
    key: MetricKey,
    cell: OnceLock<Arc<AtomicF64>>,
}

impl Gauge {
    pub(crate) fn new(registry: Arc<Registry>, key: MetricKey) -> Self {
        Self {
            registry,
            key,
            cell: OnceLock::new(),
        }
    }

    fn cell(&self) -> &AtomicF64 {
        self.cell.get_or_init(|| self.registry.gauge(&self.key))
    }

    /// Derive a handle for the same name with extra labels.
    pub fn with(&self, label_values: &[&str]) -> Self {
        let key = MetricKey::new(self.key.name.clone(), self.key.labels.with_flat(label_values));
        Self::new(Arc::clone(&self.registry), key)
    }

    pub fn set(&self, value: f64) {
        if !value.is_finite() {
            tracing::trace!(metric = %self.key.name, value, "dropping non-finite gauge value");
            return;
        }
        self.cell().store(value);
    }

    /// Adjust relative to the current value.
    pub fn add(&self, delta: f64) {
        if !delta.is_finite() {
            tracing::trace!(metric = %self.key.name, delta, "dropping non-finite gauge delta");
            return;
        }
        self.cell().fetch_add(delta);
    }

    pub fn value(&self) -> f64 {
        self.cell().load()
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn labels(&self) -> &LabelSet {
        &self.key.labels
    }
}

/// Distribution metric backed by a bounded quantile sketch.
#[derive(Clone)]
pub struct Histogram {
    registry: Arc<Registry>,
    key: MetricKey,
    sketch: OnceLock<Arc<QuantileHistogram>>,
}

impl Histogram {
    pub(crate) fn new(registry: Arc<Registry>, key: MetricKey) -> Self {
        Self {
            registry,
            key,
            sketch: OnceLock::new(),
        }
    }

    fn sketch(&self) -> &QuantileHistogram {
        self.sketch.get_or_init(|| self.registry.histogram(&self.key))
    }

    /// Derive a handle for the same name with extra labels.
    pub fn with(&self, label_values: &[&str]) -> Self {
        let key = MetricKey::new(self.key.name.clone(), self.key.labels.with_flat(label_values));
        Self::new(Arc::clone(&self.registry), key)
    }

    pub fn observe(&self, value: f64) {
        self.sketch().observe(value);
    }

    /// In-process quantile estimate; `None` before the first observation.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        self.sketch().quantile(q)
    }

    pub fn count(&self) -> u64 {
        self.sketch().count()
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn labels(&self) -> &LabelSet {
        &self.key.labels
    }
}
