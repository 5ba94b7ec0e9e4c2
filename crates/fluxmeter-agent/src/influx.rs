//! The metrics facade: base tags, batch settings, registry, and export.
//!
//! Export layout per instance:
//! - counter: one point, field `count`
//! - gauge: one point, field `value`
//! - histogram: one point per sketch bucket, fields `value` (representative)
//!   and `count` (bucket weight); empty histograms export nothing.
//!
//! Instances whose value is no longer finite (a counter that overflowed)
//! are left out. Instance labels with an empty key or value, or a reserved
//! key, are left off the exported tags; base tags are rejected up front.
//!
//! Replaying the exported `(value, count)` pairs into a sketch of the same
//! capacity reproduces the in-process quantiles.

use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use fluxmeter_core::error::{MetricsError, Result};
use fluxmeter_core::histogram::DEFAULT_BUCKETS;
use fluxmeter_core::labels::LabelSet;
use fluxmeter_core::protocol::{BatchConfig, BatchPoints, Point, RESERVED_TAG_KEYS};

use crate::export::BatchWriter;
use crate::metrics::{Counter, Gauge, Histogram, MetricKey, Registry};

/// Field carrying a counter total or a histogram bucket weight.
pub const FIELD_COUNT: &str = "count";
/// Field carrying a gauge value or a histogram bucket representative.
pub const FIELD_VALUE: &str = "value";

pub struct Influx {
    tags: LabelSet,
    conf: BatchConfig,
    registry: Arc<Registry>,
    export_lock: Mutex<()>,
}

impl Influx {
    /// Build a facade with the default histogram capacity.
    pub fn new<I, K, V>(tags: I, conf: BatchConfig) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::with_histogram_buckets(tags, conf, DEFAULT_BUCKETS)
    }

    /// Build a facade whose histograms keep at most `buckets` buckets.
    pub fn with_histogram_buckets<I, K, V>(tags: I, conf: BatchConfig, buckets: usize) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let tags = LabelSet::from_pairs(tags);
        validate_tags(&tags)?;
        conf.validate()?;
        Ok(Self {
            tags,
            conf,
            registry: Arc::new(Registry::new(buckets)),
            export_lock: Mutex::new(()),
        })
    }

    pub fn tags(&self) -> &LabelSet {
        &self.tags
    }

    pub fn batch_config(&self) -> &BatchConfig {
        &self.conf
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn new_counter(&self, name: &str) -> Counter {
        Counter::new(Arc::clone(&self.registry), MetricKey::new(name, LabelSet::new()))
    }

    pub fn new_gauge(&self, name: &str) -> Gauge {
        Gauge::new(Arc::clone(&self.registry), MetricKey::new(name, LabelSet::new()))
    }

    pub fn new_histogram(&self, name: &str) -> Histogram {
        Histogram::new(Arc::clone(&self.registry), MetricKey::new(name, LabelSet::new()))
    }

    /// Convert every instance into points stamped with the current time.
    pub fn snapshot(&self) -> BatchPoints {
        self.snapshot_at(SystemTime::now())
    }

    /// Convert every instance into points stamped with `now`.
    pub fn snapshot_at(&self, now: SystemTime) -> BatchPoints {
        let snap = self.registry.snapshot();
        let mut bp = BatchPoints::new(self.conf.clone());

        for (key, v) in snap.counters {
            bp.add_point(self.point(&key, vec![(FIELD_COUNT.into(), v)], now));
        }
        for (key, v) in snap.gauges {
            bp.add_point(self.point(&key, vec![(FIELD_VALUE.into(), v)], now));
        }
        for (key, buckets) in snap.histograms {
            bp.add_points(buckets.into_iter().map(|b| {
                self.point(
                    &key,
                    vec![
                        (FIELD_VALUE.into(), b.value),
                        (FIELD_COUNT.into(), b.weight as f64),
                    ],
                    now,
                )
            }));
        }
        bp
    }

    fn point(&self, key: &MetricKey, fields: Vec<(String, f64)>, now: SystemTime) -> Point {
        Point::new(&key.name, &self.tags, &key.labels, fields, now)
    }

    /// Snapshot and hand the batch to `w` in one call. Exports are serialized;
    /// the sink's error is returned unchanged. Returns the number of lines written.
    pub fn write_to(&self, w: &dyn BatchWriter) -> Result<usize> {
        let _guard = self
            .export_lock
            .lock()
            .map_err(|_| MetricsError::Internal("export lock poisoned".into()))?;
        let bp = self.snapshot();
        w.write(&bp)?;
        Ok(bp.len())
    }
}

/// Base tags must have non-empty keys and values and must not use reserved keys.
pub fn validate_tags(tags: &LabelSet) -> Result<()> {
    for (k, v) in tags.iter() {
        if k.is_empty() {
            return Err(MetricsError::InvalidTag {
                key: k.to_string(),
                reason: "key must not be empty",
            });
        }
        if v.is_empty() {
            return Err(MetricsError::InvalidTag {
                key: k.to_string(),
                reason: "value must not be empty",
            });
        }
        if RESERVED_TAG_KEYS.contains(&k) {
            return Err(MetricsError::InvalidTag {
                key: k.to_string(),
                reason: "key is reserved",
            });
        }
    }
    Ok(())
}
