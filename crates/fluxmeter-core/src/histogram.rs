//! Streaming approximate-quantile histogram.
//!
//! Keeps at most `capacity` weighted buckets sorted by representative value.
//! Each observation is inserted as its own bucket; once the bucket count
//! exceeds capacity, the two adjacent buckets with the closest representative
//! values are merged into their weighted mean. Memory stays O(capacity) for an
//! unbounded stream, and the error of a quantile estimate is bounded by the
//! local bucket spacing.
//!
//! Quantiles interpolate linearly between bucket centers on the cumulative
//! weight axis, so `quantile(0.0)` is the smallest representative value and
//! `quantile(1.0)` the largest.

use std::sync::{Mutex, MutexGuard};

/// Bucket count used when none is configured.
pub const DEFAULT_BUCKETS: usize = 50;

const MIN_BUCKETS: usize = 2;

/// One weighted summary of a cluster of observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    /// Representative (mean) value of the observations merged into this bucket.
    pub value: f64,
    /// Number of observations summarized.
    pub weight: u64,
}

/// Bounded-memory quantile sketch, safe to share across threads.
#[derive(Debug)]
pub struct QuantileHistogram {
    capacity: usize,
    buckets: Mutex<Vec<Bucket>>,
}

impl Default for QuantileHistogram {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKETS)
    }
}

impl QuantileHistogram {
    /// Create an empty histogram holding at most `capacity` buckets (minimum 2).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_BUCKETS);
        Self {
            capacity,
            buckets: Mutex::new(Vec::with_capacity(capacity + 1)),
        }
    }

    /// Rebuild a histogram from exported bucket summaries.
    pub fn from_buckets(capacity: usize, buckets: &[Bucket]) -> Self {
        let h = Self::new(capacity);
        for b in buckets {
            h.observe_weighted(b.value, b.weight);
        }
        h
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record one observation. Non-finite values are dropped.
    pub fn observe(&self, value: f64) {
        self.observe_weighted(value, 1);
    }

    /// Record `weight` observations of `value`. Non-finite values and zero
    /// weights are dropped.
    pub fn observe_weighted(&self, value: f64, weight: u64) {
        if !value.is_finite() {
            tracing::trace!(value, "dropping non-finite histogram sample");
            return;
        }
        if weight == 0 {
            return;
        }

        let mut buckets = self.lock();
        insert_sorted(&mut buckets, Bucket { value, weight });
        while buckets.len() > self.capacity {
            merge_closest(&mut buckets);
        }
    }

    /// Estimate the `q` quantile. `q` is clamped to `[0, 1]` (NaN reads as 0).
    /// Returns `None` when nothing has been observed.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        quantile_of(&self.lock(), q)
    }

    /// Total number of observations recorded.
    pub fn count(&self) -> u64 {
        self.lock().iter().map(|b| b.weight).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current buckets, sorted by representative value.
    pub fn buckets(&self) -> Vec<Bucket> {
        self.lock().clone()
    }

    // A panic while holding the lock cannot leave the bucket vector unsorted
    // (every mutation is a single insert or merge), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Vec<Bucket>> {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn insert_sorted(buckets: &mut Vec<Bucket>, b: Bucket) {
    let pos = buckets.partition_point(|x| x.value < b.value);
    match buckets.get_mut(pos) {
        Some(existing) if existing.value == b.value => {
            existing.weight = existing.weight.saturating_add(b.weight);
        }
        _ => buckets.insert(pos, b),
    }
}

fn merge_closest(buckets: &mut Vec<Bucket>) {
    let Some(i) = buckets
        .windows(2)
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            let da = a[1].value - a[0].value;
            let db = b[1].value - b[0].value;
            da.total_cmp(&db)
        })
        .map(|(i, _)| i)
    else {
        return;
    };

    let right = buckets.remove(i + 1);
    let left = &mut buckets[i];
    let total = left.weight.saturating_add(right.weight);
    let share = right.weight as f64 / total as f64;
    left.value += (right.value - left.value) * share;
    left.weight = total;
}

fn quantile_of(buckets: &[Bucket], q: f64) -> Option<f64> {
    let last = buckets.last()?;
    let q = if q.is_nan() { 0.0 } else { q.clamp(0.0, 1.0) };
    let total: f64 = buckets.iter().map(|b| b.weight as f64).sum();
    let target = q * total;

    let mut cumulative = 0.0;
    let mut prev: Option<(f64, f64)> = None;
    for b in buckets {
        let center = cumulative + b.weight as f64 / 2.0;
        if target <= center {
            return Some(match prev {
                None => b.value,
                Some((prev_center, prev_value)) => {
                    let frac = (target - prev_center) / (center - prev_center);
                    prev_value + (b.value - prev_value) * frac
                }
            });
        }
        prev = Some((center, b.value));
        cumulative += b.weight as f64;
    }
    Some(last.value)
}
