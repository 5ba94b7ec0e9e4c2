//! Quantile accuracy against known distributions.
//!
//! Sample streams are deterministic: uniform values are a stride permutation of
//! `0..n`, normal values are stratified inverse-CDF draws in permuted order.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use fluxmeter_core::QuantileHistogram;

const MEAN: f64 = 500.0;
const STDEV: f64 = 25.0;
const QUANTILES: [(f64, f64); 4] = [(0.50, 0.0), (0.90, 1.2816), (0.95, 1.6449), (0.99, 2.3263)];

/// Inverse standard normal CDF (Acklam's rational approximation).
fn probit(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };
    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

fn normal_samples(n: u32) -> impl Iterator<Item = f64> {
    (0..n).map(move |i| {
        let j = (i * 7) % n;
        MEAN + STDEV * probit((f64::from(j) + 0.5) / f64::from(n))
    })
}

#[test]
fn normal_quantiles_within_one_percent() {
    let h = QuantileHistogram::new(50);
    for v in normal_samples(1234) {
        h.observe(v);
    }
    let tolerance = 0.01 * MEAN;
    for (q, z) in QUANTILES {
        let want = MEAN + z * STDEV;
        let have = h.quantile(q).unwrap();
        assert!(
            (want - have).abs() <= tolerance,
            "q={q}: want {want}, have {have}"
        );
    }
}

#[test]
fn uniform_quantiles_within_one_percent() {
    let n = 10_000u32;
    let h = QuantileHistogram::new(50);
    for i in 0..n {
        h.observe(f64::from((i * 7_919) % n));
    }
    let scale = f64::from(n);
    for (q, _) in QUANTILES {
        let want = q * (scale - 1.0);
        let have = h.quantile(q).unwrap();
        assert!(
            (want - have).abs() <= 0.01 * scale,
            "q={q}: want {want}, have {have}"
        );
    }
}

#[test]
fn sorted_input_is_as_accurate_as_shuffled() {
    let n = 10_000u32;
    let h = QuantileHistogram::new(50);
    for i in 0..n {
        h.observe(f64::from(i));
    }
    for (q, _) in QUANTILES {
        let want = q * f64::from(n - 1);
        let have = h.quantile(q).unwrap();
        assert!((want - have).abs() <= 0.01 * f64::from(n), "q={q}");
    }
}

#[test]
fn fewer_samples_than_buckets_are_kept_exactly() {
    let h = QuantileHistogram::new(50);
    for v in [3.0, 1.0, 2.0] {
        h.observe(v);
    }
    let values: Vec<_> = h.buckets().iter().map(|b| b.value).collect();
    assert_eq!(values, vec![1.0, 2.0, 3.0]);
    assert_eq!(h.quantile(0.5), Some(2.0));
}
