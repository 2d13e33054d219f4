//! Statistical helper functions shared by the telemine crates.
//!
//! All helpers operate on plain `&[f64]` slices. Functions with a `nan_`
//! prefix skip NaN entries, which the telemetry model uses to mark missing
//! samples.

use std::cmp::Ordering;

/// Arithmetic mean of a slice. Returns 0.0 if empty.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let sum: f64 = data.iter().sum();
    sum / data.len() as f64
}

/// Mean of the non-NaN entries. Returns `None` when every entry is NaN
/// (or the slice is empty).
pub fn nan_mean(data: &[f64]) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &x in data.iter().filter(|x| !x.is_nan()) {
        sum += x;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Sample variance with N-1 denominator.
/// Returns 0.0 if fewer than 2 elements.
pub fn variance(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let mean = data.iter().sum::<f64>() / nf;
    data.iter().map(|&x| (x - mean) * (x - mean)).sum::<f64>() / (nf - 1.0)
}

/// Sample standard deviation with N-1 denominator.
/// Returns 0.0 if fewer than 2 elements.
pub fn sd(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Median of pre-sorted data. For even length, averages the middle two values.
///
/// # Panics
///
/// Panics if `sorted` is empty.
pub fn median(sorted: &[f64]) -> f64 {
    assert!(!sorted.is_empty(), "median: input must not be empty");
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Median of the absolute values of `data`. Returns 0.0 if empty.
///
/// This is the robust noise statistic used for wavelet shrinkage: applied to
/// finest-scale detail coefficients (which are centred on zero) it estimates
/// the median absolute deviation without re-centring.
pub fn median_abs(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut abs: Vec<f64> = data.iter().map(|x| x.abs()).collect();
    abs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    median(&abs)
}
