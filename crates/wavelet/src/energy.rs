//! Multi-scale detail energy and energy change points.
//!
//! Every detail level is mapped back onto the sample grid, squared and
//! smoothed with a sliding mean. The per-level curves are summed into one
//! energy series of the same length as the input. Bursts of high-frequency
//! content (steps, spikes, oscillations) show up as peaks.

use tracing::debug;

use crate::dwt::{DwtConfig, wavedec};
use crate::error::WaveletError;
use crate::series::TimeSeries;

/// Default sensitivity of [`change_points`]: energies more than this many
/// standard deviations above the mean are flagged.
pub const DEFAULT_THRESHOLD_SIGMA: f64 = 3.0;

/// Computes the summed detail energy of `series`.
///
/// `window` is the sliding-mean width in samples and defaults to
/// `2^level`. It is clamped to the series length.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`WaveletError::ZeroWindow`] | `window == Some(0)` |
/// | [`WaveletError::SeriesTooShort`] | series too short for one level |
#[tracing::instrument(skip_all, fields(len = series.len(), filter = ?config.filter()))]
pub fn detail_energy(
    series: &TimeSeries,
    config: &DwtConfig,
    window: Option<usize>,
) -> Result<Vec<f64>, WaveletError> {
    if window == Some(0) {
        return Err(WaveletError::ZeroWindow);
    }
    let n = series.len();
    let level = config.resolve_level(n)?;
    let coeffs = wavedec(series, config.filter(), level)?;
    let window = window.unwrap_or(1 << level).clamp(1, n);
    let filter_len = config.filter().length();
    debug!(level, window, "computing detail energy");

    let mut total = vec![0.0; n];
    for (idx, detail) in coeffs.details().enumerate() {
        let upsampled = upsample_aligned(detail, idx + 1, filter_len, n);
        let squared: Vec<f64> = upsampled.iter().map(|v| v * v).collect();
        let smoothed = sliding_mean_padded(&squared, window);
        for (t, e) in total.iter_mut().zip(smoothed) {
            *t += e;
        }
    }
    Ok(total)
}

/// Indices where `energy` rises above `mean + threshold_sigma * sd`.
///
/// Only the first sample of each run above the threshold is reported.
pub fn change_points(energy: &[f64], threshold_sigma: f64) -> Vec<usize> {
    if energy.is_empty() {
        return Vec::new();
    }
    let threshold = telemine_stats::mean(energy) + threshold_sigma * telemine_stats::sd(energy);
    let mut out = Vec::new();
    let mut prev = false;
    for (i, &e) in energy.iter().enumerate() {
        let above = e > threshold;
        if above && !prev {
            out.push(i);
        }
        prev = above;
    }
    out
}

/// Maps level-`level` detail coefficients onto `n` samples.
///
/// Each coefficient covers `2^level` samples. The mapping is shifted by
/// the group delay of the cascaded analysis filters,
/// `(L - 3) * (2^level - 1) / 2`, so features stay at their sample
/// position. Indices past either end repeat the edge coefficient.
fn upsample_aligned(detail: &[f64], level: usize, filter_len: usize, n: usize) -> Vec<f64> {
    if detail.is_empty() {
        return vec![0.0; n];
    }
    let scale = (1usize << level) as f64;
    let delay = (filter_len as f64 - 3.0) * (scale - 1.0) / 2.0;
    let last = detail.len() - 1;
    (0..n)
        .map(|t| {
            let k = ((t as f64 + delay + scale / 2.0) / scale).floor();
            let k = if k < 0.0 { 0 } else { (k as usize).min(last) };
            detail[k]
        })
        .collect()
}

/// Sliding mean of width `window`, edge-padded back to `values.len()`.
///
/// The valid region has `n - window + 1` entries; the missing
/// `window - 1` entries are split between both ends, the extra one going
/// to the right.
fn sliding_mean_padded(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let window = window.clamp(1, n);
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    let mut acc = 0.0;
    for &v in values {
        acc += v;
        prefix.push(acc);
    }
    let w = window as f64;
    let valid: Vec<f64> = (0..=n - window)
        .map(|i| (prefix[i + window] - prefix[i]) / w)
        .collect();

    let pad = n - valid.len();
    let left = pad / 2;
    let first = valid[0];
    let last = valid[valid.len() - 1];
    let mut out = Vec::with_capacity(n);
    out.extend(std::iter::repeat_n(first, left));
    out.extend_from_slice(&valid);
    out.extend(std::iter::repeat_n(last, pad - left));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::WaveletFilter;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sliding_mean_pads_to_length() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = sliding_mean_padded(&v, 2);
        // valid: 1.5 2.5 3.5 4.5; one pad sample on the right
        assert_eq!(out, vec![1.5, 2.5, 3.5, 4.5, 4.5]);
        let out = sliding_mean_padded(&v, 3);
        assert_eq!(out, vec![2.0, 2.0, 3.0, 4.0, 4.0]);
    }

    #[test]
    fn sliding_mean_window_one_is_identity() {
        let v = [3.0, 1.0, 4.0];
        assert_eq!(sliding_mean_padded(&v, 1), v.to_vec());
    }

    #[test]
    fn upsample_haar_has_no_delay() {
        let d = [1.0, 2.0, 3.0];
        // level 1, L = 2: delay = -0.5, k = floor((t + 0.5) / 2)
        let up = upsample_aligned(&d, 1, 2, 6);
        assert_eq!(up, vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn upsample_clamps_at_edges() {
        let d = [1.0, 2.0];
        let up = upsample_aligned(&d, 1, 8, 8);
        assert_eq!(up.len(), 8);
        assert_eq!(*up.last().unwrap(), 2.0);
    }

    #[test]
    fn energy_has_series_length() {
        let data: Vec<f64> = (0..300).map(|i| (i as f64 * 0.7).sin()).collect();
        let ts = TimeSeries::new(data).unwrap();
        let e = detail_energy(&ts, &DwtConfig::default(), None).unwrap();
        assert_eq!(e.len(), 300);
        assert!(e.iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn constant_signal_has_no_energy() {
        let ts = TimeSeries::new(vec![4.0; 256]).unwrap();
        let e = detail_energy(&ts, &DwtConfig::default(), Some(8)).unwrap();
        for v in e {
            assert_abs_diff_eq!(v, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn zero_window_rejected() {
        let ts = TimeSeries::new(vec![1.0; 64]).unwrap();
        assert!(matches!(
            detail_energy(&ts, &DwtConfig::new(WaveletFilter::Haar), Some(0)),
            Err(WaveletError::ZeroWindow)
        ));
    }

    #[test]
    fn oversized_window_clamped() {
        let data: Vec<f64> = (0..64).map(|i| i as f64 % 5.0).collect();
        let ts = TimeSeries::new(data).unwrap();
        let config = DwtConfig::new(WaveletFilter::Haar).with_level(2);
        let e = detail_energy(&ts, &config, Some(1000)).unwrap();
        assert_eq!(e.len(), 64);
        // A single full-width window yields a flat curve.
        assert!(e.iter().all(|&v| (v - e[0]).abs() < 1e-12));
    }

    #[test]
    fn change_points_report_rising_edges() {
        let mut e = vec![0.0; 100];
        for v in &mut e[40..45] {
            *v = 100.0;
        }
        for v in &mut e[70..72] {
            *v = 100.0;
        }
        assert_eq!(change_points(&e, 1.0), vec![40, 70]);
    }

    #[test]
    fn change_points_flat_energy() {
        assert!(change_points(&[2.0; 50], DEFAULT_THRESHOLD_SIGMA).is_empty());
        assert!(change_points(&[], DEFAULT_THRESHOLD_SIGMA).is_empty());
    }
}
