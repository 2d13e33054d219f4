//! Wavelet shrinkage denoising with the universal threshold.

use tracing::debug;

use crate::dwt::{DwtConfig, wavedec, waverec};
use crate::error::WaveletError;
use crate::series::TimeSeries;

/// Scale factor relating the median absolute deviation to the standard
/// deviation of Gaussian noise.
const MAD_SCALE: f64 = 0.6745;

/// Soft thresholding: shrinks `x` towards zero by `t`.
///
/// Returns `sign(x) * max(|x| - t, 0)`.
pub fn soft_threshold(x: f64, t: f64) -> f64 {
    let shrunk = x.abs() - t;
    if shrunk > 0.0 { x.signum() * shrunk } else { 0.0 }
}

/// Robust noise estimate from the finest-scale detail coefficients:
/// `median(|d|) / 0.6745`.
pub fn noise_sigma(finest_detail: &[f64]) -> f64 {
    telemine_stats::median_abs(finest_detail) / MAD_SCALE
}

/// Universal (VisuShrink) threshold `sigma * sqrt(2 ln n)`.
///
/// Returns 0.0 for `n < 2`.
pub fn universal_threshold(sigma: f64, n: usize) -> f64 {
    if n < 2 {
        return 0.0;
    }
    sigma * (2.0 * (n as f64).ln()).sqrt()
}

/// Denoises a signal by soft-thresholding every detail level.
///
/// The noise level is estimated from the finest detail set. Approximation
/// coefficients are kept unchanged. Samples that were missing in `series`
/// are NaN again in the output, which has the same length as the input.
///
/// # Errors
///
/// Propagates level resolution and reconstruction errors from the DWT.
#[tracing::instrument(skip_all, fields(len = series.len(), filter = ?config.filter()))]
pub fn denoise(series: &TimeSeries, config: &DwtConfig) -> Result<Vec<f64>, WaveletError> {
    let n = series.len();
    let level = config.resolve_level(n)?;
    let mut coeffs = wavedec(series, config.filter(), level)?;

    let sigma = coeffs.detail(0).map(noise_sigma).unwrap_or(0.0);
    let threshold = universal_threshold(sigma, n);
    debug!(level, sigma, threshold, "soft-thresholding detail coefficients");
    coeffs.map_details(|c| soft_threshold(c, threshold));

    let mut out = waverec(&coeffs)?;
    series.restore_missing(&mut out);
    Ok(out)
}
