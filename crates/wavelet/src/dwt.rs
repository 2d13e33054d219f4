//! Decimated multi-level Discrete Wavelet Transform (DWT).
//!
//! Signals are extended with half-sample symmetric padding, so each level
//! produces `floor((n + L - 1) / 2)` coefficients and the inverse may yield
//! one sample more than the original length. [`waverec`] trims that sample.

use tracing::warn;

use crate::error::WaveletError;
use crate::filter::WaveletFilter;
use crate::series::TimeSeries;

/// Computes the maximum useful DWT decomposition level for a given series
/// length and filter: `floor(log2(n / (L - 1)))`, or 0 when the series is
/// shorter than `L - 1`.
///
/// # Example
///
/// ```ignore
/// use telemine_wavelet::{WaveletFilter, max_dwt_level};
///
/// assert_eq!(max_dwt_level(1000, &WaveletFilter::D8), 7);
/// ```
pub fn max_dwt_level(n: usize, filter: &WaveletFilter) -> usize {
    let l = filter.length();
    if l < 2 || n < l - 1 {
        return 0;
    }
    let ratio = n as f64 / (l - 1) as f64;
    ratio.log2().floor() as usize
}

/// Configuration for a multi-level decomposition.
///
/// When `level` is `None` the maximum level supported by the series length
/// is used. An explicit level above that maximum is capped (with a warning)
/// by [`DwtConfig::resolve_level`].
///
/// # Example
///
/// ```ignore
/// use telemine_wavelet::{DwtConfig, WaveletFilter};
///
/// let config = DwtConfig::new(WaveletFilter::D8).with_level(4);
/// assert_eq!(config.level(), Some(4));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DwtConfig {
    filter: WaveletFilter,
    level: Option<usize>,
}

impl Default for DwtConfig {
    /// Defaults: 8-tap Daubechies filter, four levels.
    fn default() -> Self {
        Self {
            filter: WaveletFilter::D8,
            level: Some(4),
        }
    }
}

impl DwtConfig {
    /// Creates a configuration using the maximal supported level.
    pub fn new(filter: WaveletFilter) -> Self {
        Self {
            filter,
            level: None,
        }
    }

    /// Sets the decomposition level explicitly.
    pub fn with_level(mut self, level: usize) -> Self {
        self.level = Some(level);
        self
    }

    /// Clears the explicit level so the maximal level is used.
    pub fn with_max_level(mut self) -> Self {
        self.level = None;
        self
    }

    /// Returns the wavelet filter.
    pub fn filter(&self) -> WaveletFilter {
        self.filter
    }

    /// Returns the explicit level, if set.
    pub fn level(&self) -> Option<usize> {
        self.level
    }

    /// Resolves the effective level for a series of length `n`.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`WaveletError::SeriesTooShort`] | `n` does not support a single level |
    /// | [`WaveletError::LevelOutOfRange`] | an explicit level of 0 |
    pub fn resolve_level(&self, n: usize) -> Result<usize, WaveletError> {
        let max = max_dwt_level(n, &self.filter);
        if max == 0 {
            return Err(WaveletError::SeriesTooShort {
                len: n,
                min: 2 * (self.filter.length() - 1),
            });
        }
        match self.level {
            None => Ok(max),
            Some(0) => Err(WaveletError::LevelOutOfRange {
                requested: 0,
                max,
                len: n,
            }),
            Some(level) if level > max => {
                warn!(
                    requested = level,
                    max,
                    series_len = n,
                    filter = ?self.filter,
                    "decomposition level capped to the maximum supported by the series length"
                );
                Ok(max)
            }
            Some(level) => Ok(level),
        }
    }
}

/// Multi-level DWT coefficients.
///
/// Detail sets are ordered finest first: `detail(0)` is level 1.
#[derive(Clone, Debug)]
pub struct DwtCoeffs {
    approx: Vec<f64>,
    details: Vec<Vec<f64>>,
    filter: WaveletFilter,
    series_len: usize,
}

impl DwtCoeffs {
    pub(crate) fn new(
        approx: Vec<f64>,
        details: Vec<Vec<f64>>,
        filter: WaveletFilter,
        series_len: usize,
    ) -> Self {
        Self {
            approx,
            details,
            filter,
            series_len,
        }
    }

    /// Returns the number of decomposition levels.
    pub fn n_levels(&self) -> usize {
        self.details.len()
    }

    /// Returns the coarsest approximation coefficients.
    pub fn approx(&self) -> &[f64] {
        &self.approx
    }

    /// Returns the detail coefficients at the given 0-indexed level
    /// (0 = finest).
    pub fn detail(&self, level: usize) -> Option<&[f64]> {
        self.details.get(level).map(|v| v.as_slice())
    }

    /// Returns an iterator over the detail sets, finest first.
    pub fn details(&self) -> impl Iterator<Item = &[f64]> {
        self.details.iter().map(|v| v.as_slice())
    }

    /// Applies `f` to every detail coefficient in place. The approximation
    /// coefficients are left untouched.
    pub fn map_details(&mut self, mut f: impl FnMut(f64) -> f64) {
        for set in &mut self.details {
            for c in set.iter_mut() {
                *c = f(*c);
            }
        }
    }

    /// Returns the length of the decomposed series.
    pub fn series_len(&self) -> usize {
        self.series_len
    }

    /// Returns the wavelet filter used.
    pub fn filter(&self) -> WaveletFilter {
        self.filter
    }
}

/// Decomposes `series` into `level` detail sets plus an approximation.
///
/// # Errors
///
/// Returns [`WaveletError::LevelOutOfRange`] if `level` is 0 or exceeds
/// [`max_dwt_level`].
pub fn wavedec(
    series: &TimeSeries,
    filter: WaveletFilter,
    level: usize,
) -> Result<DwtCoeffs, WaveletError> {
    let n = series.len();
    let max = max_dwt_level(n, &filter);
    if level == 0 || level > max {
        return Err(WaveletError::LevelOutOfRange {
            requested: level,
            max,
            len: n,
        });
    }

    let dec_lo = filter.dec_lo();
    let dec_hi = filter.dec_hi();
    let mut approx = series.as_slice().to_vec();
    let mut details = Vec::with_capacity(level);
    for _ in 0..level {
        let (a, d) = dwt_step(&approx, &dec_lo, &dec_hi);
        details.push(d);
        approx = a;
    }

    Ok(DwtCoeffs::new(approx, details, filter, n))
}

/// Reconstructs a signal from DWT coefficients and trims it to the original
/// series length.
///
/// # Errors
///
/// Returns [`WaveletError::ReconstructionFailed`] if adjacent coefficient
/// sets have inconsistent lengths.
pub fn waverec(coeffs: &DwtCoeffs) -> Result<Vec<f64>, WaveletError> {
    let rec_lo = coeffs.filter.scaling_coeffs();
    let rec_hi = coeffs.filter.wavelet_coeffs();

    let mut approx = coeffs.approx.clone();
    for (idx, detail) in coeffs.details.iter().enumerate().rev() {
        if approx.len() == detail.len() + 1 {
            approx.pop();
        }
        if approx.len() != detail.len() {
            return Err(WaveletError::ReconstructionFailed(format!(
                "level {}: approximation has {} coefficients, detail has {}",
                idx + 1,
                approx.len(),
                detail.len()
            )));
        }
        approx = idwt_step(&approx, detail, rec_lo, &rec_hi);
    }

    if approx.len() < coeffs.series_len {
        return Err(WaveletError::ReconstructionFailed(format!(
            "reconstructed {} samples, expected {}",
            approx.len(),
            coeffs.series_len
        )));
    }
    approx.truncate(coeffs.series_len);
    Ok(approx)
}

/// Index into a half-sample symmetric extension of a length-`n` signal.
fn symmetric_index(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period) as usize;
    if m < n { m } else { 2 * n - 1 - m }
}

/// One analysis step: filter with both decomposition filters and keep
/// every second output.
fn dwt_step(x: &[f64], dec_lo: &[f64], dec_hi: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = x.len();
    let l = dec_lo.len();
    let out_len = (n + l - 1) / 2;
    let mut approx = Vec::with_capacity(out_len);
    let mut detail = Vec::with_capacity(out_len);
    for k in 0..out_len {
        let centre = (2 * k + 1) as isize;
        let mut a = 0.0;
        let mut d = 0.0;
        for j in 0..l {
            let sample = x[symmetric_index(centre - j as isize, n)];
            a += dec_lo[j] * sample;
            d += dec_hi[j] * sample;
        }
        approx.push(a);
        detail.push(d);
    }
    (approx, detail)
}

/// One synthesis step: upsample both coefficient sets, filter with the
/// reconstruction filters and keep the fully supported region.
fn idwt_step(approx: &[f64], detail: &[f64], rec_lo: &[f64], rec_hi: &[f64]) -> Vec<f64> {
    let m = approx.len();
    let l = rec_lo.len();
    let out_len = (2 * m + 2).saturating_sub(l);
    let mut out = vec![0.0; out_len];
    for k in 0..m {
        for j in 0..l {
            // Output index n = 2k + j - (L - 2).
            let idx = (2 * k + j) as isize - (l as isize - 2);
            if idx >= 0 && (idx as usize) < out_len {
                out[idx as usize] += approx[k] * rec_lo[j] + detail[k] * rec_hi[j];
            }
        }
    }
    out
}
