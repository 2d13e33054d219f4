//! Gap-filled signal wrapper.

use crate::error::WaveletError;

/// A finite-valued signal ready for decomposition.
///
/// Telemetry channels mark missing samples with NaN. A `TimeSeries` either
/// rejects them ([`TimeSeries::new`]) or replaces them with the mean of the
/// present samples ([`TimeSeries::mean_filled`]) while remembering where the
/// gaps were, so callers can restore them after reconstruction.
#[derive(Clone, Debug)]
pub struct TimeSeries {
    data: Vec<f64>,
    missing: Vec<bool>,
}

impl TimeSeries {
    /// Creates a `TimeSeries` from fully finite data.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`WaveletError::SeriesTooShort`] | `data.len() < 2` |
    /// | [`WaveletError::NonFiniteData`] | any element is NaN or infinite |
    pub fn new(data: Vec<f64>) -> Result<Self, WaveletError> {
        check_len(data.len())?;
        if !data.iter().all(|v| v.is_finite()) {
            return Err(WaveletError::NonFiniteData);
        }
        let missing = vec![false; data.len()];
        Ok(Self { data, missing })
    }

    /// Creates a `TimeSeries` by filling NaN samples with the mean of the
    /// remaining samples.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`WaveletError::SeriesTooShort`] | `values.len() < 2` |
    /// | [`WaveletError::AllMissing`] | every sample is NaN |
    /// | [`WaveletError::NonFiniteData`] | a sample is infinite |
    pub fn mean_filled(values: &[f64]) -> Result<Self, WaveletError> {
        check_len(values.len())?;
        if values.iter().any(|v| v.is_infinite()) {
            return Err(WaveletError::NonFiniteData);
        }
        let fill = telemine_stats::nan_mean(values)
            .ok_or(WaveletError::AllMissing { len: values.len() })?;
        let missing: Vec<bool> = values.iter().map(|v| v.is_nan()).collect();
        let data = values
            .iter()
            .map(|&v| if v.is_nan() { fill } else { v })
            .collect();
        Ok(Self { data, missing })
    }

    /// Returns the (filled) samples as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the series is empty. A valid series never is.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of samples that were filled.
    pub fn n_filled(&self) -> usize {
        self.missing.iter().filter(|&&m| m).count()
    }

    /// Writes NaN back into `values` wherever the source sample was missing.
    ///
    /// `values` must have the same length as the series; extra entries are
    /// left untouched.
    pub fn restore_missing(&self, values: &mut [f64]) {
        for (v, &missing) in values.iter_mut().zip(&self.missing) {
            if missing {
                *v = f64::NAN;
            }
        }
    }
}

impl AsRef<[f64]> for TimeSeries {
    fn as_ref(&self) -> &[f64] {
        &self.data
    }
}

fn check_len(len: usize) -> Result<(), WaveletError> {
    if len < 2 {
        return Err(WaveletError::SeriesTooShort { len, min: 2 });
    }
    Ok(())
}
