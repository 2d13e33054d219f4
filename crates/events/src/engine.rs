//! Wavelet denoising and energy change-point detection over a telemetry
//! table.

use tracing::{debug, warn};

use telemine_wavelet::{
    DwtConfig, TimeSeries, WaveletError, WaveletFilter, change_points, denoise, detail_energy,
};

use crate::error::EventError;
use crate::frame::{Channel, TelemetryFrame};
use crate::record::EventRecord;

/// Wavelet engine configuration.
///
/// # Example
///
/// ```ignore
/// use telemine_events::WaveletConfig;
/// use telemine_wavelet::WaveletFilter;
///
/// let config = WaveletConfig::default()
///     .with_filter(WaveletFilter::Haar)
///     .with_energy_window(32);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveletConfig {
    filter: WaveletFilter,
    level: Option<usize>,
    energy_window: Option<usize>,
}

impl Default for WaveletConfig {
    /// Defaults: `db4` (8-tap Daubechies), level 4, window `2^level`.
    fn default() -> Self {
        Self {
            filter: WaveletFilter::D8,
            level: Some(4),
            energy_window: None,
        }
    }
}

impl WaveletConfig {
    pub fn with_filter(mut self, filter: WaveletFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the decomposition depth; levels beyond what a channel supports
    /// are capped.
    pub fn with_level(mut self, level: usize) -> Self {
        self.level = Some(level);
        self
    }

    /// Uses the deepest level each channel supports.
    pub fn with_max_level(mut self) -> Self {
        self.level = None;
        self
    }

    /// Sets the default sliding-window width for energy computation.
    pub fn with_energy_window(mut self, window: usize) -> Self {
        self.energy_window = Some(window);
        self
    }

    pub fn filter(&self) -> WaveletFilter {
        self.filter
    }

    pub fn level(&self) -> Option<usize> {
        self.level
    }

    pub fn energy_window(&self) -> Option<usize> {
        self.energy_window
    }

    fn dwt(&self) -> DwtConfig {
        let config = DwtConfig::new(self.filter);
        match self.level {
            Some(level) => config.with_level(level),
            None => config,
        }
    }
}

/// Denoising and energy change-point detection bound to one table.
///
/// Each call decomposes the requested channel afresh; no coefficients are
/// kept between calls.
#[derive(Clone, Debug)]
pub struct WaveletEngine<'a> {
    frame: &'a TelemetryFrame,
    config: WaveletConfig,
}

impl<'a> WaveletEngine<'a> {
    pub fn new(frame: &'a TelemetryFrame, config: WaveletConfig) -> Self {
        Self { frame, config }
    }

    pub fn config(&self) -> &WaveletConfig {
        &self.config
    }

    pub fn frame(&self) -> &'a TelemetryFrame {
        self.frame
    }

    /// Denoised copy of `column`, same length, with missing samples kept
    /// missing. Channels too short to decompose, or without any present
    /// sample, are returned unchanged.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`EventError::MissingChannel`] | `column` is absent |
    /// | [`EventError::UnsupportedChannelKind`] | `column` is categorical |
    /// | [`EventError::Wavelet`] | infinite samples or a failed reconstruction |
    #[tracing::instrument(skip(self))]
    pub fn denoise_channel(&self, column: &str) -> Result<Vec<f64>, EventError> {
        let values = self.numeric(column)?;
        let series = match usable_series(column, &values)? {
            Some(series) => series,
            None => return Ok(values),
        };
        match denoise(&series, &self.config.dwt()) {
            Ok(clean) => Ok(clean),
            Err(WaveletError::SeriesTooShort { len, min }) => {
                warn!(column, len, min, "channel too short to denoise; returned unchanged");
                Ok(values)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Denoises several channels into a new table sharing the time axis.
    /// Absent channels are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`WaveletEngine::denoise_channel`] other than
    /// a missing channel.
    pub fn denoise_all<S: AsRef<str>>(&self, columns: &[S]) -> Result<TelemetryFrame, EventError> {
        let mut out = TelemetryFrame::new(self.frame.time().to_vec())?;
        for column in columns {
            let column = column.as_ref();
            if !self.frame.contains(column) {
                warn!(column, "channel not found; skipped");
                continue;
            }
            let clean = self.denoise_channel(column)?;
            out.insert_channel(column, Channel::Numeric(clean))?;
        }
        debug!(channels = out.n_channels(), "denoised channels");
        Ok(out)
    }

    /// Summed multi-level detail energy of `column`.
    ///
    /// `window` overrides the configured window. Channels that cannot be
    /// decomposed yield all-zero energy.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`EventError::MissingChannel`] | `column` is absent |
    /// | [`EventError::UnsupportedChannelKind`] | `column` is categorical |
    /// | [`EventError::Wavelet`] | a zero window or infinite samples |
    #[tracing::instrument(skip(self))]
    pub fn compute_energy(&self, column: &str, window: Option<usize>) -> Result<Vec<f64>, EventError> {
        let values = self.numeric(column)?;
        let n = values.len();
        let series = match usable_series(column, &values)? {
            Some(series) => series,
            None => return Ok(vec![0.0; n]),
        };
        let window = window.or(self.config.energy_window);
        match detail_energy(&series, &self.config.dwt(), window) {
            Ok(energy) => Ok(energy),
            Err(WaveletError::SeriesTooShort { len, min }) => {
                warn!(column, len, min, "channel too short for energy; using zero energy");
                Ok(vec![0.0; n])
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Rising edges of energy above `mean + threshold_sigma * sd`. Record
    /// values are the energy at the edge.
    ///
    /// An absent channel yields no events and a warning.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`WaveletEngine::compute_energy`] other than
    /// a missing channel.
    pub fn energy_change_points(
        &self,
        column: &str,
        event_name: &str,
        threshold_sigma: f64,
        window: Option<usize>,
    ) -> Result<Vec<EventRecord>, EventError> {
        if !self.frame.contains(column) {
            warn!(column, event_name, "channel not found; no energy change points");
            return Ok(Vec::new());
        }
        let energy = self.compute_energy(column, window)?;
        let time = self.frame.time();
        let events: Vec<EventRecord> = change_points(&energy, threshold_sigma)
            .into_iter()
            .map(|i| EventRecord::new(time[i], event_name, Some(energy[i])))
            .collect();
        debug!(column, events = events.len(), "energy change points");
        Ok(events)
    }

    fn numeric(&self, column: &str) -> Result<Vec<f64>, EventError> {
        let channel = self
            .frame
            .channel(column)
            .ok_or_else(|| EventError::MissingChannel(column.to_string()))?;
        channel
            .as_numeric()
            .map(|v| v.into_owned())
            .ok_or_else(|| EventError::UnsupportedChannelKind {
                channel: column.to_string(),
                kind: channel.kind(),
                expected: "numeric or boolean",
            })
    }
}

/// Gap-filled series, or `None` when the channel has fewer than two
/// samples or nothing but gaps.
fn usable_series(column: &str, values: &[f64]) -> Result<Option<TimeSeries>, EventError> {
    match TimeSeries::mean_filled(values) {
        Ok(series) => Ok(Some(series)),
        Err(WaveletError::SeriesTooShort { len, .. }) => {
            warn!(column, len, "channel has fewer than two samples");
            Ok(None)
        }
        Err(WaveletError::AllMissing { len }) => {
            warn!(column, len, "channel has no present samples");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
