//! Time-indexed telemetry tables.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use tracing::warn;

use crate::error::EventError;

/// Name of the absolute-time channel in recorded telemetry.
pub const DEFAULT_TIME_COLUMN: &str = "time.absolute";

/// One named column of a [`TelemetryFrame`].
///
/// Missing samples are NaN for numeric channels and `None` otherwise.
#[derive(Clone, Debug, PartialEq)]
pub enum Channel {
    Numeric(Vec<f64>),
    Boolean(Vec<Option<bool>>),
    Categorical(Vec<Option<String>>),
}

impl Channel {
    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Boolean(v) => v.len(),
            Self::Categorical(v) => v.len(),
        }
    }

    /// Whether the channel holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::Boolean(_) => "boolean",
            Self::Categorical(_) => "categorical",
        }
    }

    /// Returns the sample at `index`, or [`Sample::Missing`] past the end.
    pub fn sample(&self, index: usize) -> Sample {
        match self {
            Self::Numeric(v) => match v.get(index) {
                Some(x) if !x.is_nan() => Sample::Number(*x),
                _ => Sample::Missing,
            },
            Self::Boolean(v) => match v.get(index) {
                Some(Some(b)) => Sample::Bool(*b),
                _ => Sample::Missing,
            },
            Self::Categorical(v) => match v.get(index) {
                Some(Some(s)) => Sample::Text(s.clone()),
                _ => Sample::Missing,
            },
        }
    }

    /// Numeric view of the channel: booleans become 1.0/0.0, missing
    /// samples NaN. Returns `None` for categorical channels.
    pub fn as_numeric(&self) -> Option<Cow<'_, [f64]>> {
        match self {
            Self::Numeric(v) => Some(Cow::Borrowed(v)),
            Self::Boolean(v) => Some(Cow::Owned(
                v.iter()
                    .map(|b| match b {
                        Some(true) => 1.0,
                        Some(false) => 0.0,
                        None => f64::NAN,
                    })
                    .collect(),
            )),
            Self::Categorical(_) => None,
        }
    }

    fn permuted(&self, order: &[usize]) -> Self {
        match self {
            Self::Numeric(v) => Self::Numeric(order.iter().map(|&i| v[i]).collect()),
            Self::Boolean(v) => Self::Boolean(order.iter().map(|&i| v[i]).collect()),
            Self::Categorical(v) => {
                Self::Categorical(order.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// A single channel value.
#[derive(Clone, Debug, PartialEq)]
pub enum Sample {
    Number(f64),
    Bool(bool),
    Text(String),
    Missing,
}

impl Sample {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Event value of the sample: numbers as-is, booleans as 1.0/0.0,
    /// everything else absent.
    pub fn to_value(&self) -> Option<f64> {
        match self {
            Self::Number(x) => Some(*x),
            Self::Bool(true) => Some(1.0),
            Self::Bool(false) => Some(0.0),
            Self::Text(_) | Self::Missing => None,
        }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(x) => write!(f, "{x:.0}"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Text(s) => f.write_str(s),
            Self::Missing => f.write_str("nan"),
        }
    }
}

/// A telemetry table: one absolute time axis and named channels of equal
/// length.
///
/// Construction rejects time axes that go backwards; use
/// [`TelemetryFrame::sorted_by_time`] for unsorted input.
///
/// # Example
///
/// ```ignore
/// use telemine_events::{Channel, TelemetryFrame};
///
/// let frame = TelemetryFrame::new(vec![0.0, 1.0, 2.0])?
///     .with_channel("oil_psi", Channel::Numeric(vec![30.0, 4.0, 30.0]))?;
/// assert_eq!(frame.len(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TelemetryFrame {
    time: Vec<f64>,
    channels: BTreeMap<String, Channel>,
}

impl TelemetryFrame {
    /// Creates a frame with no channels.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::UnsortedTime`] if a timestamp is smaller than
    /// its predecessor (or NaN).
    pub fn new(time: Vec<f64>) -> Result<Self, EventError> {
        if let Some(index) = first_unsorted(&time) {
            return Err(EventError::UnsortedTime { index });
        }
        Ok(Self {
            time,
            channels: BTreeMap::new(),
        })
    }

    /// Builds a frame from possibly unsorted rows, stably reordering every
    /// channel by time.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::LengthMismatch`] if a channel's length differs
    /// from the time axis.
    pub fn sorted_by_time(
        time: Vec<f64>,
        channels: impl IntoIterator<Item = (String, Channel)>,
    ) -> Result<Self, EventError> {
        let channels: Vec<(String, Channel)> = channels.into_iter().collect();
        for (name, channel) in &channels {
            check_len(name, channel, time.len())?;
        }
        if first_unsorted(&time).is_none() {
            return Ok(Self {
                time,
                channels: channels.into_iter().collect(),
            });
        }

        let mut order: Vec<usize> = (0..time.len()).collect();
        order.sort_by(|&a, &b| time[a].total_cmp(&time[b]));
        let moved = order.iter().enumerate().filter(|(i, j)| i != *j).count();
        warn!(rows = time.len(), moved, "telemetry rows were not in time order; sorted");

        let sorted_time = order.iter().map(|&i| time[i]).collect();
        let channels = channels
            .iter()
            .map(|(name, channel)| (name.clone(), channel.permuted(&order)))
            .collect();
        Ok(Self {
            time: sorted_time,
            channels,
        })
    }

    /// Adds (or replaces) a channel, builder style.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::LengthMismatch`] on a length mismatch.
    pub fn with_channel(
        mut self,
        name: impl Into<String>,
        channel: Channel,
    ) -> Result<Self, EventError> {
        self.insert_channel(name, channel)?;
        Ok(self)
    }

    /// Adds (or replaces) a channel.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::LengthMismatch`] on a length mismatch.
    pub fn insert_channel(
        &mut self,
        name: impl Into<String>,
        channel: Channel,
    ) -> Result<(), EventError> {
        let name = name.into();
        check_len(&name, &channel, self.time.len())?;
        self.channels.insert(name, channel);
        Ok(())
    }

    /// The absolute time axis.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Looks up a channel by name.
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    /// Whether a channel called `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Channel names in sorted order.
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Iterates over `(name, channel)` pairs in name order.
    pub fn channels(&self) -> impl Iterator<Item = (&str, &Channel)> {
        self.channels.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of channels, excluding the time axis.
    pub fn n_channels(&self) -> usize {
        self.channels.len()
    }
}

/// A read-only frame plus rule-scoped derived channels.
///
/// Lookups consult the derived channels first. The base frame is never
/// modified; dropping the overlay discards the derived channels.
#[derive(Clone, Debug)]
pub struct FrameOverlay<'a> {
    base: &'a TelemetryFrame,
    derived: BTreeMap<String, Channel>,
}

impl<'a> FrameOverlay<'a> {
    /// An overlay with no derived channels yet.
    pub fn new(base: &'a TelemetryFrame) -> Self {
        Self {
            base,
            derived: BTreeMap::new(),
        }
    }

    /// Adds a derived channel visible only through this overlay.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::LengthMismatch`] on a length mismatch.
    pub fn insert(&mut self, name: impl Into<String>, channel: Channel) -> Result<(), EventError> {
        let name = name.into();
        check_len(&name, &channel, self.base.len())?;
        self.derived.insert(name, channel);
        Ok(())
    }

    /// Time axis of the base frame.
    pub fn time(&self) -> &'a [f64] {
        self.base.time()
    }

    /// Row count of the base frame.
    pub fn len(&self) -> usize {
        self.base.len()
    }

    /// Whether the base frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// Whether `name` resolves to a derived or base channel.
    pub fn contains(&self, name: &str) -> bool {
        self.derived.contains_key(name) || self.base.contains(name)
    }

    /// Looks up `name`, derived channels first.
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.derived.get(name).or_else(|| self.base.channel(name))
    }

    /// Like [`FrameOverlay::channel`], but a missing channel is an error.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::MissingChannel`].
    pub fn require(&self, name: &str) -> Result<&Channel, EventError> {
        self.channel(name)
            .ok_or_else(|| EventError::MissingChannel(name.to_string()))
    }
}

fn check_len(name: &str, channel: &Channel, expected: usize) -> Result<(), EventError> {
    if channel.len() != expected {
        return Err(EventError::LengthMismatch {
            channel: name.to_string(),
            len: channel.len(),
            expected,
        });
    }
    Ok(())
}

fn first_unsorted(time: &[f64]) -> Option<usize> {
    if time.first().is_some_and(|t| t.is_nan()) {
        return Some(0);
    }
    time.windows(2)
        .position(|w| w[1].is_nan() || w[1] < w[0])
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> TelemetryFrame {
        TelemetryFrame::new(vec![0.0, 1.0, 2.0])
            .unwrap()
            .with_channel("speed", Channel::Numeric(vec![1.0, f64::NAN, 3.0]))
            .unwrap()
            .with_channel("brake", Channel::Boolean(vec![Some(true), None, Some(false)]))
            .unwrap()
    }

    #[test]
    fn new_rejects_backwards_time() {
        let err = TelemetryFrame::new(vec![0.0, 2.0, 1.0]).unwrap_err();
        assert!(matches!(err, EventError::UnsortedTime { index: 2 }));
    }

    #[test]
    fn new_accepts_repeated_timestamps() {
        assert!(TelemetryFrame::new(vec![0.0, 1.0, 1.0, 2.0]).is_ok());
    }

    #[test]
    fn channel_length_checked() {
        let err = TelemetryFrame::new(vec![0.0, 1.0])
            .unwrap()
            .with_channel("x", Channel::Numeric(vec![1.0]))
            .unwrap_err();
        assert!(matches!(err, EventError::LengthMismatch { len: 1, expected: 2, .. }));
    }

    #[test]
    fn sorted_by_time_reorders_channels() {
        let frame = TelemetryFrame::sorted_by_time(
            vec![2.0, 0.0, 1.0, 0.0],
            vec![(
                "x".to_string(),
                Channel::Numeric(vec![20.0, 0.0, 10.0, 1.0]),
            )],
        )
        .unwrap();
        assert_eq!(frame.time(), &[0.0, 0.0, 1.0, 2.0]);
        // Equal timestamps keep their input order.
        assert_eq!(
            frame.channel("x"),
            Some(&Channel::Numeric(vec![0.0, 1.0, 10.0, 20.0]))
        );
    }

    #[test]
    fn samples_by_kind() {
        let f = frame();
        let speed = f.channel("speed").unwrap();
        assert_eq!(speed.sample(0), Sample::Number(1.0));
        assert_eq!(speed.sample(1), Sample::Missing);
        let brake = f.channel("brake").unwrap();
        assert_eq!(brake.sample(0), Sample::Bool(true));
        assert_eq!(brake.sample(1), Sample::Missing);
    }

    #[test]
    fn boolean_numeric_view() {
        let f = frame();
        let view = f.channel("brake").unwrap().as_numeric().unwrap();
        assert_eq!(view[0], 1.0);
        assert!(view[1].is_nan());
        assert_eq!(view[2], 0.0);
        assert!(Channel::Categorical(vec![None]).as_numeric().is_none());
    }

    #[test]
    fn sample_display_and_value() {
        assert_eq!(Sample::Number(29.6).to_string(), "30");
        assert_eq!(Sample::Bool(false).to_string(), "False");
        assert_eq!(Sample::Missing.to_string(), "nan");
        assert_eq!(Sample::Bool(true).to_value(), Some(1.0));
        assert_eq!(Sample::Text("D".into()).to_value(), None);
    }

    #[test]
    fn overlay_shadows_without_touching_base() {
        let f = frame();
        let mut overlay = FrameOverlay::new(&f);
        overlay
            .insert("_derived_x", Channel::Boolean(vec![Some(false); 3]))
            .unwrap();
        assert!(overlay.contains("_derived_x"));
        assert!(overlay.contains("speed"));
        assert!(!f.contains("_derived_x"));
        assert!(matches!(
            overlay.require("nope"),
            Err(EventError::MissingChannel(ref c)) if c == "nope"
        ));
    }
}
