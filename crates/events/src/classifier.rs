//! Binds detection primitives to a telemetry table and labels the results.

use std::borrow::Cow;

use tracing::debug;

use crate::error::EventError;
use crate::frame::{Channel, FrameOverlay, TelemetryFrame};
use crate::record::EventRecord;
use crate::signal::{
    self, CombineMode, Comparator, StateTransition, local_extrema, threshold_crossings,
    value_transitions,
};

/// One `(channel, comparator, threshold)` term of a combined condition.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "(String, Comparator, f64)", into = "(String, Comparator, f64)")]
pub struct Condition {
    pub channel: String,
    pub comparator: Comparator,
    pub threshold: f64,
}

impl Condition {
    pub fn new(channel: impl Into<String>, comparator: Comparator, threshold: f64) -> Self {
        Self {
            channel: channel.into(),
            comparator,
            threshold,
        }
    }
}

impl From<(String, Comparator, f64)> for Condition {
    fn from((channel, comparator, threshold): (String, Comparator, f64)) -> Self {
        Self {
            channel,
            comparator,
            threshold,
        }
    }
}

impl From<Condition> for (String, Comparator, f64) {
    fn from(c: Condition) -> Self {
        (c.channel, c.comparator, c.threshold)
    }
}

/// Stateless detection methods over one telemetry table.
///
/// Timestamps come from the table's absolute time axis. The classifier
/// knows nothing about subsystems or transition types.
///
/// # Example
///
/// ```ignore
/// use telemine_events::{Comparator, EventClassifier};
///
/// let classifier = EventClassifier::new(&frame);
/// let events = classifier.threshold("oil_psi", 5.0, Comparator::Less, "low_oil", 1)?;
/// ```
#[derive(Clone, Debug)]
pub struct EventClassifier<'a> {
    frame: FrameOverlay<'a>,
}

impl<'a> EventClassifier<'a> {
    pub fn new(frame: &'a TelemetryFrame) -> Self {
        Self {
            frame: FrameOverlay::new(frame),
        }
    }

    /// Returns a classifier that also sees `channel` under `name`. The
    /// underlying table is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::LengthMismatch`] on a length mismatch.
    pub fn with_derived(mut self, name: &str, channel: Channel) -> Result<Self, EventError> {
        self.frame.insert(name, channel)?;
        Ok(self)
    }

    /// Rising edges of `column <comparator> threshold`, confirmed over
    /// `min_duration` samples. Values are the channel values at the edge.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`EventError::MissingChannel`] | `column` is absent |
    /// | [`EventError::UnsupportedChannelKind`] | `column` is categorical |
    pub fn threshold(
        &self,
        column: &str,
        threshold: f64,
        comparator: Comparator,
        event_name: &str,
        min_duration: usize,
    ) -> Result<Vec<EventRecord>, EventError> {
        let values = self.numeric(column)?;
        let edges = threshold_crossings(&values, comparator, threshold, min_duration);
        debug!(column, edges = edges.len(), "threshold crossings");
        Ok(self.records(&edges, |_| event_name.to_string(), |i| Some(values[i])))
    }

    /// Typed value transitions of `column`, including the start transition.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::MissingChannel`] if `column` is absent.
    pub fn state_transitions(
        &self,
        column: &str,
        ignore_missing: bool,
    ) -> Result<Vec<StateTransition>, EventError> {
        let channel = self.frame.require(column)?;
        Ok(value_transitions(channel, ignore_missing))
    }

    /// One record per value transition, labelled `"{prefix} {from}->{to}"`,
    /// plus `"{prefix} Start"` at the first row.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::MissingChannel`] if `column` is absent.
    pub fn state_change(
        &self,
        column: &str,
        label_prefix: &str,
        ignore_missing: bool,
    ) -> Result<Vec<EventRecord>, EventError> {
        let transitions = self.state_transitions(column, ignore_missing)?;
        Ok(self.transition_records(&transitions, label_prefix))
    }

    /// Converts typed transitions to records.
    pub fn transition_records(
        &self,
        transitions: &[StateTransition],
        label_prefix: &str,
    ) -> Vec<EventRecord> {
        let time = self.frame.time();
        transitions
            .iter()
            .map(|t| EventRecord::new(time[t.index], t.label(label_prefix), t.to.to_value()))
            .collect()
    }

    /// Rising edges of several conditions combined with AND or OR. Records
    /// carry no value.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`EventError::InvalidArgs`] | `conditions` is empty |
    /// | [`EventError::MissingChannel`] | a condition channel is absent |
    /// | [`EventError::UnsupportedChannelKind`] | a condition channel is categorical |
    pub fn combined_condition(
        &self,
        conditions: &[Condition],
        event_name: &str,
        mode: CombineMode,
    ) -> Result<Vec<EventRecord>, EventError> {
        if conditions.is_empty() {
            return Err(EventError::InvalidArgs {
                method: "combined_condition".to_string(),
                reason: "at least one condition is required".to_string(),
            });
        }
        let masks = conditions
            .iter()
            .map(|c| {
                let values = self.numeric(&c.channel)?;
                Ok(signal::compare(&values, c.comparator, c.threshold))
            })
            .collect::<Result<Vec<_>, EventError>>()?;
        let combined = signal::combine(&masks, mode);
        let edges = signal::rising_edges(&combined);
        Ok(self.records(&edges, |_| event_name.to_string(), |_| None))
    }

    /// Local maxima and minima of `column`, merged in time order.
    ///
    /// `window_size` is the minimum separation between peaks in samples.
    /// Missing samples count as zero for detection; the record value is the
    /// raw channel value.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`EventError::MissingChannel`] | `column` is absent |
    /// | [`EventError::UnsupportedChannelKind`] | `column` is categorical |
    pub fn local_extrema(
        &self,
        column: &str,
        event_name_max: &str,
        event_name_min: &str,
        window_size: usize,
        prominence: f64,
    ) -> Result<Vec<EventRecord>, EventError> {
        let values = self.numeric(column)?;
        let (maxima, minima) = local_extrema(&values, window_size, prominence);
        debug!(column, maxima = maxima.len(), minima = minima.len(), "local extrema");

        let mut records = self.records(&maxima, |_| event_name_max.to_string(), |i| Some(values[i]));
        records.extend(self.records(&minima, |_| event_name_min.to_string(), |i| Some(values[i])));
        records.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Ok(records)
    }

    fn numeric(&self, column: &str) -> Result<Cow<'_, [f64]>, EventError> {
        let channel = self.frame.require(column)?;
        channel
            .as_numeric()
            .ok_or_else(|| EventError::UnsupportedChannelKind {
                channel: column.to_string(),
                kind: channel.kind(),
                expected: "numeric or boolean",
            })
    }

    fn records(
        &self,
        indices: &[usize],
        label: impl Fn(usize) -> String,
        value: impl Fn(usize) -> Option<f64>,
    ) -> Vec<EventRecord> {
        let time = self.frame.time();
        indices
            .iter()
            .map(|&i| EventRecord::new(time[i], label(i), value(i)))
            .collect()
    }
}
