//! Event records and the tagged event log.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EventError;

/// One detection produced by a classifier or engine method.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventRecord {
    pub timestamp: f64,
    pub activity: String,
    pub value: Option<f64>,
}

impl EventRecord {
    /// Creates a record. A NaN `value` is stored as `None`.
    pub fn new(timestamp: f64, activity: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            timestamp,
            activity: activity.into(),
            value: value.filter(|v| !v.is_nan()),
        }
    }
}

/// Start or end of a fault condition window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionType {
    #[serde(alias = "error_activation")]
    Activation,
    #[serde(alias = "error_recovery")]
    Recovery,
}

impl TransitionType {
    /// Wire name written to the event log.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activation => "activation",
            Self::Recovery => "recovery",
        }
    }
}

impl fmt::Display for TransitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activation" | "error_activation" => Ok(Self::Activation),
            "recovery" | "error_recovery" => Ok(Self::Recovery),
            other => Err(EventError::UnknownTransitionType(other.to_string())),
        }
    }
}

/// An [`EventRecord`] tagged with its subsystem and transition type.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaggedEvent {
    pub timestamp: f64,
    pub activity: String,
    pub subsystem: String,
    pub transition_type: TransitionType,
    pub value: Option<f64>,
}

impl TaggedEvent {
    /// Tags a record with its subsystem and transition type.
    pub fn from_record(
        record: EventRecord,
        subsystem: &str,
        transition_type: TransitionType,
    ) -> Self {
        Self {
            timestamp: record.timestamp,
            activity: record.activity,
            subsystem: subsystem.to_string(),
            transition_type,
            value: record.value,
        }
    }
}

/// The merged event log, ordered by timestamp.
///
/// Events with equal timestamps keep the order in which they were pushed,
/// which for dispatcher output is rule order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<TaggedEvent>,
}

impl EventLog {
    /// Output column names, in order.
    pub const COLUMNS: [&'static str; 5] = [
        "timestamp",
        "activity",
        "subsystem",
        "transition_type",
        "value",
    ];

    /// Builds a log from events in rule order, stably sorting by timestamp.
    pub fn from_events(mut events: Vec<TaggedEvent>) -> Self {
        sort_stable(&mut events);
        Self { events }
    }

    /// Re-sorts the log. Sorting an already sorted log changes nothing.
    pub fn sort(&mut self) {
        sort_stable(&mut self.events);
    }

    /// Events in log order.
    pub fn events(&self) -> &[TaggedEvent] {
        &self.events
    }

    /// Iterates over events in log order.
    pub fn iter(&self) -> std::slice::Iter<'_, TaggedEvent> {
        self.events.iter()
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Consumes the log, returning its events.
    pub fn into_events(self) -> Vec<TaggedEvent> {
        self.events
    }

    /// Number of events per transition type, as `(activations, recoveries)`.
    pub fn transition_counts(&self) -> (usize, usize) {
        self.events
            .iter()
            .fold((0, 0), |(a, r), e| match e.transition_type {
                TransitionType::Activation => (a + 1, r),
                TransitionType::Recovery => (a, r + 1),
            })
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a TaggedEvent;
    type IntoIter = std::slice::Iter<'a, TaggedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

fn sort_stable(events: &mut [TaggedEvent]) {
    events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
}
