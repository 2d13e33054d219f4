//! Detection rule model.
//!
//! Rules arrive from configuration as untyped entries, are parsed into
//! [`RawRule`]s with free-form arguments and are converted into the closed [`Rule`] model before
//! dispatch. Conversion failures are configuration errors of that rule
//! alone.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::classifier::Condition;
use crate::error::EventError;
use crate::record::TransitionType;
use crate::signal::{CombineMode, Comparator};

/// A detection rule as written in configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRule {
    pub subsystem: String,
    pub method: String,
    #[serde(default)]
    pub transition_type: Option<String>,
    #[serde(default)]
    pub derived_column: Option<(String, String, f64)>,
    #[serde(default)]
    pub args: serde_json::Value,
}

impl RawRule {
    /// Parses one untyped `[[rule]]` entry.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::MalformedRule`] for unknown keys, missing
    /// `subsystem`/`method`, or a `derived_column` that is not a
    /// `(channel, comparator, threshold)` triple.
    pub fn from_entry(entry: &serde_json::Value) -> Result<Self, EventError> {
        Self::deserialize(entry).map_err(|e| EventError::MalformedRule(e.to_string()))
    }

    /// Subsystem and label of an entry that may not parse, for diagnostics.
    /// Absent fields read as `?`.
    pub fn describe_entry(entry: &serde_json::Value) -> (String, String) {
        let field = |key: &str| entry.get(key).and_then(|v| v.as_str()).unwrap_or("?");
        let args = entry.get("args").unwrap_or(&serde_json::Value::Null);
        (field("subsystem").to_string(), label_from(args, field("method")))
    }

    /// Best-effort rule label for diagnostics: the event name or label
    /// prefix argument, else the method name.
    pub fn label(&self) -> String {
        label_from(&self.args, &self.method)
    }
}

fn label_from(args: &serde_json::Value, method: &str) -> String {
    ["event_name", "event_name_prefix", "label_prefix", "event_name_max"]
        .iter()
        .find_map(|key| args.get(key).and_then(|v| v.as_str()))
        .unwrap_or(method)
        .to_string()
}

/// Detection method names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Threshold,
    StateChange,
    CombinedCondition,
    LocalExtrema,
    EnergyChangePoints,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::StateChange => "state_change",
            Self::CombinedCondition => "combined_condition",
            Self::LocalExtrema => "local_extrema",
            Self::EnergyChangePoints => "energy_change_points",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "threshold" | "detect_threshold_events" => Ok(Self::Threshold),
            "state_change" | "detect_state_change_events" => Ok(Self::StateChange),
            "combined_condition" | "detect_combined_condition_events" => {
                Ok(Self::CombinedCondition)
            }
            "local_extrema" | "detect_local_extrema_events" => Ok(Self::LocalExtrema),
            "energy_change_points" | "detect_energy_change_points" => {
                Ok(Self::EnergyChangePoints)
            }
            other => Err(EventError::UnknownMethod(other.to_string())),
        }
    }
}

fn default_min_duration() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_window_size() -> usize {
    10
}

fn default_prominence() -> f64 {
    0.1
}

fn default_threshold_sigma() -> f64 {
    telemine_wavelet::DEFAULT_THRESHOLD_SIGMA
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdArgs {
    pub column: String,
    pub threshold: f64,
    #[serde(alias = "condition")]
    pub comparator: Comparator,
    pub event_name: String,
    #[serde(default = "default_min_duration", alias = "min_duration_rows")]
    pub min_duration: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateChangeArgs {
    pub column: String,
    #[serde(alias = "event_name_prefix")]
    pub label_prefix: String,
    #[serde(default = "default_true", alias = "ignore_nan")]
    pub ignore_missing: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CombinedConditionArgs {
    pub conditions: Vec<Condition>,
    pub event_name: String,
    #[serde(default)]
    pub mode: CombineMode,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalExtremaArgs {
    pub column: String,
    pub event_name_max: String,
    pub event_name_min: String,
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_prominence")]
    pub prominence: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnergyChangePointArgs {
    pub column: String,
    pub event_name: String,
    #[serde(default = "default_threshold_sigma")]
    pub threshold_sigma: f64,
    #[serde(default)]
    pub window: Option<usize>,
}

/// A detection call with typed arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    Threshold(ThresholdArgs),
    StateChange(StateChangeArgs),
    CombinedCondition(CombinedConditionArgs),
    LocalExtrema(LocalExtremaArgs),
    EnergyChangePoints(EnergyChangePointArgs),
}

impl Operation {
    /// Parses `args` for `method`.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`EventError::UnknownMethod`] | `method` is not a detection method |
    /// | [`EventError::InvalidArgs`] | `args` does not fit the method |
    pub fn from_args(method: &str, args: &serde_json::Value) -> Result<Self, EventError> {
        let method: Method = method.parse()?;
        Ok(match method {
            Method::Threshold => Self::Threshold(parse_args(method, args)?),
            Method::StateChange => Self::StateChange(parse_args(method, args)?),
            Method::CombinedCondition => Self::CombinedCondition(parse_args(method, args)?),
            Method::LocalExtrema => Self::LocalExtrema(parse_args(method, args)?),
            Method::EnergyChangePoints => Self::EnergyChangePoints(parse_args(method, args)?),
        })
    }

    pub fn method(&self) -> Method {
        match self {
            Self::Threshold(_) => Method::Threshold,
            Self::StateChange(_) => Method::StateChange,
            Self::CombinedCondition(_) => Method::CombinedCondition,
            Self::LocalExtrema(_) => Method::LocalExtrema,
            Self::EnergyChangePoints(_) => Method::EnergyChangePoints,
        }
    }

    /// Channels the operation reads.
    pub fn channels(&self) -> Vec<&str> {
        match self {
            Self::Threshold(a) => vec![a.column.as_str()],
            Self::StateChange(a) => vec![a.column.as_str()],
            Self::CombinedCondition(a) => a.conditions.iter().map(|c| c.channel.as_str()).collect(),
            Self::LocalExtrema(a) => vec![a.column.as_str()],
            Self::EnergyChangePoints(a) => vec![a.column.as_str()],
        }
    }

    /// The event name or label prefix that identifies the operation.
    pub fn label(&self) -> &str {
        match self {
            Self::Threshold(a) => &a.event_name,
            Self::StateChange(a) => &a.label_prefix,
            Self::CombinedCondition(a) => &a.event_name,
            Self::LocalExtrema(a) => &a.event_name_max,
            Self::EnergyChangePoints(a) => &a.event_name,
        }
    }
}

fn parse_args<T: DeserializeOwned>(method: Method, args: &serde_json::Value) -> Result<T, EventError> {
    let args = if args.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        args.clone()
    };
    serde_json::from_value(args).map_err(|e| EventError::InvalidArgs {
        method: method.to_string(),
        reason: e.to_string(),
    })
}

/// Boolean channel `source <comparator> threshold` computed per rule.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedColumn {
    pub source: String,
    pub comparator: Comparator,
    pub threshold: f64,
}

/// The two rule shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleKind {
    /// State changes of a derived boolean channel; `False->True` is an
    /// activation, `True->False` a recovery.
    DerivedState {
        derived: DerivedColumn,
        label_prefix: String,
    },
    /// A detection call whose events all get one transition type.
    Simple {
        transition_type: TransitionType,
        operation: Operation,
    },
}

/// A validated detection rule.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub subsystem: String,
    pub kind: RuleKind,
}

impl Rule {
    pub fn derived_state(
        subsystem: impl Into<String>,
        derived: DerivedColumn,
        label_prefix: impl Into<String>,
    ) -> Self {
        Self {
            subsystem: subsystem.into(),
            kind: RuleKind::DerivedState {
                derived,
                label_prefix: label_prefix.into(),
            },
        }
    }

    pub fn simple(
        subsystem: impl Into<String>,
        transition_type: TransitionType,
        operation: Operation,
    ) -> Self {
        Self {
            subsystem: subsystem.into(),
            kind: RuleKind::Simple {
                transition_type,
                operation,
            },
        }
    }

    /// Distinguishing label for diagnostics.
    pub fn label(&self) -> &str {
        match &self.kind {
            RuleKind::DerivedState { label_prefix, .. } => label_prefix,
            RuleKind::Simple { operation, .. } => operation.label(),
        }
    }

    /// Channels the rule reads from the table.
    pub fn channels(&self) -> Vec<&str> {
        match &self.kind {
            RuleKind::DerivedState { derived, .. } => vec![derived.source.as_str()],
            RuleKind::Simple { operation, .. } => operation.channels(),
        }
    }

    /// Parses and converts one untyped `[[rule]]` entry.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::MalformedRule`] for a badly shaped entry, or
    /// any conversion error from [`Rule::try_from`].
    pub fn from_entry(entry: &serde_json::Value) -> Result<Self, EventError> {
        Rule::try_from(&RawRule::from_entry(entry)?)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DerivedStateArgs {
    #[serde(alias = "event_name_prefix")]
    label_prefix: String,
}

impl TryFrom<&RawRule> for Rule {
    type Error = EventError;

    /// A rule with `derived_column` becomes a derived-state rule and must use
    /// the state-change method; any other rule needs a `transition_type`.
    fn try_from(raw: &RawRule) -> Result<Self, Self::Error> {
        if let Some((source, comparator, threshold)) = &raw.derived_column {
            let method: Method = raw.method.parse()?;
            if method != Method::StateChange {
                return Err(EventError::InvalidArgs {
                    method: method.to_string(),
                    reason: "derived_column rules must use state_change".to_string(),
                });
            }
            let args: DerivedStateArgs = parse_args(method, &raw.args)?;
            let derived = DerivedColumn {
                source: source.clone(),
                comparator: comparator.parse()?,
                threshold: *threshold,
            };
            return Ok(Rule::derived_state(&raw.subsystem, derived, args.label_prefix));
        }

        let transition_type: TransitionType = raw
            .transition_type
            .as_deref()
            .ok_or_else(|| EventError::InvalidArgs {
                method: raw.method.clone(),
                reason: "missing transition_type".to_string(),
            })?
            .parse()?;
        let operation = Operation::from_args(&raw.method, &raw.args)?;
        Ok(Rule::simple(&raw.subsystem, transition_type, operation))
    }
}
