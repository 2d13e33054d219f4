//! # telemine-events
//!
//! Event extraction from multi-channel telemetry.
//!
//! ```mermaid
//! graph LR
//!     A["TelemetryFrame"] --> B["EventClassifier"]
//!     A --> C["WaveletEngine"]
//!     D["[[rule]] entry"] -->|"Rule::from_entry"| E["Rule"]
//!     E --> F["dispatch"]
//!     B --> F
//!     C --> F
//!     F --> G["EventLog + diagnostics"]
//! ```
//!
//! The log has five columns, `timestamp, activity, subsystem,
//! transition_type, value`, sorted by timestamp with ties in rule order.

mod classifier;
mod dispatch;
mod engine;
mod error;
mod frame;
mod peaks;
mod record;
mod rules;
mod signal;

pub use classifier::{Condition, EventClassifier};
pub use dispatch::{DispatchOptions, DispatchOutput, RuleDiagnostic, dispatch, dispatch_raw};
pub use engine::{WaveletConfig, WaveletEngine};
pub use error::EventError;
pub use frame::{Channel, DEFAULT_TIME_COLUMN, FrameOverlay, Sample, TelemetryFrame};
pub use peaks::find_peaks;
pub use record::{EventLog, EventRecord, TaggedEvent, TransitionType};
pub use rules::{
    CombinedConditionArgs, DerivedColumn, EnergyChangePointArgs, LocalExtremaArgs, Method,
    Operation, RawRule, Rule, RuleKind, StateChangeArgs, ThresholdArgs,
};
pub use signal::{
    CombineMode, Comparator, StateTransition, combine, compare, confirm_duration, local_extrema,
    rising_edges, threshold_crossings, value_transitions,
};
pub use telemine_wavelet::WaveletFilter;
