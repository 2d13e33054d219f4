//! Rule dispatch: evaluate every rule, isolate failures, merge the results.

use std::fmt;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classifier::EventClassifier;
use crate::engine::WaveletEngine;
use crate::error::EventError;
use crate::frame::{Channel, TelemetryFrame};
use crate::record::{EventLog, EventRecord, TaggedEvent, TransitionType};
use crate::rules::{DerivedColumn, Operation, RawRule, Rule, RuleKind};
use crate::signal::compare;

/// Dispatch options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    parallel: bool,
}

impl DispatchOptions {
    /// Evaluates rules on the rayon pool. The output is identical to
    /// sequential evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

/// Why a rule contributed nothing to the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RuleDiagnostic {
    /// Position of the rule in the input list.
    pub rule_index: usize,
    pub subsystem: String,
    /// Event name or label prefix of the rule.
    pub rule: String,
    pub cause: String,
}

impl fmt::Display for RuleDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rule #{} ({} / {}) skipped: {}",
            self.rule_index, self.subsystem, self.rule, self.cause
        )
    }
}

/// The merged log plus one diagnostic per skipped rule, in rule order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DispatchOutput {
    pub log: EventLog,
    pub diagnostics: Vec<RuleDiagnostic>,
}

/// Evaluates `rules` against `frame` and merges the results into one log.
///
/// Energy change-point rules run on `engine`; everything else on an
/// [`EventClassifier`] over `frame`. A rule that references an absent
/// channel, or fails, is skipped and reported in
/// [`DispatchOutput::diagnostics`]. This function never fails.
///
/// The log is sorted by timestamp; equal timestamps keep rule order.
#[tracing::instrument(skip_all, fields(rules = rules.len(), rows = frame.len()))]
pub fn dispatch(
    frame: &TelemetryFrame,
    rules: &[Rule],
    engine: Option<&WaveletEngine<'_>>,
    options: &DispatchOptions,
) -> DispatchOutput {
    let outcomes = evaluate_all(rules.len(), options, |i| {
        evaluate_rule(frame, &rules[i], engine).map_err(|cause| diagnostic(i, &rules[i], cause))
    });
    merge(outcomes)
}

/// Like [`dispatch`], but takes untyped configuration entries. Entries
/// that are not well-formed rules, or fail conversion, become diagnostics.
#[tracing::instrument(skip_all, fields(rules = entries.len(), rows = frame.len()))]
pub fn dispatch_raw(
    frame: &TelemetryFrame,
    entries: &[serde_json::Value],
    engine: Option<&WaveletEngine<'_>>,
    options: &DispatchOptions,
) -> DispatchOutput {
    let outcomes = evaluate_all(entries.len(), options, |i| {
        let entry = &entries[i];
        let rule = Rule::from_entry(entry).map_err(|e| {
            let (subsystem, rule) = RawRule::describe_entry(entry);
            RuleDiagnostic {
                rule_index: i,
                subsystem,
                rule,
                cause: format!("invalid rule: {e}"),
            }
        })?;
        evaluate_rule(frame, &rule, engine).map_err(|cause| diagnostic(i, &rule, cause))
    });
    merge(outcomes)
}

type Outcome = Result<Vec<TaggedEvent>, RuleDiagnostic>;

fn evaluate_all<F>(n: usize, options: &DispatchOptions, eval: F) -> Vec<Outcome>
where
    F: Fn(usize) -> Outcome + Sync,
{
    if options.parallel {
        (0..n).into_par_iter().map(&eval).collect()
    } else {
        (0..n).map(&eval).collect()
    }
}

fn merge(outcomes: Vec<Outcome>) -> DispatchOutput {
    let mut events = Vec::new();
    let mut diagnostics = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(batch) => events.extend(batch),
            Err(d) => {
                warn!(
                    subsystem = %d.subsystem,
                    rule = %d.rule,
                    cause = %d.cause,
                    "rule skipped"
                );
                diagnostics.push(d);
            }
        }
    }
    let log = EventLog::from_events(events);
    info!(
        events = log.len(),
        skipped = diagnostics.len(),
        "dispatch complete"
    );
    DispatchOutput { log, diagnostics }
}

fn diagnostic(rule_index: usize, rule: &Rule, cause: EventError) -> RuleDiagnostic {
    RuleDiagnostic {
        rule_index,
        subsystem: rule.subsystem.clone(),
        rule: rule.label().to_string(),
        cause: cause.to_string(),
    }
}

/// Runs one rule. Missing channels are reported before any computation.
fn evaluate_rule(
    frame: &TelemetryFrame,
    rule: &Rule,
    engine: Option<&WaveletEngine<'_>>,
) -> Result<Vec<TaggedEvent>, EventError> {
    let missing: Vec<&str> = rule
        .channels()
        .into_iter()
        .filter(|c| !frame.contains(c))
        .collect();
    if let Some(first) = missing.first() {
        return Err(EventError::MissingChannel(if missing.len() == 1 {
            first.to_string()
        } else {
            missing.join("', '")
        }));
    }

    let events = match &rule.kind {
        RuleKind::DerivedState {
            derived,
            label_prefix,
        } => derived_state_events(frame, derived, label_prefix, &rule.subsystem)?,
        RuleKind::Simple {
            transition_type,
            operation,
        } => run_operation(frame, operation, engine)?
            .into_iter()
            .map(|r| TaggedEvent::from_record(r, &rule.subsystem, *transition_type))
            .collect(),
    };
    debug!(
        subsystem = %rule.subsystem,
        rule = rule.label(),
        events = events.len(),
        "rule evaluated"
    );
    Ok(events)
}

/// Evaluates the derived boolean channel on a rule-private overlay and keeps
/// only its boolean edges.
fn derived_state_events(
    frame: &TelemetryFrame,
    derived: &DerivedColumn,
    label_prefix: &str,
    subsystem: &str,
) -> Result<Vec<TaggedEvent>, EventError> {
    let source = frame
        .channel(&derived.source)
        .ok_or_else(|| EventError::MissingChannel(derived.source.clone()))?;
    let values = source
        .as_numeric()
        .ok_or_else(|| EventError::UnsupportedChannelKind {
            channel: derived.source.clone(),
            kind: source.kind(),
            expected: "numeric or boolean",
        })?;
    let mask = compare(&values, derived.comparator, derived.threshold);
    let name = format!("_derived_{label_prefix}");
    let classifier = EventClassifier::new(frame)
        .with_derived(&name, Channel::Boolean(mask.into_iter().map(Some).collect()))?;

    let transitions = classifier.state_transitions(&name, true)?;
    let time = frame.time();
    Ok(transitions
        .iter()
        .filter_map(|t| {
            let transition_type = match t.boolean_edge()? {
                true => TransitionType::Activation,
                false => TransitionType::Recovery,
            };
            let record = EventRecord::new(time[t.index], t.label(label_prefix), t.to.to_value());
            Some(TaggedEvent::from_record(record, subsystem, transition_type))
        })
        .collect())
}

fn run_operation(
    frame: &TelemetryFrame,
    operation: &Operation,
    engine: Option<&WaveletEngine<'_>>,
) -> Result<Vec<EventRecord>, EventError> {
    let classifier = EventClassifier::new(frame);
    match operation {
        Operation::Threshold(a) => classifier.threshold(
            &a.column,
            a.threshold,
            a.comparator,
            &a.event_name,
            a.min_duration,
        ),
        Operation::StateChange(a) => {
            classifier.state_change(&a.column, &a.label_prefix, a.ignore_missing)
        }
        Operation::CombinedCondition(a) => {
            classifier.combined_condition(&a.conditions, &a.event_name, a.mode)
        }
        Operation::LocalExtrema(a) => classifier.local_extrema(
            &a.column,
            &a.event_name_max,
            &a.event_name_min,
            a.window_size,
            a.prominence,
        ),
        Operation::EnergyChangePoints(a) => {
            let engine = engine
                .ok_or_else(|| EventError::EngineUnavailable(operation.method().to_string()))?;
            engine.energy_change_points(&a.column, &a.event_name, a.threshold_sigma, a.window)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ThresholdArgs;
    use crate::signal::Comparator;

    fn oil_frame() -> TelemetryFrame {
        TelemetryFrame::new(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0])
            .unwrap()
            .with_channel(
                "oil_psi",
                Channel::Numeric(vec![30.0, 30.0, 30.0, 4.0, 4.0, 30.0]),
            )
            .unwrap()
    }

    fn low_oil_rule() -> Rule {
        Rule::derived_state(
            "Lubrication",
            DerivedColumn {
                source: "oil_psi".to_string(),
                comparator: Comparator::Less,
                threshold: 5.0,
            },
            "low_oil",
        )
    }

    #[test]
    fn derived_state_pairs_activation_and_recovery() {
        let frame = oil_frame();
        let out = dispatch(&frame, &[low_oil_rule()], None, &DispatchOptions::default());
        assert!(out.diagnostics.is_empty());
        let summary: Vec<(f64, TransitionType)> = out
            .log
            .iter()
            .map(|e| (e.timestamp, e.transition_type))
            .collect();
        assert_eq!(
            summary,
            vec![(3.0, TransitionType::Activation), (5.0, TransitionType::Recovery)]
        );
        assert!(out.log.iter().all(|e| e.subsystem == "Lubrication"));
        assert_eq!(out.log.events()[0].activity, "low_oil False->True");
        assert!(!frame.contains("_derived_low_oil"));
    }

    #[test]
    fn energy_rule_without_engine_is_diagnosed() {
        let frame = oil_frame();
        let rule = Rule::simple(
            "Engine",
            TransitionType::Activation,
            Operation::from_args(
                "energy_change_points",
                &serde_json::json!({"column": "oil_psi", "event_name": "shift"}),
            )
            .unwrap(),
        );
        let out = dispatch(&frame, &[rule], None, &DispatchOptions::default());
        assert!(out.log.is_empty());
        assert_eq!(out.diagnostics.len(), 1);
        assert!(out.diagnostics[0].cause.contains("requires a wavelet engine"));
    }

    #[test]
    fn missing_channel_reported_before_evaluation() {
        let frame = oil_frame();
        let rule = Rule::simple(
            "Brakes",
            TransitionType::Activation,
            Operation::Threshold(ThresholdArgs {
                column: "brake_temp".to_string(),
                threshold: 600.0,
                comparator: Comparator::Greater,
                event_name: "brake_overheat".to_string(),
                min_duration: 1,
            }),
        );
        let out = dispatch(&frame, &[rule], None, &DispatchOptions::default());
        assert_eq!(
            out.diagnostics,
            vec![RuleDiagnostic {
                rule_index: 0,
                subsystem: "Brakes".to_string(),
                rule: "brake_overheat".to_string(),
                cause: "channel 'brake_temp' not found".to_string(),
            }]
        );
    }

    #[test]
    fn empty_rule_list_gives_empty_log() {
        let frame = oil_frame();
        let out = dispatch(&frame, &[], None, &DispatchOptions::default());
        assert!(out.log.is_empty());
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn diagnostic_display() {
        let d = RuleDiagnostic {
            rule_index: 2,
            subsystem: "Brakes".to_string(),
            rule: "lockup".to_string(),
            cause: "channel 'x' not found".to_string(),
        };
        assert_eq!(
            d.to_string(),
            "rule #2 (Brakes / lockup) skipped: channel 'x' not found"
        );
    }
}
