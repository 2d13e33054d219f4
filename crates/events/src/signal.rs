//! Stateless detection primitives over aligned sample vectors.
//!
//! Primitives return row indices (or typed transitions); turning them into
//! labelled records is the classifier's job.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EventError;
use crate::frame::{Channel, Sample};
use crate::peaks::find_peaks;

/// Comparison operator of a threshold condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Comparator {
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    Equal,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Greater => ">",
            Self::Less => "<",
            Self::GreaterEqual => ">=",
            Self::LessEqual => "<=",
            Self::Equal => "==",
        }
    }

    /// Evaluates `value <op> threshold`. NaN never satisfies a condition.
    pub fn test(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Greater => value > threshold,
            Self::Less => value < threshold,
            Self::GreaterEqual => value >= threshold,
            Self::LessEqual => value <= threshold,
            Self::Equal => value == threshold,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparator {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(Self::Greater),
            "<" => Ok(Self::Less),
            ">=" => Ok(Self::GreaterEqual),
            "<=" => Ok(Self::LessEqual),
            "==" => Ok(Self::Equal),
            other => Err(EventError::UnknownComparator(other.to_string())),
        }
    }
}

impl TryFrom<String> for Comparator {
    type Error = EventError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Comparator> for String {
    fn from(c: Comparator) -> Self {
        c.symbol().to_string()
    }
}

/// How several condition masks are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CombineMode {
    /// Logical AND.
    #[default]
    All,
    /// Logical OR.
    Any,
}

impl FromStr for CombineMode {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "any" => Ok(Self::Any),
            _ => Err(EventError::UnknownCombineMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for CombineMode {
    type Error = EventError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CombineMode> for String {
    fn from(m: CombineMode) -> Self {
        match m {
            CombineMode::All => "all".to_string(),
            CombineMode::Any => "any".to_string(),
        }
    }
}

/// A value change between two consecutive rows.
///
/// `from` is `None` for the synthetic start transition at row 0.
#[derive(Clone, Debug, PartialEq)]
pub struct StateTransition {
    pub index: usize,
    pub from: Option<Sample>,
    pub to: Sample,
}

impl StateTransition {
    pub fn is_start(&self) -> bool {
        self.from.is_none()
    }

    /// `Some(true)` for `False->True`, `Some(false)` for `True->False`,
    /// `None` for anything else.
    pub fn boolean_edge(&self) -> Option<bool> {
        match (&self.from, &self.to) {
            (Some(Sample::Bool(false)), Sample::Bool(true)) => Some(true),
            (Some(Sample::Bool(true)), Sample::Bool(false)) => Some(false),
            _ => None,
        }
    }

    /// Activity label: `"{prefix} Start"` or `"{prefix} {from}->{to}"`.
    pub fn label(&self, prefix: &str) -> String {
        match &self.from {
            None => format!("{prefix} Start"),
            Some(from) => format!("{prefix} {from}->{}", self.to),
        }
    }
}

/// Elementwise `values <op> threshold`.
pub fn compare(values: &[f64], comparator: Comparator, threshold: f64) -> Vec<bool> {
    values
        .iter()
        .map(|&v| comparator.test(v, threshold))
        .collect()
}

/// Combines equally long masks with AND or OR. An empty list yields an
/// empty mask.
pub fn combine(masks: &[Vec<bool>], mode: CombineMode) -> Vec<bool> {
    let Some((first, rest)) = masks.split_first() else {
        return Vec::new();
    };
    let mut combined = first.clone();
    for mask in rest {
        for (c, &m) in combined.iter_mut().zip(mask) {
            *c = match mode {
                CombineMode::All => *c && m,
                CombineMode::Any => *c || m,
            };
        }
    }
    combined
}

/// Indices where `mask` is true and the previous sample is false or absent.
pub fn rising_edges(mask: &[bool]) -> Vec<usize> {
    let mut prev = false;
    let mut edges = Vec::new();
    for (i, &m) in mask.iter().enumerate() {
        if m && !prev {
            edges.push(i);
        }
        prev = m;
    }
    edges
}

/// Keeps the edges whose mask stays true for `min_duration` consecutive
/// samples starting at the edge. Runs cut short by the end of the series
/// are not confirmed.
pub fn confirm_duration(mask: &[bool], edges: &[usize], min_duration: usize) -> Vec<usize> {
    if min_duration <= 1 {
        return edges.to_vec();
    }
    edges
        .iter()
        .copied()
        .filter(|&e| {
            e + min_duration <= mask.len() && mask[e..e + min_duration].iter().all(|&m| m)
        })
        .collect()
}

/// Rising edges of `values <op> threshold` lasting at least
/// `min_duration` samples.
pub fn threshold_crossings(
    values: &[f64],
    comparator: Comparator,
    threshold: f64,
    min_duration: usize,
) -> Vec<usize> {
    let mask = compare(values, comparator, threshold);
    let edges = rising_edges(&mask);
    confirm_duration(&mask, &edges, min_duration)
}

/// Every row whose value differs from the previous row, plus a start
/// transition at row 0.
///
/// With `ignore_missing`, changes into or out of a missing sample are
/// skipped. Otherwise a missing sample equals only another missing sample.
pub fn value_transitions(channel: &Channel, ignore_missing: bool) -> Vec<StateTransition> {
    let n = channel.len();
    if n == 0 {
        return Vec::new();
    }
    let mut out = vec![StateTransition {
        index: 0,
        from: None,
        to: channel.sample(0),
    }];
    let mut prev = channel.sample(0);
    for i in 1..n {
        let curr = channel.sample(i);
        let changed = curr != prev;
        let skip = ignore_missing && (curr.is_missing() || prev.is_missing());
        if changed && !skip {
            out.push(StateTransition {
                index: i,
                from: Some(prev.clone()),
                to: curr.clone(),
            });
        }
        prev = curr;
    }
    out
}

/// Local maxima and minima of `values`, each at least `distance` samples
/// from a higher (or lower) neighbour and with at least `prominence`.
/// Missing samples count as zero.
pub fn local_extrema(values: &[f64], distance: usize, prominence: f64) -> (Vec<usize>, Vec<usize>) {
    let filled: Vec<f64> = values
        .iter()
        .map(|&v| if v.is_nan() { 0.0 } else { v })
        .collect();
    let negated: Vec<f64> = filled.iter().map(|v| -v).collect();
    (
        find_peaks(&filled, distance, prominence),
        find_peaks(&negated, distance, prominence),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparator_parse_roundtrip() {
        for s in [">", "<", ">=", "<=", "=="] {
            let c: Comparator = s.parse().unwrap();
            assert_eq!(c.symbol(), s);
        }
        assert!(matches!(
            "!=".parse::<Comparator>(),
            Err(EventError::UnknownComparator(ref s)) if s == "!="
        ));
    }

    #[test]
    fn nan_never_matches() {
        for c in [
            Comparator::Greater,
            Comparator::Less,
            Comparator::GreaterEqual,
            Comparator::LessEqual,
            Comparator::Equal,
        ] {
            assert!(!c.test(f64::NAN, 0.0));
        }
    }

    #[test]
    fn combine_mode_parse() {
        assert_eq!("ALL".parse::<CombineMode>().unwrap(), CombineMode::All);
        assert_eq!("any".parse::<CombineMode>().unwrap(), CombineMode::Any);
        assert!(matches!(
            "xor".parse::<CombineMode>(),
            Err(EventError::UnknownCombineMode(_))
        ));
    }

    #[test]
    fn rising_edges_only_false_to_true() {
        let mask = [true, true, false, true, false, false, true];
        assert_eq!(rising_edges(&mask), vec![0, 3, 6]);
        assert!(rising_edges(&[false, false]).is_empty());
    }

    #[test]
    fn min_duration_exact_and_short_runs() {
        // runs: [1..3) len 2, [4..7) len 3
        let values = [0.0, 5.0, 5.0, 0.0, 5.0, 5.0, 5.0, 0.0];
        assert_eq!(threshold_crossings(&values, Comparator::Greater, 1.0, 1), vec![1, 4]);
        assert_eq!(threshold_crossings(&values, Comparator::Greater, 1.0, 3), vec![4]);
        assert!(threshold_crossings(&values, Comparator::Greater, 1.0, 4).is_empty());
    }

    #[test]
    fn min_duration_run_cut_by_series_end() {
        let values = [0.0, 0.0, 5.0, 5.0];
        assert!(threshold_crossings(&values, Comparator::GreaterEqual, 5.0, 3).is_empty());
        assert_eq!(threshold_crossings(&values, Comparator::GreaterEqual, 5.0, 2), vec![2]);
    }

    #[test]
    fn combine_all_and_any() {
        let a = vec![true, true, false, false];
        let b = vec![true, false, true, false];
        assert_eq!(
            combine(&[a.clone(), b.clone()], CombineMode::All),
            vec![true, false, false, false]
        );
        assert_eq!(combine(&[a, b], CombineMode::Any), vec![true, true, true, false]);
        assert!(combine(&[], CombineMode::All).is_empty());
    }

    #[test]
    fn transitions_count_changes_plus_start() {
        let ch = Channel::Numeric(vec![1.0, 1.0, 2.0, 2.0, 3.0, 1.0]);
        let t = value_transitions(&ch, true);
        assert_eq!(t.len(), 4);
        assert!(t[0].is_start());
        assert_eq!(t.iter().map(|s| s.index).collect::<Vec<_>>(), vec![0, 2, 4, 5]);
        assert_eq!(t[1].label("gear"), "gear 1->2");
    }

    #[test]
    fn transitions_ignore_missing() {
        let ch = Channel::Numeric(vec![1.0, f64::NAN, 2.0, 2.0]);
        let ignoring = value_transitions(&ch, true);
        assert_eq!(ignoring.len(), 1);
        let strict = value_transitions(&ch, false);
        assert_eq!(strict.iter().map(|s| s.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(strict[1].label("p"), "p 1->nan");
    }

    #[test]
    fn missing_equals_missing_when_strict() {
        let ch = Channel::Numeric(vec![f64::NAN, f64::NAN, 1.0]);
        let t = value_transitions(&ch, false);
        assert_eq!(t.iter().map(|s| s.index).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn boolean_transition_labels_and_edges() {
        let ch = Channel::Boolean(vec![Some(false), Some(true), Some(true), Some(false)]);
        let t = value_transitions(&ch, true);
        assert_eq!(t.len(), 3);
        assert_eq!(t[0].label("low_oil"), "low_oil Start");
        assert_eq!(t[0].boolean_edge(), None);
        assert_eq!(t[1].label("low_oil"), "low_oil False->True");
        assert_eq!(t[1].boolean_edge(), Some(true));
        assert_eq!(t[2].label("low_oil"), "low_oil True->False");
        assert_eq!(t[2].boolean_edge(), Some(false));
    }

    #[test]
    fn categorical_labels() {
        let ch = Channel::Categorical(vec![Some("N".into()), Some("D".into())]);
        let t = value_transitions(&ch, true);
        assert_eq!(t[1].label("mode"), "mode N->D");
    }

    #[test]
    fn extrema_treat_missing_as_zero() {
        let values = [1.0, 3.0, 1.0, f64::NAN, 1.0, 4.0, 1.0];
        let (maxima, minima) = local_extrema(&values, 1, 0.5);
        assert_eq!(maxima, vec![1, 5]);
        assert_eq!(minima, vec![3]);
    }

    #[test]
    fn comparator_serde_as_symbol() {
        let c: Comparator = serde_json::from_str("\">=\"").unwrap();
        assert_eq!(c, Comparator::GreaterEqual);
        assert_eq!(serde_json::to_string(&c).unwrap(), "\">=\"");
        assert!(serde_json::from_str::<Comparator>("\"=>\"").is_err());
    }
}
