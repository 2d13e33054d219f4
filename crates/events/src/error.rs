//! Event detection error types.

use telemine_wavelet::WaveletError;

/// Errors raised by detection primitives, the classifier and rule
/// conversion. The dispatcher turns these into diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Comparator string outside `>`, `<`, `>=`, `<=`, `==`.
    #[error("unknown comparator '{0}'")]
    UnknownComparator(String),

    /// Combine mode outside `all`, `any`.
    #[error("unknown combine mode '{0}'")]
    UnknownCombineMode(String),

    /// A referenced channel is not in the table.
    #[error("channel '{0}' not found")]
    MissingChannel(String),

    /// A channel's length differs from the time axis.
    #[error("channel '{channel}' has {len} samples, time axis has {expected}")]
    LengthMismatch {
        channel: String,
        len: usize,
        expected: usize,
    },

    /// Timestamps decrease at the given row.
    #[error("time axis is not sorted: row {index} goes back in time")]
    UnsortedTime { index: usize },

    /// The operation cannot run on this kind of channel.
    #[error("channel '{channel}' is {kind}, expected {expected}")]
    UnsupportedChannelKind {
        channel: String,
        kind: &'static str,
        expected: &'static str,
    },

    /// A rule names a detection method that does not exist.
    #[error("unknown detection method '{0}'")]
    UnknownMethod(String),

    /// A rule names a transition type that does not exist.
    #[error("unknown transition type '{0}'")]
    UnknownTransitionType(String),

    /// A configuration entry does not have the shape of a rule.
    #[error("malformed rule entry: {0}")]
    MalformedRule(String),

    /// Rule arguments do not match the method's argument shape.
    #[error("invalid arguments for '{method}': {reason}")]
    InvalidArgs { method: String, reason: String },

    /// An energy rule was dispatched without a wavelet engine.
    #[error("method '{0}' requires a wavelet engine")]
    EngineUnavailable(String),

    /// Wavelet decomposition failed.
    #[error(transparent)]
    Wavelet(#[from] WaveletError),
}
