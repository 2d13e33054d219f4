//! Error types for the telemine-wavelet crate.

/// Error type for all fallible operations in the telemine-wavelet crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WaveletError {
    /// Returned when the input series is shorter than the minimum required length.
    #[error("series too short: got {len} observations, need at least {min}")]
    SeriesTooShort {
        /// Number of observations provided.
        len: usize,
        /// Minimum number of observations required.
        min: usize,
    },

    /// Returned when the input data contains non-finite values (NaN or infinity).
    #[error("input data contains non-finite values")]
    NonFiniteData,

    /// Returned when every sample of a channel is missing, so no fill value exists.
    #[error("all {len} samples are missing")]
    AllMissing {
        /// Number of samples in the channel.
        len: usize,
    },

    /// Returned when an explicitly requested decomposition level is invalid.
    #[error("level out of range: requested {requested}, supported 1..={max} for length {len}")]
    LevelOutOfRange {
        /// Level that was requested.
        requested: usize,
        /// Maximum feasible level.
        max: usize,
        /// Length of the input series.
        len: usize,
    },

    /// Returned when a sliding window of zero samples is requested.
    #[error("energy window must be at least 1 sample")]
    ZeroWindow,

    /// Returned when an unsupported wavelet filter name is provided.
    #[error("unsupported wavelet filter: {0}")]
    UnsupportedFilter(String),

    /// Returned when coefficient sets cannot be recombined.
    #[error("reconstruction failed: {0}")]
    ReconstructionFailed(String),
}
