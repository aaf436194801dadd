use std::time::Duration;
use thiserror::Error;

/// Errors produced while generating data, clustering, or scoring a clustering.
///
/// Generation, confusion-matrix and alignment errors are contract violations by the caller.
/// [`AccuracyError::DegenerateClustering`] and [`AccuracyError::ClusteringTimeout`] are expected,
/// occasional failures of a clustering run (see [`AccuracyError::is_trial_failure`]).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccuracyError {
    /// The requested cluster count was zero.
    #[error("invalid cluster count: k must be at least 1")]
    InvalidClusterCount,
    /// Two sequences (or a dimension count) that have to agree did not.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// A label outside of `[0, k)` was encountered.
    #[error("label {label} out of range for k = {k}")]
    LabelOutOfRange { label: usize, k: usize },
    /// The clustering used fewer distinct labels than requested.
    #[error("degenerate clustering: {distinct} distinct labels for k = {k}")]
    DegenerateClustering { distinct: usize, k: usize },
    /// The clustering exceeded its time limit.
    #[error("clustering timed out after {elapsed:?} (limit {limit:?})")]
    ClusteringTimeout { elapsed: Duration, limit: Duration },
    /// Any other invalid argument or configuration value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl AccuracyError {
    /// Whether this error is an expected failure of a single trial, which the
    /// [`ExperimentRunner`](crate::ExperimentRunner) records instead of aborting the grid.
    pub fn is_trial_failure(&self) -> bool {
        matches!(self, AccuracyError::DegenerateClustering { .. } | AccuracyError::ClusteringTimeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, AccuracyError>;
