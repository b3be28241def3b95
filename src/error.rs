//! Error types for the tsanalysis library.

use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur during analysis operations.
///
/// Every failure is reported synchronously to the caller; no operation
/// substitutes a default for an undefined statistic.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Input string did not match the supplied date format.
    #[error("format mismatch for input '{input}': {detail}")]
    FormatMismatch { input: String, detail: String },

    /// The requested statistic is undefined for this input
    /// (e.g., circular mean of cancelling directions, zero-variance regressor).
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// Iterative fit exhausted its iteration budget.
    #[error("failed to converge within {iterations} iterations")]
    NotConverged { iterations: usize },

    /// Invalid configuration parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between paired inputs.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}
