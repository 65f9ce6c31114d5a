//! Error types for deepmd-tuner
//!
//! This module defines all error types used throughout the library.
//!
//! Evaluation failures ([`EvaluationError`]) never escape an individual: they are
//! folded into [`Fitness::Invalid`](crate::fitness::traits::Fitness) by the
//! evaluation boundary. Everything else is a contract or configuration error and
//! surfaces as [`EvolutionError`].

use thiserror::Error;

/// Error type for genome and schema operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenomeError {
    /// Genome length does not match the schema
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The declared gene schema is inconsistent
    #[error("Schema violation: {0}")]
    SchemaViolation(String),
}

/// Error type for operator failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OperatorError {
    /// Selection operation failed
    #[error("Selection failed: {0}")]
    SelectionFailed(String),

    /// Invalid operator configuration
    #[error("Invalid operator configuration: {0}")]
    InvalidConfiguration(String),
}

/// Why a single evaluation did not produce a usable fitness
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluationError {
    /// The configuration failed its semantic pre-check
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The external evaluator reported a failure
    #[error("Evaluation failed: {0}")]
    Failed(String),

    /// The evaluation ran past its deadline
    #[error("Evaluation timed out after {elapsed_secs:.1}s (limit {limit_secs:.1}s)")]
    Timeout { elapsed_secs: f64, limit_secs: f64 },

    /// The evaluator finished without producing objective values
    #[error("Missing evaluation output: {0}")]
    MissingOutput(String),

    /// The evaluator returned NaN, infinity, or a sentinel-range value
    #[error("Unusable objective values ({0}, {1})")]
    NonFinite(f64, f64),

    /// The evaluator panicked
    #[error("Evaluator panicked: {0}")]
    Panicked(String),

    /// The training input template is malformed
    #[error("Template error: {0}")]
    Template(String),

    /// A working file or directory could not be read or written
    #[error("I/O error: {0}")]
    Io(String),
}

/// Top-level error type for tuning runs
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// Genome error
    #[error("Genome error: {0}")]
    Genome(#[from] GenomeError),

    /// Operator error
    #[error("Operator error: {0}")]
    Operator(#[from] OperatorError),

    /// The execution facility broke the batch contract
    #[error("Fitness evaluation failed: {0}")]
    FitnessEvaluation(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

/// Result type alias for operator results
pub type OperatorResult<T> = Result<T, OperatorError>;

/// Result type alias for tuning operations
pub type EvoResult<T> = Result<T, EvolutionError>;
