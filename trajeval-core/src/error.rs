//! Error types for the evaluation framework

use thiserror::Error;

/// Result type alias for evaluation operations
pub type Result<T> = std::result::Result<T, EvalError>;

/// Errors that can occur during evaluation
///
/// Structural problems with the inputs are always reported as errors, never
/// folded into a `false` score, so callers can tell "did not match" apart from
/// "could not be compared".
#[derive(Error, Debug)]
pub enum EvalError {
    /// Input could not be interpreted as a message list or trajectory
    #[error("Invalid input shape: {0}")]
    InputShape(String),

    /// A matcher needed both sides and one was absent
    #[error("Missing trajectory: {0}")]
    MissingTrajectory(String),

    /// Unrecognised match mode
    #[error("Invalid match mode: {0}")]
    InvalidMode(String),

    /// State-history provider failed
    #[error("State history provider error: {0}")]
    HistoryProvider(String),

    /// LLM judge error
    #[error("LLM judge error: {0}")]
    Judge(String),

    /// Test-tracking sink error
    #[error("Tracking error: {0}")]
    Tracking(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
