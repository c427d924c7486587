//! Error types for the incidence-forecast library.

use thiserror::Error;

/// Result type alias for aggregation and forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while aggregating or forecasting.
///
/// Numerical variants (`InsufficientData`, `ZeroVariance`, `ConvergenceFailure`,
/// `ComputationError`) are absorbed by [`FallbackPolicy`](crate::models::FallbackPolicy)
/// wherever a series is forecast. `Structure` and `InvalidParameter` abort a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The series is constant, so no model can be identified.
    #[error("series has zero variance")]
    ZeroVariance,

    /// The likelihood optimizer stopped before converging.
    #[error("optimizer did not converge after {iterations} iterations")]
    ConvergenceFailure { iterations: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// Malformed dimension values or an unexpected tree shape.
    #[error("structural error: {0}")]
    Structure(String),

    /// Artifact (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ForecastError {
    /// Whether this error must abort a run rather than fall back to a default value.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ForecastError::Structure(_)
                | ForecastError::InvalidParameter(_)
                | ForecastError::Serialization(_)
        )
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ForecastError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = ForecastError::InsufficientData { needed: 2, got: 1 };
        assert_eq!(err.to_string(), "insufficient data: need at least 2, got 1");

        let err = ForecastError::ConvergenceFailure { iterations: 500 };
        assert_eq!(
            err.to_string(),
            "optimizer did not converge after 500 iterations"
        );

        let err = ForecastError::Structure("blank location".to_string());
        assert_eq!(err.to_string(), "structural error: blank location");
    }

    #[test]
    fn numerical_errors_are_not_structural() {
        assert!(!ForecastError::ZeroVariance.is_structural());
        assert!(!ForecastError::InsufficientData { needed: 2, got: 1 }.is_structural());
        assert!(!ForecastError::ConvergenceFailure { iterations: 1 }.is_structural());
        assert!(ForecastError::Structure("x".into()).is_structural());
        assert!(ForecastError::InvalidParameter("x".into()).is_structural());
    }

    #[test]
    fn json_errors_convert() {
        let err: ForecastError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, ForecastError::Serialization(_)));
    }
}
