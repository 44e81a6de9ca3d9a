use thiserror::Error;

use crate::types::CandidateDiagnostic;

#[derive(Error, Debug, Clone)]
pub enum ArmaError {
    #[error("parameter length mismatch: expected {expected}, got {got}")]
    ParamLengthMismatch { expected: usize, got: usize },

    #[error("numerical instability at t={t}: {detail}")]
    NumericalInstability { t: usize, detail: String },

    #[error("degenerate likelihood: {0}")]
    DegenerateLikelihood(String),

    #[error("optimization failed: {0}")]
    OptimizationFailed(String),

    #[error("no feasible model among {} candidate orders", diagnostics.len())]
    NoFeasibleModel { diagnostics: Vec<CandidateDiagnostic> },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("data error: {0}")]
    DataError(String),
}

pub type Result<T> = std::result::Result<T, ArmaError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArmaOrder, CandidateStatus};

    #[test]
    fn test_display_numerical_instability() {
        let err = ArmaError::NumericalInstability {
            t: 3,
            detail: "innovation variance is not positive".into(),
        };
        assert_eq!(
            err.to_string(),
            "numerical instability at t=3: innovation variance is not positive"
        );
    }

    #[test]
    fn test_display_no_feasible_model() {
        let diagnostics = vec![
            CandidateDiagnostic::failed(ArmaOrder::new(0, 0), "degenerate"),
            CandidateDiagnostic::failed(ArmaOrder::new(1, 0), "degenerate"),
        ];
        let err = ArmaError::NoFeasibleModel { diagnostics };
        assert_eq!(err.to_string(), "no feasible model among 2 candidate orders");
        if let ArmaError::NoFeasibleModel { diagnostics } = err {
            assert!(diagnostics
                .iter()
                .all(|d| d.status == CandidateStatus::Failed));
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_impl<T: std::error::Error + Send + Sync>() {}
        assert_impl::<ArmaError>();
    }
}
