//! Error types for the jet engine.

use pf_fluids::FluidError;
use pf_solver::SolverError;
use thiserror::Error;

/// Result type for jet operations.
pub type JetResult<T> = Result<T, JetError>;

/// Errors surfaced by the jet pipeline.
///
/// Configuration and input-validation errors are fatal and raised before any
/// numerical work. Numerical non-convergence is recovered locally wherever a
/// defined fallback exists (flagged results, partial trajectories); it only
/// appears here when no fallback is physically meaningful.
#[derive(Error, Debug)]
pub enum JetError {
    /// Unsupported configuration (nozzle axis combination, out-of-range
    /// geometry or coefficients).
    #[error("Configuration error: {what}")]
    Configuration { what: &'static str },

    /// Malformed or physically inconsistent boundary state.
    #[error("Input validation error: {what}")]
    InputValidation { what: &'static str },

    /// Root finder or integrator failed without a defined fallback.
    #[error("Numerical non-convergence: {what}")]
    NonConvergence { what: String },

    #[error("Fluid error: {0}")]
    Fluid(#[from] FluidError),
}

impl From<SolverError> for JetError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::Fluid(f) => JetError::Fluid(f),
            other => JetError::NonConvergence {
                what: other.to_string(),
            },
        }
    }
}
