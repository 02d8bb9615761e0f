//! Error types for the flame extension.

use pf_fluids::FluidError;
use pf_jet::JetError;
use pf_solver::SolverError;
use thiserror::Error;

/// Result type for flame operations.
pub type FlameResult<T> = Result<T, FlameError>;

/// Errors surfaced by the flame solver and radiation models.
#[derive(Error, Debug)]
pub enum FlameError {
    #[error("Configuration error: {what}")]
    Configuration { what: &'static str },

    #[error("Input validation error: {what}")]
    InputValidation { what: &'static str },

    #[error("Numerical non-convergence: {what}")]
    NonConvergence { what: String },

    #[error("Fluid error: {0}")]
    Fluid(#[from] FluidError),

    #[error("Jet error: {0}")]
    Jet(#[from] JetError),
}

impl From<SolverError> for FlameError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::Fluid(f) => FlameError::Fluid(f),
            other => FlameError::NonConvergence {
                what: other.to_string(),
            },
        }
    }
}
