//! Error types for solver operations.

use pf_core::error::PfError;
use pf_fluids::FluidError;
use thiserror::Error;

/// Errors that can occur during numerical solving.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("No sign change in bracket for {what}")]
    BracketFailed { what: &'static str },

    #[error("Fluid error: {0}")]
    Fluid(#[from] FluidError),

    #[error("Numeric error: {what}")]
    Numeric { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for PfError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::ProblemSetup { what: _ } => PfError::InvalidArg {
                what: "problem setup",
            },
            SolverError::ConvergenceFailed { what: _ } => PfError::InvalidArg {
                what: "convergence",
            },
            SolverError::BracketFailed { what } => PfError::InvalidArg { what },
            SolverError::Fluid(_) => PfError::InvalidArg { what: "fluid" },
            SolverError::Numeric { what: _ } => PfError::InvalidArg { what: "numeric" },
        }
    }
}
