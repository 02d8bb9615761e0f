//! pf-solver: numerical machinery for plumeflow.
//!
//! Root finding (bracketed and Newton), quadrature over sample meshes, and
//! adaptive Runge–Kutta integration with dense per-step output. The physics
//! crates assemble their residuals and hand them to these solvers; nothing
//! here knows about jets or flames.

pub mod error;
pub mod ode;
pub mod quadrature;
pub mod rootfind;

pub use error::{SolverError, SolverResult};
pub use ode::{AdaptiveRk45, OdeOptions, OdeSolution, OdeStatus, integrate_adaptive};
pub use quadrature::trapz;
pub use rootfind::{RootConfig, RootResult, find_root_bracketed, newton_scalar};
