//! pf-flame: flame extension of the jet engine.
//!
//! Wraps the developing-flow pipeline with a combustion chemistry closure,
//! integrates the reacting plume, evaluates closed-form flame-geometry
//! correlations, and exposes two radiative heat-flux models for the risk
//! layer.

pub mod chemistry;
pub mod error;
pub mod flame;
pub mod radiation;

pub use chemistry::{ChemistryKey, ChemistryTolerances, CombustionChemistry};
pub use error::{FlameError, FlameResult};
pub use flame::{Flame, FlameOptions, FlameScalars, FlameTrajectory};
pub use radiation::{MultiPointConfig, RadiationModel, TransmissivityModel};
