//! pf-jet: underexpanded jet development engine.
//!
//! Pipeline: orifice flow (choked or not) → notional nozzle expansion →
//! optional initial entrainment/heating zone → flow establishment →
//! adaptive integration of the self-similar Gaussian jet.
//!
//! The crate exposes the stages individually (each is useful on its own for
//! validation work) and [`Jet::solve`] as the end-to-end entry point.

pub mod develop;
pub mod entrain;
pub mod error;
pub mod jet;
pub mod nozzle;
pub mod orifice;
pub mod results;

pub use develop::{DevelopOptions, DevelopingFlow, GaussianNode, MixtureClosure, PlugNode};
pub use entrain::{BuoyancyCoefficient, EntrainmentOptions};
pub use error::{JetError, JetResult};
pub use jet::{Jet, JetOptions, Trajectory};
pub use nozzle::{MomentumRule, NotionalNozzle, TemperatureRule};
pub use orifice::{Orifice, OrificeFlowSolver, ThroatFlow};
pub use results::{JetSummary, TrajectoryRecord};
