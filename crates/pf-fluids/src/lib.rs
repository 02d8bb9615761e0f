//! pf-fluids: fluid and fuel properties for plumeflow.
//!
//! Provides:
//! - Chemical species definitions (H2, CH4, C3H8, air, products)
//! - Fuel/combustion property catalog (heats of combustion, flammability limits)
//! - Composition handling (pure fluids and mixtures)
//! - Immutable fluid state representation
//! - `EquationOfState` trait for property providers
//! - Built-in ideal-gas backend; optional CoolProp backend (`coolprop` feature)
//!
//! # Architecture
//!
//! The `EquationOfState` trait isolates the rest of plumeflow from the
//! property backend. The built-in ideal-gas model is the default; real-fluid
//! behavior comes from CoolProp (via `rfluids`) when the `coolprop` feature
//! is enabled.
//!
//! # Example
//!
//! ```
//! use pf_core::units::{k, pa};
//! use pf_fluids::{Composition, FluidState, IdealGasModel, Species, StateInput};
//!
//! let eos = IdealGasModel::new();
//! let comp = Composition::pure(Species::H2);
//! let state = FluidState::new(
//!     &eos,
//!     StateInput::PT {
//!         p: pa(35.0e6),
//!         t: k(293.0),
//!     },
//!     comp,
//! )
//! .unwrap();
//! assert!(state.density().value > 0.0);
//! ```

pub mod composition;
#[cfg(feature = "coolprop")]
pub mod coolprop;
pub mod error;
pub mod fuel;
pub mod ideal;
pub mod model;
pub mod species;
pub mod state;

// Re-exports for ergonomics
pub use composition::{Composition, binary_molar_mass};
#[cfg(feature = "coolprop")]
pub use coolprop::CoolPropModel;
pub use error::{FluidError, FluidResult};
pub use fuel::{FuelProperties, N2_PER_O2, X_O2_AIR};
pub use ideal::IdealGasModel;
pub use model::{EquationOfState, PropertyPack, SpecEnthalpy, SpecEntropy, SpecHeatCapacity};
pub use species::Species;
pub use state::{FluidState, Phase, StateInput};
