//! Equation-of-state provider trait and validation helpers.

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use crate::state::StateInput;
use pf_core::units::{Density, Pressure, Temperature, Velocity};

/// Specific enthalpy [J/kg].
///
/// Not part of uom's standard set, so we use f64 with clear documentation.
pub type SpecEnthalpy = f64;

/// Specific entropy [J/(kg·K)].
pub type SpecEntropy = f64;

/// Specific heat capacity [J/(kg·K)].
pub type SpecHeatCapacity = f64;

/// Complete resolved thermodynamic properties at one state.
///
/// Every EOS query in the engine resolves a full pack in one call: the
/// pipeline stages (orifice, nozzle, entrainment) each need several
/// properties of the same state, and the provider may be expensive.
#[derive(Clone, Copy, Debug)]
pub struct PropertyPack {
    /// Pressure [Pa]
    pub p: Pressure,
    /// Temperature [K]
    pub t: Temperature,
    /// Density [kg/m³]
    pub rho: Density,
    /// Specific enthalpy [J/kg]
    pub h: SpecEnthalpy,
    /// Specific entropy [J/(kg·K)]
    pub s: SpecEntropy,
    /// Specific heat capacity at constant pressure [J/(kg·K)]
    pub cp: SpecHeatCapacity,
    /// Heat capacity ratio γ = cp/cv (dimensionless)
    pub gamma: f64,
    /// Speed of sound [m/s]
    pub a: Velocity,
    /// Molar mass [kg/kmol]
    pub mw: f64,
}

impl PropertyPack {
    /// Return a summary string of all contained properties (for debugging).
    pub fn summary(&self) -> String {
        format!(
            "Pack(P={:.0}Pa,T={:.1}K,ρ={:.3}kg/m³,h={:.1}J/kg,s={:.1}J/kg·K,γ={:.3},a={:.0}m/s)",
            self.p.value, self.t.value, self.rho.value, self.h, self.s, self.gamma, self.a.value
        )
    }
}

/// Trait for equation-of-state providers.
///
/// Implementations must be thread-safe (Send + Sync); the engine treats the
/// provider as opaque and potentially expensive, and never assumes a specific
/// backing implementation.
pub trait EquationOfState: Send + Sync {
    /// Get the provider name (for debugging/logging).
    fn name(&self) -> &str;

    /// Check if this provider supports the given composition.
    fn supports(&self, comp: &Composition) -> bool;

    /// Resolve the full property pack from exactly two independent state
    /// variables.
    fn resolve(&self, input: StateInput, comp: &Composition) -> FluidResult<PropertyPack>;

    /// State at pressure `p` along the isentrope with specific entropy
    /// `s` [J/(kg·K)].
    ///
    /// Used by the orifice flow solver for the isentropic throat evaluation.
    fn state_at_ps(&self, p: Pressure, s: SpecEntropy, comp: &Composition)
    -> FluidResult<PropertyPack>;

    /// Temperature at which the mixture's specific enthalpy equals `h`
    /// [J/kg] at pressure `p`.
    fn temperature_from_h(
        &self,
        h: SpecEnthalpy,
        p: Pressure,
        comp: &Composition,
    ) -> FluidResult<Temperature>;
}

/// Validation helpers for fluid properties (raw SI values).
pub(crate) mod validation {
    use super::*;

    /// Ensure pressure is positive and finite.
    pub fn validate_pressure(p: f64) -> FluidResult<()> {
        if !p.is_finite() || p <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "pressure must be positive and finite",
            });
        }
        Ok(())
    }

    /// Ensure temperature is positive and finite.
    pub fn validate_temperature(t: f64) -> FluidResult<()> {
        if !t.is_finite() || t <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "temperature must be positive and finite",
            });
        }
        Ok(())
    }

    /// Ensure density is positive and finite.
    pub fn validate_density(rho: f64) -> FluidResult<()> {
        if !rho.is_finite() || rho <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "density must be positive and finite",
            });
        }
        Ok(())
    }

    /// Ensure gamma (heat capacity ratio) is physically plausible.
    pub fn validate_gamma(gamma: f64) -> FluidResult<()> {
        if !gamma.is_finite() || gamma < 1.0 {
            return Err(FluidError::NonPhysical {
                what: "gamma must be >= 1 and finite",
            });
        }
        Ok(())
    }

    /// Ensure speed of sound is positive and finite.
    pub fn validate_speed_of_sound(a: f64) -> FluidResult<()> {
        if !a.is_finite() || a <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "speed of sound must be positive and finite",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::validation::*;

    #[test]
    fn validate_positive_pressure() {
        assert!(validate_pressure(101_325.0).is_ok());
        assert!(validate_pressure(-100.0).is_err());
        assert!(validate_pressure(0.0).is_err());
        assert!(validate_pressure(f64::NAN).is_err());
    }

    #[test]
    fn validate_positive_temperature() {
        assert!(validate_temperature(300.0).is_ok());
        assert!(validate_temperature(-10.0).is_err());
        assert!(validate_temperature(0.0).is_err());
    }

    #[test]
    fn validate_gamma_physical() {
        assert!(validate_gamma(1.4).is_ok());
        assert!(validate_gamma(1.0).is_ok());
        assert!(validate_gamma(0.9).is_err());
        assert!(validate_gamma(f64::NAN).is_err());
    }
}
