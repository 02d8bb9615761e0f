//! Thermodynamic state definitions.

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use crate::model::{EquationOfState, PropertyPack};
use pf_core::units::{Density, Pressure, Temperature, Velocity};

/// Phase tag carried alongside the state variables.
///
/// The built-in ideal-gas backend resolves gas states only; providers with
/// saturation handling may return the other tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Gas,
    Liquid,
    TwoPhase,
}

/// Input specification for creating a fluid state.
///
/// A state is fully determined by exactly two of {T, P, ρ}; the enum makes
/// any other combination unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateInput {
    /// Pressure and temperature.
    PT { p: Pressure, t: Temperature },
    /// Pressure and density.
    PRho { p: Pressure, rho_kg_m3: f64 },
    /// Temperature and density.
    TRho { t: Temperature, rho_kg_m3: f64 },
}

/// Immutable fluid state: resolved thermodynamic properties, composition,
/// bulk velocity, and phase tag.
///
/// "Updates" produce a new instance; there is no in-place mutation.
#[derive(Debug, Clone)]
pub struct FluidState {
    comp: Composition,
    pack: PropertyPack,
    v: Velocity,
    phase: Phase,
}

impl FluidState {
    /// Create a state by resolving `input` through the EOS provider.
    ///
    /// The fluid is created at rest; use [`FluidState::with_velocity`] to
    /// attach a bulk velocity.
    pub fn new(
        eos: &dyn EquationOfState,
        input: StateInput,
        comp: Composition,
    ) -> FluidResult<Self> {
        if !eos.supports(&comp) {
            return Err(FluidError::NotSupported {
                what: "composition not supported by EOS provider",
            });
        }
        let pack = eos.resolve(input, &comp)?;
        Ok(Self {
            comp,
            pack,
            v: pf_core::units::mps(0.0),
            phase: Phase::Gas,
        })
    }

    /// Build directly from a resolved property pack (internal transitions
    /// where the pack was just computed by the provider).
    pub fn from_pack(comp: Composition, pack: PropertyPack, v_m_s: f64, phase: Phase) -> Self {
        Self {
            comp,
            pack,
            v: pf_core::units::mps(v_m_s),
            phase,
        }
    }

    /// New state with the given bulk velocity [m/s].
    pub fn with_velocity(&self, v_m_s: f64) -> Self {
        Self {
            comp: self.comp.clone(),
            pack: self.pack,
            v: pf_core::units::mps(v_m_s),
            phase: self.phase,
        }
    }

    pub fn composition(&self) -> &Composition {
        &self.comp
    }

    pub fn properties(&self) -> &PropertyPack {
        &self.pack
    }

    pub fn temperature(&self) -> Temperature {
        self.pack.t
    }

    pub fn pressure(&self) -> Pressure {
        self.pack.p
    }

    pub fn density(&self) -> Density {
        self.pack.rho
    }

    /// Specific enthalpy [J/kg].
    pub fn h(&self) -> f64 {
        self.pack.h
    }

    /// Specific entropy [J/(kg·K)].
    pub fn s(&self) -> f64 {
        self.pack.s
    }

    /// Speed of sound.
    pub fn sound_speed(&self) -> Velocity {
        self.pack.a
    }

    /// Heat capacity ratio.
    pub fn gamma(&self) -> f64 {
        self.pack.gamma
    }

    /// Specific heat capacity at constant pressure [J/(kg·K)].
    pub fn cp(&self) -> f64 {
        self.pack.cp
    }

    /// Molar mass [kg/kmol].
    pub fn mw(&self) -> f64 {
        self.pack.mw
    }

    /// Bulk velocity.
    pub fn velocity(&self) -> Velocity {
        self.v
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Stagnation specific enthalpy h + v²/2 [J/kg].
    pub fn stagnation_enthalpy(&self) -> f64 {
        self.pack.h + 0.5 * self.v.value * self.v.value
    }
}
