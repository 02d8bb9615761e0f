//! Orifice geometry and the orifice flow solver.
//!
//! The flow solver computes throat conditions for a given upstream state and
//! downstream pressure: isentropic expansion to the downstream pressure when
//! the flow stays subsonic, or a bracketed root solve for the sonic pressure
//! when it chokes.

use crate::error::{JetError, JetResult};
use pf_core::units::{Area, Length, MassRate, Pressure, kgps};
use pf_fluids::{EquationOfState, FluidState, Phase};
use pf_solver::{RootConfig, SolverError, find_root_bracketed};
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Small epsilon for pressure differences (Pa)
pub const EPSILON_PRESSURE: f64 = 1e-3;

/// Orifice geometry: diameter and discharge coefficient.
///
/// Immutable; created once per scenario.
#[derive(Debug, Clone, Copy)]
pub struct Orifice {
    d: Length,
    cd: f64,
}

impl Orifice {
    /// Create a new orifice.
    ///
    /// Diameter must be positive and finite; Cd must lie in (0, 1].
    pub fn new(d: Length, cd: f64) -> JetResult<Self> {
        if !d.value.is_finite() || d.value <= 0.0 {
            return Err(JetError::Configuration {
                what: "orifice diameter must be positive and finite",
            });
        }
        if !cd.is_finite() || cd <= 0.0 || cd > 1.0 {
            return Err(JetError::Configuration {
                what: "discharge coefficient must lie in (0, 1]",
            });
        }
        Ok(Self { d, cd })
    }

    pub fn diameter(&self) -> Length {
        self.d
    }

    pub fn cd(&self) -> f64 {
        self.cd
    }

    /// Geometric area π d²/4.
    pub fn area(&self) -> Area {
        self.d * self.d * (PI / 4.0)
    }

    /// Effective (discharge) area Cd · π d²/4.
    pub fn effective_area(&self) -> Area {
        self.area() * self.cd
    }

    /// Mass flow rate ρ·v·A_eff for a fluid moving through this orifice.
    pub fn mdot(&self, fluid: &FluidState) -> MassRate {
        kgps(fluid.density().value * fluid.velocity().value * self.effective_area().value)
    }
}

/// Result of the orifice flow solve: the throat state plus flags.
#[derive(Debug, Clone)]
pub struct ThroatFlow {
    /// Fluid state at the throat, including bulk velocity.
    ///
    /// Velocity is NaN when the upstream state was physically inconsistent
    /// (stagnation enthalpy below the isentropic throat enthalpy).
    pub fluid: FluidState,
    /// True when the throat reached sonic conditions.
    pub choked: bool,
    /// Set when the choked root search failed to bracket a sign change and
    /// the downstream-pressure evaluation was used instead.
    pub fallback: bool,
}

impl ThroatFlow {
    /// True unless the solve produced the NaN-velocity invalid marker.
    pub fn is_valid(&self) -> bool {
        self.fluid.velocity().value.is_finite()
    }
}

/// Orifice flow solver.
#[derive(Debug, Clone, Default)]
pub struct OrificeFlowSolver {
    pub root: RootConfig,
}

impl OrificeFlowSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute throat conditions for `upstream` discharging against
    /// `p_downstream`.
    ///
    /// Downstream pressure above upstream pressure is rejected before any
    /// root finding. Equal pressures return the no-flow state.
    pub fn solve(
        &self,
        eos: &dyn EquationOfState,
        upstream: &FluidState,
        p_downstream: Pressure,
    ) -> JetResult<ThroatFlow> {
        let p_up = upstream.pressure().value;
        let p_down = p_downstream.value;
        if !p_down.is_finite() || p_down <= 0.0 {
            return Err(JetError::InputValidation {
                what: "downstream pressure must be positive and finite",
            });
        }
        if p_down > p_up + EPSILON_PRESSURE {
            return Err(JetError::InputValidation {
                what: "downstream pressure exceeds upstream pressure",
            });
        }

        // No pressure difference, no flow.
        if (p_up - p_down).abs() < EPSILON_PRESSURE {
            return Ok(ThroatFlow {
                fluid: upstream.with_velocity(0.0),
                choked: false,
                fallback: false,
            });
        }

        let comp = upstream.composition().clone();
        let h0 = upstream.stagnation_enthalpy();
        let s0 = upstream.s();

        // Isentropic evaluation at the downstream pressure.
        let throat = eos.state_at_ps(p_downstream, s0, &comp)?;

        if h0 < throat.h {
            // Physically inconsistent upstream state: mark, do not raise.
            warn!(
                h0,
                h_throat = throat.h,
                "stagnation enthalpy below throat enthalpy; returning invalid flow"
            );
            return Ok(ThroatFlow {
                fluid: FluidState::from_pack(comp, throat, f64::NAN, Phase::Gas),
                choked: false,
                fallback: false,
            });
        }

        let v_down = (2.0 * (h0 - throat.h)).sqrt();
        if throat.a.value > v_down {
            // Subsonic all the way to the downstream pressure.
            debug!(v = v_down, a = throat.a.value, "unchoked orifice flow");
            return Ok(ThroatFlow {
                fluid: FluidState::from_pack(comp, throat, v_down, Phase::Gas),
                choked: false,
                fallback: false,
            });
        }

        // Choked: find the pressure where the isentropic velocity matches the
        // local speed of sound.
        let residual = |p: f64| -> Result<f64, SolverError> {
            let pack = eos.state_at_ps(pf_core::units::pa(p), s0, &comp)?;
            let v = (2.0 * (h0 - pack.h).max(0.0)).sqrt();
            Ok(v - pack.a.value)
        };

        match find_root_bracketed(residual, p_down, p_up, "sonic throat pressure", &self.root) {
            Ok(root) => {
                let pack = eos.state_at_ps(pf_core::units::pa(root.x), s0, &comp)?;
                let v = (2.0 * (h0 - pack.h).max(0.0)).sqrt();
                debug!(p_throat = root.x, v, "choked orifice flow");
                Ok(ThroatFlow {
                    fluid: FluidState::from_pack(comp, pack, v, Phase::Gas),
                    choked: true,
                    fallback: false,
                })
            }
            Err(SolverError::BracketFailed { .. }) | Err(SolverError::ConvergenceFailed { .. }) => {
                // Recovered locally: downstream-pressure evaluation, flagged.
                warn!("sonic pressure search failed; falling back to downstream evaluation");
                Ok(ThroatFlow {
                    fluid: FluidState::from_pack(comp, throat, v_down, Phase::Gas),
                    choked: false,
                    fallback: true,
                })
            }
            Err(other) => Err(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_core::units::{k, m, pa};
    use pf_fluids::{Composition, FluidResult, IdealGasModel, PropertyPack, Species, StateInput};

    fn upstream(species: Species, p: f64, t: f64) -> FluidState {
        let eos = IdealGasModel::new();
        FluidState::new(
            &eos,
            StateInput::PT { p: pa(p), t: k(t) },
            Composition::pure(species),
        )
        .unwrap()
    }

    #[test]
    fn orifice_geometry() {
        let orifice = Orifice::new(m(0.001), 0.9).unwrap();
        let a = orifice.area().value;
        assert!((a - PI / 4.0 * 1e-6).abs() < 1e-12);
        assert!((orifice.effective_area().value - 0.9 * a).abs() < 1e-15);
    }

    #[test]
    fn orifice_rejects_bad_geometry() {
        assert!(Orifice::new(m(-0.001), 0.9).is_err());
        assert!(Orifice::new(m(0.0), 0.9).is_err());
        assert!(Orifice::new(m(0.001), 0.0).is_err());
        assert!(Orifice::new(m(0.001), 1.5).is_err());
    }

    #[test]
    fn no_flow_at_equal_pressures() {
        let eos = IdealGasModel::new();
        let up = upstream(Species::H2, 101_325.0, 293.0);
        let flow = OrificeFlowSolver::new()
            .solve(&eos, &up, pa(101_325.0))
            .unwrap();
        assert!(!flow.choked);
        assert!(flow.fluid.velocity().value.abs() < 1e-9);
    }

    #[test]
    fn downstream_above_upstream_rejected() {
        let eos = IdealGasModel::new();
        let up = upstream(Species::H2, 101_325.0, 293.0);
        let err = OrificeFlowSolver::new()
            .solve(&eos, &up, pa(200_000.0))
            .unwrap_err();
        assert!(matches!(err, JetError::InputValidation { .. }));
    }

    #[test]
    fn small_pressure_ratio_stays_unchoked() {
        let eos = IdealGasModel::new();
        let up = upstream(Species::CH4, 120_000.0, 293.0);
        let flow = OrificeFlowSolver::new()
            .solve(&eos, &up, pa(101_325.0))
            .unwrap();
        assert!(!flow.choked);
        assert!(!flow.fallback);
        let v = flow.fluid.velocity().value;
        assert!(v > 0.0 && v < flow.fluid.sound_speed().value);
    }

    #[test]
    fn high_pressure_hydrogen_chokes_at_sonic_velocity() {
        let eos = IdealGasModel::new();
        let up = upstream(Species::H2, 35.0e6, 293.0);
        let flow = OrificeFlowSolver::new()
            .solve(&eos, &up, pa(101_325.0))
            .unwrap();
        assert!(flow.choked);
        assert!(!flow.fallback);

        let v = flow.fluid.velocity().value;
        let a = flow.fluid.sound_speed().value;
        assert!((v - a).abs() / a < 1e-4, "v = {v}, a = {a}");

        // Throat pressure sits between ambient and storage, near the ideal
        // critical ratio (~0.53 of upstream for γ ≈ 1.4).
        let p_throat = flow.fluid.pressure().value;
        assert!(p_throat > 101_325.0 && p_throat < 35.0e6);
        assert!((p_throat / 35.0e6 - 0.528).abs() < 0.02, "p* = {p_throat}");

        // Throat is colder than storage.
        assert!(flow.fluid.temperature().value < 293.0);
    }

    /// EOS stub whose isentrope reports inflated enthalpy, producing the
    /// physically inconsistent h0 < h_throat branch.
    struct InflatedEnthalpy(IdealGasModel);

    impl EquationOfState for InflatedEnthalpy {
        fn name(&self) -> &str {
            "inflated"
        }
        fn supports(&self, comp: &Composition) -> bool {
            self.0.supports(comp)
        }
        fn resolve(&self, input: StateInput, comp: &Composition) -> FluidResult<PropertyPack> {
            self.0.resolve(input, comp)
        }
        fn state_at_ps(
            &self,
            p: Pressure,
            s: f64,
            comp: &Composition,
        ) -> FluidResult<PropertyPack> {
            let mut pack = self.0.state_at_ps(p, s, comp)?;
            pack.h += 1.0e9;
            Ok(pack)
        }
        fn temperature_from_h(
            &self,
            h: f64,
            p: Pressure,
            comp: &Composition,
        ) -> FluidResult<pf_core::units::Temperature> {
            self.0.temperature_from_h(h, p, comp)
        }
    }

    #[test]
    fn inconsistent_upstream_marks_invalid_instead_of_raising() {
        let eos = InflatedEnthalpy(IdealGasModel::new());
        let up = upstream(Species::H2, 1.0e6, 293.0);
        let flow = OrificeFlowSolver::new()
            .solve(&eos, &up, pa(101_325.0))
            .unwrap();
        assert!(!flow.is_valid());
        assert!(flow.fluid.velocity().value.is_nan());
        assert!(!flow.choked);
    }
}
