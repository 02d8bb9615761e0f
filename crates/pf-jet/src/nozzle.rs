//! Notional nozzle closures.
//!
//! An underexpanded throat state is replaced by an equivalent, mass-conserving
//! flow at ambient pressure. Five published closures are expressible as two
//! independent configuration axes: how exit velocity is obtained (momentum
//! conservation vs. sonic exit) and how exit temperature is obtained (energy
//! balance, throat temperature, or stagnation temperature).

use crate::error::{JetError, JetResult};
use crate::orifice::Orifice;
use pf_core::units::{Temperature, m};
use pf_fluids::{EquationOfState, FluidState, Phase, StateInput};
use pf_solver::{RootConfig, newton_scalar};
use std::f64::consts::PI;
use tracing::debug;

/// How the exit velocity is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MomentumRule {
    /// Momentum balance across the expansion region:
    /// v_e = v_t + (P_t − P_amb)/(ρ_t v_t).
    Conserved,
    /// Exit at the local speed of sound.
    SonicExit,
}

/// How the exit temperature is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureRule {
    /// Solve the energy balance for the exit density/temperature.
    EnergyBalance,
    /// Exit fixed at the throat temperature.
    ThroatTemperature,
    /// Exit fixed at the upstream stagnation temperature.
    StagnationTemperature,
}

/// A notional nozzle model: one point on the two configuration axes.
///
/// The combination {Conserved × ThroatTemperature} has no published closure
/// and is rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotionalNozzle {
    momentum: MomentumRule,
    temperature: TemperatureRule,
}

impl NotionalNozzle {
    pub fn new(momentum: MomentumRule, temperature: TemperatureRule) -> JetResult<Self> {
        if momentum == MomentumRule::Conserved
            && temperature == TemperatureRule::ThroatTemperature
        {
            return Err(JetError::Configuration {
                what: "momentum-conserving nozzle with throat temperature is unsupported",
            });
        }
        Ok(Self {
            momentum,
            temperature,
        })
    }

    /// Momentum-conserving, energy-solved temperature.
    pub fn yuceil_otugen() -> Self {
        Self {
            momentum: MomentumRule::Conserved,
            temperature: TemperatureRule::EnergyBalance,
        }
    }

    /// Momentum-conserving, fixed stagnation temperature.
    pub fn birch2() -> Self {
        Self {
            momentum: MomentumRule::Conserved,
            temperature: TemperatureRule::StagnationTemperature,
        }
    }

    /// Sonic exit at the throat temperature.
    pub fn ewan_moodie() -> Self {
        Self {
            momentum: MomentumRule::SonicExit,
            temperature: TemperatureRule::ThroatTemperature,
        }
    }

    /// Sonic exit at the stagnation temperature.
    pub fn birch() -> Self {
        Self {
            momentum: MomentumRule::SonicExit,
            temperature: TemperatureRule::StagnationTemperature,
        }
    }

    /// Sonic exit with energy-solved temperature.
    pub fn molkov() -> Self {
        Self {
            momentum: MomentumRule::SonicExit,
            temperature: TemperatureRule::EnergyBalance,
        }
    }

    pub fn momentum(&self) -> MomentumRule {
        self.momentum
    }

    pub fn temperature(&self) -> TemperatureRule {
        self.temperature
    }

    /// Expand an underexpanded throat state to ambient pressure.
    ///
    /// Returns the expanded fluid (with exit velocity) and the equivalent,
    /// mass-conserving orifice at Cd = 1.
    pub fn expand(
        &self,
        eos: &dyn EquationOfState,
        throat: &FluidState,
        orifice: &Orifice,
        ambient: &FluidState,
        t_stagnation: Temperature,
    ) -> JetResult<(FluidState, Orifice)> {
        let p_amb = ambient.pressure();
        let p_t = throat.pressure().value;
        let rho_t = throat.density().value;
        let v_t = throat.velocity().value;
        if !(v_t.is_finite() && v_t > 0.0) {
            return Err(JetError::InputValidation {
                what: "throat state carries no valid velocity",
            });
        }
        if p_t <= p_amb.value {
            return Err(JetError::InputValidation {
                what: "throat pressure does not exceed ambient; nothing to expand",
            });
        }

        let comp = throat.composition().clone();
        let h0 = throat.stagnation_enthalpy();

        let (pack_e, v_e) = match (self.momentum, self.temperature) {
            (MomentumRule::Conserved, TemperatureRule::EnergyBalance) => {
                let v_e = v_t + (p_t - p_amb.value) / (rho_t * v_t);
                let h_target = h0 - 0.5 * v_e * v_e;
                // Root-solve exit density so the enthalpy balance holds at
                // ambient pressure.
                let rho_e = self.solve_density(eos, &comp, p_amb.value, |pack| {
                    pack.h - h_target
                })?;
                let pack = eos.resolve(
                    StateInput::PRho {
                        p: p_amb,
                        rho_kg_m3: rho_e,
                    },
                    &comp,
                )?;
                (pack, v_e)
            }
            (MomentumRule::Conserved, TemperatureRule::StagnationTemperature) => {
                let v_e = v_t + (p_t - p_amb.value) / (rho_t * v_t);
                let pack = eos.resolve(
                    StateInput::PT {
                        p: p_amb,
                        t: t_stagnation,
                    },
                    &comp,
                )?;
                (pack, v_e)
            }
            (MomentumRule::SonicExit, TemperatureRule::ThroatTemperature) => {
                let pack = eos.resolve(
                    StateInput::PT {
                        p: p_amb,
                        t: throat.temperature(),
                    },
                    &comp,
                )?;
                let v_e = pack.a.value;
                (pack, v_e)
            }
            (MomentumRule::SonicExit, TemperatureRule::StagnationTemperature) => {
                let pack = eos.resolve(
                    StateInput::PT {
                        p: p_amb,
                        t: t_stagnation,
                    },
                    &comp,
                )?;
                let v_e = pack.a.value;
                (pack, v_e)
            }
            (MomentumRule::SonicExit, TemperatureRule::EnergyBalance) => {
                // Newton iteration on density with an embedded sonic-velocity
                // evaluation: h(ρ) + a(ρ)²/2 = h0.
                let rho_e = self.solve_density(eos, &comp, p_amb.value, |pack| {
                    pack.h + 0.5 * pack.a.value * pack.a.value - h0
                })?;
                let pack = eos.resolve(
                    StateInput::PRho {
                        p: p_amb,
                        rho_kg_m3: rho_e,
                    },
                    &comp,
                )?;
                (pack, pack.a.value)
            }
            (MomentumRule::Conserved, TemperatureRule::ThroatTemperature) => {
                // Unreachable through the validated constructor.
                return Err(JetError::Configuration {
                    what: "momentum-conserving nozzle with throat temperature is unsupported",
                });
            }
        };

        if !(v_e.is_finite() && v_e > 0.0) {
            return Err(JetError::NonConvergence {
                what: format!("notional nozzle produced exit velocity {v_e}"),
            });
        }

        // Mass-conserving equivalent orifice back-solve:
        // mdot_throat = ρ_e · v_e · A_eq, Cd = 1.
        let mdot = orifice.mdot(throat).value;
        let a_eq = mdot / (pack_e.rho.value * v_e);
        let d_eq = (4.0 * a_eq / PI).sqrt();
        debug!(
            d_eq,
            v_exit = v_e,
            t_exit = pack_e.t.value,
            "notional nozzle expansion"
        );
        let equivalent = Orifice::new(m(d_eq), 1.0)?;

        Ok((
            FluidState::from_pack(comp, pack_e, v_e, Phase::Gas),
            equivalent,
        ))
    }

    /// Newton solve for exit density with numerical derivative; residual is
    /// evaluated on the full property pack at (P_amb, ρ).
    fn solve_density<F>(
        &self,
        eos: &dyn EquationOfState,
        comp: &pf_fluids::Composition,
        p_amb: f64,
        residual: F,
    ) -> JetResult<f64>
    where
        F: Fn(&pf_fluids::PropertyPack) -> f64,
    {
        let config = RootConfig {
            abs_tol: 1.0, // J/kg scale residuals
            ..RootConfig::default()
        };
        // Ambient-temperature density as the starting guess.
        let rho0 = p_amb * comp.molar_mass() / (pf_core::units::constants::R_UNIVERSAL * 293.0);

        let result = newton_scalar(
            |rho| {
                let eval = |r: f64| -> Result<f64, pf_solver::SolverError> {
                    let pack = eos.resolve(
                        StateInput::PRho {
                            p: pf_core::units::pa(p_amb),
                            rho_kg_m3: r,
                        },
                        comp,
                    )?;
                    Ok(residual(&pack))
                };
                let f = eval(rho)?;
                let dr = (rho * 1e-6).max(1e-10);
                let df = (eval(rho + dr)? - f) / dr;
                Ok((f, df))
            },
            rho0,
            Some(1e-8),
            "notional nozzle exit density",
            &config,
        )?;

        if !result.converged {
            return Err(JetError::NonConvergence {
                what: "notional nozzle density iteration did not converge".to_string(),
            });
        }
        Ok(result.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orifice::OrificeFlowSolver;
    use pf_core::units::{k, pa};
    use pf_fluids::{Composition, IdealGasModel, Species};

    fn choked_h2_throat() -> (IdealGasModel, FluidState, Orifice, FluidState) {
        let eos = IdealGasModel::new();
        let upstream = FluidState::new(
            &eos,
            StateInput::PT {
                p: pa(20.0e6),
                t: k(293.0),
            },
            Composition::pure(Species::H2),
        )
        .unwrap();
        let ambient = FluidState::new(
            &eos,
            StateInput::PT {
                p: pa(101_325.0),
                t: k(293.0),
            },
            Composition::pure(Species::Air),
        )
        .unwrap();
        let orifice = Orifice::new(m(0.002), 0.95).unwrap();
        let flow = OrificeFlowSolver::new()
            .solve(&eos, &upstream, pa(101_325.0))
            .unwrap();
        assert!(flow.choked);
        (eos, flow.fluid, orifice, ambient)
    }

    #[test]
    fn unsupported_axis_combination_is_rejected() {
        let err = NotionalNozzle::new(MomentumRule::Conserved, TemperatureRule::ThroatTemperature)
            .unwrap_err();
        assert!(matches!(err, JetError::Configuration { .. }));
    }

    #[test]
    fn named_variants_cover_the_axes() {
        assert_eq!(
            NotionalNozzle::yuceil_otugen(),
            NotionalNozzle::new(MomentumRule::Conserved, TemperatureRule::EnergyBalance).unwrap()
        );
        assert_eq!(
            NotionalNozzle::birch(),
            NotionalNozzle::new(MomentumRule::SonicExit, TemperatureRule::StagnationTemperature)
                .unwrap()
        );
    }

    #[test]
    fn all_variants_conserve_mass_through_the_equivalent_orifice() {
        let (eos, throat, orifice, ambient) = choked_h2_throat();
        let mdot_throat = orifice.mdot(&throat).value;

        for nozzle in [
            NotionalNozzle::yuceil_otugen(),
            NotionalNozzle::birch2(),
            NotionalNozzle::ewan_moodie(),
            NotionalNozzle::birch(),
            NotionalNozzle::molkov(),
        ] {
            let (fluid_e, orifice_e) = nozzle
                .expand(&eos, &throat, &orifice, &ambient, k(293.0))
                .unwrap();

            // Back-solve identity: ρ_e · v_e · A_eq == mdot_throat.
            let mdot_exit = fluid_e.density().value
                * fluid_e.velocity().value
                * orifice_e.effective_area().value;
            let rel = (mdot_exit - mdot_throat).abs() / mdot_throat;
            assert!(rel < 1e-8, "{nozzle:?}: mass defect {rel}");

            // Exit at ambient pressure with a physical diameter.
            assert!((fluid_e.pressure().value - 101_325.0).abs() < 1e-6);
            assert!(orifice_e.diameter().value > 0.0);
            assert!(orifice_e.diameter().value.is_finite());
        }
    }

    #[test]
    fn expanded_diameter_exceeds_physical_orifice_for_underexpanded_jet() {
        let (eos, throat, orifice, ambient) = choked_h2_throat();
        let (_, orifice_e) = NotionalNozzle::yuceil_otugen()
            .expand(&eos, &throat, &orifice, &ambient, k(293.0))
            .unwrap();
        assert!(orifice_e.diameter().value > orifice.diameter().value);
    }

    #[test]
    fn energy_balance_exit_is_colder_than_stagnation() {
        let (eos, throat, orifice, ambient) = choked_h2_throat();
        let (fluid_yo, _) = NotionalNozzle::yuceil_otugen()
            .expand(&eos, &throat, &orifice, &ambient, k(293.0))
            .unwrap();
        // Large exit velocity leaves little static enthalpy.
        assert!(fluid_yo.temperature().value < 293.0);
        assert!(fluid_yo.velocity().value > throat.velocity().value);
    }

    #[test]
    fn sonic_variants_exit_at_local_sound_speed() {
        let (eos, throat, orifice, ambient) = choked_h2_throat();
        for nozzle in [NotionalNozzle::ewan_moodie(), NotionalNozzle::birch()] {
            let (fluid_e, _) = nozzle
                .expand(&eos, &throat, &orifice, &ambient, k(293.0))
                .unwrap();
            let v = fluid_e.velocity().value;
            let a = fluid_e.sound_speed().value;
            assert!((v - a).abs() / a < 1e-9, "{nozzle:?}: v = {v}, a = {a}");
        }
    }

    #[test]
    fn expand_requires_underexpanded_throat() {
        let (eos, _throat, orifice, ambient) = choked_h2_throat();
        // Fabricate a throat already at ambient pressure.
        let at_ambient = FluidState::new(
            &eos,
            StateInput::PT {
                p: pa(101_325.0),
                t: k(250.0),
            },
            Composition::pure(Species::H2),
        )
        .unwrap()
        .with_velocity(300.0);
        let err = NotionalNozzle::yuceil_otugen()
            .expand(&eos, &at_ambient, &orifice, &ambient, k(293.0))
            .unwrap_err();
        assert!(matches!(err, JetError::InputValidation { .. }));
    }
}
