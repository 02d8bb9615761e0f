//! Developing-flow pipeline.
//!
//! Sequences orifice flow → notional nozzle (when underexpanded) → optional
//! initial entrainment/heating zone (cold plumes) → flow-establishment
//! transform. The output seeds the Gaussian integral solver.

use crate::entrain::EntrainmentOptions;
use crate::error::{JetError, JetResult};
use crate::nozzle::NotionalNozzle;
use crate::orifice::{EPSILON_PRESSURE, Orifice, OrificeFlowSolver};
use pf_core::units::constants::R_UNIVERSAL;
use pf_core::units::{MassRate, Temperature, k, m};
use pf_fluids::{EquationOfState, FluidState, StateInput};
use pf_solver::{RootConfig, find_root_bracketed};
use std::f64::consts::PI;
use tracing::debug;

/// Uniform ("plug") flow cross-section.
#[derive(Debug, Clone, Copy)]
pub struct PlugNode {
    /// Diameter [m]
    pub d: f64,
    /// Bulk velocity [m/s]
    pub v: f64,
    /// Density [kg/m³]
    pub rho: f64,
    /// Mass fraction of released fluid
    pub y_fuel: f64,
    /// Temperature [K]
    pub t: f64,
    /// Release angle [rad]
    pub theta: f64,
    /// Position [m]
    pub x: f64,
    pub y: f64,
    /// Cumulative arc length [m]
    pub s: f64,
}

/// Self-similar turbulent cross-section.
#[derive(Debug, Clone, Copy)]
pub struct GaussianNode {
    /// Gaussian halfwidth B [m]
    pub b: f64,
    /// Centerline velocity [m/s]
    pub v_cl: f64,
    /// Centerline density [kg/m³]
    pub rho_cl: f64,
    /// Centerline mass fraction of released fluid
    pub y_cl: f64,
    /// Trajectory angle [rad]
    pub theta: f64,
    /// Position [m]
    pub x: f64,
    pub y: f64,
    /// Cumulative arc length [m]
    pub s: f64,
}

/// Ideal-gas closure tying centerline density to centerline mass fraction.
///
/// The mixing temperature interpolates between the released plug stream and
/// ambient air using their heat capacities; molar mass follows from the
/// binary mass-fraction blend.
#[derive(Debug, Clone, Copy)]
pub struct MixtureClosure {
    /// Ambient pressure [Pa]
    pub p: f64,
    /// Released-stream state at the end of the developing zone
    pub t_plug: f64,
    pub cp_plug: f64,
    pub y_plug: f64,
    /// Molar mass of the released fluid [kg/kmol]
    pub mw_fuel: f64,
    /// Ambient state
    pub t_amb: f64,
    pub cp_amb: f64,
    pub mw_amb: f64,
}

impl MixtureClosure {
    /// Mixing temperature [K] at released-fluid mass fraction y.
    pub fn temperature(&self, y: f64) -> f64 {
        // Fraction of the plug stream in the local mixture.
        let beta = (y / self.y_plug).clamp(0.0, 1.0);
        let weight_plug = beta * self.cp_plug;
        let weight_amb = (1.0 - beta) * self.cp_amb;
        (weight_plug * self.t_plug + weight_amb * self.t_amb) / (weight_plug + weight_amb)
    }

    /// Mixture molar mass [kg/kmol] at released-fluid mass fraction y.
    pub fn molar_mass(&self, y: f64) -> f64 {
        let y = y.clamp(0.0, 1.0);
        1.0 / (y / self.mw_fuel + (1.0 - y) / self.mw_amb)
    }

    /// Mixture density [kg/m³] at released-fluid mass fraction y.
    pub fn density(&self, y: f64) -> f64 {
        self.p * self.molar_mass(y) / (R_UNIVERSAL * self.temperature(y))
    }

    /// dρ/dY by central difference.
    pub fn drho_dy(&self, y: f64) -> f64 {
        let dy = 1e-7;
        let lo = (y - dy).max(0.0);
        let hi = (y + dy).min(1.0);
        (self.density(hi) - self.density(lo)) / (hi - lo)
    }

    /// Mole fraction of released fluid corresponding to mass fraction y.
    pub fn mole_fraction(&self, y: f64) -> f64 {
        y.clamp(0.0, 1.0) * self.molar_mass(y) / self.mw_fuel
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone, Copy)]
pub struct DevelopOptions {
    pub nozzle: NotionalNozzle,
    /// Release angle from horizontal [rad]
    pub theta0: f64,
    /// Entrainment/heating zone trigger: entered when the post-expansion
    /// temperature falls below this value.
    pub min_temperature: Temperature,
    /// Gaussian profile spread ratio λ (scalar profiles wider than velocity).
    pub lambda: f64,
    /// Flow establishment distance as a multiple of the effective diameter.
    pub establishment_multiple: f64,
    /// Entrainment closure (momentum coefficient also sets the heating-zone
    /// length scale).
    pub entrainment: EntrainmentOptions,
}

impl Default for DevelopOptions {
    fn default() -> Self {
        Self {
            nozzle: NotionalNozzle::yuceil_otugen(),
            theta0: 0.0,
            min_temperature: k(60.0),
            lambda: 1.16,
            establishment_multiple: 6.2,
            entrainment: EntrainmentOptions::default(),
        }
    }
}

/// The resolved developing flow: ordered node sequence plus the
/// post-expansion fluid/orifice pair. Built once; never mutated.
#[derive(Debug, Clone)]
pub struct DevelopingFlow {
    orifice_node: PlugNode,
    expanded_node: PlugNode,
    entrained_node: Option<PlugNode>,
    established: GaussianNode,
    fluid_exp: FluidState,
    orifice_exp: Orifice,
    mdot: MassRate,
    choked: bool,
    fallback: bool,
    closure: MixtureClosure,
    lambda: f64,
}

impl DevelopingFlow {
    /// Run the pipeline for an upstream state discharging through `orifice`
    /// into `ambient`.
    pub fn new(
        eos: &dyn EquationOfState,
        upstream: &FluidState,
        orifice: &Orifice,
        ambient: &FluidState,
        options: &DevelopOptions,
    ) -> JetResult<Self> {
        if !(options.lambda > 1.0) {
            return Err(JetError::Configuration {
                what: "profile spread ratio lambda must exceed 1",
            });
        }
        if !(options.establishment_multiple > 0.0) {
            return Err(JetError::Configuration {
                what: "establishment distance multiple must be positive",
            });
        }

        // Stage 1: orifice flow.
        let throat = OrificeFlowSolver::new().solve(eos, upstream, ambient.pressure())?;
        if !throat.is_valid() {
            return Err(JetError::InputValidation {
                what: "upstream state is physically inconsistent with the downstream pressure",
            });
        }
        let mdot = orifice.mdot(&throat.fluid);

        // Discharge coefficient folds into an effective throat diameter.
        let d_throat_eff = orifice.diameter().value * orifice.cd().sqrt();
        let orifice_node = PlugNode {
            d: d_throat_eff,
            v: throat.fluid.velocity().value,
            rho: throat.fluid.density().value,
            y_fuel: 1.0,
            t: throat.fluid.temperature().value,
            theta: options.theta0,
            x: 0.0,
            y: 0.0,
            s: 0.0,
        };

        // Stage 2: notional nozzle, only while underexpanded.
        let (fluid_exp, orifice_exp) =
            if throat.fluid.pressure().value > ambient.pressure().value + EPSILON_PRESSURE {
                options.nozzle.expand(
                    eos,
                    &throat.fluid,
                    orifice,
                    ambient,
                    upstream.temperature(),
                )?
            } else {
                (
                    throat.fluid.clone(),
                    Orifice::new(m(d_throat_eff), 1.0)?,
                )
            };

        let expanded_node = PlugNode {
            d: orifice_exp.diameter().value,
            v: fluid_exp.velocity().value,
            rho: fluid_exp.density().value,
            y_fuel: 1.0,
            t: fluid_exp.temperature().value,
            theta: options.theta0,
            x: orifice_node.x,
            y: orifice_node.y,
            s: orifice_node.s,
        };

        // Stage 3: initial entrainment and heating, for cold plumes only.
        let entrained_node = if expanded_node.t < options.min_temperature.value {
            Some(Self::entrainment_zone(
                eos,
                upstream,
                ambient,
                &expanded_node,
                mdot.value,
                options,
            )?)
        } else {
            None
        };

        // Stage 4: flow establishment, always.
        let plug = entrained_node.as_ref().unwrap_or(&expanded_node);
        let (established, closure) = Self::establish(upstream, ambient, plug, options);
        debug!(
            b0 = established.b,
            v_cl0 = established.v_cl,
            y_cl0 = established.y_cl,
            s0 = established.s,
            "flow established"
        );

        Ok(Self {
            orifice_node,
            expanded_node,
            entrained_node,
            established,
            fluid_exp,
            orifice_exp,
            mdot,
            choked: throat.choked,
            fallback: throat.fallback,
            closure,
            lambda: options.lambda,
        })
    }

    /// Root-solve the released-fluid mass fraction Y that brings the mixture
    /// up to the minimum temperature by adiabatic mixing with ambient air,
    /// with the entrained air contributing mass but no momentum.
    fn entrainment_zone(
        eos: &dyn EquationOfState,
        upstream: &FluidState,
        ambient: &FluidState,
        expanded: &PlugNode,
        mdot: f64,
        options: &DevelopOptions,
    ) -> JetResult<PlugNode> {
        let p_amb = ambient.pressure();
        let t_min = options.min_temperature.value;
        let released = upstream.composition().clone();
        let air = ambient.composition().clone();
        let v_exp = expanded.v;
        let ke_exp = 0.5 * v_exp * v_exp;

        let h_rel_cold = eos
            .resolve(
                StateInput::PT {
                    p: p_amb,
                    t: k(expanded.t),
                },
                &released,
            )?
            .h;
        let h_rel_min = eos
            .resolve(StateInput::PT { p: p_amb, t: k(t_min) }, &released)?
            .h;
        let h_air_amb = ambient.h();
        let h_air_min = eos
            .resolve(StateInput::PT { p: p_amb, t: k(t_min) }, &air)?
            .h;

        // Energy balance per unit mixture mass; momentum gives v(Y) = Y·v_exp.
        let residual = |y_fuel: f64| -> Result<f64, pf_solver::SolverError> {
            let inflow = y_fuel * (h_rel_cold + ke_exp) + (1.0 - y_fuel) * h_air_amb;
            let mixed =
                y_fuel * h_rel_min + (1.0 - y_fuel) * h_air_min + y_fuel * y_fuel * ke_exp;
            Ok(inflow - mixed)
        };

        let root = find_root_bracketed(
            residual,
            1e-6,
            1.0 - 1e-9,
            "heating-zone entrained mass fraction",
            &RootConfig {
                abs_tol: 1.0,
                ..RootConfig::default()
            },
        )?;
        let y_fuel = root.x;

        let mw_mix =
            1.0 / (y_fuel / upstream.mw() + (1.0 - y_fuel) / ambient.mw());
        let rho = p_amb.value * mw_mix / (R_UNIVERSAL * t_min);
        let v = y_fuel * v_exp;
        let mdot_total = mdot / y_fuel;
        let d = (4.0 * mdot_total / (PI * rho * v)).sqrt();

        // Arc length consumed: entrained air mass over the momentum-scaled
        // entrainment rate.
        let rho_amb = ambient.density().value;
        let e_mom = options.entrainment.momentum_rate(mdot, v_exp, rho_amb);
        let mdot_air = mdot * (1.0 - y_fuel) / y_fuel;
        let ds = mdot_air / (rho_amb * e_mom);
        debug!(y_fuel, t_min, ds, "initial entrainment/heating zone resolved");

        Ok(PlugNode {
            d,
            v,
            rho,
            y_fuel,
            t: t_min,
            theta: expanded.theta,
            x: expanded.x + ds * expanded.theta.cos(),
            y: expanded.y + ds * expanded.theta.sin(),
            s: expanded.s + ds,
        })
    }

    /// Closed-form flow establishment at a fixed multiple of the effective
    /// diameter: mass and momentum conservation with spread ratio λ map the
    /// plug cross-section onto the initial Gaussian cross-section.
    fn establish(
        upstream: &FluidState,
        ambient: &FluidState,
        plug: &PlugNode,
        options: &DevelopOptions,
    ) -> (GaussianNode, MixtureClosure) {
        let lambda2 = options.lambda * options.lambda;

        let cp_plug =
            plug.y_fuel * upstream.cp() + (1.0 - plug.y_fuel) * ambient.cp();
        let closure = MixtureClosure {
            p: ambient.pressure().value,
            t_plug: plug.t,
            cp_plug,
            y_plug: plug.y_fuel,
            mw_fuel: upstream.mw(),
            t_amb: ambient.temperature().value,
            cp_amb: ambient.cp(),
            mw_amb: ambient.mw(),
        };

        // Fuel mass conservation with the centerline velocity carried over:
        // Y_cl = Y_plug (1+λ²)/(2λ²); momentum closes the halfwidth.
        let y_cl = plug.y_fuel * (1.0 + lambda2) / (2.0 * lambda2);
        let rho_cl = closure.density(y_cl);
        let b = plug.d * (plug.rho / (2.0 * rho_cl)).sqrt();
        let v_cl = plug.v;

        let ds = options.establishment_multiple * plug.d;
        let node = GaussianNode {
            b,
            v_cl,
            rho_cl,
            y_cl,
            theta: plug.theta,
            x: plug.x + ds * plug.theta.cos(),
            y: plug.y + ds * plug.theta.sin(),
            s: plug.s + ds,
        };
        (node, closure)
    }

    pub fn orifice_node(&self) -> &PlugNode {
        &self.orifice_node
    }

    pub fn expanded_node(&self) -> &PlugNode {
        &self.expanded_node
    }

    pub fn entrained_node(&self) -> Option<&PlugNode> {
        self.entrained_node.as_ref()
    }

    /// The Gaussian seed state for the integral solver.
    pub fn established(&self) -> &GaussianNode {
        &self.established
    }

    /// Post-expansion fluid state.
    pub fn fluid_exp(&self) -> &FluidState {
        &self.fluid_exp
    }

    /// Equivalent orifice after expansion (Cd = 1).
    pub fn orifice_exp(&self) -> &Orifice {
        &self.orifice_exp
    }

    /// Released mass flow rate.
    pub fn mdot(&self) -> MassRate {
        self.mdot
    }

    pub fn choked(&self) -> bool {
        self.choked
    }

    /// True when the choked solve used the downstream fallback evaluation.
    pub fn used_fallback(&self) -> bool {
        self.fallback
    }

    pub fn closure(&self) -> &MixtureClosure {
        &self.closure
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}
