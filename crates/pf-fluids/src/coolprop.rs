//! CoolProp-based real-fluid backend (feature `coolprop`).
//!
//! Pure fluids only. The trait keeps the rest of the engine unaware of the
//! backing library; the default build uses the ideal-gas backend instead.

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use crate::model::{EquationOfState, PropertyPack, SpecEnthalpy, SpecEntropy, validation};
use crate::state::StateInput;
use pf_core::units::{Pressure, Temperature, k, kg_m3, mps, pa};
use rfluids::prelude::*;
use rfluids::substance::Pure;

/// Temperature search bounds [K] for property inversions.
const T_MIN: f64 = 20.0;
const T_MAX: f64 = 2000.0;
const MAX_ITER: usize = 100;

/// CoolProp backend for real-fluid properties.
pub struct CoolPropModel {
    // Stateless; rfluids Fluid instances are created per query.
}

impl CoolPropModel {
    pub fn new() -> Self {
        Self {}
    }

    fn pure_of(&self, comp: &Composition) -> FluidResult<Pure> {
        comp.is_pure()
            .map(|s| s.rfluids_pure())
            .ok_or(FluidError::NotSupported {
                what: "CoolProp backend supports pure fluids only",
            })
    }

    fn backend_err(&self, context: &str, e: impl std::fmt::Display) -> FluidError {
        FluidError::Backend {
            message: format!("rfluids error {}: {}", context, e),
        }
    }

    /// Assemble a full property pack at (T, P).
    fn pack_at_pt(&self, pure: Pure, p_pa: f64, t_k: f64, mw: f64) -> FluidResult<PropertyPack> {
        validation::validate_pressure(p_pa)?;
        validation::validate_temperature(t_k)?;

        let mut fluid = Fluid::from(pure)
            .in_state(FluidInput::pressure(p_pa), FluidInput::temperature(t_k))
            .map_err(|e| self.backend_err("creating state", e))?;

        let rho = fluid
            .density()
            .map_err(|e| self.backend_err("getting density", e))?;
        let h = fluid
            .enthalpy()
            .map_err(|e| self.backend_err("getting enthalpy", e))?;
        let s = fluid
            .entropy()
            .map_err(|e| self.backend_err("getting entropy", e))?;
        let cp = fluid
            .specific_heat()
            .map_err(|e| self.backend_err("getting cp", e))?;
        let a_val = fluid
            .sound_speed()
            .map_err(|e| self.backend_err("getting sound speed", e))?;

        validation::validate_density(rho)?;
        validation::validate_speed_of_sound(a_val)?;

        // Effective isentropic exponent from the acoustic relation a² = γ p/ρ.
        let gamma = a_val * a_val * rho / p_pa;
        validation::validate_gamma(gamma)?;

        Ok(PropertyPack {
            p: pa(p_pa),
            t: k(t_k),
            rho: kg_m3(rho),
            h,
            s,
            cp,
            gamma,
            a: mps(a_val),
            mw,
        })
    }

    /// Bisection on temperature at fixed pressure for a monotone-increasing
    /// property evaluator.
    fn solve_t<F>(&self, target: f64, tol: f64, what: &'static str, eval: F) -> FluidResult<f64>
    where
        F: Fn(f64) -> FluidResult<f64>,
    {
        let mut t_low = T_MIN;
        let mut t_high = T_MAX;

        let f_low = eval(t_low)?;
        let f_high = eval(t_high)?;
        if target < f_low || target > f_high {
            return Err(FluidError::OutOfRange { what });
        }

        for _ in 0..MAX_ITER {
            let t_mid = 0.5 * (t_low + t_high);
            let f_mid = eval(t_mid)?;
            if (f_mid - target).abs() < tol {
                return Ok(t_mid);
            }
            if f_mid < target {
                t_low = t_mid;
            } else {
                t_high = t_mid;
            }
        }

        Ok(0.5 * (t_low + t_high))
    }
}

impl Default for CoolPropModel {
    fn default() -> Self {
        Self::new()
    }
}

impl EquationOfState for CoolPropModel {
    fn name(&self) -> &str {
        "coolprop"
    }

    fn supports(&self, comp: &Composition) -> bool {
        comp.is_pure().is_some()
    }

    fn resolve(&self, input: StateInput, comp: &Composition) -> FluidResult<PropertyPack> {
        let pure = self.pure_of(comp)?;
        let mw = comp.molar_mass();
        match input {
            StateInput::PT { p, t } => self.pack_at_pt(pure, p.value, t.value, mw),
            StateInput::PRho { p, rho_kg_m3 } => {
                validation::validate_pressure(p.value)?;
                validation::validate_density(rho_kg_m3)?;
                // Density decreases with T at fixed P; negate so the bisection
                // sees a monotone-increasing evaluator.
                let t = self.solve_t(
                    -rho_kg_m3,
                    rho_kg_m3.abs().max(1e-6) * 1e-8,
                    "density outside valid range for given pressure",
                    |t| {
                        let mut fluid = Fluid::from(pure)
                            .in_state(FluidInput::pressure(p.value), FluidInput::temperature(t))
                            .map_err(|e| self.backend_err("creating state", e))?;
                        Ok(-fluid
                            .density()
                            .map_err(|e| self.backend_err("getting density", e))?)
                    },
                )?;
                self.pack_at_pt(pure, p.value, t, mw)
            }
            StateInput::TRho { t, rho_kg_m3 } => {
                validation::validate_temperature(t.value)?;
                validation::validate_density(rho_kg_m3)?;
                let mut fluid = Fluid::from(pure)
                    .in_state(
                        FluidInput::density(rho_kg_m3),
                        FluidInput::temperature(t.value),
                    )
                    .map_err(|e| self.backend_err("creating state", e))?;
                let p = fluid
                    .pressure()
                    .map_err(|e| self.backend_err("getting pressure", e))?;
                self.pack_at_pt(pure, p, t.value, mw)
            }
        }
    }

    fn state_at_ps(
        &self,
        p: Pressure,
        s: SpecEntropy,
        comp: &Composition,
    ) -> FluidResult<PropertyPack> {
        let pure = self.pure_of(comp)?;
        let mw = comp.molar_mass();
        let tol = 1e-3_f64.max(s.abs() * 1e-8);
        let t = self.solve_t(
            s,
            tol,
            "entropy outside valid range for given pressure",
            |t| {
                let mut fluid = Fluid::from(pure)
                    .in_state(FluidInput::pressure(p.value), FluidInput::temperature(t))
                    .map_err(|e| self.backend_err("creating state", e))?;
                fluid
                    .entropy()
                    .map_err(|e| self.backend_err("getting entropy", e))
            },
        )?;
        self.pack_at_pt(pure, p.value, t, mw)
    }

    fn temperature_from_h(
        &self,
        h: SpecEnthalpy,
        p: Pressure,
        comp: &Composition,
    ) -> FluidResult<Temperature> {
        let pure = self.pure_of(comp)?;
        let tol = 1.0_f64.max(h.abs() * 1e-8);
        let t = self.solve_t(h, tol, "enthalpy outside valid range", |t| {
            let mut fluid = Fluid::from(pure)
                .in_state(FluidInput::pressure(p.value), FluidInput::temperature(t))
                .map_err(|e| self.backend_err("creating state", e))?;
            fluid
                .enthalpy()
                .map_err(|e| self.backend_err("getting enthalpy", e))
        })?;
        Ok(k(t))
    }
}
