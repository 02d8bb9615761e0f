//! Built-in ideal-gas equation-of-state backend.
//!
//! Property closures: ideal-gas law for density, cubic molar-cp polynomial
//! fits per species for caloric properties, mole-fraction mixing rules.
//! Enthalpy is sensible (zero at the 298.15 K reference); the combustion
//! chemistry adds heats of reaction explicitly on top.
//!
//! This backend keeps the engine and its tests independent of a native
//! real-fluid library build; the `coolprop` feature provides a real-fluid
//! provider behind the same trait.

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use crate::model::{EquationOfState, PropertyPack, SpecEnthalpy, SpecEntropy, validation};
use crate::species::CpPoly;
use crate::state::StateInput;
use pf_core::units::constants::{P_REF_PA, R_UNIVERSAL, T_REF_K};
use pf_core::units::{Pressure, Temperature, k, kg_m3, mps, pa};

/// Temperature search bounds [K].
///
/// Wide on purpose: isentropic expansion from high storage pressures (and
/// cryogenic storage temperatures) reaches very low temperatures, and
/// combustion products reach very high ones.
const T_MIN: f64 = 5.0;
const T_MAX: f64 = 3000.0;
const MAX_ITER: usize = 200;

/// Ideal-gas property model.
pub struct IdealGasModel {
    // Stateless; configuration hooks (e.g. custom reference state) could go here.
}

impl IdealGasModel {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for IdealGasModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Molar cp [kJ/(kmol·K)] at T.
fn cp_molar(p: &CpPoly, t: f64) -> f64 {
    p.a + p.b * t + p.c * t * t + p.d * t * t * t
}

/// Molar sensible enthalpy [kJ/kmol] relative to the reference temperature.
fn h_molar(p: &CpPoly, t: f64) -> f64 {
    let t0 = T_REF_K;
    p.a * (t - t0) + p.b / 2.0 * (t * t - t0 * t0) + p.c / 3.0 * (t * t * t - t0 * t0 * t0)
        + p.d / 4.0 * (t * t * t * t - t0 * t0 * t0 * t0)
}

/// Molar standard-state entropy [kJ/(kmol·K)] relative to the reference
/// temperature (pressure term handled separately).
fn s_molar(p: &CpPoly, t: f64) -> f64 {
    let t0 = T_REF_K;
    p.a * (t / t0).ln()
        + p.b * (t - t0)
        + p.c / 2.0 * (t * t - t0 * t0)
        + p.d / 3.0 * (t * t * t - t0 * t0 * t0)
}

impl IdealGasModel {
    /// Assemble the full pack at (T, P) for a composition.
    fn pack_at(&self, t: f64, p: f64, comp: &Composition) -> FluidResult<PropertyPack> {
        validation::validate_temperature(t)?;
        validation::validate_pressure(p)?;
        if !(T_MIN..=T_MAX).contains(&t) {
            return Err(FluidError::OutOfRange {
                what: "temperature outside ideal-gas model validity",
            });
        }

        let mw = comp.molar_mass();
        let poly = comp.cp_poly();
        let to_specific = 1e3 / mw; // kJ/kmol -> J/kg

        let r_spec = R_UNIVERSAL / mw;
        let cp = cp_molar(&poly, t) * to_specific;
        if cp <= r_spec {
            return Err(FluidError::NonPhysical {
                what: "cp fell below the gas constant",
            });
        }
        let gamma = cp / (cp - r_spec);
        let rho = p * mw / (R_UNIVERSAL * t);
        validation::validate_density(rho)?;
        validation::validate_gamma(gamma)?;

        let h = h_molar(&poly, t) * to_specific;
        let s = s_molar(&poly, t) * to_specific - r_spec * (p / P_REF_PA).ln();
        let a = (gamma * r_spec * t).sqrt();
        validation::validate_speed_of_sound(a)?;

        Ok(PropertyPack {
            p: pa(p),
            t: k(t),
            rho: kg_m3(rho),
            h,
            s,
            cp,
            gamma,
            a: mps(a),
            mw,
        })
    }

    /// Bisection on temperature for a monotone-increasing property evaluator.
    fn solve_t<F>(&self, target: f64, tol: f64, what: &'static str, eval: F) -> FluidResult<f64>
    where
        F: Fn(f64) -> f64,
    {
        let mut t_low = T_MIN;
        let mut t_high = T_MAX;

        let f_low = eval(t_low);
        let f_high = eval(t_high);
        if target < f_low || target > f_high {
            return Err(FluidError::OutOfRange { what });
        }

        for _ in 0..MAX_ITER {
            let t_mid = 0.5 * (t_low + t_high);
            let f_mid = eval(t_mid);
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

impl EquationOfState for IdealGasModel {
    fn name(&self) -> &str {
        "ideal-gas"
    }

    fn supports(&self, _comp: &Composition) -> bool {
        // cp polynomials exist for every cataloged species.
        true
    }

    fn resolve(&self, input: StateInput, comp: &Composition) -> FluidResult<PropertyPack> {
        let mw = comp.molar_mass();
        match input {
            StateInput::PT { p, t } => self.pack_at(t.value, p.value, comp),
            StateInput::PRho { p, rho_kg_m3 } => {
                validation::validate_pressure(p.value)?;
                validation::validate_density(rho_kg_m3)?;
                let t = p.value * mw / (R_UNIVERSAL * rho_kg_m3);
                self.pack_at(t, p.value, comp)
            }
            StateInput::TRho { t, rho_kg_m3 } => {
                validation::validate_temperature(t.value)?;
                validation::validate_density(rho_kg_m3)?;
                let p = rho_kg_m3 * R_UNIVERSAL * t.value / mw;
                self.pack_at(t.value, p, comp)
            }
        }
    }

    fn state_at_ps(
        &self,
        p: Pressure,
        s: SpecEntropy,
        comp: &Composition,
    ) -> FluidResult<PropertyPack> {
        validation::validate_pressure(p.value)?;
        let mw = comp.molar_mass();
        let poly = comp.cp_poly();
        let to_specific = 1e3 / mw;
        let r_spec = R_UNIVERSAL / mw;
        let pressure_term = r_spec * (p.value / P_REF_PA).ln();

        // s(T, p) is monotone increasing in T (cp > 0).
        let tol = 1e-7_f64.max(s.abs() * 1e-9);
        let t = self.solve_t(
            s,
            tol,
            "entropy outside valid range for given pressure",
            |t| s_molar(&poly, t) * to_specific - pressure_term,
        )?;
        self.pack_at(t, p.value, comp)
    }

    fn temperature_from_h(
        &self,
        h: SpecEnthalpy,
        p: Pressure,
        comp: &Composition,
    ) -> FluidResult<Temperature> {
        validation::validate_pressure(p.value)?;
        let mw = comp.molar_mass();
        let poly = comp.cp_poly();
        let to_specific = 1e3 / mw;

        let tol = 1.0_f64.max(h.abs() * 1e-9);
        let t = self.solve_t(h, tol, "enthalpy outside valid range", |t| {
            h_molar(&poly, t) * to_specific
        })?;
        Ok(k(t))
    }
}
