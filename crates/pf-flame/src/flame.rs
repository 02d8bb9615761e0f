//! Flame trajectory solver and derived flame-geometry scalars.
//!
//! Same integral shape as the jet solver, with the combustion chemistry
//! closure replacing direct density tracking: the state carries the
//! centerline mixture fraction, and density everywhere on the radial mesh
//! comes from the chemistry table.

use crate::chemistry::{ChemistryTolerances, CombustionChemistry};
use crate::error::{FlameError, FlameResult};
use nalgebra::{DMatrix, DVector};
use pf_core::numeric::logspace;
use pf_core::units::constants::G0_MPS2;
use pf_fluids::{EquationOfState, FluidState, Species};
use pf_jet::{DevelopOptions, DevelopingFlow, Orifice, entrain::densimetric_froude};
use pf_solver::{OdeOptions, OdeStatus, SolverError, integrate_adaptive, trapz};
use std::f64::consts::PI;
use tracing::{debug, info};

const IV: usize = 0; // centerline velocity
const IB: usize = 1; // halfwidth
const IF: usize = 2; // centerline mixture fraction
const ITH: usize = 3; // trajectory angle
const IX: usize = 4;
const IY: usize = 5;

/// Radiant-fraction correlation constants: X_rad = slope·log10(a_p τ_f T_ad⁴)
/// + intercept, clamped to the physical band. Log fit to measured jet-flame
/// radiant fractions.
const RADIANT_SLOPE: f64 = 0.08916;
const RADIANT_INTERCEPT: f64 = -0.78;
const RADIANT_MIN: f64 = 0.01;
const RADIANT_MAX: f64 = 0.5;

/// Flame solver configuration.
#[derive(Debug, Clone)]
pub struct FlameOptions {
    pub develop: DevelopOptions,
    /// Radial mesh extent in halfwidths.
    pub mesh_cutoff: f64,
    /// Radial mesh sample count.
    pub mesh_samples: usize,
    /// Terminate when the centerline mixture fraction falls below this
    /// multiple of stoichiometric (past the flame tip).
    pub cutoff_stoich_ratio: f64,
    /// Terminate at this arc length [m].
    pub max_arc_length: f64,
    pub chem_tolerances: ChemistryTolerances,
    pub ode: OdeOptions,
}

impl Default for FlameOptions {
    fn default() -> Self {
        Self {
            develop: DevelopOptions::default(),
            mesh_cutoff: 5.0,
            mesh_samples: 50,
            cutoff_stoich_ratio: 0.2,
            max_arc_length: 30.0,
            chem_tolerances: ChemistryTolerances::default(),
            ode: OdeOptions {
                rtol: 1e-4,
                atol: 1e-6,
                h_initial: 1e-3,
                h_min: 1e-12,
                h_max: 0.5,
                max_steps: 20_000,
            },
        }
    }
}

/// Flame centerline trajectory.
#[derive(Debug, Clone, Default)]
pub struct FlameTrajectory {
    pub s: Vec<f64>,
    pub v_cl: Vec<f64>,
    pub b: Vec<f64>,
    /// Centerline mixture fraction
    pub f_cl: Vec<f64>,
    pub theta: Vec<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl FlameTrajectory {
    pub fn len(&self) -> usize {
        self.s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }
}

/// Derived flame-geometry scalars, evaluated once after integration from
/// closed-form Froude-number correlations.
#[derive(Debug, Clone, Copy)]
pub struct FlameScalars {
    /// Flame Froude number of the expanded source.
    pub froude: f64,
    /// Visible flame length [m]
    pub visible_length: f64,
    /// Flame width [m]
    pub width: f64,
    /// Flame residence time [s]
    pub residence_time: f64,
    /// Radiant fraction of total combustion power
    pub radiant_fraction: f64,
    /// Total radiated power [W]
    pub radiant_power: f64,
    /// Adiabatic flame temperature [K]
    pub t_adiabatic: f64,
}

/// The solved flame: developing flow, chemistry cache, trajectory, scalars.
#[derive(Debug, Clone)]
pub struct Flame {
    developing: DevelopingFlow,
    ambient: FluidState,
    fuel_species: Species,
    options: FlameOptions,
    chemistry: CombustionChemistry,
    chemistry_rebuilds: u32,
    trajectory: FlameTrajectory,
    status: OdeStatus,
    scalars: FlameScalars,
}

impl Flame {
    /// Build and solve a flame for an upstream state discharging through
    /// `orifice` into `ambient`.
    pub fn solve(
        eos: &dyn EquationOfState,
        upstream: &FluidState,
        orifice: &Orifice,
        ambient: &FluidState,
        options: FlameOptions,
    ) -> FlameResult<Self> {
        let fuel_species = upstream.composition().is_pure().ok_or(
            FlameError::InputValidation {
                what: "flame modeling requires a pure fuel release",
            },
        )?;

        let developing =
            DevelopingFlow::new(eos, upstream, orifice, ambient, &options.develop)?;

        let chemistry = CombustionChemistry::build(
            eos,
            fuel_species,
            developing.fluid_exp().temperature().value,
            ambient.temperature().value,
            ambient.pressure().value,
        )?;

        let mut flame = Self {
            developing,
            ambient: ambient.clone(),
            fuel_species,
            options,
            chemistry,
            chemistry_rebuilds: 0,
            trajectory: FlameTrajectory::default(),
            status: OdeStatus::ReachedEnd,
            scalars: FlameScalars {
                froude: 0.0,
                visible_length: 0.0,
                width: 0.0,
                residence_time: 0.0,
                radiant_fraction: 0.0,
                radiant_power: 0.0,
                t_adiabatic: 0.0,
            },
        };
        flame.integrate()?;
        Ok(flame)
    }

    /// Replace the ambient state and re-solve.
    ///
    /// The chemistry cache is rebuilt only when the active conditions diverge
    /// from the cached key beyond tolerance; otherwise it is reused as-is.
    pub fn update_ambient(
        &mut self,
        eos: &dyn EquationOfState,
        ambient: FluidState,
    ) -> FlameResult<()> {
        self.ambient = ambient;
        let t_reactant = self.developing.fluid_exp().temperature().value;
        if self.chemistry.needs_rebuild(
            t_reactant,
            self.fuel_species.carbon_count(),
            self.ambient.pressure().value,
            &self.options.chem_tolerances,
        ) {
            debug!("chemistry cache invalidated; rebuilding");
            self.chemistry = CombustionChemistry::build(
                eos,
                self.fuel_species,
                t_reactant,
                self.ambient.temperature().value,
                self.ambient.pressure().value,
            )?;
            self.chemistry_rebuilds += 1;
        } else {
            debug!("chemistry cache valid; reusing");
        }
        self.integrate()
    }

    /// Integrate the flame trajectory and evaluate the derived scalars.
    fn integrate(&mut self) -> FlameResult<()> {
        if self.options.mesh_samples < 8 {
            return Err(FlameError::Configuration {
                what: "radial mesh needs at least 8 samples",
            });
        }
        if !(self.options.cutoff_stoich_ratio > 0.0 && self.options.cutoff_stoich_ratio < 1.0) {
            return Err(FlameError::Configuration {
                what: "stoichiometric cutoff ratio must lie in (0, 1)",
            });
        }

        let seed = *self.developing.established();
        let lambda = self.developing.lambda();
        let rho_amb = self.chemistry.rho_prod(0.0);

        let fluid_exp = self.developing.fluid_exp();
        let v_exp = fluid_exp.velocity().value;
        let mdot = self.developing.mdot().value;
        let entrainment = self.options.develop.entrainment;
        let e_mom = entrainment.momentum_rate(mdot, v_exp, rho_amb);
        let fr_source = densimetric_froude(
            v_exp,
            self.developing.orifice_exp().diameter().value,
            fluid_exp.density().value,
            rho_amb,
            G0_MPS2,
        );
        let alpha_buoy = entrainment.buoyancy_coefficient(fr_source);

        let y0 = DVector::from_vec(vec![
            seed.v_cl, seed.b, seed.y_cl, seed.theta, seed.x, seed.y,
        ]);

        let params = FlameRhsParams {
            rho_amb,
            lambda,
            e_mom,
            alpha_buoy,
            max_entrainment_fraction: entrainment.max_fraction,
            mesh_cutoff: self.options.mesh_cutoff,
            mesh_samples: self.options.mesh_samples,
            chem: &self.chemistry,
        };

        let f_min = self.options.cutoff_stoich_ratio * self.chemistry.fstoich();
        let solution = integrate_adaptive(
            |s, y| flame_rhs(s, y, &params),
            seed.s,
            seed.s + self.options.max_arc_length,
            y0,
            |_s, y| y[IF] <= f_min,
            &self.options.ode,
        )?;

        let mut trajectory = FlameTrajectory::default();
        for (s, y) in solution.s.iter().zip(solution.y.iter()) {
            trajectory.s.push(*s);
            trajectory.v_cl.push(y[IV]);
            trajectory.b.push(y[IB]);
            trajectory.f_cl.push(y[IF]);
            trajectory.theta.push(y[ITH]);
            trajectory.x.push(y[IX]);
            trajectory.y.push(y[IY]);
        }
        self.trajectory = trajectory;
        self.status = solution.status;
        self.scalars = self.evaluate_scalars();

        info!(
            steps = solution.steps_taken,
            visible_length = self.scalars.visible_length,
            radiant_fraction = self.scalars.radiant_fraction,
            status = ?self.status,
            "flame integration finished"
        );
        Ok(())
    }

    /// Closed-form flame-geometry correlations from the flame Froude number.
    fn evaluate_scalars(&self) -> FlameScalars {
        let chem = &self.chemistry;
        let fs = chem.fstoich();
        let t_ad = chem.t_adiabatic();
        let t_amb = chem.ambient_temperature();
        let rho_amb = chem.rho_prod(0.0);
        let rho_f = chem.rho_prod(fs);

        let fluid_exp = self.developing.fluid_exp();
        let orifice_exp = self.developing.orifice_exp();
        let v_exp = fluid_exp.velocity().value;
        let rho_exp = fluid_exp.density().value;
        let d_exp = orifice_exp.diameter().value;

        // Flame Froude number.
        let froude = v_exp * fs.powf(1.5)
            / ((rho_exp / rho_amb).powf(0.25)
                * (G0_MPS2 * d_exp * (t_ad - t_amb) / t_amb).sqrt());

        // Dimensionless flame length; the buoyancy-influenced branch
        // saturates at 23 in the momentum-dominated regime.
        let l_star = if froude < 5.0 {
            13.5 * froude.powf(0.4) / (1.0 + 0.07 * froude * froude).powf(0.2)
        } else {
            23.0
        };
        let d_star = d_exp * (rho_exp / rho_amb).sqrt();
        let visible_length = l_star * d_star / fs;
        let width = 0.17 * visible_length;

        // Residence time of products in the visible envelope.
        let mdot = self.developing.mdot().value;
        let residence_time = (PI / 12.0) * rho_f * width * width * visible_length * fs
            / (rho_exp * d_exp * d_exp * v_exp);

        let optically = chem.fuel().planck_absorption * residence_time * t_ad.powi(4);
        let radiant_fraction =
            (RADIANT_SLOPE * optically.log10() + RADIANT_INTERCEPT).clamp(RADIANT_MIN, RADIANT_MAX);
        let radiant_power = radiant_fraction * mdot * chem.fuel().heat_of_combustion;

        FlameScalars {
            froude,
            visible_length,
            width,
            residence_time,
            radiant_fraction,
            radiant_power,
            t_adiabatic: t_ad,
        }
    }

    pub fn developing_flow(&self) -> &DevelopingFlow {
        &self.developing
    }

    pub fn ambient(&self) -> &FluidState {
        &self.ambient
    }

    pub fn chemistry(&self) -> &CombustionChemistry {
        &self.chemistry
    }

    /// Number of times the chemistry cache was rebuilt after construction.
    pub fn chemistry_rebuilds(&self) -> u32 {
        self.chemistry_rebuilds
    }

    pub fn trajectory(&self) -> &FlameTrajectory {
        &self.trajectory
    }

    pub fn status(&self) -> OdeStatus {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status != OdeStatus::Stalled
    }

    pub fn scalars(&self) -> &FlameScalars {
        &self.scalars
    }

    /// Visible flame length [m].
    pub fn length(&self) -> f64 {
        self.scalars.visible_length
    }

    /// Flame width [m].
    pub fn width(&self) -> f64 {
        self.scalars.width
    }

    /// Radiant fraction of total combustion power.
    pub fn radiant_fraction(&self) -> f64 {
        self.scalars.radiant_fraction
    }

    /// Total radiated power [W].
    pub fn radiant_power(&self) -> f64 {
        self.scalars.radiant_power
    }

    /// Centerline position at arc length `s`, interpolated on the trajectory
    /// and extrapolated along the boundary angles beyond it.
    pub fn centerline_position(&self, s: f64) -> (f64, f64) {
        let traj = &self.trajectory;
        if traj.is_empty() {
            return (s, 0.0);
        }
        let s0 = traj.s[0];
        if s <= s0 {
            // Straight line from the orifice to the established point.
            let theta = traj.theta[0];
            let back = s0 - s;
            return (traj.x[0] - back * theta.cos(), traj.y[0] - back * theta.sin());
        }
        let s_last = *traj.s.last().unwrap();
        if s >= s_last {
            let theta = *traj.theta.last().unwrap();
            let ahead = s - s_last;
            return (
                traj.x.last().unwrap() + ahead * theta.cos(),
                traj.y.last().unwrap() + ahead * theta.sin(),
            );
        }
        let idx = traj.s.partition_point(|&g| g < s).max(1);
        let frac = (s - traj.s[idx - 1]) / (traj.s[idx] - traj.s[idx - 1]);
        (
            traj.x[idx - 1] + frac * (traj.x[idx] - traj.x[idx - 1]),
            traj.y[idx - 1] + frac * (traj.y[idx] - traj.y[idx - 1]),
        )
    }
}

/// Fixed parameters captured by the flame derivative function.
struct FlameRhsParams<'a> {
    rho_amb: f64,
    lambda: f64,
    e_mom: f64,
    alpha_buoy: f64,
    max_entrainment_fraction: f64,
    mesh_cutoff: f64,
    mesh_samples: usize,
    chem: &'a CombustionChemistry,
}

/// Conservation-law derivative evaluation with the chemistry density
/// closure.
fn flame_rhs(
    _s: f64,
    state: &DVector<f64>,
    p: &FlameRhsParams<'_>,
) -> Result<DVector<f64>, SolverError> {
    let v_cl = state[IV];
    let b = state[IB];
    let f_cl = state[IF];
    let theta = state[ITH];

    if !(v_cl > 0.0 && b > 0.0) || !f_cl.is_finite() || f_cl <= 0.0 {
        return Err(SolverError::Numeric {
            what: format!("nonphysical flame state: V={v_cl}, B={b}, f={f_cl}"),
        });
    }

    let lambda2 = p.lambda * p.lambda;
    let rho_amb = p.rho_amb;

    let mut r = Vec::with_capacity(p.mesh_samples + 1);
    r.push(0.0);
    r.extend(
        logspace(1e-3 * b, p.mesh_cutoff * b, p.mesh_samples).map_err(|e| {
            SolverError::Numeric {
                what: format!("radial mesh construction failed: {e}"),
            }
        })?,
    );
    let n = r.len();

    let mut c_v = vec![0.0; n];
    let mut c_b = vec![0.0; n];
    let mut c_f = vec![0.0; n];
    let mut m_v = vec![0.0; n];
    let mut m_b = vec![0.0; n];
    let mut m_f = vec![0.0; n];
    let mut s_v = vec![0.0; n];
    let mut s_b = vec![0.0; n];
    let mut s_f = vec![0.0; n];
    let mut mom = vec![0.0; n];
    let mut deficit = vec![0.0; n];

    for i in 0..n {
        let ri = r[i];
        let area = 2.0 * PI * ri;
        let ev = (-ri * ri / (b * b)).exp();
        let el = (-ri * ri / (lambda2 * b * b)).exp();
        let v = v_cl * ev;
        let f = f_cl * el;

        let rho = p.chem.rho_prod(f);
        let drho = p.chem.drho_df(f);

        let dv_db = v_cl * ev * 2.0 * ri * ri / (b * b * b);
        let df_db = f_cl * el * 2.0 * ri * ri / (lambda2 * b * b * b);
        let drho_db = drho * df_db;
        let drho_dfcl = drho * el;

        c_v[i] = area * rho * ev;
        c_b[i] = area * (drho_db * v + rho * dv_db);
        c_f[i] = area * drho_dfcl * v;

        m_v[i] = area * 2.0 * rho * v * ev;
        m_b[i] = area * (drho_db * v * v + 2.0 * rho * v * dv_db);
        m_f[i] = area * drho_dfcl * v * v;
        mom[i] = area * rho * v * v;

        // Mixture-fraction flux ∫ ρ f v dA.
        s_v[i] = area * rho * f * ev;
        s_b[i] = area * ((drho * f + rho) * df_db * v + rho * f * dv_db);
        s_f[i] = area * (drho * f + rho) * el * v;

        deficit[i] = area * (rho_amb - rho);
    }

    let int = |vals: &[f64]| trapz(&r, vals);
    let momentum_flux = int(&mom)?;
    let buoyant_force = G0_MPS2 * int(&deficit)?;

    let rho_cl = p.chem.rho_prod(f_cl);
    let density_gap = (rho_amb - rho_cl).abs().max(1e-12);
    let froude_local = v_cl * v_cl * rho_cl / (G0_MPS2 * b * density_gap);
    let e_buoy = p.alpha_buoy / froude_local * 2.0 * PI * b * v_cl * theta.sin();
    let e_cap = p.max_entrainment_fraction * 2.0 * PI * b * v_cl;
    let entrainment = (p.e_mom + e_buoy.max(0.0)).min(e_cap);

    let (sin_t, cos_t) = theta.sin_cos();

    let mut a = DMatrix::zeros(4, 4);
    let mut rhs = DVector::zeros(4);

    // Continuity
    a[(0, 0)] = int(&c_v)?;
    a[(0, 1)] = int(&c_b)?;
    a[(0, 2)] = int(&c_f)?;
    rhs[0] = rho_amb * entrainment;

    // x-momentum
    a[(1, 0)] = cos_t * int(&m_v)?;
    a[(1, 1)] = cos_t * int(&m_b)?;
    a[(1, 2)] = cos_t * int(&m_f)?;
    a[(1, 3)] = -sin_t * momentum_flux;

    // y-momentum
    a[(2, 0)] = sin_t * int(&m_v)?;
    a[(2, 1)] = sin_t * int(&m_b)?;
    a[(2, 2)] = sin_t * int(&m_f)?;
    a[(2, 3)] = cos_t * momentum_flux;
    rhs[2] = buoyant_force;

    // Mixture-fraction conservation
    a[(3, 0)] = int(&s_v)?;
    a[(3, 1)] = int(&s_b)?;
    a[(3, 2)] = int(&s_f)?;

    let derivs = a.lu().solve(&rhs).ok_or_else(|| SolverError::Numeric {
        what: "singular conservation system in flame derivative".to_string(),
    })?;

    let mut dy = DVector::zeros(6);
    dy[IV] = derivs[0];
    dy[IB] = derivs[1];
    dy[IF] = derivs[2];
    dy[ITH] = derivs[3];
    dy[IX] = cos_t;
    dy[IY] = sin_t;
    Ok(dy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_core::units::{k, m, pa};
    use pf_fluids::{Composition, IdealGasModel, StateInput};

    fn solve_flame(species: Species, p_up: f64, d: f64) -> Flame {
        let eos = IdealGasModel::new();
        let upstream = FluidState::new(
            &eos,
            StateInput::PT {
                p: pa(p_up),
                t: k(293.0),
            },
            Composition::pure(species),
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
        let orifice = Orifice::new(m(d), 1.0).unwrap();
        Flame::solve(&eos, &upstream, &orifice, &ambient, FlameOptions::default()).unwrap()
    }

    #[test]
    fn hydrogen_flame_has_positive_geometry() {
        let flame = solve_flame(Species::H2, 10.0e6, 0.001);
        assert!(flame.is_complete());

        let s = flame.scalars();
        assert!(s.visible_length > 0.1 && s.visible_length < 20.0);
        assert!((s.width - 0.17 * s.visible_length).abs() < 1e-12);
        assert!(s.residence_time > 0.0);
        assert!(s.radiant_fraction >= RADIANT_MIN && s.radiant_fraction <= RADIANT_MAX);
        assert!(s.radiant_power > 0.0);
        assert!(s.t_adiabatic > 2000.0);
    }

    #[test]
    fn length_is_idempotent() {
        let flame = solve_flame(Species::H2, 10.0e6, 0.001);
        let l1 = flame.length();
        let l2 = flame.length();
        assert_eq!(l1, l2);
    }

    #[test]
    fn unchanged_ambient_reuses_chemistry_cache() {
        let eos = IdealGasModel::new();
        let mut flame = solve_flame(Species::H2, 10.0e6, 0.001);
        let l1 = flame.length();

        // Same conditions within tolerance: no rebuild, identical answer.
        let ambient = FluidState::new(
            &eos,
            StateInput::PT {
                p: pa(101_325.0),
                t: k(293.0),
            },
            Composition::pure(Species::Air),
        )
        .unwrap();
        flame.update_ambient(&eos, ambient).unwrap();
        assert_eq!(flame.chemistry_rebuilds(), 0);
        assert_eq!(flame.length(), l1);
    }

    #[test]
    fn ambient_pressure_shift_rebuilds_chemistry() {
        let eos = IdealGasModel::new();
        let mut flame = solve_flame(Species::H2, 10.0e6, 0.001);

        let ambient = FluidState::new(
            &eos,
            StateInput::PT {
                p: pa(90_000.0),
                t: k(293.0),
            },
            Composition::pure(Species::Air),
        )
        .unwrap();
        flame.update_ambient(&eos, ambient).unwrap();
        assert_eq!(flame.chemistry_rebuilds(), 1);
        assert!((flame.chemistry().key().p - 90_000.0).abs() < 1e-6);
    }

    #[test]
    fn flame_trajectory_rises_with_buoyancy() {
        let flame = solve_flame(Species::H2, 5.0e6, 0.001);
        let traj = flame.trajectory();
        assert!(traj.len() > 5);
        // Hot products are strongly buoyant.
        assert!(*traj.theta.last().unwrap() > traj.theta[0]);
        // Mixture fraction dilutes monotonically.
        for w in traj.f_cl.windows(2) {
            assert!(w[1] <= w[0] + 1e-9);
        }
    }

    #[test]
    fn centerline_position_interpolates_and_extrapolates() {
        let flame = solve_flame(Species::H2, 10.0e6, 0.001);
        let traj = flame.trajectory();

        // At the origin side, positions track the release axis.
        let (x0, y0) = flame.centerline_position(0.0);
        assert!(x0.abs() < 1e-6 && y0.abs() < 1e-6);

        // Beyond the trajectory, extrapolation continues along the tip angle.
        let s_past = traj.s.last().unwrap() + 1.0;
        let (x_p, _) = flame.centerline_position(s_past);
        assert!(x_p > *traj.x.last().unwrap());
    }
}
