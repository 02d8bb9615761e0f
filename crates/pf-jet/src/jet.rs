//! Gaussian integral jet solver.
//!
//! Integrates the self-similar turbulent jet from the established state
//! outward. Each derivative evaluation assembles conservation residuals
//! (continuity, both momentum components, species) by quadrature over a
//! log-spaced radial mesh, closes the system with the mixture-density
//! relation, and solves the resulting dense linear system.

use crate::develop::{DevelopOptions, DevelopingFlow, MixtureClosure};
use crate::entrain::densimetric_froude;
use crate::error::{JetError, JetResult};
use crate::orifice::Orifice;
use nalgebra::{DMatrix, DVector};
use pf_core::numeric::logspace;
use pf_core::units::constants::G0_MPS2;
use pf_fluids::{EquationOfState, FluidState};
use pf_solver::{OdeOptions, OdeStatus, SolverError, integrate_adaptive, trapz};
use std::f64::consts::PI;
use tracing::{debug, info};

/// State vector layout for the integral solver.
const IV: usize = 0; // centerline velocity
const IB: usize = 1; // halfwidth
const IRHO: usize = 2; // centerline density
const IY: usize = 3; // centerline mass fraction
const ITH: usize = 4; // trajectory angle
const IX: usize = 5;
const IYPOS: usize = 6;

/// Jet solver configuration.
#[derive(Debug, Clone)]
pub struct JetOptions {
    pub develop: DevelopOptions,
    /// Radial mesh extent in halfwidths.
    pub mesh_cutoff: f64,
    /// Radial mesh sample count.
    pub mesh_samples: usize,
    /// Terminate when the centerline mass fraction falls below this value.
    pub min_mass_fraction: f64,
    /// Terminate at this arc length [m].
    pub max_arc_length: f64,
    pub ode: OdeOptions,
}

impl Default for JetOptions {
    fn default() -> Self {
        Self {
            develop: DevelopOptions::default(),
            mesh_cutoff: 5.0,
            mesh_samples: 50,
            min_mass_fraction: 5e-4,
            max_arc_length: 30.0,
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

/// Integrated centerline trajectory, sampled at the integrator's natural
/// step density. Parallel arrays; append-only during solving, frozen after.
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    /// Arc length [m]
    pub s: Vec<f64>,
    /// Centerline velocity [m/s]
    pub v_cl: Vec<f64>,
    /// Halfwidth [m]
    pub b: Vec<f64>,
    /// Centerline density [kg/m³]
    pub rho_cl: Vec<f64>,
    /// Centerline mass fraction of released fluid
    pub y_cl: Vec<f64>,
    /// Trajectory angle [rad]
    pub theta: Vec<f64>,
    /// Position [m]
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }
}

/// The solved jet: developing flow plus integrated trajectory.
#[derive(Debug, Clone)]
pub struct Jet {
    developing: DevelopingFlow,
    ambient: FluidState,
    options: JetOptions,
    trajectory: Trajectory,
    status: OdeStatus,
}

impl Jet {
    /// Run the full pipeline and integrate the jet.
    pub fn solve(
        eos: &dyn EquationOfState,
        upstream: &FluidState,
        orifice: &Orifice,
        ambient: &FluidState,
        options: JetOptions,
    ) -> JetResult<Self> {
        let developing =
            DevelopingFlow::new(eos, upstream, orifice, ambient, &options.develop)?;
        Self::solve_developed(developing, ambient.clone(), options)
    }

    /// Integrate from an already-built developing flow.
    pub fn solve_developed(
        developing: DevelopingFlow,
        ambient: FluidState,
        options: JetOptions,
    ) -> JetResult<Self> {
        if options.mesh_samples < 8 {
            return Err(JetError::Configuration {
                what: "radial mesh needs at least 8 samples",
            });
        }
        if !(options.mesh_cutoff > 1.0) {
            return Err(JetError::Configuration {
                what: "radial mesh cutoff must exceed one halfwidth",
            });
        }
        if !(options.max_arc_length > 0.0) {
            return Err(JetError::Configuration {
                what: "maximum arc length must be positive",
            });
        }

        let seed = *developing.established();
        let closure = *developing.closure();
        let lambda = developing.lambda();
        let rho_amb = ambient.density().value;

        // Momentum entrainment term and the buoyancy coefficient are fixed
        // from the post-expansion state, once.
        let fluid_exp = developing.fluid_exp();
        let v_exp = fluid_exp.velocity().value;
        let mdot = developing.mdot().value;
        let entrainment = options.develop.entrainment;
        let e_mom = entrainment.momentum_rate(mdot, v_exp, rho_amb);
        let fr_source = densimetric_froude(
            v_exp,
            developing.orifice_exp().diameter().value,
            fluid_exp.density().value,
            rho_amb,
            G0_MPS2,
        );
        let alpha_buoy = entrainment.buoyancy_coefficient(fr_source);
        debug!(e_mom, fr_source, alpha_buoy, "entrainment closure resolved");

        let y0 = DVector::from_vec(vec![
            seed.v_cl, seed.b, seed.rho_cl, seed.y_cl, seed.theta, seed.x, seed.y,
        ]);

        let params = RhsParams {
            rho_amb,
            lambda,
            e_mom,
            alpha_buoy,
            max_entrainment_fraction: entrainment.max_fraction,
            mesh_cutoff: options.mesh_cutoff,
            mesh_samples: options.mesh_samples,
            closure,
        };

        let min_y = options.min_mass_fraction;
        let solution = integrate_adaptive(
            |s, y| gaussian_rhs(s, y, &params),
            seed.s,
            seed.s + options.max_arc_length,
            y0,
            |_s, y| y[IY] <= min_y,
            &options.ode,
        )?;

        let mut trajectory = Trajectory::default();
        for (s, y) in solution.s.iter().zip(solution.y.iter()) {
            trajectory.s.push(*s);
            trajectory.v_cl.push(y[IV]);
            trajectory.b.push(y[IB]);
            trajectory.rho_cl.push(y[IRHO]);
            trajectory.y_cl.push(y[IY]);
            trajectory.theta.push(y[ITH]);
            trajectory.x.push(y[IX]);
            trajectory.y.push(y[IYPOS]);
        }

        info!(
            steps = solution.steps_taken,
            s_final = trajectory.s.last().copied().unwrap_or(seed.s),
            y_final = trajectory.y_cl.last().copied().unwrap_or(seed.y_cl),
            status = ?solution.status,
            "jet integration finished"
        );

        Ok(Self {
            developing,
            ambient,
            options,
            trajectory,
            status: solution.status,
        })
    }

    pub fn developing_flow(&self) -> &DevelopingFlow {
        &self.developing
    }

    pub fn ambient(&self) -> &FluidState {
        &self.ambient
    }

    pub fn options(&self) -> &JetOptions {
        &self.options
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn status(&self) -> OdeStatus {
        self.status
    }

    /// False when the integration stalled and the trajectory is partial.
    pub fn is_complete(&self) -> bool {
        self.status != OdeStatus::Stalled
    }

    /// Released mass flow rate.
    pub fn mass_flow_rate(&self) -> pf_core::units::MassRate {
        self.developing.mdot()
    }

    /// Centerline mole fraction of released fluid at every trajectory sample.
    pub fn mole_fractions(&self) -> Vec<f64> {
        let closure = self.developing.closure();
        self.trajectory
            .y_cl
            .iter()
            .map(|&y| closure.mole_fraction(y))
            .collect()
    }

    /// Arc length where the centerline mole fraction first falls below `x`,
    /// interpolated between trajectory samples.
    pub fn arc_length_to_mole_fraction(&self, x: f64) -> Option<f64> {
        let moles = self.mole_fractions();
        let idx = moles.iter().position(|&m| m <= x)?;
        if idx == 0 {
            return Some(self.trajectory.s[0]);
        }
        let (x0, x1) = (moles[idx - 1], moles[idx]);
        let (s0, s1) = (self.trajectory.s[idx - 1], self.trajectory.s[idx]);
        let frac = if (x1 - x0).abs() > 0.0 {
            (x - x0) / (x1 - x0)
        } else {
            1.0
        };
        Some(s0 + frac * (s1 - s0))
    }
}

/// Fixed parameters captured by the derivative function.
struct RhsParams {
    rho_amb: f64,
    lambda: f64,
    e_mom: f64,
    alpha_buoy: f64,
    max_entrainment_fraction: f64,
    mesh_cutoff: f64,
    mesh_samples: usize,
    closure: MixtureClosure,
}

/// Conservation-law derivative evaluation.
fn gaussian_rhs(
    _s: f64,
    state: &DVector<f64>,
    p: &RhsParams,
) -> Result<DVector<f64>, SolverError> {
    let v_cl = state[IV];
    let b = state[IB];
    let rho_cl = state[IRHO];
    let y_cl = state[IY];
    let theta = state[ITH];

    if !(v_cl > 0.0 && b > 0.0 && rho_cl > 0.0) || !y_cl.is_finite() {
        return Err(SolverError::Numeric {
            what: format!("nonphysical jet state: V={v_cl}, B={b}, rho={rho_cl}, Y={y_cl}"),
        });
    }

    let lambda2 = p.lambda * p.lambda;
    let rho_amb = p.rho_amb;

    // Log-spaced radial mesh from near-zero out to the cutoff.
    let mut r = Vec::with_capacity(p.mesh_samples + 1);
    r.push(0.0);
    r.extend(
        logspace(1e-3 * b, p.mesh_cutoff * b, p.mesh_samples)
            .map_err(|e| SolverError::Numeric {
                what: format!("radial mesh construction failed: {e}"),
            })?,
    );
    let n = r.len();

    // Row integrands, each already including the 2πr area weight.
    let mut c_v = vec![0.0; n];
    let mut c_b = vec![0.0; n];
    let mut c_rho = vec![0.0; n];
    let mut m_v = vec![0.0; n];
    let mut m_b = vec![0.0; n];
    let mut m_rho = vec![0.0; n];
    let mut s_v = vec![0.0; n];
    let mut s_b = vec![0.0; n];
    let mut s_rho = vec![0.0; n];
    let mut s_y = vec![0.0; n];
    let mut mom = vec![0.0; n];
    let mut deficit = vec![0.0; n];

    for i in 0..n {
        let ri = r[i];
        let area = 2.0 * PI * ri;
        let ev = (-ri * ri / (b * b)).exp();
        let el = (-ri * ri / (lambda2 * b * b)).exp();
        let v = v_cl * ev;
        let rho = rho_amb + (rho_cl - rho_amb) * el;

        let dv_db = v_cl * ev * 2.0 * ri * ri / (b * b * b);
        let drho_db = (rho_cl - rho_amb) * el * 2.0 * ri * ri / (lambda2 * b * b * b);

        // Continuity: d/dS ∫ ρ v dA
        c_v[i] = area * rho * ev;
        c_b[i] = area * (drho_db * v + rho * dv_db);
        c_rho[i] = area * el * v;

        // Momentum flux: d/dS ∫ ρ v² dA
        m_v[i] = area * 2.0 * rho * v * ev;
        m_b[i] = area * (drho_db * v * v + 2.0 * rho * v * dv_db);
        m_rho[i] = area * el * v * v;
        mom[i] = area * rho * v * v;

        // Species: d/dS ∫ (ρY) v dA with (ρY) = ρ_cl Y_cl exp(-r²/(λB)²)
        s_v[i] = area * rho_cl * y_cl * el * ev;
        s_b[i] = area * rho_cl * y_cl * (el * dv_db + v * el * 2.0 * ri * ri / (lambda2 * b * b * b));
        s_rho[i] = area * y_cl * el * v;
        s_y[i] = area * rho_cl * el * v;

        // Buoyant density deficit: ∫ (ρ_amb − ρ) dA
        deficit[i] = area * (rho_amb - rho);
    }

    let int = |f: &[f64]| trapz(&r, f);
    let momentum_flux = int(&mom)?;
    let buoyant_force = G0_MPS2 * int(&deficit)?;

    // Entrainment: fixed momentum term + local buoyancy term, clipped at the
    // turbulence ceiling.
    let density_gap = (rho_amb - rho_cl).abs().max(1e-12);
    let froude_local = v_cl * v_cl * rho_cl / (G0_MPS2 * b * density_gap);
    let e_buoy = p.alpha_buoy / froude_local * 2.0 * PI * b * v_cl * theta.sin();
    let e_cap = p.max_entrainment_fraction * 2.0 * PI * b * v_cl;
    let entrainment = (p.e_mom + e_buoy.max(0.0)).min(e_cap);

    let (sin_t, cos_t) = theta.sin_cos();

    let mut a = DMatrix::zeros(5, 5);
    let mut rhs = DVector::zeros(5);

    // Continuity
    a[(0, 0)] = int(&c_v)?;
    a[(0, 1)] = int(&c_b)?;
    a[(0, 2)] = int(&c_rho)?;
    rhs[0] = rho_amb * entrainment;

    // x-momentum: d/dS (M cosθ) = 0
    a[(1, 0)] = cos_t * int(&m_v)?;
    a[(1, 1)] = cos_t * int(&m_b)?;
    a[(1, 2)] = cos_t * int(&m_rho)?;
    a[(1, 4)] = -sin_t * momentum_flux;
    rhs[1] = 0.0;

    // y-momentum: d/dS (M sinθ) = g ∫ (ρ_amb − ρ) dA
    a[(2, 0)] = sin_t * int(&m_v)?;
    a[(2, 1)] = sin_t * int(&m_b)?;
    a[(2, 2)] = sin_t * int(&m_rho)?;
    a[(2, 4)] = cos_t * momentum_flux;
    rhs[2] = buoyant_force;

    // Species conservation
    a[(3, 0)] = int(&s_v)?;
    a[(3, 1)] = int(&s_b)?;
    a[(3, 2)] = int(&s_rho)?;
    a[(3, 3)] = int(&s_y)?;
    rhs[3] = 0.0;

    // Mixture closure: ρ' = (dρ/dY) Y'
    a[(4, 2)] = 1.0;
    a[(4, 3)] = -p.closure.drho_dy(y_cl);
    rhs[4] = 0.0;

    let derivs = a.lu().solve(&rhs).ok_or_else(|| SolverError::Numeric {
        what: "singular conservation system in jet derivative".to_string(),
    })?;

    let mut dy = DVector::zeros(7);
    dy[IV] = derivs[0];
    dy[IB] = derivs[1];
    dy[IRHO] = derivs[2];
    dy[IY] = derivs[3];
    dy[ITH] = derivs[4];
    dy[IX] = cos_t;
    dy[IYPOS] = sin_t;
    Ok(dy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_core::units::{k, m, pa};
    use pf_fluids::{Composition, IdealGasModel, Species, StateInput};

    fn hydrogen_jet(p_up: f64, options: JetOptions) -> Jet {
        let eos = IdealGasModel::new();
        let upstream = FluidState::new(
            &eos,
            StateInput::PT {
                p: pa(p_up),
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
        let orifice = Orifice::new(m(0.001), 1.0).unwrap();
        Jet::solve(&eos, &upstream, &orifice, &ambient, options).unwrap()
    }

    #[test]
    fn jet_halfwidth_grows_and_velocity_decays() {
        let options = JetOptions {
            max_arc_length: 2.0,
            ..JetOptions::default()
        };
        let jet = hydrogen_jet(10.0e6, options);
        assert!(jet.is_complete());

        let traj = jet.trajectory();
        assert!(traj.len() > 10);
        let first_b = traj.b[0];
        let last_b = *traj.b.last().unwrap();
        assert!(last_b > 2.0 * first_b, "B: {first_b} -> {last_b}");

        let first_v = traj.v_cl[0];
        let last_v = *traj.v_cl.last().unwrap();
        assert!(last_v < 0.5 * first_v, "V: {first_v} -> {last_v}");
    }

    #[test]
    fn centerline_density_approaches_ambient() {
        let options = JetOptions {
            max_arc_length: 10.0,
            ..JetOptions::default()
        };
        let jet = hydrogen_jet(10.0e6, options);
        let traj = jet.trajectory();
        let rho_amb = jet.ambient().density().value;
        let rho_first = traj.rho_cl[0];
        let rho_last = *traj.rho_cl.last().unwrap();
        assert!(rho_first < 0.5 * rho_amb);
        assert!(
            (rho_last - rho_amb).abs() < (rho_first - rho_amb).abs(),
            "density should relax toward ambient"
        );
    }

    #[test]
    fn buoyant_jet_curves_upward() {
        let options = JetOptions {
            max_arc_length: 10.0,
            ..JetOptions::default()
        };
        let jet = hydrogen_jet(10.0e6, options);
        let traj = jet.trajectory();
        // Horizontal hydrogen release: buoyancy lifts the centerline.
        assert!(*traj.theta.last().unwrap() > traj.theta[0]);
        assert!(*traj.y.last().unwrap() > 0.0);
    }

    #[test]
    fn mole_fraction_interpolation_is_consistent() {
        let options = JetOptions {
            max_arc_length: 20.0,
            min_mass_fraction: 1e-3,
            ..JetOptions::default()
        };
        let jet = hydrogen_jet(35.0e6, options);
        let moles = jet.mole_fractions();
        assert_eq!(moles.len(), jet.trajectory().len());
        // The 4 mol% crossing exists and lies inside the trajectory span.
        let s4 = jet.arc_length_to_mole_fraction(0.04).unwrap();
        assert!(s4 > jet.trajectory().s[0]);
        assert!(s4 < *jet.trajectory().s.last().unwrap());
    }

    #[test]
    fn bad_mesh_configuration_rejected() {
        let eos = IdealGasModel::new();
        let upstream = FluidState::new(
            &eos,
            StateInput::PT {
                p: pa(1.0e6),
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
        let orifice = Orifice::new(m(0.001), 1.0).unwrap();
        let options = JetOptions {
            mesh_samples: 4,
            ..JetOptions::default()
        };
        let err = Jet::solve(&eos, &upstream, &orifice, &ambient, options).unwrap_err();
        assert!(matches!(err, JetError::Configuration { .. }));
    }
}
