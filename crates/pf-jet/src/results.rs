//! Serializable trajectory output for downstream consumers.
//!
//! Risk-aggregation and plotting collaborators consume the jet through these
//! flat records; nothing here feeds back into the solver.

use crate::jet::Jet;
use serde::{Deserialize, Serialize};

/// One trajectory sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    pub s_m: f64,
    pub x_m: f64,
    pub y_m: f64,
    pub v_cl_m_s: f64,
    pub halfwidth_m: f64,
    pub rho_cl_kg_m3: f64,
    /// Centerline mass fraction of released fluid
    pub y_cl: f64,
    /// Centerline mole fraction of released fluid
    pub x_cl: f64,
}

/// Scalar summary of a solved jet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JetSummary {
    pub mdot_kg_s: f64,
    pub choked: bool,
    pub used_fallback: bool,
    pub complete: bool,
    pub equivalent_diameter_m: f64,
    pub s_final_m: f64,
}

impl Jet {
    /// Flatten the trajectory into serializable records.
    pub fn records(&self) -> Vec<TrajectoryRecord> {
        let traj = self.trajectory();
        let moles = self.mole_fractions();
        (0..traj.len())
            .map(|i| TrajectoryRecord {
                s_m: traj.s[i],
                x_m: traj.x[i],
                y_m: traj.y[i],
                v_cl_m_s: traj.v_cl[i],
                halfwidth_m: traj.b[i],
                rho_cl_kg_m3: traj.rho_cl[i],
                y_cl: traj.y_cl[i],
                x_cl: moles[i],
            })
            .collect()
    }

    /// Scalar summary for downstream aggregation.
    pub fn summary(&self) -> JetSummary {
        let flow = self.developing_flow();
        JetSummary {
            mdot_kg_s: flow.mdot().value,
            choked: flow.choked(),
            used_fallback: flow.used_fallback(),
            complete: self.is_complete(),
            equivalent_diameter_m: flow.orifice_exp().diameter().value,
            s_final_m: self.trajectory().s.last().copied().unwrap_or(0.0),
        }
    }
}
