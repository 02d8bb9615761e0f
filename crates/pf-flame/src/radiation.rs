//! Radiative heat flux models.
//!
//! Two interchangeable source models consume the solved flame and an
//! atmospheric transmissivity sub-model:
//!
//! - **Multi-point**: the visible centerline is discretized into weighted
//!   point sources (linear ramp to a waist, geometric taper past it); each
//!   source contributes view-factor-weighted, transmissivity-attenuated
//!   power at the observer.
//! - **Single-point**: one source at mid-flame with an empirical normalized
//!   axial radiant-fraction curve scaling the total radiant power.

use crate::error::{FlameError, FlameResult};
use crate::flame::Flame;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Atmospheric transmissivity correlation in path length, ambient
/// temperature, relative humidity, and CO₂ concentration.
#[derive(Debug, Clone, Copy)]
pub struct TransmissivityModel {
    /// Ambient CO₂ concentration [ppm]
    pub co2_ppm: f64,
}

impl Default for TransmissivityModel {
    fn default() -> Self {
        Self { co2_ppm: 400.0 }
    }
}

impl TransmissivityModel {
    /// Transmissivity over `path_m` at ambient temperature `t_amb_k` and
    /// relative humidity `rel_humidity` (0–1).
    pub fn transmissivity(&self, path_m: f64, t_amb_k: f64, rel_humidity: f64) -> f64 {
        let path = path_m.max(1e-3);
        // Saturated water vapor pressure [mmHg].
        let p_sat_mmhg = (20.386 - 5132.0 / t_amb_k).exp();
        let x_h2o = (rel_humidity * path * p_sat_mmhg * 288.651 / t_amb_k).max(1e-9);
        let x_co2 = (path * (self.co2_ppm / 335.0) * 273.0 / t_amb_k).max(1e-9);

        let lw = x_h2o.log10();
        let lc = x_co2.log10();
        let tau = 1.006 - 0.01171 * lw - 0.02368 * lw * lw - 0.03188 * lc + 0.001164 * lc * lc;
        tau.clamp(0.0, 1.0)
    }
}

/// Multi-point source discretization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MultiPointConfig {
    /// Number of point sources along the visible centerline.
    pub sources: usize,
    /// Fraction of the visible length where source weighting peaks.
    pub waist_fraction: f64,
    /// Geometric weight ratio applied past the waist.
    pub taper_ratio: f64,
}

impl Default for MultiPointConfig {
    fn default() -> Self {
        Self {
            sources: 50,
            waist_fraction: 0.75,
            taper_ratio: 0.8,
        }
    }
}

impl MultiPointConfig {
    fn validate(&self) -> FlameResult<()> {
        if self.sources < 2 {
            return Err(FlameError::Configuration {
                what: "multi-point model needs at least two sources",
            });
        }
        if !(self.waist_fraction > 0.0 && self.waist_fraction < 1.0) {
            return Err(FlameError::Configuration {
                what: "waist fraction must lie in (0, 1)",
            });
        }
        if !(self.taper_ratio > 0.0 && self.taper_ratio < 1.0) {
            return Err(FlameError::Configuration {
                what: "taper ratio must lie in (0, 1)",
            });
        }
        Ok(())
    }

    /// Normalized source weights: linear ramp to the waist index, geometric
    /// taper past it.
    fn weights(&self) -> Vec<f64> {
        let n = self.sources;
        let waist = ((n as f64 * self.waist_fraction) as usize).clamp(1, n - 1);
        let mut w = Vec::with_capacity(n);
        for i in 0..n {
            if i < waist {
                w.push((i + 1) as f64 / waist as f64);
            } else {
                w.push(self.taper_ratio.powi((i - waist) as i32 + 1));
            }
        }
        let total: f64 = w.iter().sum();
        for wi in &mut w {
            *wi /= total;
        }
        w
    }
}

/// Radiative source model selection.
#[derive(Debug, Clone, Copy)]
pub enum RadiationModel {
    MultiPoint(MultiPointConfig),
    SinglePoint,
}

impl Default for RadiationModel {
    fn default() -> Self {
        Self::MultiPoint(MultiPointConfig::default())
    }
}

/// Empirical normalized axial radiant-fraction curve for the single-point
/// model: (axial position / visible length, curve value).
const AXIAL_CURVE: [(f64, f64); 9] = [
    (0.0, 0.25),
    (0.2, 0.55),
    (0.4, 0.85),
    (0.6, 1.0),
    (0.8, 0.95),
    (1.0, 0.75),
    (1.2, 0.5),
    (1.5, 0.3),
    (2.0, 0.2),
];

fn axial_curve(xi: f64) -> f64 {
    if xi <= AXIAL_CURVE[0].0 {
        return AXIAL_CURVE[0].1;
    }
    if xi >= AXIAL_CURVE[AXIAL_CURVE.len() - 1].0 {
        return AXIAL_CURVE[AXIAL_CURVE.len() - 1].1;
    }
    for pair in AXIAL_CURVE.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if xi <= x1 {
            return y0 + (y1 - y0) * (xi - x0) / (x1 - x0);
        }
    }
    AXIAL_CURVE[AXIAL_CURVE.len() - 1].1
}

impl Flame {
    /// Radiative heat flux [W/m²] at arbitrary 3-D observer coordinates.
    ///
    /// This is the sole interface the risk layer uses to obtain
    /// thermal-hazard data. The flame lies in the x–y plane; observers may
    /// be anywhere in (x, y, z).
    pub fn heat_flux(
        &self,
        model: &RadiationModel,
        transmissivity: &TransmissivityModel,
        observers: &[[f64; 3]],
        rel_humidity: f64,
    ) -> FlameResult<Vec<f64>> {
        if !(0.0..=1.0).contains(&rel_humidity) {
            return Err(FlameError::InputValidation {
                what: "relative humidity must lie in [0, 1]",
            });
        }
        match model {
            RadiationModel::MultiPoint(config) => {
                self.multi_point_flux(config, transmissivity, observers, rel_humidity)
            }
            RadiationModel::SinglePoint => {
                self.single_point_flux(transmissivity, observers, rel_humidity)
            }
        }
    }

    /// Convenience scalar query.
    pub fn heat_flux_at(
        &self,
        model: &RadiationModel,
        transmissivity: &TransmissivityModel,
        observer: [f64; 3],
        rel_humidity: f64,
    ) -> FlameResult<f64> {
        Ok(self.heat_flux(model, transmissivity, &[observer], rel_humidity)?[0])
    }

    fn multi_point_flux(
        &self,
        config: &MultiPointConfig,
        transmissivity: &TransmissivityModel,
        observers: &[[f64; 3]],
        rel_humidity: f64,
    ) -> FlameResult<Vec<f64>> {
        config.validate()?;
        let scalars = self.scalars();
        let t_amb = self.ambient().temperature().value;
        let weights = config.weights();
        let n = config.sources;

        // Sources along the visible centerline.
        let positions: Vec<(f64, f64)> = (0..n)
            .map(|i| {
                let s = scalars.visible_length * (i as f64 + 0.5) / n as f64;
                self.centerline_position(s)
            })
            .collect();
        debug!(
            sources = n,
            visible_length = scalars.visible_length,
            "multi-point flux evaluation"
        );

        let flux = observers
            .iter()
            .map(|obs| {
                let mut q = 0.0;
                for ((sx, sy), w) in positions.iter().zip(weights.iter()) {
                    let dx = obs[0] - sx;
                    let dy = obs[1] - sy;
                    let dz = obs[2];
                    let r2 = (dx * dx + dy * dy + dz * dz).max(1e-6);
                    let r = r2.sqrt();
                    let tau = transmissivity.transmissivity(r, t_amb, rel_humidity);
                    q += w * scalars.radiant_power * tau / (4.0 * PI * r2);
                }
                q
            })
            .collect();
        Ok(flux)
    }

    fn single_point_flux(
        &self,
        transmissivity: &TransmissivityModel,
        observers: &[[f64; 3]],
        rel_humidity: f64,
    ) -> FlameResult<Vec<f64>> {
        let scalars = self.scalars();
        let t_amb = self.ambient().temperature().value;
        let (sx, sy) = self.centerline_position(0.5 * scalars.visible_length);
        let theta0 = self
            .trajectory()
            .theta
            .first()
            .copied()
            .unwrap_or(0.0);
        let (dir_x, dir_y) = (theta0.cos(), theta0.sin());

        let flux = observers
            .iter()
            .map(|obs| {
                // Normalized axial position of the observer along the
                // release axis.
                let axial = (obs[0] * dir_x + obs[1] * dir_y) / scalars.visible_length;
                let curve = axial_curve(axial.max(0.0));

                let dx = obs[0] - sx;
                let dy = obs[1] - sy;
                let dz = obs[2];
                let r2 = (dx * dx + dy * dy + dz * dz).max(1e-6);
                let r = r2.sqrt();
                let tau = transmissivity.transmissivity(r, t_amb, rel_humidity);
                curve * scalars.radiant_power * tau / (4.0 * PI * r2)
            })
            .collect();
        Ok(flux)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transmissivity_bounds_and_trends() {
        let model = TransmissivityModel::default();
        let tau_near = model.transmissivity(1.0, 293.0, 0.5);
        let tau_far = model.transmissivity(100.0, 293.0, 0.5);
        assert!(tau_near > 0.9 && tau_near <= 1.0, "tau_near = {tau_near}");
        assert!(tau_far < tau_near, "attenuation must grow with path");

        let tau_dry = model.transmissivity(10.0, 293.0, 0.1);
        let tau_wet = model.transmissivity(10.0, 293.0, 0.9);
        assert!(tau_wet < tau_dry, "humid air absorbs more");
    }

    #[test]
    fn multi_point_weights_normalize_and_taper() {
        let config = MultiPointConfig::default();
        let w = config.weights();
        assert_eq!(w.len(), config.sources);
        let sum: f64 = w.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);

        // Ramp up to the waist, taper past it.
        let waist = (config.sources as f64 * config.waist_fraction) as usize;
        assert!(w[1] > w[0]);
        assert!(w[waist + 1] > w[waist + 2]);
    }

    #[test]
    fn axial_curve_peaks_mid_flame() {
        assert!(axial_curve(0.6) > axial_curve(0.0));
        assert!(axial_curve(0.6) > axial_curve(2.0));
        // Clamped outside the table.
        assert_eq!(axial_curve(-1.0), AXIAL_CURVE[0].1);
        assert_eq!(axial_curve(5.0), AXIAL_CURVE[AXIAL_CURVE.len() - 1].1);
    }

    #[test]
    fn bad_config_rejected() {
        let bad = MultiPointConfig {
            sources: 1,
            ..MultiPointConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = MultiPointConfig {
            waist_fraction: 1.5,
            ..MultiPointConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn transmissivity_stays_in_unit_interval(
            path in 1e-3_f64..1e4,
            t_amb in 230.0_f64..320.0,
            rh in 0.0_f64..=1.0,
        ) {
            let model = TransmissivityModel::default();
            let tau = model.transmissivity(path, t_amb, rh);
            prop_assert!((0.0..=1.0).contains(&tau), "tau = {tau}");
        }
    }
}
