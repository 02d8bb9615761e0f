//! Combustion chemistry closure.
//!
//! Maps mixture fraction to equilibrium-product temperature, molar mass, and
//! density via a complete-combustion enthalpy balance evaluated on a fixed
//! mixture-fraction grid, exposed as monotone piecewise-linear interpolants.
//!
//! One chemistry table is valid for one (reactant temperature, carbon count,
//! pressure) key; the flame invalidates and rebuilds it only when the active
//! conditions diverge from the cached key beyond a tight tolerance.

use crate::error::{FlameError, FlameResult};
use pf_core::units::constants::R_UNIVERSAL;
use pf_core::units::{k, pa};
use pf_fluids::{Composition, EquationOfState, FuelProperties, Species, StateInput, X_O2_AIR};
use tracing::debug;

/// Conditions a chemistry table was built for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChemistryKey {
    /// Reactant (released fluid) temperature [K]
    pub t_reactant: f64,
    /// Carbon atoms per fuel molecule
    pub carbon_count: u32,
    /// Ambient pressure [Pa]
    pub p: f64,
}

/// Tolerances for cache-validity comparison.
#[derive(Debug, Clone, Copy)]
pub struct ChemistryTolerances {
    /// Allowed reactant-temperature drift [K]
    pub dt: f64,
    /// Allowed pressure drift [Pa]
    pub dp: f64,
}

impl Default for ChemistryTolerances {
    fn default() -> Self {
        Self { dt: 0.5, dp: 100.0 }
    }
}

/// Mixture-fraction → product-property closure for one fuel and key.
#[derive(Debug, Clone)]
pub struct CombustionChemistry {
    fuel: FuelProperties,
    key: ChemistryKey,
    t_ambient: f64,
    fstoich: f64,
    grid_f: Vec<f64>,
    grid_t: Vec<f64>,
    grid_mw: Vec<f64>,
    grid_rho: Vec<f64>,
}

impl CombustionChemistry {
    /// Build the product table for a fuel at the given key conditions.
    ///
    /// `t_reactant` is the released-fluid temperature entering the flame
    /// zone; `t_ambient` the entrained-air temperature.
    pub fn build(
        eos: &dyn EquationOfState,
        fuel_species: Species,
        t_reactant: f64,
        t_ambient: f64,
        p: f64,
    ) -> FlameResult<Self> {
        if !(t_reactant > 0.0 && t_ambient > 0.0 && p > 0.0) {
            return Err(FlameError::InputValidation {
                what: "chemistry conditions must be positive",
            });
        }
        let fuel = FuelProperties::for_species(fuel_species)?;
        let fstoich = fuel.stoich_mixture_fraction();

        let fuel_comp = Composition::pure(fuel_species);
        // Air as its O2/N2 split so reactant and product enthalpies share a
        // consistent basis.
        let air_comp = Composition::from_mole_fractions(vec![
            (Species::O2, X_O2_AIR),
            (Species::N2, 1.0 - X_O2_AIR),
        ])?;

        let h_fuel = eos
            .resolve(
                StateInput::PT {
                    p: pa(p),
                    t: k(t_reactant),
                },
                &fuel_comp,
            )?
            .h;
        let h_air = eos
            .resolve(
                StateInput::PT {
                    p: pa(p),
                    t: k(t_ambient),
                },
                &air_comp,
            )?
            .h;

        let grid_f = Self::mixture_fraction_grid(fstoich);
        let mut grid_t = Vec::with_capacity(grid_f.len());
        let mut grid_mw = Vec::with_capacity(grid_f.len());
        let mut grid_rho = Vec::with_capacity(grid_f.len());

        for &f in &grid_f {
            let (products, burned_mass) = Self::product_composition(&fuel, f)?;
            let h_target = f * h_fuel + (1.0 - f) * h_air + burned_mass * fuel.heat_of_combustion;
            let t = eos
                .temperature_from_h(h_target, pa(p), &products)?
                .value;
            let mw = products.molar_mass();
            grid_t.push(t);
            grid_mw.push(mw);
            grid_rho.push(p * mw / (R_UNIVERSAL * t));
        }

        debug!(
            fuel = fuel_species.key(),
            fstoich,
            t_ad = Self::interp(&grid_f, &grid_t, fstoich),
            points = grid_f.len(),
            "combustion chemistry table built"
        );

        Ok(Self {
            fuel,
            key: ChemistryKey {
                t_reactant,
                carbon_count: fuel_species.carbon_count(),
                p,
            },
            t_ambient,
            fstoich,
            grid_f,
            grid_t,
            grid_mw,
            grid_rho,
        })
    }

    /// Mixture-fraction grid refined around stoichiometric.
    fn mixture_fraction_grid(fstoich: f64) -> Vec<f64> {
        let mut grid = Vec::new();
        // Lean branch up to stoichiometric.
        for i in 0..=24 {
            grid.push(fstoich * i as f64 / 24.0);
        }
        // Near-stoichiometric rich branch.
        let rich_knee = (10.0 * fstoich).min(0.9);
        for i in 1..=24 {
            grid.push(fstoich + (rich_knee - fstoich) * i as f64 / 24.0);
        }
        // Remainder out to pure fuel.
        for i in 1..=10 {
            grid.push(rich_knee + (1.0 - rich_knee) * i as f64 / 10.0);
        }
        grid
    }

    /// Complete-combustion product composition at mixture fraction `f`.
    ///
    /// Returns the composition and the burned fuel mass per unit mixture
    /// mass.
    fn product_composition(
        fuel: &FuelProperties,
        f: f64,
    ) -> FlameResult<(Composition, f64)> {
        let mw_fuel = fuel.species.molar_mass();
        let mw_air = Species::Air.molar_mass();

        // Moles per kg of mixture.
        let n_fuel = f / mw_fuel;
        let n_air = (1.0 - f) / mw_air;
        let n_o2 = n_air * X_O2_AIR;
        let n_n2 = n_air - n_o2;

        let n_burn = n_fuel.min(n_o2 / fuel.o2_moles_per_fuel_mole);

        let mut moles = vec![
            (fuel.species, n_fuel - n_burn),
            (Species::O2, n_o2 - fuel.o2_moles_per_fuel_mole * n_burn),
            (Species::N2, n_n2),
            (Species::CO2, fuel.co2_moles_per_fuel_mole() * n_burn),
            (Species::H2O, fuel.h2o_moles_per_fuel_mole() * n_burn),
        ];
        moles.retain(|(_, n)| *n > 1e-15);

        let comp = Composition::from_mole_fractions(moles)?;
        Ok((comp, n_burn * mw_fuel))
    }

    fn interp(grid_x: &[f64], grid_y: &[f64], x: f64) -> f64 {
        if x <= grid_x[0] {
            return grid_y[0];
        }
        if x >= *grid_x.last().unwrap() {
            return *grid_y.last().unwrap();
        }
        let idx = grid_x.partition_point(|&g| g < x).max(1);
        let (x0, x1) = (grid_x[idx - 1], grid_x[idx]);
        let (y0, y1) = (grid_y[idx - 1], grid_y[idx]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }

    /// True when the active conditions diverge from the cached key beyond
    /// tolerance.
    pub fn needs_rebuild(
        &self,
        t_reactant: f64,
        carbon_count: u32,
        p: f64,
        tol: &ChemistryTolerances,
    ) -> bool {
        carbon_count != self.key.carbon_count
            || (t_reactant - self.key.t_reactant).abs() > tol.dt
            || (p - self.key.p).abs() > tol.dp
    }

    pub fn key(&self) -> ChemistryKey {
        self.key
    }

    pub fn fuel(&self) -> &FuelProperties {
        &self.fuel
    }

    pub fn ambient_temperature(&self) -> f64 {
        self.t_ambient
    }

    /// Stoichiometric mixture fraction.
    pub fn fstoich(&self) -> f64 {
        self.fstoich
    }

    /// Product temperature [K] at mixture fraction f.
    pub fn t_prod(&self, f: f64) -> f64 {
        Self::interp(&self.grid_f, &self.grid_t, f)
    }

    /// Product molar mass [kg/kmol] at mixture fraction f.
    pub fn mw_prod(&self, f: f64) -> f64 {
        Self::interp(&self.grid_f, &self.grid_mw, f)
    }

    /// Product density [kg/m³] at mixture fraction f.
    pub fn rho_prod(&self, f: f64) -> f64 {
        Self::interp(&self.grid_f, &self.grid_rho, f)
    }

    /// dρ/df by central difference on the interpolant.
    pub fn drho_df(&self, f: f64) -> f64 {
        let df = 1e-6;
        let lo = (f - df).max(0.0);
        let hi = (f + df).min(1.0);
        (self.rho_prod(hi) - self.rho_prod(lo)) / (hi - lo)
    }

    /// Adiabatic flame temperature (product temperature at stoichiometric).
    pub fn t_adiabatic(&self) -> f64 {
        self.t_prod(self.fstoich)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_fluids::IdealGasModel;

    fn hydrogen_chem() -> CombustionChemistry {
        let eos = IdealGasModel::new();
        CombustionChemistry::build(&eos, Species::H2, 293.0, 293.0, 101_325.0).unwrap()
    }

    #[test]
    fn endpoints_recover_reactant_states() {
        let chem = hydrogen_chem();
        // Pure air: ambient temperature, air-like density.
        assert!((chem.t_prod(0.0) - 293.0).abs() < 1.0);
        assert!((chem.rho_prod(0.0) - 1.19).abs() < 0.05);
        // Pure fuel: reactant temperature, hydrogen-like molar mass.
        assert!((chem.t_prod(1.0) - 293.0).abs() < 1.0);
        assert!((chem.mw_prod(1.0) - 2.016).abs() < 1e-6);
    }

    #[test]
    fn temperature_peaks_at_stoichiometric() {
        let chem = hydrogen_chem();
        let fs = chem.fstoich();
        assert!((fs - 0.0284).abs() < 0.001);

        let t_ad = chem.t_adiabatic();
        // Complete combustion without dissociation: expect 2300–2800 K.
        assert!(t_ad > 2200.0 && t_ad < 2800.0, "T_ad = {t_ad}");
        assert!(t_ad > chem.t_prod(0.5 * fs));
        assert!(t_ad > chem.t_prod(4.0 * fs));
        assert!(t_ad > chem.t_prod(0.0));
        assert!(t_ad > chem.t_prod(1.0));
    }

    #[test]
    fn hot_products_are_light() {
        let chem = hydrogen_chem();
        let rho_f = chem.rho_prod(chem.fstoich());
        // Stoichiometric products around 0.1 kg/m³ at ambient pressure.
        assert!(rho_f > 0.05 && rho_f < 0.25, "rho_f = {rho_f}");
        assert!(rho_f < chem.rho_prod(0.0));
    }

    #[test]
    fn methane_chemistry_is_cooler_than_hydrogen() {
        let eos = IdealGasModel::new();
        let h2 = hydrogen_chem();
        let ch4 =
            CombustionChemistry::build(&eos, Species::CH4, 293.0, 293.0, 101_325.0).unwrap();
        assert!(ch4.t_adiabatic() < h2.t_adiabatic());
        assert!(ch4.t_adiabatic() > 2000.0, "T_ad = {}", ch4.t_adiabatic());
        // Methane stoichiometric fraction is higher than hydrogen's.
        assert!(ch4.fstoich() > h2.fstoich());
    }

    #[test]
    fn cache_key_tolerances() {
        let chem = hydrogen_chem();
        let tol = ChemistryTolerances::default();
        // Within tolerance: keep the cache.
        assert!(!chem.needs_rebuild(293.2, 0, 101_350.0, &tol));
        // Temperature drift beyond tolerance.
        assert!(chem.needs_rebuild(300.0, 0, 101_325.0, &tol));
        // Different fuel family.
        assert!(chem.needs_rebuild(293.0, 1, 101_325.0, &tol));
        // Pressure drift.
        assert!(chem.needs_rebuild(293.0, 0, 150_000.0, &tol));
    }

    #[test]
    fn density_slope_changes_sign_across_stoichiometric() {
        let chem = hydrogen_chem();
        let fs = chem.fstoich();
        // Density falls toward the flame on the lean side.
        assert!(chem.drho_df(0.3 * fs) < 0.0);
        // Interpolants stay finite everywhere.
        for i in 0..=100 {
            let f = i as f64 / 100.0;
            assert!(chem.rho_prod(f).is_finite() && chem.rho_prod(f) > 0.0);
            assert!(chem.t_prod(f).is_finite() && chem.t_prod(f) > 0.0);
        }
    }

    #[test]
    fn non_fuel_species_rejected() {
        let eos = IdealGasModel::new();
        assert!(
            CombustionChemistry::build(&eos, Species::N2, 293.0, 293.0, 101_325.0).is_err()
        );
    }
}
