//! Fuel/combustion property catalog.
//!
//! This is the combustion-property provider interface: heat of combustion,
//! flammability limits, and stoichiometry data consumed by the flame
//! chemistry closure. Values are standard handbook data for the supported
//! fuels.

use crate::error::{FluidError, FluidResult};
use crate::species::Species;

/// Mole fraction of oxygen in dry air.
pub const X_O2_AIR: f64 = 0.2095;

/// Moles of nitrogen accompanying each mole of oxygen in air.
pub const N2_PER_O2: f64 = (1.0 - X_O2_AIR) / X_O2_AIR;

/// Combustion-relevant properties of a fuel species.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelProperties {
    pub species: Species,
    /// Lower heating value [J/kg fuel].
    pub heat_of_combustion: f64,
    /// Lower flammability limit [mole fraction fuel in air].
    pub lower_flammability_limit: f64,
    /// Upper flammability limit [mole fraction fuel in air].
    pub upper_flammability_limit: f64,
    /// Moles of O₂ consumed per mole of fuel for complete combustion.
    pub o2_moles_per_fuel_mole: f64,
    /// Planck-mean absorption coefficient of the hot products [1/m],
    /// used by the radiant-fraction correlation.
    pub planck_absorption: f64,
}

impl FuelProperties {
    /// Look up the catalog entry for a fuel species.
    ///
    /// Non-fuel species (air, products) are rejected.
    pub fn for_species(species: Species) -> FluidResult<Self> {
        let props = match species {
            Species::H2 => Self {
                species,
                heat_of_combustion: 119.96e6,
                lower_flammability_limit: 0.04,
                upper_flammability_limit: 0.75,
                o2_moles_per_fuel_mole: 0.5,
                planck_absorption: 0.23,
            },
            Species::CH4 => Self {
                species,
                heat_of_combustion: 50.02e6,
                lower_flammability_limit: 0.05,
                upper_flammability_limit: 0.15,
                o2_moles_per_fuel_mole: 2.0,
                planck_absorption: 0.51,
            },
            Species::C3H8 => Self {
                species,
                heat_of_combustion: 46.35e6,
                lower_flammability_limit: 0.021,
                upper_flammability_limit: 0.095,
                o2_moles_per_fuel_mole: 5.0,
                planck_absorption: 0.60,
            },
            _ => {
                return Err(FluidError::NotSupported {
                    what: "species is not a supported fuel",
                });
            }
        };
        Ok(props)
    }

    /// Stoichiometric air mass per unit fuel mass [kg air / kg fuel].
    pub fn stoich_air_mass_ratio(&self) -> f64 {
        let air_moles = self.o2_moles_per_fuel_mole / X_O2_AIR;
        air_moles * Species::Air.molar_mass() / self.species.molar_mass()
    }

    /// Stoichiometric mixture fraction [kg fuel / kg mixture].
    pub fn stoich_mixture_fraction(&self) -> f64 {
        1.0 / (1.0 + self.stoich_air_mass_ratio())
    }

    /// Moles of CO₂ produced per mole of fuel.
    pub fn co2_moles_per_fuel_mole(&self) -> f64 {
        f64::from(self.species.carbon_count())
    }

    /// Moles of H₂O produced per mole of fuel.
    pub fn h2o_moles_per_fuel_mole(&self) -> f64 {
        f64::from(self.species.hydrogen_count()) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hydrogen_stoichiometry() {
        let fuel = FuelProperties::for_species(Species::H2).unwrap();
        // Known value: ~34.2 kg air per kg H2, f_s ~ 0.0285
        let afr = fuel.stoich_air_mass_ratio();
        assert!((afr - 34.2).abs() < 0.5, "air/fuel ratio {afr}");
        let fs = fuel.stoich_mixture_fraction();
        assert!((fs - 0.0284).abs() < 0.001, "f_stoich {fs}");
        assert_eq!(fuel.co2_moles_per_fuel_mole(), 0.0);
        assert_eq!(fuel.h2o_moles_per_fuel_mole(), 1.0);
    }

    #[test]
    fn methane_stoichiometry() {
        let fuel = FuelProperties::for_species(Species::CH4).unwrap();
        // Known value: ~17.2 kg air per kg CH4
        let afr = fuel.stoich_air_mass_ratio();
        assert!((afr - 17.2).abs() < 0.4, "air/fuel ratio {afr}");
        assert_eq!(fuel.co2_moles_per_fuel_mole(), 1.0);
        assert_eq!(fuel.h2o_moles_per_fuel_mole(), 2.0);
    }

    #[test]
    fn non_fuel_rejected() {
        assert!(FuelProperties::for_species(Species::N2).is_err());
        assert!(FuelProperties::for_species(Species::Air).is_err());
    }

    #[test]
    fn flammability_limits_ordered() {
        for species in [Species::H2, Species::CH4, Species::C3H8] {
            let fuel = FuelProperties::for_species(species).unwrap();
            assert!(fuel.lower_flammability_limit < fuel.upper_flammability_limit);
            assert!(fuel.lower_flammability_limit > 0.0);
            assert!(fuel.upper_flammability_limit < 1.0);
        }
    }
}
