//! Fluid composition (pure or mixtures).

use crate::error::{FluidError, FluidResult};
use crate::species::{CpPoly, Species};
use pf_core::numeric::{Tolerances, nearly_equal};

/// Fluid composition defined by normalized mole fractions.
///
/// The composition is always normalized (mole fractions sum to 1.0).
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    /// Species and their mole fractions (always normalized to sum=1).
    items: Vec<(Species, f64)>,
}

impl Composition {
    /// Create a pure-species composition.
    pub fn pure(species: Species) -> Self {
        Self {
            items: vec![(species, 1.0)],
        }
    }

    /// Create a composition from mole fractions.
    ///
    /// Validates that all fractions are finite, non-negative, and have a positive sum,
    /// then normalizes to sum=1.
    pub fn from_mole_fractions(fractions: Vec<(Species, f64)>) -> FluidResult<Self> {
        if fractions.is_empty() {
            return Err(FluidError::InvalidArg {
                what: "empty composition",
            });
        }

        let mut sum = 0.0;
        for (_, frac) in &fractions {
            if !frac.is_finite() {
                return Err(FluidError::NonPhysical {
                    what: "non-finite mole fraction",
                });
            }
            if *frac < 0.0 {
                return Err(FluidError::NonPhysical {
                    what: "negative mole fraction",
                });
            }
            sum += frac;
        }

        if sum <= 0.0 || !sum.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "mole fractions sum to zero or non-finite",
            });
        }

        let normalized: Vec<(Species, f64)> = fractions
            .into_iter()
            .map(|(s, f)| (s, f / sum))
            .filter(|(_, f)| *f > 1e-15)
            .collect();

        if normalized.is_empty() {
            return Err(FluidError::NonPhysical {
                what: "all mole fractions negligible",
            });
        }

        Ok(Self { items: normalized })
    }

    /// Create a composition from mass fractions (converted to mole fractions).
    pub fn from_mass_fractions(fractions: Vec<(Species, f64)>) -> FluidResult<Self> {
        let molar = fractions
            .into_iter()
            .map(|(s, y)| (s, y / s.molar_mass()))
            .collect();
        Self::from_mole_fractions(molar)
    }

    /// Binary fuel/air mixture from the fuel mass fraction Y.
    ///
    /// This is the composition transition used along a diluting jet.
    pub fn fuel_air(fuel: Species, y_fuel: f64) -> FluidResult<Self> {
        if !(0.0..=1.0).contains(&y_fuel) || !y_fuel.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "fuel mass fraction outside [0, 1]",
            });
        }
        Self::from_mass_fractions(vec![(fuel, y_fuel), (Species::Air, 1.0 - y_fuel)])
    }

    /// Get mole fraction of a species (0.0 if not present).
    pub fn mole_fraction(&self, species: Species) -> f64 {
        self.items
            .iter()
            .find(|(s, _)| *s == species)
            .map(|(_, f)| *f)
            .unwrap_or(0.0)
    }

    /// Get mass fraction of a species (0.0 if not present).
    pub fn mass_fraction(&self, species: Species) -> f64 {
        let mw_mix = self.molar_mass();
        self.mole_fraction(species) * species.molar_mass() / mw_mix
    }

    /// Check if this is a pure-species composition.
    ///
    /// Returns `Some(species)` if exactly one species has fraction ≈1.0.
    pub fn is_pure(&self) -> Option<Species> {
        if self.items.len() == 1 {
            let (species, frac) = self.items[0];
            let tol = Tolerances {
                abs: 1e-10,
                rel: 1e-10,
            };
            if nearly_equal(frac, 1.0, tol) {
                return Some(species);
            }
        }
        None
    }

    /// Iterate over all species with non-zero mole fractions.
    pub fn iter(&self) -> impl Iterator<Item = (Species, f64)> + '_ {
        self.items.iter().copied()
    }

    /// Compute mixture molar mass [kg/kmol] from species mole fractions.
    pub fn molar_mass(&self) -> f64 {
        self.items
            .iter()
            .map(|(species, mole_frac)| species.molar_mass() * mole_frac)
            .sum()
    }

    /// Mole-fraction-weighted molar cp polynomial [kJ/(kmol·K)].
    pub fn cp_poly(&self) -> CpPoly {
        let mut mix = CpPoly {
            a: 0.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
        };
        for (species, x) in &self.items {
            let p = species.cp_poly();
            mix.a += x * p.a;
            mix.b += x * p.b;
            mix.c += x * p.c;
            mix.d += x * p.d;
        }
        mix
    }
}

/// Mixture molar mass [kg/kmol] for a binary fuel/air blend at fuel mass fraction Y.
///
/// Closed form used on the jet centerline, avoiding a composition allocation
/// per radial sample.
pub fn binary_molar_mass(fuel: Species, y_fuel: f64) -> f64 {
    let y = y_fuel.clamp(0.0, 1.0);
    1.0 / (y / fuel.molar_mass() + (1.0 - y) / Species::Air.molar_mass())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_composition() {
        let comp = Composition::pure(Species::H2);
        assert_eq!(comp.is_pure(), Some(Species::H2));
        assert_eq!(comp.mole_fraction(Species::H2), 1.0);
        assert_eq!(comp.mole_fraction(Species::N2), 0.0);
    }

    #[test]
    fn mixture_normalization_non_unit_sum() {
        let comp =
            Composition::from_mole_fractions(vec![(Species::O2, 2.0), (Species::N2, 8.0)]).unwrap();

        let tol = Tolerances {
            abs: 1e-10,
            rel: 1e-10,
        };
        assert!(nearly_equal(comp.mole_fraction(Species::O2), 0.2, tol));
        assert!(nearly_equal(comp.mole_fraction(Species::N2), 0.8, tol));
    }

    #[test]
    fn mass_to_mole_roundtrip() {
        let comp = Composition::from_mass_fractions(vec![
            (Species::H2, 0.0283),
            (Species::Air, 1.0 - 0.0283),
        ])
        .unwrap();

        let tol = Tolerances {
            abs: 1e-9,
            rel: 1e-9,
        };
        assert!(nearly_equal(comp.mass_fraction(Species::H2), 0.0283, tol));
        // H2 is light: small mass fraction, much larger mole fraction.
        assert!(comp.mole_fraction(Species::H2) > 0.25);
    }

    #[test]
    fn fuel_air_endpoints() {
        let pure_air = Composition::fuel_air(Species::H2, 0.0).unwrap();
        assert_eq!(pure_air.is_pure(), Some(Species::Air));

        let pure_fuel = Composition::fuel_air(Species::H2, 1.0).unwrap();
        assert_eq!(pure_fuel.is_pure(), Some(Species::H2));

        assert!(Composition::fuel_air(Species::H2, 1.2).is_err());
    }

    #[test]
    fn binary_molar_mass_limits() {
        let tol = Tolerances::default();
        assert!(nearly_equal(
            binary_molar_mass(Species::H2, 1.0),
            Species::H2.molar_mass(),
            tol
        ));
        assert!(nearly_equal(
            binary_molar_mass(Species::H2, 0.0),
            Species::Air.molar_mass(),
            tol
        ));
        // Between the endpoints, monotone in Y.
        let m1 = binary_molar_mass(Species::H2, 0.1);
        let m2 = binary_molar_mass(Species::H2, 0.2);
        assert!(m2 < m1);
    }

    #[test]
    fn invalid_inputs() {
        assert!(Composition::from_mole_fractions(vec![]).is_err());
        assert!(Composition::from_mole_fractions(vec![(Species::O2, -0.5)]).is_err());
        assert!(Composition::from_mole_fractions(vec![(Species::O2, f64::NAN)]).is_err());
        assert!(
            Composition::from_mole_fractions(vec![(Species::O2, 0.0), (Species::N2, 0.0)])
                .is_err()
        );
    }
}
