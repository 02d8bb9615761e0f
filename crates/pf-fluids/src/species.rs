//! Chemical species definitions.

/// Chemical species relevant for release and combustion modeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    /// Hydrogen (H₂)
    H2,
    /// Methane (CH₄)
    CH4,
    /// Propane (C₃H₈)
    C3H8,
    /// Oxygen (O₂)
    O2,
    /// Nitrogen (N₂)
    N2,
    /// Carbon dioxide (CO₂)
    CO2,
    /// Carbon monoxide (CO)
    CO,
    /// Water vapor (H₂O)
    H2O,
    /// Air (pseudo-pure mixture)
    Air,
}

/// Ideal-gas molar heat capacity polynomial, cp = a + bT + cT² + dT³ [kJ/(kmol·K)].
///
/// Standard cubic fits, nominal validity 273–1800 K; smooth extrapolation is
/// acceptable for the flame-product temperatures seen here.
#[derive(Debug, Clone, Copy)]
pub struct CpPoly {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Species {
    pub const ALL: [Species; 9] = [
        Species::H2,
        Species::CH4,
        Species::C3H8,
        Species::O2,
        Species::N2,
        Species::CO2,
        Species::CO,
        Species::H2O,
        Species::Air,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Species::H2 => "H2",
            Species::CH4 => "CH4",
            Species::C3H8 => "C3H8",
            Species::O2 => "O2",
            Species::N2 => "N2",
            Species::CO2 => "CO2",
            Species::CO => "CO",
            Species::H2O => "H2O",
            Species::Air => "Air",
        }
    }

    /// Get human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Species::H2 => "Hydrogen",
            Species::CH4 => "Methane",
            Species::C3H8 => "Propane",
            Species::O2 => "Oxygen",
            Species::N2 => "Nitrogen",
            Species::CO2 => "Carbon Dioxide",
            Species::CO => "Carbon Monoxide",
            Species::H2O => "Water",
            Species::Air => "Air",
        }
    }

    /// Get molar mass [kg/kmol] for this species.
    ///
    /// Values sourced from standard reference data (e.g., NIST).
    pub fn molar_mass(&self) -> f64 {
        match self {
            Species::H2 => 2.016,
            Species::CH4 => 16.043,
            Species::C3H8 => 44.097,
            Species::O2 => 31.999,
            Species::N2 => 28.014,
            Species::CO2 => 44.010,
            Species::CO => 28.010,
            Species::H2O => 18.015,
            Species::Air => 28.965,
        }
    }

    /// Carbon atoms per molecule (0 for pseudo-species Air).
    pub fn carbon_count(&self) -> u32 {
        match self {
            Species::H2 | Species::O2 | Species::N2 | Species::H2O | Species::Air => 0,
            Species::CH4 => 1,
            Species::C3H8 => 3,
            Species::CO2 | Species::CO => 1,
        }
    }

    /// Hydrogen atoms per molecule.
    pub fn hydrogen_count(&self) -> u32 {
        match self {
            Species::H2 => 2,
            Species::CH4 => 4,
            Species::C3H8 => 8,
            Species::H2O => 2,
            Species::O2 | Species::N2 | Species::CO2 | Species::CO | Species::Air => 0,
        }
    }

    /// Molar heat capacity polynomial coefficients [kJ/(kmol·K)].
    pub fn cp_poly(&self) -> CpPoly {
        match self {
            Species::H2 => CpPoly {
                a: 29.11,
                b: -0.1916e-2,
                c: 0.4003e-5,
                d: -0.8704e-9,
            },
            Species::CH4 => CpPoly {
                a: 19.89,
                b: 5.024e-2,
                c: 1.269e-5,
                d: -11.01e-9,
            },
            Species::C3H8 => CpPoly {
                a: -4.04,
                b: 30.48e-2,
                c: -15.72e-5,
                d: 31.74e-9,
            },
            Species::O2 => CpPoly {
                a: 25.48,
                b: 1.520e-2,
                c: -0.7155e-5,
                d: 1.312e-9,
            },
            Species::N2 => CpPoly {
                a: 28.90,
                b: -0.1571e-2,
                c: 0.8081e-5,
                d: -2.873e-9,
            },
            Species::CO2 => CpPoly {
                a: 22.26,
                b: 5.981e-2,
                c: -3.501e-5,
                d: 7.469e-9,
            },
            Species::CO => CpPoly {
                a: 28.16,
                b: 0.1675e-2,
                c: 0.5372e-5,
                d: -2.222e-9,
            },
            Species::H2O => CpPoly {
                a: 32.24,
                b: 0.1923e-2,
                c: 1.055e-5,
                d: -3.595e-9,
            },
            Species::Air => CpPoly {
                a: 28.11,
                b: 0.1967e-2,
                c: 0.4802e-5,
                d: -1.966e-9,
            },
        }
    }
}

impl std::str::FromStr for Species {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "H2" | "HYDROGEN" => Ok(Species::H2),
            "CH4" | "METHANE" => Ok(Species::CH4),
            "C3H8" | "PROPANE" => Ok(Species::C3H8),
            "O2" | "OXYGEN" => Ok(Species::O2),
            "N2" | "NITROGEN" => Ok(Species::N2),
            "CO2" | "CARBONDIOXIDE" | "CARBON DIOXIDE" => Ok(Species::CO2),
            "CO" | "CARBONMONOXIDE" | "CARBON MONOXIDE" => Ok(Species::CO),
            "H2O" | "WATER" => Ok(Species::H2O),
            "AIR" => Ok(Species::Air),
            _ => Err("unknown species"),
        }
    }
}

#[cfg(feature = "coolprop")]
impl Species {
    /// Map to rfluids Pure enum (internal use for CoolProp backend).
    pub(crate) fn rfluids_pure(&self) -> rfluids::substance::Pure {
        use rfluids::substance::Pure;
        match self {
            Species::H2 => Pure::Hydrogen,
            Species::CH4 => Pure::Methane,
            Species::C3H8 => Pure::nPropane,
            Species::O2 => Pure::Oxygen,
            Species::N2 => Pure::Nitrogen,
            Species::CO2 => Pure::CarbonDioxide,
            Species::CO => Pure::CarbonMonoxide,
            Species::H2O => Pure::Water,
            Species::Air => Pure::Air,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_aliases() {
        assert_eq!("hydrogen".parse::<Species>().unwrap(), Species::H2);
        assert_eq!("Propane".parse::<Species>().unwrap(), Species::C3H8);
        assert_eq!("Carbon Dioxide".parse::<Species>().unwrap(), Species::CO2);
        assert!("xenon".parse::<Species>().is_err());
    }

    #[test]
    fn canonical_key_roundtrip() {
        for species in Species::ALL {
            let parsed = species
                .key()
                .parse::<Species>()
                .expect("canonical key should parse");
            assert_eq!(parsed, species);
        }
    }

    #[test]
    fn cp_positive_over_working_range() {
        for species in Species::ALL {
            let p = species.cp_poly();
            let mut t = 250.0;
            while t <= 2500.0 {
                let cp = p.a + p.b * t + p.c * t * t + p.d * t * t * t;
                assert!(cp > 0.0, "{} cp at {t} K = {cp}", species.key());
                t += 50.0;
            }
        }
    }

    #[test]
    fn atom_counts() {
        assert_eq!(Species::CH4.carbon_count(), 1);
        assert_eq!(Species::C3H8.hydrogen_count(), 8);
        assert_eq!(Species::H2.carbon_count(), 0);
    }
}
