//! Integration tests: ignited release scenarios.

use pf_core::units::{k, m, pa};
use pf_flame::{Flame, FlameOptions, MultiPointConfig, RadiationModel, TransmissivityModel};
use pf_fluids::{Composition, FluidState, IdealGasModel, Species, StateInput};
use pf_jet::Orifice;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();
}

fn state(species: Species, p: f64, t: f64) -> FluidState {
    let eos = IdealGasModel::new();
    FluidState::new(
        &eos,
        StateInput::PT { p: pa(p), t: k(t) },
        Composition::pure(species),
    )
    .unwrap()
}

/// A subsonic, low-pressure methane release ignites into a finite flame
/// without choking at the orifice.
#[test]
fn subsonic_methane_flame_is_unchoked_with_finite_length() {
    init_logging();
    let eos = IdealGasModel::new();
    let upstream = state(Species::CH4, 115_000.0, 293.0);
    let ambient = state(Species::Air, 101_325.0, 293.0);
    let orifice = Orifice::new(m(0.005), 0.8).unwrap();

    let flame =
        Flame::solve(&eos, &upstream, &orifice, &ambient, FlameOptions::default()).unwrap();

    assert!(!flame.developing_flow().choked());
    let length = flame.length();
    assert!(length.is_finite());
    assert!(length > 0.0, "visible length = {length}");
    assert!(flame.width() > 0.0);
}

/// Choked hydrogen flame: heat flux is positive everywhere and decays with
/// distance from the flame.
#[test]
fn hydrogen_flame_heat_flux_decays_with_distance() {
    init_logging();
    let eos = IdealGasModel::new();
    let upstream = state(Species::H2, 20.0e6, 293.0);
    let ambient = state(Species::Air, 101_325.0, 293.0);
    let orifice = Orifice::new(m(0.001), 1.0).unwrap();

    let flame =
        Flame::solve(&eos, &upstream, &orifice, &ambient, FlameOptions::default()).unwrap();
    assert!(flame.developing_flow().choked());

    let model = RadiationModel::default();
    let tau = TransmissivityModel::default();
    let mid = 0.5 * flame.length();

    let observers = [
        [mid, -1.0, 0.0],
        [mid, -3.0, 0.0],
        [mid, -10.0, 0.0],
        [mid, -3.0, 4.0],
    ];
    let flux = flame.heat_flux(&model, &tau, &observers, 0.89).unwrap();

    assert_eq!(flux.len(), observers.len());
    for q in &flux {
        assert!(q.is_finite() && *q > 0.0, "flux = {q}");
    }
    assert!(flux[0] > flux[1]);
    assert!(flux[1] > flux[2]);
    // Out-of-plane observer at the same lateral offset sees less than the
    // in-plane one.
    assert!(flux[3] < flux[1]);
}

/// The two source models agree on order of magnitude away from the flame.
#[test]
fn single_and_multi_point_models_are_comparable() {
    init_logging();
    let eos = IdealGasModel::new();
    let upstream = state(Species::H2, 10.0e6, 293.0);
    let ambient = state(Species::Air, 101_325.0, 293.0);
    let orifice = Orifice::new(m(0.001), 1.0).unwrap();

    let flame =
        Flame::solve(&eos, &upstream, &orifice, &ambient, FlameOptions::default()).unwrap();
    let tau = TransmissivityModel::default();
    let observer = [0.5 * flame.length(), -4.0, 0.0];

    let q_multi = flame
        .heat_flux_at(
            &RadiationModel::MultiPoint(MultiPointConfig::default()),
            &tau,
            observer,
            0.5,
        )
        .unwrap();
    let q_single = flame
        .heat_flux_at(&RadiationModel::SinglePoint, &tau, observer, 0.5)
        .unwrap();

    assert!(q_multi > 0.0 && q_single > 0.0);
    let ratio = q_multi / q_single;
    assert!(ratio > 0.2 && ratio < 5.0, "ratio = {ratio}");
}

/// Repeated length queries with unchanged conditions return identical
/// values and leave the chemistry cache untouched.
#[test]
fn flame_length_is_idempotent_across_resolves() {
    init_logging();
    let eos = IdealGasModel::new();
    let upstream = state(Species::H2, 10.0e6, 293.0);
    let ambient = state(Species::Air, 101_325.0, 293.0);
    let orifice = Orifice::new(m(0.001), 1.0).unwrap();

    let mut flame =
        Flame::solve(&eos, &upstream, &orifice, &ambient, FlameOptions::default()).unwrap();
    let l1 = flame.length();
    assert_eq!(flame.length(), l1);

    // Re-solving under the same ambient reuses the chemistry cache and
    // reproduces the length exactly.
    let same_ambient = state(Species::Air, 101_325.0, 293.0);
    flame.update_ambient(&eos, same_ambient).unwrap();
    assert_eq!(flame.chemistry_rebuilds(), 0);
    assert_eq!(flame.length(), l1);
}

/// Relative humidity outside [0, 1] is rejected before evaluation.
#[test]
fn invalid_humidity_rejected() {
    init_logging();
    let eos = IdealGasModel::new();
    let upstream = state(Species::H2, 10.0e6, 293.0);
    let ambient = state(Species::Air, 101_325.0, 293.0);
    let orifice = Orifice::new(m(0.001), 1.0).unwrap();

    let flame =
        Flame::solve(&eos, &upstream, &orifice, &ambient, FlameOptions::default()).unwrap();
    let err = flame
        .heat_flux(
            &RadiationModel::default(),
            &TransmissivityModel::default(),
            &[[1.0, 1.0, 0.0]],
            1.5,
        )
        .unwrap_err();
    assert!(matches!(err, pf_flame::FlameError::InputValidation { .. }));
}
