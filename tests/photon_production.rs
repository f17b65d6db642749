// Photon-production reactions built from the MTRP/SIGP/DLWP blocks

mod common;

use approx::assert_relative_eq;
use common::{hydrogen_with_photons_table, THERMAL_ENERGY};
use mc_collision::{
    EnergyGrid, GridArena, NuclearReactionAceFactory, NuclearReactionType, NuclideAceFactory, ParticleBank,
    ParticleKind, ParticleMode, ParticleState, PhotonProductionAceFactory, SimulationProperties,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_yield_based_and_cross_section_based_reactions() {
    let data = hydrogen_with_photons_table();
    let grids = GridArena::new(EnergyGrid::new(data.energy_grid.clone()).unwrap());
    let reactions = NuclearReactionAceFactory::new(&data, &grids, 0.0).unwrap();
    let photons = PhotonProductionAceFactory::new(&data, &grids, &reactions)
        .create_reactions()
        .unwrap();
    let capture = reactions.reaction(NuclearReactionType::CAPTURE).unwrap();

    let yield_based = &photons[&102001];
    assert_eq!(yield_based.base_reaction_type(), NuclearReactionType::CAPTURE);
    assert_relative_eq!(yield_based.cross_section(&grids, 1e-11), 2.0 * 1.17724711e3, max_relative = 1e-14);
    assert_relative_eq!(
        yield_based.cross_section(&grids, 20.0),
        2.0 * capture.cross_section(&grids, 20.0),
        max_relative = 1e-14
    );

    let tabulated = &photons[&102002];
    assert_eq!(tabulated.threshold_energy(&grids), 10.0);
    assert_eq!(tabulated.cross_section(&grids, 10.0), 1.0);
    assert_relative_eq!(tabulated.cross_section(&grids, 15.0), 1.5);
    assert_eq!(tabulated.cross_section(&grids, 20.0), 2.0);
    assert_eq!(tabulated.cross_section(&grids, 5.0), 0.0);
}

#[test]
fn test_neutron_photon_mode_banks_capture_gammas() {
    let properties = SimulationProperties {
        particle_mode: ParticleMode::NeutronPhoton,
        ..Default::default()
    };
    let center = NuclideAceFactory::new(&properties)
        .create_scattering_center(&hydrogen_with_photons_table(), None)
        .unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let mut bank = ParticleBank::new();
    let mut neutron = ParticleState::neutron([0.0; 3], [0.0, 0.0, 1.0], THERMAL_ENERGY);
    center.collide_analogue(&mut neutron, &mut bank, &mut rng).unwrap();

    let photons: Vec<_> = bank
        .iter()
        .filter(|banked| banked.particle.kind == ParticleKind::Photon)
        .collect();
    assert_eq!(photons.len(), 1);
    assert_relative_eq!(photons[0].particle.energy, 2.2);
}

#[test]
fn test_neutron_mode_ignores_photon_blocks() {
    let properties = SimulationProperties::default();
    let center = NuclideAceFactory::new(&properties)
        .create_scattering_center(&hydrogen_with_photons_table(), None)
        .unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let mut bank = ParticleBank::new();
    for _ in 0..100 {
        let mut neutron = ParticleState::neutron([0.0; 3], [0.0, 0.0, 1.0], THERMAL_ENERGY);
        center.collide_analogue(&mut neutron, &mut bank, &mut rng).unwrap();
    }
    assert!(bank.iter().all(|banked| banked.particle.kind != ParticleKind::Photon));
}
