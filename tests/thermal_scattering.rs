// Joining S(alpha,beta) thermal reactions to free-atom elastic scattering

mod common;

use approx::assert_relative_eq;
use common::{hydrogen_table, init_logging, thermal_table, THERMAL_ENERGY};
use mc_collision::{NuclearReactionType, NuclideAceFactory, ParticleBank, ParticleState, SimulationProperties};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_thermal_and_standard_elastic_agree_at_cutoff() {
    init_logging();
    let properties = SimulationProperties::default();
    let nuclide = NuclideAceFactory::new(&properties)
        .create_nuclide(&hydrogen_table(), Some(&thermal_table()))
        .unwrap();
    let grids = nuclide.grids();

    let standard = nuclide.reaction(NuclearReactionType::ELASTIC).unwrap();
    let inelastic = nuclide.reaction(NuclearReactionType::S_ALPHA_BETA_INELASTIC).unwrap();
    let cutoff = standard.cross_section_table().s_alpha_beta_cutoff().unwrap();
    assert_eq!(cutoff, 1e-6);

    assert_eq!(
        inelastic.cross_section(grids, cutoff),
        standard.cross_section_table().evaluate_tabulated(grids, cutoff)
    );
    assert_eq!(standard.cross_section(grids, cutoff), 0.0);
    assert_eq!(standard.cross_section(grids, 0.5 * cutoff), 0.0);
    assert!(inelastic.cross_section(grids, 0.5 * cutoff) > 0.0);
    assert_eq!(inelastic.cross_section(grids, 2.0 * cutoff), 0.0);
}

#[test]
fn test_total_at_cutoff_counts_elastic_once() {
    let properties = SimulationProperties::default();
    let nuclide = NuclideAceFactory::new(&properties)
        .create_nuclide(&hydrogen_table(), Some(&thermal_table()))
        .unwrap();
    let cutoff = 1e-6;
    let below = nuclide.total_cross_section(cutoff * (1.0 - 1e-9));
    let at = nuclide.total_cross_section(cutoff);
    let above = nuclide.total_cross_section(cutoff * (1.0 + 1e-9));

    let parts = nuclide.reaction_cross_section(cutoff, NuclearReactionType::CAPTURE)
        + nuclide.reaction_cross_section(cutoff, NuclearReactionType::S_ALPHA_BETA_INELASTIC)
        + nuclide.reaction_cross_section(cutoff, NuclearReactionType::S_ALPHA_BETA_ELASTIC);
    assert_eq!(nuclide.reaction_cross_section(cutoff, NuclearReactionType::ELASTIC), 0.0);
    assert_relative_eq!(at, parts, max_relative = 1e-12);
    assert_relative_eq!(at, below, max_relative = 1e-6);

    // above the cutoff only the free-atom elastic and capture remain; the
    // step is the thermal elastic value, not a whole elastic cross section
    let thermal_elastic = nuclide.reaction_cross_section(cutoff, NuclearReactionType::S_ALPHA_BETA_ELASTIC);
    assert_relative_eq!(at - above, thermal_elastic, max_relative = 1e-6);
    assert!(at < 26.0);
}

#[test]
fn test_configured_cutoff_moves_the_join() {
    init_logging();
    let properties = SimulationProperties {
        s_alpha_beta_cutoff_energy: Some(1e-7),
        ..Default::default()
    };
    let nuclide = NuclideAceFactory::new(&properties)
        .create_nuclide(&hydrogen_table(), Some(&thermal_table()))
        .unwrap();
    let grids = nuclide.grids();
    let standard = nuclide.reaction(NuclearReactionType::ELASTIC).unwrap();
    let inelastic = nuclide.reaction(NuclearReactionType::S_ALPHA_BETA_INELASTIC).unwrap();

    assert_eq!(standard.cross_section_table().s_alpha_beta_cutoff(), Some(1e-7));
    assert_eq!(
        inelastic.cross_section(grids, 1e-7),
        standard.cross_section_table().evaluate_tabulated(grids, 1e-7)
    );
    assert_relative_eq!(
        nuclide.total_cross_section(2e-7),
        nuclide.total_cross_section_summed(2e-7),
        max_relative = 1e-8
    );
}

#[test]
fn test_thermal_collisions_stay_below_the_cutoff_range() {
    let properties = SimulationProperties::default();
    let nuclide = NuclideAceFactory::new(&properties)
        .create_nuclide(&hydrogen_table(), Some(&thermal_table()))
        .unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let mut bank = ParticleBank::new();
    for _ in 0..500 {
        let mut neutron = ParticleState::neutron([0.0; 3], [0.0, 0.0, 1.0], THERMAL_ENERGY);
        nuclide.collide_analogue(&mut neutron, &mut bank, &mut rng).unwrap();
        if !neutron.is_gone() {
            assert!(neutron.energy > 0.0);
            assert!(neutron.energy < 1e-6);
            let norm: f64 = neutron.direction.iter().map(|c| c * c).sum();
            assert_relative_eq!(norm, 1.0, max_relative = 1e-10);
        }
    }
}
