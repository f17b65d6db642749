// Decoupled photon-production reactions
//
// A photon-production reaction reports a photon production cross section and,
// when sampled, banks one photon whose weight carries the ratio of that cross
// section to the neutron total cross section at the collision energy.

use crate::bank::ParticleBank;
use crate::distribution::UnivariateDistribution;
use crate::grid::{GridArena, ReactionCrossSection};
use crate::particle::{ParticleKind, ParticleState};
use crate::physics::sample_isotropic_direction;
use crate::reaction_type::NuclearReactionType;
use crate::scattering::EnergyLaw;
use rand::RngCore;

/// How the photon production cross section is obtained
#[derive(Debug, Clone)]
pub enum PhotonProductionKind {
    /// Base neutron reaction cross section times a tabulated photon yield
    YieldBased {
        base_cross_section: ReactionCrossSection,
        photon_yield: UnivariateDistribution,
    },
    /// Cross section tabulated directly for photon production
    CrossSectionBased { cross_section: ReactionCrossSection },
}

/// One photon-production channel, keyed by its packed MT identifier
/// (base MT * 1000 + photon index)
#[derive(Debug, Clone)]
pub struct PhotonProductionReaction {
    id: u32,
    base_reaction_type: NuclearReactionType,
    kind: PhotonProductionKind,
    photon_energy: EnergyLaw,
}

impl PhotonProductionReaction {
    pub fn new(
        id: u32,
        base_reaction_type: NuclearReactionType,
        kind: PhotonProductionKind,
        photon_energy: EnergyLaw,
    ) -> Self {
        PhotonProductionReaction {
            id,
            base_reaction_type,
            kind,
            photon_energy,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn base_reaction_type(&self) -> NuclearReactionType {
        self.base_reaction_type
    }

    pub fn kind(&self) -> &PhotonProductionKind {
        &self.kind
    }

    /// Photon production cross section in barns
    pub fn cross_section(&self, grids: &GridArena, energy: f64) -> f64 {
        match &self.kind {
            PhotonProductionKind::YieldBased {
                base_cross_section,
                photon_yield,
            } => photon_yield.evaluate(energy) * base_cross_section.evaluate(grids, energy),
            PhotonProductionKind::CrossSectionBased { cross_section } => {
                cross_section.evaluate(grids, energy)
            }
        }
    }

    pub fn threshold_energy(&self, grids: &GridArena) -> f64 {
        match &self.kind {
            PhotonProductionKind::YieldBased {
                base_cross_section,
                photon_yield,
            } => base_cross_section
                .threshold_energy(grids)
                .max(photon_yield.lower_bound()),
            PhotonProductionKind::CrossSectionBased { cross_section } => {
                cross_section.threshold_energy(grids)
            }
        }
    }

    /// Bank one photon born from `neutron`. `total_cross_section` is the
    /// neutron total cross section at the neutron's energy.
    pub fn react(
        &self,
        neutron: &ParticleState,
        grids: &GridArena,
        total_cross_section: f64,
        bank: &mut ParticleBank,
        rng: &mut dyn RngCore,
    ) {
        let energy = neutron.energy;
        let mut photon = neutron.spawn_secondary(ParticleKind::Photon);
        let ratio = if total_cross_section > 0.0 {
            self.cross_section(grids, energy) / total_cross_section
        } else {
            0.0
        };
        photon.multiply_weight(ratio);
        photon.energy = self.photon_energy.sample(energy, rng);
        photon.direction = sample_isotropic_direction(rng);
        bank.push_from_reaction(photon, self.base_reaction_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::TabularDistribution;
    use crate::grid::{EnergyGrid, GridId};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn line(energy: f64) -> EnergyLaw {
        EnergyLaw::DiscretePhoton {
            primary: false,
            photon_energy: energy,
            awr: 1.0,
        }
    }

    #[test]
    fn test_yield_based_cross_section() {
        let grids = GridArena::new(EnergyGrid::new(vec![1e-11, 1.0, 20.0]).unwrap());
        let base = ReactionCrossSection::new(&grids, GridId::PRIMARY, 0, vec![1.17724711e3, 10.0, 0.5]).unwrap();
        let photon_yield = UnivariateDistribution::Tabular(
            TabularDistribution::lin_lin(vec![1e-11, 20.0], vec![2.0, 2.0]).unwrap(),
        );
        let reaction = PhotonProductionReaction::new(
            102001,
            NuclearReactionType::CAPTURE,
            PhotonProductionKind::YieldBased {
                base_cross_section: base,
                photon_yield,
            },
            line(2.2),
        );
        assert_relative_eq!(reaction.cross_section(&grids, 1e-11), 2.0 * 1.17724711e3);
        assert_relative_eq!(reaction.cross_section(&grids, 20.0), 2.0 * 0.5);
        assert_eq!(reaction.threshold_energy(&grids), 1e-11);
    }

    #[test]
    fn test_photon_weight_is_cross_section_ratio() {
        let mut grids = GridArena::new(EnergyGrid::new(vec![1e-11, 20.0]).unwrap());
        let own = grids.push(EnergyGrid::new(vec![10.0, 20.0]).unwrap());
        let cross_section = ReactionCrossSection::new(&grids, own, 0, vec![1.0, 2.0]).unwrap();
        let reaction = PhotonProductionReaction::new(
            4001,
            NuclearReactionType::INELASTIC,
            PhotonProductionKind::CrossSectionBased { cross_section },
            line(0.846),
        );
        let mut neutron = ParticleState::neutron([1.0, 2.0, 3.0], [0.0, 0.0, 1.0], 15.0);
        neutron.weight = 0.8;
        let mut bank = ParticleBank::new();
        let mut rng = StdRng::seed_from_u64(42);
        reaction.react(&neutron, &grids, 6.0, &mut bank, &mut rng);

        let banked = bank.pop().unwrap();
        assert_eq!(banked.particle.kind, ParticleKind::Photon);
        assert_relative_eq!(banked.particle.weight, 0.8 * 1.5 / 6.0);
        assert_eq!(banked.particle.energy, 0.846);
        assert_eq!(banked.particle.position, [1.0, 2.0, 3.0]);
        assert_eq!(banked.reaction, Some(NuclearReactionType::INELASTIC));
    }
}
