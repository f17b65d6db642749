use crate::bank::ParticleBank;
use crate::error::{CollisionError, CollisionResult};
use crate::nuclide::ScatteringCenter;
use crate::particle::ParticleState;
use crate::reaction_type::NuclearReactionType;
use rand::{Rng, RngCore};
use std::sync::Arc;

const AVOGADRO: f64 = 6.02214076e23;
/// Neutron mass in amu; atomic weight ratios are relative to it
const NEUTRON_MASS_AMU: f64 = 1.00866491595;
const BARN_CM2: f64 = 1.0e-24;

/// A homogeneous mixture of nuclides.
///
/// Fractions are stored as normalized atom fractions. Nuclides are shared
/// with every other material that uses them.
#[derive(Debug, Clone)]
pub struct NeutronMaterial {
    id: u32,
    /// atoms/(barn cm)
    number_density: f64,
    nuclides: Vec<(f64, Arc<dyn ScatteringCenter>)>,
}

impl NeutronMaterial {
    /// Build a material from raw mixing fractions and a density.
    ///
    /// Positive fractions are atom fractions. If any fraction is negative all
    /// are read as mass fractions and converted with the atomic weight
    /// ratios. A positive density is atoms/(barn cm); a negative one is a
    /// mass density in g/cc.
    pub fn new(
        id: u32,
        density: f64,
        fractions: Vec<(f64, Arc<dyn ScatteringCenter>)>,
    ) -> CollisionResult<Self> {
        if fractions.is_empty() {
            return Err(crate::error::contract_violation!(
                "material {} must contain at least one nuclide",
                id
            ));
        }
        if fractions.iter().any(|(fraction, _)| !fraction.is_finite()) || !density.is_finite() {
            return Err(crate::error::contract_violation!(
                "material {} has non-finite fractions or density",
                id
            ));
        }

        let mass_fractions = fractions.iter().any(|(fraction, _)| *fraction < 0.0);
        let mut atom_fractions: Vec<f64> = fractions
            .iter()
            .map(|(fraction, center)| {
                if mass_fractions {
                    fraction.abs() / center.nuclide().atomic_weight_ratio()
                } else {
                    *fraction
                }
            })
            .collect();

        let sum: f64 = atom_fractions.iter().sum();
        if !(sum > 0.0) {
            return Err(crate::error::contract_violation!(
                "material {} fractions sum to {}, expected a positive value",
                id,
                sum
            ));
        }
        atom_fractions.iter_mut().for_each(|fraction| *fraction /= sum);

        let number_density = if density < 0.0 {
            let average_awr: f64 = atom_fractions
                .iter()
                .zip(&fractions)
                .map(|(fraction, (_, center))| fraction * center.nuclide().atomic_weight_ratio())
                .sum();
            -density * AVOGADRO / (average_awr * NEUTRON_MASS_AMU) * BARN_CM2
        } else {
            density
        };

        log::debug!(
            "material {}: {} nuclides, number density {:.6e} atoms/b-cm",
            id,
            fractions.len(),
            number_density
        );

        let nuclides = atom_fractions
            .into_iter()
            .zip(fractions)
            .map(|(fraction, (_, center))| (fraction, center))
            .collect();

        Ok(NeutronMaterial {
            id,
            number_density,
            nuclides,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn number_density(&self) -> f64 {
        self.number_density
    }

    pub fn nuclides(&self) -> &[(f64, Arc<dyn ScatteringCenter>)] {
        &self.nuclides
    }

    /// Atom density of nuclide `index` in atoms/(barn cm)
    pub fn atom_density(&self, index: usize) -> f64 {
        self.nuclides
            .get(index)
            .map(|(fraction, _)| fraction * self.number_density)
            .unwrap_or(0.0)
    }

    fn macroscopic<F>(&self, microscopic: F) -> f64
    where
        F: Fn(&dyn ScatteringCenter) -> f64,
    {
        self.nuclides
            .iter()
            .map(|(fraction, center)| fraction * microscopic(center.as_ref()))
            .sum::<f64>()
            * self.number_density
    }

    /// Macroscopic total cross section in 1/cm
    pub fn macroscopic_total_cross_section(&self, energy: f64) -> f64 {
        self.macroscopic(|center| center.total_cross_section(energy))
    }

    pub fn macroscopic_absorption_cross_section(&self, energy: f64) -> f64 {
        self.macroscopic(|center| center.absorption_cross_section(energy))
    }

    pub fn macroscopic_cross_section(&self, energy: f64, reaction_type: NuclearReactionType) -> f64 {
        self.macroscopic(|center| center.reaction_cross_section(energy, reaction_type))
    }

    /// Sample the distance to the next collision from the macroscopic total.
    /// Returns None where the material is transparent.
    pub fn sample_distance_to_collision(&self, energy: f64, rng: &mut dyn RngCore) -> Option<f64> {
        let sigma_t = self.macroscopic_total_cross_section(energy);
        if !(sigma_t > 0.0) {
            return None;
        }
        let xi: f64 = 1.0 - rng.gen::<f64>();
        Some(-xi.ln() / sigma_t)
    }

    /// Index of the nuclide a particle at `energy` collides with
    pub fn sample_collision_nuclide(&self, energy: f64, rng: &mut dyn RngCore) -> CollisionResult<usize> {
        let total = self.macroscopic_total_cross_section(energy);
        let scaled = rng.gen::<f64>() * total;
        let mut partial = 0.0;
        for (index, (fraction, center)) in self.nuclides.iter().enumerate() {
            partial += fraction * self.number_density * center.total_cross_section(energy);
            if scaled < partial {
                return Ok(index);
            }
        }
        Err(CollisionError::SamplingExhausted {
            context: format!("material {}", self.id),
            group: "nuclide",
            energy,
            attempts: 1,
            scaled,
            summed: partial,
        })
    }

    pub fn collide_analogue(
        &self,
        particle: &mut ParticleState,
        bank: &mut ParticleBank,
        rng: &mut dyn RngCore,
    ) -> CollisionResult<()> {
        let index = self.sample_collision_nuclide(particle.energy, rng)?;
        self.nuclides[index].1.collide_analogue(particle, bank, rng)
    }

    pub fn collide_survival_bias(
        &self,
        particle: &mut ParticleState,
        bank: &mut ParticleBank,
        rng: &mut dyn RngCore,
    ) -> CollisionResult<()> {
        let index = self.sample_collision_nuclide(particle.energy, rng)?;
        self.nuclides[index].1.collide_survival_bias(particle, bank, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{EnergyGrid, GridArena, GridId, ReactionCrossSection};
    use crate::nuclide::{Nuclide, NuclideIdentity, ReactionMap, DEFAULT_ABSORPTION_REACTION_TYPES};
    use crate::reaction::{NuclearReaction, ReactionKind};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn absorber(name: &str, awr: f64, sigma: f64) -> Arc<dyn ScatteringCenter> {
        let grids = GridArena::new(EnergyGrid::new(vec![1e-11, 20.0]).unwrap());
        let cross_section = ReactionCrossSection::new(&grids, GridId::PRIMARY, 0, vec![sigma; 2]).unwrap();
        let capture =
            NuclearReaction::new(NuclearReactionType::CAPTURE, 0.0, 2.53e-8, cross_section, ReactionKind::Absorption)
                .unwrap();
        let nuclide = Nuclide::new(
            NuclideIdentity::from_table_name(name, awr, 2.53e-8).unwrap(),
            grids,
            ReactionMap::new(),
            ReactionMap::from([(NuclearReactionType::CAPTURE, capture)]),
            ReactionMap::new(),
            &DEFAULT_ABSORPTION_REACTION_TYPES,
        )
        .unwrap();
        Arc::new(nuclide)
    }

    #[test]
    fn test_atom_fractions_are_normalized() {
        let material = NeutronMaterial::new(
            1,
            0.1,
            vec![(2.0, absorber("1001.70c", 0.999167, 1.0)), (1.0, absorber("8016.70c", 15.858, 2.0))],
        )
        .unwrap();
        let fractions: Vec<f64> = material.nuclides().iter().map(|(f, _)| *f).collect();
        assert_relative_eq!(fractions.iter().sum::<f64>(), 1.0, max_relative = 1e-14);
        assert_relative_eq!(fractions[0], 2.0 / 3.0, max_relative = 1e-14);
        assert_relative_eq!(
            material.macroscopic_total_cross_section(1.0),
            0.1 * (2.0 / 3.0 * 1.0 + 1.0 / 3.0 * 2.0),
            max_relative = 1e-12
        );
        assert_relative_eq!(material.atom_density(1), 0.1 / 3.0, max_relative = 1e-12);
    }

    #[test]
    fn test_mass_fractions_and_mass_density() {
        // water by mass: 11.19% hydrogen, 88.81% oxygen
        let material = NeutronMaterial::new(
            2,
            -1.0,
            vec![
                (-0.1119, absorber("1001.70c", 0.999167, 1.0)),
                (-0.8881, absorber("8016.70c", 15.857510, 1.0)),
            ],
        )
        .unwrap();
        let fractions: Vec<f64> = material.nuclides().iter().map(|(f, _)| *f).collect();
        assert_relative_eq!(fractions[0], 2.0 / 3.0, max_relative = 2e-3);
        // 3 atoms per molecule of 18.015 g/mol
        assert_relative_eq!(material.number_density(), 3.0 * 0.0334, max_relative = 3e-3);
    }

    #[test]
    fn test_empty_or_zero_material_rejected() {
        assert!(NeutronMaterial::new(3, 0.1, vec![]).is_err());
        assert!(NeutronMaterial::new(3, 0.1, vec![(0.0, absorber("1001.70c", 0.999167, 1.0))]).is_err());
    }

    #[test]
    fn test_collision_nuclide_frequencies() {
        let material = NeutronMaterial::new(
            4,
            0.05,
            vec![(0.5, absorber("1001.70c", 0.999167, 1.0)), (0.5, absorber("8016.70c", 15.858, 3.0))],
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let n = 40_000;
        let hits = (0..n)
            .filter(|_| material.sample_collision_nuclide(1.0, &mut rng).unwrap() == 1)
            .count();
        assert!((hits as f64 / n as f64 - 0.75).abs() < 0.01);
    }

    #[test]
    fn test_transparent_material_fails_to_sample() {
        let material = NeutronMaterial::new(5, 0.0, vec![(1.0, absorber("1001.70c", 0.999167, 1.0))]).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        assert!(material.sample_distance_to_collision(1.0, &mut rng).is_none());
        assert!(matches!(
            material.sample_collision_nuclide(1.0, &mut rng),
            Err(CollisionError::SamplingExhausted { .. })
        ));
    }

    #[test]
    fn test_sample_distance_to_collision() {
        let material = NeutronMaterial::new(6, 2.0, vec![(1.0, absorber("1001.70c", 0.999167, 1.0))]).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let n = 20_000;
        let mean = (0..n)
            .map(|_| material.sample_distance_to_collision(5.0, &mut rng).unwrap())
            .sum::<f64>()
            / n as f64;
        assert!((mean - 0.5).abs() < 0.02, "mean distance {mean}");
    }

    #[test]
    fn test_collide_analogue_delegates() {
        let material = NeutronMaterial::new(7, 0.1, vec![(1.0, absorber("1001.70c", 0.999167, 1.0))]).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let mut particle = ParticleState::neutron([0.0; 3], [0.0, 0.0, 1.0], 1.0);
        let mut bank = ParticleBank::new();
        material.collide_analogue(&mut particle, &mut bank, &mut rng).unwrap();
        assert!(particle.is_gone());
        assert!(bank.is_empty());
    }
}
