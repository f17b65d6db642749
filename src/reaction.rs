// Neutron reaction channels
//
// Every reaction kind shares one struct: the reaction type, Q-value,
// temperature and cross section table, plus a `ReactionKind` carrying only
// what that kind needs to react.

use crate::bank::ParticleBank;
use crate::distribution::UnivariateDistribution;
use crate::error::CollisionResult;
use crate::fission::{DelayedNeutronEmissionDistribution, FissionNeutronMultiplicityDistribution};
use crate::grid::{GridArena, ReactionCrossSection};
use crate::particle::{ParticleKind, ParticleState};
use crate::reaction_type::NuclearReactionType;
use crate::s_alpha_beta::SAlphaBetaDistribution;
use crate::scattering::NuclearScatteringDistribution;
use rand::{Rng, RngCore};
use std::sync::Arc;

/// Sample an integer count whose expectation is `average`.
///
/// Always draws exactly one random number. The count is floor(average) with
/// probability 1 - frac(average) and floor(average) + 1 otherwise, so an
/// integer average is returned exactly.
pub fn sample_number_of_emitted_particles(average: f64, rng: &mut dyn RngCore) -> u32 {
    let xi = rng.gen::<f64>();
    sample_number_with_random_number(average, xi)
}

pub(crate) fn sample_number_with_random_number(average: f64, xi: f64) -> u32 {
    if !(average > 0.0) {
        return 0;
    }
    let floor = average.floor();
    let fraction = average - floor;
    if xi < 1.0 - fraction {
        floor as u32
    } else {
        floor as u32 + 1
    }
}

/// What a reaction does to the particle when it is selected
#[derive(Debug, Clone)]
pub enum ReactionKind {
    /// Scattering with a fixed number of outgoing neutrons
    Scattering {
        multiplicity: u32,
        distribution: NuclearScatteringDistribution,
    },
    /// Scattering whose neutron yield depends on incident energy
    EnergyDependentScattering {
        multiplicity: UnivariateDistribution,
        distribution: NuclearScatteringDistribution,
    },
    /// Capture or charged-particle emission; kills the neutron
    Absorption,
    /// Fission emitting the total nu through the prompt spectrum
    Fission {
        multiplicity: Arc<FissionNeutronMultiplicityDistribution>,
        prompt: NuclearScatteringDistribution,
    },
    /// Fission with separate prompt and delayed emission
    DetailedFission {
        multiplicity: Arc<FissionNeutronMultiplicityDistribution>,
        prompt: NuclearScatteringDistribution,
        delayed: Arc<DelayedNeutronEmissionDistribution>,
    },
    /// Thermal scattering from S(alpha,beta) data
    SAlphaBeta { distribution: SAlphaBetaDistribution },
}

/// One reaction channel of a nuclide at one temperature
#[derive(Debug, Clone)]
pub struct NuclearReaction {
    reaction_type: NuclearReactionType,
    q_value: f64,
    /// Temperature as kT in MeV
    temperature: f64,
    cross_section: ReactionCrossSection,
    kind: ReactionKind,
}

impl NuclearReaction {
    pub fn new(
        reaction_type: NuclearReactionType,
        q_value: f64,
        temperature: f64,
        cross_section: ReactionCrossSection,
        kind: ReactionKind,
    ) -> CollisionResult<Self> {
        if !(temperature >= 0.0) {
            return Err(crate::error::contract_violation!(
                "reaction {} temperature must be non-negative, found {}",
                reaction_type,
                temperature
            ));
        }
        if let ReactionKind::Scattering { multiplicity, .. } = &kind {
            if *multiplicity == 0 {
                return Err(crate::error::contract_violation!(
                    "scattering reaction {} must emit at least one neutron",
                    reaction_type
                ));
            }
        }
        Ok(NuclearReaction {
            reaction_type,
            q_value,
            temperature,
            cross_section,
            kind,
        })
    }

    pub fn reaction_type(&self) -> NuclearReactionType {
        self.reaction_type
    }

    pub fn q_value(&self) -> f64 {
        self.q_value
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn kind(&self) -> &ReactionKind {
        &self.kind
    }

    pub fn cross_section_table(&self) -> &ReactionCrossSection {
        &self.cross_section
    }

    pub(crate) fn cross_section_table_mut(&mut self) -> &mut ReactionCrossSection {
        &mut self.cross_section
    }

    pub fn is_absorption(&self) -> bool {
        matches!(self.kind, ReactionKind::Absorption)
    }

    pub fn is_fission(&self) -> bool {
        matches!(
            self.kind,
            ReactionKind::Fission { .. } | ReactionKind::DetailedFission { .. }
        )
    }

    /// Microscopic cross section in barns
    #[inline]
    pub fn cross_section(&self, grids: &GridArena, energy: f64) -> f64 {
        self.cross_section.evaluate(grids, energy)
    }

    pub fn threshold_energy(&self, grids: &GridArena) -> f64 {
        self.cross_section.threshold_energy(grids)
    }

    pub fn max_energy(&self, grids: &GridArena) -> f64 {
        self.cross_section.max_energy(grids)
    }

    /// Expected number of neutrons leaving the reaction
    pub fn average_number_of_emitted_particles(&self, energy: f64) -> f64 {
        match &self.kind {
            ReactionKind::Scattering { multiplicity, .. } => *multiplicity as f64,
            ReactionKind::EnergyDependentScattering { multiplicity, .. } => {
                multiplicity.evaluate(energy).max(0.0)
            }
            ReactionKind::Absorption => 0.0,
            ReactionKind::Fission { multiplicity, .. }
            | ReactionKind::DetailedFission { multiplicity, .. } => {
                multiplicity.average_number_of_emitted_neutrons(energy).max(0.0)
            }
            ReactionKind::SAlphaBeta { .. } => 1.0,
        }
    }

    /// Sampled number of outgoing neutrons. Fixed multiplicities draw no
    /// random numbers; all others draw exactly one.
    pub fn number_of_emitted_particles(&self, energy: f64, rng: &mut dyn RngCore) -> u32 {
        match &self.kind {
            ReactionKind::Scattering { multiplicity, .. } => *multiplicity,
            ReactionKind::Absorption => 0,
            ReactionKind::SAlphaBeta { .. } => 1,
            _ => sample_number_of_emitted_particles(
                self.average_number_of_emitted_particles(energy),
                rng,
            ),
        }
    }

    /// Apply the reaction to `particle`, banking any secondaries
    pub fn react(
        &self,
        particle: &mut ParticleState,
        bank: &mut ParticleBank,
        rng: &mut dyn RngCore,
    ) -> CollisionResult<()> {
        match &self.kind {
            ReactionKind::Absorption => {
                particle.increment_collision_number();
                particle.set_as_gone();
            }
            ReactionKind::Scattering { distribution, .. }
            | ReactionKind::EnergyDependentScattering { distribution, .. } => {
                particle.increment_collision_number();
                let emitted = self.number_of_emitted_particles(particle.energy, rng);
                if emitted == 0 {
                    particle.set_as_gone();
                    return Ok(());
                }
                for _ in 1..emitted {
                    let mut secondary = particle.clone_for_emission();
                    distribution.scatter_particle(&mut secondary, self.temperature, rng);
                    bank.push_from_reaction(secondary, self.reaction_type);
                }
                distribution.scatter_particle(particle, self.temperature, rng);
            }
            ReactionKind::Fission { multiplicity, prompt } => {
                particle.increment_collision_number();
                let average = multiplicity
                    .average_number_of_emitted_neutrons(particle.energy)
                    .max(0.0);
                let emitted = sample_number_of_emitted_particles(average, rng);
                self.emit_prompt_neutrons(particle, prompt, emitted, bank, rng);
                particle.set_as_gone();
            }
            ReactionKind::DetailedFission {
                multiplicity,
                prompt,
                delayed,
            } => {
                particle.increment_collision_number();
                let energy = particle.energy;

                let delayed_average = multiplicity.average_number_of_delayed_neutrons(energy).max(0.0);
                let delayed_count = sample_number_of_emitted_particles(delayed_average, rng);
                for _ in 0..delayed_count {
                    let mut neutron = particle.spawn_secondary(ParticleKind::Neutron);
                    delayed.sample_emission(&mut neutron, rng)?;
                    bank.push_from_reaction(neutron, self.reaction_type);
                }

                let prompt_average = multiplicity.average_number_of_prompt_neutrons(energy).max(0.0);
                let prompt_count = sample_number_of_emitted_particles(prompt_average, rng);
                self.emit_prompt_neutrons(particle, prompt, prompt_count, bank, rng);
                particle.set_as_gone();
            }
            ReactionKind::SAlphaBeta { distribution } => {
                particle.increment_collision_number();
                distribution.scatter_particle(particle, rng);
            }
        }
        Ok(())
    }

    fn emit_prompt_neutrons(
        &self,
        particle: &ParticleState,
        prompt: &NuclearScatteringDistribution,
        count: u32,
        bank: &mut ParticleBank,
        rng: &mut dyn RngCore,
    ) {
        for _ in 0..count {
            let mut neutron = particle.spawn_secondary(ParticleKind::Neutron);
            prompt.scatter_particle(&mut neutron, self.temperature, rng);
            bank.push_from_reaction(neutron, self.reaction_type);
        }
    }

    /// Build the synthetic sum of several reactions on the primary grid,
    /// used for cached total and absorption cross sections
    pub(crate) fn summed_cross_section<'a, I>(
        grids: &GridArena,
        reactions: I,
    ) -> CollisionResult<ReactionCrossSection>
    where
        I: IntoIterator<Item = &'a NuclearReaction>,
    {
        let energies = grids.primary().energies();
        let mut values = vec![0.0; energies.len()];
        for reaction in reactions {
            let table = &reaction.cross_section;
            if table.grid_id() == crate::grid::GridId::PRIMARY {
                for (index, value) in values.iter_mut().enumerate().skip(table.threshold_index()) {
                    *value += table.value_at_grid_index(index);
                }
            } else {
                for (value, energy) in values.iter_mut().zip(energies) {
                    *value += reaction.cross_section(grids, *energy);
                }
            }
        }

        let threshold_index = values.iter().position(|value| *value != 0.0).unwrap_or(0);
        let trimmed = values.split_off(threshold_index);
        ReactionCrossSection::new(grids, crate::grid::GridId::PRIMARY, threshold_index, trimmed)
    }
}
