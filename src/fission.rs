// Fission neutron multiplicities and delayed-neutron emission

use crate::distribution::UnivariateDistribution;
use crate::error::{CollisionError, CollisionResult};
use crate::particle::ParticleState;
use crate::physics::sample_isotropic_direction;
use crate::scattering::EnergyLaw;
use rand::{Rng, RngCore};

/// Average prompt, delayed and total neutrons per fission as functions of
/// incident energy.
///
/// The partial variants store two curves and derive the third from
/// total = prompt + delayed.
#[derive(Debug, Clone, PartialEq)]
pub enum FissionNeutronMultiplicityDistribution {
    Complete {
        total: UnivariateDistribution,
        prompt: UnivariateDistribution,
        delayed: UnivariateDistribution,
    },
    PromptTotal {
        prompt: UnivariateDistribution,
        total: UnivariateDistribution,
    },
    DelayedTotal {
        delayed: UnivariateDistribution,
        total: UnivariateDistribution,
    },
    DelayedPrompt {
        delayed: UnivariateDistribution,
        prompt: UnivariateDistribution,
    },
}

impl FissionNeutronMultiplicityDistribution {
    pub fn average_number_of_emitted_neutrons(&self, energy: f64) -> f64 {
        use FissionNeutronMultiplicityDistribution::*;
        match self {
            Complete { total, .. } | PromptTotal { total, .. } | DelayedTotal { total, .. } => {
                total.evaluate(energy)
            }
            DelayedPrompt { delayed, prompt } => delayed.evaluate(energy) + prompt.evaluate(energy),
        }
    }

    pub fn average_number_of_prompt_neutrons(&self, energy: f64) -> f64 {
        use FissionNeutronMultiplicityDistribution::*;
        match self {
            Complete { prompt, .. } | PromptTotal { prompt, .. } | DelayedPrompt { prompt, .. } => {
                prompt.evaluate(energy)
            }
            DelayedTotal { delayed, total } => total.evaluate(energy) - delayed.evaluate(energy),
        }
    }

    pub fn average_number_of_delayed_neutrons(&self, energy: f64) -> f64 {
        use FissionNeutronMultiplicityDistribution::*;
        match self {
            Complete { delayed, .. } | DelayedTotal { delayed, .. } | DelayedPrompt { delayed, .. } => {
                delayed.evaluate(energy)
            }
            PromptTotal { prompt, total } => total.evaluate(energy) - prompt.evaluate(energy),
        }
    }
}

/// One precursor group of delayed-neutron data
#[derive(Debug, Clone, PartialEq)]
pub struct DelayedNeutronGroup {
    /// Decay constant in 1/s
    pub decay_constant: f64,
    /// Probability of this group as a function of incident energy
    pub probability: UnivariateDistribution,
    /// Outgoing energy law of neutrons from this group
    pub energy_law: EnergyLaw,
}

/// Delayed-neutron emission spectrum summed over precursor groups
#[derive(Debug, Clone, PartialEq)]
pub struct DelayedNeutronEmissionDistribution {
    groups: Vec<DelayedNeutronGroup>,
}

impl DelayedNeutronEmissionDistribution {
    pub fn new(groups: Vec<DelayedNeutronGroup>) -> CollisionResult<Self> {
        if groups.is_empty() {
            return Err(crate::error::contract_violation!(
                "delayed-neutron emission needs at least one precursor group"
            ));
        }
        if groups.iter().any(|group| !(group.decay_constant >= 0.0)) {
            return Err(crate::error::contract_violation!(
                "delayed-neutron decay constants must be non-negative"
            ));
        }
        Ok(DelayedNeutronEmissionDistribution { groups })
    }

    pub fn groups(&self) -> &[DelayedNeutronGroup] {
        &self.groups
    }

    /// Pick a precursor group (one random number), sample its outgoing
    /// energy and an isotropic direction, and apply them to `neutron`.
    pub fn sample_emission(
        &self,
        neutron: &mut ParticleState,
        rng: &mut dyn RngCore,
    ) -> CollisionResult<usize> {
        let incident_energy = neutron.energy;
        let group_index = self.sample_group(incident_energy, rng.gen::<f64>())?;
        let group = &self.groups[group_index];
        neutron.energy = group.energy_law.sample(incident_energy, rng);
        neutron.direction = sample_isotropic_direction(rng);
        Ok(group_index)
    }

    fn sample_group(&self, energy: f64, xi: f64) -> CollisionResult<usize> {
        let probabilities: Vec<f64> = self
            .groups
            .iter()
            .map(|group| group.probability.evaluate(energy).max(0.0))
            .collect();
        let total: f64 = probabilities.iter().sum();
        if total <= 0.0 {
            return Err(CollisionError::SamplingExhausted {
                context: "delayed-neutron emission".to_string(),
                group: "precursor",
                energy,
                attempts: 1,
                scaled: xi,
                summed: total,
            });
        }

        let scaled = xi * total;
        let mut partial = 0.0;
        for (index, probability) in probabilities.iter().enumerate() {
            partial += probability;
            if scaled < partial {
                return Ok(index);
            }
        }
        // xi * total can round up to the sum itself
        Ok(probabilities
            .iter()
            .rposition(|probability| *probability > 0.0)
            .unwrap_or(0))
    }
}
