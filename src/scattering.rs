// Outgoing energy laws and scattering distributions for neutron reactions
//
// A scattering distribution mutates a particle in place: it samples the
// outgoing energy and cosine, converts centre-of-mass values to the lab
// frame where needed and rotates the direction.

use crate::distribution::{TabularDistribution, UnivariateDistribution};
use crate::particle::ParticleState;
use crate::physics::{center_of_mass_to_lab, elastic_target_at_rest, free_gas_elastic_scatter};
use crate::stats::EnergyDependentAngularDistribution;
use crate::utilities::lower_bin_index;
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Exp1};
use std::f64::consts::PI;

/// Reference frame of tabulated secondary data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceFrame {
    Lab,
    CenterOfMass,
}

/// Outgoing-energy law of an uncorrelated secondary distribution
#[derive(Debug, Clone, PartialEq)]
pub enum EnergyLaw {
    /// Law 2: fixed photon energy; primary photons shift with incident energy
    DiscretePhoton {
        primary: bool,
        photon_energy: f64,
        awr: f64,
    },
    /// Law 3: inelastic level scattering, E'_cm = mass_ratio (E - threshold)
    Level { threshold: f64, mass_ratio: f64 },
    /// Law 4: outgoing-energy tables on an incident-energy grid
    Tabular {
        incident_energies: Vec<f64>,
        distributions: Vec<TabularDistribution>,
    },
    /// Law 7: simple Maxwell fission spectrum
    Maxwell {
        temperature: UnivariateDistribution,
        restriction: f64,
    },
    /// Law 9: evaporation spectrum
    Evaporation {
        temperature: UnivariateDistribution,
        restriction: f64,
    },
    /// Law 11: energy-dependent Watt spectrum
    Watt {
        a: UnivariateDistribution,
        b: UnivariateDistribution,
        restriction: f64,
    },
}

/// Rejection loops give up after this many tries and fall back to the
/// restriction bound
const MAX_REJECTIONS: usize = 1000;

impl EnergyLaw {
    /// Sample an outgoing energy for incident energy `energy`
    pub fn sample(&self, energy: f64, rng: &mut dyn RngCore) -> f64 {
        match self {
            EnergyLaw::DiscretePhoton {
                primary,
                photon_energy,
                awr,
            } => {
                if *primary {
                    photon_energy + awr / (awr + 1.0) * energy
                } else {
                    *photon_energy
                }
            }
            EnergyLaw::Level {
                threshold,
                mass_ratio,
            } => (mass_ratio * (energy - threshold)).max(0.0),
            EnergyLaw::Tabular {
                incident_energies,
                distributions,
            } => sample_tabular_law(incident_energies, distributions, energy, rng),
            EnergyLaw::Maxwell {
                temperature,
                restriction,
            } => {
                let theta = temperature.evaluate(energy);
                let limit = energy - restriction;
                sample_restricted(limit, rng, |rng| {
                    let r1 = rng.gen::<f64>();
                    let r2 = rng.gen::<f64>();
                    let c = (PI / 2.0 * rng.gen::<f64>()).cos();
                    -theta * (r1.ln() + r2.ln() * c * c)
                })
            }
            EnergyLaw::Evaporation {
                temperature,
                restriction,
            } => {
                let theta = temperature.evaluate(energy);
                let limit = energy - restriction;
                sample_restricted(limit, rng, |rng| {
                    let e1: f64 = Exp1.sample(rng);
                    let e2: f64 = Exp1.sample(rng);
                    theta * (e1 + e2)
                })
            }
            EnergyLaw::Watt { a, b, restriction } => {
                let a = a.evaluate(energy);
                let b = b.evaluate(energy);
                let limit = energy - restriction;
                sample_restricted(limit, rng, |rng| {
                    let r1 = rng.gen::<f64>();
                    let r2 = rng.gen::<f64>();
                    let c = (PI / 2.0 * rng.gen::<f64>()).cos();
                    let w = -a * (r1.ln() + r2.ln() * c * c);
                    let xi = rng.gen::<f64>();
                    w + a * a * b / 4.0 + (2.0 * xi - 1.0) * (a * a * b * w).sqrt()
                })
            }
        }
    }
}

fn sample_restricted<F>(limit: f64, rng: &mut dyn RngCore, mut draw: F) -> f64
where
    F: FnMut(&mut dyn RngCore) -> f64,
{
    if limit <= 0.0 {
        return 0.0;
    }
    for _ in 0..MAX_REJECTIONS {
        let sample = draw(rng);
        if sample >= 0.0 && sample <= limit {
            return sample;
        }
    }
    log::warn!(
        "outgoing energy rejection sampling did not converge below {} MeV",
        limit
    );
    limit
}

fn sample_tabular_law(
    incident_energies: &[f64],
    distributions: &[TabularDistribution],
    energy: f64,
    rng: &mut dyn RngCore,
) -> f64 {
    let last = incident_energies.len() - 1;
    if last == 0 || energy <= incident_energies[0] {
        return distributions[0].sample(rng);
    }
    if energy >= incident_energies[last] {
        return distributions[last].sample(rng);
    }

    let index = lower_bin_index(incident_energies, energy);
    let fraction = (energy - incident_energies[index])
        / (incident_energies[index + 1] - incident_energies[index]);
    let chosen = if rng.gen::<f64>() < fraction {
        index + 1
    } else {
        index
    };

    // Scale the sampled table's outgoing range to the interpolated range
    let sample = distributions[chosen].sample(rng);
    let (low_i, high_i) = (
        distributions[index].lower_bound(),
        distributions[index].upper_bound(),
    );
    let (low_j, high_j) = (
        distributions[index + 1].lower_bound(),
        distributions[index + 1].upper_bound(),
    );
    let low = low_i + fraction * (low_j - low_i);
    let high = high_i + fraction * (high_j - high_i);
    let (chosen_low, chosen_high) = (
        distributions[chosen].lower_bound(),
        distributions[chosen].upper_bound(),
    );
    if chosen_high > chosen_low {
        low + (sample - chosen_low) * (high - low) / (chosen_high - chosen_low)
    } else {
        sample
    }
}

/// Secondary-neutron distribution attached to a scattering or fission
/// reaction
#[derive(Debug, Clone, PartialEq)]
pub enum NuclearScatteringDistribution {
    /// Elastic scattering with a CM cosine table; free-gas target motion
    /// below `free_gas_threshold` (MeV)
    Elastic {
        awr: f64,
        angular: EnergyDependentAngularDistribution,
        free_gas_threshold: f64,
    },
    /// Independent energy law and cosine table in `frame`
    Uncorrelated {
        awr: f64,
        energy_law: EnergyLaw,
        angular: EnergyDependentAngularDistribution,
        frame: ReferenceFrame,
    },
}

impl NuclearScatteringDistribution {
    /// Sample an outgoing state for `particle` and apply it in place.
    /// `kt` is the target temperature in MeV.
    pub fn scatter_particle(&self, particle: &mut ParticleState, kt: f64, rng: &mut dyn RngCore) {
        match self {
            NuclearScatteringDistribution::Elastic {
                awr,
                angular,
                free_gas_threshold,
            } => {
                let energy = particle.energy;
                let mu_cm = angular.sample(energy, rng);
                if kt > 0.0 && energy < *free_gas_threshold {
                    let (outgoing, direction) = free_gas_elastic_scatter(
                        energy,
                        &particle.direction_vector(),
                        mu_cm,
                        *awr,
                        kt,
                        rng,
                    );
                    particle.energy = outgoing;
                    particle.set_direction(direction);
                } else {
                    let (outgoing, mu_lab) = elastic_target_at_rest(energy, mu_cm, *awr);
                    particle.energy = outgoing;
                    rotate(particle, mu_lab, rng);
                }
            }
            NuclearScatteringDistribution::Uncorrelated {
                awr,
                energy_law,
                angular,
                frame,
            } => {
                let energy = particle.energy;
                let outgoing = energy_law.sample(energy, rng);
                let mu = angular.sample(energy, rng);
                let (outgoing, mu_lab) = match frame {
                    ReferenceFrame::Lab => (outgoing, mu),
                    ReferenceFrame::CenterOfMass => center_of_mass_to_lab(energy, outgoing, mu, *awr),
                };
                particle.energy = outgoing;
                rotate(particle, mu_lab, rng);
            }
        }
    }

    /// Probability density of scattering to lab cosine `mu` at `energy`,
    /// for lab-frame or elastic data
    pub fn evaluate_angular_pdf(&self, energy: f64, mu: f64) -> f64 {
        match self {
            NuclearScatteringDistribution::Elastic { angular, .. } => angular.evaluate_pdf(energy, mu),
            NuclearScatteringDistribution::Uncorrelated { angular, .. } => {
                angular.evaluate_pdf(energy, mu)
            }
        }
    }
}

fn rotate(particle: &mut ParticleState, mu: f64, rng: &mut dyn RngCore) {
    let phi = 2.0 * PI * rng.gen::<f64>();
    particle.rotate_direction(mu, phi);
}
