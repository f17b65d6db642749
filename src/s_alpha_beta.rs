// Thermal scattering distributions built from S(alpha,beta) tables
//
// Inelastic scattering uses discrete equiprobable (or skewed) outgoing
// energies with equiprobable cosines; elastic scattering is either coherent
// (Bragg edges) or incoherent (equiprobable cosines).

use crate::error::{CollisionError, CollisionResult};
use crate::particle::ParticleState;
use crate::utilities::{is_strictly_ascending, lower_bin_index};
use rand::{Rng, RngCore};
use std::f64::consts::PI;

/// Outgoing-energy bin weighting of an inelastic table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutgoingEnergyMode {
    /// IFENG = 0
    Equiprobable,
    /// IFENG = 1: the two bins at each end carry weights 0.1 and 0.4
    Skewed,
}

/// Discrete outgoing energy and its cosines for one incident energy
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteOutgoingState {
    pub energy: f64,
    pub cosines: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InelasticSAlphaBetaDistribution {
    mode: OutgoingEnergyMode,
    incident_energies: Vec<f64>,
    /// outgoing[i][j] is outgoing bin j at incident energy i
    outgoing: Vec<Vec<DiscreteOutgoingState>>,
    cumulative_weights: Vec<f64>,
}

impl InelasticSAlphaBetaDistribution {
    pub fn new(
        mode: OutgoingEnergyMode,
        incident_energies: Vec<f64>,
        outgoing: Vec<Vec<DiscreteOutgoingState>>,
    ) -> CollisionResult<Self> {
        if incident_energies.is_empty() || incident_energies.len() != outgoing.len() {
            return Err(CollisionError::InvalidGrid(
                "S(a,b) inelastic data needs one outgoing table per incident energy".to_string(),
            ));
        }
        if !is_strictly_ascending(&incident_energies) {
            return Err(CollisionError::InvalidGrid(
                "S(a,b) inelastic incident energies must be strictly ascending".to_string(),
            ));
        }
        let bins = outgoing[0].len();
        let cosines = outgoing[0].first().map(|state| state.cosines.len()).unwrap_or(0);
        if bins == 0
            || outgoing
                .iter()
                .any(|table| table.len() != bins || table.iter().any(|s| s.cosines.len() != cosines))
        {
            return Err(CollisionError::InvalidGrid(
                "S(a,b) inelastic tables must share the same bin and cosine counts".to_string(),
            ));
        }
        if mode == OutgoingEnergyMode::Skewed && bins < 4 {
            return Err(CollisionError::InvalidGrid(
                "skewed S(a,b) outgoing energy tables need at least four bins".to_string(),
            ));
        }

        let weights: Vec<f64> = (0..bins)
            .map(|j| match mode {
                OutgoingEnergyMode::Equiprobable => 1.0,
                OutgoingEnergyMode::Skewed => {
                    if j == 0 || j == bins - 1 {
                        0.1
                    } else if j == 1 || j == bins - 2 {
                        0.4
                    } else {
                        1.0
                    }
                }
            })
            .collect();
        let mut cumulative_weights = Vec::with_capacity(bins + 1);
        cumulative_weights.push(0.0);
        for weight in &weights {
            let last = cumulative_weights[cumulative_weights.len() - 1];
            cumulative_weights.push(last + weight);
        }

        Ok(InelasticSAlphaBetaDistribution {
            mode,
            incident_energies,
            outgoing,
            cumulative_weights,
        })
    }

    pub fn mode(&self) -> OutgoingEnergyMode {
        self.mode
    }

    fn sample_bin(&self, xi: f64) -> usize {
        let total = self.cumulative_weights[self.cumulative_weights.len() - 1];
        let bins = self.cumulative_weights.len() - 1;
        lower_bin_index(&self.cumulative_weights, xi * total).min(bins - 1)
    }

    /// Outgoing energy and lab cosine; two random numbers
    pub fn sample(&self, energy: f64, rng: &mut dyn RngCore) -> (f64, f64) {
        let (index, fraction) = bracket(&self.incident_energies, energy);
        let bin = self.sample_bin(rng.gen::<f64>());

        let lower = &self.outgoing[index][bin];
        let upper = &self.outgoing[(index + 1).min(self.outgoing.len() - 1)][bin];
        let outgoing_energy = lower.energy + fraction * (upper.energy - lower.energy);

        let cosine_count = lower.cosines.len();
        if cosine_count == 0 {
            return (outgoing_energy, 2.0 * rng.gen::<f64>() - 1.0);
        }
        let k = ((rng.gen::<f64>() * cosine_count as f64) as usize).min(cosine_count - 1);
        let mu = lower.cosines[k] + fraction * (upper.cosines[k] - lower.cosines[k]);
        (outgoing_energy.max(0.0), mu.clamp(-1.0, 1.0))
    }
}

/// Lower index and interpolation fraction on an ascending grid, clamped to
/// the end tables
fn bracket(grid: &[f64], energy: f64) -> (usize, f64) {
    let last = grid.len() - 1;
    if last == 0 || energy <= grid[0] {
        return (0, 0.0);
    }
    if energy >= grid[last] {
        return (last, 0.0);
    }
    let index = lower_bin_index(grid, energy);
    (index, (energy - grid[index]) / (grid[index + 1] - grid[index]))
}

/// Coherent elastic scattering from Bragg edges
#[derive(Debug, Clone, PartialEq)]
pub struct CoherentElasticDistribution {
    bragg_edges: Vec<f64>,
    /// Cumulative structure factors P(E_k)
    structure_factors: Vec<f64>,
}

impl CoherentElasticDistribution {
    pub fn new(bragg_edges: Vec<f64>, structure_factors: Vec<f64>) -> CollisionResult<Self> {
        if bragg_edges.is_empty() || bragg_edges.len() != structure_factors.len() {
            return Err(CollisionError::InvalidGrid(
                "Bragg edges and structure factors must have equal non-zero length".to_string(),
            ));
        }
        if !is_strictly_ascending(&bragg_edges) || bragg_edges[0] <= 0.0 {
            return Err(CollisionError::InvalidGrid(
                "Bragg edges must be positive and strictly ascending".to_string(),
            ));
        }
        Ok(CoherentElasticDistribution {
            bragg_edges,
            structure_factors,
        })
    }

    pub fn bragg_edges(&self) -> &[f64] {
        &self.bragg_edges
    }

    /// sigma(E) = P(E_k)/E for E_k <= E < E_{k+1}, zero below the first edge
    pub fn cross_section(&self, energy: f64) -> f64 {
        if energy < self.bragg_edges[0] {
            return 0.0;
        }
        let k = if energy >= self.bragg_edges[self.bragg_edges.len() - 1] {
            self.bragg_edges.len() - 1
        } else {
            lower_bin_index(&self.bragg_edges, energy)
        };
        self.structure_factors[k] / energy
    }

    /// Scattering cosine off one Bragg edge; one random number
    pub fn sample_cosine(&self, energy: f64, rng: &mut dyn RngCore) -> f64 {
        if energy < self.bragg_edges[0] {
            return 1.0;
        }
        let last_edge = if energy >= self.bragg_edges[self.bragg_edges.len() - 1] {
            self.bragg_edges.len() - 1
        } else {
            lower_bin_index(&self.bragg_edges, energy)
        };
        let target = rng.gen::<f64>() * self.structure_factors[last_edge];
        let edge = self.structure_factors[..=last_edge]
            .iter()
            .position(|factor| target < *factor)
            .unwrap_or(last_edge);
        (1.0 - 2.0 * self.bragg_edges[edge] / energy).clamp(-1.0, 1.0)
    }
}

/// Incoherent elastic scattering with equiprobable cosines per incident energy
#[derive(Debug, Clone, PartialEq)]
pub struct IncoherentElasticDistribution {
    incident_energies: Vec<f64>,
    cosines: Vec<Vec<f64>>,
}

impl IncoherentElasticDistribution {
    pub fn new(incident_energies: Vec<f64>, cosines: Vec<Vec<f64>>) -> CollisionResult<Self> {
        if incident_energies.is_empty() || incident_energies.len() != cosines.len() {
            return Err(CollisionError::InvalidGrid(
                "incoherent elastic data needs one cosine set per incident energy".to_string(),
            ));
        }
        let count = cosines[0].len();
        if cosines.iter().any(|set| set.len() != count) {
            return Err(CollisionError::InvalidGrid(
                "incoherent elastic cosine sets must have equal length".to_string(),
            ));
        }
        Ok(IncoherentElasticDistribution {
            incident_energies,
            cosines,
        })
    }

    /// One random number, or two when no cosines are tabulated
    pub fn sample_cosine(&self, energy: f64, rng: &mut dyn RngCore) -> f64 {
        let count = self.cosines[0].len();
        if count == 0 {
            return 2.0 * rng.gen::<f64>() - 1.0;
        }
        let (index, fraction) = bracket(&self.incident_energies, energy);
        let upper_index = (index + 1).min(self.cosines.len() - 1);
        let k = ((rng.gen::<f64>() * count as f64) as usize).min(count - 1);
        let lower = self.cosines[index][k];
        let upper = self.cosines[upper_index][k];
        (lower + fraction * (upper - lower)).clamp(-1.0, 1.0)
    }
}

/// Secondary distribution of an S(alpha,beta) reaction
#[derive(Debug, Clone, PartialEq)]
pub enum SAlphaBetaDistribution {
    Inelastic(InelasticSAlphaBetaDistribution),
    CoherentElastic(CoherentElasticDistribution),
    IncoherentElastic(IncoherentElasticDistribution),
}

impl SAlphaBetaDistribution {
    /// Apply a thermal scatter to `particle` in the lab frame
    pub fn scatter_particle(&self, particle: &mut ParticleState, rng: &mut dyn RngCore) {
        let energy = particle.energy;
        let (outgoing_energy, mu) = match self {
            SAlphaBetaDistribution::Inelastic(distribution) => distribution.sample(energy, rng),
            SAlphaBetaDistribution::CoherentElastic(distribution) => {
                (energy, distribution.sample_cosine(energy, rng))
            }
            SAlphaBetaDistribution::IncoherentElastic(distribution) => {
                (energy, distribution.sample_cosine(energy, rng))
            }
        };
        particle.energy = outgoing_energy;
        let phi = 2.0 * PI * rng.gen::<f64>();
        particle.rotate_direction(mu, phi);
    }
}
