// Particle banking system
//
// Holds the secondaries produced during a collision (extra scattering
// neutrons, fission neutrons, production photons) until the transport loop
// picks them up.

use crate::particle::ParticleState;
use crate::reaction_type::NuclearReactionType;
use std::collections::VecDeque;

/// A banked particle and the reaction that produced it, if known
#[derive(Debug, Clone, PartialEq)]
pub struct BankedParticle {
    pub particle: ParticleState,
    pub reaction: Option<NuclearReactionType>,
}

/// FIFO queue of particles waiting to be transported
#[derive(Debug, Default)]
pub struct ParticleBank {
    queue: VecDeque<BankedParticle>,
}

impl ParticleBank {
    pub fn new() -> Self {
        ParticleBank {
            queue: VecDeque::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ParticleBank {
            queue: VecDeque::with_capacity(capacity),
        }
    }

    /// Bank a particle without reaction provenance
    pub fn push(&mut self, particle: ParticleState) {
        self.queue.push_back(BankedParticle {
            particle,
            reaction: None,
        });
    }

    /// Bank a secondary produced by `reaction`
    pub fn push_from_reaction(&mut self, particle: ParticleState, reaction: NuclearReactionType) {
        self.queue.push_back(BankedParticle {
            particle,
            reaction: Some(reaction),
        });
    }

    pub fn pop(&mut self) -> Option<BankedParticle> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &BankedParticle> {
        self.queue.iter()
    }
}
