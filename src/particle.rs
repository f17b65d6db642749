use nalgebra::Vector3;

/// Type of transported particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    Neutron,
    Photon,
}

/// Phase-space state of a particle at a collision site.
///
/// Energies are in MeV. `direction` is kept normalized by every operation
/// that changes it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleState {
    pub kind: ParticleKind,
    pub position: [f64; 3],
    pub direction: [f64; 3],
    pub energy: f64,
    pub weight: f64,
    pub collision_number: u32,
    pub generation: u32,
    gone: bool,
}

impl ParticleState {
    pub fn new(kind: ParticleKind, position: [f64; 3], direction: [f64; 3], energy: f64) -> Self {
        Self {
            kind,
            position,
            direction,
            energy,
            weight: 1.0,
            collision_number: 0,
            generation: 0,
            gone: false,
        }
    }

    pub fn neutron(position: [f64; 3], direction: [f64; 3], energy: f64) -> Self {
        Self::new(ParticleKind::Neutron, position, direction, energy)
    }

    pub fn is_gone(&self) -> bool {
        self.gone
    }

    pub fn set_as_gone(&mut self) {
        self.gone = true;
    }

    pub fn multiply_weight(&mut self, factor: f64) {
        self.weight *= factor;
    }

    pub fn increment_collision_number(&mut self) {
        self.collision_number += 1;
    }

    pub fn direction_vector(&self) -> Vector3<f64> {
        Vector3::from_row_slice(&self.direction)
    }

    pub fn set_direction(&mut self, direction: Vector3<f64>) {
        let norm = direction.norm();
        if norm > 0.0 {
            self.direction = [direction.x / norm, direction.y / norm, direction.z / norm];
        }
    }

    /// Rotate the direction by polar cosine `mu` and azimuth `phi`
    pub fn rotate_direction(&mut self, mu: f64, phi: f64) {
        let rotated = crate::physics::rotate_direction_3d(&self.direction_vector(), mu, phi);
        self.set_direction(rotated);
    }

    /// A new live particle of `kind` born at this particle's position, one
    /// generation later, with zero collisions.
    pub fn spawn_secondary(&self, kind: ParticleKind) -> Self {
        Self {
            kind,
            position: self.position,
            direction: self.direction,
            energy: self.energy,
            weight: self.weight,
            collision_number: 0,
            generation: self.generation + 1,
            gone: false,
        }
    }

    /// A copy of this particle that continues the same history (used for the
    /// extra neutrons of multiplicity > 1 reactions)
    pub fn clone_for_emission(&self) -> Self {
        let mut clone = self.clone();
        clone.generation = self.generation + 1;
        clone.gone = false;
        clone
    }
}
