//! Free-gas corrected elastic cross section on a thermal energy grid

use super::kernel::FreeGasElasticSAlphaBetaFunction;
use super::marginal::AdjointFreeGasMarginalBetaFunction;
use crate::error::CollisionResult;
use crate::utilities::is_strictly_ascending;
use std::f64::consts::PI;
use std::sync::Arc;

/// Energies above this many kT use the 0 K cross section unchanged
pub const DEFAULT_CUTOFF_IN_KT: f64 = 400.0;

/// Builds the adjoint free-gas elastic cross section over a thermal grid
#[derive(Debug, Clone)]
pub struct AdjointFreeGasElasticCrossSectionGenerator {
    function: Arc<FreeGasElasticSAlphaBetaFunction>,
    energies: Vec<f64>,
    cutoff_energy: f64,
}

impl AdjointFreeGasElasticCrossSectionGenerator {
    pub fn new(function: Arc<FreeGasElasticSAlphaBetaFunction>, energies: Vec<f64>) -> CollisionResult<Self> {
        if energies.is_empty() || !is_strictly_ascending(&energies) || energies[0] <= 0.0 {
            return Err(crate::error::CollisionError::InvalidGrid(
                "free gas thermal grid must be non-empty, positive and strictly ascending".to_string(),
            ));
        }
        let cutoff_energy = DEFAULT_CUTOFF_IN_KT * function.temperature();
        Ok(AdjointFreeGasElasticCrossSectionGenerator {
            function,
            energies,
            cutoff_energy,
        })
    }

    pub fn with_cutoff_energy(mut self, cutoff_energy: f64) -> Self {
        self.cutoff_energy = cutoff_energy;
        self
    }

    pub fn cutoff_energy(&self) -> f64 {
        self.cutoff_energy
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn function(&self) -> &Arc<FreeGasElasticSAlphaBetaFunction> {
        &self.function
    }

    /// (A+1)^4 (kT/E) / (4A√(π³))
    pub fn kinematic_prefactor(&self, energy: f64) -> f64 {
        let a = self.function.atomic_weight_ratio();
        (a + 1.0).powi(4) * (self.function.temperature() / energy) / (4.0 * a * PI.powi(3).sqrt())
    }

    /// Corrected cross section at a single incoming energy (b)
    pub fn cross_section_at(&self, energy: f64) -> CollisionResult<f64> {
        if energy > self.cutoff_energy {
            return Ok(self.function.zero_temperature_cross_section().evaluate(energy));
        }
        let marginal = AdjointFreeGasMarginalBetaFunction::new(Arc::clone(&self.function), energy)?;
        Ok(self.kinematic_prefactor(energy) * marginal.normalization_constant())
    }

    /// Cross section at every grid energy
    pub fn generate_free_gas_cross_section(&self) -> CollisionResult<Vec<f64>> {
        let below_cutoff = self
            .energies
            .iter()
            .filter(|&&energy| energy <= self.cutoff_energy)
            .count();
        log::info!(
            "generating free gas cross section on {} energies ({} below the {} MeV cutoff)",
            self.energies.len(),
            below_cutoff,
            self.cutoff_energy
        );
        self.energies
            .iter()
            .map(|&energy| self.cross_section_at(energy))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::UnivariateDistribution;
    use approx::assert_relative_eq;

    const HYDROGEN_AWR: f64 = 0.999167;
    const ROOM_TEMPERATURE: f64 = 2.53010e-8;

    fn hydrogen(energies: Vec<f64>) -> AdjointFreeGasElasticCrossSectionGenerator {
        let sigma = UnivariateDistribution::constant(20.0, 1e-11, 20.0).unwrap();
        let function = FreeGasElasticSAlphaBetaFunction::isotropic(sigma, HYDROGEN_AWR, ROOM_TEMPERATURE).unwrap();
        AdjointFreeGasElasticCrossSectionGenerator::new(Arc::new(function), energies).unwrap()
    }

    #[test]
    fn test_cross_section_at_room_temperature() {
        let generator = hydrogen(vec![ROOM_TEMPERATURE]);
        let cross_section = generator.cross_section_at(ROOM_TEMPERATURE).unwrap();
        assert_relative_eq!(cross_section, 126.19, max_relative = 1e-3);
    }

    #[test]
    fn test_above_cutoff_uses_zero_temperature_value() {
        let generator = hydrogen(vec![ROOM_TEMPERATURE, 1e-3]).with_cutoff_energy(1e-4);
        let values = generator.generate_free_gas_cross_section().unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[1], 20.0);
        assert!(values[0] > 20.0);
    }

    #[test]
    fn test_default_cutoff_scales_with_temperature() {
        let generator = hydrogen(vec![ROOM_TEMPERATURE]);
        assert_relative_eq!(generator.cutoff_energy(), 400.0 * ROOM_TEMPERATURE);
    }

    #[test]
    fn test_rejects_unsorted_grid() {
        let sigma = UnivariateDistribution::constant(20.0, 1e-11, 20.0).unwrap();
        let function = FreeGasElasticSAlphaBetaFunction::isotropic(sigma, HYDROGEN_AWR, ROOM_TEMPERATURE).unwrap();
        assert!(AdjointFreeGasElasticCrossSectionGenerator::new(Arc::new(function), vec![1e-8, 1e-9]).is_err());
    }
}
