//! Outgoing-energy PDF/CDF tables of the adjoint free-gas kernel

use super::kernel::FreeGasElasticSAlphaBetaFunction;
use super::marginal::AdjointFreeGasMarginalBetaFunction;
use crate::distribution::TabularDistribution;
use crate::error::{CollisionError, CollisionResult};
use crate::utilities::is_strictly_ascending;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Per-incoming-energy PDF and CDF over a shared outgoing energy grid.
///
/// Rows are keyed by the incoming energy written with `{:e}`, which reads
/// back to the same `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeGasEnergyTable {
    pub energies: Vec<f64>,
    pub pdf: BTreeMap<String, Vec<f64>>,
    pub cdf: BTreeMap<String, Vec<f64>>,
}

pub fn energy_key(energy: f64) -> String {
    format!("{:e}", energy)
}

impl FreeGasEnergyTable {
    pub fn new(energies: Vec<f64>) -> CollisionResult<Self> {
        if energies.len() < 2 || !is_strictly_ascending(&energies) || energies[0] <= 0.0 {
            return Err(CollisionError::InvalidGrid(
                "free gas table needs at least two positive, strictly ascending energies".to_string(),
            ));
        }
        Ok(FreeGasEnergyTable {
            energies,
            pdf: BTreeMap::new(),
            cdf: BTreeMap::new(),
        })
    }

    /// Fill the row for `incoming_energy` from the marginal β distribution.
    ///
    /// The PDF is per MeV of outgoing energy and the CDF is P(E'' ≤ E').
    pub fn populate(
        &mut self,
        function: &Arc<FreeGasElasticSAlphaBetaFunction>,
        incoming_energy: f64,
    ) -> CollisionResult<()> {
        let mut marginal = AdjointFreeGasMarginalBetaFunction::new(Arc::clone(function), incoming_energy)?;
        let temperature = function.temperature();

        let mut pdf = vec![0.0; self.energies.len()];
        let mut cdf = vec![0.0; self.energies.len()];
        // ascending β, so each CDF step starts from the previous point
        for (index, &outgoing) in self.energies.iter().enumerate().rev() {
            let beta = (incoming_energy - outgoing) / temperature;
            pdf[index] = marginal.evaluate_pdf(beta) / temperature;
            cdf[index] = 1.0 - marginal.evaluate_cdf(beta)?;
        }

        log::debug!(
            "free gas table row at E={} MeV filled with {} cached CDF points",
            incoming_energy,
            marginal.cached_points()
        );
        let key = energy_key(incoming_energy);
        self.pdf.insert(key.clone(), pdf);
        self.cdf.insert(key, cdf);
        Ok(())
    }

    /// Populate every incoming energy of the grid
    pub fn populate_all(&mut self, function: &Arc<FreeGasElasticSAlphaBetaFunction>) -> CollisionResult<()> {
        let incoming: Vec<f64> = self.energies.clone();
        for energy in incoming {
            self.populate(function, energy)?;
        }
        Ok(())
    }

    pub fn pdf_row(&self, incoming_energy: f64) -> Option<&[f64]> {
        self.pdf.get(&energy_key(incoming_energy)).map(Vec::as_slice)
    }

    pub fn cdf_row(&self, incoming_energy: f64) -> Option<&[f64]> {
        self.cdf.get(&energy_key(incoming_energy)).map(Vec::as_slice)
    }

    /// Lin-lin outgoing energy distribution for a populated row
    pub fn energy_distribution(&self, incoming_energy: f64) -> CollisionResult<Option<TabularDistribution>> {
        match self.pdf_row(incoming_energy) {
            Some(row) => Ok(Some(TabularDistribution::lin_lin(self.energies.clone(), row.to_vec())?)),
            None => Ok(None),
        }
    }

    /// One distribution per populated incoming energy, in ascending order
    pub fn energy_distributions(&self) -> CollisionResult<Vec<(f64, TabularDistribution)>> {
        let mut distributions = Vec::with_capacity(self.pdf.len());
        for (key, row) in &self.pdf {
            let energy: f64 = key.parse().map_err(|_| {
                CollisionError::InvalidGrid(format!("free gas table key '{}' is not an energy", key))
            })?;
            distributions.push((energy, TabularDistribution::lin_lin(self.energies.clone(), row.clone())?));
        }
        distributions.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(distributions)
    }

    pub fn to_json(&self) -> CollisionResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> CollisionResult<Self> {
        let table: FreeGasEnergyTable = serde_json::from_str(json)?;
        if !is_strictly_ascending(&table.energies)
            || table
                .pdf
                .values()
                .chain(table.cdf.values())
                .any(|row| row.len() != table.energies.len())
        {
            return Err(CollisionError::InvalidGrid(
                "free gas table rows do not match its energy grid".to_string(),
            ));
        }
        Ok(table)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> CollisionResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> CollisionResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::UnivariateDistribution;
    use approx::assert_relative_eq;

    const HYDROGEN_AWR: f64 = 0.999167;
    const ROOM_TEMPERATURE: f64 = 2.53010e-8;

    fn hydrogen() -> Arc<FreeGasElasticSAlphaBetaFunction> {
        let sigma = UnivariateDistribution::constant(20.0, 1e-11, 20.0).unwrap();
        Arc::new(FreeGasElasticSAlphaBetaFunction::isotropic(sigma, HYDROGEN_AWR, ROOM_TEMPERATURE).unwrap())
    }

    fn grid() -> Vec<f64> {
        vec![0.1, 0.5, 1.0, 2.0, 4.0]
            .into_iter()
            .map(|x| x * ROOM_TEMPERATURE)
            .collect()
    }

    #[test]
    fn test_row_is_non_negative_and_cdf_ascends() {
        let mut table = FreeGasEnergyTable::new(grid()).unwrap();
        table.populate(&hydrogen(), ROOM_TEMPERATURE).unwrap();

        let pdf = table.pdf_row(ROOM_TEMPERATURE).unwrap();
        let cdf = table.cdf_row(ROOM_TEMPERATURE).unwrap();
        assert!(pdf.iter().all(|&value| value >= 0.0));
        assert!(pdf.iter().any(|&value| value > 0.0));
        assert!(cdf.windows(2).all(|pair| pair[0] <= pair[1] + 1e-12));
        assert!(cdf.iter().all(|&value| (0.0..=1.0).contains(&value)));
        assert!(table.pdf_row(2.0 * ROOM_TEMPERATURE).is_none());
    }

    #[test]
    fn test_energy_distribution_from_row() {
        let mut table = FreeGasEnergyTable::new(grid()).unwrap();
        table.populate(&hydrogen(), ROOM_TEMPERATURE).unwrap();
        let distribution = table.energy_distribution(ROOM_TEMPERATURE).unwrap().unwrap();
        assert_relative_eq!(distribution.lower_bound(), 0.1 * ROOM_TEMPERATURE);
        assert_relative_eq!(distribution.upper_bound(), 4.0 * ROOM_TEMPERATURE);
        assert_eq!(table.energy_distributions().unwrap().len(), 1);
        assert!(table.energy_distribution(3.0 * ROOM_TEMPERATURE).unwrap().is_none());
    }

    #[test]
    fn test_json_roundtrip_is_lossless() {
        let mut table = FreeGasEnergyTable::new(grid()).unwrap();
        table.populate(&hydrogen(), ROOM_TEMPERATURE).unwrap();
        let restored = FreeGasEnergyTable::from_json(&table.to_json().unwrap()).unwrap();
        assert_eq!(restored, table);
        assert_eq!(restored.pdf_row(ROOM_TEMPERATURE), table.pdf_row(ROOM_TEMPERATURE));
    }

    #[test]
    fn test_rejects_mismatched_rows() {
        let json = r#"{"energies":[1e-9,2e-9],"pdf":{"1e-9":[1.0]},"cdf":{}}"#;
        assert!(FreeGasEnergyTable::from_json(json).is_err());
        assert!(FreeGasEnergyTable::new(vec![1e-9]).is_err());
    }
}
