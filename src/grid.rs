// Energy grids, hashed grid search and per-reaction cross section tables
//
// Grids live in a `GridArena` owned by the nuclide; reactions refer to a grid
// by `GridId` plus a threshold index instead of holding their own copy.

use crate::error::{CollisionError, CollisionResult};
use crate::utilities::{interpolate_lin_lin, is_strictly_ascending, lower_bin_index_in_range};
use serde::{Deserialize, Serialize};

/// Index of a grid inside a [`GridArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridId(pub usize);

impl GridId {
    /// The nuclide's primary (union) energy grid
    pub const PRIMARY: GridId = GridId(0);
}

/// Accelerates bin lookups on an energy grid by hashing log(E) into uniform
/// bins, each remembering the range of grid points it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct HashedGridSearcher {
    log_min: f64,
    log_max: f64,
    bin_width: f64,
    /// Lowest grid index whose bin may contain a point in each hash bin
    bin_lower_indices: Vec<usize>,
}

impl HashedGridSearcher {
    /// Build a searcher with `number_of_bins` hash bins. The grid must be
    /// strictly ascending and positive.
    pub fn new(grid: &[f64], number_of_bins: usize) -> CollisionResult<Self> {
        if grid.len() < 2 {
            return Err(CollisionError::InvalidGrid(
                "a hashed grid searcher needs at least two grid points".to_string(),
            ));
        }
        if number_of_bins == 0 {
            return Err(CollisionError::InvalidGrid(
                "a hashed grid searcher needs at least one hash bin".to_string(),
            ));
        }
        if grid[0] <= 0.0 {
            return Err(CollisionError::InvalidGrid(format!(
                "hashed grid search requires positive energies, found {}",
                grid[0]
            )));
        }

        let log_min = grid[0].ln();
        let log_max = grid[grid.len() - 1].ln();
        let bin_width = (log_max - log_min) / number_of_bins as f64;

        let mut bin_lower_indices = Vec::with_capacity(number_of_bins + 1);
        let mut index = 0usize;
        for bin in 0..=number_of_bins {
            let bin_log_energy = log_min + bin as f64 * bin_width;
            while index + 1 < grid.len() - 1 && grid[index + 1].ln() <= bin_log_energy {
                index += 1;
            }
            bin_lower_indices.push(index);
        }

        Ok(HashedGridSearcher {
            log_min,
            log_max,
            bin_width,
            bin_lower_indices,
        })
    }

    /// Range of grid indices to binary search for `energy`
    #[inline]
    fn search_range(&self, energy: f64, last_index: usize) -> (usize, usize) {
        let log_energy = energy.ln();
        if !(log_energy > self.log_min) || self.bin_width <= 0.0 {
            return (0, last_index);
        }
        if log_energy >= self.log_max {
            return (last_index.saturating_sub(1), last_index);
        }
        let bin = ((log_energy - self.log_min) / self.bin_width) as usize;
        let bins = self.bin_lower_indices.len() - 1;
        let bin = bin.min(bins - 1);
        // neighbouring bins absorb rounding in the hash computation
        let low = self.bin_lower_indices[bin.saturating_sub(1)];
        let high = (self.bin_lower_indices[(bin + 2).min(bins)] + 1).min(last_index);
        (low, high.max(low + 1).min(last_index))
    }
}

/// A strictly ascending incoming-energy grid in MeV
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyGrid {
    energies: Vec<f64>,
    searcher: Option<HashedGridSearcher>,
}

impl EnergyGrid {
    pub fn new(energies: Vec<f64>) -> CollisionResult<Self> {
        if energies.is_empty() {
            return Err(CollisionError::InvalidGrid("energy grid is empty".to_string()));
        }
        if energies.iter().any(|e| !e.is_finite()) {
            return Err(CollisionError::InvalidGrid(
                "energy grid contains non-finite values".to_string(),
            ));
        }
        if !is_strictly_ascending(&energies) {
            return Err(CollisionError::InvalidGrid(
                "energy grid is not strictly ascending".to_string(),
            ));
        }
        Ok(EnergyGrid {
            energies,
            searcher: None,
        })
    }

    /// Attach a hashed searcher with `number_of_bins` bins
    pub fn with_hashed_search(mut self, number_of_bins: usize) -> CollisionResult<Self> {
        self.searcher = Some(HashedGridSearcher::new(&self.energies, number_of_bins)?);
        Ok(self)
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn len(&self) -> usize {
        self.energies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }

    pub fn min_energy(&self) -> f64 {
        self.energies[0]
    }

    pub fn max_energy(&self) -> f64 {
        self.energies[self.energies.len() - 1]
    }

    pub fn is_hashed(&self) -> bool {
        self.searcher.is_some()
    }

    /// Largest grid index `i` with `energies[i] <= energy`, clamped to the
    /// last bin. Only meaningful for energies inside the grid.
    #[inline]
    pub fn lower_bin_index(&self, energy: f64) -> usize {
        let last = self.energies.len() - 1;
        if last == 0 {
            return 0;
        }
        let (low, high) = match &self.searcher {
            Some(searcher) => searcher.search_range(energy, last),
            None => (0, last),
        };
        lower_bin_index_in_range(&self.energies, energy, low, high)
    }
}

/// Owner of every energy grid referenced by one nuclide's reactions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridArena {
    grids: Vec<EnergyGrid>,
}

impl GridArena {
    /// An arena whose primary grid is `primary`
    pub fn new(primary: EnergyGrid) -> Self {
        GridArena {
            grids: vec![primary],
        }
    }

    pub fn push(&mut self, grid: EnergyGrid) -> GridId {
        self.grids.push(grid);
        GridId(self.grids.len() - 1)
    }

    pub fn get(&self, id: GridId) -> Option<&EnergyGrid> {
        self.grids.get(id.0)
    }

    pub fn primary(&self) -> &EnergyGrid {
        &self.grids[0]
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    fn grid(&self, id: GridId) -> &EnergyGrid {
        &self.grids[id.0]
    }
}

/// Cross section of one reaction, aligned to the suffix of an arena grid
/// that starts at `threshold_index`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionCrossSection {
    grid: GridId,
    threshold_index: usize,
    values: Vec<f64>,
    /// At and below this energy the reaction is handled by S(alpha,beta)
    /// data and reports zero
    s_alpha_beta_cutoff: Option<f64>,
}

impl ReactionCrossSection {
    pub fn new(
        grids: &GridArena,
        grid: GridId,
        threshold_index: usize,
        values: Vec<f64>,
    ) -> CollisionResult<Self> {
        let energy_grid = grids.get(grid).ok_or_else(|| {
            CollisionError::InvalidGrid(format!("grid {} does not exist", grid.0))
        })?;
        if values.is_empty() {
            return Err(CollisionError::InvalidGrid(
                "cross section has no values".to_string(),
            ));
        }
        if threshold_index + values.len() != energy_grid.len() {
            return Err(CollisionError::InvalidGrid(format!(
                "threshold index {} plus {} cross section values does not match grid length {}",
                threshold_index,
                values.len(),
                energy_grid.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(CollisionError::InvalidGrid(
                "cross section contains non-finite values".to_string(),
            ));
        }

        Ok(ReactionCrossSection {
            grid,
            threshold_index,
            values,
            s_alpha_beta_cutoff: None,
        })
    }

    pub fn grid_id(&self) -> GridId {
        self.grid
    }

    pub fn threshold_index(&self) -> usize {
        self.threshold_index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn threshold_energy(&self, grids: &GridArena) -> f64 {
        grids.grid(self.grid).energies()[self.threshold_index]
    }

    pub fn max_energy(&self, grids: &GridArena) -> f64 {
        grids.grid(self.grid).max_energy()
    }

    pub fn s_alpha_beta_cutoff(&self) -> Option<f64> {
        self.s_alpha_beta_cutoff
    }

    pub(crate) fn set_s_alpha_beta_cutoff(&mut self, cutoff: f64) {
        self.s_alpha_beta_cutoff = Some(cutoff);
    }

    /// Cross section at `energy`: zero below threshold or above the grid,
    /// the last value at the top of the grid, lin-lin elsewhere.
    #[inline]
    pub fn evaluate(&self, grids: &GridArena, energy: f64) -> f64 {
        if let Some(cutoff) = self.s_alpha_beta_cutoff {
            if energy <= cutoff {
                return 0.0;
            }
        }
        self.evaluate_tabulated(grids, energy)
    }

    /// Evaluate ignoring any S(alpha,beta) cutoff
    #[inline]
    pub fn evaluate_tabulated(&self, grids: &GridArena, energy: f64) -> f64 {
        let grid = grids.grid(self.grid);
        let energies = grid.energies();
        let threshold_energy = energies[self.threshold_index];
        let max_energy = grid.max_energy();

        if energy < threshold_energy || energy > max_energy || energy.is_nan() {
            return 0.0;
        }
        if energy == max_energy {
            return self.values[self.values.len() - 1];
        }

        let index = grid.lower_bin_index(energy).max(self.threshold_index);
        let cs_index = index - self.threshold_index;
        interpolate_lin_lin(
            energies[index],
            energies[index + 1],
            self.values[cs_index],
            self.values[cs_index + 1],
            energy,
        )
    }

    /// Value at a grid index of the underlying grid (zero below threshold)
    pub fn value_at_grid_index(&self, index: usize) -> f64 {
        if index < self.threshold_index {
            0.0
        } else {
            self.values
                .get(index - self.threshold_index)
                .copied()
                .unwrap_or(0.0)
        }
    }

    /// Multiply each value by `factor(energy)` evaluated on this table's own grid points
    pub fn scaled_by<F>(&self, grids: &GridArena, mut factor: F) -> Self
    where
        F: FnMut(f64) -> f64,
    {
        let energies = &grids.grid(self.grid).energies()[self.threshold_index..];
        let values = self
            .values
            .iter()
            .zip(energies)
            .map(|(value, energy)| value * factor(*energy))
            .collect();
        ReactionCrossSection {
            grid: self.grid,
            threshold_index: self.threshold_index,
            values,
            s_alpha_beta_cutoff: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn arena() -> GridArena {
        GridArena::new(EnergyGrid::new(vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap())
    }

    #[test]
    fn test_grid_rejects_unsorted_energies() {
        assert!(EnergyGrid::new(vec![1.0, 1.0, 2.0]).is_err());
        assert!(EnergyGrid::new(vec![2.0, 1.0]).is_err());
        assert!(EnergyGrid::new(vec![]).is_err());
    }

    #[test]
    fn test_cross_section_bracket_property() {
        let grids = arena();
        let xs = ReactionCrossSection::new(&grids, GridId::PRIMARY, 1, vec![10.0, 20.0, 30.0, 40.0]).unwrap();

        // below threshold
        assert_eq!(xs.evaluate(&grids, 1.5), 0.0);
        // grid points exactly
        assert_eq!(xs.evaluate(&grids, 2.0), 10.0);
        assert_eq!(xs.evaluate(&grids, 4.0), 30.0);
        // interior lin-lin
        assert_relative_eq!(xs.evaluate(&grids, 3.25), 22.5, max_relative = 1e-14);
        // top of grid and beyond
        assert_eq!(xs.evaluate(&grids, 5.0), 40.0);
        assert_eq!(xs.evaluate(&grids, 5.0001), 0.0);
        assert_eq!(xs.threshold_energy(&grids), 2.0);
    }

    #[test]
    fn test_cross_section_length_must_match_grid() {
        let grids = arena();
        let result = ReactionCrossSection::new(&grids, GridId::PRIMARY, 1, vec![1.0, 2.0]);
        assert!(matches!(result, Err(CollisionError::InvalidGrid(_))));
        assert!(ReactionCrossSection::new(&grids, GridId(3), 0, vec![1.0; 5]).is_err());
    }

    #[test]
    fn test_s_alpha_beta_cutoff_zeroes_low_energies() {
        let grids = arena();
        let mut xs = ReactionCrossSection::new(&grids, GridId::PRIMARY, 0, vec![5.0; 5]).unwrap();
        xs.set_s_alpha_beta_cutoff(2.5);
        assert_eq!(xs.evaluate(&grids, 2.0), 0.0);
        assert_eq!(xs.evaluate(&grids, 2.5), 0.0);
        assert_eq!(xs.evaluate(&grids, 3.0), 5.0);
        assert_eq!(xs.evaluate_tabulated(&grids, 2.0), 5.0);
    }

    #[test]
    fn test_hashed_search_matches_binary_search() {
        let energies: Vec<f64> = (0..500).map(|i| 1e-11 * 1.05f64.powi(i)).collect();
        let plain = EnergyGrid::new(energies.clone()).unwrap();
        let hashed = EnergyGrid::new(energies.clone()).unwrap().with_hashed_search(37).unwrap();
        assert!(hashed.is_hashed());

        let max = plain.max_energy();
        let mut energy = plain.min_energy();
        while energy <= max {
            assert_eq!(plain.lower_bin_index(energy), hashed.lower_bin_index(energy), "energy {energy}");
            energy *= 1.013;
        }
        for e in &energies {
            assert_eq!(plain.lower_bin_index(*e), hashed.lower_bin_index(*e));
        }
        assert_eq!(hashed.lower_bin_index(max), energies.len() - 2);
    }

    #[test]
    fn test_scaled_by_keeps_binding() {
        let grids = arena();
        let xs = ReactionCrossSection::new(&grids, GridId::PRIMARY, 2, vec![1.0, 2.0, 3.0]).unwrap();
        let doubled = xs.scaled_by(&grids, |energy| energy);
        assert_eq!(doubled.values(), &[3.0, 8.0, 15.0]);
        assert_eq!(doubled.threshold_index(), 2);
    }
}
