// Scattering cosine distributions
use crate::distribution::{Interpolation, TabularDistribution};
use crate::error::{CollisionError, CollisionResult};
use crate::utilities::{is_strictly_ascending, lower_bin_index};
use rand::{Rng, RngCore};

/// Distribution of the scattering cosine at one incident energy
#[derive(Debug, Clone, PartialEq)]
pub enum AngularDistribution {
    Isotropic,
    /// 33 cosine boundaries of 32 equally probable bins
    EquiprobableBins(Vec<f64>),
    /// Tabulated cosine pdf on [-1, 1]
    Tabular(TabularDistribution),
}

impl AngularDistribution {
    pub fn equiprobable_bins(boundaries: Vec<f64>) -> CollisionResult<Self> {
        if boundaries.len() < 2 || !boundaries.windows(2).all(|pair| pair[0] <= pair[1]) {
            return Err(CollisionError::InvalidGrid(
                "equiprobable cosine bins must be ascending".to_string(),
            ));
        }
        if boundaries[0] < -1.0 || boundaries[boundaries.len() - 1] > 1.0 {
            return Err(CollisionError::InvalidGrid(
                "equiprobable cosine bins must lie in [-1, 1]".to_string(),
            ));
        }
        Ok(AngularDistribution::EquiprobableBins(boundaries))
    }

    /// Sample a cosine. Isotropic and equiprobable-bin tables draw one or two
    /// random numbers; tabular tables draw one.
    pub fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        match self {
            AngularDistribution::Isotropic => 2.0 * rng.gen::<f64>() - 1.0,
            AngularDistribution::EquiprobableBins(boundaries) => {
                let bins = boundaries.len() - 1;
                let scaled = rng.gen::<f64>() * bins as f64;
                let bin = (scaled as usize).min(bins - 1);
                let fraction = scaled - bin as f64;
                boundaries[bin] + fraction * (boundaries[bin + 1] - boundaries[bin])
            }
            AngularDistribution::Tabular(tabular) => tabular.sample(rng).clamp(-1.0, 1.0),
        }
    }

    /// Probability density of cosine `mu`
    pub fn evaluate_pdf(&self, mu: f64) -> f64 {
        if !(-1.0..=1.0).contains(&mu) {
            return 0.0;
        }
        match self {
            AngularDistribution::Isotropic => 0.5,
            AngularDistribution::EquiprobableBins(boundaries) => {
                let bins = boundaries.len() - 1;
                if mu < boundaries[0] || mu > boundaries[bins] {
                    return 0.0;
                }
                let bin = lower_bin_index(boundaries, mu);
                let width = boundaries[bin + 1] - boundaries[bin];
                if width > 0.0 {
                    1.0 / (bins as f64 * width)
                } else {
                    0.0
                }
            }
            AngularDistribution::Tabular(tabular) => tabular.evaluate_pdf(mu),
        }
    }
}

/// Cosine distributions tabulated on an incident-energy grid.
///
/// Between tabulated energies the table to sample is chosen stochastically
/// with probability given by the interpolation fraction.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyDependentAngularDistribution {
    energies: Vec<f64>,
    distributions: Vec<AngularDistribution>,
}

impl EnergyDependentAngularDistribution {
    pub fn new(energies: Vec<f64>, distributions: Vec<AngularDistribution>) -> CollisionResult<Self> {
        if energies.is_empty() || energies.len() != distributions.len() {
            return Err(CollisionError::InvalidGrid(format!(
                "angular distribution needs one table per incident energy ({} energies, {} tables)",
                energies.len(),
                distributions.len()
            )));
        }
        if !is_strictly_ascending(&energies) {
            return Err(CollisionError::InvalidGrid(
                "angular distribution incident energies must be strictly ascending".to_string(),
            ));
        }
        Ok(EnergyDependentAngularDistribution {
            energies,
            distributions,
        })
    }

    pub fn isotropic() -> Self {
        EnergyDependentAngularDistribution {
            energies: vec![0.0],
            distributions: vec![AngularDistribution::Isotropic],
        }
    }

    pub fn is_isotropic(&self) -> bool {
        self.distributions
            .iter()
            .all(|distribution| matches!(distribution, AngularDistribution::Isotropic))
    }

    fn table_for(&self, energy: f64, rng: &mut dyn RngCore) -> &AngularDistribution {
        let last = self.energies.len() - 1;
        if last == 0 || energy <= self.energies[0] {
            return &self.distributions[0];
        }
        if energy >= self.energies[last] {
            return &self.distributions[last];
        }
        let index = lower_bin_index(&self.energies, energy);
        let fraction =
            (energy - self.energies[index]) / (self.energies[index + 1] - self.energies[index]);
        if rng.gen::<f64>() < fraction {
            &self.distributions[index + 1]
        } else {
            &self.distributions[index]
        }
    }

    pub fn sample(&self, energy: f64, rng: &mut dyn RngCore) -> f64 {
        if self.distributions.len() == 1 {
            return self.distributions[0].sample(rng);
        }
        self.table_for(energy, rng).sample(rng)
    }

    /// Density at `mu`, interpolated lin-lin in incident energy
    pub fn evaluate_pdf(&self, energy: f64, mu: f64) -> f64 {
        let last = self.energies.len() - 1;
        if last == 0 || energy <= self.energies[0] {
            return self.distributions[0].evaluate_pdf(mu);
        }
        if energy >= self.energies[last] {
            return self.distributions[last].evaluate_pdf(mu);
        }
        let index = lower_bin_index(&self.energies, energy);
        let fraction =
            (energy - self.energies[index]) / (self.energies[index + 1] - self.energies[index]);
        (1.0 - fraction) * self.distributions[index].evaluate_pdf(mu)
            + fraction * self.distributions[index + 1].evaluate_pdf(mu)
    }
}

/// Tabulated cosine distribution from ACE (JJ = 1 histogram, 2 lin-lin)
pub fn tabular_cosine_distribution(
    interpolation: Interpolation,
    cosines: Vec<f64>,
    pdf: Vec<f64>,
) -> CollisionResult<AngularDistribution> {
    Ok(AngularDistribution::Tabular(TabularDistribution::new(
        interpolation,
        cosines,
        pdf,
    )?))
}
