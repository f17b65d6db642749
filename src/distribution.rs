// One-dimensional tabulated and polynomial distributions
//
// Used for fission multiplicities, photon yields, delayed-group
// probabilities, zero-temperature cross section curves and the tabulated
// outgoing-energy distributions rebuilt from free-gas tables.

use crate::error::{CollisionError, CollisionResult};
use crate::utilities::{interpolate_lin_lin, is_strictly_ascending, lower_bin_index};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Interpolation between tabulated points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    /// Constant over [x_i, x_{i+1})
    Histogram,
    LinLin,
}

impl Interpolation {
    /// ENDF interpolation code (1 = histogram, 2 = lin-lin)
    pub fn from_endf_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Interpolation::Histogram),
            2 => Some(Interpolation::LinLin),
            _ => None,
        }
    }
}

/// Tabulated function with a cumulative integral for inverse-CDF sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularDistribution {
    interpolation: Interpolation,
    x: Vec<f64>,
    y: Vec<f64>,
    /// Unnormalized running integral at each x
    cumulative: Vec<f64>,
}

impl TabularDistribution {
    pub fn new(interpolation: Interpolation, x: Vec<f64>, y: Vec<f64>) -> CollisionResult<Self> {
        if x.is_empty() || x.len() != y.len() {
            return Err(CollisionError::InvalidGrid(format!(
                "tabular distribution needs matching non-empty arrays, found {} and {} values",
                x.len(),
                y.len()
            )));
        }
        if !is_strictly_ascending(&x) {
            return Err(CollisionError::InvalidGrid(
                "tabular distribution independent values must be strictly ascending".to_string(),
            ));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(CollisionError::InvalidGrid(
                "tabular distribution contains non-finite values".to_string(),
            ));
        }

        let mut cumulative = Vec::with_capacity(x.len());
        cumulative.push(0.0);
        for i in 1..x.len() {
            let width = x[i] - x[i - 1];
            let area = match interpolation {
                Interpolation::Histogram => y[i - 1] * width,
                Interpolation::LinLin => 0.5 * (y[i - 1] + y[i]) * width,
            };
            cumulative.push(cumulative[i - 1] + area);
        }

        Ok(TabularDistribution {
            interpolation,
            x,
            y,
            cumulative,
        })
    }

    pub fn lin_lin(x: Vec<f64>, y: Vec<f64>) -> CollisionResult<Self> {
        Self::new(Interpolation::LinLin, x, y)
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn independent_values(&self) -> &[f64] {
        &self.x
    }

    pub fn dependent_values(&self) -> &[f64] {
        &self.y
    }

    pub fn lower_bound(&self) -> f64 {
        self.x[0]
    }

    pub fn upper_bound(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    /// Integral of the tabulated function over its full range
    pub fn norm(&self) -> f64 {
        self.cumulative[self.cumulative.len() - 1]
    }

    /// Tabulated value at `x`; zero outside the table
    pub fn evaluate(&self, x: f64) -> f64 {
        let last = self.x.len() - 1;
        if x < self.x[0] || x > self.x[last] || x.is_nan() {
            return 0.0;
        }
        if last == 0 || x == self.x[last] {
            return self.y[last];
        }
        let i = lower_bin_index(&self.x, x);
        match self.interpolation {
            Interpolation::Histogram => self.y[i],
            Interpolation::LinLin => {
                interpolate_lin_lin(self.x[i], self.x[i + 1], self.y[i], self.y[i + 1], x)
            }
        }
    }

    pub fn evaluate_pdf(&self, x: f64) -> f64 {
        let norm = self.norm();
        if norm > 0.0 {
            self.evaluate(x) / norm
        } else {
            0.0
        }
    }

    pub fn evaluate_cdf(&self, x: f64) -> f64 {
        let last = self.x.len() - 1;
        let norm = self.norm();
        if x <= self.x[0] || norm <= 0.0 {
            return 0.0;
        }
        if x >= self.x[last] {
            return 1.0;
        }
        let i = lower_bin_index(&self.x, x);
        let dx = x - self.x[i];
        let partial = match self.interpolation {
            Interpolation::Histogram => self.y[i] * dx,
            Interpolation::LinLin => {
                let slope = (self.y[i + 1] - self.y[i]) / (self.x[i + 1] - self.x[i]);
                self.y[i] * dx + 0.5 * slope * dx * dx
            }
        };
        (self.cumulative[i] + partial) / norm
    }

    /// Inverse-CDF sample; one random number
    pub fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        self.sample_with_random_number(rng.gen::<f64>())
    }

    pub fn sample_with_random_number(&self, xi: f64) -> f64 {
        let last = self.x.len() - 1;
        let norm = self.norm();
        if last == 0 || norm <= 0.0 {
            return self.x[0];
        }

        let target = xi * norm;
        let i = lower_bin_index(&self.cumulative, target.min(norm)).min(last - 1);
        let remaining = target - self.cumulative[i];
        let x0 = self.x[i];
        let y0 = self.y[i];

        let sampled = match self.interpolation {
            Interpolation::Histogram => {
                if y0 > 0.0 {
                    x0 + remaining / y0
                } else {
                    x0
                }
            }
            Interpolation::LinLin => {
                let slope = (self.y[i + 1] - y0) / (self.x[i + 1] - x0);
                if slope == 0.0 {
                    if y0 > 0.0 {
                        x0 + remaining / y0
                    } else {
                        x0
                    }
                } else {
                    let discriminant = (y0 * y0 + 2.0 * slope * remaining).max(0.0);
                    x0 + (discriminant.sqrt() - y0) / slope
                }
            }
        };
        sampled.clamp(x0, self.x[i + 1])
    }
}

/// Polynomial in the independent variable, valid on [lower, upper]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialDistribution {
    coefficients: Vec<f64>,
    lower: f64,
    upper: f64,
}

impl PolynomialDistribution {
    pub fn new(coefficients: Vec<f64>, lower: f64, upper: f64) -> CollisionResult<Self> {
        if coefficients.is_empty() {
            return Err(crate::error::contract_violation!(
                "polynomial distribution needs at least one coefficient"
            ));
        }
        if !(lower < upper) {
            return Err(crate::error::contract_violation!(
                "polynomial distribution bounds [{}, {}] are invalid",
                lower,
                upper
            ));
        }
        Ok(PolynomialDistribution {
            coefficients,
            lower,
            upper,
        })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Horner evaluation; no range check
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |accumulated, coefficient| accumulated * x + coefficient)
    }
}

/// Evaluate/bounds contract shared by every univariate curve in the crate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnivariateDistribution {
    Tabular(TabularDistribution),
    Polynomial(PolynomialDistribution),
}

impl UnivariateDistribution {
    pub fn evaluate(&self, x: f64) -> f64 {
        match self {
            UnivariateDistribution::Tabular(tabular) => tabular.evaluate(x),
            UnivariateDistribution::Polynomial(polynomial) => polynomial.evaluate(x),
        }
    }

    pub fn lower_bound(&self) -> f64 {
        match self {
            UnivariateDistribution::Tabular(tabular) => tabular.lower_bound(),
            UnivariateDistribution::Polynomial(polynomial) => polynomial.lower,
        }
    }

    pub fn upper_bound(&self) -> f64 {
        match self {
            UnivariateDistribution::Tabular(tabular) => tabular.upper_bound(),
            UnivariateDistribution::Polynomial(polynomial) => polynomial.upper,
        }
    }

    /// A constant curve over [lower, upper]
    pub fn constant(value: f64, lower: f64, upper: f64) -> CollisionResult<Self> {
        Ok(UnivariateDistribution::Polynomial(PolynomialDistribution::new(
            vec![value],
            lower,
            upper,
        )?))
    }
}
