//! Adjoint marginal distribution of the energy transfer β

use super::kernel::FreeGasElasticSAlphaBetaFunction;
use crate::error::{CollisionError, CollisionResult};
use crate::gauss_kronrod::{GaussKronrodIntegrator, Gk15};
use std::sync::Arc;

/// Largest upward energy transfer considered, in units of A·kT
pub const ADJOINT_BETA_MIN_PER_AWR: f64 = -500.0;

const RELATIVE_TOLERANCE: f64 = 1e-6;
const SUBINTERVAL_LIMIT: usize = 1000;

/// PDF and CDF of the adjoint energy transfer `β = (E - E')/kT` at a fixed
/// incoming energy.
///
/// The CDF keeps a sorted cache of evaluated points seeded with
/// `(β_min, 0)` and `(∞, 1)`; each new evaluation integrates only from the
/// nearest cached point below it.
#[derive(Debug, Clone)]
pub struct AdjointFreeGasMarginalBetaFunction {
    function: Arc<FreeGasElasticSAlphaBetaFunction>,
    integrator: GaussKronrodIntegrator,
    energy: f64,
    beta_min: f64,
    beta_max: f64,
    normalization_constant: f64,
    cdf_cache: Vec<(f64, f64)>,
}

impl AdjointFreeGasMarginalBetaFunction {
    pub fn new(function: Arc<FreeGasElasticSAlphaBetaFunction>, energy: f64) -> CollisionResult<Self> {
        let mut marginal = AdjointFreeGasMarginalBetaFunction {
            beta_min: ADJOINT_BETA_MIN_PER_AWR * function.atomic_weight_ratio(),
            function,
            integrator: GaussKronrodIntegrator::new(RELATIVE_TOLERANCE, 0.0, SUBINTERVAL_LIMIT)?,
            energy: 0.0,
            beta_max: 0.0,
            normalization_constant: 0.0,
            cdf_cache: Vec::new(),
        };
        marginal.set_energy(energy)?;
        Ok(marginal)
    }

    /// Move to a new incoming energy, rebuilding the normalization and the CDF cache
    pub fn set_energy(&mut self, energy: f64) -> CollisionResult<()> {
        if !(energy > 0.0) || !energy.is_finite() {
            return Err(crate::error::contract_violation!(
                "free gas incoming energy must be positive, found {} MeV",
                energy
            ));
        }
        self.energy = energy;
        self.beta_max = energy / self.function.temperature();
        self.cdf_cache = vec![(self.beta_min, 0.0), (f64::INFINITY, 1.0)];
        self.normalization_constant = self.integrate_pieces()?;
        if !(self.normalization_constant > 0.0) {
            return Err(crate::error::contract_violation!(
                "free gas normalization at E={} MeV is {}, expected a positive value",
                energy,
                self.normalization_constant
            ));
        }
        log::trace!(
            "free gas marginal at E={} MeV: beta in [{}, {}], normalization {}",
            energy,
            self.beta_min,
            self.beta_max,
            self.normalization_constant
        );
        Ok(())
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn beta_min(&self) -> f64 {
        self.beta_min
    }

    pub fn beta_max(&self) -> f64 {
        self.beta_max
    }

    pub fn normalization_constant(&self) -> f64 {
        self.normalization_constant
    }

    pub fn function(&self) -> &Arc<FreeGasElasticSAlphaBetaFunction> {
        &self.function
    }

    /// Detailed-balance weighted S(α,β) integral; zero on and outside the bounds
    pub fn evaluate_unnormalized(&self, beta: f64) -> f64 {
        if beta <= self.beta_min || beta >= self.beta_max {
            return 0.0;
        }
        let reduced_energy = self.beta_max;
        let log_scale = -beta + (reduced_energy / (reduced_energy - beta)).ln();
        self.function.integrated_s_alpha_beta(-beta, self.energy, log_scale)
    }

    pub fn evaluate_pdf(&self, beta: f64) -> f64 {
        self.evaluate_unnormalized(beta) / self.normalization_constant
    }

    /// CDF at `beta`, memoized in the sorted point cache
    pub fn evaluate_cdf(&mut self, beta: f64) -> CollisionResult<f64> {
        if beta.is_nan() {
            return Err(crate::error::contract_violation!(
                "free gas CDF needs a numeric beta, found {}",
                beta
            ));
        }
        if beta <= self.beta_min {
            return Ok(0.0);
        }
        if beta >= self.beta_max {
            return Ok(1.0);
        }

        let index = self.cdf_cache.partition_point(|&(cached, _)| cached <= beta) - 1;
        let (start, start_value) = self.cdf_cache[index];
        if start == beta {
            return Ok(start_value);
        }

        let points = self.integration_points(start, beta);
        let increment = match self
            .integrator
            .integrate_adaptively_over_points::<Gk15, _>(|b| self.evaluate_unnormalized(b), &points)
        {
            Ok(estimate) => estimate.value,
            Err(err) => {
                log::warn!("free gas CDF integral over [{}, {}] failed: {}", start, beta, err);
                err.partial_estimate().map(|(value, _)| value).unwrap_or(0.0)
            }
        };
        let value = (start_value + increment / self.normalization_constant).min(1.0);
        self.cdf_cache.insert(index + 1, (beta, value));
        Ok(value)
    }

    /// Number of cached CDF points, including the two seeds
    pub fn cached_points(&self) -> usize {
        self.cdf_cache.len()
    }

    /// Fixed interior breakpoints scaled with √(E/kT), kept inside (β_min, β_max)
    pub(crate) fn breakpoints(&self) -> Vec<f64> {
        let reduced_energy = self.beta_max;
        let scale = reduced_energy.sqrt().max(1.0);
        let candidates = [
            -10.0 * scale,
            -3.0 * scale,
            -scale,
            0.0,
            scale.min(0.5 * reduced_energy),
        ];
        let mut points = vec![self.beta_min];
        points.extend(
            candidates
                .iter()
                .copied()
                .filter(|&point| point > self.beta_min && point < self.beta_max),
        );
        points.push(self.beta_max);
        points.dedup();
        points
    }

    fn integration_points(&self, lower: f64, upper: f64) -> Vec<f64> {
        let mut points = vec![lower];
        points.extend(
            self.breakpoints()
                .into_iter()
                .filter(|&point| point > lower && point < upper),
        );
        points.push(upper);
        points
    }

    fn integrate_pieces(&self) -> CollisionResult<f64> {
        let points = self.breakpoints();
        let mut total = 0.0;
        for piece in points.windows(2) {
            let estimate = self
                .integrator
                .integrate_adaptively::<Gk15, _>(|b| self.evaluate_unnormalized(b), piece[0], piece[1]);
            total += match estimate {
                Ok(estimate) => estimate.value,
                Err(err) => match err.partial_estimate() {
                    Some((value, _)) => {
                        log::warn!(
                            "free gas normalization over [{}, {}] did not converge: {}",
                            piece[0],
                            piece[1],
                            err
                        );
                        value
                    }
                    None => return Err(CollisionError::Integration(err)),
                },
            };
        }
        Ok(total)
    }
}
