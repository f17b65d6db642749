//! Free-gas elastic S(α,β) kernel and its integral over the CM cosine and α

use crate::distribution::UnivariateDistribution;
use crate::error::{CollisionResult, IntegrationError};
use crate::gauss_kronrod::{GaussKronrodIntegrator, Gk15};
use crate::stats::EnergyDependentAngularDistribution;
use crate::utilities::{bessel_i0_scaled, erf_difference};
use std::f64::consts::PI;

/// Relative collision energies below this floor use the floor instead (MeV)
pub const RELATIVE_ENERGY_FLOOR: f64 = 1e-11;

/// ln(f64::MIN_POSITIVE)
const LOG_MIN_POSITIVE: f64 = -708.3964185322641;

const MU_RELATIVE_TOLERANCE: f64 = 1e-7;
const ALPHA_RELATIVE_TOLERANCE: f64 = 1e-6;
const SUBINTERVAL_LIMIT: usize = 1000;
const MAX_BISECTIONS: usize = 200;

/// Thermally broadened elastic scattering law of a free-gas target.
///
/// Energies are in MeV and the temperature is kT in MeV. The kernel is
/// expressed in `u = 1 - μ_cm` so the forward-scattering pole sits at `u = 0`.
#[derive(Debug, Clone)]
pub struct FreeGasElasticSAlphaBetaFunction {
    zero_temperature_cross_section: UnivariateDistribution,
    angular_distribution: EnergyDependentAngularDistribution,
    atomic_weight_ratio: f64,
    temperature: f64,
    mu_integrator: GaussKronrodIntegrator,
    alpha_integrator: GaussKronrodIntegrator,
}

impl FreeGasElasticSAlphaBetaFunction {
    pub fn new(
        zero_temperature_cross_section: UnivariateDistribution,
        angular_distribution: EnergyDependentAngularDistribution,
        atomic_weight_ratio: f64,
        temperature: f64,
    ) -> CollisionResult<Self> {
        if !(atomic_weight_ratio > 0.0) {
            return Err(crate::error::contract_violation!(
                "free gas atomic weight ratio must be positive, found {}",
                atomic_weight_ratio
            ));
        }
        if !(temperature > 0.0) {
            return Err(crate::error::contract_violation!(
                "free gas temperature must be positive, found {} MeV",
                temperature
            ));
        }
        Ok(FreeGasElasticSAlphaBetaFunction {
            zero_temperature_cross_section,
            angular_distribution,
            atomic_weight_ratio,
            temperature,
            mu_integrator: GaussKronrodIntegrator::new(MU_RELATIVE_TOLERANCE, 0.0, SUBINTERVAL_LIMIT)?,
            alpha_integrator: GaussKronrodIntegrator::new(ALPHA_RELATIVE_TOLERANCE, 0.0, SUBINTERVAL_LIMIT)?,
        })
    }

    /// Isotropic CM scattering off a target with a tabulated 0 K cross section
    pub fn isotropic(
        zero_temperature_cross_section: UnivariateDistribution,
        atomic_weight_ratio: f64,
        temperature: f64,
    ) -> CollisionResult<Self> {
        Self::new(
            zero_temperature_cross_section,
            EnergyDependentAngularDistribution::isotropic(),
            atomic_weight_ratio,
            temperature,
        )
    }

    pub fn atomic_weight_ratio(&self) -> f64 {
        self.atomic_weight_ratio
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn zero_temperature_cross_section(&self) -> &UnivariateDistribution {
        &self.zero_temperature_cross_section
    }

    /// Kinematically allowed α range for energy transfer β at energy E
    pub fn alpha_limits(&self, beta: f64, energy: f64) -> Option<(f64, f64)> {
        let reduced_energy = energy / self.temperature;
        if reduced_energy + beta < 0.0 {
            return None;
        }
        let incoming = reduced_energy.sqrt();
        let outgoing = (reduced_energy + beta).sqrt();
        Some((
            (incoming - outgoing).powi(2) / self.atomic_weight_ratio,
            (incoming + outgoing).powi(2) / self.atomic_weight_ratio,
        ))
    }

    /// S(α,β) integrand at CM cosine `mu`.
    ///
    /// Returns `f64::MAX` at the α = 0, μ = 1 pole.
    pub fn evaluate_integrand(&self, alpha: f64, beta: f64, energy: f64, mu: f64) -> f64 {
        if alpha == 0.0 && mu >= 1.0 {
            return f64::MAX;
        }
        self.kernel(alpha, beta, energy, 1.0 - mu, 0.0)
    }

    /// Integrand in `u = 1 - μ`, multiplied by `exp(log_scale)`
    pub(crate) fn kernel(&self, alpha: f64, beta: f64, energy: f64, u: f64, log_scale: f64) -> f64 {
        if alpha <= 0.0 || u <= 0.0 {
            return 0.0;
        }
        let a = self.atomic_weight_ratio;
        let reduced_energy = energy / self.temperature;
        let y = (4.0 * a * alpha * reduced_energy - (a * alpha - beta).powi(2)).max(0.0);
        let t = (2.0 - u) / u;
        let bessel_argument = 0.5 * (1.0 + a) * (y * t).sqrt();

        // exp(-|z|) is folded into the scaled Bessel function
        let exponent = -(alpha * (1.0 - a * a) / 4.0 + beta * (1.0 + a) / 2.0 + a * reduced_energy)
            - (1.0 + a).powi(2) * alpha * t / 4.0
            + bessel_argument
            + log_scale;
        if exponent < LOG_MIN_POSITIVE {
            return 0.0;
        }

        let relative_energy =
            ((a + 1.0).powi(2) * alpha * self.temperature / (2.0 * a * u)).max(RELATIVE_ENERGY_FLOOR);
        let sigma = self.zero_temperature_cross_section.evaluate(relative_energy);
        let angular = self.angular_distribution.evaluate_pdf(relative_energy, 1.0 - u);

        0.5 * PI * alpha.sqrt() * sigma * angular / (u * u) * exponent.exp() * bessel_i0_scaled(bessel_argument)
    }

    /// Integral of the kernel over the CM cosine, restricted to its support
    pub fn integrate_over_mu(
        &self,
        alpha: f64,
        beta: f64,
        energy: f64,
        log_scale: f64,
    ) -> Result<f64, IntegrationError> {
        if alpha <= 0.0 {
            return Ok(0.0);
        }
        let a = self.atomic_weight_ratio;
        let reduced_energy = energy / self.temperature;
        let y = (4.0 * a * alpha * reduced_energy - (a * alpha - beta).powi(2)).max(0.0);
        let peak_t = y / ((1.0 + a).powi(2) * alpha * alpha);
        let peak = 2.0 / (peak_t + 1.0);

        let mut integrand = |u: f64| self.kernel(alpha, beta, energy, u, log_scale);
        let (lower, upper) = support_limits(&mut integrand, peak);
        if upper <= lower {
            return Ok(0.0);
        }
        Ok(self
            .mu_integrator
            .integrate_adaptively::<Gk15, _>(integrand, lower, upper)?
            .value)
    }

    /// Numerical double integral over μ and α.
    ///
    /// The first inner failure aborts the outer integral.
    pub fn integrate_numerically(&self, beta: f64, energy: f64, log_scale: f64) -> Result<f64, IntegrationError> {
        let (alpha_min, alpha_max) = match self.alpha_limits(beta, energy) {
            Some(limits) => limits,
            None => return Ok(0.0),
        };
        if alpha_max <= alpha_min {
            return Ok(0.0);
        }

        let mut inner_failure = None;
        let estimate = self.alpha_integrator.integrate_adaptively::<Gk15, _>(
            |alpha| match self.integrate_over_mu(alpha, beta, energy, log_scale) {
                Ok(value) => value,
                Err(err) => {
                    let partial = err.partial_estimate().map(|(value, _)| value).unwrap_or(0.0);
                    inner_failure.get_or_insert(err);
                    partial
                }
            },
            alpha_min,
            alpha_max,
        );
        if let Some(err) = inner_failure {
            return Err(err);
        }
        Ok(estimate?.value)
    }

    /// Closed form of the integral for a constant cross section σ0(E)
    pub fn closed_form_integral(&self, beta: f64, energy: f64, log_scale: f64) -> f64 {
        let (alpha_min, alpha_max) = match self.alpha_limits(beta, energy) {
            Some(limits) => limits,
            None => return 0.0,
        };
        let lower = alpha_min.sqrt().max(1e-300);
        let upper = alpha_max.sqrt();
        let g = |root_alpha: f64| 0.5 * root_alpha + beta / (2.0 * root_alpha);
        let h = |root_alpha: f64| 0.5 * root_alpha - beta / (2.0 * root_alpha);

        let difference = 0.5
            * (erf_difference(g(upper), g(lower)) * guarded_exp(log_scale)
                + guarded_exp(log_scale - beta) * erf_difference(h(upper), h(lower)));
        let sigma = self.zero_temperature_cross_section.evaluate(energy);
        sigma * PI.powf(1.5) / (self.atomic_weight_ratio + 1.0).powi(2) * difference
    }

    /// S(α,β) integrated over α, scaled by `exp(log_scale)`.
    ///
    /// Quadrature failures fall back to the closed form.
    pub fn integrated_s_alpha_beta(&self, beta: f64, energy: f64, log_scale: f64) -> f64 {
        match self.integrate_numerically(beta, energy, log_scale) {
            Ok(value) => value,
            Err(err) => {
                log::warn!(
                    "free gas S(alpha,beta) quadrature failed at beta={}, E={} MeV ({}); using the closed form",
                    beta,
                    energy,
                    err
                );
                self.closed_form_integral(beta, energy, log_scale)
            }
        }
    }
}

fn guarded_exp(exponent: f64) -> f64 {
    if exponent < LOG_MIN_POSITIVE {
        0.0
    } else {
        exponent.min(f64::MAX.ln()).exp()
    }
}

/// Bisect outward from `peak` to where the integrand drops below
/// `f(peak) * ε` on each side of [0, 2].
fn support_limits<F: FnMut(f64) -> f64>(integrand: &mut F, peak: f64) -> (f64, f64) {
    let peak_value = integrand(peak);
    if !(peak_value > 0.0) {
        return (0.0, 2.0);
    }
    let threshold = peak_value * f64::EPSILON;

    let mut search = |mut inner: f64, mut outer: f64| {
        if integrand(outer) > threshold {
            return outer;
        }
        for _ in 0..MAX_BISECTIONS {
            let middle = 0.5 * (inner + outer);
            if middle == inner || middle == outer {
                break;
            }
            if integrand(middle) > threshold {
                inner = middle;
            } else {
                outer = middle;
            }
            if (outer - inner).abs() <= f64::EPSILON * inner.abs().max(outer.abs()) {
                break;
            }
        }
        outer
    };
    let lower = search(peak, 0.0);
    let upper = search(peak, 2.0);
    (lower, upper)
}
