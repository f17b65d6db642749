// Adaptive Gauss-Kronrod quadrature
//
// QAG-style adaptive bisection: the subinterval with the largest error
// estimate is bisected until the summed error meets the tolerance. The
// multi-segment variant seeds the queue with one bin per breakpoint segment.

use crate::error::IntegrationError;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A Gauss-Kronrod quadrature set.
///
/// `ABSCISSAE` holds the non-negative Kronrod abscissae in descending order
/// with the centre point (0.0) last; Gauss nodes sit at the odd positions.
pub trait KronrodRule {
    const POINTS: usize;
    const GAUSS_WEIGHTS: &'static [f64];
    const KRONROD_WEIGHTS: &'static [f64];
    const ABSCISSAE: &'static [f64];
}

/// 7-point Gauss rule embedded in a 15-point Kronrod rule
#[derive(Debug, Clone, Copy)]
pub struct Gk15;

impl KronrodRule for Gk15 {
    const POINTS: usize = 15;
    const GAUSS_WEIGHTS: &'static [f64] = &[
        0.129484966168869693270611432679082,
        0.279705391489276667901467771423780,
        0.381830050505118944950369775488975,
        0.417959183673469387755102040816327,
    ];
    const KRONROD_WEIGHTS: &'static [f64] = &[
        0.022935322010529224963732008058970,
        0.063092092629978553290700663189204,
        0.104790010322250183839876322541518,
        0.140653259715525918745189590510238,
        0.169004726639267902826583426598550,
        0.190350578064785409913256402421014,
        0.204432940075298892414161999234649,
        0.209482141084727828012999174891714,
    ];
    const ABSCISSAE: &'static [f64] = &[
        0.991455371120812639206854697526329,
        0.949107912342758524526189684047851,
        0.864864423359769072789712788640926,
        0.741531185599394439863864773280788,
        0.586087235467691130294144838258730,
        0.405845151377397166906606412076961,
        0.207784955007898467600689403773245,
        0.000000000000000000000000000000000,
    ];
}

/// 10-point Gauss rule embedded in a 21-point Kronrod rule
#[derive(Debug, Clone, Copy)]
pub struct Gk21;

impl KronrodRule for Gk21 {
    const POINTS: usize = 21;
    const GAUSS_WEIGHTS: &'static [f64] = &[
        0.066671344308688137593568809893332,
        0.149451349150580593145776339657697,
        0.219086362515982043995534934228163,
        0.269266719309996355091226921569469,
        0.295524224714752870173892994651338,
    ];
    const KRONROD_WEIGHTS: &'static [f64] = &[
        0.011694638867371874278064396062192,
        0.032558162307964727478818972459390,
        0.054755896574351996031381300244580,
        0.075039674810919952767043140916190,
        0.093125454583697605535065465083366,
        0.109387158802297641899210590325805,
        0.123491976262065851077958109831074,
        0.134709217311473325928054001771707,
        0.142775938577060080797094273138717,
        0.147739104901338491374841515972068,
        0.149445554002916905664936468389821,
    ];
    const ABSCISSAE: &'static [f64] = &[
        0.995657163025808080735527280689003,
        0.973906528517171720077964012084452,
        0.930157491355708226001207180059508,
        0.865063366688984510732096688423493,
        0.780817726586416897063717578345042,
        0.679409568299024406234327365114874,
        0.562757134668604683339000099272694,
        0.433395394129247190799265943165784,
        0.294392862701460198131126603103866,
        0.148874338981631210884826001129720,
        0.000000000000000000000000000000000,
    ];
}

/// Output of a single application of a point rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleEstimate {
    pub result: f64,
    pub absolute_error: f64,
    /// Integral of |f|
    pub result_abs: f64,
    /// Integral of |f - mean(f)|
    pub result_asc: f64,
}

/// Converged integral and its error bound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegralEstimate {
    pub value: f64,
    pub absolute_error: f64,
}

#[derive(Debug, Clone, Copy)]
struct Bin {
    lower: f64,
    upper: f64,
    result: f64,
    error: f64,
}

impl PartialEq for Bin {
    fn eq(&self, other: &Self) -> bool {
        self.error.total_cmp(&other.error) == Ordering::Equal
    }
}

impl Eq for Bin {}

impl PartialOrd for Bin {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Bin {
    fn cmp(&self, other: &Self) -> Ordering {
        self.error.total_cmp(&other.error)
    }
}

/// Adaptive Gauss-Kronrod integrator with relative/absolute tolerances and a
/// subinterval limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussKronrodIntegrator {
    relative_error_tol: f64,
    absolute_error_tol: f64,
    subinterval_limit: usize,
}

impl Default for GaussKronrodIntegrator {
    fn default() -> Self {
        GaussKronrodIntegrator {
            relative_error_tol: 1e-8,
            absolute_error_tol: 0.0,
            subinterval_limit: 1000,
        }
    }
}

impl GaussKronrodIntegrator {
    pub fn new(
        relative_error_tol: f64,
        absolute_error_tol: f64,
        subinterval_limit: usize,
    ) -> Result<Self, IntegrationError> {
        if !(relative_error_tol >= 0.0) || !(absolute_error_tol >= 0.0) {
            return Err(IntegrationError::UnachievableTolerance {
                relative: relative_error_tol,
                absolute: absolute_error_tol,
            });
        }
        if subinterval_limit == 0 {
            return Err(IntegrationError::InvalidSubintervalLimit);
        }
        if absolute_error_tol <= 0.0 && relative_error_tol < 50.0 * f64::EPSILON {
            return Err(IntegrationError::UnachievableTolerance {
                relative: relative_error_tol,
                absolute: absolute_error_tol,
            });
        }

        Ok(GaussKronrodIntegrator {
            relative_error_tol,
            absolute_error_tol,
            subinterval_limit,
        })
    }

    pub fn relative_error_tol(&self) -> f64 {
        self.relative_error_tol
    }

    pub fn absolute_error_tol(&self) -> f64 {
        self.absolute_error_tol
    }

    pub fn subinterval_limit(&self) -> usize {
        self.subinterval_limit
    }

    /// Apply rule `R` once over [lower, upper].
    ///
    /// A zero-width interval integrates to exactly zero with zero error.
    pub fn integrate_with_point_rule<R, F>(
        &self,
        integrand: &mut F,
        lower: f64,
        upper: f64,
    ) -> Result<RuleEstimate, IntegrationError>
    where
        R: KronrodRule,
        F: FnMut(f64) -> f64,
    {
        if lower == upper {
            return Ok(RuleEstimate {
                result: 0.0,
                absolute_error: 0.0,
                result_abs: 0.0,
                result_asc: 0.0,
            });
        }
        if !(lower < upper) {
            return Err(IntegrationError::InvalidLimits { lower, upper });
        }

        let midpoint = 0.5 * (upper + lower);
        let half_length = 0.5 * (upper - lower);
        let abs_half_length = half_length.abs();

        let number_of_weights = R::KRONROD_WEIGHTS.len();
        let mut values_lower = vec![0.0; number_of_weights];
        let mut values_upper = vec![0.0; number_of_weights];
        let mut values_sum = vec![0.0; number_of_weights];

        let mut kronrod_result = 0.0;
        let mut result_abs = 0.0;
        for j in 0..number_of_weights - 1 {
            let weighted_abscissa = half_length * R::ABSCISSAE[j];
            values_lower[j] = integrand(midpoint - weighted_abscissa);
            values_upper[j] = integrand(midpoint + weighted_abscissa);
            values_sum[j] = values_lower[j] + values_upper[j];

            kronrod_result += R::KRONROD_WEIGHTS[j] * values_sum[j];
            result_abs += R::KRONROD_WEIGHTS[j] * (values_lower[j].abs() + values_upper[j].abs());
        }

        let centre_value = integrand(midpoint);
        let centre_contribution = centre_value * R::KRONROD_WEIGHTS[number_of_weights - 1];
        kronrod_result += centre_contribution;
        result_abs += centre_contribution.abs();

        let result = kronrod_result * half_length;
        result_abs *= abs_half_length;

        let mean = 0.5 * kronrod_result;
        let mut result_asc = 0.0;
        for j in 0..number_of_weights - 1 {
            result_asc += R::KRONROD_WEIGHTS[j]
                * ((values_lower[j] - mean).abs() + (values_upper[j] - mean).abs());
        }
        result_asc += R::KRONROD_WEIGHTS[number_of_weights - 1] * (centre_value - mean).abs();
        result_asc *= abs_half_length;

        let mut gauss_result = 0.0;
        for j in 0..(number_of_weights - 1) / 2 {
            gauss_result += values_sum[2 * j + 1] * R::GAUSS_WEIGHTS[j];
        }
        if number_of_weights % 2 == 0 {
            gauss_result += centre_value * R::GAUSS_WEIGHTS[number_of_weights / 2 - 1];
        }

        let raw_error = ((kronrod_result - gauss_result) * half_length).abs();

        Ok(RuleEstimate {
            result,
            absolute_error: rescale_absolute_error(raw_error, result_abs, result_asc),
            result_abs,
            result_asc,
        })
    }

    /// Integrate over [lower, upper] adaptively with rule `R`
    pub fn integrate_adaptively<R, F>(
        &self,
        mut integrand: F,
        lower: f64,
        upper: f64,
    ) -> Result<IntegralEstimate, IntegrationError>
    where
        R: KronrodRule,
        F: FnMut(f64) -> f64,
    {
        let first = self.integrate_with_point_rule::<R, F>(&mut integrand, lower, upper)?;
        if !first.result.is_finite() {
            return Err(IntegrationError::NonFiniteResult { result: first.result });
        }

        let tolerance = self.tolerance(first.result);
        let round_off = 50.0 * f64::EPSILON * first.result_abs;

        if first.absolute_error <= round_off && first.absolute_error > tolerance {
            return Err(IntegrationError::RoundoffOnFirstAttempt {
                result: first.result,
                error: first.absolute_error,
            });
        }
        if (first.absolute_error <= tolerance && first.absolute_error != first.result_asc)
            || first.absolute_error == 0.0
        {
            return Ok(IntegralEstimate {
                value: first.result,
                absolute_error: first.absolute_error,
            });
        }
        if self.subinterval_limit == 1 {
            return Err(IntegrationError::SingleSubintervalInsufficient {
                result: first.result,
                error: first.absolute_error,
            });
        }

        let mut queue = BinaryHeap::with_capacity(self.subinterval_limit);
        queue.push(Bin {
            lower,
            upper,
            result: first.result,
            error: first.absolute_error,
        });

        self.refine::<R, F>(&mut integrand, queue, first.result, first.absolute_error, 1)
    }

    /// Integrate over consecutive segments of `points` (ascending) with one
    /// shared error queue, so effort goes where the error is largest across
    /// all segments.
    pub fn integrate_adaptively_over_points<R, F>(
        &self,
        mut integrand: F,
        points: &[f64],
    ) -> Result<IntegralEstimate, IntegrationError>
    where
        R: KronrodRule,
        F: FnMut(f64) -> f64,
    {
        if points.len() < 2 {
            return Err(IntegrationError::InvalidLimits {
                lower: points.first().copied().unwrap_or(f64::NAN),
                upper: f64::NAN,
            });
        }
        if points.len() > self.subinterval_limit {
            return Err(IntegrationError::InvalidSubintervalLimit);
        }

        let mut queue = BinaryHeap::with_capacity(self.subinterval_limit);
        let mut area = 0.0;
        let mut total_error = 0.0;
        let mut total_abs = 0.0;
        for segment in points.windows(2) {
            let estimate =
                self.integrate_with_point_rule::<R, F>(&mut integrand, segment[0], segment[1])?;
            area += estimate.result;
            total_error += estimate.absolute_error;
            total_abs += estimate.result_abs;
            queue.push(Bin {
                lower: segment[0],
                upper: segment[1],
                result: estimate.result,
                error: estimate.absolute_error,
            });
        }
        if !area.is_finite() {
            return Err(IntegrationError::NonFiniteResult { result: area });
        }

        let tolerance = self.tolerance(area);
        if total_error <= 100.0 * f64::EPSILON * total_abs && total_error > tolerance {
            return Err(IntegrationError::RoundoffOnFirstAttempt {
                result: area,
                error: total_error,
            });
        }
        if total_error <= tolerance {
            return Ok(IntegralEstimate {
                value: area,
                absolute_error: total_error,
            });
        }

        let segments = queue.len();
        self.refine::<R, F>(&mut integrand, queue, area, total_error, segments)
    }

    fn tolerance(&self, area: f64) -> f64 {
        self.absolute_error_tol.max(self.relative_error_tol * area.abs())
    }

    fn refine<R, F>(
        &self,
        integrand: &mut F,
        mut queue: BinaryHeap<Bin>,
        mut area: f64,
        mut absolute_error: f64,
        initial_bins: usize,
    ) -> Result<IntegralEstimate, IntegrationError>
    where
        R: KronrodRule,
        F: FnMut(f64) -> f64,
    {
        let mut round_off_1 = 0usize;
        let mut round_off_2 = 0usize;

        for last in initial_bins..self.subinterval_limit {
            let bin = match queue.pop() {
                Some(bin) => bin,
                None => break,
            };

            let midpoint = 0.5 * (bin.lower + bin.upper);
            let first = self.integrate_with_point_rule::<R, F>(integrand, bin.lower, midpoint)?;
            let second = self.integrate_with_point_rule::<R, F>(integrand, midpoint, bin.upper)?;

            let area_12 = first.result + second.result;
            let error_12 = first.absolute_error + second.absolute_error;

            absolute_error += error_12 - bin.error;
            area += area_12 - bin.result;

            if first.result_asc != first.absolute_error && second.result_asc != second.absolute_error {
                let delta = bin.result - area_12;
                if delta.abs() <= 1e-5 * area_12.abs() && error_12 >= 0.99 * bin.error {
                    round_off_1 += 1;
                }
                if last + 1 >= 10 && error_12 > bin.error {
                    round_off_2 += 1;
                }
            }

            queue.push(Bin {
                lower: bin.lower,
                upper: midpoint,
                result: first.result,
                error: first.absolute_error,
            });
            queue.push(Bin {
                lower: midpoint,
                upper: bin.upper,
                result: second.result,
                error: second.absolute_error,
            });

            if !area.is_finite() {
                return Err(IntegrationError::NonFiniteResult { result: area });
            }
            if round_off_1 >= 6 || round_off_2 >= 20 {
                return Err(IntegrationError::RoundoffStagnation {
                    result: area,
                    error: absolute_error,
                });
            }

            if absolute_error <= self.tolerance(area) {
                return Ok(IntegralEstimate {
                    value: area,
                    absolute_error,
                });
            }

            if last + 1 == self.subinterval_limit {
                return Err(IntegrationError::SubintervalLimitReached {
                    limit: self.subinterval_limit,
                    result: area,
                    error: absolute_error,
                });
            }
            if subinterval_too_small::<R>(bin.lower, midpoint, bin.upper) {
                return Err(IntegrationError::SubintervalTooSmall {
                    lower: bin.lower,
                    upper: bin.upper,
                    result: area,
                    error: absolute_error,
                });
            }
        }

        Err(IntegrationError::SubintervalLimitReached {
            limit: self.subinterval_limit,
            result: area,
            error: absolute_error,
        })
    }
}

/// Shrink the raw Kronrod-Gauss difference when it is small compared with the
/// local variation of the integrand, and floor it at the round-off level.
fn rescale_absolute_error(absolute_error: f64, result_abs: f64, result_asc: f64) -> f64 {
    let mut error = absolute_error;

    if result_asc != 0.0 && error != 0.0 {
        let scale = 200.0 * error / result_asc;
        error = if scale < 1.0 {
            result_asc * scale.powf(1.5)
        } else {
            result_asc
        };
    }

    if result_abs > f64::MIN_POSITIVE / (50.0 * f64::EPSILON) {
        let min_error = 50.0 * f64::EPSILON * result_abs;
        if min_error > error {
            error = min_error;
        }
    }

    error
}

fn subinterval_too_small<R: KronrodRule>(lower_1: f64, lower_2: f64, upper_2: f64) -> bool {
    let c = (R::POINTS / 10) as f64;
    let max = lower_1.abs().max(upper_2.abs());
    let epsilon = 1000.0 * c * f64::EPSILON;
    let min = 10000.0 * f64::MIN_POSITIVE;

    max <= (1.0 + epsilon) * (lower_2.abs() + min)
}
