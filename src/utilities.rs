// Grid search, interpolation and special functions shared by the physics modules

use std::f64::consts::PI;

/// Index of the lower bin boundary bracketing `x`: the largest `i` with
/// `grid[i] <= x`, clamped so that `i + 1` is always a valid index.
///
/// `grid` must be ascending with at least two points and `x` inside
/// `[grid[0], grid[last]]`.
#[inline]
pub fn lower_bin_index(grid: &[f64], x: f64) -> usize {
    lower_bin_index_in_range(grid, x, 0, grid.len() - 1)
}

/// Binary search restricted to `grid[low..=high]`
#[inline]
pub fn lower_bin_index_in_range(grid: &[f64], x: f64, mut low: usize, mut high: usize) -> usize {
    // invariant: grid[low] <= x and (x < grid[high] or high is the last point)
    while high - low > 1 {
        let mid = (low + high) >> 1;
        if grid[mid] <= x {
            low = mid;
        } else {
            high = mid;
        }
    }
    low
}

/// Linear-linear interpolation between (x0, y0) and (x1, y1)
#[inline]
pub fn interpolate_lin_lin(x0: f64, x1: f64, y0: f64, y1: f64, x: f64) -> f64 {
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Linear interpolation over tabulated data, clamped to the end values
/// outside the grid.
pub fn interpolate_linear(x: &[f64], y: &[f64], x_new: f64) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    if x.len() == 1 || x_new <= x[0] {
        return y[0];
    }
    if x_new >= x[x.len() - 1] {
        return y[y.len() - 1];
    }

    let idx = lower_bin_index(x, x_new);
    interpolate_lin_lin(x[idx], x[idx + 1], y[idx], y[idx + 1], x_new)
}

/// Log-log interpolation over tabulated data, clamped to the end values.
/// All x and y values must be positive.
pub fn interpolate_log_log(x: &[f64], y: &[f64], x_new: f64) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    if x.len() == 1 || x_new <= x[0] {
        return y[0];
    }
    if x_new >= x[x.len() - 1] {
        return y[y.len() - 1];
    }

    let idx = lower_bin_index(x, x_new);
    let log_y = interpolate_lin_lin(
        x[idx].ln(),
        x[idx + 1].ln(),
        y[idx].ln(),
        y[idx + 1].ln(),
        x_new.ln(),
    );
    log_y.exp()
}

/// True if every element is strictly greater than the previous one
pub fn is_strictly_ascending(values: &[f64]) -> bool {
    values.windows(2).all(|pair| pair[0] < pair[1])
}

/// erf(upper) - erf(lower) without cancellation when both arguments sit in
/// the same tail.
pub fn erf_difference(upper: f64, lower: f64) -> f64 {
    if lower > 0.0 && upper > 0.0 {
        libm::erfc(lower) - libm::erfc(upper)
    } else if lower < 0.0 && upper < 0.0 {
        libm::erfc(-upper) - libm::erfc(-lower)
    } else {
        libm::erf(upper) - libm::erf(lower)
    }
}

/// Exponentially scaled modified Bessel function of the first kind of order
/// zero: `I0(x) * exp(-|x|)`.
pub fn bessel_i0_scaled(x: f64) -> f64 {
    let x = x.abs();
    if x <= 15.0 {
        // I0(x) = sum ((x/2)^2)^k / (k!)^2
        let quarter_x2 = 0.25 * x * x;
        let mut term = 1.0;
        let mut sum = 1.0;
        for k in 1..500 {
            let kf = k as f64;
            term *= quarter_x2 / (kf * kf);
            sum += term;
            if term < 1e-17 * sum {
                break;
            }
        }
        sum * (-x).exp()
    } else {
        // Large argument expansion: 1/sqrt(2 pi x) sum prod (2j-1)^2 / (8 j x)
        let mut term = 1.0;
        let mut sum = 1.0;
        for k in 1..30 {
            let kf = k as f64;
            let next = term * (2.0 * kf - 1.0).powi(2) / (8.0 * kf * x);
            if next.abs() >= term.abs() {
                break;
            }
            term = next;
            sum += term;
            if term < 1e-17 * sum {
                break;
            }
        }
        sum / (2.0 * PI * x).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lower_bin_index() {
        let grid = [1.0, 2.0, 4.0, 8.0];
        assert_eq!(lower_bin_index(&grid, 1.0), 0);
        assert_eq!(lower_bin_index(&grid, 3.9), 1);
        assert_eq!(lower_bin_index(&grid, 4.0), 2);
        // last point maps to the final bin
        assert_eq!(lower_bin_index(&grid, 8.0), 2);
    }

    #[test]
    fn test_interpolate_linear() {
        let x = [0.5, 1.0, 2.0, 5.0];
        let y = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(interpolate_linear(&x, &y, 0.1), 1.0);
        assert_eq!(interpolate_linear(&x, &y, 1.0), 2.0);
        assert_eq!(interpolate_linear(&x, &y, 1.5), 2.5);
        assert_eq!(interpolate_linear(&x, &y, 10.0), 4.0);
    }

    #[test]
    fn test_interpolate_log_log_power_law() {
        let x = [1.0, 10.0, 100.0];
        let y = [1.0, 100.0, 10000.0];
        assert_relative_eq!(interpolate_log_log(&x, &y, 3.0), 9.0, max_relative = 1e-12);
    }

    #[test]
    fn test_erf_difference_across_zero() {
        assert_eq!(erf_difference(0.0, 0.0), 0.0);
        // erf(1) - erf(-0.5)
        assert_relative_eq!(
            erf_difference(1.0, -0.5),
            0.8427007929497149 + 0.5204998778130465,
            max_relative = 1e-13
        );
    }

    #[test]
    fn test_erf_difference_in_tail() {
        let difference = erf_difference(6.0, 5.0);
        // erfc(5) - erfc(6)
        assert_relative_eq!(difference, 1.5374597944280349e-12 - 2.1519736712498913e-17, max_relative = 1e-10);
        assert_relative_eq!(erf_difference(-5.0, -6.0), difference, max_relative = 1e-12);
    }

    #[test]
    fn test_bessel_i0_scaled() {
        assert_eq!(bessel_i0_scaled(0.0), 1.0);
        // I0(1) = 1.2660658777520082
        assert_relative_eq!(bessel_i0_scaled(1.0), 1.2660658777520082 * (-1.0f64).exp(), max_relative = 1e-13);
        // continuity across the branch switch
        let below = bessel_i0_scaled(15.0);
        let above = bessel_i0_scaled(15.0 + 1e-9);
        assert_relative_eq!(below, above, max_relative = 1e-9);
        // I0e(100) = 0.03994437929909668
        assert_relative_eq!(bessel_i0_scaled(100.0), 0.03994437929909668, max_relative = 1e-12);
    }
}
