// Collision kinematics for Monte Carlo transport
//
// Energies are in MeV and temperatures are kT in MeV. Velocities are in
// units where the neutron mass is 1, so speed = sqrt(E).

use nalgebra::Vector3;
use rand::{Rng, RngCore};
use std::f64::consts::PI;

/// Rotate `u_old` to a new direction with cosine `mu` relative to it and
/// azimuth `phi` about it
pub fn rotate_direction_3d(u_old: &Vector3<f64>, mu: f64, phi: f64) -> Vector3<f64> {
    let mu = mu.clamp(-1.0, 1.0);
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();

    let perp = if u_old.x.abs() < 0.99 {
        Vector3::new(1.0, 0.0, 0.0).cross(u_old).normalize()
    } else {
        Vector3::new(0.0, 1.0, 0.0).cross(u_old).normalize()
    };
    let ortho = u_old.cross(&perp);

    mu * u_old + sin_theta * phi.cos() * perp + sin_theta * phi.sin() * ortho
}

/// Rotate by `mu` about a uniformly sampled azimuth (one random number)
pub fn rotate_angle(u: Vector3<f64>, mu: f64, rng: &mut dyn RngCore) -> Vector3<f64> {
    let phi = 2.0 * PI * rng.gen::<f64>();
    rotate_direction_3d(&u, mu, phi)
}

/// Isotropic unit vector (two random numbers)
pub fn sample_isotropic_direction(rng: &mut dyn RngCore) -> [f64; 3] {
    let mu = 2.0 * rng.gen::<f64>() - 1.0;
    let phi = 2.0 * PI * rng.gen::<f64>();
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();
    [sin_theta * phi.cos(), sin_theta * phi.sin(), mu]
}

/// Outgoing lab energy and cosine of a two-body collision with a target at
/// rest, given the CM outgoing energy and CM cosine.
pub fn center_of_mass_to_lab(
    incoming_energy: f64,
    outgoing_energy_cm: f64,
    mu_cm: f64,
    awr: f64,
) -> (f64, f64) {
    let a_plus_1 = awr + 1.0;
    let energy_lab = outgoing_energy_cm
        + (incoming_energy + 2.0 * mu_cm * a_plus_1 * (incoming_energy * outgoing_energy_cm).sqrt())
            / (a_plus_1 * a_plus_1);
    if energy_lab <= 0.0 {
        return (0.0, mu_cm);
    }
    let mu_lab = mu_cm * (outgoing_energy_cm / energy_lab).sqrt()
        + (incoming_energy / energy_lab).sqrt() / a_plus_1;
    (energy_lab, mu_lab.clamp(-1.0, 1.0))
}

/// Elastic scattering off a target at rest: outgoing lab energy and cosine
pub fn elastic_target_at_rest(incoming_energy: f64, mu_cm: f64, awr: f64) -> (f64, f64) {
    let denominator = awr * awr + 2.0 * awr * mu_cm + 1.0;
    let energy = incoming_energy * denominator / ((awr + 1.0) * (awr + 1.0));
    let mu_lab = if denominator > 0.0 {
        (1.0 + awr * mu_cm) / denominator.sqrt()
    } else {
        mu_cm
    };
    (energy, mu_lab.clamp(-1.0, 1.0))
}

/// Sample target velocity using the constant cross section free-gas model.
///
/// The Maxwellian target speed distribution is weighted by the relative speed
/// through rejection sampling.
pub fn sample_cxs_target_velocity(
    awr: f64,
    neutron_energy: f64,
    neutron_direction: &Vector3<f64>,
    kt: f64,
    rng: &mut dyn RngCore,
) -> Vector3<f64> {
    let beta_vn = (awr * neutron_energy / kt).sqrt();
    let alpha = 1.0 / (1.0 + PI.sqrt() * beta_vn / 2.0);

    let (beta_vt_sq, mu) = loop {
        let r1: f64 = rng.gen();
        let r2: f64 = rng.gen();

        let candidate = if rng.gen::<f64>() < alpha {
            // p(y) = y e^-y
            -(r1.ln() + r2.ln())
        } else {
            // p(y) = y^2 e^-y^2
            let c = (PI / 2.0 * rng.gen::<f64>()).cos();
            -r1.ln() - r2.ln() * c * c
        };

        let beta_vt = candidate.sqrt();
        let mu_candidate = 2.0 * rng.gen::<f64>() - 1.0;

        let accept_prob = (beta_vn * beta_vn + candidate - 2.0 * beta_vn * beta_vt * mu_candidate)
            .max(0.0)
            .sqrt()
            / (beta_vn + beta_vt);

        if rng.gen::<f64>() < accept_prob {
            break (candidate, mu_candidate);
        }
    };

    let vt = (beta_vt_sq * kt / awr).sqrt();
    let phi = 2.0 * PI * rng.gen::<f64>();
    vt * rotate_direction_3d(neutron_direction, mu, phi)
}

/// Elastic scattering from a free-gas target with CM cosine `mu_cm`.
///
/// Returns the outgoing lab energy and unit direction.
pub fn free_gas_elastic_scatter(
    energy: f64,
    direction: &Vector3<f64>,
    mu_cm: f64,
    awr: f64,
    kt: f64,
    rng: &mut dyn RngCore,
) -> (f64, Vector3<f64>) {
    let v_n = direction * energy.sqrt();
    let v_t = sample_cxs_target_velocity(awr, energy, direction, kt, rng);

    let v_cm = (v_n + awr * v_t) / (awr + 1.0);
    let v_n_cm = v_n - v_cm;
    let speed_cm = v_n_cm.norm();

    if speed_cm < 1e-30 {
        return (energy, *direction);
    }

    let u_cm = v_n_cm / speed_cm;
    let v_out = speed_cm * rotate_angle(u_cm, mu_cm, rng) + v_cm;

    let outgoing_energy = v_out.dot(&v_out);
    let speed = outgoing_energy.sqrt();
    if speed > 0.0 {
        (outgoing_energy, v_out / speed)
    } else {
        (outgoing_energy, *direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rotate_angle_preserves_norm() {
        let mut rng = StdRng::seed_from_u64(42);
        let u = Vector3::new(0.0, 0.0, 1.0);
        let v = rotate_angle(u, 0.5, &mut rng);
        assert!((v.norm() - 1.0).abs() < 1e-12, "norm = {}", v.norm());
        assert!((v.z - 0.5).abs() < 1e-12, "z = {}", v.z);
    }

    #[test]
    fn test_elastic_target_at_rest_limits() {
        // forward scattering keeps all the energy
        let (e, mu) = elastic_target_at_rest(2.0, 1.0, 12.0);
        assert_relative_eq!(e, 2.0, max_relative = 1e-14);
        assert_relative_eq!(mu, 1.0, max_relative = 1e-14);

        // backscatter loses the maximum fraction ((A-1)/(A+1))^2
        let (e, _) = elastic_target_at_rest(2.0, -1.0, 12.0);
        assert_relative_eq!(e, 2.0 * (11.0f64 / 13.0).powi(2), max_relative = 1e-14);
    }

    #[test]
    fn test_center_of_mass_to_lab_matches_elastic() {
        let awr = 55.8;
        let energy = 1.5;
        let mu_cm = 0.3;
        // elastic CM outgoing energy is E A^2/(A+1)^2
        let e_cm = energy * awr * awr / ((awr + 1.0) * (awr + 1.0));
        let (e_lab, mu_lab) = center_of_mass_to_lab(energy, e_cm, mu_cm, awr);
        let (e_ref, mu_ref) = elastic_target_at_rest(energy, mu_cm, awr);
        assert_relative_eq!(e_lab, e_ref, max_relative = 1e-12);
        assert_relative_eq!(mu_lab, mu_ref, max_relative = 1e-12);
    }

    #[test]
    fn test_free_gas_scatter_energy_and_direction() {
        let mut rng = StdRng::seed_from_u64(123);
        let direction = Vector3::new(0.0, 0.0, 1.0);
        let kt = 2.53e-8;
        let (energy, out) = free_gas_elastic_scatter(1e-7, &direction, 0.1, 1.0, kt, &mut rng);
        assert!(energy > 0.0);
        assert!((out.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_thermal_neutrons_gain_energy_on_average() {
        // A neutron well below kT should on average be up-scattered by a light gas
        let mut rng = StdRng::seed_from_u64(42);
        let direction = Vector3::new(1.0, 0.0, 0.0);
        let kt = 2.53e-8;
        let incoming = 1e-10;
        let n = 2000;
        let mean: f64 = (0..n)
            .map(|_| {
                let mu = 2.0 * rng.gen::<f64>() - 1.0;
                free_gas_elastic_scatter(incoming, &direction, mu, 1.0, kt, &mut rng).0
            })
            .sum::<f64>()
            / n as f64;
        assert!(mean > incoming);
    }
}
