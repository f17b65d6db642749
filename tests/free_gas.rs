// Adjoint free-gas elastic scattering on a hydrogen target at room temperature

use approx::assert_relative_eq;
use mc_collision::{
    AdjointFreeGasElasticCrossSectionGenerator, AdjointFreeGasMarginalBetaFunction, FreeGasElasticSAlphaBetaFunction,
    FreeGasEnergyTable, GaussKronrodIntegrator, Gk15, TabularDistribution, UnivariateDistribution,
};
use std::sync::Arc;

const HYDROGEN_AWR: f64 = 0.999167;
const ROOM_TEMPERATURE: f64 = 2.53010e-8;

fn constant_hydrogen() -> Arc<FreeGasElasticSAlphaBetaFunction> {
    let sigma = UnivariateDistribution::constant(20.0, 1e-11, 20.0).unwrap();
    Arc::new(FreeGasElasticSAlphaBetaFunction::isotropic(sigma, HYDROGEN_AWR, ROOM_TEMPERATURE).unwrap())
}

#[test]
fn test_marginal_bounds_and_pdf_at_room_temperature() {
    let marginal = AdjointFreeGasMarginalBetaFunction::new(constant_hydrogen(), ROOM_TEMPERATURE).unwrap();
    assert_relative_eq!(marginal.beta_max(), 1.0, max_relative = 1e-12);
    assert_relative_eq!(marginal.beta_min(), -500.0 * HYDROGEN_AWR, max_relative = 1e-12);
    assert_eq!(marginal.evaluate_pdf(marginal.beta_min()), 0.0);
    assert_eq!(marginal.evaluate_pdf(marginal.beta_max()), 0.0);
    assert!(marginal.evaluate_pdf(0.0) > 0.0);
    assert!(marginal.evaluate_pdf(0.3) > 0.0);
}

#[test]
fn test_numerical_kernel_matches_closed_form_for_constant_cross_section() {
    let function = constant_hydrogen();
    for &beta in &[-0.9, 0.0, 0.3, 1.0, 3.0, 10.0] {
        let numerical = function.integrate_numerically(beta, ROOM_TEMPERATURE, 0.0).unwrap();
        let closed = function.closed_form_integral(beta, ROOM_TEMPERATURE, 0.0);
        assert_relative_eq!(numerical, closed, max_relative = 1e-5);
    }
}

#[test]
fn test_cross_section_is_prefactor_times_normalization() {
    let function = constant_hydrogen();
    let generator = AdjointFreeGasElasticCrossSectionGenerator::new(Arc::clone(&function), vec![ROOM_TEMPERATURE]).unwrap();
    let cross_section = generator.cross_section_at(ROOM_TEMPERATURE).unwrap();

    // normalization recomputed from the closed-form kernel
    let reduced_energy = 1.0;
    let closed_pdf = |beta: f64| {
        let log_scale = -beta + (reduced_energy / (reduced_energy - beta)).ln();
        function.closed_form_integral(-beta, ROOM_TEMPERATURE, log_scale)
    };
    let integrator = GaussKronrodIntegrator::new(1e-8, 0.0, 1000).unwrap();
    let normalization = integrator
        .integrate_adaptively_over_points::<Gk15, _>(closed_pdf, &[-500.0 * HYDROGEN_AWR, -10.0, -3.0, -1.0, 0.0, 0.5, 1.0])
        .unwrap()
        .value;
    assert_relative_eq!(
        cross_section,
        generator.kinematic_prefactor(ROOM_TEMPERATURE) * normalization,
        max_relative = 1e-4
    );
    assert_relative_eq!(cross_section, 126.19, max_relative = 1e-3);
}

#[test]
fn test_tabulated_zero_temperature_cross_section() {
    // 1/v-like curve; the correction must stay positive and finite
    let energies = vec![1e-11, 1e-9, 1e-7, 1e-5, 1e-3];
    let values: Vec<f64> = energies.iter().map(|e: &f64| 20.0 + 1e-4 / e.sqrt()).collect();
    let sigma = UnivariateDistribution::Tabular(TabularDistribution::lin_lin(energies, values).unwrap());
    let function = Arc::new(FreeGasElasticSAlphaBetaFunction::isotropic(sigma, HYDROGEN_AWR, ROOM_TEMPERATURE).unwrap());
    let generator = AdjointFreeGasElasticCrossSectionGenerator::new(function, vec![0.5 * ROOM_TEMPERATURE, 2.0 * ROOM_TEMPERATURE])
        .unwrap();
    let values = generator.generate_free_gas_cross_section().unwrap();
    assert!(values.iter().all(|value| value.is_finite() && *value > 0.0));
}

#[test]
fn test_energy_table_survives_a_file_roundtrip() {
    let function = constant_hydrogen();
    let grid: Vec<f64> = [0.25, 0.5, 1.0, 2.0].iter().map(|x| x * ROOM_TEMPERATURE).collect();
    let mut table = FreeGasEnergyTable::new(grid).unwrap();
    table.populate(&function, ROOM_TEMPERATURE).unwrap();

    let path = std::env::temp_dir().join(format!("free_gas_table_{}.json", std::process::id()));
    table.save(&path).unwrap();
    let restored = FreeGasEnergyTable::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(restored, table);
    let distribution = restored.energy_distribution(ROOM_TEMPERATURE).unwrap().unwrap();
    assert_relative_eq!(distribution.upper_bound(), 2.0 * ROOM_TEMPERATURE);
}
