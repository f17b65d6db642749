// Small hand-built ACE tables shared by the integration tests
#![allow(dead_code)]

use mc_collision::{SAlphaBetaData, XssNeutronData};

/// Route library log output to the test harness; `RUST_LOG` picks the level
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub const THERMAL_ENERGY: f64 = 2.53e-8;
pub const HYDROGEN_AWR: f64 = 0.999167;

/// Elastic scattering and radiative capture only
pub fn hydrogen_table() -> XssNeutronData {
    XssNeutronData {
        table_name: "1001.70c".to_string(),
        atomic_weight_ratio: HYDROGEN_AWR,
        temperature: THERMAL_ENERGY,
        energy_grid: vec![1e-11, 1.0, 10.0, 20.0],
        total_cross_section: vec![21.0, 5.5, 2.1, 1.05],
        absorption_cross_section: vec![1.0, 0.5, 0.1, 0.05],
        elastic_cross_section: vec![20.0, 5.0, 2.0, 1.0],
        mtr: vec![102.0],
        lqr: vec![2.2],
        tyr: vec![0.0],
        lsig: vec![1.0],
        sig: vec![1.0, 4.0, 1.0, 0.5, 0.1, 0.05],
        land: vec![0.0],
        ..Default::default()
    }
}

/// Hydrogen with an (n,2n) channel from 10 MeV and law 9 secondary energies
pub fn hydrogen_with_n2n_table() -> XssNeutronData {
    XssNeutronData {
        total_cross_section: vec![21.0, 5.5, 2.2, 1.35],
        mtr: vec![16.0, 102.0],
        lqr: vec![-7.0, 2.2],
        tyr: vec![-2.0, 0.0],
        lsig: vec![1.0, 5.0],
        sig: vec![3.0, 2.0, 0.1, 0.3, 1.0, 4.0, 1.0, 0.5, 0.1, 0.05],
        land: vec![0.0, 0.0],
        ldlw: vec![1.0],
        dlw: vec![
            0.0, 9.0, 10.0, 0.0, 2.0, 1e-11, 20.0, 1.0, 1.0, //
            0.0, 2.0, 1e-11, 20.0, 1.0, 1.0, 0.0,
        ],
        ..hydrogen_table()
    }
}

/// Total fission with prompt and delayed nu plus capture
pub fn fissile_table() -> XssNeutronData {
    XssNeutronData {
        table_name: "92235.70c".to_string(),
        atomic_weight_ratio: 233.0248,
        temperature: THERMAL_ENERGY,
        energy_grid: vec![1e-11, 1.0, 10.0, 20.0],
        total_cross_section: vec![611.0, 7.5, 3.1, 2.05],
        absorption_cross_section: vec![100.0, 0.5, 0.1, 0.05],
        elastic_cross_section: vec![10.0, 5.0, 2.0, 1.0],
        mtr: vec![18.0, 102.0],
        lqr: vec![180.0, 6.5],
        tyr: vec![19.0, 0.0],
        lsig: vec![1.0, 7.0],
        sig: vec![
            1.0, 4.0, 501.0, 2.0, 1.0, 1.0, //
            1.0, 4.0, 100.0, 0.5, 0.1, 0.05,
        ],
        land: vec![0.0, 0.0],
        ldlw: vec![1.0],
        dlw: vec![
            0.0, 7.0, 10.0, 0.0, 2.0, 1e-11, 20.0, 1.0, 1.0, //
            0.0, 2.0, 1e-11, 20.0, 1.3, 1.3, 0.0,
        ],
        nu: vec![1.0, 1.0, 2.44],
        dnu: vec![2.0, 0.0, 2.0, 1e-11, 20.0, 0.0158, 0.0158],
        bdd: vec![0.0133, 0.0, 2.0, 1e-11, 20.0, 1.0, 1.0],
        dnedl: vec![1.0],
        dned: vec![0.0, 2.0, 10.0, 0.0, 2.0, 1e-11, 20.0, 1.0, 1.0, 0.0, 0.4],
        ..Default::default()
    }
}

/// Hydrogen with a 2.2 MeV capture gamma (yield 2) and a tabulated
/// production cross section from 10 MeV
pub fn hydrogen_with_photons_table() -> XssNeutronData {
    let capture_at_bottom = 1.17724711e3;
    XssNeutronData {
        total_cross_section: vec![20.0 + capture_at_bottom, 5.5, 2.1, 1.05],
        absorption_cross_section: vec![capture_at_bottom, 0.5, 0.1, 0.05],
        sig: vec![1.0, 4.0, capture_at_bottom, 0.5, 0.1, 0.05],
        mtrp: vec![102001.0, 102002.0],
        lsigp: vec![1.0, 9.0],
        sigp: vec![
            12.0, 102.0, 0.0, 2.0, 1e-11, 20.0, 2.0, 2.0, //
            13.0, 3.0, 2.0, 1.0, 2.0,
        ],
        ldlwp: vec![1.0, 1.0],
        dlwp: vec![0.0, 2.0, 10.0, 0.0, 2.0, 1e-11, 20.0, 1.0, 1.0, 0.0, 2.2],
        ..hydrogen_table()
    }
}

/// Water-like thermal table with incoherent elastic data up to 1e-6 MeV
pub fn thermal_table() -> SAlphaBetaData {
    let mut itxe = Vec::new();
    for incident in [1e-11, 1e-8, 1e-6] {
        for bin in [0.5, 1.5] {
            itxe.extend([incident * bin + 1e-9, -0.5, 0.5]);
        }
    }
    SAlphaBetaData {
        table_name: "lwtr.10t".to_string(),
        atomic_weight_ratio: HYDROGEN_AWR,
        temperature: THERMAL_ENERGY,
        itie: vec![3.0, 1e-11, 1e-8, 1e-6, 40.0, 30.0, 20.0],
        itxe,
        itce: vec![2.0, 1e-11, 1e-6, 5.0, 4.0],
        itca: vec![-0.5, 0.5, -0.5, 0.5],
        idpni: 3,
        nil: 1,
        nieb: 2,
        idpnc: 3,
        ncl: 1,
        ifeng: 0,
    }
}
