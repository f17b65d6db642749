//! Adjoint free-gas elastic scattering: S(α,β) kernel, marginal β
//! distribution, corrected cross section and tabulated energy distributions

mod cross_section;
mod kernel;
mod marginal;
mod tables;

pub use cross_section::{AdjointFreeGasElasticCrossSectionGenerator, DEFAULT_CUTOFF_IN_KT};
pub use kernel::{FreeGasElasticSAlphaBetaFunction, RELATIVE_ENERGY_FLOOR};
pub use marginal::{AdjointFreeGasMarginalBetaFunction, ADJOINT_BETA_MIN_PER_AWR};
pub use tables::{energy_key, FreeGasEnergyTable};
