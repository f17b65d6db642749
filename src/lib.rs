// Nuclear data and numerics
mod ace;
mod distribution;
mod error;
mod fission;
mod gauss_kronrod;
mod grid;
mod reaction_type;
mod s_alpha_beta;
mod scattering;
mod stats;
mod utilities;

// Reactions, nuclides and materials
mod bank;
mod fast_rng;
mod material;
mod nuclide;
mod particle;
mod photon_production;
mod physics;
mod reaction;

// Builders from ACE blocks
mod ace_distribution_factory;
mod ace_factory;
mod nuclide_factory;
mod photon_production_factory;
mod s_alpha_beta_factory;

mod config;
mod free_gas;

pub use ace::{SAlphaBetaData, XssNeutronData};
pub use ace_factory::NuclearReactionAceFactory;
pub use bank::{BankedParticle, ParticleBank};
pub use config::{Config, IntoCrossSectionsInput, ParticleMode, SimulationProperties, CONFIG};
pub use distribution::{Interpolation, PolynomialDistribution, TabularDistribution, UnivariateDistribution};
pub use error::{CollisionError, CollisionResult, IntegrationError};
pub use fast_rng::FastRng;
pub use fission::{DelayedNeutronEmissionDistribution, DelayedNeutronGroup, FissionNeutronMultiplicityDistribution};
pub use free_gas::{
    energy_key, AdjointFreeGasElasticCrossSectionGenerator, AdjointFreeGasMarginalBetaFunction,
    FreeGasElasticSAlphaBetaFunction, FreeGasEnergyTable, ADJOINT_BETA_MIN_PER_AWR, DEFAULT_CUTOFF_IN_KT,
    RELATIVE_ENERGY_FLOOR,
};
pub use gauss_kronrod::{GaussKronrodIntegrator, Gk15, Gk21, IntegralEstimate, KronrodRule, RuleEstimate};
pub use grid::{EnergyGrid, GridArena, GridId, HashedGridSearcher, ReactionCrossSection};
pub use material::NeutronMaterial;
pub use nuclide::{
    DecoupledPhotonProductionNuclide, Nuclide, NuclideIdentity, ReactionMap, ScatteringCenter,
    DEFAULT_ABSORPTION_REACTION_TYPES, MAX_SAMPLING_ATTEMPTS, TOTAL_CROSS_SECTION_TOLERANCE,
};
pub use nuclide_factory::{clear_nuclide_cache, get_or_load_nuclide, NuclideAceFactory};
pub use particle::{ParticleKind, ParticleState};
pub use photon_production::{PhotonProductionKind, PhotonProductionReaction};
pub use photon_production_factory::PhotonProductionAceFactory;
pub use reaction::{sample_number_of_emitted_particles, NuclearReaction, ReactionKind};
pub use reaction_type::NuclearReactionType;
pub use s_alpha_beta::{
    CoherentElasticDistribution, DiscreteOutgoingState, IncoherentElasticDistribution, InelasticSAlphaBetaDistribution,
    OutgoingEnergyMode, SAlphaBetaDistribution,
};
pub use s_alpha_beta_factory::{SAlphaBetaDraft, SAlphaBetaReactionBuilder};
pub use scattering::{EnergyLaw, NuclearScatteringDistribution, ReferenceFrame};
pub use stats::{AngularDistribution, EnergyDependentAngularDistribution};
pub use utilities::{interpolate_linear, interpolate_log_log};
