//! Error types for collision physics and numerical integration

use thiserror::Error;

/// Failure modes of the adaptive Gauss-Kronrod integrator.
///
/// Variants that carry `result`/`error` report the best estimate reached
/// before the integrator gave up, so callers can decide whether a partial
/// estimate is usable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrationError {
    #[error("invalid integration limits: {lower} !< {upper}")]
    InvalidLimits { lower: f64, upper: f64 },

    #[error("tolerance cannot be achieved with relative tolerance {relative} and absolute tolerance {absolute}")]
    UnachievableTolerance { relative: f64, absolute: f64 },

    #[error("subinterval limit must be positive")]
    InvalidSubintervalLimit,

    #[error("cannot reach tolerance because of roundoff error on first attempt (estimate {result}, error {error})")]
    RoundoffOnFirstAttempt { result: f64, error: f64 },

    #[error("a maximum of one subinterval was insufficient (estimate {result}, error {error})")]
    SingleSubintervalInsufficient { result: f64, error: f64 },

    #[error("roundoff error prevented tolerance from being achieved (estimate {result}, error {error})")]
    RoundoffStagnation { result: f64, error: f64 },

    #[error("maximum number of subdivisions ({limit}) reached (estimate {result}, error {error})")]
    SubintervalLimitReached { limit: usize, result: f64, error: f64 },

    #[error("subinterval [{lower}, {upper}] too small to bisect further (estimate {result}, error {error})")]
    SubintervalTooSmall {
        lower: f64,
        upper: f64,
        result: f64,
        error: f64,
    },

    #[error("integral estimate is not finite ({result})")]
    NonFiniteResult { result: f64 },
}

impl IntegrationError {
    /// The partial (result, absolute error) estimate, when one exists
    pub fn partial_estimate(&self) -> Option<(f64, f64)> {
        match *self {
            IntegrationError::RoundoffOnFirstAttempt { result, error }
            | IntegrationError::SingleSubintervalInsufficient { result, error }
            | IntegrationError::RoundoffStagnation { result, error }
            | IntegrationError::SubintervalLimitReached { result, error, .. }
            | IntegrationError::SubintervalTooSmall { result, error, .. } => Some((result, error)),
            _ => None,
        }
    }
}

/// Errors raised while building or using nuclides, materials and reactions.
#[derive(Error, Debug)]
pub enum CollisionError {
    #[error("invalid energy grid: {0}")]
    InvalidGrid(String),

    #[error("contract violation: {0}")]
    ContractViolation(String),

    #[error("{table}: unsupported data in {block} block: {message}")]
    UnsupportedData {
        table: String,
        block: &'static str,
        message: String,
    },

    #[error("{table}: malformed {block} block: expected {expected}, found {found}")]
    MalformedBlock {
        table: String,
        block: &'static str,
        expected: String,
        found: String,
    },

    #[error("unknown reaction type code {0}")]
    UnknownReactionType(u32),

    #[error("photon production requested MT number {mt} which was not found amongst the neutron absorption, scattering, or fission reactions")]
    ReactionNotFound { mt: u32 },

    #[error("{table}: total cross section mismatch at {energy} MeV (reactions sum to {summed}, table gives {tabulated})")]
    TotalCrossSectionMismatch {
        table: String,
        energy: f64,
        summed: f64,
        tabulated: f64,
    },

    #[error("{context}: no {group} reaction selected after {attempts} attempts at {energy} MeV (scaled draw {scaled}, cross sections sum to {summed})")]
    SamplingExhausted {
        context: String,
        group: &'static str,
        energy: f64,
        attempts: usize,
        scaled: f64,
        summed: f64,
    },

    #[error("no data file configured for table '{0}'")]
    MissingTable(String),

    #[error("integration failed: {0}")]
    Integration(#[from] IntegrationError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CollisionResult<T> = Result<T, CollisionError>;

/// Build a `ContractViolation` from a format string
macro_rules! contract_violation {
    ($($arg:tt)*) => {
        $crate::error::CollisionError::ContractViolation(format!($($arg)*))
    };
}
pub(crate) use contract_violation;
