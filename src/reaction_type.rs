// Nuclear reaction identifiers keyed on ENDF MT numbers
use crate::error::{CollisionError, CollisionResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A nuclear reaction channel, identified by its ENDF MT number.
///
/// Construction through [`NuclearReactionType::from_mt`] only accepts MT
/// numbers this crate knows how to treat. Ordering follows the MT number so
/// ordered maps keyed on reaction type iterate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct NuclearReactionType(u32);

impl NuclearReactionType {
    pub const TOTAL: Self = Self(1);
    pub const ELASTIC: Self = Self(2);
    pub const NONELASTIC: Self = Self(3);
    pub const INELASTIC: Self = Self(4);
    pub const ANYTHING: Self = Self(5);
    pub const N2N: Self = Self(16);
    pub const N3N: Self = Self(17);
    pub const FISSION: Self = Self(18);
    pub const FIRST_CHANCE_FISSION: Self = Self(19);
    pub const SECOND_CHANCE_FISSION: Self = Self(20);
    pub const THIRD_CHANCE_FISSION: Self = Self(21);
    pub const N_ALPHA_INELASTIC: Self = Self(22);
    pub const FOURTH_CHANCE_FISSION: Self = Self(38);
    pub const N4N: Self = Self(37);
    pub const FIRST_EXCITED_STATE: Self = Self(51);
    pub const CONTINUUM_INELASTIC: Self = Self(91);
    pub const DISAPPEARANCE: Self = Self(101);
    pub const CAPTURE: Self = Self(102);
    pub const N_P: Self = Self(103);
    pub const N_D: Self = Self(104);
    pub const N_T: Self = Self(105);
    pub const N_HE3: Self = Self(106);
    pub const N_ALPHA: Self = Self(107);
    pub const N_2ALPHA: Self = Self(108);
    pub const N_3ALPHA: Self = Self(109);
    pub const N_2P: Self = Self(111);
    pub const N_P_ALPHA: Self = Self(112);
    pub const N_T_2ALPHA: Self = Self(113);
    pub const N_D_2ALPHA: Self = Self(114);
    pub const N_P_D: Self = Self(115);
    pub const N_P_T: Self = Self(116);
    pub const N_D_ALPHA: Self = Self(117);
    pub const TOTAL_PROTON_PRODUCTION: Self = Self(203);
    pub const TOTAL_ALPHA_PRODUCTION: Self = Self(207);
    pub const AVERAGE_HEATING: Self = Self(301);
    pub const DAMAGE: Self = Self(444);
    /// Thermal elastic scattering from S(alpha,beta) data
    pub const S_ALPHA_BETA_ELASTIC: Self = Self(1002);
    /// Thermal inelastic scattering from S(alpha,beta) data
    pub const S_ALPHA_BETA_INELASTIC: Self = Self(1004);

    /// Validate an MT number and wrap it
    pub fn from_mt(mt: u32) -> CollisionResult<Self> {
        if Self::is_known_mt(mt) {
            Ok(Self(mt))
        } else {
            Err(CollisionError::UnknownReactionType(mt))
        }
    }

    /// Convert a raw ACE value (stored as a float) to a reaction type
    pub fn from_ace_value(value: f64) -> CollisionResult<Self> {
        if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
            return Err(CollisionError::UnknownReactionType(value as u32));
        }
        Self::from_mt(value as u32)
    }

    fn is_known_mt(mt: u32) -> bool {
        matches!(
            mt,
            1..=5
                | 11
                | 16..=45
                | 51..=91
                | 101..=109
                | 111..=117
                | 201..=207
                | 301
                | 443..=444
                | 600..=649
                | 650..=699
                | 700..=749
                | 750..=799
                | 800..=849
                | 1002
                | 1004
        )
    }

    pub fn mt(self) -> u32 {
        self.0
    }

    /// True for the two synthetic S(alpha,beta) reaction types
    pub fn is_s_alpha_beta(self) -> bool {
        self == Self::S_ALPHA_BETA_ELASTIC || self == Self::S_ALPHA_BETA_INELASTIC
    }

    /// True for total and partial-chance fission
    pub fn is_fission(self) -> bool {
        matches!(self.0, 18..=21 | 38)
    }

    /// True for the partial-chance fission channels (19, 20, 21, 38)
    pub fn is_partial_fission(self) -> bool {
        matches!(self.0, 19..=21 | 38)
    }

    /// Standard reaction that an S(alpha,beta) reaction replaces at low
    /// energy; bound-atom elastic and inelastic both stand in for free-atom
    /// elastic scattering
    pub fn s_alpha_beta_counterpart(self) -> Option<Self> {
        match self {
            Self::S_ALPHA_BETA_ELASTIC | Self::S_ALPHA_BETA_INELASTIC => Some(Self::ELASTIC),
            _ => None,
        }
    }

    pub fn name(self) -> String {
        match self.0 {
            1 => "total".to_string(),
            2 => "(n,elastic)".to_string(),
            3 => "(n,nonelastic)".to_string(),
            4 => "(n,inelastic)".to_string(),
            5 => "(n,anything)".to_string(),
            16 => "(n,2n)".to_string(),
            17 => "(n,3n)".to_string(),
            18 => "(n,fission)".to_string(),
            19 => "(n,f)".to_string(),
            20 => "(n,nf)".to_string(),
            21 => "(n,2nf)".to_string(),
            37 => "(n,4n)".to_string(),
            38 => "(n,3nf)".to_string(),
            mt @ 51..=90 => format!("(n,n{})", mt - 50),
            91 => "(n,nc)".to_string(),
            101 => "(n,disappear)".to_string(),
            102 => "(n,gamma)".to_string(),
            103 => "(n,p)".to_string(),
            104 => "(n,d)".to_string(),
            105 => "(n,t)".to_string(),
            106 => "(n,3He)".to_string(),
            107 => "(n,a)".to_string(),
            1002 => "S(a,b) elastic".to_string(),
            1004 => "S(a,b) inelastic".to_string(),
            mt => format!("MT {}", mt),
        }
    }
}

impl TryFrom<u32> for NuclearReactionType {
    type Error = CollisionError;

    fn try_from(mt: u32) -> Result<Self, Self::Error> {
        Self::from_mt(mt)
    }
}

impl From<NuclearReactionType> for u32 {
    fn from(reaction: NuclearReactionType) -> u32 {
        reaction.0
    }
}

impl fmt::Display for NuclearReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (MT {})", self.name(), self.0)
    }
}
