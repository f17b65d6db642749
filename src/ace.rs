// Extracted ACE table blocks
//
// Each block is kept as the flat array of numbers found in the XSS array.
// Tables are loaded from JSON documents with one key per block; missing
// blocks deserialize as empty arrays.

use crate::error::{CollisionError, CollisionResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Continuous-energy neutron table (and its photon-production blocks)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XssNeutronData {
    pub table_name: String,
    pub atomic_weight_ratio: f64,
    /// kT in MeV
    pub temperature: f64,

    /// ESZ block
    pub energy_grid: Vec<f64>,
    pub total_cross_section: Vec<f64>,
    pub absorption_cross_section: Vec<f64>,
    pub elastic_cross_section: Vec<f64>,

    pub mtr: Vec<f64>,
    pub lqr: Vec<f64>,
    pub tyr: Vec<f64>,
    pub lsig: Vec<f64>,
    pub sig: Vec<f64>,
    pub land: Vec<f64>,
    #[serde(rename = "and")]
    pub and_block: Vec<f64>,
    pub ldlw: Vec<f64>,
    pub dlw: Vec<f64>,

    pub nu: Vec<f64>,
    pub dnu: Vec<f64>,
    pub bdd: Vec<f64>,
    pub dnedl: Vec<f64>,
    pub dned: Vec<f64>,

    pub mtrp: Vec<f64>,
    pub lsigp: Vec<f64>,
    pub sigp: Vec<f64>,
    pub landp: Vec<f64>,
    pub andp: Vec<f64>,
    pub ldlwp: Vec<f64>,
    pub dlwp: Vec<f64>,

    /// Unresolved resonance probability tables
    pub unr: Vec<f64>,
}

impl XssNeutronData {
    pub fn from_json_str(json: &str) -> CollisionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> CollisionResult<Self> {
        let path = path.as_ref();
        log::info!("reading ACE neutron table from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn has_unresolved_resonance_data(&self) -> bool {
        !self.unr.is_empty()
    }

    pub fn has_photon_production_data(&self) -> bool {
        !self.mtrp.is_empty()
    }

    /// The ESZ arrays must share the energy grid's length
    pub fn validate_esz(&self) -> CollisionResult<()> {
        let n = self.energy_grid.len();
        if n == 0 {
            return Err(CollisionError::MalformedBlock {
                table: self.table_name.clone(),
                block: "ESZ",
                expected: "a non-empty energy grid".to_string(),
                found: "no energies".to_string(),
            });
        }
        for (name, values) in [
            ("total", &self.total_cross_section),
            ("absorption", &self.absorption_cross_section),
            ("elastic", &self.elastic_cross_section),
        ] {
            if values.len() != n {
                return Err(CollisionError::MalformedBlock {
                    table: self.table_name.clone(),
                    block: "ESZ",
                    expected: format!("{} {} cross section values", n, name),
                    found: format!("{} values", values.len()),
                });
            }
        }
        Ok(())
    }
}

/// Thermal scattering law table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SAlphaBetaData {
    pub table_name: String,
    pub atomic_weight_ratio: f64,
    pub temperature: f64,

    /// Inelastic cross section: NE, E(NE), sigma(NE)
    pub itie: Vec<f64>,
    /// Inelastic outgoing energies and cosines
    pub itxe: Vec<f64>,
    /// Elastic data: NE, E(NE), P(NE) (or sigma for incoherent tables)
    pub itce: Vec<f64>,
    /// Incoherent elastic cosines
    pub itca: Vec<f64>,

    /// Inelastic scattering mode
    pub idpni: i64,
    /// Number of inelastic cosines minus one
    pub nil: i64,
    /// Number of inelastic outgoing energies
    pub nieb: i64,
    /// Elastic mode; 4 marks coherent (Bragg edge) data
    pub idpnc: i64,
    /// Number of elastic cosines minus one
    pub ncl: i64,
    /// Outgoing energy mode: 0 equiprobable, 1 skewed, 2 continuous
    pub ifeng: i64,
}

impl SAlphaBetaData {
    pub const COHERENT_ELASTIC: i64 = 4;

    pub fn from_json_str(json: &str) -> CollisionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> CollisionResult<Self> {
        let path = path.as_ref();
        log::info!("reading S(a,b) table from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn has_elastic_data(&self) -> bool {
        !self.itce.is_empty()
    }

    pub fn is_coherent_elastic(&self) -> bool {
        self.idpnc == Self::COHERENT_ELASTIC
    }
}

/// Largest integer an f64 holds exactly; larger integer entries are rejected
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Bounds-checked view of one block, reporting the table and block name on
/// every failure
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlockReader<'a> {
    table: &'a str,
    block: &'static str,
    data: &'a [f64],
}

impl<'a> BlockReader<'a> {
    pub(crate) fn new(table: &'a str, block: &'static str, data: &'a [f64]) -> Self {
        BlockReader { table, block, data }
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub(crate) fn malformed(&self, expected: impl Into<String>, found: impl Into<String>) -> CollisionError {
        CollisionError::MalformedBlock {
            table: self.table.to_string(),
            block: self.block,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn unsupported(&self, message: impl Into<String>) -> CollisionError {
        CollisionError::UnsupportedData {
            table: self.table.to_string(),
            block: self.block,
            message: message.into(),
        }
    }

    pub(crate) fn value(&self, index: usize) -> CollisionResult<f64> {
        self.data.get(index).copied().ok_or_else(|| {
            self.malformed(
                format!("an entry at index {}", index),
                format!("{} entries", self.data.len()),
            )
        })
    }

    /// Entry that must hold a non-negative integer
    pub(crate) fn integer(&self, index: usize) -> CollisionResult<usize> {
        let value = self.value(index)?;
        if value < 0.0 || value.fract() != 0.0 || !(value <= MAX_EXACT_INTEGER) {
            return Err(self.malformed(
                format!("a non-negative integer at index {}", index),
                value.to_string(),
            ));
        }
        Ok(value as usize)
    }

    /// Entry counting values stored in this block, so it can never exceed
    /// the block length
    pub(crate) fn count(&self, index: usize) -> CollisionResult<usize> {
        let count = self.integer(index)?;
        if count > self.data.len() {
            return Err(self.malformed(
                format!("a count of at most {} at index {}", self.data.len(), index),
                count.to_string(),
            ));
        }
        Ok(count)
    }

    /// Entry that must hold an integer of either sign
    pub(crate) fn signed_integer(&self, index: usize) -> CollisionResult<i64> {
        let value = self.value(index)?;
        if value.fract() != 0.0 || !(value.abs() <= MAX_EXACT_INTEGER) {
            return Err(self.malformed(format!("an integer at index {}", index), value.to_string()));
        }
        Ok(value as i64)
    }

    /// A 1-based locator converted to a 0-based index
    pub(crate) fn locator(&self, index: usize) -> CollisionResult<usize> {
        let raw = self.integer(index)?;
        if raw == 0 {
            return Err(self.malformed(
                format!("a 1-based locator at index {}", index),
                "0".to_string(),
            ));
        }
        Ok(raw - 1)
    }

    pub(crate) fn slice(&self, start: usize, len: usize) -> CollisionResult<&'a [f64]> {
        let end = start.checked_add(len).ok_or_else(|| {
            self.malformed(
                format!("{} entries starting at index {}", len, start),
                "a range past the addressable end".to_string(),
            )
        })?;
        self.data.get(start..end).ok_or_else(|| {
            self.malformed(
                format!("{} entries starting at index {}", len, start),
                format!("{} entries", self.data.len()),
            )
        })
    }

    pub(crate) fn to_vec(&self, start: usize, len: usize) -> CollisionResult<Vec<f64>> {
        Ok(self.slice(start, len)?.to_vec())
    }
}

/// Small hand-built tables shared by the factory tests
#[cfg(test)]
pub(crate) mod test_tables {
    use super::XssNeutronData;

    /// Elastic, (n,2n) above 10 MeV and capture on a four-point grid
    pub(crate) fn hydrogen_like_table() -> XssNeutronData {
        XssNeutronData {
            table_name: "1001.70c".to_string(),
            atomic_weight_ratio: 0.999167,
            temperature: 2.53e-8,
            energy_grid: vec![1e-11, 1.0, 10.0, 20.0],
            total_cross_section: vec![11.0, 5.5, 2.2, 1.35],
            absorption_cross_section: vec![1.0, 0.5, 0.1, 0.05],
            elastic_cross_section: vec![10.0, 5.0, 2.0, 1.0],
            mtr: vec![16.0, 102.0],
            lqr: vec![-7.0, 2.2],
            tyr: vec![-2.0, 0.0],
            lsig: vec![1.0, 5.0],
            sig: vec![3.0, 2.0, 0.1, 0.3, 1.0, 4.0, 1.0, 0.5, 0.1, 0.05],
            land: vec![0.0, 0.0],
            ldlw: vec![1.0],
            // law 9 evaporation with a flat 1 MeV temperature
            dlw: vec![
                0.0, 9.0, 10.0, 0.0, 2.0, 1e-11, 20.0, 1.0, 1.0, //
                0.0, 2.0, 1e-11, 20.0, 1.0, 1.0, 0.0,
            ],
            ..Default::default()
        }
    }

    /// Fission with total and delayed nu, one precursor group, and capture
    pub(crate) fn fissile_table() -> XssNeutronData {
        XssNeutronData {
            table_name: "92235.70c".to_string(),
            atomic_weight_ratio: 233.0248,
            temperature: 2.53e-8,
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
            // law 7 Maxwell prompt spectrum
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_blocks_default_to_empty() {
        let data = XssNeutronData::from_json_str(
            r#"{"table_name": "1001.70c", "atomic_weight_ratio": 0.999167, "temperature": 2.53e-8,
                "energy_grid": [1e-11, 20.0], "total_cross_section": [2.0, 1.0],
                "absorption_cross_section": [1.0, 0.0], "elastic_cross_section": [1.0, 1.0],
                "and": [0.0]}"#,
        )
        .unwrap();
        assert!(data.mtr.is_empty());
        assert_eq!(data.and_block, vec![0.0]);
        assert!(!data.has_photon_production_data());
        assert!(data.validate_esz().is_ok());
    }

    #[test]
    fn test_esz_length_mismatch_names_block() {
        let data = XssNeutronData {
            table_name: "8016.70c".to_string(),
            energy_grid: vec![1.0, 2.0],
            total_cross_section: vec![1.0],
            ..Default::default()
        };
        let err = data.validate_esz().unwrap_err();
        assert!(err.to_string().contains("8016.70c"));
        assert!(err.to_string().contains("ESZ"));
    }

    #[test]
    fn test_block_reader_converts_locators() {
        let block = [3.0, 0.0, 2.5, -1.0];
        let reader = BlockReader::new("t", "LSIG", &block);
        assert_eq!(reader.locator(0).unwrap(), 2);
        assert!(reader.locator(1).is_err());
        assert!(reader.integer(2).is_err());
        assert_eq!(reader.signed_integer(3).unwrap(), -1);
        assert!(reader.value(4).is_err());
        assert_eq!(reader.slice(1, 2).unwrap(), &[0.0, 2.5]);
        assert!(reader.slice(3, 2).is_err());
    }

    #[test]
    fn test_block_reader_rejects_oversized_counts() {
        let block = [1e300, 1.0, 2.0];
        let reader = BlockReader::new("1001.70c", "SIG", &block);
        let err = reader.integer(0).unwrap_err();
        assert!(matches!(err, CollisionError::MalformedBlock { block: "SIG", .. }));
        assert!(reader.count(0).is_err());
        assert!(reader.signed_integer(0).is_err());
        assert!(reader.slice(1, usize::MAX).is_err());
        assert!(reader.to_vec(usize::MAX, 2).is_err());

        let block = [4.0, 1.0, 2.0];
        let reader = BlockReader::new("1001.70c", "SIG", &block);
        assert_eq!(reader.integer(0).unwrap(), 4);
        assert!(reader.count(0).is_err());
        let block = [2.0, 1.0, 2.0];
        let reader = BlockReader::new("1001.70c", "SIG", &block);
        assert_eq!(reader.count(0).unwrap(), 2);
        assert_eq!(reader.to_vec(1, reader.count(0).unwrap()).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_s_alpha_beta_flags() {
        let data = SAlphaBetaData::from_json_str(r#"{"idpnc": 4, "itce": [1.0]}"#).unwrap();
        assert!(data.is_coherent_elastic());
        assert!(data.has_elastic_data());
    }
}
