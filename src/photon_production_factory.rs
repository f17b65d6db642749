// Photon-production reactions from the MTRP/SIGP/DLWP blocks
//
// MFTYPE 12 and 16 entries give a photon yield applied to a base neutron
// reaction; MFTYPE 13 entries tabulate the production cross section on the
// primary grid from a 1-based threshold index.

use crate::ace::{BlockReader, XssNeutronData};
use crate::ace_distribution_factory::{read_energy_law, read_tab1};
use crate::ace_factory::NuclearReactionAceFactory;
use crate::distribution::UnivariateDistribution;
use crate::error::{CollisionError, CollisionResult};
use crate::grid::{GridArena, GridId, ReactionCrossSection};
use crate::photon_production::{PhotonProductionKind, PhotonProductionReaction};
use crate::reaction_type::NuclearReactionType;
use std::collections::BTreeMap;

const YIELD_BASED_TYPES: [usize; 2] = [12, 16];
const CROSS_SECTION_BASED_TYPE: usize = 13;

/// Builds every photon-production reaction of a neutron table
pub struct PhotonProductionAceFactory<'a> {
    data: &'a XssNeutronData,
    grids: &'a GridArena,
    reactions: &'a NuclearReactionAceFactory,
}

impl<'a> PhotonProductionAceFactory<'a> {
    pub fn new(data: &'a XssNeutronData, grids: &'a GridArena, reactions: &'a NuclearReactionAceFactory) -> Self {
        PhotonProductionAceFactory { data, grids, reactions }
    }

    /// Reactions keyed by their MTRP identifier
    pub fn create_reactions(&self) -> CollisionResult<BTreeMap<u32, PhotonProductionReaction>> {
        let table = self.data.table_name.as_str();
        let mtrp = BlockReader::new(table, "MTRP", &self.data.mtrp);
        let lsigp = BlockReader::new(table, "LSIGP", &self.data.lsigp);
        let sigp = BlockReader::new(table, "SIGP", &self.data.sigp);
        let ldlwp = BlockReader::new(table, "LDLWP", &self.data.ldlwp);
        let dlwp = BlockReader::new(table, "DLWP", &self.data.dlwp);

        if !self.data.landp.is_empty() {
            log::debug!("{}: photon angular data (LANDP/ANDP) ignored; photons are emitted isotropically", table);
        }

        let mut reactions = BTreeMap::new();
        for index in 0..mtrp.len() {
            let id = mtrp.integer(index)? as u32;
            let location = lsigp.locator(index)?;
            let photon_energy = read_energy_law(&dlwp, ldlwp.locator(index)?, self.data.atomic_weight_ratio)?;

            let mftype = sigp.integer(location)?;
            let (base_reaction_type, kind) = if YIELD_BASED_TYPES.contains(&mftype) {
                self.create_yield_based(&sigp, location + 1)?
            } else if mftype == CROSS_SECTION_BASED_TYPE {
                self.create_cross_section_based(&sigp, location + 1, id)?
            } else {
                return Err(sigp.unsupported(format!(
                    "photon production reaction {} has MFTYPE {}, expected 12, 13 or 16",
                    id, mftype
                )));
            };

            reactions.insert(id, PhotonProductionReaction::new(id, base_reaction_type, kind, photon_energy));
        }

        log::debug!("{}: built {} photon production reactions", table, reactions.len());
        Ok(reactions)
    }

    /// MTMULT followed by a TAB1 yield
    fn create_yield_based(
        &self,
        sigp: &BlockReader,
        start: usize,
    ) -> CollisionResult<(NuclearReactionType, PhotonProductionKind)> {
        let base_reaction_type = NuclearReactionType::from_ace_value(sigp.value(start)?)?;
        let base = self.reactions.reaction(base_reaction_type)?;
        let (photon_yield, _) = read_tab1(sigp, start + 1)?;
        Ok((
            base_reaction_type,
            PhotonProductionKind::YieldBased {
                base_cross_section: base.cross_section_table().clone(),
                photon_yield: UnivariateDistribution::Tabular(photon_yield),
            },
        ))
    }

    /// IE (1-based), NE, then NE cross section values
    fn create_cross_section_based(
        &self,
        sigp: &BlockReader,
        start: usize,
        id: u32,
    ) -> CollisionResult<(NuclearReactionType, PhotonProductionKind)> {
        let base_reaction_type = NuclearReactionType::from_mt(id / 1000)?;
        let threshold_index = sigp.locator(start)?;
        let count = sigp.count(start + 1)?;
        let values = sigp.to_vec(start + 2, count)?;
        let cross_section = ReactionCrossSection::new(self.grids, GridId::PRIMARY, threshold_index, values)
            .map_err(|err| CollisionError::MalformedBlock {
                table: self.data.table_name.clone(),
                block: "SIGP",
                expected: format!("photon production cross section {} aligned to the energy grid", id),
                found: err.to_string(),
            })?;
        Ok((base_reaction_type, PhotonProductionKind::CrossSectionBased { cross_section }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ace::test_tables::hydrogen_like_table;
    use crate::grid::EnergyGrid;
    use approx::assert_relative_eq;

    fn with_photons(sigp: Vec<f64>, mtrp: Vec<f64>, lsigp: Vec<f64>) -> XssNeutronData {
        let mut data = hydrogen_like_table();
        data.mtrp = mtrp;
        data.lsigp = lsigp;
        data.sigp = sigp;
        data.ldlwp = vec![1.0; data.mtrp.len()];
        // law 2 line at 2.2 MeV
        data.dlwp = vec![0.0, 2.0, 10.0, 0.0, 2.0, 1e-11, 20.0, 1.0, 1.0, 0.0, 2.2];
        data
    }

    fn build(data: &XssNeutronData) -> CollisionResult<BTreeMap<u32, PhotonProductionReaction>> {
        let grids = GridArena::new(EnergyGrid::new(data.energy_grid.clone()).unwrap());
        let reactions = NuclearReactionAceFactory::new(data, &grids, 0.0).unwrap();
        PhotonProductionAceFactory::new(data, &grids, &reactions).create_reactions()
    }

    #[test]
    fn test_yield_and_cross_section_based_reactions() {
        let data = with_photons(
            vec![
                12.0, 102.0, 0.0, 2.0, 1e-11, 20.0, 2.0, 2.0, // capture yield of 2
                13.0, 3.0, 2.0, 1.0, 2.0, // tabulated from 10 MeV
            ],
            vec![102001.0, 16001.0],
            vec![1.0, 9.0],
        );
        let grids = GridArena::new(EnergyGrid::new(data.energy_grid.clone()).unwrap());
        let reactions = NuclearReactionAceFactory::new(&data, &grids, 0.0).unwrap();
        let photons = PhotonProductionAceFactory::new(&data, &grids, &reactions)
            .create_reactions()
            .unwrap();

        let capture_photon = &photons[&102001];
        assert_eq!(capture_photon.base_reaction_type(), NuclearReactionType::CAPTURE);
        assert_relative_eq!(capture_photon.cross_section(&grids, 1e-11), 2.0);
        assert_relative_eq!(capture_photon.cross_section(&grids, 20.0), 0.1);

        let n2n_photon = &photons[&16001];
        assert_eq!(n2n_photon.base_reaction_type(), NuclearReactionType::N2N);
        assert_eq!(n2n_photon.threshold_energy(&grids), 10.0);
        assert_relative_eq!(n2n_photon.cross_section(&grids, 15.0), 1.5);
    }

    #[test]
    fn test_unknown_base_reaction_is_reported() {
        let data = with_photons(
            vec![16.0, 107.0, 0.0, 2.0, 1e-11, 20.0, 1.0, 1.0],
            vec![107001.0],
            vec![1.0],
        );
        assert!(matches!(build(&data), Err(CollisionError::ReactionNotFound { mt: 107 })));
    }

    #[test]
    fn test_unsupported_mftype() {
        let data = with_photons(vec![14.0, 1.0, 4.0, 1.0, 1.0, 1.0, 1.0], vec![102001.0], vec![1.0]);
        assert!(matches!(
            build(&data),
            Err(CollisionError::UnsupportedData { block: "SIGP", .. })
        ));
    }
}
