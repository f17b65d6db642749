// Reaction factory for continuous-energy ACE neutron tables
//
// Decodes the MTR/LQR/TYR/LSIG/SIG blocks into per-reaction Q-values,
// multiplicities, thresholds and cross sections, then builds scattering,
// absorption and fission reactions. Elastic scattering never appears in
// MTR and is added implicitly from the ESZ block.

use crate::ace::{BlockReader, XssNeutronData};
use crate::ace_distribution_factory::{
    create_delayed_emission, create_fission_multiplicity, ScatteringDistributionAceFactory,
};
use crate::distribution::{TabularDistribution, UnivariateDistribution};
use crate::error::{CollisionError, CollisionResult};
use crate::grid::{GridArena, GridId, ReactionCrossSection};
use crate::nuclide::ReactionMap;
use crate::reaction::{NuclearReaction, ReactionKind};
use crate::reaction_type::NuclearReactionType;
use crate::scattering::ReferenceFrame;
use std::collections::BTreeMap;
use std::sync::Arc;

/// TYR value marking fission reactions
const FISSION_MULTIPLICITY: u32 = 19;
/// TYR magnitudes above this point into DLW for an energy-dependent yield
const ENERGY_DEPENDENT_MULTIPLICITY_OFFSET: u32 = 100;

/// How many neutrons a reaction emits, decoded from TYR
#[derive(Debug, Clone, PartialEq)]
enum Multiplicity {
    Fixed(u32),
    Fission,
    EnergyDependent(UnivariateDistribution),
}

/// Everything the block tables say about one reaction
#[derive(Debug, Clone)]
struct ReactionRecord {
    /// Position in MTR; None for implicit elastic
    ordinal: Option<usize>,
    q_value: f64,
    multiplicity: Multiplicity,
    frame: ReferenceFrame,
    threshold_index: usize,
    cross_section: Vec<f64>,
}

/// Scattering, absorption and fission reactions of one ACE neutron table
#[derive(Debug, Clone)]
pub struct NuclearReactionAceFactory {
    scattering_reactions: ReactionMap,
    absorption_reactions: ReactionMap,
    fission_reactions: ReactionMap,
}

impl NuclearReactionAceFactory {
    /// Build every reaction of `data` on the primary grid of `grids`
    pub fn new(data: &XssNeutronData, grids: &GridArena, free_gas_threshold: f64) -> CollisionResult<Self> {
        let records = Self::create_reaction_records(data)?;
        let distributions = ScatteringDistributionAceFactory::new(data, free_gas_threshold);

        let fission_multiplicity = create_fission_multiplicity(data)?.map(Arc::new);
        let delayed_emission = create_delayed_emission(data)?.map(Arc::new);

        let mut factory = NuclearReactionAceFactory {
            scattering_reactions: ReactionMap::new(),
            absorption_reactions: ReactionMap::new(),
            fission_reactions: ReactionMap::new(),
        };

        for (reaction_type, record) in records {
            let cross_section =
                ReactionCrossSection::new(grids, GridId::PRIMARY, record.threshold_index, record.cross_section)
                    .map_err(|err| CollisionError::MalformedBlock {
                        table: data.table_name.clone(),
                        block: "SIG",
                        expected: format!("a cross section for {} aligned to the energy grid", reaction_type),
                        found: err.to_string(),
                    })?;

            let scattering_distribution = || match record.ordinal {
                None => distributions.create_elastic(),
                Some(ordinal) => distributions.create(reaction_type, ordinal, record.frame),
            };

            let (kind, target) = match record.multiplicity {
                Multiplicity::Fixed(0) => (ReactionKind::Absorption, &mut factory.absorption_reactions),
                Multiplicity::Fixed(multiplicity) => (
                    ReactionKind::Scattering {
                        multiplicity,
                        distribution: scattering_distribution()?,
                    },
                    &mut factory.scattering_reactions,
                ),
                Multiplicity::EnergyDependent(multiplicity) => (
                    ReactionKind::EnergyDependentScattering {
                        multiplicity,
                        distribution: scattering_distribution()?,
                    },
                    &mut factory.scattering_reactions,
                ),
                Multiplicity::Fission => {
                    let multiplicity = fission_multiplicity.clone().ok_or_else(|| CollisionError::MalformedBlock {
                        table: data.table_name.clone(),
                        block: "NU",
                        expected: format!("fission multiplicity data for {}", reaction_type),
                        found: "no NU block".to_string(),
                    })?;
                    let prompt = scattering_distribution()?;
                    let kind = match &delayed_emission {
                        Some(delayed) => ReactionKind::DetailedFission {
                            multiplicity,
                            prompt,
                            delayed: Arc::clone(delayed),
                        },
                        None => ReactionKind::Fission { multiplicity, prompt },
                    };
                    (kind, &mut factory.fission_reactions)
                }
            };

            let reaction = NuclearReaction::new(reaction_type, record.q_value, data.temperature, cross_section, kind)?;
            target.insert(reaction_type, reaction);
        }

        log::debug!(
            "{}: built {} scattering, {} absorption and {} fission reactions",
            data.table_name,
            factory.scattering_reactions.len(),
            factory.absorption_reactions.len(),
            factory.fission_reactions.len()
        );
        Ok(factory)
    }

    /// Decode MTR, LQR, TYR, LSIG and SIG into one record per reaction
    fn create_reaction_records(data: &XssNeutronData) -> CollisionResult<BTreeMap<NuclearReactionType, ReactionRecord>> {
        let table = data.table_name.as_str();
        let mtr = BlockReader::new(table, "MTR", &data.mtr);
        let lqr = BlockReader::new(table, "LQR", &data.lqr);
        let tyr = BlockReader::new(table, "TYR", &data.tyr);
        let lsig = BlockReader::new(table, "LSIG", &data.lsig);
        let sig = BlockReader::new(table, "SIG", &data.sig);
        let dlw = BlockReader::new(table, "DLW", &data.dlw);

        let mut records = BTreeMap::new();
        records.insert(
            NuclearReactionType::ELASTIC,
            ReactionRecord {
                ordinal: None,
                q_value: 0.0,
                multiplicity: Multiplicity::Fixed(1),
                frame: ReferenceFrame::CenterOfMass,
                threshold_index: 0,
                cross_section: data.elastic_cross_section.clone(),
            },
        );

        for ordinal in 0..mtr.len() {
            let reaction_type = NuclearReactionType::from_ace_value(mtr.value(ordinal)?)?;

            let raw_multiplicity = tyr.signed_integer(ordinal)?;
            let frame = if raw_multiplicity < 0 {
                ReferenceFrame::CenterOfMass
            } else {
                ReferenceFrame::Lab
            };
            let magnitude = raw_multiplicity.unsigned_abs() as u32;
            let multiplicity = if magnitude == FISSION_MULTIPLICITY {
                Multiplicity::Fission
            } else if magnitude > ENERGY_DEPENDENT_MULTIPLICITY_OFFSET {
                Multiplicity::EnergyDependent(Self::read_energy_dependent_multiplicity(
                    &dlw,
                    reaction_type,
                    (magnitude - ENERGY_DEPENDENT_MULTIPLICITY_OFFSET - 1) as usize,
                )?)
            } else {
                Multiplicity::Fixed(magnitude)
            };

            // LSIG and SIG hold 1-based FORTRAN indices
            let cross_section_index = lsig.locator(ordinal)?;
            let threshold_index = sig.locator(cross_section_index)?;
            let count = sig.count(cross_section_index + 1)?;
            let cross_section = sig.to_vec(cross_section_index + 2, count)?;

            records.insert(
                reaction_type,
                ReactionRecord {
                    ordinal: Some(ordinal),
                    q_value: lqr.value(ordinal)?,
                    multiplicity,
                    frame,
                    threshold_index,
                    cross_section,
                },
            );
        }
        Ok(records)
    }

    /// Yield table at `start` in DLW: NR, NE, E(NE), Y(NE) with NR = 0
    fn read_energy_dependent_multiplicity(
        dlw: &BlockReader,
        reaction_type: NuclearReactionType,
        start: usize,
    ) -> CollisionResult<UnivariateDistribution> {
        if dlw.integer(start)? != 0 {
            return Err(dlw.unsupported(format!(
                "multiple interpolation regions found for energy dependent multiplicities of {}",
                reaction_type
            )));
        }
        let count = dlw.count(start + 1)?;
        let energies = dlw.to_vec(start + 2, count)?;
        let yields = dlw.to_vec(start + 2 + count, count)?;
        Ok(UnivariateDistribution::Tabular(TabularDistribution::lin_lin(energies, yields)?))
    }

    pub fn scattering_reactions(&self) -> &ReactionMap {
        &self.scattering_reactions
    }

    pub fn absorption_reactions(&self) -> &ReactionMap {
        &self.absorption_reactions
    }

    pub fn fission_reactions(&self) -> &ReactionMap {
        &self.fission_reactions
    }

    /// Look a reaction up among absorption, scattering, then fission
    pub fn reaction(&self, reaction_type: NuclearReactionType) -> CollisionResult<&NuclearReaction> {
        self.absorption_reactions
            .get(&reaction_type)
            .or_else(|| self.scattering_reactions.get(&reaction_type))
            .or_else(|| self.fission_reactions.get(&reaction_type))
            .ok_or(CollisionError::ReactionNotFound { mt: reaction_type.mt() })
    }

    /// (scattering, absorption, fission)
    pub fn into_reaction_maps(self) -> (ReactionMap, ReactionMap, ReactionMap) {
        (self.scattering_reactions, self.absorption_reactions, self.fission_reactions)
    }
}
