// Thermal scattering reactions from S(alpha,beta) tables
//
// Construction is two-phase. `SAlphaBetaReactionBuilder::build` reads the
// thermal blocks into a draft whose cross sections end at the cutoff energy,
// the inelastic value there pinned to the free-atom elastic cross section.
// `SAlphaBetaDraft::finalize` then sets the cutoff on the standard elastic
// reaction and adds the thermal reactions to the scattering map. Both happen
// before the nuclide exists, so every reaction is immutable once shared.

use crate::ace::{BlockReader, SAlphaBetaData};
use crate::error::{CollisionError, CollisionResult};
use crate::grid::{EnergyGrid, GridArena, ReactionCrossSection};
use crate::nuclide::ReactionMap;
use crate::reaction::{NuclearReaction, ReactionKind};
use crate::reaction_type::NuclearReactionType;
use crate::s_alpha_beta::{
    CoherentElasticDistribution, DiscreteOutgoingState, IncoherentElasticDistribution,
    InelasticSAlphaBetaDistribution, OutgoingEnergyMode, SAlphaBetaDistribution,
};

/// Energies and values of one thermal cross section, cut at the cutoff
#[derive(Debug, Clone, PartialEq)]
struct ThermalTable {
    energies: Vec<f64>,
    values: Vec<f64>,
}

impl ThermalTable {
    /// Drop points at or above `cutoff` and close the table with
    /// `(cutoff, value)`
    fn truncated(mut self, cutoff: f64, value: f64) -> Self {
        let keep = self.energies.iter().take_while(|energy| **energy < cutoff).count();
        self.energies.truncate(keep);
        self.values.truncate(keep);
        self.energies.push(cutoff);
        self.values.push(value);
        self
    }

    /// Lin-lin value, held at the ends
    fn value_at(&self, energy: f64) -> f64 {
        let last = self.energies.len() - 1;
        if energy <= self.energies[0] {
            return self.values[0];
        }
        if energy >= self.energies[last] {
            return self.values[last];
        }
        crate::utilities::interpolate_linear(&self.energies, &self.values, energy)
    }
}

pub struct SAlphaBetaReactionBuilder<'a> {
    data: &'a SAlphaBetaData,
    cutoff_energy: Option<f64>,
}

impl<'a> SAlphaBetaReactionBuilder<'a> {
    /// `cutoff_energy` of None uses the top of the inelastic grid
    pub fn new(data: &'a SAlphaBetaData, cutoff_energy: Option<f64>) -> Self {
        SAlphaBetaReactionBuilder { data, cutoff_energy }
    }

    /// Read the thermal reactions, pushing their grids into `grids`.
    /// `standard_elastic` supplies the cross section at the cutoff.
    pub fn build(self, grids: &mut GridArena, standard_elastic: &NuclearReaction) -> CollisionResult<SAlphaBetaDraft> {
        let table = self.data.table_name.as_str();
        let itie = BlockReader::new(table, "ITIE", &self.data.itie);
        let inelastic_table = read_cross_section_table(&itie)?;

        let cutoff = self
            .cutoff_energy
            .unwrap_or(inelastic_table.energies[inelastic_table.energies.len() - 1]);
        if !(cutoff > inelastic_table.energies[0]) {
            return Err(crate::error::contract_violation!(
                "{}: S(a,b) cutoff {} must lie above the first thermal energy {}",
                table,
                cutoff,
                inelastic_table.energies[0]
            ));
        }

        let pinned = standard_elastic
            .cross_section_table()
            .evaluate_tabulated(grids, cutoff);
        let inelastic_distribution = self.read_inelastic_distribution(&inelastic_table.energies)?;
        let inelastic_table = inelastic_table.truncated(cutoff, pinned);
        let inelastic = self.create_reaction(
            grids,
            NuclearReactionType::S_ALPHA_BETA_INELASTIC,
            inelastic_table,
            SAlphaBetaDistribution::Inelastic(inelastic_distribution),
        )?;

        let elastic = if self.data.has_elastic_data() {
            let (elastic_table, distribution) = self.read_elastic()?;
            let closing_value = elastic_table.value_at(cutoff);
            Some(self.create_reaction(
                grids,
                NuclearReactionType::S_ALPHA_BETA_ELASTIC,
                elastic_table.truncated(cutoff, closing_value),
                distribution,
            )?)
        } else {
            None
        };

        log::info!(
            "{}: S(a,b) treatment below {:.6e} MeV ({} elastic data)",
            table,
            cutoff,
            if elastic.is_some() { "with" } else { "without" }
        );

        Ok(SAlphaBetaDraft {
            table_name: self.data.table_name.clone(),
            cutoff,
            inelastic,
            elastic,
        })
    }

    fn create_reaction(
        &self,
        grids: &mut GridArena,
        reaction_type: NuclearReactionType,
        table: ThermalTable,
        distribution: SAlphaBetaDistribution,
    ) -> CollisionResult<NuclearReaction> {
        let grid = grids.push(EnergyGrid::new(table.energies)?);
        let cross_section = ReactionCrossSection::new(grids, grid, 0, table.values)?;
        NuclearReaction::new(
            reaction_type,
            0.0,
            self.data.temperature,
            cross_section,
            ReactionKind::SAlphaBeta { distribution },
        )
    }

    /// ITXE: per incident energy, NIEB records of E' and NIL + 1 cosines
    fn read_inelastic_distribution(&self, incident_energies: &[f64]) -> CollisionResult<InelasticSAlphaBetaDistribution> {
        let itxe = BlockReader::new(&self.data.table_name, "ITXE", &self.data.itxe);
        let mode = match self.data.ifeng {
            0 => OutgoingEnergyMode::Equiprobable,
            1 => OutgoingEnergyMode::Skewed,
            other => {
                return Err(itxe.unsupported(format!("inelastic outgoing energy mode IFENG = {}", other)));
            }
        };
        let bins = non_negative(&itxe, "NIEB", self.data.nieb)?;
        let cosines = non_negative(&itxe, "NIL", self.data.nil)? + 1;
        let record = cosines + 1;

        let mut outgoing = Vec::with_capacity(incident_energies.len());
        let mut cursor = 0;
        for _ in incident_energies {
            let mut states = Vec::with_capacity(bins);
            for _ in 0..bins {
                states.push(DiscreteOutgoingState {
                    energy: itxe.value(cursor)?,
                    cosines: itxe.to_vec(cursor + 1, cosines)?,
                });
                cursor += record;
            }
            outgoing.push(states);
        }
        InelasticSAlphaBetaDistribution::new(mode, incident_energies.to_vec(), outgoing)
    }

    /// ITCE (and ITCA for incoherent data)
    fn read_elastic(&self) -> CollisionResult<(ThermalTable, SAlphaBetaDistribution)> {
        let table = self.data.table_name.as_str();
        let itce = BlockReader::new(table, "ITCE", &self.data.itce);
        let elastic_table = read_cross_section_table(&itce)?;

        if self.data.is_coherent_elastic() {
            // P(E) cumulative structure factors: sigma = P/E
            let values = elastic_table
                .energies
                .iter()
                .zip(&elastic_table.values)
                .map(|(energy, factor)| factor / energy)
                .collect();
            let distribution =
                CoherentElasticDistribution::new(elastic_table.energies.clone(), elastic_table.values.clone())?;
            Ok((
                ThermalTable {
                    energies: elastic_table.energies,
                    values,
                },
                SAlphaBetaDistribution::CoherentElastic(distribution),
            ))
        } else {
            let itca = BlockReader::new(table, "ITCA", &self.data.itca);
            let count = non_negative(&itca, "NCL", self.data.ncl)? + 1;
            let cosines = (0..elastic_table.energies.len())
                .map(|i| itca.to_vec(i * count, count))
                .collect::<CollisionResult<Vec<_>>>()?;
            let distribution = IncoherentElasticDistribution::new(elastic_table.energies.clone(), cosines)?;
            Ok((elastic_table, SAlphaBetaDistribution::IncoherentElastic(distribution)))
        }
    }
}

/// NE, E(NE), values(NE)
fn read_cross_section_table(block: &BlockReader) -> CollisionResult<ThermalTable> {
    let count = block.count(0)?;
    if count == 0 {
        return Err(block.malformed("at least one thermal energy", "0"));
    }
    Ok(ThermalTable {
        energies: block.to_vec(1, count)?,
        values: block.to_vec(1 + count, count)?,
    })
}

fn non_negative(block: &BlockReader, name: &str, value: i64) -> CollisionResult<usize> {
    usize::try_from(value).map_err(|_| block.malformed(format!("a non-negative {}", name), value.to_string()))
}

/// Thermal reactions waiting to be joined to the free-atom data
#[derive(Debug, Clone)]
pub struct SAlphaBetaDraft {
    table_name: String,
    cutoff: f64,
    inelastic: NuclearReaction,
    elastic: Option<NuclearReaction>,
}

impl SAlphaBetaDraft {
    pub fn cutoff_energy(&self) -> f64 {
        self.cutoff
    }

    /// Set the cutoff on the standard elastic reaction and move the thermal
    /// reactions into `scattering`. Returns the cutoff energy.
    pub fn finalize(self, scattering: &mut ReactionMap) -> CollisionResult<f64> {
        let standard = scattering
            .get_mut(&NuclearReactionType::ELASTIC)
            .ok_or(CollisionError::ReactionNotFound {
                mt: NuclearReactionType::ELASTIC.mt(),
            })?;
        standard.cross_section_table_mut().set_s_alpha_beta_cutoff(self.cutoff);

        log::debug!(
            "{}: standard elastic scattering disabled below {:.6e} MeV",
            self.table_name,
            self.cutoff
        );
        scattering.insert(NuclearReactionType::S_ALPHA_BETA_INELASTIC, self.inelastic);
        if let Some(elastic) = self.elastic {
            scattering.insert(NuclearReactionType::S_ALPHA_BETA_ELASTIC, elastic);
        }
        Ok(self.cutoff)
    }
}
