// Nuclide: every reaction of one isotope at one temperature
//
// Reactions are split into scattering, absorption and miscellaneous maps.
// Total and absorption cross sections are summed once on the primary grid
// at construction so collision-time lookups are a single interpolation.
// Below the S(alpha,beta) join they are summed per reaction instead.

use crate::bank::ParticleBank;
use crate::error::{CollisionError, CollisionResult};
use crate::grid::{GridArena, GridId, ReactionCrossSection};
use crate::particle::ParticleState;
use crate::photon_production::PhotonProductionReaction;
use crate::reaction::NuclearReaction;
use crate::reaction_type::NuclearReactionType;
use once_cell::sync::Lazy;
use rand::{Rng, RngCore};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

/// Reaction types treated as absorption unless a run overrides the set:
/// radiative capture, charged-particle emission and fission.
pub static DEFAULT_ABSORPTION_REACTION_TYPES: Lazy<BTreeSet<NuclearReactionType>> = Lazy::new(|| {
    [
        102u32, 103, 104, 105, 106, 107, 108, 109, 111, 112, 113, 114, 115, 116, 117, 18, 19, 20,
        21, 38,
    ]
    .into_iter()
    .filter_map(|mt| NuclearReactionType::from_mt(mt).ok())
    .collect()
});

/// Reaction selection walks retried with a rescaled draw before giving up
pub const MAX_SAMPLING_ATTEMPTS: usize = 3;

/// Relative tolerance of the construction-time total cross section check
pub const TOTAL_CROSS_SECTION_TOLERANCE: f64 = 1e-8;

pub type ReactionMap = BTreeMap<NuclearReactionType, NuclearReaction>;

/// Identity of a nuclide derived from its ACE table name
#[derive(Debug, Clone, PartialEq)]
pub struct NuclideIdentity {
    /// Table name, e.g. "1001.70c"
    pub name: String,
    /// Digits of the table name, e.g. 100170
    pub id: u32,
    pub atomic_number: u32,
    pub atomic_mass_number: u32,
    pub isomer_number: u32,
    pub atomic_weight_ratio: f64,
    /// kT in MeV
    pub temperature: f64,
}

impl NuclideIdentity {
    /// Parse the ZAID part of `table_name` (ZZZAAA, with metastable states
    /// encoded as AAA + 300 + 100 m)
    pub fn from_table_name(
        table_name: &str,
        atomic_weight_ratio: f64,
        temperature: f64,
    ) -> CollisionResult<Self> {
        if !(atomic_weight_ratio > 0.0) {
            return Err(crate::error::contract_violation!(
                "{}: atomic weight ratio must be positive, found {}",
                table_name,
                atomic_weight_ratio
            ));
        }
        if !(temperature > 0.0) {
            return Err(crate::error::contract_violation!(
                "{}: temperature must be positive, found {}",
                table_name,
                temperature
            ));
        }

        let digits: String = table_name.chars().filter(|c| c.is_ascii_digit()).collect();
        let id = digits.parse::<u32>().map_err(|_| {
            crate::error::contract_violation!("table name '{}' does not contain a numeric id", table_name)
        })?;

        let zaid_text = table_name.split('.').next().unwrap_or(table_name);
        let zaid = zaid_text.trim().parse::<u32>().map_err(|_| {
            crate::error::contract_violation!("table name '{}' does not start with a ZAID", table_name)
        })?;
        let atomic_number = zaid / 1000;
        let (atomic_mass_number, isomer_number) = decode_mass_number(atomic_number, zaid % 1000);

        Ok(NuclideIdentity {
            name: table_name.to_string(),
            id,
            atomic_number,
            atomic_mass_number,
            isomer_number,
            atomic_weight_ratio,
            temperature,
        })
    }
}

fn decode_mass_number(atomic_number: u32, encoded: u32) -> (u32, u32) {
    if encoded <= 300 {
        return (encoded, 0);
    }
    for isomer in 1..=4 {
        let offset = 300 + 100 * isomer;
        if encoded < offset {
            break;
        }
        let mass = encoded - offset;
        if mass >= atomic_number && mass <= 3 * atomic_number + 10 {
            return (mass, isomer);
        }
    }
    (encoded.saturating_sub(400), 1)
}

/// One isotope at one temperature with all of its reactions
#[derive(Debug, Clone)]
pub struct Nuclide {
    identity: NuclideIdentity,
    grids: GridArena,
    scattering_reactions: ReactionMap,
    absorption_reactions: ReactionMap,
    miscellaneous_reactions: ReactionMap,
    total_reaction: ReactionCrossSection,
    total_absorption_reaction: ReactionCrossSection,
    /// Below this energy totals are summed per reaction; thermal reactions
    /// live on their own grids and the cache cannot represent them
    direct_sum_below: f64,
}

impl Nuclide {
    /// Re-bucket the raw reactions by `absorption_types` and build the cached
    /// totals.
    ///
    /// Scattering reactions whose type is in the absorption set move to the
    /// absorption map; absorption reactions whose type is not in the set
    /// move to the miscellaneous map.
    pub fn new(
        identity: NuclideIdentity,
        grids: GridArena,
        scattering_reactions: ReactionMap,
        absorption_reactions: ReactionMap,
        miscellaneous_reactions: ReactionMap,
        absorption_types: &BTreeSet<NuclearReactionType>,
    ) -> CollisionResult<Self> {
        if scattering_reactions.is_empty() && absorption_reactions.is_empty() {
            return Err(crate::error::contract_violation!(
                "{}: a nuclide needs at least one reaction",
                identity.name
            ));
        }

        let mut scattering = ReactionMap::new();
        let mut absorption = ReactionMap::new();
        let mut miscellaneous = miscellaneous_reactions;

        for (reaction_type, reaction) in scattering_reactions {
            if absorption_types.contains(&reaction_type) {
                absorption.insert(reaction_type, reaction);
            } else {
                scattering.insert(reaction_type, reaction);
            }
        }
        for (reaction_type, reaction) in absorption_reactions {
            if absorption_types.contains(&reaction_type) {
                absorption.insert(reaction_type, reaction);
            } else {
                log::debug!(
                    "{}: {} is not an absorption type for this run; treating as miscellaneous",
                    identity.name,
                    reaction_type
                );
                miscellaneous.insert(reaction_type, reaction);
            }
        }

        let total_absorption_reaction = NuclearReaction::summed_cross_section(&grids, absorption.values())?;
        let total_reaction =
            NuclearReaction::summed_cross_section(&grids, absorption.values().chain(scattering.values()))?;

        let direct_sum_below = direct_summation_limit(&grids, absorption.values().chain(scattering.values()));

        log::debug!(
            "{}: {} scattering, {} absorption and {} miscellaneous reactions",
            identity.name,
            scattering.len(),
            absorption.len(),
            miscellaneous.len()
        );

        Ok(Nuclide {
            identity,
            grids,
            scattering_reactions: scattering,
            absorption_reactions: absorption,
            miscellaneous_reactions: miscellaneous,
            total_reaction,
            total_absorption_reaction,
            direct_sum_below,
        })
    }

    pub fn identity(&self) -> &NuclideIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn id(&self) -> u32 {
        self.identity.id
    }

    pub fn atomic_number(&self) -> u32 {
        self.identity.atomic_number
    }

    pub fn atomic_mass_number(&self) -> u32 {
        self.identity.atomic_mass_number
    }

    pub fn isomer_number(&self) -> u32 {
        self.identity.isomer_number
    }

    pub fn atomic_weight_ratio(&self) -> f64 {
        self.identity.atomic_weight_ratio
    }

    pub fn temperature(&self) -> f64 {
        self.identity.temperature
    }

    pub fn grids(&self) -> &GridArena {
        &self.grids
    }

    pub fn scattering_reactions(&self) -> &ReactionMap {
        &self.scattering_reactions
    }

    pub fn absorption_reactions(&self) -> &ReactionMap {
        &self.absorption_reactions
    }

    pub fn miscellaneous_reactions(&self) -> &ReactionMap {
        &self.miscellaneous_reactions
    }

    pub fn reaction(&self, reaction_type: NuclearReactionType) -> Option<&NuclearReaction> {
        self.scattering_reactions
            .get(&reaction_type)
            .or_else(|| self.absorption_reactions.get(&reaction_type))
            .or_else(|| self.miscellaneous_reactions.get(&reaction_type))
    }

    /// Cached total cross section in barns
    #[inline]
    pub fn total_cross_section(&self, energy: f64) -> f64 {
        if energy < self.direct_sum_below {
            return self.total_cross_section_summed(energy);
        }
        self.total_reaction.evaluate(&self.grids, energy)
    }

    /// Cached total absorption cross section in barns
    #[inline]
    pub fn absorption_cross_section(&self, energy: f64) -> f64 {
        if energy < self.direct_sum_below {
            return self.absorption_cross_section_summed(energy);
        }
        self.total_absorption_reaction.evaluate(&self.grids, energy)
    }

    /// Total cross section re-summed over every reaction
    pub fn total_cross_section_summed(&self, energy: f64) -> f64 {
        self.absorption_cross_section_summed(energy)
            + self
                .scattering_reactions
                .values()
                .map(|reaction| reaction.cross_section(&self.grids, energy))
                .sum::<f64>()
    }

    /// Absorption cross section re-summed over the absorption reactions
    pub fn absorption_cross_section_summed(&self, energy: f64) -> f64 {
        self.absorption_reactions
            .values()
            .map(|reaction| reaction.cross_section(&self.grids, energy))
            .sum()
    }

    /// Cross section of one reaction type; totals are served from the cache
    pub fn reaction_cross_section(&self, energy: f64, reaction_type: NuclearReactionType) -> f64 {
        if reaction_type == NuclearReactionType::TOTAL {
            return self.total_cross_section(energy);
        }
        self.reaction(reaction_type)
            .map(|reaction| reaction.cross_section(&self.grids, energy))
            .unwrap_or(0.0)
    }

    /// 1 - absorption/total, clamped to [0, 1]; 1 where the total vanishes
    pub fn survival_probability(&self, energy: f64) -> f64 {
        let total = self.total_cross_section(energy);
        if total > 0.0 {
            (1.0 - self.absorption_cross_section(energy) / total).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Check the cached total against a tabulated total on the primary grid
    pub fn verify_total_cross_section(&self, tabulated_total: &[f64]) -> CollisionResult<()> {
        let energies = self.grids.primary().energies();
        if tabulated_total.len() != energies.len() {
            return Err(CollisionError::MalformedBlock {
                table: self.identity.name.clone(),
                block: "total cross section",
                expected: format!("{} values", energies.len()),
                found: format!("{} values", tabulated_total.len()),
            });
        }
        for (index, (energy, tabulated)) in energies.iter().zip(tabulated_total).enumerate() {
            let summed = self.total_reaction.value_at_grid_index(index);
            let scale = tabulated.abs().max(summed.abs());
            if scale > 0.0 && (summed - tabulated).abs() > TOTAL_CROSS_SECTION_TOLERANCE * scale {
                return Err(CollisionError::TotalCrossSectionMismatch {
                    table: self.identity.name.clone(),
                    energy: *energy,
                    summed,
                    tabulated: *tabulated,
                });
            }
        }
        Ok(())
    }

    /// Analogue collision: one draw picks absorption or scattering and the
    /// reaction within it. Absorption always leaves the particle gone.
    pub fn collide_analogue(
        &self,
        particle: &mut ParticleState,
        bank: &mut ParticleBank,
        rng: &mut dyn RngCore,
    ) -> CollisionResult<()> {
        let energy = particle.energy;
        let total = self.total_cross_section(energy);
        let absorption = self.absorption_cross_section(energy);
        let scaled = rng.gen::<f64>() * total;

        if scaled < absorption {
            let reaction = self.sample_reaction(&self.absorption_reactions, scaled, absorption, energy, "absorption")?;
            reaction.react(particle, bank, rng)?;
            particle.set_as_gone();
        } else {
            let scattering = total - absorption;
            let reaction = self.sample_reaction(
                &self.scattering_reactions,
                scaled - absorption,
                scattering,
                energy,
                "scattering",
            )?;
            reaction.react(particle, bank, rng)?;
        }
        Ok(())
    }

    /// Survival-biased collision: the weight absorbs the survival probability
    /// and only scattering reactions are sampled.
    pub fn collide_survival_bias(
        &self,
        particle: &mut ParticleState,
        bank: &mut ParticleBank,
        rng: &mut dyn RngCore,
    ) -> CollisionResult<()> {
        let energy = particle.energy;
        let total = self.total_cross_section(energy);
        let scattering = total - self.absorption_cross_section(energy);
        let survival = if total > 0.0 {
            (scattering / total).clamp(0.0, 1.0)
        } else {
            0.0
        };

        if survival <= 0.0 {
            particle.set_as_gone();
            return Ok(());
        }

        particle.multiply_weight(survival);
        let scaled = rng.gen::<f64>() * scattering;
        let reaction = self.sample_reaction(&self.scattering_reactions, scaled, scattering, energy, "scattering")?;
        reaction.react(particle, bank, rng)
    }

    fn sample_reaction<'a>(
        &self,
        reactions: &'a ReactionMap,
        scaled: f64,
        expected: f64,
        energy: f64,
        group: &'static str,
    ) -> CollisionResult<&'a NuclearReaction> {
        sample_from_cumulative(
            reactions.values(),
            |reaction| reaction.cross_section(&self.grids, energy),
            scaled,
            expected,
        )
        .map_err(|(attempts, scaled, summed)| CollisionError::SamplingExhausted {
            context: self.identity.name.clone(),
            group,
            energy,
            attempts,
            scaled,
            summed,
        })
    }
}

/// First primary grid energy strictly above every S(alpha,beta) cutoff and
/// every secondary grid; 0 when all reactions sit on the primary grid
fn direct_summation_limit<'a, I>(grids: &GridArena, reactions: I) -> f64
where
    I: Iterator<Item = &'a NuclearReaction>,
{
    let highest = reactions
        .filter_map(|reaction| {
            let table = reaction.cross_section_table();
            if table.grid_id() != GridId::PRIMARY {
                Some(table.max_energy(grids))
            } else {
                table.s_alpha_beta_cutoff()
            }
        })
        .fold(None, |highest: Option<f64>, energy| Some(highest.map_or(energy, |h| h.max(energy))));

    match highest {
        None => 0.0,
        Some(energy) => {
            let primary = grids.primary();
            primary
                .energies()
                .iter()
                .copied()
                .find(|&grid_energy| grid_energy > energy)
                .unwrap_or_else(|| primary.max_energy() * (1.0 + f64::EPSILON))
        }
    }
}

/// Cumulative threshold walk: the first item whose running sum exceeds
/// `scaled` wins. If the summed cross sections fall short of `expected`
/// (grid interpolation mismatch), the draw is rescaled by summed/expected
/// and the walk retried, at most `MAX_SAMPLING_ATTEMPTS` times.
///
/// On failure returns (attempts, last scaled draw, last sum).
pub(crate) fn sample_from_cumulative<'a, T, I, F>(
    items: I,
    mut cross_section: F,
    mut scaled: f64,
    mut expected: f64,
) -> Result<&'a T, (usize, f64, f64)>
where
    I: Iterator<Item = &'a T> + Clone,
    F: FnMut(&T) -> f64,
{
    let mut summed = 0.0;
    for attempt in 1..=MAX_SAMPLING_ATTEMPTS {
        summed = 0.0;
        for item in items.clone() {
            summed += cross_section(item);
            if scaled < summed {
                return Ok(item);
            }
        }
        if !(summed > 0.0) || !(expected > 0.0) || attempt == MAX_SAMPLING_ATTEMPTS {
            return Err((attempt, scaled, summed));
        }
        log::debug!(
            "reaction walk summed {} against expected {}; rescaling draw {}",
            summed,
            expected,
            scaled
        );
        scaled *= summed / expected;
        // later attempts compare against what the walk actually sums to
        expected = summed;
        if scaled >= summed {
            scaled = summed * (1.0 - f64::EPSILON);
        }
    }
    Err((MAX_SAMPLING_ATTEMPTS, scaled, summed))
}

/// Collision interface shared by plain and photon-producing nuclides
pub trait ScatteringCenter: Debug + Send + Sync {
    fn nuclide(&self) -> &Nuclide;

    fn total_cross_section(&self, energy: f64) -> f64 {
        self.nuclide().total_cross_section(energy)
    }

    fn absorption_cross_section(&self, energy: f64) -> f64 {
        self.nuclide().absorption_cross_section(energy)
    }

    fn reaction_cross_section(&self, energy: f64, reaction_type: NuclearReactionType) -> f64 {
        self.nuclide().reaction_cross_section(energy, reaction_type)
    }

    fn survival_probability(&self, energy: f64) -> f64 {
        self.nuclide().survival_probability(energy)
    }

    fn collide_analogue(
        &self,
        particle: &mut ParticleState,
        bank: &mut ParticleBank,
        rng: &mut dyn RngCore,
    ) -> CollisionResult<()>;

    fn collide_survival_bias(
        &self,
        particle: &mut ParticleState,
        bank: &mut ParticleBank,
        rng: &mut dyn RngCore,
    ) -> CollisionResult<()>;
}

impl ScatteringCenter for Nuclide {
    fn nuclide(&self) -> &Nuclide {
        self
    }

    fn collide_analogue(
        &self,
        particle: &mut ParticleState,
        bank: &mut ParticleBank,
        rng: &mut dyn RngCore,
    ) -> CollisionResult<()> {
        Nuclide::collide_analogue(self, particle, bank, rng)
    }

    fn collide_survival_bias(
        &self,
        particle: &mut ParticleState,
        bank: &mut ParticleBank,
        rng: &mut dyn RngCore,
    ) -> CollisionResult<()> {
        Nuclide::collide_survival_bias(self, particle, bank, rng)
    }
}

/// Nuclide that also emits production photons, sampled independently of the
/// neutron reaction that fires
#[derive(Debug, Clone)]
pub struct DecoupledPhotonProductionNuclide {
    nuclide: Nuclide,
    photon_production_reactions: BTreeMap<u32, PhotonProductionReaction>,
    total_photon_production: Vec<f64>,
}

impl DecoupledPhotonProductionNuclide {
    pub fn new(
        nuclide: Nuclide,
        photon_production_reactions: BTreeMap<u32, PhotonProductionReaction>,
    ) -> Self {
        let total_photon_production = nuclide
            .grids
            .primary()
            .energies()
            .iter()
            .map(|energy| {
                photon_production_reactions
                    .values()
                    .map(|reaction| reaction.cross_section(&nuclide.grids, *energy))
                    .sum()
            })
            .collect();

        DecoupledPhotonProductionNuclide {
            nuclide,
            photon_production_reactions,
            total_photon_production,
        }
    }

    pub fn photon_production_reactions(&self) -> &BTreeMap<u32, PhotonProductionReaction> {
        &self.photon_production_reactions
    }

    /// Total photon production cross section, interpolated from the values
    /// summed on the primary grid
    pub fn total_photon_production_cross_section(&self, energy: f64) -> f64 {
        let grid = self.nuclide.grids.primary();
        if energy < grid.min_energy() || energy > grid.max_energy() {
            return 0.0;
        }
        if grid.len() == 1 || energy == grid.max_energy() {
            return self.total_photon_production[grid.len() - 1];
        }
        let index = grid.lower_bin_index(energy);
        let energies = grid.energies();
        crate::utilities::interpolate_lin_lin(
            energies[index],
            energies[index + 1],
            self.total_photon_production[index],
            self.total_photon_production[index + 1],
            energy,
        )
    }

    pub fn photon_production_cross_section(&self, energy: f64, id: u32) -> f64 {
        self.photon_production_reactions
            .get(&id)
            .map(|reaction| reaction.cross_section(&self.nuclide.grids, energy))
            .unwrap_or(0.0)
    }

    /// Bank at most one production photon; one draw when any photon
    /// production is possible at this energy
    fn sample_photon_production(
        &self,
        particle: &ParticleState,
        bank: &mut ParticleBank,
        rng: &mut dyn RngCore,
    ) -> CollisionResult<()> {
        let energy = particle.energy;
        let total = self.total_photon_production_cross_section(energy);
        if !(total > 0.0) {
            return Ok(());
        }

        let scaled = rng.gen::<f64>() * total;
        let grids = &self.nuclide.grids;
        let reaction = sample_from_cumulative(
            self.photon_production_reactions.values(),
            |reaction| reaction.cross_section(grids, energy),
            scaled,
            total,
        )
        .map_err(|(attempts, scaled, summed)| CollisionError::SamplingExhausted {
            context: self.nuclide.identity.name.clone(),
            group: "photon production",
            energy,
            attempts,
            scaled,
            summed,
        })?;

        reaction.react(
            particle,
            grids,
            self.nuclide.total_cross_section(energy),
            bank,
            rng,
        );
        Ok(())
    }
}

impl ScatteringCenter for DecoupledPhotonProductionNuclide {
    fn nuclide(&self) -> &Nuclide {
        &self.nuclide
    }

    fn collide_analogue(
        &self,
        particle: &mut ParticleState,
        bank: &mut ParticleBank,
        rng: &mut dyn RngCore,
    ) -> CollisionResult<()> {
        self.sample_photon_production(particle, bank, rng)?;
        self.nuclide.collide_analogue(particle, bank, rng)
    }

    fn collide_survival_bias(
        &self,
        particle: &mut ParticleState,
        bank: &mut ParticleBank,
        rng: &mut dyn RngCore,
    ) -> CollisionResult<()> {
        self.sample_photon_production(particle, bank, rng)?;
        self.nuclide.collide_survival_bias(particle, bank, rng)
    }
}
