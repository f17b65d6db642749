// Nuclide construction from ACE neutron (and optional S(alpha,beta)) tables
use crate::ace::{SAlphaBetaData, XssNeutronData};
use crate::ace_factory::NuclearReactionAceFactory;
use crate::config::{Config, SimulationProperties};
use crate::error::{CollisionError, CollisionResult};
use crate::grid::{EnergyGrid, GridArena};
use crate::nuclide::{DecoupledPhotonProductionNuclide, Nuclide, NuclideIdentity, ReactionMap, ScatteringCenter};
use crate::photon_production::PhotonProductionReaction;
use crate::photon_production_factory::PhotonProductionAceFactory;
use crate::reaction_type::NuclearReactionType;
use crate::s_alpha_beta_factory::SAlphaBetaReactionBuilder;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex};

// Nuclides already built, keyed by table names and data paths
static GLOBAL_NUCLIDE_CACHE: Lazy<Mutex<HashMap<String, Arc<dyn ScatteringCenter>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Clear the global nuclide cache (used by tests to force reloading)
pub fn clear_nuclide_cache() {
    match GLOBAL_NUCLIDE_CACHE.lock() {
        Ok(mut cache) => cache.clear(),
        Err(poisoned) => poisoned.into_inner().clear(),
    }
}

/// Builds immutable nuclides from extracted ACE tables under one set of
/// simulation properties
#[derive(Debug, Clone, Copy)]
pub struct NuclideAceFactory<'a> {
    properties: &'a SimulationProperties,
}

impl<'a> NuclideAceFactory<'a> {
    pub fn new(properties: &'a SimulationProperties) -> Self {
        NuclideAceFactory { properties }
    }

    /// Neutron-only nuclide; photon-production data is never read
    pub fn create_nuclide(&self, data: &XssNeutronData, thermal: Option<&SAlphaBetaData>) -> CollisionResult<Nuclide> {
        Ok(self.build(data, thermal, false)?.0)
    }

    /// Nuclide as the run's properties ask for it: photon-producing in
    /// neutron-photon mode when the table has photon data
    pub fn create_scattering_center(
        &self,
        data: &XssNeutronData,
        thermal: Option<&SAlphaBetaData>,
    ) -> CollisionResult<Arc<dyn ScatteringCenter>> {
        let wants_photons = self.properties.wants_photon_production();
        if wants_photons && !data.has_photon_production_data() {
            log::warn!(
                "{}: photon production requested but the table has no photon production data",
                data.table_name
            );
        }
        let (nuclide, photons) = self.build(data, thermal, wants_photons)?;
        Ok(match photons {
            Some(photons) => Arc::new(DecoupledPhotonProductionNuclide::new(nuclide, photons)),
            None => Arc::new(nuclide),
        })
    }

    fn build(
        &self,
        data: &XssNeutronData,
        thermal: Option<&SAlphaBetaData>,
        with_photons: bool,
    ) -> CollisionResult<(Nuclide, Option<BTreeMap<u32, PhotonProductionReaction>>)> {
        data.validate_esz()?;
        let identity = NuclideIdentity::from_table_name(&data.table_name, data.atomic_weight_ratio, data.temperature)?;

        if data.has_unresolved_resonance_data() && self.properties.unresolved_resonance {
            log::warn!(
                "{}: unresolved resonance probability tables are not supported; using smooth cross sections",
                data.table_name
            );
        }

        let mut grid = EnergyGrid::new(data.energy_grid.clone())?;
        if self.properties.hash_grid_bins > 0 && grid.len() > 1 {
            grid = grid.with_hashed_search(self.properties.hash_grid_bins)?;
        }
        let mut grids = GridArena::new(grid);

        let reactions = NuclearReactionAceFactory::new(data, &grids, self.properties.free_gas_threshold)?;
        let photons = if with_photons && data.has_photon_production_data() {
            Some(PhotonProductionAceFactory::new(data, &grids, &reactions).create_reactions()?)
        } else {
            None
        };

        let (mut scattering, mut absorption, fission) = reactions.into_reaction_maps();
        let miscellaneous = partition_fission_reactions(&data.table_name, fission, &mut absorption);

        if let Some(thermal) = thermal {
            let standard_elastic = scattering
                .get(&NuclearReactionType::ELASTIC)
                .ok_or(CollisionError::ReactionNotFound {
                    mt: NuclearReactionType::ELASTIC.mt(),
                })?;
            let draft = SAlphaBetaReactionBuilder::new(thermal, self.properties.s_alpha_beta_cutoff_energy)
                .build(&mut grids, standard_elastic)?;
            draft.finalize(&mut scattering)?;
        }

        let absorption_types = self.properties.absorption_types();
        let nuclide = Nuclide::new(identity, grids, scattering, absorption, miscellaneous, &absorption_types)?;

        // S(a,b) data and reclassified reactions change what the reactions sum to
        if thermal.is_none() && self.properties.absorption_reaction_types.is_none() {
            if let Err(err) = nuclide.verify_total_cross_section(&data.total_cross_section) {
                log::warn!("{}", err);
            }
        }

        log::info!(
            "built nuclide {} ({} scattering, {} absorption reactions{})",
            nuclide.name(),
            nuclide.scattering_reactions().len(),
            nuclide.absorption_reactions().len(),
            if photons.is_some() { ", photon production" } else { "" }
        );
        Ok((nuclide, photons))
    }
}

/// Fission reactions join the absorption group. When total fission (MT 18)
/// is present the partial-chance channels would double count it and are
/// returned as miscellaneous reactions instead.
fn partition_fission_reactions(table: &str, fission: ReactionMap, absorption: &mut ReactionMap) -> ReactionMap {
    let has_total_fission = fission.contains_key(&NuclearReactionType::FISSION);
    let mut miscellaneous = ReactionMap::new();
    for (reaction_type, reaction) in fission {
        if has_total_fission && reaction_type.is_partial_fission() {
            log::debug!("{}: {} kept out of sampling; total fission is present", table, reaction_type);
            miscellaneous.insert(reaction_type, reaction);
        } else {
            absorption.insert(reaction_type, reaction);
        }
    }
    miscellaneous
}

/// Load (or fetch from the cache) the nuclide for `table_name`, with an
/// optional S(alpha,beta) table, using the paths and properties in the
/// global [`Config`].
pub fn get_or_load_nuclide(
    table_name: &str,
    thermal_table_name: Option<&str>,
) -> CollisionResult<Arc<dyn ScatteringCenter>> {
    let (neutron_path, thermal_path, properties) = {
        let config = Config::global();
        let neutron_path = config
            .get_cross_section(table_name)
            .ok_or_else(|| CollisionError::MissingTable(table_name.to_string()))?;
        let thermal_path = thermal_table_name
            .map(|name| {
                config
                    .get_cross_section(name)
                    .ok_or_else(|| CollisionError::MissingTable(name.to_string()))
            })
            .transpose()?;
        (neutron_path, thermal_path, config.properties.clone())
    };

    let cache_key = cache_key(table_name, &neutron_path, thermal_path.as_deref());
    {
        let cache = match GLOBAL_NUCLIDE_CACHE.lock() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(existing) = cache.get(&cache_key) {
            return Ok(Arc::clone(existing));
        }
    }

    let data = XssNeutronData::from_file(&neutron_path)?;
    let thermal = thermal_path.map(SAlphaBetaData::from_file).transpose()?;
    let center = NuclideAceFactory::new(&properties).create_scattering_center(&data, thermal.as_ref())?;

    let mut cache = match GLOBAL_NUCLIDE_CACHE.lock() {
        Ok(cache) => cache,
        Err(poisoned) => poisoned.into_inner(),
    };
    Ok(Arc::clone(cache.entry(cache_key).or_insert(center)))
}

fn cache_key(table_name: &str, neutron_path: &Path, thermal_path: Option<&Path>) -> String {
    let normalize = |path: &Path| {
        std::fs::canonicalize(path)
            .unwrap_or_else(|_| path.to_path_buf())
            .to_string_lossy()
            .to_string()
    };
    match thermal_path {
        Some(thermal) => format!("{}@{}+{}", table_name, normalize(neutron_path), normalize(thermal)),
        None => format!("{}@{}", table_name, normalize(neutron_path)),
    }
}
