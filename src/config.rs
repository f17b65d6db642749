// Global configuration for nuclear data loading and collision physics
use crate::error::CollisionResult;
use crate::reaction_type::NuclearReactionType;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// Global configuration for table file paths and simulation properties
pub static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::new()));

/// Which particles a run transports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleMode {
    #[default]
    Neutron,
    NeutronPhoton,
}

/// Run-wide switches consulted by the nuclide factories.
///
/// Every field has a default, so a JSON document only needs to name the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationProperties {
    pub particle_mode: ParticleMode,
    /// Probability tables are not implemented; requesting them logs a
    /// warning and the smooth cross sections are used
    pub unresolved_resonance: bool,
    /// Build photon-production reactions in neutron-photon mode
    pub photon_production: bool,
    /// Reaction types counted as absorption; None selects the default set
    pub absorption_reaction_types: Option<BTreeSet<NuclearReactionType>>,
    /// Log-spaced hash bins for the primary grid search; 0 disables hashing
    pub hash_grid_bins: usize,
    /// Top of the S(alpha,beta) range in MeV; None uses the thermal grid top
    pub s_alpha_beta_cutoff_energy: Option<f64>,
    /// Elastic scattering below this energy (MeV) samples target motion
    pub free_gas_threshold: f64,
}

impl Default for SimulationProperties {
    fn default() -> Self {
        SimulationProperties {
            particle_mode: ParticleMode::Neutron,
            unresolved_resonance: false,
            photon_production: true,
            absorption_reaction_types: None,
            hash_grid_bins: 1000,
            s_alpha_beta_cutoff_energy: None,
            // 400 kT at 293.6 K
            free_gas_threshold: 400.0 * 8.617333262e-11 * 293.6,
        }
    }
}

impl SimulationProperties {
    pub fn from_json_str(json: &str) -> CollisionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> CollisionResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Photon-production reactions are only built when photons are
    /// transported and the data was requested
    pub fn wants_photon_production(&self) -> bool {
        self.photon_production && self.particle_mode == ParticleMode::NeutronPhoton
    }

    pub fn absorption_types(&self) -> BTreeSet<NuclearReactionType> {
        self.absorption_reaction_types
            .clone()
            .unwrap_or_else(|| crate::nuclide::DEFAULT_ABSORPTION_REACTION_TYPES.clone())
    }
}

/// Global configuration container.
///
/// Maps ACE table names (e.g. "1001.70c") to the JSON files holding their
/// extracted blocks, with an optional directory searched as
/// `<dir>/<table>.json` when a table has no explicit entry. A single
/// instance is exposed via [`Config::global`].
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Map of table name -> path to its JSON data file
    pub cross_sections: HashMap<String, PathBuf>,
    /// Directory used for tables without an explicit path
    pub default_directory: Option<PathBuf>,
    pub properties: SimulationProperties,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    /// Set the data file for one table, or the fallback directory when no
    /// table name is given
    pub fn set_cross_section(&mut self, table_name: Option<&str>, path: impl Into<PathBuf>) {
        match table_name {
            Some(name) => {
                self.cross_sections.insert(name.to_string(), path.into());
            }
            None => self.default_directory = Some(path.into()),
        }
    }

    /// Data file for a table, falling back to the default directory
    pub fn get_cross_section(&self, table_name: &str) -> Option<PathBuf> {
        self.cross_sections.get(table_name).cloned().or_else(|| {
            self.default_directory
                .as_ref()
                .map(|dir| dir.join(format!("{}.json", table_name)))
        })
    }

    /// Set multiple table paths at once, or a fallback directory
    pub fn set_cross_sections<T>(&mut self, input: T)
    where
        T: IntoCrossSectionsInput,
    {
        input.apply(self);
    }

    pub fn clear(&mut self) {
        self.cross_sections.clear();
        self.default_directory = None;
        self.properties = SimulationProperties::default();
    }

    /// Get the global configuration instance
    pub fn global() -> std::sync::MutexGuard<'static, Self> {
        CONFIG
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Flexible input accepted by [`Config::set_cross_sections`]
pub trait IntoCrossSectionsInput {
    fn apply(self, config: &mut Config);
}

impl IntoCrossSectionsInput for HashMap<String, String> {
    fn apply(self, config: &mut Config) {
        for (table, path) in self {
            config.cross_sections.insert(table, PathBuf::from(path));
        }
    }
}

/// A bare path names the fallback directory
impl IntoCrossSectionsInput for &str {
    fn apply(self, config: &mut Config) {
        config.default_directory = Some(PathBuf::from(self));
    }
}

impl IntoCrossSectionsInput for String {
    fn apply(self, config: &mut Config) {
        IntoCrossSectionsInput::apply(self.as_str(), config);
    }
}
