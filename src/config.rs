use std::{collections::BTreeMap, path::{Path, PathBuf}};

use anyhow::{anyhow, bail, ensure, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    cache::fingerprint_of,
    combine::HALF_LIFE_DAYS,
    common,
    election::Election,
    party::{PartyAliases, PartyValueSeries},
};

fn default_half_life() -> f64 { HALF_LIFE_DAYS }

/// Name of the folded entry next to election and key entries in combined
/// output; no election, party or axis may use it.
const RESERVED_KEY: &str = "summary";

fn default_population_field() -> String { "POP".into() }

fn default_axes() -> Vec<String> { vec!["lrecon".into(), "galtan".into()] }

/// Location of an election's results in the election authority's static API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrkSource {
    /// Election directory, e.g. "1104/1/".
    pub dir: String,
    /// Results id within the directory, e.g. "1746".
    pub id: String,
}

/// Static inputs of one election.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionConfig {
    pub date: NaiveDate,
    /// District boundary shapefile.
    pub shapes: PathBuf,
    /// Attribute fields joined into the district id.
    pub id_fields: Vec<String>,
    /// PROJ.4 CRS of the shapefile, if it differs from the common CRS.
    #[serde(default)]
    pub proj4: Option<String>,
    #[serde(default)]
    pub vrk: Option<VrkSource>,
    /// Published party name → short party label.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Population grid shapefile and its population attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    pub path: PathBuf,
    #[serde(default = "default_population_field")]
    pub field: String,
    #[serde(default)]
    pub proj4: Option<String>,
}

/// Party position axes and their survey series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueConfig {
    #[serde(default = "default_axes")]
    pub axes: Vec<String>,
    #[serde(default)]
    pub series: PartyValueSeries,
}

impl Default for ValueConfig {
    fn default() -> Self { Self { axes: default_axes(), series: PartyValueSeries::default() } }
}

/// Run configuration: which elections to fold onto which target, and the
/// static tables the computation reads. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Election whose districts everything is reprojected onto.
    pub target: String,
    /// Source elections to reproject and combine, in order.
    pub elections: Vec<String>,
    #[serde(default = "default_half_life")]
    pub half_life_days: f64,
    /// Common PROJ.4 CRS all geometry is brought into before comparison.
    #[serde(default)]
    pub proj4: Option<String>,
    pub population: PopulationConfig,
    pub catalog: BTreeMap<String, ElectionConfig>,
    #[serde(default)]
    pub parties: PartyAliases,
    #[serde(default)]
    pub values: ValueConfig,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    base_dir: PathBuf,
}

impl Config {
    /// Load and validate a configuration file. Relative paths in it are
    /// resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        common::require_file_exists(path)?;
        let mut config: Config = common::read_json(path)?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        config.validate()
            .with_context(|| format!("Invalid configuration: {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate a configuration from JSON text.
    pub fn from_json_str(text: &str, base_dir: &Path) -> Result<Self> {
        let mut config: Config = serde_json::from_str(text).context("[config] failed to parse configuration")?;
        config.base_dir = base_dir.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    /// Check that every referenced election is described in the catalog.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.half_life_days > 0.0, "half_life_days must be positive, got {}", self.half_life_days);
        ensure!(!self.elections.is_empty(), "no source elections configured");

        for key in std::iter::once(&self.target).chain(&self.elections) {
            let Some(election) = self.catalog.get(key) else {
                bail!("election {key} is not in the catalog");
            };
            ensure!(!election.id_fields.is_empty(), "election {key} has no id fields");
        }

        let keys = self.catalog.keys().map(String::as_str)
            .chain(self.parties.keys())
            .chain(self.values.axes.iter().map(String::as_str));
        for key in keys {
            ensure!(key != RESERVED_KEY, "\"{RESERVED_KEY}\" is reserved and cannot name an election, party or axis");
        }
        Ok(())
    }

    /// Static inputs of an election.
    pub fn election_config(&self, key: &str) -> Result<&ElectionConfig> {
        self.catalog.get(key).ok_or_else(|| anyhow!("election {key} is not in the catalog"))
    }

    /// Election metadata by key.
    pub fn election(&self, key: &str) -> Result<Election> {
        Ok(Election::new(key, self.election_config(key)?.date))
    }

    /// The target election.
    pub fn target_election(&self) -> Result<Election> { self.election(&self.target) }

    /// Resolve a configured path against the configuration's directory.
    pub fn resolve(&self, path: &Path) -> PathBuf { common::resolve_path(&self.base_dir, path) }

    /// Hex SHA-256 of the configuration, identifying its inputs in cache keys.
    pub fn fingerprint(&self) -> Result<String> { fingerprint_of(self) }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    const CONFIG: &str = r#"{
        "target": "2024_LRS",
        "elections": ["2020_LRS"],
        "population": {"path": "grid/pop.shp"},
        "catalog": {
            "2024_LRS": {"date": "2024-10-13", "shapes": "2024/apylinkes.shp", "id_fields": ["apg_nr", "apl_nr", "pavad"]},
            "2020_LRS": {"date": "2020-10-11", "shapes": "/abs/2020.shp", "id_fields": ["Apg_nr", "Apl_nr", "Apl_pav"],
                         "vrk": {"dir": "1104/1/", "id": "1746"}}
        },
        "parties": [{"party": "TTS", "aliases": {"2020_LRS": ["CP-T"]}}],
        "values": {"series": {"TTS": {"2019": {"lrecon": -0.5, "galtan": 1.5}}}}
    }"#;

    #[test]
    fn parses_with_defaults() {
        let config = Config::from_json_str(CONFIG, Path::new("/data")).unwrap();
        assert_eq!(config.half_life_days, 1461.0);
        assert_eq!(config.population.field, "POP");
        assert_eq!(config.values.axes, vec!["lrecon", "galtan"]);
        assert_eq!(config.parties.len(), 1);
        assert!(config.values.series.contains("TTS"));
        assert_eq!(config.target_election().unwrap().year(), 2024);
        assert_eq!(config.election_config("2020_LRS").unwrap().vrk.as_ref().unwrap().id, "1746");
    }

    #[test]
    fn resolves_relative_paths() {
        let config = Config::from_json_str(CONFIG, Path::new("/data")).unwrap();
        let target = config.election_config("2024_LRS").unwrap();
        assert_eq!(config.resolve(&target.shapes), Path::new("/data/2024/apylinkes.shp"));
        let source = config.election_config("2020_LRS").unwrap();
        assert_eq!(config.resolve(&source.shapes), Path::new("/abs/2020.shp"));
    }

    #[test]
    fn unknown_elections_are_rejected() {
        let text = CONFIG.replace(r#""elections": ["2020_LRS"]"#, r#""elections": ["2019_EP"]"#);
        assert!(Config::from_json_str(&text, Path::new("/data")).is_err());
    }

    #[test]
    fn reserved_summary_key_is_rejected() {
        let party = CONFIG.replace(r#""party": "TTS""#, r#""party": "summary""#);
        assert!(Config::from_json_str(&party, Path::new("/data")).is_err());

        let election = CONFIG.replace("2020_LRS", "summary");
        assert!(Config::from_json_str(&election, Path::new("/data")).is_err());

        let axis = CONFIG.replace(r#""values": {"#, r#""values": {"axes": ["lrecon", "summary"], "#);
        assert!(Config::from_json_str(&axis, Path::new("/data")).is_err());
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = Config::from_json_str(CONFIG, Path::new("/data")).unwrap();
        let mut b = a.clone();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        b.half_life_days = 730.0;
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(a.fingerprint().unwrap().len(), 64);
    }
}
