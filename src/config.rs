use crate::errors::ConfigError;
use crate::units::UnitSystem;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub const DEFAULT_FILENAME: &str = "/var/tmp/filepile.txt";
pub const DEFAULT_UNIT_SYSTEM: &str = "METRICWX";

/// Top-level configuration document. Only the `FilePile` stanza is read;
/// other stanzas belong to the host and are ignored.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ServiceConfig {
    #[serde(rename = "FilePile", default)]
    pub file_pile: FilePileConfig,
}

/// The `FilePile` stanza as written in the configuration file.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FilePileConfig {
    #[serde(default = "default_filename")]
    pub filename: PathBuf,
    #[serde(default = "default_unit_system")]
    pub unit_system: String,
    #[serde(default)]
    pub label_map: HashMap<String, String>, // Incoming key -> canonical field name
    #[serde(default)]
    pub ignore_value_error: bool,
}

fn default_filename() -> PathBuf {
    PathBuf::from(DEFAULT_FILENAME)
}

fn default_unit_system() -> String {
    DEFAULT_UNIT_SYSTEM.to_string()
}

impl Default for FilePileConfig {
    fn default() -> Self {
        Self {
            filename: default_filename(),
            unit_system: default_unit_system(),
            label_map: HashMap::new(),
            ignore_value_error: false,
        }
    }
}

/// Validated, immutable settings the merger runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePileSettings {
    pub filename: PathBuf,
    pub unit_system: UnitSystem,
    pub label_map: HashMap<String, String>,
    pub ignore_value_error: bool,
}

impl FilePileSettings {
    /// Canonical name for an incoming key; unmapped keys pass through.
    pub fn canonical_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.label_map.get(key).map(String::as_str).unwrap_or(key)
    }
}

impl Default for FilePileSettings {
    fn default() -> Self {
        Self {
            filename: default_filename(),
            unit_system: UnitSystem::MetricWx,
            label_map: HashMap::new(),
            ignore_value_error: false,
        }
    }
}

impl TryFrom<FilePileConfig> for FilePileSettings {
    type Error = ConfigError;

    fn try_from(config: FilePileConfig) -> Result<Self, Self::Error> {
        let unit_system: UnitSystem = config.unit_system.parse()?;
        Ok(Self {
            filename: config.filename,
            unit_system,
            label_map: config.label_map,
            ignore_value_error: config.ignore_value_error,
        })
    }
}

// Function to load the configuration from the JSON file
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let reader = BufReader::new(file);

    let config: ServiceConfig =
        serde_json::from_reader(reader).map_err(|e| ConfigError::JsonParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Loads and validates the `FilePile` stanza. With no path, defaults are used.
pub fn load_settings(path: Option<&Path>) -> Result<FilePileSettings, ConfigError> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    FilePileSettings::try_from(config.file_pile)
}
