//! Simulation data files under `data_dir`
//!
//! A missing file falls back to the built-in tables with a warning; a file
//! that exists but does not parse or validate is a configuration error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::domain::errors::{SimulationError, SimulationResult};
use crate::domain::services::PoiTypeClassifier;
use crate::domain::value_objects::{BiomeRegistry, TensionConfigRegistry};

pub const TENSION_CONFIG_FILE: &str = "tension_config.json";
pub const BIOMES_FILE: &str = "biomes.json";
pub const POI_TYPE_MAPPING_FILE: &str = "poi_type_mapping.json";

/// Everything loaded from the data directory
#[derive(Debug, Clone)]
pub struct SimulationData {
    pub tension_configs: TensionConfigRegistry,
    pub biomes: BiomeRegistry,
    pub poi_types: PoiTypeClassifier,
}

impl SimulationData {
    pub fn load(data_dir: &Path) -> SimulationResult<Self> {
        let tension_configs =
            load_or_default(&data_dir.join(TENSION_CONFIG_FILE), TensionConfigRegistry::default)?;
        let biomes = load_or_default(&data_dir.join(BIOMES_FILE), BiomeRegistry::default)?;
        let mapping: BTreeMap<String, String> =
            load_or_default(&data_dir.join(POI_TYPE_MAPPING_FILE), || {
                PoiTypeClassifier::default().mapping().clone()
            })?;

        info!(
            data_dir = %data_dir.display(),
            tension_categories = tension_configs.categories().count(),
            biomes = biomes.len(),
            poi_types = mapping.len(),
            "Loaded simulation data"
        );
        Ok(Self {
            tension_configs,
            biomes,
            poi_types: PoiTypeClassifier::new(mapping),
        })
    }
}

fn load_or_default<T: DeserializeOwned>(path: &Path, default: impl FnOnce() -> T) -> SimulationResult<T> {
    if !path.exists() {
        warn!(path = %path.display(), "Data file not found, using built-in defaults");
        return Ok(default());
    }
    let text = std::fs::read_to_string(path).map_err(|e| {
        SimulationError::configuration(format!("cannot read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&text).map_err(|e| {
        SimulationError::configuration(format!("invalid {}: {}", display_name(path), e))
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
