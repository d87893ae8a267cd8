//! Application configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `visual_dm.toml` in the working directory, then `VISUAL_DM__*`
//! environment variables (`VISUAL_DM__WORLD__SEED=7` sets `world.seed`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{SimulationSettings, WorldConfig};

const CONFIG_FILE: &str = "visual_dm";
const ENV_PREFIX: &str = "VISUAL_DM";

/// Database URL that selects the in-memory store instead of SQLite
pub const MEMORY_DATABASE: &str = "memory";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite URL, or "memory" for a store that lives only as long as the process
    pub database_url: String,
    /// Directory holding tension_config.json, biomes.json and poi_type_mapping.json
    pub data_dir: PathBuf,
    /// Seconds between world ticks
    pub tick_interval_secs: u64,
    pub world: WorldConfig,
    pub simulation: SimulationSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://visual_dm.db".to_string(),
            data_dir: PathBuf::from("data"),
            tick_interval_secs: 60,
            world: WorldConfig::default(),
            simulation: SimulationSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `visual_dm.toml` and the environment
    pub fn load() -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Parse configuration from TOML text, without consulting the environment
    pub fn from_toml(text: &str) -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE
    }
}
