//! Biome configuration value objects
//!
//! Biomes are loaded once at startup and treated as immutable. The registry
//! keeps file order because biome scoring breaks ties by that order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{SimulationError, SimulationResult};

/// Inclusive range of an environmental parameter, normalized to 0..1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct EnvironmentRange {
    pub min: f64,
    pub max: f64,
}

impl EnvironmentRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// 1.0 inside the range, otherwise 1 - distance to the nearest edge.
    ///
    /// Not floored at zero, so far-out values score negative.
    pub fn fit(&self, value: f64) -> f64 {
        if self.contains(value) {
            1.0
        } else if value < self.min {
            1.0 - (self.min - value)
        } else {
            1.0 - (value - self.max)
        }
    }

    pub fn overlaps(&self, other: &EnvironmentRange) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}

impl From<(f64, f64)> for EnvironmentRange {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

impl From<EnvironmentRange> for (f64, f64) {
    fn from(range: EnvironmentRange) -> Self {
        (range.min, range.max)
    }
}

fn default_transition_difficulty() -> f64 {
    0.5
}

fn default_rarity() -> f64 {
    1.0
}

/// Environmental envelope and adjacency rules of one biome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomeConfig {
    pub id: String,
    pub name: String,
    pub temperature_range: EnvironmentRange,
    pub humidity_range: EnvironmentRange,
    pub elevation_range: EnvironmentRange,
    #[serde(default)]
    pub features: Vec<String>,
    /// Resource name to base abundance chance
    #[serde(default)]
    pub resources: BTreeMap<String, f64>,
    /// Biomes this one may border without remediation
    #[serde(default)]
    pub adjacent_biomes: Vec<String>,
    #[serde(default = "default_transition_difficulty")]
    pub transition_difficulty: f64,
    #[serde(default = "default_rarity")]
    pub rarity: f64,
    /// POI pool drawn from at mid elevations; empty means use the built-in pool
    #[serde(default)]
    pub poi_types: Vec<String>,
}

impl BiomeConfig {
    pub fn new(
        id: impl Into<String>,
        temperature_range: (f64, f64),
        humidity_range: (f64, f64),
        elevation_range: (f64, f64),
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            temperature_range: temperature_range.into(),
            humidity_range: humidity_range.into(),
            elevation_range: elevation_range.into(),
            features: Vec::new(),
            resources: BTreeMap::new(),
            adjacent_biomes: Vec::new(),
            transition_difficulty: default_transition_difficulty(),
            rarity: default_rarity(),
            poi_types: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_features(mut self, features: &[&str]) -> Self {
        self.features = features.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>, abundance: f64) -> Self {
        self.resources.insert(resource.into(), abundance);
        self
    }

    pub fn with_adjacent(mut self, biomes: &[&str]) -> Self {
        self.adjacent_biomes = biomes.iter().map(|b| b.to_string()).collect();
        self
    }

    pub fn with_transition_difficulty(mut self, difficulty: f64) -> Self {
        self.transition_difficulty = difficulty;
        self
    }

    pub fn with_rarity(mut self, rarity: f64) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn with_poi_types(mut self, poi_types: &[&str]) -> Self {
        self.poi_types = poi_types.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Weighted environmental score: 0.4 temperature, 0.3 humidity, 0.3 elevation
    pub fn score(&self, elevation: f64, temperature: f64, humidity: f64) -> f64 {
        let fit = 0.4 * self.temperature_range.fit(temperature)
            + 0.3 * self.humidity_range.fit(humidity)
            + 0.3 * self.elevation_range.fit(elevation);
        fit * self.rarity
    }

    pub fn allows_neighbor(&self, other: &str) -> bool {
        self.id == other || self.adjacent_biomes.iter().any(|b| b == other)
    }

    pub fn mean_resource_abundance(&self) -> f64 {
        if self.resources.is_empty() {
            return 0.0;
        }
        self.resources.values().sum::<f64>() / self.resources.len() as f64
    }

    fn validate(&self) -> SimulationResult<()> {
        if self.id.trim().is_empty() {
            return Err(SimulationError::configuration("biome id cannot be empty"));
        }
        for (label, range) in [
            ("temperature", self.temperature_range),
            ("humidity", self.humidity_range),
            ("elevation", self.elevation_range),
        ] {
            if !range.min.is_finite() || !range.max.is_finite() || range.min > range.max {
                return Err(SimulationError::configuration(format!(
                    "biome '{}' has an invalid {} range ({}, {})",
                    self.id, label, range.min, range.max
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.transition_difficulty) {
            return Err(SimulationError::configuration(format!(
                "biome '{}' transition_difficulty must lie in 0..1",
                self.id
            )));
        }
        if !self.rarity.is_finite() || self.rarity <= 0.0 {
            return Err(SimulationError::configuration(format!(
                "biome '{}' rarity must be positive",
                self.id
            )));
        }
        Ok(())
    }
}

/// Ordered set of biome configs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BiomeConfig>", into = "Vec<BiomeConfig>")]
pub struct BiomeRegistry {
    biomes: Vec<BiomeConfig>,
}

impl BiomeRegistry {
    pub fn new(biomes: Vec<BiomeConfig>) -> SimulationResult<Self> {
        if biomes.is_empty() {
            return Err(SimulationError::configuration("biome registry is empty"));
        }
        for (index, biome) in biomes.iter().enumerate() {
            biome.validate()?;
            if biomes[..index].iter().any(|b| b.id == biome.id) {
                return Err(SimulationError::configuration(format!(
                    "duplicate biome id '{}'",
                    biome.id
                )));
            }
        }
        for biome in &biomes {
            for adjacent in &biome.adjacent_biomes {
                if !biomes.iter().any(|b| &b.id == adjacent) {
                    tracing::warn!(
                        biome = %biome.id,
                        adjacent = %adjacent,
                        "biome lists an unknown adjacent biome"
                    );
                }
            }
        }
        Ok(Self { biomes })
    }

    pub fn get(&self, id: &str) -> Option<&BiomeConfig> {
        self.biomes.iter().find(|b| b.id == id)
    }

    /// Position in registry order, used for deterministic tie-breaks
    pub fn position(&self, id: &str) -> Option<usize> {
        self.biomes.iter().position(|b| b.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BiomeConfig> {
        self.biomes.iter()
    }

    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }
}

impl TryFrom<Vec<BiomeConfig>> for BiomeRegistry {
    type Error = SimulationError;

    fn try_from(biomes: Vec<BiomeConfig>) -> Result<Self, Self::Error> {
        Self::new(biomes)
    }
}

impl From<BiomeRegistry> for Vec<BiomeConfig> {
    fn from(registry: BiomeRegistry) -> Self {
        registry.biomes
    }
}

impl Default for BiomeRegistry {
    fn default() -> Self {
        let biomes = vec![
            BiomeConfig::new("ocean", (0.0, 1.0), (0.8, 1.0), (0.0, 0.15))
                .with_name("Ocean")
                .with_features(&["deep_water", "reefs"])
                .with_resource("fish", 0.9)
                .with_resource("salt", 0.5)
                .with_adjacent(&["coastal", "swamp"])
                .with_transition_difficulty(0.9)
                .with_rarity(0.9),
            BiomeConfig::new("coastal", (0.4, 0.8), (0.6, 1.0), (0.0, 0.2))
                .with_name("Coastal")
                .with_features(&["beaches", "cliffs", "tidal_pools"])
                .with_resource("fish", 0.9)
                .with_resource("fresh_water", 0.6)
                .with_resource("stone", 0.5)
                .with_adjacent(&["ocean", "plains", "forest", "swamp"])
                .with_transition_difficulty(0.4)
                .with_rarity(0.8),
            BiomeConfig::new("plains", (0.5, 0.8), (0.3, 0.6), (0.0, 0.4))
                .with_name("Plains")
                .with_features(&["open_plains", "wildflowers", "gentle_hills"])
                .with_resource("fertile_soil", 0.9)
                .with_resource("game", 0.8)
                .with_resource("herbs", 0.5)
                .with_adjacent(&["forest", "coastal", "hills", "desert", "swamp"])
                .with_transition_difficulty(0.2),
            BiomeConfig::new("forest", (0.3, 0.7), (0.5, 0.9), (0.1, 0.6))
                .with_name("Temperate Forest")
                .with_features(&["dense_canopy", "wildlife", "streams"])
                .with_resource("timber", 0.9)
                .with_resource("herbs", 0.6)
                .with_resource("game", 0.7)
                .with_adjacent(&["plains", "hills", "swamp", "coastal", "tundra"])
                .with_transition_difficulty(0.3),
            BiomeConfig::new("hills", (0.3, 0.7), (0.3, 0.7), (0.4, 0.75))
                .with_name("Hills")
                .with_features(&["rolling_hills", "outcrops"])
                .with_resource("stone", 0.7)
                .with_resource("copper", 0.4)
                .with_resource("game", 0.5)
                .with_adjacent(&["plains", "forest", "mountains", "desert", "tundra"])
                .with_transition_difficulty(0.4),
            BiomeConfig::new("mountains", (0.1, 0.5), (0.3, 0.7), (0.7, 1.0))
                .with_name("Mountains")
                .with_features(&["peaks", "caves", "mineral_veins"])
                .with_resource("stone", 0.9)
                .with_resource("iron", 0.7)
                .with_resource("gems", 0.3)
                .with_adjacent(&["hills", "tundra"])
                .with_transition_difficulty(0.85)
                .with_rarity(0.9),
            BiomeConfig::new("desert", (0.7, 1.0), (0.0, 0.2), (0.0, 0.4))
                .with_name("Desert")
                .with_features(&["dunes", "oases", "rock_formations"])
                .with_resource("stone", 0.7)
                .with_resource("gems", 0.4)
                .with_resource("gold", 0.2)
                .with_adjacent(&["plains", "hills"])
                .with_transition_difficulty(0.85)
                .with_rarity(0.8),
            BiomeConfig::new("tundra", (0.0, 0.3), (0.2, 0.6), (0.2, 0.8))
                .with_name("Tundra")
                .with_features(&["permafrost", "lichen_fields"])
                .with_resource("furs", 0.6)
                .with_resource("stone", 0.4)
                .with_adjacent(&["mountains", "hills", "forest"])
                .with_transition_difficulty(0.7)
                .with_rarity(0.8),
            BiomeConfig::new("swamp", (0.5, 0.9), (0.8, 1.0), (0.0, 0.25))
                .with_name("Swamp")
                .with_features(&["bogs", "mangroves", "mist"])
                .with_resource("herbs", 0.8)
                .with_resource("peat", 0.6)
                .with_adjacent(&["forest", "plains", "coastal", "ocean"])
                .with_transition_difficulty(0.6)
                .with_rarity(0.7),
        ];
        Self { biomes }
    }
}
