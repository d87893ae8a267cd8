//! Tension configuration and classification value objects

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{SimulationError, SimulationResult};

/// Category every registry must define; unclassified locations resolve to it
pub const DEFAULT_CATEGORY: &str = "default";

/// Per-location-category tension parameters
///
/// Tension values live on a 0..1 scale. `decay_rate` is expressed per hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TensionConfig {
    pub base_tension: f64,
    pub decay_rate: f64,
    pub max_tension: f64,
    pub min_tension: f64,
    pub player_impact: f64,
    pub npc_impact: f64,
    pub environmental_impact: f64,
}

impl Default for TensionConfig {
    fn default() -> Self {
        Self::new(0.3, 0.04, 1.0, 0.1, 1.0, 1.0, 1.0)
    }
}

impl TensionConfig {
    pub const fn new(
        base_tension: f64,
        decay_rate: f64,
        max_tension: f64,
        min_tension: f64,
        player_impact: f64,
        npc_impact: f64,
        environmental_impact: f64,
    ) -> Self {
        Self {
            base_tension,
            decay_rate,
            max_tension,
            min_tension,
            player_impact,
            npc_impact,
            environmental_impact,
        }
    }

    /// Clamp a value into this category's bounds
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min_tension, self.max_tension)
    }

    /// Reject configs that would make clamping or decay meaningless
    pub fn validate(&self, category: &str) -> SimulationResult<()> {
        let values = [
            self.base_tension,
            self.decay_rate,
            self.max_tension,
            self.min_tension,
            self.player_impact,
            self.npc_impact,
            self.environmental_impact,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SimulationError::configuration(format!(
                "tension config '{}' contains a non-finite value",
                category
            )));
        }
        if self.min_tension >= self.max_tension {
            return Err(SimulationError::configuration(format!(
                "tension config '{}': min_tension ({}) must be below max_tension ({})",
                category, self.min_tension, self.max_tension
            )));
        }
        if self.decay_rate < 0.0 {
            return Err(SimulationError::configuration(format!(
                "tension config '{}': decay_rate cannot be negative",
                category
            )));
        }
        if self.player_impact < 0.0 || self.npc_impact < 0.0 || self.environmental_impact < 0.0 {
            return Err(SimulationError::configuration(format!(
                "tension config '{}': impact weights cannot be negative",
                category
            )));
        }
        if self.base_tension < self.min_tension || self.base_tension > self.max_tension {
            tracing::warn!(
                category,
                base_tension = self.base_tension,
                "base tension lies outside configured bounds and will be clamped"
            );
        }
        Ok(())
    }
}

/// Named tension configs, one per location category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, TensionConfig>", into = "BTreeMap<String, TensionConfig>")]
pub struct TensionConfigRegistry {
    configs: BTreeMap<String, TensionConfig>,
}

impl TensionConfigRegistry {
    pub fn new(configs: BTreeMap<String, TensionConfig>) -> SimulationResult<Self> {
        if !configs.contains_key(DEFAULT_CATEGORY) {
            return Err(SimulationError::configuration(
                "tension config registry is missing the 'default' category",
            ));
        }
        for (category, config) in &configs {
            config.validate(category)?;
        }
        Ok(Self { configs })
    }

    /// Config for a category, falling back to "default"
    pub fn resolve(&self, category: &str) -> &TensionConfig {
        self.configs
            .get(category)
            .or_else(|| self.configs.get(DEFAULT_CATEGORY))
            .unwrap_or(&FALLBACK_CONFIG)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.configs.contains_key(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }
}

// Only reachable if a registry was built without going through `new`.
static FALLBACK_CONFIG: TensionConfig = TensionConfig::new(0.3, 0.04, 1.0, 0.1, 1.0, 1.0, 1.0);

impl Default for TensionConfigRegistry {
    fn default() -> Self {
        let configs = [
            ("city", TensionConfig::new(0.2, 0.05, 1.0, 0.1, 1.5, 1.0, 0.5)),
            ("town", TensionConfig::new(0.15, 0.06, 0.9, 0.05, 1.2, 0.8, 0.6)),
            ("village", TensionConfig::new(0.1, 0.08, 0.8, 0.0, 1.0, 0.6, 0.8)),
            ("dungeon", TensionConfig::new(0.7, 0.02, 1.0, 0.5, 2.0, 1.5, 1.0)),
            ("ruins", TensionConfig::new(0.6, 0.03, 0.9, 0.4, 1.8, 1.3, 1.2)),
            ("wilderness", TensionConfig::new(0.4, 0.03, 1.0, 0.2, 1.0, 0.8, 2.0)),
            ("forest", TensionConfig::new(0.3, 0.04, 0.9, 0.1, 0.9, 0.7, 1.8)),
            ("mountains", TensionConfig::new(0.5, 0.025, 1.0, 0.3, 1.1, 0.9, 2.2)),
            ("swamp", TensionConfig::new(0.6, 0.02, 1.0, 0.4, 1.3, 1.1, 2.5)),
            ("coastal", TensionConfig::new(0.25, 0.05, 0.8, 0.1, 1.0, 0.9, 1.2)),
            (DEFAULT_CATEGORY, TensionConfig::default()),
        ];
        Self {
            configs: configs
                .into_iter()
                .map(|(name, config)| (name.to_string(), config))
                .collect(),
        }
    }
}

impl TryFrom<BTreeMap<String, TensionConfig>> for TensionConfigRegistry {
    type Error = SimulationError;

    fn try_from(configs: BTreeMap<String, TensionConfig>) -> Result<Self, Self::Error> {
        Self::new(configs)
    }
}

impl From<TensionConfigRegistry> for BTreeMap<String, TensionConfig> {
    fn from(registry: TensionConfigRegistry) -> Self {
        registry.configs
    }
}

/// Six-level classification of faction-pair tension on the -100..100 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensionLevel {
    Alliance,
    Friendly,
    Neutral,
    Rivalry,
    Hostile,
    War,
}

impl TensionLevel {
    /// Monotonic mapping from a tension value to its level
    ///
    /// Each band owns its inclusive upper edge, so a fractional value lands
    /// in the first band whose edge it does not exceed.
    pub fn from_value(tension: f64) -> Self {
        if tension <= -76.0 {
            Self::Alliance
        } else if tension <= -26.0 {
            Self::Friendly
        } else if tension <= 25.0 {
            Self::Neutral
        } else if tension <= 50.0 {
            Self::Rivalry
        } else if tension <= 99.0 {
            Self::Hostile
        } else {
            Self::War
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Alliance => "Alliance",
            Self::Friendly => "Friendly",
            Self::Neutral => "Neutral",
            Self::Rivalry => "Rivalry",
            Self::Hostile => "Hostile",
            Self::War => "War",
        }
    }
}

impl std::fmt::Display for TensionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Classify a faction-pair tension value
pub fn get_tension_level(tension: f64) -> TensionLevel {
    TensionLevel::from_value(tension)
}

/// Coarse diplomatic stance derived from pair tension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Alliance,
    Friendly,
    Neutral,
    Hostile,
    War,
}

impl RelationshipType {
    pub fn from_tension(tension: f64) -> Self {
        if tension >= 70.0 {
            Self::War
        } else if tension >= 30.0 {
            Self::Hostile
        } else if tension >= -30.0 {
            Self::Neutral
        } else if tension >= -60.0 {
            Self::Friendly
        } else {
            Self::Alliance
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alliance => write!(f, "alliance"),
            Self::Friendly => write!(f, "friendly"),
            Self::Neutral => write!(f, "neutral"),
            Self::Hostile => write!(f, "hostile"),
            Self::War => write!(f, "war"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tension_level_boundaries() {
        assert_eq!(get_tension_level(-90.0), TensionLevel::Alliance);
        assert_eq!(get_tension_level(-76.0), TensionLevel::Alliance);
        assert_eq!(get_tension_level(-75.0), TensionLevel::Friendly);
        assert_eq!(get_tension_level(0.0), TensionLevel::Neutral);
        assert_eq!(get_tension_level(25.0), TensionLevel::Neutral);
        assert_eq!(get_tension_level(26.0), TensionLevel::Rivalry);
        assert_eq!(get_tension_level(51.0), TensionLevel::Hostile);
        assert_eq!(get_tension_level(99.0), TensionLevel::Hostile);
        assert_eq!(get_tension_level(100.0), TensionLevel::War);
    }

    #[test]
    fn test_fractional_tension_falls_below_next_edge() {
        assert_eq!(get_tension_level(-76.5), TensionLevel::Alliance);
        assert_eq!(get_tension_level(-75.5), TensionLevel::Friendly);
        assert_eq!(get_tension_level(-25.5), TensionLevel::Neutral);
        assert_eq!(get_tension_level(25.5), TensionLevel::Rivalry);
        assert_eq!(get_tension_level(50.5), TensionLevel::Hostile);
        assert_eq!(get_tension_level(99.5), TensionLevel::War);
    }

    #[test]
    fn test_tension_level_is_monotonic() {
        let mut previous = get_tension_level(-100.0);
        let mut value = -100.0;
        while value <= 100.0 {
            let level = get_tension_level(value);
            assert!(level >= previous, "level dropped at {}", value);
            previous = level;
            value += 0.5;
        }
    }

    #[test]
    fn test_relationship_type_thresholds() {
        assert_eq!(RelationshipType::from_tension(70.0), RelationshipType::War);
        assert_eq!(RelationshipType::from_tension(45.0), RelationshipType::Hostile);
        assert_eq!(RelationshipType::from_tension(0.0), RelationshipType::Neutral);
        assert_eq!(RelationshipType::from_tension(-45.0), RelationshipType::Friendly);
        assert_eq!(RelationshipType::from_tension(-80.0), RelationshipType::Alliance);
    }

    #[test]
    fn test_registry_requires_default() {
        let mut configs = BTreeMap::new();
        configs.insert("city".to_string(), TensionConfig::default());
        assert!(matches!(
            TensionConfigRegistry::new(configs),
            Err(SimulationError::Configuration(_))
        ));
    }

    #[test]
    fn test_config_rejects_inverted_bounds() {
        let config = TensionConfig::new(0.5, 0.1, 0.2, 0.8, 1.0, 1.0, 1.0);
        assert!(config.validate("broken").is_err());
    }

    #[test]
    fn test_registry_falls_back_to_default() {
        let registry = TensionConfigRegistry::default();
        assert_eq!(registry.resolve("moon_base"), registry.resolve(DEFAULT_CATEGORY));
        assert_eq!(registry.resolve("dungeon").base_tension, 0.7);
    }
}
