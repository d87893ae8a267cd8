//! Tunable simulation settings
//!
//! Every section derives serde with defaults so a partial `visual_dm.toml`
//! or a handful of `VISUAL_DM__*` variables only override what they name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::entities::WarOutcomeType;

/// All simulation tuning knobs, grouped per engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub political: PoliticalControlConfig,
    pub relationships: RelationshipConfig,
    pub war: WarConfig,
    pub schism: SchismConfig,
    pub placement: PlacementConfig,
    pub revolt: RevoltConfig,
    pub population: PopulationConfig,
}

/// Faction control, control effects and influence spread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoliticalControlConfig {
    /// Gap between the top two influences below which a region is contested
    pub contest_margin: f64,
    /// Share of the runner-up's influence subtracted from a contested controller
    pub contest_factor: f64,
    /// Stability gained per unit of political control
    pub influence_weight: f64,
    /// Resources gained per unit of guild control
    pub resource_weight: f64,
    pub power_threshold: f64,
    pub effect_strength: f64,
    pub extraction_rate: f64,
    /// Fraction of extracted resources also lost as stability
    pub stability_penalty_ratio: f64,
    pub spread_rate: f64,
    pub min_resource_gate: f64,
    pub max_danger_gate: f64,
    /// Influence at which a region joins a faction's territory
    pub territory_threshold: f64,
    pub daily_influence_decay: f64,
    /// Weight of controller attributes in population growth factors
    pub growth_attribute_weight: f64,
}

impl Default for PoliticalControlConfig {
    fn default() -> Self {
        Self {
            contest_margin: 0.2,
            contest_factor: 0.5,
            influence_weight: 0.1,
            resource_weight: 0.1,
            power_threshold: 70.0,
            effect_strength: 0.1,
            extraction_rate: 0.5,
            stability_penalty_ratio: 0.5,
            spread_rate: 0.1,
            min_resource_gate: 0.2,
            max_danger_gate: 0.7,
            territory_threshold: 0.5,
            daily_influence_decay: 0.01,
            growth_attribute_weight: 0.1,
        }
    }
}

/// Faction-pair relationship tension (-100..100 scale)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipConfig {
    pub war_threshold: f64,
    pub alliance_threshold: f64,
    pub decay_rate: f64,
    pub history_limit: usize,
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            war_threshold: 70.0,
            alliance_threshold: -50.0,
            decay_rate: 1.0,
            history_limit: 20,
        }
    }
}

/// War lifecycle, battle resolution and outcome selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarConfig {
    pub war_threshold: f64,
    pub max_exhaustion: f64,
    /// Exhaustion both sides accrue per simulated day at war
    pub attrition_factor: f64,
    /// Exhaustion per unit of battle losses
    pub battle_exhaustion_factor: f64,
    pub battle_chance: f64,
    pub peace_exhaustion_fraction: f64,
    pub min_peace_duration_days: i64,
    /// Days after a rejected offer before exhaustion reopens negotiations
    pub peace_rejection_cooldown_days: i64,
    pub stalemate_duration_days: i64,
    pub decisive_margin: f64,
    pub victory_margin: f64,
    pub defender_advantage: f64,
    pub base_losses: f64,
    pub reparation_base: f64,
    pub casualty_scale: f64,
    pub dispute_threshold: f64,
    pub outcome_weights: BTreeMap<WarOutcomeType, f64>,
}

impl Default for WarConfig {
    fn default() -> Self {
        let outcome_weights = [
            (WarOutcomeType::DecisiveVictory, 0.1),
            (WarOutcomeType::Victory, 0.3),
            (WarOutcomeType::Stalemate, 0.2),
            (WarOutcomeType::Ceasefire, 0.2),
            (WarOutcomeType::WhitePeace, 0.2),
        ]
        .into_iter()
        .collect();

        Self {
            war_threshold: 70.0,
            max_exhaustion: 100.0,
            attrition_factor: 1.0,
            battle_exhaustion_factor: 20.0,
            battle_chance: 0.3,
            peace_exhaustion_fraction: 0.6,
            min_peace_duration_days: 7,
            peace_rejection_cooldown_days: 7,
            stalemate_duration_days: 90,
            decisive_margin: 0.4,
            victory_margin: 0.2,
            defender_advantage: 1.2,
            base_losses: 0.2,
            reparation_base: 100.0,
            casualty_scale: 1000.0,
            dispute_threshold: 0.2,
            outcome_weights,
        }
    }
}

impl WarConfig {
    pub fn should_declare(&self, tension: f64) -> bool {
        tension >= self.war_threshold
    }
}

/// Faction schism risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchismConfig {
    pub schism_threshold: f64,
    pub large_faction_size: u32,
    pub small_faction_size: u32,
    pub small_faction_modifier: f64,
}

impl Default for SchismConfig {
    fn default() -> Self {
        Self {
            schism_threshold: 80.0,
            large_faction_size: 100,
            small_faction_size: 20,
            small_faction_modifier: 0.5,
        }
    }
}

/// Biome clustering and adjacency validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub clustering_factor: f64,
    pub clustering_iterations: u32,
    pub validation_iterations: u32,
    pub forbidden_difficulty: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            clustering_factor: 0.5,
            clustering_iterations: 3,
            validation_iterations: 5,
            forbidden_difficulty: 0.8,
        }
    }
}

/// Region revolts triggered by sustained POI tension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevoltConfig {
    pub base_probability_threshold: f64,
    pub faction_influence_modifier: f64,
    pub min_duration_hours: i64,
    pub max_duration_hours: i64,
    pub casualty_multiplier: f64,
    pub relief_modifier: f64,
    pub relief_duration_hours: i64,
}

impl Default for RevoltConfig {
    fn default() -> Self {
        Self {
            base_probability_threshold: 0.5,
            faction_influence_modifier: 0.1,
            min_duration_hours: 24,
            max_duration_hours: 72,
            casualty_multiplier: 1.0,
            relief_modifier: -0.3,
            relief_duration_hours: 72,
        }
    }
}

/// Daily population growth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub base_growth_rate: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            base_growth_rate: 0.002,
        }
    }
}

/// Shape and seed of a generated world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub seed: u64,
    /// Hex radius; a radius of r yields 3r(r+1)+1 regions
    pub radius: u32,
    /// Points of interest placed per region
    pub poi_density: u32,
    /// Global multiplier on biome resource deposits
    pub resource_abundance: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            radius: 6,
            poi_density: 2,
            resource_abundance: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings: SimulationSettings =
            serde_json::from_str(r#"{ "war": { "battle_chance": 0.5 } }"#).unwrap();
        assert_eq!(settings.war.battle_chance, 0.5);
        assert_eq!(settings.war.max_exhaustion, 100.0);
        assert_eq!(settings.placement.clustering_iterations, 3);
    }

    #[test]
    fn test_default_outcome_weights_sum_to_one() {
        let total: f64 = WarConfig::default().outcome_weights.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
