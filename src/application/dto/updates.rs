//! Typed partial updates
//!
//! Each request lists exactly the fields callers may change. Unknown keys
//! are rejected at deserialization and out-of-range values by `validate`.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{Faction, FactionTrait, FactionType, Region};
use crate::domain::value_objects::FactionId;

fn check_range(field: &str, value: Option<f64>, min: f64, max: f64) -> Result<()> {
    if let Some(value) = value {
        if !value.is_finite() || value < min || value > max {
            bail!("{field} must lie in {min}..={max}, got {value}");
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateFactionRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub faction_type: Option<FactionType>,
    #[serde(default)]
    pub influence: Option<f64>,
    #[serde(default)]
    pub reputation: Option<f64>,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub wealth: Option<f64>,
    #[serde(default)]
    pub traits: Option<Vec<FactionTrait>>,
    #[serde(default)]
    pub member_count: Option<u32>,
}

impl UpdateFactionRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                bail!("Faction name cannot be empty");
            }
        }
        check_range("influence", self.influence, 0.0, 100.0)?;
        check_range("reputation", self.reputation, -100.0, 100.0)?;
        check_range("power", self.power, 0.0, 100.0)?;
        check_range("wealth", self.wealth, 0.0, 100.0)?;
        Ok(())
    }

    /// Validate, then write every provided field onto the faction
    pub fn apply(&self, faction: &mut Faction) -> Result<()> {
        self.validate()?;
        if let Some(name) = &self.name {
            faction.name = name.trim().to_string();
        }
        if let Some(faction_type) = self.faction_type {
            faction.faction_type = faction_type;
        }
        if let Some(influence) = self.influence {
            faction.influence = influence;
        }
        if let Some(reputation) = self.reputation {
            faction.reputation = reputation;
        }
        if let Some(power) = self.power {
            faction.power = power;
        }
        if let Some(wealth) = self.wealth {
            faction.wealth = wealth;
        }
        if let Some(traits) = &self.traits {
            faction.traits = traits.clone();
        }
        if let Some(member_count) = self.member_count {
            faction.member_count = member_count;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRegionRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(default)]
    pub max_population: Option<u64>,
    #[serde(default)]
    pub resources: Option<f64>,
    #[serde(default)]
    pub stability: Option<f64>,
    #[serde(default)]
    pub danger_level: Option<f64>,
    /// Replaces the listed factions' influence; others are untouched
    #[serde(default)]
    pub faction_influence: Option<BTreeMap<FactionId, f64>>,
}

impl UpdateRegionRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                bail!("Region name cannot be empty");
            }
        }
        check_range("resources", self.resources, 0.0, 1.0)?;
        check_range("stability", self.stability, 0.0, 1.0)?;
        check_range("danger_level", self.danger_level, 0.0, 1.0)?;
        if let Some(influence) = &self.faction_influence {
            for value in influence.values() {
                check_range("faction_influence", Some(*value), 0.0, 1.0)?;
            }
        }
        if let (Some(population), Some(max)) = (self.population, self.max_population) {
            if population > max {
                bail!("population {population} exceeds max_population {max}");
            }
        }
        Ok(())
    }

    pub fn apply(&self, region: &mut Region) -> Result<()> {
        self.validate()?;
        let max_population = self.max_population.unwrap_or(region.max_population);
        let population = self.population.unwrap_or(region.population);
        if population > max_population {
            bail!("population {population} exceeds max_population {max_population}");
        }
        if let Some(name) = &self.name {
            region.name = name.trim().to_string();
        }
        region.max_population = max_population;
        region.population = population;
        if let Some(resources) = self.resources {
            region.resources = resources;
        }
        if let Some(stability) = self.stability {
            region.stability = stability;
        }
        if let Some(danger_level) = self.danger_level {
            region.danger_level = danger_level;
        }
        if let Some(influence) = &self.faction_influence {
            region.faction_influence.extend(influence.iter().map(|(k, v)| (*k, *v)));
        }
        Ok(())
    }
}

/// Shift the relationship tension between two factions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRelationshipRequest {
    pub faction_a: FactionId,
    pub faction_b: FactionId,
    pub change: f64,
    #[serde(default)]
    pub reason: String,
}

impl UpdateRelationshipRequest {
    pub fn validate(&self) -> Result<()> {
        if self.faction_a == self.faction_b {
            bail!("A faction has no relationship with itself");
        }
        check_range("change", Some(self.change), -200.0, 200.0)
    }
}
