//! Faction entity - Organized groups competing for regional control

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{FactionId, RegionId};

/// A faction in the world
///
/// `influence`, `power` and `wealth` live on a 0..100 scale, `reputation`
/// on -100..100. Missing values in persisted records deserialize as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    pub faction_type: FactionType,
    #[serde(default)]
    pub influence: f64,
    #[serde(default)]
    pub reputation: f64,
    #[serde(default)]
    pub power: f64,
    #[serde(default)]
    pub wealth: f64,
    #[serde(default)]
    pub traits: Vec<FactionTrait>,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub territory: Territory,
}

impl Faction {
    pub fn new(name: impl Into<String>, faction_type: FactionType) -> Self {
        Self {
            id: FactionId::new(),
            name: name.into(),
            faction_type,
            influence: 0.0,
            reputation: 0.0,
            power: 0.0,
            wealth: 0.0,
            traits: Vec::new(),
            member_count: 0,
            territory: Territory::default(),
        }
    }

    pub fn with_id(mut self, id: FactionId) -> Self {
        self.id = id;
        self
    }

    pub fn with_influence(mut self, influence: f64) -> Self {
        self.influence = influence;
        self
    }

    pub fn with_reputation(mut self, reputation: f64) -> Self {
        self.reputation = reputation;
        self
    }

    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    pub fn with_wealth(mut self, wealth: f64) -> Self {
        self.wealth = wealth;
        self
    }

    pub fn with_trait(mut self, faction_trait: FactionTrait) -> Self {
        if !self.traits.contains(&faction_trait) {
            self.traits.push(faction_trait);
        }
        self
    }

    pub fn with_members(mut self, member_count: u32) -> Self {
        self.member_count = member_count;
        self
    }

    pub fn has_trait(&self, faction_trait: FactionTrait) -> bool {
        self.traits.contains(&faction_trait)
    }

    /// Attribute value usable in arithmetic; NaN and infinities read as 0
    pub fn attribute(value: f64) -> f64 {
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }

    pub fn adjust_reputation(&mut self, delta: f64) {
        self.reputation = (Self::attribute(self.reputation) + delta).clamp(-100.0, 100.0);
    }

    pub fn adjust_wealth(&mut self, delta: f64) {
        self.wealth = (Self::attribute(self.wealth) + delta).clamp(0.0, 100.0);
    }
}

/// Kind of faction; decides which control effects apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactionType {
    Political,
    Guild,
    Religious,
    Military,
    Criminal,
    Tribal,
}

impl FactionType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Political => "Political",
            Self::Guild => "Guild",
            Self::Religious => "Religious",
            Self::Military => "Military",
            Self::Criminal => "Criminal",
            Self::Tribal => "Tribal",
        }
    }
}

impl std::fmt::Display for FactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for FactionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "political" | "kingdom" | "government" => Ok(Self::Political),
            "guild" | "merchant" | "trade" => Ok(Self::Guild),
            "religious" | "church" | "cult" => Ok(Self::Religious),
            "military" => Ok(Self::Military),
            "criminal" | "thieves" => Ok(Self::Criminal),
            "tribal" | "tribe" => Ok(Self::Tribal),
            _ => Err(anyhow::anyhow!("Invalid faction type: {}", s)),
        }
    }
}

/// Disposition traits that bias war chances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactionTrait {
    Militaristic,
    Expansionist,
    Peaceful,
    Diplomatic,
}

impl FactionTrait {
    /// Shift applied to the pair's war chance
    pub fn war_chance_modifier(&self) -> f64 {
        match self {
            Self::Militaristic => 0.2,
            Self::Expansionist => 0.15,
            Self::Peaceful => -0.2,
            Self::Diplomatic => -0.1,
        }
    }
}

/// Regions a faction holds and its influence in each
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Territory {
    pub regions: BTreeSet<RegionId>,
    pub influence_map: BTreeMap<RegionId, f64>,
}

impl Territory {
    pub fn influence_in(&self, region_id: RegionId) -> f64 {
        self.influence_map
            .get(&region_id)
            .copied()
            .map(Faction::attribute)
            .unwrap_or(0.0)
    }

    pub fn record_influence(&mut self, region_id: RegionId, influence: f64, threshold: f64) {
        self.influence_map.insert(region_id, influence);
        if influence >= threshold {
            self.regions.insert(region_id);
        }
    }

    pub fn release(&mut self, region_id: RegionId) {
        self.regions.remove(&region_id);
        self.influence_map.remove(&region_id);
    }
}
