//! Faction relationship entity - Pairwise tension between two factions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{get_tension_level, FactionId, RelationshipType, TensionLevel};

/// Unordered faction pair, stored with the smaller id first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactionPair {
    pub first: FactionId,
    pub second: FactionId,
}

impl FactionPair {
    pub fn new(a: FactionId, b: FactionId) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn contains(&self, faction_id: FactionId) -> bool {
        self.first == faction_id || self.second == faction_id
    }

    pub fn other(&self, faction_id: FactionId) -> Option<FactionId> {
        if self.first == faction_id {
            Some(self.second)
        } else if self.second == faction_id {
            Some(self.first)
        } else {
            None
        }
    }
}

impl std::fmt::Display for FactionPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.first, self.second)
    }
}

/// Relationship tension on the -100 (allied) to 100 (at war) scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionRelationship {
    pub pair: FactionPair,
    pub tension: f64,
    pub relationship_type: RelationshipType,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub history: Vec<TensionChange>,
}

impl FactionRelationship {
    pub fn new(a: FactionId, b: FactionId, now: DateTime<Utc>) -> Self {
        Self {
            pair: FactionPair::new(a, b),
            tension: 0.0,
            relationship_type: RelationshipType::Neutral,
            last_updated: now,
            history: Vec::new(),
        }
    }

    pub fn with_tension(mut self, tension: f64) -> Self {
        self.tension = tension.clamp(-100.0, 100.0);
        self.relationship_type = RelationshipType::from_tension(self.tension);
        self
    }

    pub fn level(&self) -> TensionLevel {
        get_tension_level(self.tension)
    }
}

/// One recorded change to a relationship's tension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensionChange {
    pub at: DateTime<Utc>,
    pub old_tension: f64,
    pub new_tension: f64,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_is_order_independent() {
        let a = FactionId::new();
        let b = FactionId::new();
        assert_eq!(FactionPair::new(a, b), FactionPair::new(b, a));
        assert_eq!(FactionPair::new(a, b).other(a), Some(b));
        assert_eq!(FactionPair::new(a, b).other(FactionId::new()), None);
    }
}
