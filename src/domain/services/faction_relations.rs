//! Faction-pair relationship tension and war triggers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{FactionRelationship, FactionTrait, TensionChange};
use crate::domain::value_objects::{RelationshipConfig, RelationshipType};

/// Threshold crossings produced by a relationship change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipTrigger {
    WarThresholdCrossed,
    AllianceOpportunity,
    PeaceOpportunity,
}

/// Compare old and new tension against the configured thresholds
pub fn check_faction_war_triggers(
    old_tension: f64,
    new_tension: f64,
    config: &RelationshipConfig,
) -> Vec<RelationshipTrigger> {
    let mut triggers = Vec::new();
    if old_tension < config.war_threshold && new_tension >= config.war_threshold {
        triggers.push(RelationshipTrigger::WarThresholdCrossed);
    }
    if old_tension > config.alliance_threshold && new_tension <= config.alliance_threshold {
        triggers.push(RelationshipTrigger::AllianceOpportunity);
    }
    if old_tension >= config.war_threshold && new_tension < config.war_threshold {
        triggers.push(RelationshipTrigger::PeaceOpportunity);
    }
    triggers
}

/// Shift a relationship's tension and report any thresholds crossed
pub fn update_faction_tension(
    relationship: &mut FactionRelationship,
    change: f64,
    reason: impl Into<String>,
    now: DateTime<Utc>,
    config: &RelationshipConfig,
) -> Vec<RelationshipTrigger> {
    if !change.is_finite() {
        return Vec::new();
    }
    let old_tension = relationship.tension;
    let new_tension = (old_tension + change).clamp(-100.0, 100.0);
    set_tension(relationship, new_tension, reason.into(), now, config);
    check_faction_war_triggers(old_tension, new_tension, config)
}

fn set_tension(
    relationship: &mut FactionRelationship,
    new_tension: f64,
    reason: String,
    now: DateTime<Utc>,
    config: &RelationshipConfig,
) {
    relationship.history.push(TensionChange {
        at: now,
        old_tension: relationship.tension,
        new_tension,
        reason,
    });
    if relationship.history.len() > config.history_limit {
        let excess = relationship.history.len() - config.history_limit;
        relationship.history.drain(..excess);
    }
    relationship.tension = new_tension;
    relationship.relationship_type = RelationshipType::from_tension(new_tension);
    relationship.last_updated = now;
}

/// Relax tension towards zero; alliances fade at half speed
///
/// Returns the applied change. Less than a full day elapsed is a no-op.
pub fn decay_relationship(
    relationship: &mut FactionRelationship,
    now: DateTime<Utc>,
    config: &RelationshipConfig,
) -> f64 {
    let days = (now - relationship.last_updated).num_days();
    if days < 1 || relationship.tension == 0.0 {
        return 0.0;
    }

    let tension = relationship.tension;
    let mut step = (tension.abs() * 0.03).max(1.0) * config.decay_rate * days as f64;
    if tension < config.alliance_threshold {
        step *= 0.5;
    }
    let step = step.min(tension.abs());
    let new_tension = if tension > 0.0 {
        tension - step
    } else {
        tension + step
    };

    set_tension(relationship, new_tension, "natural decay".to_string(), now, config);
    new_tension - tension
}

/// Chance that a pair goes to war at the given tension
pub fn calculate_war_chance(tension: f64, traits_a: &[FactionTrait], traits_b: &[FactionTrait]) -> f64 {
    if !tension.is_finite() || tension <= 0.0 {
        return 0.0;
    }
    let normalized = (tension / 100.0).min(1.0);
    let modifier: f64 = traits_a
        .iter()
        .chain(traits_b.iter())
        .map(FactionTrait::war_chance_modifier)
        .sum();
    (normalized * normalized + modifier).clamp(0.0, 1.0)
}
