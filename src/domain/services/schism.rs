//! Faction schism risk

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::entities::Faction;
use crate::domain::value_objects::{FactionId, SchismConfig};

/// Schism probability with every intermediate value kept for inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchismAssessment {
    pub faction_id: FactionId,
    pub internal_tension: f64,
    pub schism_threshold: f64,
    pub member_count: u32,
    pub base_probability: f64,
    pub size_modifier: f64,
    pub probability: f64,
}

impl SchismAssessment {
    pub fn at_risk(&self) -> bool {
        self.probability > 0.0
    }
}

fn size_modifier(member_count: u32, config: &SchismConfig) -> f64 {
    if member_count >= config.large_faction_size {
        let excess = (member_count - config.large_faction_size) as f64;
        1.0 + (excess / 400.0).min(1.0)
    } else if member_count < config.small_faction_size {
        config.small_faction_modifier
    } else {
        1.0
    }
}

/// Chance that internal tension splits a faction
pub fn calculate_faction_schism_probability(
    faction: &Faction,
    internal_tension: f64,
    schism_threshold: f64,
    member_count: u32,
    config: &SchismConfig,
) -> SchismAssessment {
    let tension = if internal_tension.is_finite() {
        internal_tension
    } else {
        0.0
    };
    let base_probability = (tension - schism_threshold).max(0.0) / 100.0;
    let size_modifier = size_modifier(member_count, config);
    let probability = (base_probability * size_modifier).clamp(0.0, 1.0);

    SchismAssessment {
        faction_id: faction.id,
        internal_tension: tension,
        schism_threshold,
        member_count,
        base_probability,
        size_modifier,
        probability,
    }
}

/// Roll the assessment; true when the faction splits
pub fn roll_schism<R: Rng + ?Sized>(assessment: &SchismAssessment, rng: &mut R) -> bool {
    assessment.probability > 0.0 && rng.gen::<f64>() < assessment.probability
}
