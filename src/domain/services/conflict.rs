//! Conflict triggers and revolts driven by sustained location tension

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{PoiId, RegionId, RevoltConfig};

/// A kind of conflict that high tension can set off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictTrigger {
    FactionRevolt,
    RegionalUprising,
    InterFactionWar,
}

impl ConflictTrigger {
    pub const ALL: [ConflictTrigger; 3] = [
        ConflictTrigger::FactionRevolt,
        ConflictTrigger::RegionalUprising,
        ConflictTrigger::InterFactionWar,
    ];

    pub fn tension_threshold(&self) -> f64 {
        match self {
            Self::FactionRevolt => 0.8,
            Self::RegionalUprising => 0.9,
            Self::InterFactionWar => 0.7,
        }
    }

    pub fn min_factions(&self) -> usize {
        match self {
            Self::FactionRevolt => 2,
            Self::RegionalUprising => 0,
            Self::InterFactionWar => 3,
        }
    }

    pub fn duration_hours(&self) -> i64 {
        match self {
            Self::FactionRevolt => 48,
            Self::RegionalUprising => 72,
            Self::InterFactionWar => 168,
        }
    }

    pub fn probability_modifier(&self) -> f64 {
        match self {
            Self::FactionRevolt => 1.0,
            Self::RegionalUprising => 0.7,
            Self::InterFactionWar => 0.5,
        }
    }
}

impl std::fmt::Display for ConflictTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FactionRevolt => write!(f, "faction_revolt"),
            Self::RegionalUprising => write!(f, "regional_uprising"),
            Self::InterFactionWar => write!(f, "inter_faction_war"),
        }
    }
}

/// Triggers whose tension and faction requirements are met
pub fn check_conflict_triggers(region_tension: f64, faction_count: usize) -> Vec<ConflictTrigger> {
    ConflictTrigger::ALL
        .into_iter()
        .filter(|t| region_tension >= t.tension_threshold() && faction_count >= t.min_factions())
        .collect()
}

/// Chance a location revolts at the given tension
pub fn revolt_probability(tension: f64, faction_count: usize, config: &RevoltConfig) -> f64 {
    let probability = tension * config.base_probability_threshold
        + faction_count as f64 * config.faction_influence_modifier;
    if probability.is_finite() {
        probability.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevoltCasualties {
    pub civilians: u32,
    pub faction_members: u32,
    pub authorities: u32,
}

impl RevoltCasualties {
    pub fn total(&self) -> u32 {
        self.civilians + self.faction_members + self.authorities
    }
}

/// A revolt that broke out at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevoltOutcome {
    pub region_id: RegionId,
    pub poi_id: PoiId,
    pub started_at: DateTime<Utc>,
    pub duration_hours: i64,
    pub probability: f64,
    pub casualties: RevoltCasualties,
}

impl RevoltOutcome {
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.started_at + Duration::hours(self.duration_hours)
    }
}

pub fn estimate_casualties(tension: f64, faction_count: usize, config: &RevoltConfig) -> RevoltCasualties {
    let base = (tension.max(0.0) * 10.0 * faction_count as f64 * config.casualty_multiplier).floor();
    let base = if base.is_finite() { base as u32 } else { 0 };
    RevoltCasualties {
        civilians: (base / 2).max(1),
        faction_members: base / 4,
        authorities: base / 8,
    }
}

/// Roll for a revolt; `None` when the location holds
pub fn simulate_revolt<R: Rng + ?Sized>(
    region_id: RegionId,
    poi_id: PoiId,
    tension: f64,
    faction_count: usize,
    config: &RevoltConfig,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Option<RevoltOutcome> {
    let probability = revolt_probability(tension, faction_count, config);
    if rng.gen::<f64>() >= probability {
        return None;
    }

    let (low, high) = if config.min_duration_hours <= config.max_duration_hours {
        (config.min_duration_hours, config.max_duration_hours)
    } else {
        (config.max_duration_hours, config.min_duration_hours)
    };
    Some(RevoltOutcome {
        region_id,
        poi_id,
        started_at: now,
        duration_hours: rng.gen_range(low..=high),
        probability,
        casualties: estimate_casualties(tension, faction_count, config),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_triggers_require_factions() {
        assert!(check_conflict_triggers(0.95, 0) == vec![ConflictTrigger::RegionalUprising]);
        let all = check_conflict_triggers(0.95, 3);
        assert_eq!(all.len(), 3);
        assert!(check_conflict_triggers(0.5, 5).is_empty());
    }

    #[test]
    fn test_revolt_probability_is_capped() {
        let config = RevoltConfig::default();
        assert!((revolt_probability(0.8, 2, &config) - 0.6).abs() < 1e-9);
        assert_eq!(revolt_probability(1.0, 20, &config), 1.0);
    }

    #[test]
    fn test_casualties_split() {
        let casualties = estimate_casualties(0.9, 3, &RevoltConfig::default());
        // base = floor(0.9 * 10 * 3) = 27
        assert_eq!(casualties.civilians, 13);
        assert_eq!(casualties.faction_members, 6);
        assert_eq!(casualties.authorities, 3);
        assert_eq!(estimate_casualties(0.0, 0, &RevoltConfig::default()).civilians, 1);
    }

    #[test]
    fn test_certain_revolt_has_bounded_duration() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let outcome = simulate_revolt(
            RegionId::new(),
            PoiId::new(),
            1.0,
            10,
            &RevoltConfig::default(),
            &mut rng,
            now,
        )
        .unwrap();
        assert!((24..=72).contains(&outcome.duration_hours));
        assert!(outcome.ends_at() > now);
    }
}
