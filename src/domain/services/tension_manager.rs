//! Tension manager - Decaying tension per (region, point of interest)
//!
//! Tension is stored per location and decays linearly towards the
//! category's minimum as time passes. Every mutation reads the location
//! through [`TensionManager::calculate_tension`] first, so decay is always
//! applied before an impact lands.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::entities::{
    TensionEventRecord, TensionModifier, TensionSnapshot, TensionState,
};
use crate::domain::errors::{SimulationError, SimulationResult};
use crate::domain::services::tension_impact::{
    DefaultImpactScorer, EnvironmentalChange, ImpactScorer, NpcChange, PlayerAction,
};
use crate::domain::value_objects::{
    PoiId, RegionId, TensionConfig, TensionConfigRegistry, DEFAULT_CATEGORY,
};

// =============================================================================
// Location classification
// =============================================================================

/// Resolves a location's POI type to a tension config category
pub trait LocationClassifier: Send + Sync {
    fn classify(&self, poi_type: Option<&str>) -> String;
}

/// Maps POI types to categories through a lookup table
#[derive(Debug, Clone, PartialEq)]
pub struct PoiTypeClassifier {
    mapping: BTreeMap<String, String>,
}

impl PoiTypeClassifier {
    pub fn new(mapping: BTreeMap<String, String>) -> Self {
        let mapping = mapping
            .into_iter()
            .map(|(poi_type, category)| (poi_type.to_lowercase(), category))
            .collect();
        Self { mapping }
    }

    pub fn mapping(&self) -> &BTreeMap<String, String> {
        &self.mapping
    }
}

impl Default for PoiTypeClassifier {
    fn default() -> Self {
        let mapping = [
            ("city", "city"),
            ("town", "town"),
            ("village", "village"),
            ("dungeon", "dungeon"),
            ("ruins", "ruins"),
            ("camp", "wilderness"),
            ("tower", "ruins"),
            ("temple", "city"),
            ("mine", "wilderness"),
            ("fortress", "city"),
        ]
        .into_iter()
        .map(|(poi_type, category)| (poi_type.to_string(), category.to_string()))
        .collect();
        Self { mapping }
    }
}

impl LocationClassifier for PoiTypeClassifier {
    fn classify(&self, poi_type: Option<&str>) -> String {
        match poi_type {
            Some(poi_type) => {
                let key = poi_type.to_lowercase();
                // Unmapped types may themselves name a category
                self.mapping.get(&key).cloned().unwrap_or(key)
            }
            None => DEFAULT_CATEGORY.to_string(),
        }
    }
}

// =============================================================================
// Decay
// =============================================================================

/// Linear decay towards `min_tension`, clamped to the config bounds
pub fn decay_tension(value: f64, elapsed: Duration, config: &TensionConfig) -> f64 {
    let hours = (elapsed.num_milliseconds() as f64 / 3_600_000.0).max(0.0);
    decay_by_hours(value, hours, config)
}

fn decay_by_hours(value: f64, hours: f64, config: &TensionConfig) -> f64 {
    let decayed = (value - config.decay_rate * hours).max(config.min_tension);
    config.clamp(decayed)
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_milliseconds() as f64 / 3_600_000.0).max(0.0)
}

/// Totals from a full decay sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecayStats {
    pub regions_processed: usize,
    pub pois_processed: usize,
    pub failures: usize,
}

// =============================================================================
// Tension Manager
// =============================================================================

/// Owns tension state for every tracked location
pub struct TensionManager {
    configs: TensionConfigRegistry,
    classifier: Box<dyn LocationClassifier>,
    scorer: Box<dyn ImpactScorer>,
    location_types: BTreeMap<(RegionId, PoiId), String>,
    states: BTreeMap<RegionId, BTreeMap<PoiId, TensionState>>,
}

impl TensionManager {
    pub fn new(configs: TensionConfigRegistry) -> Self {
        Self {
            configs,
            classifier: Box::new(PoiTypeClassifier::default()),
            scorer: Box::new(DefaultImpactScorer),
            location_types: BTreeMap::new(),
            states: BTreeMap::new(),
        }
    }

    pub fn with_classifier(mut self, classifier: impl LocationClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn with_scorer(mut self, scorer: impl ImpactScorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    /// Record a location's POI type so it classifies into the right category
    pub fn register_location(&mut self, region_id: RegionId, poi_id: PoiId, poi_type: &str) {
        self.location_types
            .insert((region_id, poi_id), poi_type.to_string());
    }

    /// Category a location resolves to, "default" when unknown
    pub fn category_for(&self, region_id: RegionId, poi_id: PoiId) -> String {
        let poi_type = self
            .location_types
            .get(&(region_id, poi_id))
            .map(String::as_str);
        let category = self.classifier.classify(poi_type);
        if self.configs.contains(&category) {
            category
        } else {
            DEFAULT_CATEGORY.to_string()
        }
    }

    pub fn config_for(&self, region_id: RegionId, poi_id: PoiId) -> TensionConfig {
        *self.configs.resolve(&self.category_for(region_id, poi_id))
    }

    pub fn state(&self, region_id: RegionId, poi_id: PoiId) -> Option<&TensionState> {
        self.states.get(&region_id).and_then(|pois| pois.get(&poi_id))
    }

    /// Current tension of a location with decay applied and persisted
    pub fn calculate_tension(
        &mut self,
        region_id: RegionId,
        poi_id: PoiId,
        current_time: DateTime<Utc>,
    ) -> SimulationResult<f64> {
        let config = self.config_for(region_id, poi_id);
        let pois = self.states.entry(region_id).or_default();

        let state = match pois.get_mut(&poi_id) {
            Some(state) => {
                let hours = hours_between(state.last_updated, current_time);
                let decayed = decay_by_hours(state.level, hours, &config);
                if !state.level.is_finite() || !decayed.is_finite() {
                    return Err(SimulationError::Tension {
                        region_id,
                        poi_id,
                        reason: format!(
                            "decay of {} over {:.2}h produced {}",
                            state.level, hours, decayed
                        ),
                    });
                }
                state.level = decayed;
                if current_time > state.last_updated {
                    state.last_updated = current_time;
                }
                state.prune_modifiers(current_time);
                state
            }
            None => {
                debug!(%region_id, %poi_id, base = config.base_tension, "initializing tension");
                pois.entry(poi_id)
                    .or_insert_with(|| TensionState::new(config.clamp(config.base_tension), current_time))
            }
        };

        effective_tension(state, &config).ok_or_else(|| SimulationError::Tension {
            region_id,
            poi_id,
            reason: "modifiers produced a non-finite tension".to_string(),
        })
    }

    /// Apply weighted player, NPC and environmental impacts to a location
    pub fn update_tension(
        &mut self,
        region_id: RegionId,
        poi_id: PoiId,
        player_action: Option<&PlayerAction>,
        npc_change: Option<&NpcChange>,
        environmental_change: Option<&EnvironmentalChange>,
        current_time: DateTime<Utc>,
    ) -> SimulationResult<f64> {
        self.calculate_tension(region_id, poi_id, current_time)?;
        let config = self.config_for(region_id, poi_id);

        let player = normalized(player_action.map(|a| self.scorer.player_score(a)));
        let npc = normalized(npc_change.map(|c| self.scorer.npc_score(c)));
        let environment =
            normalized(environmental_change.map(|c| self.scorer.environmental_score(c)));
        let delta = player * config.player_impact
            + npc * config.npc_impact
            + environment * config.environmental_impact;

        let state = self
            .states
            .get_mut(&region_id)
            .and_then(|pois| pois.get_mut(&poi_id))
            .ok_or_else(|| SimulationError::Tension {
                region_id,
                poi_id,
                reason: "state vanished after calculation".to_string(),
            })?;

        let new_level = config.clamp(state.level + delta);
        if !new_level.is_finite() {
            return Err(SimulationError::Tension {
                region_id,
                poi_id,
                reason: format!("impact delta {} produced a non-finite level", delta),
            });
        }
        state.level = new_level;
        state.record_event(TensionEventRecord {
            at: current_time,
            delta,
            resulting_level: new_level,
            description: describe_impacts(player_action, npc_change, environmental_change),
        });

        debug!(%region_id, %poi_id, delta, level = new_level, "tension updated");
        effective_tension(state, &config).ok_or_else(|| SimulationError::Tension {
            region_id,
            poi_id,
            reason: "modifiers produced a non-finite tension".to_string(),
        })
    }

    /// Attach a temporary signed modifier to a location
    #[allow(clippy::too_many_arguments)]
    pub fn add_tension_modifier(
        &mut self,
        region_id: RegionId,
        poi_id: PoiId,
        kind: impl Into<String>,
        value: f64,
        duration_hours: i64,
        source: impl Into<String>,
        current_time: DateTime<Utc>,
    ) -> SimulationResult<f64> {
        if !value.is_finite() {
            return Err(SimulationError::Tension {
                region_id,
                poi_id,
                reason: "modifier value must be finite".to_string(),
            });
        }
        self.calculate_tension(region_id, poi_id, current_time)?;
        let config = self.config_for(region_id, poi_id);

        let state = self
            .states
            .get_mut(&region_id)
            .and_then(|pois| pois.get_mut(&poi_id))
            .ok_or_else(|| SimulationError::Tension {
                region_id,
                poi_id,
                reason: "state vanished after calculation".to_string(),
            })?;
        state.modifiers.push(TensionModifier {
            kind: kind.into(),
            value,
            expires_at: current_time + Duration::hours(duration_hours.max(0)),
            source: source.into(),
        });

        effective_tension(state, &config).ok_or_else(|| SimulationError::Tension {
            region_id,
            poi_id,
            reason: "modifiers produced a non-finite tension".to_string(),
        })
    }

    /// Return a location to its category's base tension
    pub fn reset_tension(
        &mut self,
        region_id: RegionId,
        poi_id: PoiId,
        current_time: DateTime<Utc>,
    ) -> f64 {
        let config = self.config_for(region_id, poi_id);
        let base = config.clamp(config.base_tension);
        self.states
            .entry(region_id)
            .or_default()
            .insert(poi_id, TensionState::new(base, current_time));
        base
    }

    /// Decay every tracked location to `current_time`
    pub fn decay_all(&mut self, current_time: DateTime<Utc>) -> DecayStats {
        let locations: Vec<(RegionId, Vec<PoiId>)> = self
            .states
            .iter()
            .map(|(region_id, pois)| (*region_id, pois.keys().copied().collect()))
            .collect();

        let mut stats = DecayStats::default();
        for (region_id, pois) in locations {
            stats.regions_processed += 1;
            for poi_id in pois {
                match self.calculate_tension(region_id, poi_id, current_time) {
                    Ok(_) => stats.pois_processed += 1,
                    Err(e) => {
                        warn!(%region_id, %poi_id, error = %e, "skipping location during decay");
                        stats.failures += 1;
                    }
                }
            }
        }
        stats
    }

    /// Mean tension across a region's tracked locations
    pub fn region_tension(
        &mut self,
        region_id: RegionId,
        current_time: DateTime<Utc>,
    ) -> SimulationResult<Option<f64>> {
        let pois: Vec<PoiId> = match self.states.get(&region_id) {
            Some(pois) if !pois.is_empty() => pois.keys().copied().collect(),
            _ => return Ok(None),
        };
        let mut total = 0.0;
        for poi_id in &pois {
            total += self.calculate_tension(region_id, *poi_id, current_time)?;
        }
        Ok(Some(total / pois.len() as f64))
    }

    /// Regions whose mean tension lies in `min..=max`, highest first
    pub fn regions_by_tension(
        &mut self,
        min: f64,
        max: f64,
        current_time: DateTime<Utc>,
    ) -> Vec<(RegionId, f64)> {
        let region_ids: Vec<RegionId> = self.states.keys().copied().collect();
        let mut matching = Vec::new();
        for region_id in region_ids {
            match self.region_tension(region_id, current_time) {
                Ok(Some(tension)) if tension >= min && tension <= max => {
                    matching.push((region_id, tension))
                }
                Ok(_) => {}
                Err(e) => warn!(%region_id, error = %e, "skipping region in tension query"),
            }
        }
        matching.sort_by(|a, b| b.1.total_cmp(&a.1));
        matching
    }

    pub fn tracked_regions(&self) -> Vec<RegionId> {
        self.states.keys().copied().collect()
    }

    pub fn pois_in(&self, region_id: RegionId) -> Vec<PoiId> {
        self.states
            .get(&region_id)
            .map(|pois| pois.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn remove_region(&mut self, region_id: RegionId) {
        self.states.remove(&region_id);
        self.location_types.retain(|(region, _), _| *region != region_id);
    }

    pub fn snapshot(&self) -> Vec<TensionSnapshot> {
        self.states
            .iter()
            .flat_map(|(region_id, pois)| {
                pois.iter().map(move |(poi_id, state)| TensionSnapshot {
                    region_id: *region_id,
                    poi_id: *poi_id,
                    state: state.clone(),
                })
            })
            .collect()
    }

    pub fn snapshot_of(&self, region_id: RegionId, poi_id: PoiId) -> Option<TensionSnapshot> {
        self.state(region_id, poi_id).map(|state| TensionSnapshot {
            region_id,
            poi_id,
            state: state.clone(),
        })
    }

    /// Load persisted state, replacing anything tracked for the same locations
    pub fn restore(&mut self, snapshots: impl IntoIterator<Item = TensionSnapshot>) {
        for snapshot in snapshots {
            self.states
                .entry(snapshot.region_id)
                .or_default()
                .insert(snapshot.poi_id, snapshot.state);
        }
    }
}

fn effective_tension(state: &TensionState, config: &TensionConfig) -> Option<f64> {
    let value = config.clamp(state.level + state.modifier_total());
    value.is_finite().then_some(value)
}

fn normalized(score: Option<f64>) -> f64 {
    match score {
        Some(score) if score.is_finite() => score.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

fn describe_impacts(
    player_action: Option<&PlayerAction>,
    npc_change: Option<&NpcChange>,
    environmental_change: Option<&EnvironmentalChange>,
) -> String {
    let mut parts = Vec::new();
    if let Some(action) = player_action {
        parts.push(format!("player {:?}", action.kind));
    }
    if let Some(change) = npc_change {
        parts.push(format!("npc {:?}", change.kind));
    }
    if let Some(change) = environmental_change {
        let kind = match change {
            EnvironmentalChange::Disaster { .. } => "disaster",
            EnvironmentalChange::MagicalEvent { .. } => "magical event",
            EnvironmentalChange::Economic { .. } => "economic change",
            EnvironmentalChange::Political { .. } => "political change",
        };
        parts.push(format!("environment {}", kind));
    }
    if parts.is_empty() {
        "no impact".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::tension_impact::{NpcChangeKind, PlayerActionKind};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn manager() -> TensionManager {
        TensionManager::new(TensionConfigRegistry::default())
    }

    #[test]
    fn test_first_read_initializes_to_base_tension() {
        let mut manager = manager();
        let (region, poi) = (RegionId::new(), PoiId::new());
        manager.register_location(region, poi, "dungeon");
        let tension = manager.calculate_tension(region, poi, start()).unwrap();
        assert_eq!(tension, 0.7);
    }

    #[test]
    fn test_unclassified_location_uses_default() {
        let mut manager = manager();
        let (region, poi) = (RegionId::new(), PoiId::new());
        assert_eq!(manager.category_for(region, poi), DEFAULT_CATEGORY);
        manager.register_location(region, poi, "floating_island");
        assert_eq!(manager.category_for(region, poi), DEFAULT_CATEGORY);
        manager.register_location(region, poi, "Fortress");
        assert_eq!(manager.category_for(region, poi), "city");
        manager.register_location(region, poi, "swamp");
        assert_eq!(manager.category_for(region, poi), "swamp");
    }

    #[test]
    fn test_decay_never_drops_below_minimum() {
        let mut manager = manager();
        let (region, poi) = (RegionId::new(), PoiId::new());
        manager.register_location(region, poi, "city");
        manager.calculate_tension(region, poi, start()).unwrap();
        let later = manager
            .calculate_tension(region, poi, start() + Duration::days(30))
            .unwrap();
        assert_eq!(later, 0.1);
    }

    #[test]
    fn test_decay_tension_over_five_days() {
        let config = TensionConfig::new(50.0, 0.2, 100.0, 10.0, 1.0, 1.0, 1.0);
        let decayed = decay_tension(80.0, Duration::days(5), &config);
        assert!(decayed < 80.0);
        assert!(decayed >= config.min_tension);
        assert!((decayed - 56.0).abs() < 1e-9);
    }

    #[test]
    fn test_clock_going_backwards_does_not_add_tension() {
        let mut manager = manager();
        let (region, poi) = (RegionId::new(), PoiId::new());
        let first = manager.calculate_tension(region, poi, start()).unwrap();
        let earlier = manager
            .calculate_tension(region, poi, start() - Duration::hours(5))
            .unwrap();
        assert_eq!(first, earlier);
    }

    #[test]
    fn test_update_applies_weighted_impacts_after_decay() {
        let mut manager = manager();
        let (region, poi) = (RegionId::new(), PoiId::new());
        manager.register_location(region, poi, "village");
        manager.calculate_tension(region, poi, start()).unwrap();

        let action = PlayerAction::new(PlayerActionKind::Theft);
        let mut death = NpcChange::new(NpcChangeKind::Death);
        death.civilian = true;
        let tension = manager
            .update_tension(region, poi, Some(&action), Some(&death), None, start() + Duration::hours(2))
            .unwrap();

        // village: base 0.1, decay 0.08/h floors at 0.0, then 0.2*1.0 + 0.3*0.6
        assert!((tension - 0.38).abs() < 1e-9);
        let state = manager.state(region, poi).unwrap();
        assert_eq!(state.recent_events.len(), 1);
    }

    #[test]
    fn test_update_clamps_to_max() {
        let mut manager = manager();
        let (region, poi) = (RegionId::new(), PoiId::new());
        manager.register_location(region, poi, "dungeon");
        let disaster = EnvironmentalChange::Disaster { severity: 1.0 };
        let murder = PlayerAction::new(PlayerActionKind::Murder);
        for hour in 0..10 {
            manager
                .update_tension(region, poi, Some(&murder), None, Some(&disaster), start() + Duration::hours(hour))
                .unwrap();
        }
        let tension = manager.calculate_tension(region, poi, start() + Duration::hours(10)).unwrap();
        assert!(tension <= 1.0);
    }

    #[test]
    fn test_modifier_applies_until_expiry() {
        let mut manager = manager();
        let (region, poi) = (RegionId::new(), PoiId::new());
        manager.register_location(region, poi, "dungeon");
        let with_relief = manager
            .add_tension_modifier(region, poi, "festival", -0.3, 2, "harvest fair", start())
            .unwrap();
        // dungeon floor is 0.5
        assert_eq!(with_relief, 0.5);
        let after = manager
            .calculate_tension(region, poi, start() + Duration::hours(3))
            .unwrap();
        assert!(after > with_relief);
        assert!(manager.state(region, poi).unwrap().modifiers.is_empty());
    }

    #[test]
    fn test_corrupt_state_surfaces_tension_error() {
        let mut manager = manager();
        let (region, poi) = (RegionId::new(), PoiId::new());
        let state = TensionState::new(f64::NAN, start());
        manager.restore([TensionSnapshot { region_id: region, poi_id: poi, state }]);
        let result = manager.calculate_tension(region, poi, start() + Duration::hours(1));
        assert!(matches!(result, Err(SimulationError::Tension { .. })));
    }

    #[test]
    fn test_regions_by_tension_sorted_descending() {
        let mut manager = manager();
        let calm = (RegionId::new(), PoiId::new());
        let tense = (RegionId::new(), PoiId::new());
        manager.register_location(calm.0, calm.1, "village");
        manager.register_location(tense.0, tense.1, "dungeon");
        manager.calculate_tension(calm.0, calm.1, start()).unwrap();
        manager.calculate_tension(tense.0, tense.1, start()).unwrap();

        let ranked = manager.regions_by_tension(0.0, 1.0, start());
        assert_eq!(ranked[0].0, tense.0);
        assert_eq!(ranked[1].0, calm.0);
        assert!(manager.regions_by_tension(0.9, 1.0, start()).is_empty());
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut manager = manager();
        let (region, poi) = (RegionId::new(), PoiId::new());
        manager
            .update_tension(region, poi, Some(&PlayerAction::combat(3)), None, None, start())
            .unwrap();
        let snapshots = manager.snapshot();

        let mut restored = TensionManager::new(TensionConfigRegistry::default());
        restored.restore(snapshots);
        assert_eq!(restored.state(region, poi), manager.state(region, poi));
    }

    #[test]
    fn test_decay_all_reports_counts() {
        let mut manager = manager();
        let region = RegionId::new();
        manager.calculate_tension(region, PoiId::new(), start()).unwrap();
        manager.calculate_tension(region, PoiId::new(), start()).unwrap();
        manager.calculate_tension(RegionId::new(), PoiId::new(), start()).unwrap();
        let stats = manager.decay_all(start() + Duration::hours(4));
        assert_eq!(stats.regions_processed, 2);
        assert_eq!(stats.pois_processed, 3);
        assert_eq!(stats.failures, 0);
    }

    proptest! {
        #[test]
        fn prop_tension_stays_within_bounds(
            hours in proptest::collection::vec(0i64..500, 1..8),
            severities in proptest::collection::vec(0.0f64..5.0, 1..8),
            enemies in 0u32..40,
            category in prop::sample::select(vec!["city", "dungeon", "village", "swamp", "unknown"]),
        ) {
            let mut manager = manager();
            let (region, poi) = (RegionId::new(), PoiId::new());
            manager.register_location(region, poi, category);
            let config = manager.config_for(region, poi);
            let mut now = start();
            for (step, severity) in hours.iter().zip(severities.iter().cycle()) {
                now += Duration::hours(*step);
                let disaster = EnvironmentalChange::Disaster { severity: *severity };
                let combat = PlayerAction::combat(enemies).lethal();
                let tension = manager
                    .update_tension(region, poi, Some(&combat), None, Some(&disaster), now)
                    .unwrap();
                prop_assert!(tension >= config.min_tension && tension <= config.max_tension);
                let read = manager.calculate_tension(region, poi, now).unwrap();
                prop_assert!(read >= config.min_tension && read <= config.max_tension);
            }
        }

        /// Without modifiers, later reads never exceed earlier ones
        #[test]
        fn prop_decay_is_monotonic(
            first in 0i64..200,
            gap in 0i64..200,
            impacts in 0u32..10,
        ) {
            let mut manager = manager();
            let (region, poi) = (RegionId::new(), PoiId::new());
            manager.register_location(region, poi, "ruins");
            for _ in 0..impacts {
                manager
                    .update_tension(region, poi, Some(&PlayerAction::combat(2)), None, None, start())
                    .unwrap();
            }
            let t1 = manager.calculate_tension(region, poi, start() + Duration::hours(first)).unwrap();
            let t2 = manager
                .calculate_tension(region, poi, start() + Duration::hours(first + gap))
                .unwrap();
            prop_assert!(t2 <= t1);
        }

        /// Modifier expiry raises the reading, so only reads before it are ordered
        #[test]
        fn prop_decay_is_monotonic_while_modifiers_hold(
            duration in 2i64..300,
            first in 0i64..300,
            gap in 0i64..300,
            relief in -0.4f64..0.0,
        ) {
            let mut manager = manager();
            let (region, poi) = (RegionId::new(), PoiId::new());
            manager.register_location(region, poi, "ruins");
            manager
                .update_tension(region, poi, Some(&PlayerAction::combat(4).lethal()), None, None, start())
                .unwrap();
            manager
                .add_tension_modifier(region, poi, "festival", relief, duration, "harvest fair", start())
                .unwrap();
            let first = first % duration;
            let second = (first + gap).min(duration - 1);
            let t1 = manager.calculate_tension(region, poi, start() + Duration::hours(first)).unwrap();
            let t2 = manager.calculate_tension(region, poi, start() + Duration::hours(second)).unwrap();
            prop_assert!(t2 <= t1);
            prop_assert_eq!(manager.state(region, poi).unwrap().modifiers.len(), 1);
        }
    }
}
