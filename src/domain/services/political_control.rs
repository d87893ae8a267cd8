//! Political control engine - Regional dominance and its consequences
//!
//! Influence values are independent per faction and region; nothing forces
//! them to sum to one. Control is resolved by comparing them. Arithmetic on
//! missing or malformed values reads them as 0.0 so a continuously ticking
//! world never halts on partial data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::entities::{sanitize_unit, Faction, FactionType, Region, RegionAdjacency};
use crate::domain::value_objects::{
    ControlEffects, FactionControl, FactionId, GrowthFactors, PoliticalControlConfig, RegionId,
};

/// Influence gained by one region during a spread
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InfluenceSpread {
    pub region_id: RegionId,
    pub previous: f64,
    pub current: f64,
}

pub struct PoliticalControlEngine {
    config: PoliticalControlConfig,
}

impl PoliticalControlEngine {
    pub fn new(config: PoliticalControlConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PoliticalControlConfig {
        &self.config
    }

    /// Resolve which faction controls a region and how firmly
    ///
    /// Ties go to the lowest faction id. When the runner-up is within
    /// `contest_margin` of the leader, control drops to
    /// `leader - runner_up * contest_factor`. A non-empty `factions` map
    /// restricts candidates to known factions.
    pub fn calculate_faction_control(
        &self,
        region: &Region,
        factions: &BTreeMap<FactionId, Faction>,
    ) -> FactionControl {
        let mut leader: Option<(FactionId, f64)> = None;
        let mut runner_up = 0.0_f64;

        let candidates = region
            .faction_influence
            .keys()
            .filter(|id| factions.is_empty() || factions.contains_key(id))
            .map(|id| (*id, region.influence_of(*id)));

        for (faction_id, influence) in candidates {
            match leader {
                Some((_, best)) if influence <= best => runner_up = runner_up.max(influence),
                Some((_, best)) => {
                    runner_up = runner_up.max(best);
                    leader = Some((faction_id, influence));
                }
                None => leader = Some((faction_id, influence)),
            }
        }

        let Some((faction_id, top)) = leader else {
            return FactionControl::uncontrolled();
        };
        if top <= 0.0 {
            return FactionControl::uncontrolled();
        }

        let contested = runner_up > 0.0 && top - runner_up < self.config.contest_margin;
        let control_level = if contested {
            top - runner_up * self.config.contest_factor
        } else {
            top
        };

        FactionControl {
            controlling_faction: Some(faction_id),
            control_level: sanitize_unit(control_level),
            contested,
        }
    }

    /// Write the resolved control onto the region; true when the controller changed
    pub fn update_region_control(
        &self,
        region: &mut Region,
        factions: &BTreeMap<FactionId, Faction>,
    ) -> bool {
        let control = self.calculate_faction_control(region, factions);
        let changed = region.controlling_faction != control.controlling_faction;
        region.controlling_faction = control.controlling_faction;
        region.control_level = control.control_level;
        if changed {
            debug!(
                region_id = %region.id,
                controller = ?control.controlling_faction,
                control_level = control.control_level,
                "region control changed"
            );
        }
        changed
    }

    /// Apply the controller's type-specific effects to stability and resources
    pub fn apply_faction_control_effects(
        &self,
        region: &mut Region,
        faction: &Faction,
        control_level: f64,
    ) -> ControlEffects {
        let control = sanitize_unit(control_level);
        let stability = region.stability_value();
        let resources = region.resources_value();
        let mut new_stability = stability;
        let mut new_resources = resources;

        match faction.faction_type {
            FactionType::Political => new_stability += control * self.config.influence_weight,
            FactionType::Guild => new_resources += control * self.config.resource_weight,
            _ => {}
        }

        if Faction::attribute(faction.power) > self.config.power_threshold {
            // Military upkeep
            let extraction = control * self.config.effect_strength * self.config.extraction_rate;
            new_resources -= extraction;
            new_stability -= extraction * self.config.stability_penalty_ratio;
        }

        let new_stability = sanitize_unit(new_stability);
        let new_resources = sanitize_unit(new_resources);
        region.stability = new_stability;
        region.resources = new_resources;

        ControlEffects {
            stability_delta: new_stability - stability,
            resources_delta: new_resources - resources,
        }
    }

    /// Multiplicative growth modifiers from the region and its controller
    pub fn calculate_population_growth_factors(
        &self,
        region: &Region,
        factions: &BTreeMap<FactionId, Faction>,
    ) -> GrowthFactors {
        let controller = region
            .controlling_faction
            .and_then(|id| factions.get(&id));
        let control = sanitize_unit(region.control_level);
        let weight = self.config.growth_attribute_weight * control;

        let (reputation, wealth, power) = controller
            .map(|f| {
                (
                    Faction::attribute(f.reputation).clamp(-100.0, 100.0) / 100.0,
                    Faction::attribute(f.wealth).clamp(0.0, 100.0) / 100.0,
                    Faction::attribute(f.power).clamp(0.0, 100.0) / 100.0,
                )
            })
            .unwrap_or((0.0, 0.0, 0.0));

        GrowthFactors {
            stability: (0.5 + region.stability_value()) * (1.0 + weight * reputation),
            resources: (0.5 + region.resources_value()) * (1.0 + weight * wealth),
            danger: (1.0 - 0.5 * region.danger_value()) * (1.0 + weight * power),
        }
    }

    /// Grow or shrink population by the base rate scaled by growth factors
    pub fn update_region_population(
        &self,
        region: &mut Region,
        factions: &BTreeMap<FactionId, Faction>,
        base_growth_rate: f64,
    ) -> u64 {
        let combined = self
            .calculate_population_growth_factors(region, factions)
            .combined();
        let rate = if base_growth_rate.is_finite() {
            base_growth_rate
        } else {
            0.0
        };

        let projected = region.population as f64 * (1.0 + rate * combined);
        let population = if projected.is_finite() {
            projected.round().clamp(0.0, region.max_population as f64) as u64
        } else {
            region.population.min(region.max_population)
        };
        region.population = population;
        population
    }

    /// Push a faction's influence from a source region into its neighbours
    ///
    /// Only attractive, safe regions receive influence; it never decreases.
    pub fn spread_faction_influence(
        &self,
        faction_id: FactionId,
        faction: &mut Faction,
        regions: &mut BTreeMap<RegionId, Region>,
        adjacency: &RegionAdjacency,
        source_region_id: RegionId,
        influence_strength: f64,
    ) -> Vec<InfluenceSpread> {
        if !influence_strength.is_finite() || influence_strength <= 0.0 {
            return Vec::new();
        }

        let mut spreads = Vec::new();
        for neighbor_id in adjacency.neighbors(source_region_id) {
            let Some(region) = regions.get_mut(neighbor_id) else {
                continue;
            };
            let resources = region.resources_value();
            let danger = region.danger_value();
            if resources < self.config.min_resource_gate || danger > self.config.max_danger_gate {
                continue;
            }

            let gain = influence_strength * self.config.spread_rate * resources * (1.0 - danger);
            if gain <= 0.0 {
                continue;
            }
            let previous = region.influence_of(faction_id);
            let current = (previous + gain).min(1.0).max(previous);
            if current == previous {
                continue;
            }
            region.faction_influence.insert(faction_id, current);
            faction
                .territory
                .record_influence(*neighbor_id, current, self.config.territory_threshold);
            spreads.push(InfluenceSpread {
                region_id: *neighbor_id,
                previous,
                current,
            });
        }
        spreads
    }

    /// Erode every faction's hold on a region; entries that hit zero are dropped
    pub fn decay_faction_influence(&self, region: &mut Region, amount: f64) -> Vec<FactionId> {
        if !amount.is_finite() || amount <= 0.0 {
            return Vec::new();
        }
        let mut dropped = Vec::new();
        for (faction_id, influence) in region.faction_influence.iter_mut() {
            let current = if influence.is_finite() { *influence } else { 0.0 };
            *influence = (current - amount).max(0.0);
            if *influence == 0.0 {
                dropped.push(*faction_id);
            }
        }
        for faction_id in &dropped {
            region.faction_influence.remove(faction_id);
        }
        dropped
    }
}

impl Default for PoliticalControlEngine {
    fn default() -> Self {
        Self::new(PoliticalControlConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> PoliticalControlEngine {
        PoliticalControlEngine::default()
    }

    fn factions(list: Vec<Faction>) -> BTreeMap<FactionId, Faction> {
        list.into_iter().map(|f| (f.id, f)).collect()
    }

    #[test]
    fn test_strongest_faction_controls_region() {
        let first = Faction::new("Crown", FactionType::Political);
        let third = Faction::new("Guild of Coin", FactionType::Guild);
        let region = Region::new("Highmoor")
            .with_influence(first.id, 0.9)
            .with_influence(third.id, 0.6);
        let roster = factions(vec![first.clone(), third]);

        let control = engine().calculate_faction_control(&region, &roster);
        assert_eq!(control.controlling_faction, Some(first.id));
        assert!((control.control_level - 0.9).abs() < 1e-9);
        assert!(!control.contested);
    }

    #[test]
    fn test_control_is_deterministic() {
        let a = FactionId::new();
        let b = FactionId::new();
        let region = Region::new("Split Vale")
            .with_influence(a, 0.5)
            .with_influence(b, 0.5);
        let first = engine().calculate_faction_control(&region, &BTreeMap::new());
        let second = engine().calculate_faction_control(&region, &BTreeMap::new());
        assert_eq!(first, second);
        // Exact tie goes to the lower id and is contested
        assert_eq!(first.controlling_faction, Some(a.min(b)));
        assert!(first.contested);
        assert!((first.control_level - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_contested_control_is_reduced() {
        let a = FactionId::new();
        let b = FactionId::new();
        let region = Region::new("Border")
            .with_influence(a, 0.7)
            .with_influence(b, 0.6);
        let control = engine().calculate_faction_control(&region, &BTreeMap::new());
        assert_eq!(control.controlling_faction, Some(a));
        assert!((control.control_level - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_empty_influence_has_no_controller() {
        let region = Region::new("Wastes");
        let control = engine().calculate_faction_control(&region, &BTreeMap::new());
        assert_eq!(control, FactionControl::uncontrolled());

        let ghost = Region::new("Ghost Town").with_influence(FactionId::new(), f64::NAN);
        let control = engine().calculate_faction_control(&ghost, &BTreeMap::new());
        assert_eq!(control.controlling_faction, None);
    }

    #[test]
    fn test_unknown_factions_are_ignored_when_roster_given() {
        let known = Faction::new("Wardens", FactionType::Military);
        let region = Region::new("Pass")
            .with_influence(FactionId::new(), 0.9)
            .with_influence(known.id, 0.3);
        let control = engine().calculate_faction_control(&region, &factions(vec![known.clone()]));
        assert_eq!(control.controlling_faction, Some(known.id));
    }

    #[test]
    fn test_political_control_raises_stability() {
        let crown = Faction::new("Crown", FactionType::Political);
        let mut region = Region::new("Capital").with_stability(0.5).with_resources(0.5);
        let effects = engine().apply_faction_control_effects(&mut region, &crown, 0.8);
        assert!((effects.stability_delta - 0.08).abs() < 1e-9);
        assert_eq!(effects.resources_delta, 0.0);
    }

    #[test]
    fn test_guild_control_raises_resources() {
        let guild = Faction::new("Salt Guild", FactionType::Guild);
        let mut region = Region::new("Saltmarsh").with_resources(0.95);
        let effects = engine().apply_faction_control_effects(&mut region, &guild, 1.0);
        // bounded at 1.0
        assert!((effects.resources_delta - 0.05).abs() < 1e-9);
        assert_eq!(region.resources, 1.0);
    }

    #[test]
    fn test_powerful_faction_extracts_resources() {
        let army = Faction::new("Iron Legion", FactionType::Military).with_power(85.0);
        let mut region = Region::new("Garrison").with_stability(0.5).with_resources(0.5);
        let effects = engine().apply_faction_control_effects(&mut region, &army, 1.0);
        assert!((effects.resources_delta + 0.05).abs() < 1e-9);
        assert!((effects.stability_delta + 0.025).abs() < 1e-9);
    }

    #[test]
    fn test_effects_keep_values_in_unit_range() {
        let army = Faction::new("Horde", FactionType::Political).with_power(100.0);
        let mut region = Region::new("Ruin").with_stability(0.0).with_resources(0.0);
        engine().apply_faction_control_effects(&mut region, &army, 1.0);
        assert!((0.0..=1.0).contains(&region.stability));
        assert!((0.0..=1.0).contains(&region.resources));
    }

    #[test]
    fn test_growth_factors_without_controller() {
        let region = Region::new("Hamlet").with_stability(0.5).with_resources(0.5).with_danger(0.0);
        let factors = engine().calculate_population_growth_factors(&region, &BTreeMap::new());
        assert_eq!(factors.stability, 1.0);
        assert_eq!(factors.resources, 1.0);
        assert_eq!(factors.danger, 1.0);
    }

    #[test]
    fn test_wealthy_controller_boosts_growth() {
        let guild = Faction::new("Merchants", FactionType::Guild).with_wealth(100.0);
        let mut region = Region::new("Market")
            .with_stability(0.5)
            .with_resources(0.5)
            .with_influence(guild.id, 1.0);
        let roster = factions(vec![guild]);
        engine().update_region_control(&mut region, &roster);
        let factors = engine().calculate_population_growth_factors(&region, &roster);
        assert!((factors.resources - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_population_is_clamped_to_capacity() {
        let mut region = Region::new("Boomtown")
            .with_population(990, 1000)
            .with_stability(1.0)
            .with_resources(1.0);
        let population = engine().update_region_population(&mut region, &BTreeMap::new(), 0.5);
        assert_eq!(population, 1000);

        let mut famine = Region::new("Famine").with_population(100, 1000);
        let population = engine().update_region_population(&mut famine, &BTreeMap::new(), -10.0);
        assert_eq!(population, 0);
    }

    #[test]
    fn test_spread_reaches_only_attractive_safe_neighbours() {
        let mut faction = Faction::new("Green Circle", FactionType::Religious);
        let source = Region::new("Grove");
        let fertile = Region::new("Meadow").with_resources(0.8).with_danger(0.1);
        let barren = Region::new("Salt Flats").with_resources(0.1);
        let haunted = Region::new("Barrows").with_resources(0.9).with_danger(0.9);

        let mut adjacency = RegionAdjacency::new();
        for neighbor in [&fertile, &barren, &haunted] {
            adjacency.connect(source.id, neighbor.id);
        }
        let mut regions: BTreeMap<RegionId, Region> = [source.clone(), fertile.clone(), barren, haunted]
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        let spreads = engine().spread_faction_influence(
            faction.id,
            &mut faction,
            &mut regions,
            &adjacency,
            source.id,
            1.0,
        );
        assert_eq!(spreads.len(), 1);
        assert_eq!(spreads[0].region_id, fertile.id);
        // 1.0 * 0.1 * 0.8 * 0.9
        assert!((spreads[0].current - 0.072).abs() < 1e-9);
        assert_eq!(faction.territory.influence_in(fertile.id), spreads[0].current);
    }

    #[test]
    fn test_zero_strength_spread_changes_nothing() {
        let mut faction = Faction::new("Quiet Hand", FactionType::Criminal);
        let source = Region::new("Docks");
        let neighbor = Region::new("Warehouses")
            .with_resources(0.9)
            .with_influence(faction.id, 0.3);
        let mut adjacency = RegionAdjacency::new();
        adjacency.connect(source.id, neighbor.id);
        let mut regions: BTreeMap<RegionId, Region> =
            [source.clone(), neighbor].into_iter().map(|r| (r.id, r)).collect();
        let before = regions.clone();

        for strength in [0.0, -1.0, f64::NAN] {
            let spreads = engine().spread_faction_influence(
                faction.id,
                &mut faction,
                &mut regions,
                &adjacency,
                source.id,
                strength,
            );
            assert!(spreads.is_empty());
        }
        assert_eq!(regions, before);
    }

    #[test]
    fn test_spread_caps_at_one_and_joins_territory() {
        let mut faction = Faction::new("Crown", FactionType::Political);
        let source = Region::new("Throne");
        let neighbor = Region::new("Vassal")
            .with_resources(1.0)
            .with_influence(faction.id, 0.98);
        let mut adjacency = RegionAdjacency::new();
        adjacency.connect(source.id, neighbor.id);
        let neighbor_id = neighbor.id;
        let mut regions: BTreeMap<RegionId, Region> =
            [source.clone(), neighbor].into_iter().map(|r| (r.id, r)).collect();

        engine().spread_faction_influence(faction.id, &mut faction, &mut regions, &adjacency, source.id, 5.0);
        assert_eq!(regions[&neighbor_id].influence_of(faction.id), 1.0);
        assert!(faction.territory.regions.contains(&neighbor_id));
    }

    #[test]
    fn test_influence_decay_drops_exhausted_entries() {
        let strong = FactionId::new();
        let weak = FactionId::new();
        let mut region = Region::new("Crossroads")
            .with_influence(strong, 0.5)
            .with_influence(weak, 0.005);
        let dropped = engine().decay_faction_influence(&mut region, 0.01);
        assert_eq!(dropped, vec![weak]);
        assert!((region.influence_of(strong) - 0.49).abs() < 1e-9);
    }
}
