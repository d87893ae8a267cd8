//! War state machine
//!
//! NoWar -> AtWar -> NegotiatingPeace -> Concluded, with a rejected offer
//! sending a negotiating war back to AtWar. Every transition that is not
//! allowed from the current phase is a `StateTransition` error.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::entities::{
    Battle, PairTensionChange, PeaceOffer, Region, ResourceTransfer, TerritorialChange, WarOutcome,
    WarOutcomeType, WarPhase, WarState,
};
use crate::domain::errors::{SimulationError, SimulationResult};
use crate::domain::value_objects::{BattleId, FactionId, RegionId, WarConfig};

const DEFAULT_TERRAIN: &str = "plains";

/// Defensive multiplier granted by the battlefield
pub fn terrain_modifier(terrain: &str) -> f64 {
    match terrain {
        "mountains" | "mountain" => 1.3,
        "hills" => 1.2,
        "forest" => 1.15,
        "swamp" => 1.1,
        _ => 1.0,
    }
}

/// What a war needs from the world to advance one day
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WarContext {
    pub strength_a: f64,
    pub strength_b: f64,
    /// Biome of each disputed region, used as battle terrain
    pub terrain: BTreeMap<RegionId, String>,
}

/// Everything that happened during one advance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarAdvance {
    pub battle: Option<Battle>,
    pub peace_offer: Option<PeaceOffer>,
    pub outcome: Option<WarOutcome>,
}

pub struct WarManager {
    config: WarConfig,
}

impl WarManager {
    pub fn new(config: WarConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WarConfig {
        &self.config
    }

    /// Regions both sides have a stake in
    pub fn calculate_disputed_regions<'a>(
        &self,
        faction_a: FactionId,
        faction_b: FactionId,
        regions: impl IntoIterator<Item = &'a Region>,
    ) -> Vec<RegionId> {
        let threshold = self.config.dispute_threshold;
        regions
            .into_iter()
            .filter(|region| {
                let a = region.influence_of(faction_a);
                let b = region.influence_of(faction_b);
                let both_hold = a > 0.0 && b > 0.0;
                let controller_challenged = match region.controlling_faction {
                    Some(id) if id == faction_a => b >= threshold,
                    Some(id) if id == faction_b => a >= threshold,
                    _ => false,
                };
                both_hold || controller_challenged
            })
            .map(|region| region.id)
            .collect()
    }

    /// Open a war between two factions
    pub fn declare_war(
        &self,
        faction_a: FactionId,
        faction_b: FactionId,
        tension: f64,
        active_wars: &[WarState],
        disputed_regions: Vec<RegionId>,
        now: DateTime<Utc>,
    ) -> SimulationResult<WarState> {
        if faction_a == faction_b {
            return Err(SimulationError::transition(format!(
                "faction {faction_a} cannot declare war on itself"
            )));
        }
        if !self.config.should_declare(tension) {
            return Err(SimulationError::transition(format!(
                "tension {tension:.1} is below the war threshold {:.1}",
                self.config.war_threshold
            )));
        }
        if active_wars
            .iter()
            .any(|w| w.is_active && w.is_participant(faction_a) && w.is_participant(faction_b))
        {
            return Err(SimulationError::transition(format!(
                "factions {faction_a} and {faction_b} are already at war"
            )));
        }

        let war = WarState::new(faction_a, faction_b, disputed_regions, now);
        info!(
            war_id = %war.id,
            faction_a = %faction_a,
            faction_b = %faction_b,
            disputed = war.disputed_regions.len(),
            "war declared"
        );
        Ok(war)
    }

    fn require_phase(war: &WarState, phase: WarPhase, action: &str) -> SimulationResult<()> {
        if war.phase != phase {
            return Err(SimulationError::transition(format!(
                "cannot {action} war {} while {}",
                war.id, war.phase
            )));
        }
        Ok(())
    }

    /// Fight one battle and record it on the war
    #[allow(clippy::too_many_arguments)]
    pub fn simulate_battle<R: Rng + ?Sized>(
        &self,
        war: &mut WarState,
        attacker: FactionId,
        attacker_strength: f64,
        defender_strength: f64,
        region_id: Option<RegionId>,
        terrain: &str,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> SimulationResult<Battle> {
        Self::require_phase(war, WarPhase::AtWar, "fight a battle in")?;
        let defender = war
            .opponent_of(attacker)
            .ok_or_else(|| SimulationError::missing("war participant", attacker))?;

        let sanitize = |s: f64| if s.is_finite() { s.max(0.0) } else { 0.0 };
        let attack = sanitize(attacker_strength) * rng.gen_range(0.8..1.2);
        let defense = sanitize(defender_strength)
            * rng.gen_range(0.8..1.2)
            * self.config.defender_advantage
            * terrain_modifier(terrain);

        let total = attack + defense;
        let share = if total > 0.0 { attack / total } else { 0.5 };
        let winner = if share > 0.5 {
            Some(attacker)
        } else if share < 0.5 {
            Some(defender)
        } else {
            None
        };

        let effect = share - 0.5;
        let attacker_losses = (self.config.base_losses * (1.0 - effect)).clamp(0.05, 0.7);
        let defender_losses = (self.config.base_losses * (1.0 + effect)).clamp(0.05, 0.7);

        let max = self.config.max_exhaustion;
        war.add_exhaustion(attacker, attacker_losses * self.config.battle_exhaustion_factor, max);
        war.add_exhaustion(defender, defender_losses * self.config.battle_exhaustion_factor, max);

        let battle = Battle {
            id: BattleId::from_rng(rng),
            region_id,
            date: now,
            attacker,
            defender,
            winner,
            attacker_losses,
            defender_losses,
            terrain: terrain.to_string(),
        };
        debug!(
            war_id = %war.id,
            attacker = %attacker,
            winner = ?winner,
            attacker_losses,
            defender_losses,
            "battle fought"
        );
        war.battles.push(battle.clone());
        Ok(battle)
    }

    /// Advance a war by one simulated day
    pub fn advance_war<R: Rng + ?Sized>(
        &self,
        war: &mut WarState,
        context: &WarContext,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> SimulationResult<WarAdvance> {
        match war.phase {
            WarPhase::AtWar => self.advance_fighting(war, context, rng, now),
            WarPhase::NegotiatingPeace => {
                let mut advance = WarAdvance::default();
                if self.negotiation_ready(war, now) {
                    advance.outcome = Some(self.conclude_war(war, rng, now)?);
                }
                Ok(advance)
            }
            WarPhase::NoWar | WarPhase::Concluded => Err(SimulationError::transition(format!(
                "cannot advance war {} while {}",
                war.id, war.phase
            ))),
        }
    }

    fn advance_fighting<R: Rng + ?Sized>(
        &self,
        war: &mut WarState,
        context: &WarContext,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> SimulationResult<WarAdvance> {
        let mut advance = WarAdvance::default();
        let max = self.config.max_exhaustion;
        let (a, b) = (war.faction_a_id, war.faction_b_id);
        war.add_exhaustion(a, self.config.attrition_factor, max);
        war.add_exhaustion(b, self.config.attrition_factor, max);

        if rng.gen_bool(self.config.battle_chance.clamp(0.0, 1.0)) {
            let (attacker, attack, defense) = if rng.gen_bool(0.5) {
                (a, context.strength_a, context.strength_b)
            } else {
                (b, context.strength_b, context.strength_a)
            };
            let region_id = war.disputed_regions.choose(rng).copied();
            let terrain = region_id
                .and_then(|id| context.terrain.get(&id))
                .map(String::as_str)
                .unwrap_or(DEFAULT_TERRAIN);
            advance.battle =
                Some(self.simulate_battle(war, attacker, attack, defense, region_id, terrain, rng, now)?);
        }

        let limit = self.config.peace_exhaustion_fraction * max;
        let exhausted = war.exhaustion_a >= limit || war.exhaustion_b >= limit;
        if exhausted && !self.rejection_cooling(war, now) {
            let offered_by = if war.exhaustion_a >= war.exhaustion_b { a } else { b };
            let offer = PeaceOffer::new(offered_by, now).with_term("cease hostilities");
            self.offer_peace(war, offer.clone(), now)?;
            advance.peace_offer = Some(offer);
        }
        Ok(advance)
    }

    /// Open negotiations, or replace the offer on the table
    pub fn offer_peace(
        &self,
        war: &mut WarState,
        offer: PeaceOffer,
        now: DateTime<Utc>,
    ) -> SimulationResult<()> {
        if !war.is_participant(offer.offered_by) {
            return Err(SimulationError::missing("war participant", offer.offered_by));
        }
        match war.phase {
            WarPhase::AtWar => {
                war.phase = WarPhase::NegotiatingPeace;
                war.negotiation_started = Some(now);
            }
            WarPhase::NegotiatingPeace => {}
            WarPhase::NoWar | WarPhase::Concluded => {
                return Err(SimulationError::transition(format!(
                    "cannot offer peace in war {} while {}",
                    war.id, war.phase
                )))
            }
        }
        info!(war_id = %war.id, offered_by = %offer.offered_by, mutual = offer.mutual, "peace offered");
        war.current_peace_offer = Some(offer);
        Ok(())
    }

    /// Turn down the offer on the table and resume fighting
    pub fn reject_peace(&self, war: &mut WarState, now: DateTime<Utc>) -> SimulationResult<()> {
        Self::require_phase(war, WarPhase::NegotiatingPeace, "reject peace in")?;
        war.phase = WarPhase::AtWar;
        war.current_peace_offer = None;
        war.negotiation_started = None;
        war.peace_rejected_at = Some(now);
        debug!(war_id = %war.id, at = %now, "peace rejected");
        Ok(())
    }

    fn rejection_cooling(&self, war: &WarState, now: DateTime<Utc>) -> bool {
        war.peace_rejected_at
            .map(|at| (now - at).num_days() < self.config.peace_rejection_cooldown_days)
            .unwrap_or(false)
    }

    fn negotiation_ready(&self, war: &WarState, now: DateTime<Utc>) -> bool {
        war.negotiation_started
            .map(|started| (now - started).num_days() >= self.config.min_peace_duration_days)
            .unwrap_or(false)
    }

    fn exhaustion_gap(&self, war: &WarState) -> f64 {
        if self.config.max_exhaustion <= 0.0 {
            return 0.0;
        }
        (war.exhaustion_a - war.exhaustion_b).abs() / self.config.max_exhaustion
    }

    /// Decide how a negotiated war ends
    pub fn determine_outcome_type<R: Rng + ?Sized>(
        &self,
        war: &WarState,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> WarOutcomeType {
        let gap = self.exhaustion_gap(war);
        let mutual = war.current_peace_offer.as_ref().is_some_and(|o| o.mutual);
        let limit = self.config.peace_exhaustion_fraction * self.config.max_exhaustion;

        if mutual && gap < self.config.victory_margin {
            WarOutcomeType::WhitePeace
        } else if gap >= self.config.decisive_margin {
            WarOutcomeType::DecisiveVictory
        } else if gap >= self.config.victory_margin {
            WarOutcomeType::Victory
        } else if war.duration_days(now) >= self.config.stalemate_duration_days {
            WarOutcomeType::Stalemate
        } else if war.exhaustion_a >= limit && war.exhaustion_b >= limit {
            WarOutcomeType::Ceasefire
        } else {
            self.draw_outcome(rng)
        }
    }

    fn draw_outcome<R: Rng + ?Sized>(&self, rng: &mut R) -> WarOutcomeType {
        let valid = |w: &f64| w.is_finite() && *w > 0.0;
        let total: f64 = self.config.outcome_weights.values().filter(|w| valid(w)).sum();
        if total <= 0.0 {
            return WarOutcomeType::Stalemate;
        }
        let mut roll = rng.gen::<f64>() * total;
        let mut last = WarOutcomeType::Stalemate;
        for (outcome, weight) in &self.config.outcome_weights {
            if !valid(weight) {
                continue;
            }
            last = *outcome;
            if roll < *weight {
                return *outcome;
            }
            roll -= weight;
        }
        last
    }

    /// Less exhausted side, then more battle wins, then faction A
    fn winner_of(war: &WarState) -> (FactionId, FactionId) {
        let (a, b) = (war.faction_a_id, war.faction_b_id);
        let a_wins = if war.exhaustion_a != war.exhaustion_b {
            war.exhaustion_a < war.exhaustion_b
        } else {
            war.battle_wins(a) >= war.battle_wins(b)
        };
        if a_wins {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Sign the peace and archive the war
    pub fn conclude_war<R: Rng + ?Sized>(
        &self,
        war: &mut WarState,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> SimulationResult<WarOutcome> {
        Self::require_phase(war, WarPhase::NegotiatingPeace, "conclude")?;
        if !self.negotiation_ready(war, now) {
            return Err(SimulationError::transition(format!(
                "war {} needs {} days of negotiation before peace",
                war.id, self.config.min_peace_duration_days
            )));
        }

        let outcome_type = self.determine_outcome_type(war, rng, now);
        let outcome = self.build_outcome(war, outcome_type, now);

        war.is_active = false;
        war.phase = WarPhase::Concluded;
        war.outcome = Some(outcome.clone());
        info!(
            war_id = %war.id,
            outcome = %outcome_type,
            winner = ?outcome.winner,
            duration_days = outcome.duration_days,
            "war concluded"
        );
        Ok(outcome)
    }

    fn build_outcome(&self, war: &WarState, outcome_type: WarOutcomeType, now: DateTime<Utc>) -> WarOutcome {
        let (winner, loser) = if outcome_type.has_winner() {
            let (winner, loser) = Self::winner_of(war);
            (Some(winner), Some(loser))
        } else {
            (None, None)
        };

        let mut territorial_changes = Vec::new();
        let mut resource_transfers = Vec::new();
        let mut reputation_changes = BTreeMap::new();

        if let (Some(winner), Some(loser)) = (winner, loser) {
            let share = outcome_type.territory_share();
            let count = (war.disputed_regions.len() as f64 * share).round() as usize;
            territorial_changes = war
                .disputed_regions
                .iter()
                .take(count)
                .map(|region_id| TerritorialChange {
                    region_id: *region_id,
                    from: loser,
                    to: winner,
                })
                .collect();

            let rate = match outcome_type {
                WarOutcomeType::DecisiveVictory => 0.3,
                _ => 0.1,
            };
            let exhaustion_fraction = if self.config.max_exhaustion > 0.0 {
                war.exhaustion_of(loser) / self.config.max_exhaustion
            } else {
                0.0
            };
            let amount = rate * self.config.reparation_base * exhaustion_fraction;
            if amount > 0.0 {
                resource_transfers.push(ResourceTransfer {
                    from: loser,
                    to: winner,
                    amount,
                });
            }

            let swing = match outcome_type {
                WarOutcomeType::DecisiveVictory => 15.0,
                _ => 10.0,
            };
            reputation_changes.insert(winner, swing);
            reputation_changes.insert(loser, -swing);
        } else if outcome_type == WarOutcomeType::WhitePeace {
            reputation_changes.insert(war.faction_a_id, 5.0);
            reputation_changes.insert(war.faction_b_id, 5.0);
        }

        let casualties = [war.faction_a_id, war.faction_b_id]
            .into_iter()
            .map(|id| {
                let count = (war.total_losses(id) * self.config.casualty_scale).round();
                (id, if count.is_finite() { count.max(0.0) as u64 } else { 0 })
            })
            .collect();

        WarOutcome {
            war_id: war.id,
            winner,
            loser,
            outcome_type,
            territorial_changes,
            resource_transfers,
            reputation_changes,
            tension_changes: vec![PairTensionChange {
                pair: war.pair(),
                delta: outcome_type.tension_change(),
            }],
            casualties,
            duration_days: war.duration_days(now),
            treaty_duration_days: outcome_type.treaty_duration_days(),
            concluded_at: now,
        }
    }
}

impl Default for WarManager {
    fn default() -> Self {
        Self::new(WarConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(2024)
    }

    fn war_between(disputed: Vec<RegionId>) -> WarState {
        WarManager::default()
            .declare_war(FactionId::new(), FactionId::new(), 85.0, &[], disputed, now())
            .unwrap()
    }

    fn negotiating(mut war: WarState, exhaustion_a: f64, exhaustion_b: f64) -> WarState {
        war.exhaustion_a = exhaustion_a;
        war.exhaustion_b = exhaustion_b;
        let offer = PeaceOffer::new(war.faction_a_id, now());
        WarManager::default().offer_peace(&mut war, offer, now()).unwrap();
        war
    }

    #[test]
    fn test_declare_war_rules() {
        let manager = WarManager::default();
        let a = FactionId::new();
        let b = FactionId::new();
        assert!(matches!(
            manager.declare_war(a, a, 90.0, &[], vec![], now()),
            Err(SimulationError::StateTransition(_))
        ));
        assert!(manager.declare_war(a, b, 40.0, &[], vec![], now()).is_err());

        let war = manager.declare_war(a, b, 70.0, &[], vec![], now()).unwrap();
        assert_eq!(war.phase, WarPhase::AtWar);
        assert_eq!((war.exhaustion_a, war.exhaustion_b), (0.0, 0.0));
        assert!(manager.declare_war(b, a, 90.0, &[war], vec![], now()).is_err());
    }

    #[test]
    fn test_disputed_regions() {
        let manager = WarManager::default();
        let a = FactionId::new();
        let b = FactionId::new();
        let c = FactionId::new();
        let shared = Region::new("Shared").with_influence(a, 0.5).with_influence(b, 0.3);
        let mut held = Region::new("Held").with_influence(b, 0.25);
        held.controlling_faction = Some(a);
        let other = Region::new("Other").with_influence(b, 0.6).with_influence(c, 0.4);

        let disputed = manager.calculate_disputed_regions(a, b, [&shared, &held, &other]);
        assert_eq!(disputed, vec![shared.id, held.id]);
        assert!(manager.calculate_disputed_regions(a, b, []).is_empty());
    }

    #[test]
    fn test_battle_records_losses_and_exhaustion() {
        let manager = WarManager::default();
        let mut war = war_between(vec![]);
        let attacker = war.faction_a_id;
        let battle = manager
            .simulate_battle(&mut war, attacker, 500.0, 50.0, None, "plains", &mut rng(), now())
            .unwrap();
        assert_eq!(battle.winner, Some(attacker));
        assert!(battle.attacker_losses < battle.defender_losses);
        for losses in [battle.attacker_losses, battle.defender_losses] {
            assert!((0.05..=0.7).contains(&losses));
        }
        assert!(war.exhaustion_b > war.exhaustion_a);
        assert_eq!(war.battles.len(), 1);
    }

    #[test]
    fn test_battle_outside_active_war_is_rejected() {
        let manager = WarManager::default();
        let mut war = negotiating(war_between(vec![]), 10.0, 10.0);
        let attacker = war.faction_a_id;
        let result = manager.simulate_battle(&mut war, attacker, 1.0, 1.0, None, "hills", &mut rng(), now());
        assert!(matches!(result, Err(SimulationError::StateTransition(_))));
    }

    #[test]
    fn test_terrain_favours_defender() {
        assert!(terrain_modifier("mountains") > terrain_modifier("forest"));
        assert_eq!(terrain_modifier("plains"), 1.0);
    }

    #[test]
    fn test_exhaustion_opens_negotiations() {
        let manager = WarManager::new(WarConfig {
            battle_chance: 0.0,
            ..WarConfig::default()
        });
        let mut war = war_between(vec![]);
        war.exhaustion_b = 59.5;
        let advance = manager
            .advance_war(&mut war, &WarContext::default(), &mut rng(), now())
            .unwrap();
        assert!(advance.battle.is_none());
        assert_eq!(war.phase, WarPhase::NegotiatingPeace);
        assert_eq!(advance.peace_offer.unwrap().offered_by, war.faction_b_id);
        assert_eq!(war.exhaustion_a, 1.0);
    }

    #[test]
    fn test_exhaustion_is_capped() {
        let manager = WarManager::default();
        let mut war = war_between(vec![]);
        war.exhaustion_a = 99.5;
        let advance = manager
            .advance_war(&mut war, &WarContext::default(), &mut rng(), now())
            .unwrap();
        assert!(war.exhaustion_a <= 100.0);
        assert!(advance.peace_offer.is_some());
    }

    #[test]
    fn test_conclude_requires_negotiation_time() {
        let manager = WarManager::default();
        let mut fighting = war_between(vec![]);
        assert!(manager.conclude_war(&mut fighting, &mut rng(), now()).is_err());

        let mut war = negotiating(war_between(vec![]), 80.0, 20.0);
        let early = manager.conclude_war(&mut war, &mut rng(), now() + Duration::days(3));
        assert!(matches!(early, Err(SimulationError::StateTransition(_))));
        assert_eq!(war.phase, WarPhase::NegotiatingPeace);
    }

    #[test]
    fn test_decisive_victory_outcome() {
        let manager = WarManager::default();
        let regions: Vec<RegionId> = (0..5).map(|_| RegionId::new()).collect();
        let mut war = negotiating(war_between(regions.clone()), 90.0, 20.0);
        let outcome = manager
            .conclude_war(&mut war, &mut rng(), now() + Duration::days(8))
            .unwrap();

        assert_eq!(outcome.outcome_type, WarOutcomeType::DecisiveVictory);
        assert_eq!(outcome.winner, Some(war.faction_b_id));
        assert_eq!(outcome.territorial_changes.len(), 4);
        assert_eq!(outcome.territorial_changes[0].region_id, regions[0]);
        assert_eq!(outcome.reputation_changes[&war.faction_b_id], 15.0);
        // 0.3 * 100 * 0.9
        assert!((outcome.resource_transfers[0].amount - 27.0).abs() < 1e-9);
        assert_eq!(outcome.treaty_duration_days, 60);
        assert!(!war.is_active);
        assert_eq!(war.phase, WarPhase::Concluded);
        assert!(manager.conclude_war(&mut war, &mut rng(), now() + Duration::days(9)).is_err());
    }

    #[test]
    fn test_victory_and_white_peace() {
        let manager = WarManager::default();
        let mut war = negotiating(war_between(vec![RegionId::new(), RegionId::new()]), 30.0, 60.0);
        let outcome = manager
            .conclude_war(&mut war, &mut rng(), now() + Duration::days(7))
            .unwrap();
        assert_eq!(outcome.outcome_type, WarOutcomeType::Victory);
        assert_eq!(outcome.winner, Some(war.faction_a_id));
        assert_eq!(outcome.territorial_changes.len(), 1);

        let mut war = war_between(vec![]);
        war.exhaustion_a = 40.0;
        war.exhaustion_b = 45.0;
        let offer = PeaceOffer::new(war.faction_a_id, now()).mutual();
        manager.offer_peace(&mut war, offer, now()).unwrap();
        let outcome = manager
            .conclude_war(&mut war, &mut rng(), now() + Duration::days(7))
            .unwrap();
        assert_eq!(outcome.outcome_type, WarOutcomeType::WhitePeace);
        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.reputation_changes.values().sum::<f64>(), 10.0);
    }

    #[test]
    fn test_long_even_war_is_stalemate() {
        let manager = WarManager::default();
        let mut war = negotiating(war_between(vec![]), 30.0, 35.0);
        let outcome = manager
            .conclude_war(&mut war, &mut rng(), now() + Duration::days(120))
            .unwrap();
        assert_eq!(outcome.outcome_type, WarOutcomeType::Stalemate);
        assert_eq!(outcome.duration_days, 120);
    }

    #[test]
    fn test_mutually_exhausted_war_is_ceasefire() {
        let manager = WarManager::default();
        let mut war = negotiating(war_between(vec![]), 70.0, 75.0);
        let outcome = manager
            .conclude_war(&mut war, &mut rng(), now() + Duration::days(10))
            .unwrap();
        assert_eq!(outcome.outcome_type, WarOutcomeType::Ceasefire);
    }

    #[test]
    fn test_weighted_draw_respects_single_weight() {
        let mut weights = BTreeMap::new();
        weights.insert(WarOutcomeType::Ceasefire, 1.0);
        weights.insert(WarOutcomeType::Victory, 0.0);
        let manager = WarManager::new(WarConfig {
            outcome_weights: weights,
            ..WarConfig::default()
        });
        let war = war_between(vec![]);
        for seed in 0..10 {
            let drawn = manager.determine_outcome_type(&war, &mut ChaCha8Rng::seed_from_u64(seed), now());
            assert_eq!(drawn, WarOutcomeType::Ceasefire);
        }
    }

    #[test]
    fn test_reject_peace_resumes_war() {
        let manager = WarManager::default();
        let mut war = negotiating(war_between(vec![]), 10.0, 10.0);
        manager.reject_peace(&mut war, now()).unwrap();
        assert_eq!(war.phase, WarPhase::AtWar);
        assert!(war.current_peace_offer.is_none());
        assert!(manager.reject_peace(&mut war, now()).is_err());
    }

    #[test]
    fn test_rejected_peace_is_not_reoffered_until_cooldown() {
        let manager = WarManager::new(WarConfig {
            battle_chance: 0.0,
            ..WarConfig::default()
        });
        let mut war = negotiating(war_between(vec![]), 80.0, 10.0);
        manager.reject_peace(&mut war, now()).unwrap();
        assert_eq!(war.peace_rejected_at, Some(now()));

        for day in 1..7 {
            let advance = manager
                .advance_war(&mut war, &WarContext::default(), &mut rng(), now() + Duration::days(day))
                .unwrap();
            assert!(advance.peace_offer.is_none());
            assert_eq!(war.phase, WarPhase::AtWar);
        }

        let advance = manager
            .advance_war(&mut war, &WarContext::default(), &mut rng(), now() + Duration::days(7))
            .unwrap();
        assert_eq!(advance.peace_offer.unwrap().offered_by, war.faction_a_id);
        assert_eq!(war.phase, WarPhase::NegotiatingPeace);
    }

    #[test]
    fn test_advance_concludes_after_negotiation() {
        let manager = WarManager::default();
        let mut war = negotiating(war_between(vec![]), 80.0, 10.0);
        let waiting = manager
            .advance_war(&mut war, &WarContext::default(), &mut rng(), now() + Duration::days(1))
            .unwrap();
        assert!(waiting.outcome.is_none());
        let done = manager
            .advance_war(&mut war, &WarContext::default(), &mut rng(), now() + Duration::days(7))
            .unwrap();
        assert!(done.outcome.is_some());
        assert!(manager
            .advance_war(&mut war, &WarContext::default(), &mut rng(), now() + Duration::days(8))
            .is_err());
    }
}
