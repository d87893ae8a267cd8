//! War Service - Declaring, advancing and concluding wars between factions
//!
//! Drives the war state machine against stored wars and applies a
//! concluded war's outcome back onto regions, factions and relationships.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::application::ports::outbound::{
    EventPublisherPort, FactionRepositoryPort, RegionRepositoryPort, RelationshipRepositoryPort,
    WarRepositoryPort,
};
use crate::application::services::{publish_event, SharedRng};
use crate::domain::entities::{
    Faction, FactionPair, FactionRelationship, PeaceOffer, WarOutcome, WarState,
};
use crate::domain::events::{DomainEvent, EventMetadata};
use crate::domain::services::{
    calculate_faction_schism_probability, calculate_war_chance, roll_schism, update_faction_tension,
    PoliticalControlEngine, SchismAssessment, WarAdvance, WarContext, WarManager,
};
use crate::domain::value_objects::{
    FactionId, RelationshipConfig, SchismConfig, WarId,
};

/// Fighting strength a faction brings to battle
fn military_strength(faction: &Faction) -> f64 {
    (Faction::attribute(faction.power) + Faction::attribute(faction.wealth) * 0.25).max(1.0)
}

pub struct WarService {
    manager: WarManager,
    control: PoliticalControlEngine,
    schism_config: SchismConfig,
    relationship_config: RelationshipConfig,
    wars: Arc<dyn WarRepositoryPort>,
    factions: Arc<dyn FactionRepositoryPort>,
    regions: Arc<dyn RegionRepositoryPort>,
    relationships: Arc<dyn RelationshipRepositoryPort>,
    events: Arc<dyn EventPublisherPort>,
    rng: SharedRng,
}

impl WarService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        manager: WarManager,
        wars: Arc<dyn WarRepositoryPort>,
        factions: Arc<dyn FactionRepositoryPort>,
        regions: Arc<dyn RegionRepositoryPort>,
        relationships: Arc<dyn RelationshipRepositoryPort>,
        events: Arc<dyn EventPublisherPort>,
        rng: SharedRng,
    ) -> Self {
        Self {
            manager,
            control: PoliticalControlEngine::default(),
            schism_config: SchismConfig::default(),
            relationship_config: RelationshipConfig::default(),
            wars,
            factions,
            regions,
            relationships,
            events,
            rng,
        }
    }

    pub fn with_control_engine(mut self, control: PoliticalControlEngine) -> Self {
        self.control = control;
        self
    }

    pub fn with_schism_config(mut self, config: SchismConfig) -> Self {
        self.schism_config = config;
        self
    }

    pub fn with_relationship_config(mut self, config: RelationshipConfig) -> Self {
        self.relationship_config = config;
        self
    }

    async fn require_faction(&self, faction_id: FactionId) -> Result<Faction> {
        self.factions
            .get(faction_id)
            .await
            .context("Failed to get faction")?
            .ok_or_else(|| anyhow::anyhow!("Faction not found: {}", faction_id))
    }

    async fn require_war(&self, war_id: WarId) -> Result<WarState> {
        self.wars
            .get(war_id)
            .await
            .context("Failed to get war")?
            .ok_or_else(|| anyhow::anyhow!("War not found: {}", war_id))
    }

    pub async fn get_war(&self, war_id: WarId) -> Result<Option<WarState>> {
        self.wars.get(war_id).await.context("Failed to get war")
    }

    pub async fn active_wars(&self) -> Result<Vec<WarState>> {
        self.wars.list_active().await.context("Failed to list active wars")
    }

    // =========================================================================
    // Declaration
    // =========================================================================

    /// Open a war if the pair's relationship tension has reached the threshold
    #[instrument(skip(self))]
    pub async fn declare_war(
        &self,
        faction_a: FactionId,
        faction_b: FactionId,
        now: DateTime<Utc>,
    ) -> Result<WarState> {
        self.require_faction(faction_a).await?;
        self.require_faction(faction_b).await?;

        let tension = self
            .relationships
            .get(FactionPair::new(faction_a, faction_b))
            .await
            .context("Failed to get relationship")?
            .map(|r| r.tension)
            .unwrap_or(0.0);
        let active = self.active_wars().await?;
        let regions = self.regions.list().await.context("Failed to list regions")?;
        let disputed = self
            .manager
            .calculate_disputed_regions(faction_a, faction_b, &regions);

        let war = self
            .manager
            .declare_war(faction_a, faction_b, tension, &active, disputed, now)
            .context("Failed to declare war")?;
        self.wars.save(&war).await.context("Failed to save war")?;

        publish_event(
            self.events.as_ref(),
            DomainEvent::WarDeclared {
                metadata: EventMetadata::at(now),
                war_id: war.id,
                faction_a,
                faction_b,
            },
        )
        .await;
        Ok(war)
    }

    /// Roll for war between every pair whose tension has reached the threshold
    ///
    /// Pairs already at war are skipped. The roll uses the pair's war chance,
    /// biased by both factions' traits.
    #[instrument(skip(self))]
    pub async fn declare_wars(&self, now: DateTime<Utc>) -> Result<Vec<WarState>> {
        let relationships = self
            .relationships
            .list()
            .await
            .context("Failed to list relationships")?;

        let mut declared = Vec::new();
        for relationship in relationships {
            if !self.manager.config().should_declare(relationship.tension) {
                continue;
            }
            let (a, b) = (relationship.pair.first, relationship.pair.second);
            if self
                .wars
                .find_active_between(a, b)
                .await
                .context("Failed to look up active war")?
                .is_some()
            {
                continue;
            }
            let (Some(faction_a), Some(faction_b)) = (
                self.factions.get(a).await.context("Failed to get faction")?,
                self.factions.get(b).await.context("Failed to get faction")?,
            ) else {
                warn!(pair = %relationship.pair, "Relationship refers to a missing faction");
                continue;
            };

            let chance = calculate_war_chance(relationship.tension, &faction_a.traits, &faction_b.traits);
            let goes_to_war = self.rng.lock().await.gen_bool(chance);
            debug!(pair = %relationship.pair, tension = relationship.tension, chance, goes_to_war, "War roll");
            if goes_to_war {
                declared.push(self.declare_war(a, b, now).await?);
            }
        }
        Ok(declared)
    }

    // =========================================================================
    // Daily advance
    // =========================================================================

    async fn context_for(&self, war: &WarState) -> Result<WarContext> {
        let a = self.require_faction(war.faction_a_id).await?;
        let b = self.require_faction(war.faction_b_id).await?;
        let mut terrain = BTreeMap::new();
        for region_id in &war.disputed_regions {
            if let Some(region) = self.regions.get(*region_id).await.context("Failed to get region")? {
                terrain.insert(region.id, region.biome);
            }
        }
        Ok(WarContext {
            strength_a: military_strength(&a),
            strength_b: military_strength(&b),
            terrain,
        })
    }

    /// Advance one war by a day, persisting and announcing what happened
    #[instrument(skip(self))]
    pub async fn advance_war(&self, war_id: WarId, now: DateTime<Utc>) -> Result<WarAdvance> {
        let mut war = self.require_war(war_id).await?;
        let context = self.context_for(&war).await?;
        let advance = {
            let mut rng = self.rng.lock().await;
            self.manager
                .advance_war(&mut war, &context, &mut *rng, now)
                .with_context(|| format!("Failed to advance war {}", war_id))?
        };
        self.wars.update(&war).await.context("Failed to update war")?;

        if let Some(battle) = &advance.battle {
            publish_event(
                self.events.as_ref(),
                DomainEvent::BattleFought {
                    metadata: EventMetadata::at(now),
                    war_id,
                    battle_id: battle.id,
                    region_id: battle.region_id,
                    winner: battle.winner,
                },
            )
            .await;
        }
        if let Some(offer) = &advance.peace_offer {
            publish_event(
                self.events.as_ref(),
                DomainEvent::PeaceNegotiationStarted {
                    metadata: EventMetadata::at(now),
                    war_id,
                    offered_by: offer.offered_by,
                },
            )
            .await;
        }
        if let Some(outcome) = &advance.outcome {
            self.resolve_outcome_effects(outcome, now).await?;
        }
        Ok(advance)
    }

    /// Advance every active war; a war that fails is logged and skipped
    #[instrument(skip(self))]
    pub async fn advance_all(&self, now: DateTime<Utc>) -> Result<Vec<(WarId, WarAdvance)>> {
        let active = self.active_wars().await?;
        let mut advances = Vec::with_capacity(active.len());
        for war in active {
            match self.advance_war(war.id, now).await {
                Ok(advance) => advances.push((war.id, advance)),
                Err(e) => warn!(war_id = %war.id, error = %e, "Skipping war this tick"),
            }
        }
        Ok(advances)
    }

    // =========================================================================
    // Negotiation
    // =========================================================================

    #[instrument(skip(self, offer), fields(offered_by = %offer.offered_by))]
    pub async fn offer_peace(&self, war_id: WarId, offer: PeaceOffer, now: DateTime<Utc>) -> Result<WarState> {
        let mut war = self.require_war(war_id).await?;
        let offered_by = offer.offered_by;
        let opened = war.negotiation_started.is_none();
        self.manager
            .offer_peace(&mut war, offer, now)
            .context("Failed to offer peace")?;
        self.wars.update(&war).await.context("Failed to update war")?;
        if opened {
            publish_event(
                self.events.as_ref(),
                DomainEvent::PeaceNegotiationStarted {
                    metadata: EventMetadata::at(now),
                    war_id,
                    offered_by,
                },
            )
            .await;
        }
        Ok(war)
    }

    #[instrument(skip(self))]
    pub async fn reject_peace(&self, war_id: WarId, now: DateTime<Utc>) -> Result<WarState> {
        let mut war = self.require_war(war_id).await?;
        self.manager
            .reject_peace(&mut war, now)
            .context("Failed to reject peace")?;
        self.wars.update(&war).await.context("Failed to update war")?;
        Ok(war)
    }

    /// Sign the peace on the table and apply its consequences
    #[instrument(skip(self))]
    pub async fn conclude_war(&self, war_id: WarId, now: DateTime<Utc>) -> Result<WarOutcome> {
        let mut war = self.require_war(war_id).await?;
        let outcome = {
            let mut rng = self.rng.lock().await;
            self.manager
                .conclude_war(&mut war, &mut *rng, now)
                .context("Failed to conclude war")?
        };
        self.wars.update(&war).await.context("Failed to archive war")?;
        self.resolve_outcome_effects(&outcome, now).await?;
        Ok(outcome)
    }

    /// Write territory, reparations, reputation and tension changes back
    #[instrument(skip(self, outcome), fields(war_id = %outcome.war_id))]
    pub async fn resolve_outcome_effects(&self, outcome: &WarOutcome, now: DateTime<Utc>) -> Result<()> {
        let mut factions: BTreeMap<FactionId, Faction> = self
            .factions
            .list()
            .await
            .context("Failed to list factions")?
            .into_iter()
            .map(|f| (f.id, f))
            .collect();
        let threshold = self.control.config().territory_threshold;

        for change in &outcome.territorial_changes {
            let Some(mut region) = self
                .regions
                .get(change.region_id)
                .await
                .context("Failed to get region")?
            else {
                warn!(region_id = %change.region_id, "Ceded region no longer exists");
                continue;
            };
            let ceded = region.influence_of(change.from).max(region.influence_of(change.to));
            region.faction_influence.remove(&change.from);
            region.faction_influence.insert(change.to, ceded);
            self.control.update_region_control(&mut region, &factions);
            self.regions.update(&region).await.context("Failed to update ceded region")?;

            if let Some(loser) = factions.get_mut(&change.from) {
                loser.territory.release(region.id);
            }
            if let Some(winner) = factions.get_mut(&change.to) {
                winner.territory.record_influence(region.id, ceded, threshold);
            }
        }

        for transfer in &outcome.resource_transfers {
            if let Some(loser) = factions.get_mut(&transfer.from) {
                loser.adjust_wealth(-transfer.amount);
            }
            if let Some(winner) = factions.get_mut(&transfer.to) {
                winner.adjust_wealth(transfer.amount);
            }
        }
        for (faction_id, delta) in &outcome.reputation_changes {
            if let Some(faction) = factions.get_mut(faction_id) {
                faction.adjust_reputation(*delta);
            }
        }

        let mut participants: Vec<FactionId> = outcome
            .territorial_changes
            .iter()
            .flat_map(|c| [c.from, c.to])
            .chain(outcome.resource_transfers.iter().flat_map(|t| [t.from, t.to]))
            .chain(outcome.reputation_changes.keys().copied())
            .collect();
        participants.sort();
        participants.dedup();
        for faction_id in participants {
            if let Some(faction) = factions.get(&faction_id) {
                self.factions
                    .update(faction)
                    .await
                    .with_context(|| format!("Failed to update faction {}", faction_id))?;
            }
        }

        for change in &outcome.tension_changes {
            let mut relationship = self
                .relationships
                .get(change.pair)
                .await
                .context("Failed to get relationship")?
                .unwrap_or_else(|| FactionRelationship::new(change.pair.first, change.pair.second, now));
            update_faction_tension(
                &mut relationship,
                change.delta,
                format!("peace treaty ({})", outcome.outcome_type),
                now,
                &self.relationship_config,
            );
            self.relationships
                .save(&relationship)
                .await
                .context("Failed to save relationship")?;
        }

        info!(
            outcome = %outcome.outcome_type,
            winner = ?outcome.winner,
            regions_ceded = outcome.territorial_changes.len(),
            "Applied war outcome"
        );
        publish_event(
            self.events.as_ref(),
            DomainEvent::WarConcluded {
                metadata: EventMetadata::at(now),
                war_id: outcome.war_id,
                outcome_type: outcome.outcome_type,
                winner: outcome.winner,
            },
        )
        .await;
        Ok(())
    }

    // =========================================================================
    // Schism
    // =========================================================================

    /// Assess and roll a faction's risk of splitting under internal tension
    #[instrument(skip(self))]
    pub async fn assess_schism(
        &self,
        faction_id: FactionId,
        internal_tension: f64,
        now: DateTime<Utc>,
    ) -> Result<(SchismAssessment, bool)> {
        let faction = self.require_faction(faction_id).await?;
        let assessment = calculate_faction_schism_probability(
            &faction,
            internal_tension,
            self.schism_config.schism_threshold,
            faction.member_count,
            &self.schism_config,
        );
        let occurred = {
            let mut rng = self.rng.lock().await;
            roll_schism(&assessment, &mut *rng)
        };
        if assessment.at_risk() {
            info!(%faction_id, probability = assessment.probability, occurred, "Schism risk rolled");
            publish_event(
                self.events.as_ref(),
                DomainEvent::SchismRisk {
                    metadata: EventMetadata::at(now),
                    faction_id,
                    probability: assessment.probability,
                    occurred,
                },
            )
            .await;
        }
        Ok((assessment, occurred))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::seeded_rng;
    use crate::domain::entities::{FactionType, Region, WarPhase};
    use crate::domain::value_objects::WarConfig;
    use crate::infrastructure::events::RecordingEventPublisher;
    use crate::infrastructure::persistence::InMemoryRepository;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()
    }

    fn service_with(
        repo: &Arc<InMemoryRepository>,
        events: &Arc<RecordingEventPublisher>,
        config: WarConfig,
    ) -> WarService {
        WarService::new(
            WarManager::new(config),
            repo.clone(),
            repo.clone(),
            repo.clone(),
            repo.clone(),
            events.clone(),
            seeded_rng(7),
        )
    }

    async fn rivals(repo: &InMemoryRepository, tension: f64) -> (Faction, Faction, Region) {
        let a = Faction::new("Red Banner", FactionType::Military).with_power(60.0);
        let b = Faction::new("Blue Tide", FactionType::Military).with_power(40.0);
        let region = Region::new("Ford")
            .with_biome("forest")
            .with_influence(a.id, 0.5)
            .with_influence(b.id, 0.4);
        FactionRepositoryPort::save(repo, &a).await.unwrap();
        FactionRepositoryPort::save(repo, &b).await.unwrap();
        RegionRepositoryPort::save(repo, &region).await.unwrap();
        let relationship = FactionRelationship::new(a.id, b.id, now()).with_tension(tension);
        RelationshipRepositoryPort::save(repo, &relationship).await.unwrap();
        (a, b, region)
    }

    #[tokio::test]
    async fn test_declare_war_needs_tension_and_no_duplicate() {
        let repo = Arc::new(InMemoryRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let service = service_with(&repo, &events, WarConfig::default());
        let (a, b, region) = rivals(&repo, 80.0).await;

        let war = service.declare_war(a.id, b.id, now()).await.unwrap();
        assert_eq!(war.disputed_regions, vec![region.id]);
        assert_eq!(service.active_wars().await.unwrap().len(), 1);

        assert!(service.declare_war(b.id, a.id, now()).await.is_err());
    }

    #[tokio::test]
    async fn test_low_tension_blocks_declaration() {
        let repo = Arc::new(InMemoryRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let service = service_with(&repo, &events, WarConfig::default());
        let (a, b, _) = rivals(&repo, 20.0).await;

        assert!(service.declare_war(a.id, b.id, now()).await.is_err());
        assert!(events.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_advance_records_battles() {
        let repo = Arc::new(InMemoryRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let config = WarConfig {
            battle_chance: 1.0,
            ..WarConfig::default()
        };
        let service = service_with(&repo, &events, config);
        let (a, b, _) = rivals(&repo, 90.0).await;
        let war = service.declare_war(a.id, b.id, now()).await.unwrap();

        let advances = service.advance_all(now() + Duration::days(1)).await.unwrap();
        assert_eq!(advances.len(), 1);
        assert!(advances[0].1.battle.is_some());

        let stored = service.get_war(war.id).await.unwrap().unwrap();
        assert_eq!(stored.battles.len(), 1);
        assert_eq!(stored.battles[0].terrain, "forest");
        assert!(stored.exhaustion_a > 0.0 && stored.exhaustion_b > 0.0);
    }

    #[tokio::test]
    async fn test_conclusion_archives_war_and_eases_tension() {
        let repo = Arc::new(InMemoryRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let service = service_with(&repo, &events, WarConfig::default());
        let (a, b, _) = rivals(&repo, 90.0).await;
        let war = service.declare_war(a.id, b.id, now()).await.unwrap();

        service
            .offer_peace(war.id, PeaceOffer::new(a.id, now()), now())
            .await
            .unwrap();
        // Negotiations must run their minimum length first
        assert!(service.conclude_war(war.id, now() + Duration::days(2)).await.is_err());

        let outcome = service
            .conclude_war(war.id, now() + Duration::days(8))
            .await
            .unwrap();
        let stored = service.get_war(war.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.phase, WarPhase::Concluded);
        assert!(service.active_wars().await.unwrap().is_empty());

        let relationship = RelationshipRepositoryPort::get(repo.as_ref(), FactionPair::new(a.id, b.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(relationship.tension, 90.0 + outcome.outcome_type.tension_change());
    }

    #[tokio::test]
    async fn test_outsider_cannot_offer_peace() {
        let repo = Arc::new(InMemoryRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let service = service_with(&repo, &events, WarConfig::default());
        let (a, b, _) = rivals(&repo, 90.0).await;
        let war = service.declare_war(a.id, b.id, now()).await.unwrap();

        let result = service
            .offer_peace(war.id, PeaceOffer::new(FactionId::new(), now()), now())
            .await;
        assert!(result.is_err());
        let stored = service.get_war(war.id).await.unwrap().unwrap();
        assert_eq!(stored.phase, WarPhase::AtWar);
    }

    #[tokio::test]
    async fn test_schism_below_threshold_is_safe() {
        let repo = Arc::new(InMemoryRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let service = service_with(&repo, &events, WarConfig::default());
        let faction = Faction::new("Quiet Order", FactionType::Religious).with_members(50);
        FactionRepositoryPort::save(repo.as_ref(), &faction).await.unwrap();

        let (assessment, occurred) = service.assess_schism(faction.id, 40.0, now()).await.unwrap();
        assert_eq!(assessment.probability, 0.0);
        assert!(!occurred);
        assert!(events.events().await.is_empty());
    }
}
