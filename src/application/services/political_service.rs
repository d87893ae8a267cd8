//! Political Service - Region control, influence and faction relationships
//!
//! Loads regions and factions from their repositories, runs the political
//! control engine over them and writes the results back.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::application::dto::{UpdateFactionRequest, UpdateRegionRequest, UpdateRelationshipRequest};
use crate::application::ports::outbound::{
    EventPublisherPort, FactionRepositoryPort, RegionRepositoryPort, RelationshipRepositoryPort,
};
use crate::application::services::publish_event;
use crate::domain::entities::{Faction, FactionPair, FactionRelationship, Region, RegionAdjacency};
use crate::domain::events::{DomainEvent, EventMetadata};
use crate::domain::services::{
    decay_relationship, update_faction_tension, InfluenceSpread, PoliticalControlEngine,
};
use crate::domain::value_objects::{
    FactionControl, FactionId, PopulationConfig, RegionId, RelationshipConfig,
};

/// Totals from one daily political pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PoliticalTickReport {
    pub regions_processed: usize,
    pub control_changes: usize,
    pub population_change: i64,
    pub influence_dropped: usize,
}

/// Application service for political control and faction relationships
pub struct PoliticalService {
    engine: PoliticalControlEngine,
    relationship_config: RelationshipConfig,
    population_config: PopulationConfig,
    regions: Arc<dyn RegionRepositoryPort>,
    factions: Arc<dyn FactionRepositoryPort>,
    relationships: Arc<dyn RelationshipRepositoryPort>,
    events: Arc<dyn EventPublisherPort>,
}

impl PoliticalService {
    pub fn new(
        engine: PoliticalControlEngine,
        regions: Arc<dyn RegionRepositoryPort>,
        factions: Arc<dyn FactionRepositoryPort>,
        relationships: Arc<dyn RelationshipRepositoryPort>,
        events: Arc<dyn EventPublisherPort>,
    ) -> Self {
        Self {
            engine,
            relationship_config: RelationshipConfig::default(),
            population_config: PopulationConfig::default(),
            regions,
            factions,
            relationships,
            events,
        }
    }

    pub fn with_relationship_config(mut self, config: RelationshipConfig) -> Self {
        self.relationship_config = config;
        self
    }

    pub fn with_population_config(mut self, config: PopulationConfig) -> Self {
        self.population_config = config;
        self
    }

    async fn faction_map(&self) -> Result<BTreeMap<FactionId, Faction>> {
        let factions = self
            .factions
            .list()
            .await
            .context("Failed to list factions")?;
        Ok(factions.into_iter().map(|f| (f.id, f)).collect())
    }

    async fn require_region(&self, region_id: RegionId) -> Result<Region> {
        self.regions
            .get(region_id)
            .await
            .context("Failed to get region")?
            .ok_or_else(|| anyhow::anyhow!("Region not found: {}", region_id))
    }

    async fn require_faction(&self, faction_id: FactionId) -> Result<Faction> {
        self.factions
            .get(faction_id)
            .await
            .context("Failed to get faction")?
            .ok_or_else(|| anyhow::anyhow!("Faction not found: {}", faction_id))
    }

    async fn announce_control_change(
        &self,
        region: &Region,
        previous: Option<FactionId>,
        now: DateTime<Utc>,
    ) {
        publish_event(
            self.events.as_ref(),
            DomainEvent::RegionControlChanged {
                metadata: EventMetadata::at(now),
                region_id: region.id,
                previous,
                current: region.controlling_faction,
                control_level: region.control_level,
            },
        )
        .await;
    }

    // =========================================================================
    // Region control
    // =========================================================================

    /// Resolve and store the controller of one region
    #[instrument(skip(self))]
    pub async fn update_region_control(
        &self,
        region_id: RegionId,
        now: DateTime<Utc>,
    ) -> Result<FactionControl> {
        let mut region = self.require_region(region_id).await?;
        let factions = self.faction_map().await?;

        let previous = region.controlling_faction;
        let control = self.engine.calculate_faction_control(&region, &factions);
        let changed = self.engine.update_region_control(&mut region, &factions);
        self.regions
            .update(&region)
            .await
            .context("Failed to update region control")?;

        if changed {
            info!(region_id = %region.id, controller = ?region.controlling_faction, "Region changed hands: {}", region.name);
            self.announce_control_change(&region, previous, now).await;
        }
        Ok(control)
    }

    /// Resolve control for every region; returns how many changed hands
    #[instrument(skip(self))]
    pub async fn resolve_all_control(&self, now: DateTime<Utc>) -> Result<usize> {
        let factions = self.faction_map().await?;
        let regions = self.regions.list().await.context("Failed to list regions")?;

        let mut changes = 0;
        for mut region in regions {
            let previous = region.controlling_faction;
            if self.engine.update_region_control(&mut region, &factions) {
                changes += 1;
                self.announce_control_change(&region, previous, now).await;
            }
            self.regions
                .update(&region)
                .await
                .with_context(|| format!("Failed to update region {}", region.id))?;
        }
        Ok(changes)
    }

    /// Spread a faction's influence out of a source region into its neighbours
    #[instrument(skip(self))]
    pub async fn spread_influence(
        &self,
        faction_id: FactionId,
        source_region_id: RegionId,
        strength: f64,
        now: DateTime<Utc>,
    ) -> Result<Vec<InfluenceSpread>> {
        let mut faction = self.require_faction(faction_id).await?;
        let mut regions: BTreeMap<RegionId, Region> = self
            .regions
            .list()
            .await
            .context("Failed to list regions")?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();
        if !regions.contains_key(&source_region_id) {
            anyhow::bail!("Region not found: {}", source_region_id);
        }

        let adjacency = RegionAdjacency::from_regions(regions.values());
        let spreads = self.engine.spread_faction_influence(
            faction_id,
            &mut faction,
            &mut regions,
            &adjacency,
            source_region_id,
            strength,
        );
        if spreads.is_empty() {
            debug!(%faction_id, "Influence did not spread");
            return Ok(spreads);
        }

        for spread in &spreads {
            if let Some(region) = regions.get(&spread.region_id) {
                self.regions
                    .update(region)
                    .await
                    .with_context(|| format!("Failed to update region {}", region.id))?;
            }
        }
        self.factions
            .update(&faction)
            .await
            .context("Failed to update faction territory")?;

        info!(%faction_id, regions = spreads.len(), "Spread influence from {}", source_region_id);
        publish_event(
            self.events.as_ref(),
            DomainEvent::InfluenceSpread {
                metadata: EventMetadata::at(now),
                faction_id,
                source_region: source_region_id,
                regions_reached: spreads.len(),
            },
        )
        .await;
        Ok(spreads)
    }

    // =========================================================================
    // Typed updates
    // =========================================================================

    #[instrument(skip(self, request))]
    pub async fn update_faction(
        &self,
        faction_id: FactionId,
        request: &UpdateFactionRequest,
    ) -> Result<Faction> {
        let mut faction = self.require_faction(faction_id).await?;
        request
            .apply(&mut faction)
            .with_context(|| format!("Invalid update for faction {}", faction_id))?;
        self.factions
            .update(&faction)
            .await
            .context("Failed to update faction")?;
        info!(faction_id = %faction.id, "Updated faction: {}", faction.name);
        Ok(faction)
    }

    /// Apply a region update, then re-resolve who controls it
    #[instrument(skip(self, request))]
    pub async fn update_region(
        &self,
        region_id: RegionId,
        request: &UpdateRegionRequest,
        now: DateTime<Utc>,
    ) -> Result<Region> {
        let mut region = self.require_region(region_id).await?;
        request
            .apply(&mut region)
            .with_context(|| format!("Invalid update for region {}", region_id))?;

        let previous = region.controlling_faction;
        let changed = if request.faction_influence.is_some() {
            let factions = self.faction_map().await?;
            self.engine.update_region_control(&mut region, &factions)
        } else {
            false
        };
        self.regions
            .update(&region)
            .await
            .context("Failed to update region")?;
        if changed {
            self.announce_control_change(&region, previous, now).await;
        }
        info!(region_id = %region.id, "Updated region: {}", region.name);
        Ok(region)
    }

    // =========================================================================
    // Relationships
    // =========================================================================

    pub async fn relationship(&self, a: FactionId, b: FactionId) -> Result<Option<FactionRelationship>> {
        self.relationships
            .get(FactionPair::new(a, b))
            .await
            .context("Failed to get relationship")
    }

    /// Shift the tension between two known factions
    #[instrument(skip(self, request), fields(a = %request.faction_a, b = %request.faction_b))]
    pub async fn update_relationship(
        &self,
        request: &UpdateRelationshipRequest,
        now: DateTime<Utc>,
    ) -> Result<FactionRelationship> {
        request.validate()?;
        self.require_faction(request.faction_a).await?;
        self.require_faction(request.faction_b).await?;

        let mut relationship = self
            .relationship(request.faction_a, request.faction_b)
            .await?
            .unwrap_or_else(|| FactionRelationship::new(request.faction_a, request.faction_b, now));
        let old_tension = relationship.tension;
        let triggers = update_faction_tension(
            &mut relationship,
            request.change,
            request.reason.clone(),
            now,
            &self.relationship_config,
        );
        self.relationships
            .save(&relationship)
            .await
            .context("Failed to save relationship")?;

        if !triggers.is_empty() {
            info!(pair = %relationship.pair, ?triggers, "Relationship crossed a threshold");
        }
        publish_event(
            self.events.as_ref(),
            DomainEvent::RelationshipChanged {
                metadata: EventMetadata::at(now),
                pair: relationship.pair,
                old_tension,
                new_tension: relationship.tension,
                triggers,
            },
        )
        .await;
        Ok(relationship)
    }

    /// Relax every relationship towards neutral; returns how many moved
    #[instrument(skip(self))]
    pub async fn decay_relationships(&self, now: DateTime<Utc>) -> Result<usize> {
        let relationships = self
            .relationships
            .list()
            .await
            .context("Failed to list relationships")?;
        let mut changed = 0;
        for mut relationship in relationships {
            if decay_relationship(&mut relationship, now, &self.relationship_config) != 0.0 {
                changed += 1;
                self.relationships
                    .update(&relationship)
                    .await
                    .with_context(|| format!("Failed to update relationship {}", relationship.pair))?;
            }
        }
        Ok(changed)
    }

    // =========================================================================
    // Daily pass
    // =========================================================================

    /// Erode influence, re-resolve control, apply controller effects and grow population
    #[instrument(skip(self))]
    pub async fn daily_tick(&self, now: DateTime<Utc>) -> Result<PoliticalTickReport> {
        let mut factions = self.faction_map().await?;
        let regions = self.regions.list().await.context("Failed to list regions")?;
        let decay = self.engine.config().daily_influence_decay;

        let mut report = PoliticalTickReport::default();
        let mut touched_factions = Vec::new();
        for mut region in regions {
            report.regions_processed += 1;

            let dropped = self.engine.decay_faction_influence(&mut region, decay);
            for faction_id in &dropped {
                if let Some(faction) = factions.get_mut(faction_id) {
                    faction.territory.release(region.id);
                    touched_factions.push(*faction_id);
                }
            }
            report.influence_dropped += dropped.len();

            let previous = region.controlling_faction;
            if self.engine.update_region_control(&mut region, &factions) {
                report.control_changes += 1;
                self.announce_control_change(&region, previous, now).await;
            }

            if let Some(controller) = region.controlling_faction.and_then(|id| factions.get(&id)) {
                let level = region.control_level;
                self.engine
                    .apply_faction_control_effects(&mut region, controller, level);
            }

            let before = region.population;
            let after = self.engine.update_region_population(
                &mut region,
                &factions,
                self.population_config.base_growth_rate,
            );
            report.population_change += after as i64 - before as i64;

            self.regions
                .update(&region)
                .await
                .with_context(|| format!("Failed to update region {}", region.id))?;
        }

        touched_factions.sort();
        touched_factions.dedup();
        for faction_id in touched_factions {
            if let Some(faction) = factions.get(&faction_id) {
                self.factions
                    .update(faction)
                    .await
                    .with_context(|| format!("Failed to update faction {}", faction_id))?;
            }
        }

        debug!(
            regions = report.regions_processed,
            control_changes = report.control_changes,
            population_change = report.population_change,
            "Political tick complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::FactionType;
    use crate::domain::services::RelationshipTrigger;
    use crate::domain::value_objects::PoliticalControlConfig;
    use crate::infrastructure::events::RecordingEventPublisher;
    use crate::infrastructure::persistence::InMemoryRepository;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 6, 0, 0).unwrap()
    }

    fn service(repo: &Arc<InMemoryRepository>, events: &Arc<RecordingEventPublisher>) -> PoliticalService {
        PoliticalService::new(
            PoliticalControlEngine::new(PoliticalControlConfig::default()),
            repo.clone(),
            repo.clone(),
            repo.clone(),
            events.clone(),
        )
    }

    #[tokio::test]
    async fn test_region_control_is_stored_and_announced() {
        let repo = Arc::new(InMemoryRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let service = service(&repo, &events);

        let guild = Faction::new("Salt Guild", FactionType::Guild);
        let region = Region::new("Saltmarsh")
            .with_resources(0.5)
            .with_influence(guild.id, 0.8);
        FactionRepositoryPort::save(repo.as_ref(), &guild).await.unwrap();
        RegionRepositoryPort::save(repo.as_ref(), &region).await.unwrap();

        let control = service.update_region_control(region.id, now()).await.unwrap();
        assert_eq!(control.controlling_faction, Some(guild.id));
        assert_eq!(control.control_level, 0.8);

        let stored = RegionRepositoryPort::get(repo.as_ref(), region.id).await.unwrap().unwrap();
        assert_eq!(stored.controlling_faction, Some(guild.id));
        assert_eq!(events.events().await.len(), 1);

        // Unchanged controller is not announced again
        service.update_region_control(region.id, now()).await.unwrap();
        assert_eq!(events.events().await.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_region_is_an_error() {
        let repo = Arc::new(InMemoryRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let service = service(&repo, &events);
        let error = service
            .update_region_control(RegionId::new(), now())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("Region not found"));
    }

    #[tokio::test]
    async fn test_spread_reaches_safe_neighbours_only() {
        let repo = Arc::new(InMemoryRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let service = service(&repo, &events);

        let faction = Faction::new("Crown", FactionType::Political);
        let safe = Region::new("Meadow").with_resources(0.8).with_danger(0.1);
        let dangerous = Region::new("Barrow").with_resources(0.8).with_danger(0.9);
        let source = Region::new("Capital")
            .with_influence(faction.id, 1.0)
            .with_neighbor(safe.id)
            .with_neighbor(dangerous.id);
        FactionRepositoryPort::save(repo.as_ref(), &faction).await.unwrap();
        for region in [&safe, &dangerous, &source] {
            RegionRepositoryPort::save(repo.as_ref(), region).await.unwrap();
        }

        let spreads = service
            .spread_influence(faction.id, source.id, 1.0, now())
            .await
            .unwrap();
        assert_eq!(spreads.len(), 1);
        assert_eq!(spreads[0].region_id, safe.id);

        let stored = RegionRepositoryPort::get(repo.as_ref(), safe.id).await.unwrap().unwrap();
        // 1.0 * 0.1 * 0.8 * 0.9
        assert!((stored.influence_of(faction.id) - 0.072).abs() < 1e-9);
        let untouched = RegionRepositoryPort::get(repo.as_ref(), dangerous.id).await.unwrap().unwrap();
        assert_eq!(untouched.influence_of(faction.id), 0.0);
    }

    #[tokio::test]
    async fn test_relationship_update_reports_war_threshold() {
        let repo = Arc::new(InMemoryRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let service = service(&repo, &events);

        let a = Faction::new("North", FactionType::Military);
        let b = Faction::new("South", FactionType::Military);
        FactionRepositoryPort::save(repo.as_ref(), &a).await.unwrap();
        FactionRepositoryPort::save(repo.as_ref(), &b).await.unwrap();

        let request = UpdateRelationshipRequest {
            faction_a: a.id,
            faction_b: b.id,
            change: 75.0,
            reason: "border raid".to_string(),
        };
        let relationship = service.update_relationship(&request, now()).await.unwrap();
        assert_eq!(relationship.tension, 75.0);

        let published = events.events().await;
        match published.last() {
            Some(DomainEvent::RelationshipChanged { triggers, .. }) => {
                assert_eq!(triggers, &vec![RelationshipTrigger::WarThresholdCrossed]);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_relationship_requires_known_factions() {
        let repo = Arc::new(InMemoryRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let service = service(&repo, &events);
        let request = UpdateRelationshipRequest {
            faction_a: FactionId::new(),
            faction_b: FactionId::new(),
            change: 5.0,
            reason: String::new(),
        };
        assert!(service.update_relationship(&request, now()).await.is_err());
        assert!(events.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_daily_tick_decays_influence_and_releases_territory() {
        let repo = Arc::new(InMemoryRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let service = service(&repo, &events);

        let faction = Faction::new("Fading House", FactionType::Political);
        let region = Region::new("Hollow")
            .with_population(100, 200)
            .with_influence(faction.id, 0.005);
        FactionRepositoryPort::save(repo.as_ref(), &faction).await.unwrap();
        RegionRepositoryPort::save(repo.as_ref(), &region).await.unwrap();

        let report = service.daily_tick(now()).await.unwrap();
        assert_eq!(report.regions_processed, 1);
        assert_eq!(report.influence_dropped, 1);

        let stored = RegionRepositoryPort::get(repo.as_ref(), region.id).await.unwrap().unwrap();
        assert!(stored.faction_influence.is_empty());
        assert_eq!(stored.controlling_faction, None);
        assert!(stored.population <= stored.max_population);
    }
}
