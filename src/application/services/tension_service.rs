//! Tension Service - Location tension use cases with persistence
//!
//! Wraps the in-memory `TensionManager` behind a `RwLock`, writes every
//! changed location back through the tension repository and announces
//! changes as domain events.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::application::ports::outbound::{
    EventPublisherPort, PoiRepositoryPort, TensionRepositoryPort,
};
use crate::application::services::publish_event;
use crate::domain::entities::PointOfInterest;
use crate::domain::events::{DomainEvent, EventMetadata};
use crate::domain::services::{
    DecayStats, EnvironmentalChange, NpcChange, PlayerAction, TensionManager,
};
use crate::domain::value_objects::{PoiId, RegionId};

/// Impacts to apply to one location in a single update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TensionImpactRequest {
    #[serde(default)]
    pub player_action: Option<PlayerAction>,
    #[serde(default)]
    pub npc_change: Option<NpcChange>,
    #[serde(default)]
    pub environmental_change: Option<EnvironmentalChange>,
}

/// Request to attach a temporary tension modifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddModifierRequest {
    pub kind: String,
    pub value: f64,
    pub duration_hours: i64,
    #[serde(default)]
    pub source: String,
}

/// Tension service trait defining the application use cases
#[async_trait]
pub trait TensionService: Send + Sync {
    /// Restore persisted tension and location types; returns locations loaded
    async fn load(&self) -> Result<usize>;

    /// Make POI types known so locations classify into their categories
    async fn register_locations(&self, pois: &[PointOfInterest]);

    async fn calculate_tension(&self, region_id: RegionId, poi_id: PoiId, now: DateTime<Utc>) -> Result<f64>;

    async fn update_tension(
        &self,
        region_id: RegionId,
        poi_id: PoiId,
        request: TensionImpactRequest,
        now: DateTime<Utc>,
    ) -> Result<f64>;

    async fn add_modifier(
        &self,
        region_id: RegionId,
        poi_id: PoiId,
        request: AddModifierRequest,
        now: DateTime<Utc>,
    ) -> Result<f64>;

    async fn reset_tension(&self, region_id: RegionId, poi_id: PoiId, now: DateTime<Utc>) -> Result<f64>;

    /// Decay every tracked location and persist the results
    async fn decay_all(&self, now: DateTime<Utc>) -> Result<DecayStats>;

    async fn region_tension(&self, region_id: RegionId, now: DateTime<Utc>) -> Result<Option<f64>>;

    async fn regions_by_tension(&self, min: f64, max: f64, now: DateTime<Utc>) -> Result<Vec<(RegionId, f64)>>;

    async fn pois_in(&self, region_id: RegionId) -> Vec<PoiId>;
}

/// Default implementation of TensionService
pub struct TensionServiceImpl {
    manager: RwLock<TensionManager>,
    tension_repository: Arc<dyn TensionRepositoryPort>,
    poi_repository: Arc<dyn PoiRepositoryPort>,
    events: Arc<dyn EventPublisherPort>,
}

impl TensionServiceImpl {
    pub fn new(
        manager: TensionManager,
        tension_repository: Arc<dyn TensionRepositoryPort>,
        poi_repository: Arc<dyn PoiRepositoryPort>,
        events: Arc<dyn EventPublisherPort>,
    ) -> Self {
        Self {
            manager: RwLock::new(manager),
            tension_repository,
            poi_repository,
            events,
        }
    }

    async fn persist(&self, manager: &TensionManager, region_id: RegionId, poi_id: PoiId) -> Result<()> {
        if let Some(snapshot) = manager.snapshot_of(region_id, poi_id) {
            self.tension_repository
                .save(&snapshot)
                .await
                .context("Failed to save tension state")?;
        }
        Ok(())
    }
}

#[async_trait]
impl TensionService for TensionServiceImpl {
    #[instrument(skip(self))]
    async fn load(&self) -> Result<usize> {
        let snapshots = self
            .tension_repository
            .list()
            .await
            .context("Failed to list tension states")?;
        let pois = self
            .poi_repository
            .list()
            .await
            .context("Failed to list points of interest")?;

        let count = snapshots.len();
        let mut manager = self.manager.write().await;
        for poi in &pois {
            manager.register_location(poi.region_id, poi.id, &poi.poi_type);
        }
        manager.restore(snapshots);
        info!(locations = count, pois = pois.len(), "Restored tension state");
        Ok(count)
    }

    #[instrument(skip(self, pois), fields(count = pois.len()))]
    async fn register_locations(&self, pois: &[PointOfInterest]) {
        let mut manager = self.manager.write().await;
        for poi in pois {
            manager.register_location(poi.region_id, poi.id, &poi.poi_type);
        }
    }

    #[instrument(skip(self))]
    async fn calculate_tension(&self, region_id: RegionId, poi_id: PoiId, now: DateTime<Utc>) -> Result<f64> {
        let mut manager = self.manager.write().await;
        let tension = manager
            .calculate_tension(region_id, poi_id, now)
            .context("Failed to calculate tension")?;
        self.persist(&manager, region_id, poi_id).await?;
        Ok(tension)
    }

    #[instrument(skip(self, request))]
    async fn update_tension(
        &self,
        region_id: RegionId,
        poi_id: PoiId,
        request: TensionImpactRequest,
        now: DateTime<Utc>,
    ) -> Result<f64> {
        let mut manager = self.manager.write().await;
        let old_level = manager
            .calculate_tension(region_id, poi_id, now)
            .context("Failed to calculate tension before update")?;
        let new_level = manager
            .update_tension(
                region_id,
                poi_id,
                request.player_action.as_ref(),
                request.npc_change.as_ref(),
                request.environmental_change.as_ref(),
                now,
            )
            .context("Failed to update tension")?;
        self.persist(&manager, region_id, poi_id).await?;
        drop(manager);

        debug!(%region_id, %poi_id, old_level, new_level, "Tension updated");
        publish_event(
            self.events.as_ref(),
            DomainEvent::TensionUpdated {
                metadata: EventMetadata::at(now),
                region_id,
                poi_id,
                old_level,
                new_level,
            },
        )
        .await;
        Ok(new_level)
    }

    #[instrument(skip(self), fields(kind = %request.kind))]
    async fn add_modifier(
        &self,
        region_id: RegionId,
        poi_id: PoiId,
        request: AddModifierRequest,
        now: DateTime<Utc>,
    ) -> Result<f64> {
        let mut manager = self.manager.write().await;
        let tension = manager
            .add_tension_modifier(
                region_id,
                poi_id,
                request.kind,
                request.value,
                request.duration_hours,
                request.source,
                now,
            )
            .context("Failed to add tension modifier")?;
        self.persist(&manager, region_id, poi_id).await?;
        Ok(tension)
    }

    #[instrument(skip(self))]
    async fn reset_tension(&self, region_id: RegionId, poi_id: PoiId, now: DateTime<Utc>) -> Result<f64> {
        let mut manager = self.manager.write().await;
        let base = manager.reset_tension(region_id, poi_id, now);
        self.persist(&manager, region_id, poi_id).await?;
        info!(%region_id, %poi_id, base, "Tension reset");
        Ok(base)
    }

    #[instrument(skip(self))]
    async fn decay_all(&self, now: DateTime<Utc>) -> Result<DecayStats> {
        let mut manager = self.manager.write().await;
        let stats = manager.decay_all(now);
        for snapshot in manager.snapshot() {
            self.tension_repository
                .save(&snapshot)
                .await
                .context("Failed to save decayed tension state")?;
        }
        debug!(
            regions = stats.regions_processed,
            pois = stats.pois_processed,
            failures = stats.failures,
            "Tension decayed"
        );
        Ok(stats)
    }

    #[instrument(skip(self))]
    async fn region_tension(&self, region_id: RegionId, now: DateTime<Utc>) -> Result<Option<f64>> {
        let mut manager = self.manager.write().await;
        manager
            .region_tension(region_id, now)
            .with_context(|| format!("Failed to read tension of region {}", region_id))
    }

    #[instrument(skip(self))]
    async fn regions_by_tension(&self, min: f64, max: f64, now: DateTime<Utc>) -> Result<Vec<(RegionId, f64)>> {
        let mut manager = self.manager.write().await;
        Ok(manager.regions_by_tension(min, max, now))
    }

    async fn pois_in(&self, region_id: RegionId) -> Vec<PoiId> {
        self.manager.read().await.pois_in(region_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::SimulationError;
    use crate::domain::services::PlayerActionKind;
    use crate::domain::value_objects::TensionConfigRegistry;
    use crate::infrastructure::events::RecordingEventPublisher;
    use crate::infrastructure::persistence::InMemoryRepository;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap()
    }

    fn service(repo: &Arc<InMemoryRepository>, events: &Arc<RecordingEventPublisher>) -> TensionServiceImpl {
        TensionServiceImpl::new(
            TensionManager::new(TensionConfigRegistry::default()),
            repo.clone(),
            repo.clone(),
            events.clone(),
        )
    }

    #[tokio::test]
    async fn test_update_persists_and_publishes() {
        let repo = Arc::new(InMemoryRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let service = service(&repo, &events);
        let poi = PointOfInterest::new(RegionId::new(), "Old Keep", "city");
        service.register_locations(std::slice::from_ref(&poi)).await;

        let request = TensionImpactRequest {
            player_action: Some(PlayerAction::new(PlayerActionKind::Murder)),
            ..Default::default()
        };
        let level = service
            .update_tension(poi.region_id, poi.id, request, now())
            .await
            .unwrap();
        // city base 0.2 + 0.45 * 1.5
        assert!((level - 0.875).abs() < 1e-9);

        let stored = TensionRepositoryPort::get(repo.as_ref(), poi.region_id, poi.id)
            .await
            .unwrap()
            .unwrap();
        assert!((stored.state.level - 0.875).abs() < 1e-9);
        assert_eq!(events.events().await.len(), 1);
    }

    #[tokio::test]
    async fn test_state_survives_reload() {
        let repo = Arc::new(InMemoryRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let region = RegionId::new();
        let poi = PoiId::new();
        {
            let first = service(&repo, &events);
            first
                .add_modifier(
                    region,
                    poi,
                    AddModifierRequest {
                        kind: "festival".to_string(),
                        value: -0.1,
                        duration_hours: 48,
                        source: "harvest".to_string(),
                    },
                    now(),
                )
                .await
                .unwrap();
        }

        let second = service(&repo, &events);
        assert_eq!(second.load().await.unwrap(), 1);
        let tension = second
            .calculate_tension(region, poi, now() + Duration::hours(1))
            .await
            .unwrap();
        // default base 0.3 decayed by 0.04, then the festival relief
        assert!((tension - 0.16).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_errors_keep_their_type() {
        let repo = Arc::new(InMemoryRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let service = service(&repo, &events);
        let error = service
            .add_modifier(
                RegionId::new(),
                PoiId::new(),
                AddModifierRequest {
                    kind: "curse".to_string(),
                    value: f64::NAN,
                    duration_hours: 1,
                    source: String::new(),
                },
                now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SimulationError>(),
            Some(SimulationError::Tension { .. })
        ));
    }
}
