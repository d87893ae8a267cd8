//! World Generation Service - Build a seeded world and store it

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::application::ports::outbound::{
    EventPublisherPort, PoiRepositoryPort, RegionRepositoryPort,
};
use crate::application::services::publish_event;
use crate::domain::events::{DomainEvent, EventMetadata};
use crate::domain::services::{GeneratedWorld, WorldGenerator};
use crate::domain::value_objects::{BiomeRegistry, PlacementConfig, WorldConfig};

pub struct WorldGenerationService {
    registry: Arc<BiomeRegistry>,
    placement: PlacementConfig,
    regions: Arc<dyn RegionRepositoryPort>,
    pois: Arc<dyn PoiRepositoryPort>,
    events: Arc<dyn EventPublisherPort>,
}

impl WorldGenerationService {
    pub fn new(
        registry: Arc<BiomeRegistry>,
        placement: PlacementConfig,
        regions: Arc<dyn RegionRepositoryPort>,
        pois: Arc<dyn PoiRepositoryPort>,
        events: Arc<dyn EventPublisherPort>,
    ) -> Self {
        Self {
            registry,
            placement,
            regions,
            pois,
            events,
        }
    }

    /// Generate a world from `config` and persist every region and point of interest
    #[instrument(skip(self, config), fields(seed = config.seed, radius = config.radius))]
    pub async fn generate(&self, config: WorldConfig, now: DateTime<Utc>) -> Result<GeneratedWorld> {
        let registry = Arc::clone(&self.registry);
        let placement = self.placement.clone();
        let world = tokio::task::spawn_blocking(move || {
            WorldGenerator::new(&registry, placement, config).generate()
        })
        .await
        .context("World generation task panicked")?
        .context("Failed to generate world")?;

        for region in &world.regions {
            self.regions
                .save(region)
                .await
                .with_context(|| format!("Failed to save region {}", region.id))?;
        }
        for poi in &world.points_of_interest {
            self.pois
                .save(poi)
                .await
                .with_context(|| format!("Failed to save point of interest {}", poi.id))?;
        }

        info!(
            regions = world.regions.len(),
            pois = world.points_of_interest.len(),
            unresolved = world.placement.remaining_violations.len(),
            "Generated world with seed {}",
            world.seed
        );
        publish_event(
            self.events.as_ref(),
            DomainEvent::WorldGenerated {
                metadata: EventMetadata::at(now),
                seed: world.seed,
                regions: world.regions.len(),
                points_of_interest: world.points_of_interest.len(),
            },
        )
        .await;
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::events::RecordingEventPublisher;
    use crate::infrastructure::persistence::InMemoryRepository;
    use chrono::TimeZone;

    fn service(repo: &Arc<InMemoryRepository>, events: &Arc<RecordingEventPublisher>) -> WorldGenerationService {
        WorldGenerationService::new(
            Arc::new(BiomeRegistry::default()),
            PlacementConfig::default(),
            repo.clone(),
            repo.clone(),
            events.clone(),
        )
    }

    #[tokio::test]
    async fn test_generated_world_is_stored() {
        let repo = Arc::new(InMemoryRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let service = service(&repo, &events);
        let config = WorldConfig {
            seed: 11,
            radius: 2,
            ..WorldConfig::default()
        };
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let world = service.generate(config, now).await.unwrap();
        assert_eq!(world.regions.len(), 19);

        let regions = RegionRepositoryPort::list(repo.as_ref()).await.unwrap();
        let pois = PoiRepositoryPort::list(repo.as_ref()).await.unwrap();
        assert_eq!(regions.len(), 19);
        assert_eq!(pois.len(), 38);
        assert!(matches!(
            events.events().await.first(),
            Some(DomainEvent::WorldGenerated { regions: 19, .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_config_stores_nothing() {
        let repo = Arc::new(InMemoryRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let service = service(&repo, &events);
        let config = WorldConfig {
            resource_abundance: -1.0,
            ..WorldConfig::default()
        };
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        assert!(service.generate(config, now).await.is_err());
        assert!(RegionRepositoryPort::list(repo.as_ref()).await.unwrap().is_empty());
    }
}
