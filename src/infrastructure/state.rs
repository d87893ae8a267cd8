//! Shared application state

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::application::ports::outbound::{
    EventPublisherPort, FactionRepositoryPort, PoiRepositoryPort, RegionRepositoryPort,
    RelationshipRepositoryPort, TensionRepositoryPort, WarRepositoryPort,
};
use crate::application::services::{
    seeded_rng, PoliticalService, TensionService, TensionServiceImpl, WarService,
    WorldGenerationService, WorldTickService,
};
use crate::domain::services::{PoliticalControlEngine, TensionManager, WarManager};
use crate::domain::value_objects::BiomeRegistry;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::config_files::SimulationData;
use crate::infrastructure::events::TracingEventPublisher;
use crate::infrastructure::persistence::{InMemoryRepository, SqliteRepository};

/// A store that backs every repository port at once
pub trait SimulationStore:
    RegionRepositoryPort
    + FactionRepositoryPort
    + PoiRepositoryPort
    + RelationshipRepositoryPort
    + WarRepositoryPort
    + TensionRepositoryPort
    + 'static
{
}

impl<T> SimulationStore for T where
    T: RegionRepositoryPort
        + FactionRepositoryPort
        + PoiRepositoryPort
        + RelationshipRepositoryPort
        + WarRepositoryPort
        + TensionRepositoryPort
        + 'static
{
}

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub biomes: Arc<BiomeRegistry>,
    pub regions: Arc<dyn RegionRepositoryPort>,
    pub pois: Arc<dyn PoiRepositoryPort>,
    // Application services
    pub tension: Arc<dyn TensionService>,
    pub political: Arc<PoliticalService>,
    pub wars: Arc<WarService>,
    pub world_generation: WorldGenerationService,
    pub world_tick: WorldTickService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let data = SimulationData::load(&config.data_dir).context("Failed to load simulation data")?;
        let events: Arc<dyn EventPublisherPort> = Arc::new(TracingEventPublisher::new());

        if config.uses_memory_store() {
            info!("Using in-memory store; the world is discarded on exit");
            return Ok(Self::assemble(config, data, Arc::new(InMemoryRepository::new()), events));
        }

        let options = SqliteConnectOptions::from_str(&config.database_url)
            .context("Invalid database URL")?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;
        let store = SqliteRepository::new(pool)
            .await
            .context("Failed to initialize database schema")?;
        info!("Connected to SQLite database: {}", config.database_url);

        Ok(Self::assemble(config, data, Arc::new(store), events))
    }

    /// Wire every service to one store and one event publisher
    pub fn assemble<S: SimulationStore>(
        config: AppConfig,
        data: SimulationData,
        store: Arc<S>,
        events: Arc<dyn EventPublisherPort>,
    ) -> Self {
        let settings = &config.simulation;
        let biomes = Arc::new(data.biomes);
        let rng = seeded_rng(config.world.seed);

        let regions: Arc<dyn RegionRepositoryPort> = store.clone();
        let factions: Arc<dyn FactionRepositoryPort> = store.clone();
        let pois: Arc<dyn PoiRepositoryPort> = store.clone();
        let relationships: Arc<dyn RelationshipRepositoryPort> = store.clone();
        let wars: Arc<dyn WarRepositoryPort> = store.clone();
        let tension_states: Arc<dyn TensionRepositoryPort> = store;

        let manager = TensionManager::new(data.tension_configs).with_classifier(data.poi_types);
        let tension: Arc<dyn TensionService> = Arc::new(TensionServiceImpl::new(
            manager,
            tension_states,
            pois.clone(),
            events.clone(),
        ));

        let political = Arc::new(
            PoliticalService::new(
                PoliticalControlEngine::new(settings.political.clone()),
                regions.clone(),
                factions.clone(),
                relationships.clone(),
                events.clone(),
            )
            .with_relationship_config(settings.relationships.clone())
            .with_population_config(settings.population.clone()),
        );

        let war_service = Arc::new(
            WarService::new(
                WarManager::new(settings.war.clone()),
                wars,
                factions,
                regions.clone(),
                relationships,
                events.clone(),
                rng.clone(),
            )
            .with_control_engine(PoliticalControlEngine::new(settings.political.clone()))
            .with_schism_config(settings.schism.clone())
            .with_relationship_config(settings.relationships.clone()),
        );

        let world_generation = WorldGenerationService::new(
            biomes.clone(),
            settings.placement.clone(),
            regions.clone(),
            pois.clone(),
            events.clone(),
        );

        let world_tick = WorldTickService::new(
            tension.clone(),
            political.clone(),
            war_service.clone(),
            regions.clone(),
            events,
            rng,
        )
        .with_revolt_config(settings.revolt.clone());

        Self {
            config,
            biomes,
            regions,
            pois,
            tension,
            political,
            wars: war_service,
            world_generation,
            world_tick,
        }
    }

    /// Restore persisted tension, or generate a fresh world when the store is empty
    pub async fn bootstrap(&self, now: DateTime<Utc>) -> Result<()> {
        let restored = self.tension.load().await?;
        let regions = self.regions.list().await.context("Failed to list regions")?;

        if regions.is_empty() {
            let world = self
                .world_generation
                .generate(self.config.world.clone(), now)
                .await?;
            self.tension.register_locations(&world.points_of_interest).await;
            info!(
                seed = world.seed,
                regions = world.regions.len(),
                pois = world.points_of_interest.len(),
                "Generated new world"
            );
        } else {
            info!(
                regions = regions.len(),
                tension_states = restored,
                "Resumed existing world"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::WorldConfig;
    use crate::infrastructure::events::RecordingEventPublisher;
    use chrono::TimeZone;

    fn memory_config() -> AppConfig {
        AppConfig {
            database_url: crate::infrastructure::config::MEMORY_DATABASE.to_string(),
            data_dir: std::env::temp_dir().join(format!("visual-dm-missing-{}", uuid::Uuid::new_v4())),
            world: WorldConfig {
                seed: 11,
                radius: 1,
                poi_density: 1,
                resource_abundance: 1.0,
            },
            ..AppConfig::default()
        }
    }

    fn state(store: Arc<InMemoryRepository>) -> AppState {
        let config = memory_config();
        let data = SimulationData::load(&config.data_dir).unwrap();
        AppState::assemble(config, data, store, Arc::new(RecordingEventPublisher::new()))
    }

    #[tokio::test]
    async fn test_bootstrap_generates_once() {
        let store = Arc::new(InMemoryRepository::new());
        let now = Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap();

        state(store.clone()).bootstrap(now).await.unwrap();
        assert_eq!(RegionRepositoryPort::list(store.as_ref()).await.unwrap().len(), 7);

        // A second start over the same store resumes instead of generating again
        state(store.clone()).bootstrap(now).await.unwrap();
        assert_eq!(RegionRepositoryPort::list(store.as_ref()).await.unwrap().len(), 7);
        assert_eq!(PoiRepositoryPort::list(store.as_ref()).await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_generated_world_ticks() {
        let app = state(Arc::new(InMemoryRepository::new()));
        let now = Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap();
        app.bootstrap(now).await.unwrap();

        let report = app.world_tick.tick(now + chrono::Duration::hours(1)).await.unwrap();
        assert_eq!(report.tick, 1);
        assert_eq!(report.region_failures, 0);
        assert_eq!(app.world_tick.ticks(), 1);
    }

    #[tokio::test]
    async fn test_memory_config_builds_without_database() {
        let app = AppState::new(memory_config()).await.unwrap();
        assert!(app.regions.list().await.unwrap().is_empty());
        assert!(!app.biomes.is_empty());
    }
}
