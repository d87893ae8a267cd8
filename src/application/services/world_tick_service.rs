//! World Tick Service - One step of the running simulation
//!
//! A tick decays tension, checks each region for conflict and revolts,
//! runs the daily political pass, advances active wars and rolls for new
//! wars between pairs past the war threshold. Regions are
//! processed one after another; a region that fails is logged and skipped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::application::ports::outbound::{EventPublisherPort, RegionRepositoryPort};
use crate::application::services::political_service::{PoliticalService, PoliticalTickReport};
use crate::application::services::tension_service::{AddModifierRequest, TensionService};
use crate::application::services::war_service::WarService;
use crate::application::services::{publish_event, SharedRng};
use crate::domain::entities::Region;
use crate::domain::events::{DomainEvent, EventMetadata};
use crate::domain::services::{check_conflict_triggers, simulate_revolt, ConflictTrigger, DecayStats};
use crate::domain::value_objects::RevoltConfig;

const POST_REVOLT_MODIFIER: &str = "post_revolt";

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldTickReport {
    pub tick: u64,
    pub decay: DecayStats,
    pub conflicts: usize,
    pub revolts: usize,
    pub region_failures: usize,
    pub political: PoliticalTickReport,
    pub relationships_decayed: usize,
    pub wars_advanced: usize,
    pub wars_declared: usize,
}

#[derive(Debug, Default)]
struct RegionTick {
    conflicts: usize,
    revolts: usize,
}

pub struct WorldTickService {
    tension: Arc<dyn TensionService>,
    political: Arc<PoliticalService>,
    wars: Arc<WarService>,
    regions: Arc<dyn RegionRepositoryPort>,
    events: Arc<dyn EventPublisherPort>,
    revolt: RevoltConfig,
    rng: SharedRng,
    ticks: AtomicU64,
}

impl WorldTickService {
    pub fn new(
        tension: Arc<dyn TensionService>,
        political: Arc<PoliticalService>,
        wars: Arc<WarService>,
        regions: Arc<dyn RegionRepositoryPort>,
        events: Arc<dyn EventPublisherPort>,
        rng: SharedRng,
    ) -> Self {
        Self {
            tension,
            political,
            wars,
            regions,
            events,
            revolt: RevoltConfig::default(),
            rng,
            ticks: AtomicU64::new(0),
        }
    }

    pub fn with_revolt_config(mut self, config: RevoltConfig) -> Self {
        self.revolt = config;
        self
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    #[instrument(skip(self))]
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<WorldTickReport> {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        let mut report = WorldTickReport {
            tick,
            ..Default::default()
        };

        report.decay = self
            .tension
            .decay_all(now)
            .await
            .context("Failed to decay tension")?;

        let regions = self.regions.list().await.context("Failed to list regions")?;
        for region in &regions {
            match self.process_region(region, now).await {
                Ok(result) => {
                    report.conflicts += result.conflicts;
                    report.revolts += result.revolts;
                }
                Err(e) => {
                    warn!(region_id = %region.id, error = %e, "Skipping region this tick");
                    report.region_failures += 1;
                }
            }
        }

        match self.political.daily_tick(now).await {
            Ok(political) => report.political = political,
            Err(e) => warn!(error = %e, "Political pass failed"),
        }
        match self.political.decay_relationships(now).await {
            Ok(count) => report.relationships_decayed = count,
            Err(e) => warn!(error = %e, "Relationship decay failed"),
        }
        match self.wars.advance_all(now).await {
            Ok(advances) => report.wars_advanced = advances.len(),
            Err(e) => warn!(error = %e, "War advance failed"),
        }
        match self.wars.declare_wars(now).await {
            Ok(declared) => report.wars_declared = declared.len(),
            Err(e) => warn!(error = %e, "War declaration pass failed"),
        }

        info!(
            tick,
            regions = regions.len(),
            conflicts = report.conflicts,
            revolts = report.revolts,
            failures = report.region_failures,
            wars = report.wars_advanced,
            declared = report.wars_declared,
            "World tick complete"
        );
        Ok(report)
    }

    async fn process_region(&self, region: &Region, now: DateTime<Utc>) -> Result<RegionTick> {
        let mut result = RegionTick::default();
        let Some(tension) = self.tension.region_tension(region.id, now).await? else {
            return Ok(result);
        };
        let faction_count = region
            .faction_influence
            .keys()
            .filter(|id| region.influence_of(**id) > 0.0)
            .count();

        let triggers = check_conflict_triggers(tension, faction_count);
        for trigger in &triggers {
            debug!(region_id = %region.id, ?trigger, tension, "Conflict trigger");
            publish_event(
                self.events.as_ref(),
                DomainEvent::ConflictTriggered {
                    metadata: EventMetadata::at(now),
                    region_id: region.id,
                    trigger: *trigger,
                    tension,
                },
            )
            .await;
        }
        result.conflicts = triggers.len();
        if !triggers.contains(&ConflictTrigger::FactionRevolt) {
            return Ok(result);
        }

        for poi_id in self.tension.pois_in(region.id).await {
            let poi_tension = self.tension.calculate_tension(region.id, poi_id, now).await?;
            let outcome = {
                let mut rng = self.rng.lock().await;
                simulate_revolt(
                    region.id,
                    poi_id,
                    poi_tension,
                    faction_count,
                    &self.revolt,
                    &mut *rng,
                    now,
                )
            };
            let Some(outcome) = outcome else {
                continue;
            };

            self.tension
                .add_modifier(
                    region.id,
                    poi_id,
                    AddModifierRequest {
                        kind: POST_REVOLT_MODIFIER.to_string(),
                        value: self.revolt.relief_modifier,
                        duration_hours: self.revolt.relief_duration_hours,
                        source: "revolt".to_string(),
                    },
                    now,
                )
                .await?;
            info!(
                region_id = %region.id,
                %poi_id,
                duration_hours = outcome.duration_hours,
                casualties = outcome.casualties.total(),
                "Revolt broke out in {}",
                region.name
            );
            publish_event(
                self.events.as_ref(),
                DomainEvent::RevoltOccurred {
                    metadata: EventMetadata::at(now),
                    region_id: region.id,
                    poi_id,
                    duration_hours: outcome.duration_hours,
                    casualties: outcome.casualties.total(),
                },
            )
            .await;
            result.revolts += 1;
        }
        Ok(result)
    }
}
