//! Application services - Use case implementations
//!
//! Each service accepts repository ports and the event publisher, runs the
//! synchronous domain engines and persists what changed.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::Mutex;
use tracing::warn;

use crate::application::ports::outbound::EventPublisherPort;
use crate::domain::events::DomainEvent;

pub mod political_service;
pub mod tension_service;
pub mod war_service;
pub mod world_generation_service;
pub mod world_tick_service;

pub use political_service::{PoliticalService, PoliticalTickReport};
pub use tension_service::{AddModifierRequest, TensionImpactRequest, TensionService, TensionServiceImpl};
pub use war_service::WarService;
pub use world_generation_service::WorldGenerationService;
pub use world_tick_service::{WorldTickReport, WorldTickService};

/// Seeded generator shared by every service that rolls dice
pub type SharedRng = Arc<Mutex<ChaCha8Rng>>;

pub fn seeded_rng(seed: u64) -> SharedRng {
    Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed)))
}

/// Publish after the state change is stored; a failed publish is only logged
pub(crate) async fn publish_event(events: &dyn EventPublisherPort, event: DomainEvent) {
    if let Err(e) = events.publish(&event).await {
        warn!(event = event.event_type(), error = %e, "Failed to publish domain event");
    }
}
