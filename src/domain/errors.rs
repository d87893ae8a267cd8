//! Simulation error taxonomy
//!
//! Engines return these so the tick loop can tell a fatal configuration
//! problem apart from a single region that should be logged and skipped.

use crate::domain::value_objects::{PoiId, RegionId};

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// Malformed or missing tension/biome configuration. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A region, faction or war referenced by id could not be found
    #[error("Simulation data error: {0}")]
    SimulationData(String),

    /// A war-state transition that is not allowed from the current phase
    #[error("Invalid state transition: {0}")]
    StateTransition(String),

    /// Tension arithmetic produced an unusable value
    #[error("Tension calculation failed for region {region_id}, poi {poi_id}: {reason}")]
    Tension {
        region_id: RegionId,
        poi_id: PoiId,
        reason: String,
    },

    #[error("Repository error: {0}")]
    Repository(String),
}

impl SimulationError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn missing(kind: &str, id: impl std::fmt::Display) -> Self {
        Self::SimulationData(format!("{} not found: {}", kind, id))
    }

    pub fn transition(message: impl Into<String>) -> Self {
        Self::StateTransition(message.into())
    }

    /// Whether a tick may skip the affected region and keep going
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }
}

pub type SimulationResult<T> = Result<T, SimulationError>;
