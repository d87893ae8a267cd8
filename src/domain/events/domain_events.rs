//! Domain events - Notifications of significant simulation changes
//!
//! Services publish these through the event publisher port after a state
//! change has been persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{FactionPair, WarOutcomeType};
use crate::domain::services::{ConflictTrigger, RelationshipTrigger};
use crate::domain::value_objects::{BattleId, FactionId, PoiId, RegionId, WarId};

/// Base data for all events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Simulation time of the event
    pub timestamp: DateTime<Utc>,
    /// Optional correlation ID for tracing
    pub correlation_id: Option<String>,
}

impl EventMetadata {
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

/// All domain events in the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    // ========================================================================
    // Tension Events
    // ========================================================================

    /// Location tension changed through an update
    TensionUpdated {
        metadata: EventMetadata,
        region_id: RegionId,
        poi_id: PoiId,
        old_level: f64,
        new_level: f64,
    },

    /// Regional tension crossed a conflict threshold
    ConflictTriggered {
        metadata: EventMetadata,
        region_id: RegionId,
        trigger: ConflictTrigger,
        tension: f64,
    },

    /// A location rose up
    RevoltOccurred {
        metadata: EventMetadata,
        region_id: RegionId,
        poi_id: PoiId,
        duration_hours: i64,
        casualties: u32,
    },

    // ========================================================================
    // Political Events
    // ========================================================================

    /// A region changed hands
    RegionControlChanged {
        metadata: EventMetadata,
        region_id: RegionId,
        previous: Option<FactionId>,
        current: Option<FactionId>,
        control_level: f64,
    },

    /// A faction pushed influence into neighbouring regions
    InfluenceSpread {
        metadata: EventMetadata,
        faction_id: FactionId,
        source_region: RegionId,
        regions_reached: usize,
    },

    /// Relationship tension between two factions changed
    RelationshipChanged {
        metadata: EventMetadata,
        pair: FactionPair,
        old_tension: f64,
        new_tension: f64,
        triggers: Vec<RelationshipTrigger>,
    },

    /// A faction's schism risk was rolled
    SchismRisk {
        metadata: EventMetadata,
        faction_id: FactionId,
        probability: f64,
        occurred: bool,
    },

    // ========================================================================
    // War Events
    // ========================================================================

    WarDeclared {
        metadata: EventMetadata,
        war_id: WarId,
        faction_a: FactionId,
        faction_b: FactionId,
    },

    BattleFought {
        metadata: EventMetadata,
        war_id: WarId,
        battle_id: BattleId,
        region_id: Option<RegionId>,
        winner: Option<FactionId>,
    },

    PeaceNegotiationStarted {
        metadata: EventMetadata,
        war_id: WarId,
        offered_by: FactionId,
    },

    WarConcluded {
        metadata: EventMetadata,
        war_id: WarId,
        outcome_type: WarOutcomeType,
        winner: Option<FactionId>,
    },

    // ========================================================================
    // World Events
    // ========================================================================

    WorldGenerated {
        metadata: EventMetadata,
        seed: u64,
        regions: usize,
        points_of_interest: usize,
    },
}

impl DomainEvent {
    /// Get the metadata for this event
    pub fn metadata(&self) -> &EventMetadata {
        match self {
            DomainEvent::TensionUpdated { metadata, .. } => metadata,
            DomainEvent::ConflictTriggered { metadata, .. } => metadata,
            DomainEvent::RevoltOccurred { metadata, .. } => metadata,
            DomainEvent::RegionControlChanged { metadata, .. } => metadata,
            DomainEvent::InfluenceSpread { metadata, .. } => metadata,
            DomainEvent::RelationshipChanged { metadata, .. } => metadata,
            DomainEvent::SchismRisk { metadata, .. } => metadata,
            DomainEvent::WarDeclared { metadata, .. } => metadata,
            DomainEvent::BattleFought { metadata, .. } => metadata,
            DomainEvent::PeaceNegotiationStarted { metadata, .. } => metadata,
            DomainEvent::WarConcluded { metadata, .. } => metadata,
            DomainEvent::WorldGenerated { metadata, .. } => metadata,
        }
    }

    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::TensionUpdated { .. } => "TensionUpdated",
            DomainEvent::ConflictTriggered { .. } => "ConflictTriggered",
            DomainEvent::RevoltOccurred { .. } => "RevoltOccurred",
            DomainEvent::RegionControlChanged { .. } => "RegionControlChanged",
            DomainEvent::InfluenceSpread { .. } => "InfluenceSpread",
            DomainEvent::RelationshipChanged { .. } => "RelationshipChanged",
            DomainEvent::SchismRisk { .. } => "SchismRisk",
            DomainEvent::WarDeclared { .. } => "WarDeclared",
            DomainEvent::BattleFought { .. } => "BattleFought",
            DomainEvent::PeaceNegotiationStarted { .. } => "PeaceNegotiationStarted",
            DomainEvent::WarConcluded { .. } => "WarConcluded",
            DomainEvent::WorldGenerated { .. } => "WorldGenerated",
        }
    }
}
