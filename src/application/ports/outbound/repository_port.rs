//! Repository ports - Interfaces for simulation persistence
//!
//! One trait per record type. Application services depend on these traits,
//! never on a concrete store. `save` inserts or replaces; `update` requires
//! the record to exist already.

use async_trait::async_trait;

use crate::domain::entities::{
    Faction, FactionPair, FactionRelationship, PointOfInterest, Region, TensionSnapshot, WarState,
};
use crate::domain::errors::SimulationError;
use crate::domain::value_objects::{FactionId, PoiId, RegionId, WarId};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepositoryError {
    pub fn not_found(kind: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<RepositoryError> for SimulationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { kind, id } => SimulationError::missing(kind, id),
            other => SimulationError::Repository(other.to_string()),
        }
    }
}

// =============================================================================
// Region Repository Port
// =============================================================================

#[async_trait]
pub trait RegionRepositoryPort: Send + Sync {
    async fn get(&self, id: RegionId) -> RepositoryResult<Option<Region>>;

    /// Insert or replace a region
    async fn save(&self, region: &Region) -> RepositoryResult<()>;

    /// Replace an existing region
    async fn update(&self, region: &Region) -> RepositoryResult<()>;

    /// Delete a region; false when it did not exist
    async fn delete(&self, id: RegionId) -> RepositoryResult<bool>;

    async fn list(&self) -> RepositoryResult<Vec<Region>>;
}

// =============================================================================
// Faction Repository Port
// =============================================================================

#[async_trait]
pub trait FactionRepositoryPort: Send + Sync {
    async fn get(&self, id: FactionId) -> RepositoryResult<Option<Faction>>;

    async fn save(&self, faction: &Faction) -> RepositoryResult<()>;

    async fn update(&self, faction: &Faction) -> RepositoryResult<()>;

    async fn delete(&self, id: FactionId) -> RepositoryResult<bool>;

    async fn list(&self) -> RepositoryResult<Vec<Faction>>;
}

// =============================================================================
// Point of Interest Repository Port
// =============================================================================

#[async_trait]
pub trait PoiRepositoryPort: Send + Sync {
    async fn get(&self, id: PoiId) -> RepositoryResult<Option<PointOfInterest>>;

    async fn save(&self, poi: &PointOfInterest) -> RepositoryResult<()>;

    async fn update(&self, poi: &PointOfInterest) -> RepositoryResult<()>;

    async fn delete(&self, id: PoiId) -> RepositoryResult<bool>;

    async fn list(&self) -> RepositoryResult<Vec<PointOfInterest>>;

    /// Points of interest located in a region
    async fn list_by_region(&self, region_id: RegionId) -> RepositoryResult<Vec<PointOfInterest>>;
}

// =============================================================================
// Relationship Repository Port
// =============================================================================

#[async_trait]
pub trait RelationshipRepositoryPort: Send + Sync {
    async fn get(&self, pair: FactionPair) -> RepositoryResult<Option<FactionRelationship>>;

    async fn save(&self, relationship: &FactionRelationship) -> RepositoryResult<()>;

    async fn update(&self, relationship: &FactionRelationship) -> RepositoryResult<()>;

    async fn delete(&self, pair: FactionPair) -> RepositoryResult<bool>;

    async fn list(&self) -> RepositoryResult<Vec<FactionRelationship>>;
}

// =============================================================================
// War Repository Port
// =============================================================================

#[async_trait]
pub trait WarRepositoryPort: Send + Sync {
    async fn get(&self, id: WarId) -> RepositoryResult<Option<WarState>>;

    async fn save(&self, war: &WarState) -> RepositoryResult<()>;

    async fn update(&self, war: &WarState) -> RepositoryResult<()>;

    async fn delete(&self, id: WarId) -> RepositoryResult<bool>;

    /// All wars, archived ones included
    async fn list(&self) -> RepositoryResult<Vec<WarState>>;

    async fn list_active(&self) -> RepositoryResult<Vec<WarState>>;

    /// The active war between two factions, in either order
    async fn find_active_between(
        &self,
        a: FactionId,
        b: FactionId,
    ) -> RepositoryResult<Option<WarState>>;
}

// =============================================================================
// Tension Repository Port
// =============================================================================

#[async_trait]
pub trait TensionRepositoryPort: Send + Sync {
    async fn get(&self, region_id: RegionId, poi_id: PoiId) -> RepositoryResult<Option<TensionSnapshot>>;

    async fn save(&self, snapshot: &TensionSnapshot) -> RepositoryResult<()>;

    async fn update(&self, snapshot: &TensionSnapshot) -> RepositoryResult<()>;

    async fn delete(&self, region_id: RegionId, poi_id: PoiId) -> RepositoryResult<bool>;

    async fn list(&self) -> RepositoryResult<Vec<TensionSnapshot>>;
}
