//! Domain entities - Core simulation records with identity

mod faction;
mod faction_relationship;
mod point_of_interest;
mod region;
mod tension;
mod war;

pub use faction::{Faction, FactionTrait, FactionType, Territory};
pub use faction_relationship::{FactionPair, FactionRelationship, TensionChange};
pub use point_of_interest::PointOfInterest;
pub(crate) use region::sanitize_unit;
pub use region::{Region, RegionAdjacency};
pub use tension::{
    TensionEventRecord, TensionModifier, TensionSnapshot, TensionState, RECENT_EVENT_LIMIT,
};
pub use war::{
    Battle, PairTensionChange, PeaceOffer, ResourceTransfer, TerritorialChange, WarOutcome,
    WarOutcomeType, WarPhase, WarState,
};
