//! Domain layer - Core simulation logic with no I/O
//!
//! This layer contains:
//! - Entities: Region, Faction, PointOfInterest, WarState, tension state
//! - Value Objects: ids, hex coordinates, biome and tension configuration
//! - Domain Events: State changes and notifications
//! - Domain Services: the tension, political, placement and war engines

pub mod entities;
pub mod errors;
pub mod events;
pub mod services;
pub mod value_objects;
