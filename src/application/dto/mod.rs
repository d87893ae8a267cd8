//! Data Transfer Objects - Typed requests crossing the application boundary
//!
//! DTOs live in the application layer so callers can deserialize updates
//! without reaching into entity fields directly.

pub mod updates;

pub use updates::{UpdateFactionRequest, UpdateRegionRequest, UpdateRelationshipRequest};
