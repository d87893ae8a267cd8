//! Value objects - Immutable objects defined by their attributes

mod biome;
mod control;
mod hex;
mod ids;
mod settings;
mod tension;

pub use biome::{BiomeConfig, BiomeRegistry, EnvironmentRange};
pub use control::{ControlBand, ControlEffects, FactionControl, GrowthFactors};
pub use hex::HexCoordinate;
pub use ids::*;
pub use settings::{
    PlacementConfig, PoliticalControlConfig, PopulationConfig, RelationshipConfig, RevoltConfig,
    SchismConfig, SimulationSettings, WarConfig, WorldConfig,
};
pub use tension::{
    get_tension_level, RelationshipType, TensionConfig, TensionConfigRegistry, TensionLevel,
    DEFAULT_CATEGORY,
};
