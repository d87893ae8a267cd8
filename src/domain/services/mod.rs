//! Domain services - Simulation engines operating on domain records
//!
//! Every engine here is synchronous and free of I/O. Time and randomness are
//! passed in by the caller.

pub mod biome_placement;
pub mod conflict;
pub mod faction_relations;
pub mod political_control;
pub mod schism;
pub mod tension_impact;
pub mod tension_manager;
pub mod war_state_machine;
pub mod world_generator;

pub use biome_placement::{
    determine_biome, select_poi_type, BiomeGrid, BiomePlacer, EnvironmentSample, PlacementReport,
};
pub use conflict::{
    check_conflict_triggers, estimate_casualties, revolt_probability, simulate_revolt,
    ConflictTrigger, RevoltCasualties, RevoltOutcome,
};
pub use faction_relations::{
    calculate_war_chance, check_faction_war_triggers, decay_relationship, update_faction_tension,
    RelationshipTrigger,
};
pub use political_control::{InfluenceSpread, PoliticalControlEngine};
pub use schism::{calculate_faction_schism_probability, roll_schism, SchismAssessment};
pub use tension_impact::{
    DefaultImpactScorer, EnvironmentalChange, ImpactScorer, NpcChange, NpcChangeKind, PlayerAction,
    PlayerActionKind,
};
pub use tension_manager::{
    decay_tension, DecayStats, LocationClassifier, PoiTypeClassifier, TensionManager,
};
pub use war_state_machine::{terrain_modifier, WarAdvance, WarContext, WarManager};
pub use world_generator::{GeneratedWorld, WorldGenerator};
