//! Visual DM Engine - world simulation core
//!
//! Tracks location tension, faction control of regions, inter-faction
//! relationships and wars over a generated hex world, advanced one tick
//! at a time.

pub mod application;
pub mod domain;
pub mod infrastructure;
