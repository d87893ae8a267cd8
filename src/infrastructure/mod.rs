//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Persistence: in-memory and SQLite stores behind the repository ports
//! - Events: tracing and recording event publishers
//! - Config: application configuration and simulation data files
//! - State: Shared application state

pub mod config;
pub mod config_files;
pub mod events;
pub mod persistence;
pub mod state;
