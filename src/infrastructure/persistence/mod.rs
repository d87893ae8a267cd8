//! Persistence adapters
//!
//! Both stores implement every repository port: `InMemoryRepository` for
//! tests and throwaway runs, `SqliteRepository` for durable worlds.

mod memory;
mod sqlite;

pub use memory::InMemoryRepository;
pub use sqlite::SqliteRepository;
