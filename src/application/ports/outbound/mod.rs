//! Outbound ports - Interfaces that the application requires from external systems

mod event_port;
mod repository_port;

pub use event_port::EventPublisherPort;
pub use repository_port::{
    FactionRepositoryPort, PoiRepositoryPort, RegionRepositoryPort, RelationshipRepositoryPort,
    RepositoryError, RepositoryResult, TensionRepositoryPort, WarRepositoryPort,
};
