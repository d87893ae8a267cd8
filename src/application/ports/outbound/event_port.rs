//! Event publisher port - Outbound notification of domain events

use async_trait::async_trait;

use crate::domain::events::DomainEvent;

#[async_trait]
pub trait EventPublisherPort: Send + Sync {
    async fn publish(&self, event: &DomainEvent) -> anyhow::Result<()>;
}
