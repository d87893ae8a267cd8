//! Event publisher adapters

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::ports::outbound::EventPublisherPort;
use crate::domain::events::DomainEvent;

/// Writes every domain event to the tracing log as JSON
#[derive(Debug, Default)]
pub struct TracingEventPublisher;

impl TracingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisherPort for TracingEventPublisher {
    async fn publish(&self, event: &DomainEvent) -> anyhow::Result<()> {
        let payload = serde_json::to_string(event)?;
        tracing::info!(event = event.event_type(), %payload, "Domain event");
        Ok(())
    }
}

/// Keeps published events in memory, in publication order
#[derive(Debug, Default)]
pub struct RecordingEventPublisher {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().await.clone()
    }

    /// Remove and return everything recorded so far
    pub async fn take(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut *self.events.lock().await)
    }
}

#[async_trait]
impl EventPublisherPort for RecordingEventPublisher {
    async fn publish(&self, event: &DomainEvent) -> anyhow::Result<()> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}
