// Private module declarations
mod in_memory;
mod kafka;

use async_trait::async_trait;

// Re-export for public API
pub use in_memory::{InMemoryEventPublisher, PublishedEvent};
pub use kafka::KafkaEventPublisher;

// ============================================================================
// Event Publishing - best-effort integration events
// ============================================================================
//
// At-most-once. Callers treat a failed publish as a logged fact, not an
// error: the order workflow never rolls back because the broker was down.
//
// ============================================================================

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> anyhow::Result<()>;
}
