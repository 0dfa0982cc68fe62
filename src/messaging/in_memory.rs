use std::sync::Mutex;

use async_trait::async_trait;

use super::EventPublisher;

// ============================================================================
// In-Memory Event Publisher
// ============================================================================
//
// Records everything it is asked to publish. Useful for testing and
// development; `failing()` turns every publish into an error so callers'
// fire-and-forget handling can be exercised.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
    pub topic: String,
    pub key: String,
    pub payload: String,
}

pub struct InMemoryEventPublisher {
    events: Mutex<Vec<PublishedEvent>>,
    fail: bool,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// Every publish fails. Nothing is recorded.
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn published(&self) -> Vec<PublishedEvent> {
        self.events.lock().expect("Mutex poisoned").clone()
    }
}

impl Default for InMemoryEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("publisher configured to fail");
        }

        self.events.lock().expect("Mutex poisoned").push(PublishedEvent {
            topic: topic.to_string(),
            key: key.to_string(),
            payload: payload.to_string(),
        });
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_events_in_order() {
        let publisher = InMemoryEventPublisher::new();

        publisher
            .publish("order-events", "order.created", "{}")
            .await
            .unwrap();
        publisher
            .publish("order-events", "order.status.updated", "{}")
            .await
            .unwrap();

        let events = publisher.published();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].key, "order.created");
        assert_eq!(events[1].key, "order.status.updated");
    }

    #[tokio::test]
    async fn test_failing_publisher_records_nothing() {
        let publisher = InMemoryEventPublisher::failing();

        let result = publisher.publish("order-events", "order.created", "{}").await;
        assert!(result.is_err());
        assert!(publisher.published().is_empty());
    }
}
