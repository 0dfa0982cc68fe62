use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    producer::{FutureProducer, FutureRecord},
};

use super::EventPublisher;

// ============================================================================
// Kafka Event Publisher
// ============================================================================

pub struct KafkaEventPublisher {
    producer: FutureProducer,
    timeout: std::time::Duration,
}

impl KafkaEventPublisher {
    pub fn new(brokers: &str, timeout_ms: u64) -> anyhow::Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", timeout_ms.to_string())
            .create()?;

        Ok(Self {
            producer,
            timeout: std::time::Duration::from_millis(timeout_ms),
        })
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> anyhow::Result<()> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        self.producer
            .send(record, rdkafka::util::Timeout::After(self.timeout))
            .await
            .map_err(|(e, _)| anyhow::anyhow!("Kafka send error: {}", e))?;

        tracing::info!(
            topic = %topic,
            key = %key,
            "Published order event"
        );
        Ok(())
    }
}

// Note: publishing against a live broker is covered by integration tests;
// unit coverage of the fire-and-forget contract lives with the in-memory
// publisher and the order service tests.
