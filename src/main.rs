use std::sync::Arc;

use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod domain;
mod inventory;
mod messaging;
mod metrics;
mod store;


use config::{Config, StoreBackend};
use domain::order::OrderService;
use inventory::HttpProductGateway;
use messaging::KafkaEventPublisher;
use store::{InMemoryOrderStore, OrderStore, ScyllaOrderStore};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_service=debug")),
        )
        .init();

    tracing::info!("🚀 Starting order service");

    // === 1. Load configuration ===
    let config = Config::load();
    tracing::info!(
        http_port = config.http_port,
        metrics_port = config.metrics_port,
        backend = ?config.store_backend,
        "Configuration loaded"
    );

    // === 2. Initialize Prometheus metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!(
        "📊 Metrics registry created with {} metrics",
        metrics.registry().gather().len()
    );

    // Start metrics HTTP server in background thread
    let metrics_registry = Arc::new(metrics.registry().clone());
    let metrics_port = config.metrics_port;
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            if let Err(e) = metrics::start_metrics_server(metrics_registry, metrics_port).await {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    });

    // === 3. Open the order store ===
    let store: Arc<dyn OrderStore> = match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory order store; orders are lost on restart");
            Arc::new(InMemoryOrderStore::new())
        }
        StoreBackend::Scylla => {
            tracing::info!("Connecting to ScyllaDB at {}", config.scylla_node);
            let session: Session = SessionBuilder::new()
                .known_node(&config.scylla_node)
                .build()
                .await?;

            // Ensure keyspace exists (optional, or do this via cqlsh)
            session
                .query_unpaged(
                    format!(
                        "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = \
                         {{'class': 'SimpleStrategy', 'replication_factor': 1}}",
                        config.scylla_keyspace
                    ),
                    &[],
                )
                .await?;

            session.use_keyspace(&config.scylla_keyspace, false).await?;

            let session = Arc::new(session);
            ScyllaOrderStore::init_schema(&session).await?;
            Arc::new(ScyllaOrderStore::new(session))
        }
    };

    // === 4. Connect the product gateway and Kafka producer ===
    let gateway = Arc::new(HttpProductGateway::new(
        &config.product_service_url,
        config.gateway_timeout_ms,
    )?);

    let publisher = Arc::new(KafkaEventPublisher::new(
        &config.kafka_brokers,
        config.kafka_timeout_ms,
    )?);

    // === 5. Assemble the order service ===
    let service = Arc::new(OrderService::new(
        store,
        gateway,
        publisher,
        metrics,
        &config.order_events_topic,
        config.order_number_max_attempts,
    ));

    // === 6. Serve the order API ===
    api::start_http_server(service, config.http_port).await?;

    Ok(())
}
