// Private module declaration
mod server;

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus instrumentation for the order workflow
// ============================================================================
//
// Covers:
// - Order creation (throughput, latency, failures by reason)
// - Stock reservation outcomes against the product service
// - Integration event publishing by key and outcome
// - Status and payment-status updates
//
// Everything registers into one registry, scraped via /metrics
// ============================================================================

/// Shared handles to every metric the service records
pub struct Metrics {
    registry: Registry,

    // Order Creation Metrics
    pub orders_created: IntCounter,
    pub orders_failed: IntCounterVec,
    pub order_create_duration: Histogram,

    // Stock Reservation Metrics
    pub stock_decrements: IntCounterVec,

    // Event Publishing Metrics
    pub events_published: IntCounterVec,
    pub events_failed: IntCounterVec,

    // Lifecycle Update Metrics
    pub status_updates: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Order Creation Metrics
        let orders_created = IntCounter::new("orders_created_total", "Total orders created")?;
        registry.register(Box::new(orders_created.clone()))?;

        let orders_failed = IntCounterVec::new(
            Opts::new("orders_failed_total", "Total order operations that failed"),
            &["reason"],
        )?;
        registry.register(Box::new(orders_failed.clone()))?;

        let order_create_duration = Histogram::with_opts(
            HistogramOpts::new("order_create_duration_seconds", "Order creation duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(order_create_duration.clone()))?;

        // Stock Reservation Metrics
        let stock_decrements = IntCounterVec::new(
            Opts::new("stock_decrements_total", "Stock decrement calls by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(stock_decrements.clone()))?;

        // Event Publishing Metrics
        let events_published = IntCounterVec::new(
            Opts::new("events_published_total", "Integration events published"),
            &["event"],
        )?;
        registry.register(Box::new(events_published.clone()))?;

        let events_failed = IntCounterVec::new(
            Opts::new("events_failed_total", "Integration events that failed to publish"),
            &["event"],
        )?;
        registry.register(Box::new(events_failed.clone()))?;

        // Lifecycle Update Metrics
        let status_updates = IntCounterVec::new(
            Opts::new("status_updates_total", "Status updates applied"),
            &["kind"],
        )?;
        registry.register(Box::new(status_updates.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            orders_failed,
            order_create_duration,
            stock_decrements,
            events_published,
            events_failed,
            status_updates,
        })
    }

    /// Registry handle for the scrape endpoint
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record a failed order operation
    pub fn record_failure(&self, reason: &str) {
        self.orders_failed.with_label_values(&[reason]).inc();
    }

    /// Helper to record a stock decrement outcome
    pub fn record_stock_decrement(&self, success: bool) {
        let outcome = if success { "ok" } else { "failed" };
        self.stock_decrements.with_label_values(&[outcome]).inc();
    }

    /// Helper to record a publish outcome for an event key
    pub fn record_publish(&self, event: &str, success: bool) {
        if success {
            self.events_published.with_label_values(&[event]).inc();
        } else {
            self.events_failed.with_label_values(&[event]).inc();
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
