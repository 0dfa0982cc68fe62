// Private module declarations
mod http;
mod memory;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-export for public API
pub use http::HttpProductGateway;
pub use memory::InMemoryProductGateway;

// ============================================================================
// Inventory Gateway - client abstraction over the product service
// ============================================================================
//
// Two operations:
// - fetch_product:   read a product snapshot (name, price, stock)
// - decrement_stock: atomically take stock, failing when not enough remains
//
// decrement_stock is a compare-and-swap on the remote side. Two writers
// racing for the last unit cannot both succeed; the loser gets
// InsufficientStock instead of silently overwriting the count.
//
// ============================================================================

/// Product snapshot as the product service serves it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub tenant_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("product not found")]
    NotFound,

    #[error("insufficient stock")]
    InsufficientStock,

    #[error("product service unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ProductGateway: Send + Sync {
    /// Fetch the current product snapshot.
    async fn fetch_product(&self, product_id: &str) -> Result<Product, GatewayError>;

    /// Atomically decrement stock, failing with `InsufficientStock` when
    /// fewer than `quantity` units remain.
    async fn decrement_stock(
        &self,
        product_id: &str,
        tenant_id: Uuid,
        quantity: i32,
    ) -> Result<(), GatewayError>;
}
