use super::value_objects::{OrderStatus, PaymentStatus};
use crate::store::StoreError;

// ============================================================================
// Order Business Rule Errors
// ============================================================================
//
// Every variant is recoverable: the caller gets a structured failure, the
// service keeps running. Messages are what API clients see.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Insufficient stock for product: {0}")]
    InsufficientStock(String),

    #[error("Product service unavailable: {0}")]
    InventoryUnavailable(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order does not belong to this tenant")]
    TenantMismatch,

    #[error("Could not reserve a unique order number after {0} attempts")]
    OrderNumberExhausted(u32),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Invalid payment status transition: {from} -> {to}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("Order store error: {0}")]
    Store(#[from] StoreError),
}

impl OrderError {
    /// Stable tag for metrics labels.
    pub fn reason(&self) -> &'static str {
        match self {
            OrderError::InvalidRequest(_) => "invalid_request",
            OrderError::ProductNotFound(_) => "product_not_found",
            OrderError::InsufficientStock(_) => "insufficient_stock",
            OrderError::InventoryUnavailable(_) => "inventory_unavailable",
            OrderError::OrderNotFound(_) => "order_not_found",
            OrderError::TenantMismatch => "tenant_mismatch",
            OrderError::OrderNumberExhausted(_) => "order_number_exhausted",
            OrderError::InvalidStatusTransition { .. } => "invalid_status_transition",
            OrderError::InvalidPaymentTransition { .. } => "invalid_payment_transition",
            OrderError::Store(_) => "store",
        }
    }
}
