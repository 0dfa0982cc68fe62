// Private module declarations
mod memory;
mod scylla;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus, PaymentStatus};

// Re-export for public API
pub use memory::InMemoryOrderStore;
pub use scylla::ScyllaOrderStore;

// ============================================================================
// Order Store - persistence behind the workflow
// ============================================================================
//
// insert enforces order-number uniqueness at the storage layer; racing
// writers see DuplicateOrderNumber instead of a second order under the
// same number. Orders are never deleted. List results are deterministic:
// creation time, then id.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("order not found")]
    NotFound,

    #[error("order number already in use: {0}")]
    DuplicateOrderNumber(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Zero-based page over a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 20;

    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: if size == 0 { Self::DEFAULT_SIZE } else { size },
        }
    }

    pub fn offset(&self) -> usize {
        self.page as usize * self.size as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: Self::DEFAULT_SIZE,
        }
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order. Fails with `DuplicateOrderNumber` when the
    /// number is already taken.
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;

    /// Persist status changes to an existing order.
    async fn update(&self, order: &Order) -> Result<(), StoreError>;

    async fn order_number_in_use(&self, order_number: &str) -> Result<bool, StoreError>;

    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<Order>, StoreError>;

    async fn find_by_order_number(&self, order_number: &str)
        -> Result<Option<Order>, StoreError>;

    async fn list_by_user(&self, user_id: Uuid, page: PageRequest)
        -> Result<Vec<Order>, StoreError>;

    async fn list_by_tenant(
        &self,
        tenant_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Order>, StoreError>;

    async fn list_by_user_and_tenant(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Vec<Order>, StoreError>;

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError>;

    async fn list_by_tenant_and_status(
        &self,
        tenant_id: Uuid,
        status: OrderStatus,
    ) -> Result<Vec<Order>, StoreError>;

    async fn list_by_payment_status(
        &self,
        payment_status: PaymentStatus,
    ) -> Result<Vec<Order>, StoreError>;

    async fn list_by_tenant_and_payment_status(
        &self,
        tenant_id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Vec<Order>, StoreError>;
}

// ============================================================================
// Unit Tests
// ============================================================================
