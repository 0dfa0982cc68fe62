use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::OrderError;
use super::value_objects::{OrderItem, OrderStatus, PaymentStatus};

// ============================================================================
// Order Aggregate
// ============================================================================
//
// `order_number`, `tenant_id`, `total_amount` and `order_items` are fixed
// at creation. Only the two status fields and `updated_at` change after a
// successful insert, and only through the transition tables.
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    pub shipping_address: String,
    pub billing_address: String,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub order_items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sum of line totals. Equals `total_amount` for every persisted order.
    pub fn items_total(&self) -> Decimal {
        self.order_items.iter().map(|item| item.total_price).sum()
    }

    pub fn belongs_to(&self, tenant_id: Uuid) -> bool {
        self.tenant_id == tenant_id
    }

    /// Move the order to `next`, rejecting transitions outside the table.
    pub fn transition_status(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn transition_payment(&mut self, next: PaymentStatus) -> Result<(), OrderError> {
        if !self.payment_status.can_transition_to(next) {
            return Err(OrderError::InvalidPaymentTransition {
                from: self.payment_status,
                to: next,
            });
        }
        self.payment_status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
