use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::inventory::{GatewayError, ProductGateway};

use super::aggregate::Order;
use super::commands::CreateOrderRequest;
use super::errors::OrderError;
use super::value_objects::{OrderItem, OrderStatus, PaymentStatus};

// ============================================================================
// Order Builder - assembles a pending aggregate from a request
// ============================================================================
//
// Sequence:
// 1. Request shape validation (no remote calls yet)
// 2. One product fetch per line, in request order; duplicate product ids
//    are fetched again, not merged
// 3. Advisory stock check against the fetched snapshot
// 4. Snapshot name and unit price, compute exact line and order totals
//
// The snapshot check catches obviously doomed orders before anything is
// persisted; the gateway's atomic decrement at reservation time is the
// authoritative check.
//
// ============================================================================

pub struct OrderBuilder {
    gateway: Arc<dyn ProductGateway>,
}

impl OrderBuilder {
    pub fn new(gateway: Arc<dyn ProductGateway>) -> Self {
        Self { gateway }
    }

    pub async fn build(
        &self,
        request: &CreateOrderRequest,
        user_id: Uuid,
        tenant_id: Uuid,
        order_number: String,
    ) -> Result<Order, OrderError> {
        request.validate()?;

        let mut order_items = Vec::with_capacity(request.items.len());
        let mut total_amount = Decimal::ZERO;

        for line in &request.items {
            let product = self
                .gateway
                .fetch_product(&line.product_id)
                .await
                .map_err(|e| match e {
                    GatewayError::NotFound => OrderError::ProductNotFound(line.product_id.clone()),
                    GatewayError::InsufficientStock => {
                        OrderError::InsufficientStock(line.product_id.clone())
                    }
                    GatewayError::Unavailable(detail) => OrderError::InventoryUnavailable(detail),
                })?;

            if product.stock_quantity < line.quantity {
                return Err(OrderError::InsufficientStock(product.name));
            }

            let total_price = product.price * Decimal::from(line.quantity);
            total_amount += total_price;

            order_items.push(OrderItem {
                product_id: line.product_id.clone(),
                product_name: product.name,
                quantity: line.quantity,
                unit_price: product.price,
                total_price,
            });
        }

        let now = Utc::now();
        Ok(Order {
            id: Uuid::new_v4(),
            order_number,
            user_id,
            tenant_id,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            total_amount,
            shipping_address: request.shipping_address.clone(),
            billing_address: request.billing_address.clone(),
            payment_method: request.payment_method.clone(),
            notes: request.notes.clone(),
            order_items,
            created_at: now,
            updated_at: now,
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
