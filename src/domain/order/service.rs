use std::sync::Arc;

use rand::Rng;
use uuid::Uuid;

use crate::inventory::{GatewayError, ProductGateway};
use crate::messaging::EventPublisher;
use crate::metrics::Metrics;
use crate::store::{OrderStore, PageRequest, StoreError};

use super::aggregate::Order;
use super::builder::OrderBuilder;
use super::commands::CreateOrderRequest;
use super::errors::OrderError;
use super::events::OrderEventKind;
use super::value_objects::{OrderStatus, PaymentStatus};

// ============================================================================
// Order Service - the creation workflow and lifecycle updates
// ============================================================================
//
// create_order sequences four effects with no shared transaction:
//
//   reserve number -> persist Pending -> reserve stock -> publish
//
// A stock reservation failure after persistence marks the order
// StockReservationFailed and surfaces the failure; decrements already
// applied for earlier lines are left standing, reconciliation is an
// operator concern. Publishing is fire-and-forget: a lost event never
// fails the operation that triggered it.
//
// Concurrent create_order calls are independent. Number uniqueness is the
// storage layer's job; stock contention is settled by the gateway's atomic
// decrement.
//
// ============================================================================

const ORDER_NUMBER_PREFIX: &str = "ORD-";
const ORDER_NUMBER_SUFFIX_LEN: usize = 8;
const ORDER_NUMBER_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Candidate order number: "ORD-" plus eight characters of A-Z0-9.
pub fn generate_order_number() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ORDER_NUMBER_SUFFIX_LEN)
        .map(|_| ORDER_NUMBER_ALPHABET[rng.gen_range(0..ORDER_NUMBER_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", ORDER_NUMBER_PREFIX, suffix)
}

pub struct OrderService {
    store: Arc<dyn OrderStore>,
    gateway: Arc<dyn ProductGateway>,
    publisher: Arc<dyn EventPublisher>,
    builder: OrderBuilder,
    metrics: Arc<Metrics>,
    topic: String,
    number_max_attempts: u32,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        gateway: Arc<dyn ProductGateway>,
        publisher: Arc<dyn EventPublisher>,
        metrics: Arc<Metrics>,
        topic: &str,
        number_max_attempts: u32,
    ) -> Self {
        Self {
            store,
            builder: OrderBuilder::new(gateway.clone()),
            gateway,
            publisher,
            metrics,
            topic: topic.to_string(),
            number_max_attempts,
        }
    }

    // ------------------------------------------------------------------
    // Creation workflow
    // ------------------------------------------------------------------

    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Order, OrderError> {
        let timer = self.metrics.order_create_duration.start_timer();
        let result = self.create_order_inner(request, user_id, tenant_id).await;
        timer.observe_duration();

        match &result {
            Ok(order) => {
                self.metrics.orders_created.inc();
                tracing::info!(
                    order_id = %order.id,
                    order_number = %order.order_number,
                    tenant_id = %order.tenant_id,
                    total_amount = %order.total_amount,
                    "Order created"
                );
            }
            Err(e) => {
                self.metrics.record_failure(e.reason());
                tracing::warn!(
                    tenant_id = %tenant_id,
                    user_id = %user_id,
                    error = %e,
                    "Order creation failed"
                );
            }
        }
        result
    }

    async fn create_order_inner(
        &self,
        request: CreateOrderRequest,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Order, OrderError> {
        request.validate()?;

        let mut attempts: u32 = 0;
        let order_number = self.reserve_order_number(&mut attempts).await?;

        let mut order = self
            .builder
            .build(&request, user_id, tenant_id, order_number)
            .await?;

        // The storage layer enforces number uniqueness; a racing writer
        // shows up as DuplicateOrderNumber and we retry with a fresh
        // candidate under the same attempt budget.
        loop {
            match self.store.insert(&order).await {
                Ok(()) => break,
                Err(StoreError::DuplicateOrderNumber(taken)) => {
                    tracing::warn!(order_number = %taken, "Order number lost to a racing writer");
                    order.order_number = self.reserve_order_number(&mut attempts).await?;
                }
                Err(e) => return Err(OrderError::Store(e)),
            }
        }

        if let Err(e) = self.reserve_stock(&order).await {
            self.mark_reservation_failed(&mut order).await;
            return Err(e);
        }

        self.publish_best_effort(OrderEventKind::Created, &order).await;

        Ok(order)
    }

    /// Draw candidate numbers until one is free, within the shared attempt
    /// budget for the whole creation.
    async fn reserve_order_number(&self, attempts: &mut u32) -> Result<String, OrderError> {
        while *attempts < self.number_max_attempts {
            *attempts += 1;
            let candidate = generate_order_number();
            if !self.store.order_number_in_use(&candidate).await? {
                return Ok(candidate);
            }
            tracing::warn!(order_number = %candidate, "Order number collision, regenerating");
        }
        Err(OrderError::OrderNumberExhausted(self.number_max_attempts))
    }

    /// One atomic decrement per line, in order. The first failure wins.
    async fn reserve_stock(&self, order: &Order) -> Result<(), OrderError> {
        for item in &order.order_items {
            match self
                .gateway
                .decrement_stock(&item.product_id, order.tenant_id, item.quantity)
                .await
            {
                Ok(()) => self.metrics.record_stock_decrement(true),
                Err(e) => {
                    self.metrics.record_stock_decrement(false);
                    tracing::warn!(
                        order_id = %order.id,
                        product_id = %item.product_id,
                        quantity = item.quantity,
                        error = %e,
                        "Stock reservation failed"
                    );
                    return Err(match e {
                        GatewayError::InsufficientStock => {
                            OrderError::InsufficientStock(item.product_name.clone())
                        }
                        GatewayError::NotFound => {
                            OrderError::ProductNotFound(item.product_id.clone())
                        }
                        GatewayError::Unavailable(detail) => {
                            OrderError::InventoryUnavailable(detail)
                        }
                    });
                }
            }
        }
        Ok(())
    }

    /// Compensation mark for a persisted order whose reservation failed.
    /// Best-effort: a store failure here is logged, the original error
    /// still goes back to the caller.
    async fn mark_reservation_failed(&self, order: &mut Order) {
        if let Err(e) = order.transition_status(OrderStatus::StockReservationFailed) {
            tracing::error!(order_id = %order.id, error = %e, "Could not mark reservation failure");
            return;
        }
        if let Err(e) = self.store.update(order).await {
            tracing::error!(
                order_id = %order.id,
                error = %e,
                "Could not persist reservation-failure mark"
            );
        }
    }

    async fn publish_best_effort(&self, kind: OrderEventKind, order: &Order) {
        let payload = match serde_json::to_string(order) {
            Ok(payload) => payload,
            Err(e) => {
                self.metrics.record_publish(kind.key(), false);
                tracing::error!(order_id = %order.id, error = %e, "Could not serialize order event");
                return;
            }
        };

        match self.publisher.publish(&self.topic, kind.key(), &payload).await {
            Ok(()) => self.metrics.record_publish(kind.key(), true),
            Err(e) => {
                self.metrics.record_publish(kind.key(), false);
                tracing::error!(
                    order_id = %order.id,
                    event = kind.key(),
                    error = %e,
                    "Event publish failed"
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle updates
    // ------------------------------------------------------------------

    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        tenant_id: Uuid,
    ) -> Result<Order, OrderError> {
        let mut order = self.load_owned(order_id, tenant_id).await?;
        order.transition_status(status)?;
        self.store.update(&order).await?;
        self.metrics.status_updates.with_label_values(&["order"]).inc();

        tracing::info!(order_id = %order.id, status = %order.status, "Order status updated");
        self.publish_best_effort(OrderEventKind::StatusUpdated, &order).await;
        Ok(order)
    }

    pub async fn update_payment_status(
        &self,
        order_id: Uuid,
        payment_status: PaymentStatus,
        tenant_id: Uuid,
    ) -> Result<Order, OrderError> {
        let mut order = self.load_owned(order_id, tenant_id).await?;
        order.transition_payment(payment_status)?;
        self.store.update(&order).await?;
        self.metrics.status_updates.with_label_values(&["payment"]).inc();

        tracing::info!(
            order_id = %order.id,
            payment_status = %order.payment_status,
            "Payment status updated"
        );
        self.publish_best_effort(OrderEventKind::PaymentUpdated, &order).await;
        Ok(order)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub async fn get_order(&self, order_id: Uuid, tenant_id: Uuid) -> Result<Order, OrderError> {
        self.load_owned(order_id, tenant_id).await
    }

    /// Lookup by the human-facing number. Unscoped: support tooling holds
    /// the bare number, not the tenant.
    pub async fn get_order_by_number(&self, order_number: &str) -> Result<Order, OrderError> {
        self.store
            .find_by_order_number(order_number)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(order_number.to_string()))
    }

    pub async fn list_orders_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list_by_user(user_id, page).await?)
    }

    pub async fn list_orders_by_tenant(
        &self,
        tenant_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list_by_tenant(tenant_id, page).await?)
    }

    pub async fn list_orders_by_user_and_tenant(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list_by_user_and_tenant(user_id, tenant_id).await?)
    }

    pub async fn list_orders_by_status(
        &self,
        status: OrderStatus,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list_by_status(status).await?)
    }

    pub async fn list_orders_by_tenant_and_status(
        &self,
        tenant_id: Uuid,
        status: OrderStatus,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list_by_tenant_and_status(tenant_id, status).await?)
    }

    pub async fn list_orders_by_payment_status(
        &self,
        payment_status: PaymentStatus,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list_by_payment_status(payment_status).await?)
    }

    pub async fn list_orders_by_tenant_and_payment_status(
        &self,
        tenant_id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(self
            .store
            .list_by_tenant_and_payment_status(tenant_id, payment_status)
            .await?)
    }

    async fn load_owned(&self, order_id: Uuid, tenant_id: Uuid) -> Result<Order, OrderError> {
        let order = self
            .store
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;

        if !order.belongs_to(tenant_id) {
            return Err(OrderError::TenantMismatch);
        }
        Ok(order)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderItemRequest;
    use crate::inventory::{InMemoryProductGateway, Product};
    use crate::messaging::InMemoryEventPublisher;
    use crate::store::InMemoryOrderStore;

    fn product(id: &str, name: &str, price: &str, stock: i32) -> Product {
        Product {
            id: id.to_string(),
            tenant_id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            sku: None,
            price: price.parse().unwrap(),
            stock_quantity: stock,
            unit: None,
            is_active: Some(true),
        }
    }

    fn request(lines: &[(&str, i32)]) -> CreateOrderRequest {
        CreateOrderRequest {
            items: lines
                .iter()
                .map(|(id, quantity)| OrderItemRequest {
                    product_id: id.to_string(),
                    quantity: *quantity,
                })
                .collect(),
            shipping_address: "1 Test Way".to_string(),
            billing_address: "1 Test Way".to_string(),
            payment_method: Some("card".to_string()),
            notes: None,
        }
    }

    fn service_with(
        products: Vec<Product>,
        max_attempts: u32,
    ) -> (OrderService, Arc<InMemoryOrderStore>, Arc<InMemoryEventPublisher>) {
        let store = Arc::new(InMemoryOrderStore::new());
        let gateway = Arc::new(InMemoryProductGateway::with_products(products));
        let publisher = Arc::new(InMemoryEventPublisher::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let service = OrderService::new(
            store.clone(),
            gateway,
            publisher.clone(),
            metrics,
            "order-events",
            max_attempts,
        );
        (service, store, publisher)
    }

    #[test]
    fn test_generated_number_format() {
        for _ in 0..100 {
            let number = generate_order_number();
            assert_eq!(number.len(), 12);
            assert!(number.starts_with("ORD-"));
            assert!(number[4..]
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_zero_attempt_budget_exhausts_immediately() {
        let (service, store, _) = service_with(vec![product("P1", "Widget", "9.99", 10)], 0);

        let err = service
            .create_order(request(&[("P1", 1)]), Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::OrderNumberExhausted(0)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_update_status_happy_path_publishes() {
        let tenant = Uuid::new_v4();
        let (service, _, publisher) = service_with(vec![product("P1", "Widget", "9.99", 10)], 10);

        let order = service
            .create_order(request(&[("P1", 1)]), Uuid::new_v4(), tenant)
            .await
            .unwrap();

        let updated = service
            .update_order_status(order.id, OrderStatus::Confirmed, tenant)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Confirmed);

        let keys: Vec<String> = publisher.published().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, ["order.created", "order.status.updated"]);
    }

    #[tokio::test]
    async fn test_update_status_rejects_illegal_transition() {
        let tenant = Uuid::new_v4();
        let (service, store, _) = service_with(vec![product("P1", "Widget", "9.99", 10)], 10);

        let order = service
            .create_order(request(&[("P1", 1)]), Uuid::new_v4(), tenant)
            .await
            .unwrap();

        let err = service
            .update_order_status(order.id, OrderStatus::Delivered, tenant)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidStatusTransition { .. }));

        let stored = store.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_update_rejects_foreign_tenant() {
        let tenant = Uuid::new_v4();
        let (service, store, _) = service_with(vec![product("P1", "Widget", "9.99", 10)], 10);

        let order = service
            .create_order(request(&[("P1", 1)]), Uuid::new_v4(), tenant)
            .await
            .unwrap();

        let err = service
            .update_order_status(order.id, OrderStatus::Confirmed, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::TenantMismatch));

        let stored = store.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_update_payment_status() {
        let tenant = Uuid::new_v4();
        let (service, _, _) = service_with(vec![product("P1", "Widget", "9.99", 10)], 10);

        let order = service
            .create_order(request(&[("P1", 1)]), Uuid::new_v4(), tenant)
            .await
            .unwrap();

        let updated = service
            .update_payment_status(order.id, PaymentStatus::Paid, tenant)
            .await
            .unwrap();
        assert_eq!(updated.payment_status, PaymentStatus::Paid);

        let err = service
            .update_payment_status(order.id, PaymentStatus::Pending, tenant)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidPaymentTransition { .. }));
    }

    #[tokio::test]
    async fn test_get_order_by_number_not_found() {
        let (service, _, _) = service_with(vec![], 10);

        let err = service.get_order_by_number("ORD-MISSING1").await.unwrap_err();
        assert!(matches!(err, OrderError::OrderNotFound(n) if n == "ORD-MISSING1"));
    }
}
