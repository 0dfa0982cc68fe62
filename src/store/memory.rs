use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus, PaymentStatus};

use super::{OrderStore, PageRequest, StoreError};

// ============================================================================
// In-Memory Order Store
// ============================================================================
//
// Useful for testing and development. A single lock guards both maps so
// order-number reservation and the order insert are atomic together, the
// way the LWT gives it to us on ScyllaDB.
//
// ============================================================================

#[derive(Default)]
struct Inner {
    orders: HashMap<Uuid, Order>,
    numbers: HashMap<String, Uuid>,
}

pub struct InMemoryOrderStore {
    inner: RwLock<Inner>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Number of orders held, for assertions.
    pub fn len(&self) -> usize {
        self.inner.read().expect("RwLock poisoned").orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn collect_sorted<F>(&self, predicate: F) -> Vec<Order>
    where
        F: Fn(&Order) -> bool,
    {
        let inner = self.inner.read().expect("RwLock poisoned");
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| predicate(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        orders
    }

    fn page(orders: Vec<Order>, page: PageRequest) -> Vec<Order> {
        orders
            .into_iter()
            .skip(page.offset())
            .take(page.size as usize)
            .collect()
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        if inner.numbers.contains_key(&order.order_number) {
            return Err(StoreError::DuplicateOrderNumber(order.order_number.clone()));
        }
        inner.numbers.insert(order.order_number.clone(), order.id);
        inner.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<(), StoreError> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        match inner.orders.get_mut(&order.id) {
            Some(stored) => {
                *stored = order.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn order_number_in_use(&self, order_number: &str) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .read()
            .expect("RwLock poisoned")
            .numbers
            .contains_key(order_number))
    }

    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self
            .inner
            .read()
            .expect("RwLock poisoned")
            .orders
            .get(&order_id)
            .cloned())
    }

    async fn find_by_order_number(
        &self,
        order_number: &str,
    ) -> Result<Option<Order>, StoreError> {
        let inner = self.inner.read().expect("RwLock poisoned");
        Ok(inner
            .numbers
            .get(order_number)
            .and_then(|id| inner.orders.get(id))
            .cloned())
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Order>, StoreError> {
        Ok(Self::page(
            self.collect_sorted(|o| o.user_id == user_id),
            page,
        ))
    }

    async fn list_by_tenant(
        &self,
        tenant_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Order>, StoreError> {
        Ok(Self::page(
            self.collect_sorted(|o| o.tenant_id == tenant_id),
            page,
        ))
    }

    async fn list_by_user_and_tenant(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Vec<Order>, StoreError> {
        Ok(self.collect_sorted(|o| o.user_id == user_id && o.tenant_id == tenant_id))
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        Ok(self.collect_sorted(|o| o.status == status))
    }

    async fn list_by_tenant_and_status(
        &self,
        tenant_id: Uuid,
        status: OrderStatus,
    ) -> Result<Vec<Order>, StoreError> {
        Ok(self.collect_sorted(|o| o.tenant_id == tenant_id && o.status == status))
    }

    async fn list_by_payment_status(
        &self,
        payment_status: PaymentStatus,
    ) -> Result<Vec<Order>, StoreError> {
        Ok(self.collect_sorted(|o| o.payment_status == payment_status))
    }

    async fn list_by_tenant_and_payment_status(
        &self,
        tenant_id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Vec<Order>, StoreError> {
        Ok(self.collect_sorted(|o| o.tenant_id == tenant_id && o.payment_status == payment_status))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
