use chrono::{DateTime, Utc};
use scylla::client::session::Session;
use std::sync::Arc;
use uuid::Uuid;

use async_trait::async_trait;

use crate::domain::order::{Order, OrderItem, OrderStatus, PaymentStatus};

use super::{OrderStore, PageRequest, StoreError};

// ============================================================================
// ScyllaDB Order Store
// ============================================================================
//
// Two tables:
// - orders:           the aggregate, keyed by id. Items are stored as a
//                     JSON text column; money as exact decimal text.
// - orders_by_number: unique-number reservation and number -> id lookup.
//
// Number uniqueness rides on a lightweight transaction: INSERT ... IF NOT
// EXISTS into orders_by_number, then a read-back of the owning order id.
// Racing writers see DuplicateOrderNumber and retry with a fresh number.
// A won claim whose aggregate write then fails is released (guarded by the
// owning id) so the number is not burned.
//
// Secondary list queries go through ALLOW FILTERING with client-side
// paging; per-user and per-tenant volumes on this platform are modest.
//
// ============================================================================

const CREATE_ORDERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS orders (
    id uuid PRIMARY KEY,
    order_number text,
    user_id uuid,
    tenant_id uuid,
    status text,
    payment_status text,
    total_amount text,
    shipping_address text,
    billing_address text,
    payment_method text,
    notes text,
    order_items text,
    created_at timestamp,
    updated_at timestamp
)";

const CREATE_ORDERS_BY_NUMBER_TABLE: &str = "CREATE TABLE IF NOT EXISTS orders_by_number (
    order_number text PRIMARY KEY,
    order_id uuid
)";

const ORDER_COLUMNS: &str = "id, order_number, user_id, tenant_id, status, payment_status, \
     total_amount, shipping_address, billing_address, payment_method, notes, order_items, \
     created_at, updated_at";

const RELEASE_NUMBER: &str =
    "DELETE FROM orders_by_number WHERE order_number = ? IF order_id = ?";

type OrderRow = (
    Uuid,
    String,
    Uuid,
    Uuid,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn backend<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn order_items_json(items: &[OrderItem]) -> Result<String, StoreError> {
    serde_json::to_string(items).map_err(backend)
}

fn row_to_order(row: OrderRow) -> Result<Order, StoreError> {
    let (
        id,
        order_number,
        user_id,
        tenant_id,
        status,
        payment_status,
        total_amount,
        shipping_address,
        billing_address,
        payment_method,
        notes,
        items_json,
        created_at,
        updated_at,
    ) = row;

    Ok(Order {
        id,
        order_number,
        user_id,
        tenant_id,
        status: status.parse::<OrderStatus>().map_err(StoreError::Backend)?,
        payment_status: payment_status
            .parse::<PaymentStatus>()
            .map_err(StoreError::Backend)?,
        total_amount: total_amount.parse().map_err(backend)?,
        shipping_address,
        billing_address,
        payment_method,
        notes,
        order_items: serde_json::from_str(&items_json).map_err(backend)?,
        created_at,
        updated_at,
    })
}

pub struct ScyllaOrderStore {
    session: Arc<Session>,
}

impl ScyllaOrderStore {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Create the order tables in the current keyspace.
    pub async fn init_schema(session: &Session) -> Result<(), StoreError> {
        for ddl in [CREATE_ORDERS_TABLE, CREATE_ORDERS_BY_NUMBER_TABLE] {
            session.query_unpaged(ddl, &[]).await.map_err(backend)?;
        }
        tracing::info!("Order tables ready");
        Ok(())
    }

    async fn select_orders<V>(&self, cql: &str, values: V) -> Result<Vec<Order>, StoreError>
    where
        V: scylla::serialize::row::SerializeRow,
    {
        let result = self
            .session
            .query_unpaged(cql, values)
            .await
            .map_err(backend)?;

        let rows_result = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(Vec::new()), // No rows
        };

        let mut orders = Vec::new();
        for row in rows_result.rows::<OrderRow>().map_err(backend)? {
            orders.push(row_to_order(row.map_err(backend)?)?);
        }

        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(orders)
    }

    /// Best-effort removal of a number claim that never got its order row.
    /// Conditional on the owning id so a racing writer's claim stays intact.
    async fn release_number(&self, order_number: &str, order_id: Uuid) {
        if let Err(e) = self
            .session
            .query_unpaged(RELEASE_NUMBER, (order_number, order_id))
            .await
        {
            tracing::warn!(
                order_number = %order_number,
                error = %e,
                "Failed to release order number after failed insert"
            );
        }
    }

    async fn number_owner(&self, order_number: &str) -> Result<Option<Uuid>, StoreError> {
        let result = self
            .session
            .query_unpaged(
                "SELECT order_id FROM orders_by_number WHERE order_number = ?",
                (order_number,),
            )
            .await
            .map_err(backend)?;

        let rows_result = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(None),
        };

        match rows_result.maybe_first_row::<(Uuid,)>() {
            Ok(Some((order_id,))) => Ok(Some(order_id)),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl OrderStore for ScyllaOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        // Serialize before claiming the number; a failure here must not
        // leave a claim behind.
        let items_json = order_items_json(&order.order_items)?;

        // Reserve the number first. IF NOT EXISTS makes this a linearizable
        // claim; the read-back tells us whether we won it.
        self.session
            .query_unpaged(
                "INSERT INTO orders_by_number (order_number, order_id) VALUES (?, ?) IF NOT EXISTS",
                (&order.order_number, order.id),
            )
            .await
            .map_err(backend)?;

        match self.number_owner(&order.order_number).await? {
            Some(owner) if owner == order.id => {}
            _ => return Err(StoreError::DuplicateOrderNumber(order.order_number.clone())),
        }

        let inserted = self
            .session
            .query_unpaged(
                "INSERT INTO orders (
                    id, order_number, user_id, tenant_id, status, payment_status,
                    total_amount, shipping_address, billing_address, payment_method,
                    notes, order_items, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    order.id,
                    &order.order_number,
                    order.user_id,
                    order.tenant_id,
                    order.status.as_str(),
                    order.payment_status.as_str(),
                    order.total_amount.to_string(),
                    &order.shipping_address,
                    &order.billing_address,
                    &order.payment_method,
                    &order.notes,
                    items_json,
                    order.created_at,
                    order.updated_at,
                ),
            )
            .await;

        if let Err(e) = inserted {
            // The claim is ours and no order row exists; give the number back.
            self.release_number(&order.order_number, order.id).await;
            return Err(backend(e));
        }

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            "Order persisted"
        );
        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<(), StoreError> {
        // CQL UPDATE is an upsert; check existence first so a vanished row
        // surfaces as NotFound instead of a ghost order.
        if self.find_by_id(order.id).await?.is_none() {
            return Err(StoreError::NotFound);
        }

        self.session
            .query_unpaged(
                "UPDATE orders SET status = ?, payment_status = ?, updated_at = ? WHERE id = ?",
                (
                    order.status.as_str(),
                    order.payment_status.as_str(),
                    order.updated_at,
                    order.id,
                ),
            )
            .await
            .map_err(backend)?;

        Ok(())
    }

    async fn order_number_in_use(&self, order_number: &str) -> Result<bool, StoreError> {
        Ok(self.number_owner(order_number).await?.is_some())
    }

    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        let orders = self
            .select_orders(
                &format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS),
                (order_id,),
            )
            .await?;
        Ok(orders.into_iter().next())
    }

    async fn find_by_order_number(
        &self,
        order_number: &str,
    ) -> Result<Option<Order>, StoreError> {
        match self.number_owner(order_number).await? {
            Some(order_id) => self.find_by_id(order_id).await,
            None => Ok(None),
        }
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Order>, StoreError> {
        let orders = self
            .select_orders(
                &format!(
                    "SELECT {} FROM orders WHERE user_id = ? ALLOW FILTERING",
                    ORDER_COLUMNS
                ),
                (user_id,),
            )
            .await?;
        Ok(orders
            .into_iter()
            .skip(page.offset())
            .take(page.size as usize)
            .collect())
    }

    async fn list_by_tenant(
        &self,
        tenant_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Order>, StoreError> {
        let orders = self
            .select_orders(
                &format!(
                    "SELECT {} FROM orders WHERE tenant_id = ? ALLOW FILTERING",
                    ORDER_COLUMNS
                ),
                (tenant_id,),
            )
            .await?;
        Ok(orders
            .into_iter()
            .skip(page.offset())
            .take(page.size as usize)
            .collect())
    }

    async fn list_by_user_and_tenant(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Vec<Order>, StoreError> {
        self.select_orders(
            &format!(
                "SELECT {} FROM orders WHERE user_id = ? AND tenant_id = ? ALLOW FILTERING",
                ORDER_COLUMNS
            ),
            (user_id, tenant_id),
        )
        .await
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        self.select_orders(
            &format!(
                "SELECT {} FROM orders WHERE status = ? ALLOW FILTERING",
                ORDER_COLUMNS
            ),
            (status.as_str(),),
        )
        .await
    }

    async fn list_by_tenant_and_status(
        &self,
        tenant_id: Uuid,
        status: OrderStatus,
    ) -> Result<Vec<Order>, StoreError> {
        self.select_orders(
            &format!(
                "SELECT {} FROM orders WHERE tenant_id = ? AND status = ? ALLOW FILTERING",
                ORDER_COLUMNS
            ),
            (tenant_id, status.as_str()),
        )
        .await
    }

    async fn list_by_payment_status(
        &self,
        payment_status: PaymentStatus,
    ) -> Result<Vec<Order>, StoreError> {
        self.select_orders(
            &format!(
                "SELECT {} FROM orders WHERE payment_status = ? ALLOW FILTERING",
                ORDER_COLUMNS
            ),
            (payment_status.as_str(),),
        )
        .await
    }

    async fn list_by_tenant_and_payment_status(
        &self,
        tenant_id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Vec<Order>, StoreError> {
        self.select_orders(
            &format!(
                "SELECT {} FROM orders WHERE tenant_id = ? AND payment_status = ? ALLOW FILTERING",
                ORDER_COLUMNS
            ),
            (tenant_id, payment_status.as_str()),
        )
        .await
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(status: &str, payment_status: &str, items_json: &str) -> OrderRow {
        let now = Utc::now();
        (
            Uuid::new_v4(),
            "ORD-AAAA0001".to_string(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            status.to_string(),
            payment_status.to_string(),
            "19.98".to_string(),
            "1 Test Way".to_string(),
            "1 Test Way".to_string(),
            Some("card".to_string()),
            None,
            items_json.to_string(),
            now,
            now,
        )
    }

    #[test]
    fn test_row_to_order_maps_columns() {
        let items = r#"[{"productId":"prod-1","productName":"Widget","quantity":2,"unitPrice":"9.99","totalPrice":"19.98"}]"#;
        let order = row_to_order(sample_row("PENDING", "PENDING", items)).unwrap();

        assert_eq!(order.order_number, "ORD-AAAA0001");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.total_amount, "19.98".parse().unwrap());
        assert_eq!(order.order_items.len(), 1);
        assert_eq!(order.order_items[0].product_name, "Widget");
        assert_eq!(order.items_total(), order.total_amount);
    }

    #[test]
    fn test_row_to_order_rejects_unknown_status() {
        let err = row_to_order(sample_row("SOMETHING_ELSE", "PENDING", "[]")).unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn test_row_to_order_rejects_bad_items_json() {
        let err = row_to_order(sample_row("PENDING", "PENDING", "{not json")).unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn test_number_release_only_drops_own_claim() {
        // An unconditional DELETE could drop a claim a racing writer just won.
        assert!(RELEASE_NUMBER.starts_with("DELETE FROM orders_by_number"));
        assert!(RELEASE_NUMBER.ends_with("IF order_id = ?"));
    }

    #[test]
    fn test_order_items_json_round_trips() {
        let items = vec![OrderItem {
            product_id: "prod-1".to_string(),
            product_name: "Widget".to_string(),
            quantity: 2,
            unit_price: "9.99".parse().unwrap(),
            total_price: "19.98".parse().unwrap(),
        }];

        let json = order_items_json(&items).unwrap();
        let parsed: Vec<OrderItem> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, items);
    }

    // Note: the following require integration testing with a real ScyllaDB:
    // - insert claiming the number through the LWT, and the read-back path
    //   when a racing writer owns it
    // - release of a won claim when the aggregate insert fails, and that the
    //   released number can be claimed again
    // - update on a present/absent row
    // - list queries with ALLOW FILTERING and client-side paging
    //
    // Run them with a local Scylla and STORE_BACKEND=scylla.
}
