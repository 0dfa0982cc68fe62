use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use super::{GatewayError, Product, ProductGateway};

// ============================================================================
// In-Memory Product Gateway
// ============================================================================
//
// Useful for testing and development. The decrement holds the write lock
// across the check-and-subtract, matching the atomicity the real product
// service guarantees remotely.
//
// ============================================================================

pub struct InMemoryProductGateway {
    products: RwLock<HashMap<String, Product>>,
    fetches: AtomicU64,
}

impl InMemoryProductGateway {
    pub fn new() -> Self {
        Self {
            products: RwLock::new(HashMap::new()),
            fetches: AtomicU64::new(0),
        }
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        let map = products.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            products: RwLock::new(map),
            fetches: AtomicU64::new(0),
        }
    }

    pub fn insert_product(&self, product: Product) {
        self.products
            .write()
            .expect("RwLock poisoned")
            .insert(product.id.clone(), product);
    }

    /// Remaining stock, for assertions.
    pub fn stock_of(&self, product_id: &str) -> Option<i32> {
        self.products
            .read()
            .expect("RwLock poisoned")
            .get(product_id)
            .map(|p| p.stock_quantity)
    }

    /// Number of fetch_product calls served so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryProductGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductGateway for InMemoryProductGateway {
    async fn fetch_product(&self, product_id: &str) -> Result<Product, GatewayError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.products
            .read()
            .expect("RwLock poisoned")
            .get(product_id)
            .cloned()
            .ok_or(GatewayError::NotFound)
    }

    async fn decrement_stock(
        &self,
        product_id: &str,
        _tenant_id: Uuid,
        quantity: i32,
    ) -> Result<(), GatewayError> {
        let mut products = self.products.write().expect("RwLock poisoned");
        let product = products.get_mut(product_id).ok_or(GatewayError::NotFound)?;

        if product.stock_quantity < quantity {
            return Err(GatewayError::InsufficientStock);
        }
        product.stock_quantity -= quantity;
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
