use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use super::{GatewayError, Product, ProductGateway};

// ============================================================================
// HTTP Product Gateway
// ============================================================================
//
// Talks to the product service's REST API. Reads go through the public
// product endpoint; stock writes go through the tenant-scoped decrement
// endpoint with the X-Tenant-ID header. Bodies travel in the platform
// envelope {success, message, data}.
//
// Transport and decode failures surface uniformly as Unavailable so the
// workflow treats a flaky product service the same as a down one.
//
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    #[allow(dead_code)]
    message: Option<String>,
    #[serde(default)]
    data: Option<T>,
}

pub struct HttpProductGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProductGateway {
    pub fn new(base_url: &str, timeout_ms: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn product_url(&self, product_id: &str) -> String {
        format!("{}/api/products/public/{}", self.base_url, product_id)
    }

    fn decrement_url(&self, product_id: &str, quantity: i32) -> String {
        format!(
            "{}/api/products/{}/stock/decrement?quantity={}",
            self.base_url, product_id, quantity
        )
    }
}

#[async_trait]
impl ProductGateway for HttpProductGateway {
    async fn fetch_product(&self, product_id: &str) -> Result<Product, GatewayError> {
        let url = self.product_url(product_id);
        tracing::debug!(product_id = %product_id, "Fetching product snapshot");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound);
        }
        if !response.status().is_success() {
            return Err(GatewayError::Unavailable(format!(
                "product fetch returned {}",
                response.status()
            )));
        }

        let envelope: Envelope<Product> = response
            .json()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        match envelope.data {
            Some(product) if envelope.success => Ok(product),
            _ => Err(GatewayError::NotFound),
        }
    }

    async fn decrement_stock(
        &self,
        product_id: &str,
        tenant_id: Uuid,
        quantity: i32,
    ) -> Result<(), GatewayError> {
        let url = self.decrement_url(product_id, quantity);

        let response = self
            .client
            .post(&url)
            .header("X-Tenant-ID", tenant_id.to_string())
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                tracing::debug!(
                    product_id = %product_id,
                    quantity = quantity,
                    "Stock decremented"
                );
                Ok(())
            }
            StatusCode::CONFLICT => Err(GatewayError::InsufficientStock),
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound),
            status => Err(GatewayError::Unavailable(format!(
                "stock decrement returned {}",
                status
            ))),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_normalized() {
        let gateway = HttpProductGateway::new("http://localhost:8083/", 1000).unwrap();

        assert_eq!(
            gateway.product_url("prod-1"),
            "http://localhost:8083/api/products/public/prod-1"
        );
        assert_eq!(
            gateway.decrement_url("prod-1", 3),
            "http://localhost:8083/api/products/prod-1/stock/decrement?quantity=3"
        );
    }

    #[test]
    fn test_envelope_parses_product_payload() {
        let json = r#"{
            "success": true,
            "data": {
                "id": "prod-1",
                "tenantId": "4b4a4a3e-54f6-41f0-9b3e-0f9e4e5a6b7c",
                "name": "Widget",
                "description": "A widget",
                "price": 299.99,
                "stockQuantity": 12
            }
        }"#;

        let envelope: Envelope<Product> = serde_json::from_str(json).unwrap();
        assert!(envelope.success);

        let product = envelope.data.unwrap();
        assert_eq!(product.name, "Widget");
        assert_eq!(product.price, "299.99".parse().unwrap());
        assert_eq!(product.stock_quantity, 12);
        assert_eq!(product.sku, None);
        assert_eq!(product.is_active, None);
    }

    #[test]
    fn test_envelope_without_data() {
        let json = r#"{"success": false, "message": "Product not found"}"#;
        let envelope: Envelope<Product> = serde_json::from_str(json).unwrap();

        assert!(!envelope.success);
        assert!(envelope.data.is_none());
    }

    // Note: fetch_product and decrement_stock against a live product service
    // are covered by integration tests; everything above exercises the
    // request construction and response decoding that do not need a socket.
}
