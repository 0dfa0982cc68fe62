use serde::{Deserialize, Serialize};

use super::errors::OrderError;

// ============================================================================
// Order Commands - incoming request payloads
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: String,
    pub billing_address: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: i32,
}

impl CreateOrderRequest {
    /// Shape validation. Runs before any remote call is made.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::InvalidRequest(
                "Order items are required".to_string(),
            ));
        }
        if self.shipping_address.trim().is_empty() {
            return Err(OrderError::InvalidRequest(
                "Shipping address is required".to_string(),
            ));
        }
        if self.billing_address.trim().is_empty() {
            return Err(OrderError::InvalidRequest(
                "Billing address is required".to_string(),
            ));
        }
        for item in &self.items {
            if item.product_id.trim().is_empty() {
                return Err(OrderError::InvalidRequest(
                    "Product ID is required".to_string(),
                ));
            }
            if item.quantity <= 0 {
                return Err(OrderError::InvalidRequest(format!(
                    "Quantity must be positive for product: {}",
                    item.product_id
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateOrderRequest {
        CreateOrderRequest {
            items: vec![OrderItemRequest {
                product_id: "prod-1".to_string(),
                quantity: 2,
            }],
            shipping_address: "1 Test Way".to_string(),
            billing_address: "1 Test Way".to_string(),
            payment_method: Some("card".to_string()),
            notes: None,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn test_empty_items_rejected() {
        let mut request = valid_request();
        request.items.clear();

        let err = request.validate().unwrap_err();
        assert_eq!(err.to_string(), "Order items are required");
    }

    #[test]
    fn test_blank_addresses_rejected() {
        let mut request = valid_request();
        request.shipping_address = "   ".to_string();
        assert_eq!(
            request.validate().unwrap_err().to_string(),
            "Shipping address is required"
        );

        let mut request = valid_request();
        request.billing_address = String::new();
        assert_eq!(
            request.validate().unwrap_err().to_string(),
            "Billing address is required"
        );
    }

    #[test]
    fn test_blank_product_id_rejected() {
        let mut request = valid_request();
        request.items[0].product_id = " ".to_string();
        assert_eq!(
            request.validate().unwrap_err().to_string(),
            "Product ID is required"
        );
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        for quantity in [0, -1] {
            let mut request = valid_request();
            request.items[0].quantity = quantity;
            assert!(matches!(
                request.validate().unwrap_err(),
                OrderError::InvalidRequest(_)
            ));
        }
    }

    #[test]
    fn test_deserializes_camel_case_payload() {
        let json = r#"{
            "items": [{"productId": "prod-9", "quantity": 1}],
            "shippingAddress": "2 Ship St",
            "billingAddress": "3 Bill Rd",
            "paymentMethod": "card"
        }"#;

        let request: CreateOrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.items[0].product_id, "prod-9");
        assert_eq!(request.payment_method.as_deref(), Some("card"));
        assert_eq!(request.notes, None);
    }
}
