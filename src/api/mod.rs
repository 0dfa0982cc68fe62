use std::sync::Arc;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::{
    CreateOrderRequest, Order, OrderError, OrderService, OrderStatus, PaymentStatus,
};
use crate::store::PageRequest;

// ============================================================================
// HTTP API - order endpoints behind the platform gateway
// ============================================================================
//
// Identity arrives pre-verified in the X-User-ID / X-Tenant-ID headers; the
// platform gateway owns authentication. Every response body is the platform
// envelope {success, message, data}. Mutations attach a confirmation message,
// reads return the data alone. Failures are 400 with success=false and the
// error message, matching the rest of the platform's services.
//
// ============================================================================

const USER_HEADER: &str = "X-User-ID";
const TENANT_HEADER: &str = "X-Tenant-ID";

#[derive(Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: Deserialize<'de>"
))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn ok_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Start the order API server. Blocks until shutdown.
pub async fn start_http_server(service: Arc<OrderService>, port: u16) -> std::io::Result<()> {
    tracing::info!("Starting order API on http://0.0.0.0:{}", port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(service.clone()))
            .configure(routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

/// Route table. Literal segments are registered before `{id}` so
/// /api/orders/user resolves to the list handler, not the id lookup.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/orders")
            .route("", web::post().to(create_order))
            .route("/user", web::get().to(list_user_orders))
            .route("/tenant", web::get().to(list_tenant_orders))
            .route("/user-tenant", web::get().to(list_user_tenant_orders))
            .route("/number/{order_number}", web::get().to(get_order_by_number))
            .route("/status/{status}", web::get().to(list_orders_by_status))
            .route(
                "/tenant/status/{status}",
                web::get().to(list_tenant_orders_by_status),
            )
            .route(
                "/payment/{payment_status}",
                web::get().to(list_orders_by_payment),
            )
            .route(
                "/tenant/payment/{payment_status}",
                web::get().to(list_tenant_orders_by_payment),
            )
            .route("/{id}/status", web::put().to(update_order_status))
            .route("/{id}/payment", web::put().to(update_payment_status))
            .route("/{id}", web::get().to(get_order)),
    );
}

// ============================================================================
// Extraction helpers
// ============================================================================

fn header_uuid(req: &HttpRequest, name: &str) -> Result<Uuid, OrderError> {
    let raw = req
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| OrderError::InvalidRequest(format!("Missing header: {}", name)))?;

    Uuid::parse_str(raw)
        .map_err(|_| OrderError::InvalidRequest(format!("Invalid header: {}", name)))
}

fn identity(req: &HttpRequest) -> Result<(Uuid, Uuid), OrderError> {
    Ok((
        header_uuid(req, USER_HEADER)?,
        header_uuid(req, TENANT_HEADER)?,
    ))
}

fn failure(e: &OrderError) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::<()>::error(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    size: Option<u32>,
}

impl PageQuery {
    fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(PageRequest::DEFAULT_SIZE),
        )
    }
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    status: String,
}

#[derive(Debug, Deserialize)]
struct PaymentQuery {
    #[serde(rename = "paymentStatus")]
    payment_status: String,
}

// ============================================================================
// Handlers
// ============================================================================

async fn create_order(
    req: HttpRequest,
    service: web::Data<Arc<OrderService>>,
    body: web::Json<CreateOrderRequest>,
) -> HttpResponse {
    let (user_id, tenant_id) = match identity(&req) {
        Ok(ids) => ids,
        Err(e) => return failure(&e),
    };

    match service.create_order(body.into_inner(), user_id, tenant_id).await {
        Ok(order) => HttpResponse::Ok()
            .json(ApiResponse::ok_with_message("Order created successfully", order)),
        Err(e) => failure(&e),
    }
}

async fn update_order_status(
    req: HttpRequest,
    service: web::Data<Arc<OrderService>>,
    path: web::Path<Uuid>,
    query: web::Query<StatusQuery>,
) -> HttpResponse {
    let tenant_id = match header_uuid(&req, TENANT_HEADER) {
        Ok(id) => id,
        Err(e) => return failure(&e),
    };
    let status: OrderStatus = match query.status.parse().map_err(OrderError::InvalidRequest) {
        Ok(status) => status,
        Err(e) => return failure(&e),
    };

    match service
        .update_order_status(path.into_inner(), status, tenant_id)
        .await
    {
        Ok(order) => HttpResponse::Ok().json(ApiResponse::ok_with_message(
            "Order status updated successfully",
            order,
        )),
        Err(e) => failure(&e),
    }
}

async fn update_payment_status(
    req: HttpRequest,
    service: web::Data<Arc<OrderService>>,
    path: web::Path<Uuid>,
    query: web::Query<PaymentQuery>,
) -> HttpResponse {
    let tenant_id = match header_uuid(&req, TENANT_HEADER) {
        Ok(id) => id,
        Err(e) => return failure(&e),
    };
    let payment_status: PaymentStatus = match query
        .payment_status
        .parse()
        .map_err(OrderError::InvalidRequest)
    {
        Ok(status) => status,
        Err(e) => return failure(&e),
    };

    match service
        .update_payment_status(path.into_inner(), payment_status, tenant_id)
        .await
    {
        Ok(order) => HttpResponse::Ok().json(ApiResponse::ok_with_message(
            "Payment status updated successfully",
            order,
        )),
        Err(e) => failure(&e),
    }
}

async fn get_order(
    req: HttpRequest,
    service: web::Data<Arc<OrderService>>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    let tenant_id = match header_uuid(&req, TENANT_HEADER) {
        Ok(id) => id,
        Err(e) => return failure(&e),
    };

    match service.get_order(path.into_inner(), tenant_id).await {
        Ok(order) => HttpResponse::Ok().json(ApiResponse::ok(order)),
        Err(e) => failure(&e),
    }
}

async fn get_order_by_number(
    service: web::Data<Arc<OrderService>>,
    path: web::Path<String>,
) -> HttpResponse {
    match service.get_order_by_number(&path.into_inner()).await {
        Ok(order) => HttpResponse::Ok().json(ApiResponse::ok(order)),
        Err(e) => failure(&e),
    }
}

async fn list_user_orders(
    req: HttpRequest,
    service: web::Data<Arc<OrderService>>,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    let user_id = match header_uuid(&req, USER_HEADER) {
        Ok(id) => id,
        Err(e) => return failure(&e),
    };

    list_response(service.list_orders_by_user(user_id, query.page_request()).await)
}

async fn list_tenant_orders(
    req: HttpRequest,
    service: web::Data<Arc<OrderService>>,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    let tenant_id = match header_uuid(&req, TENANT_HEADER) {
        Ok(id) => id,
        Err(e) => return failure(&e),
    };

    list_response(
        service
            .list_orders_by_tenant(tenant_id, query.page_request())
            .await,
    )
}

async fn list_user_tenant_orders(
    req: HttpRequest,
    service: web::Data<Arc<OrderService>>,
) -> HttpResponse {
    let (user_id, tenant_id) = match identity(&req) {
        Ok(ids) => ids,
        Err(e) => return failure(&e),
    };

    list_response(
        service
            .list_orders_by_user_and_tenant(user_id, tenant_id)
            .await,
    )
}

async fn list_orders_by_status(
    service: web::Data<Arc<OrderService>>,
    path: web::Path<String>,
) -> HttpResponse {
    let status: OrderStatus = match path.parse().map_err(OrderError::InvalidRequest) {
        Ok(status) => status,
        Err(e) => return failure(&e),
    };

    list_response(service.list_orders_by_status(status).await)
}

async fn list_tenant_orders_by_status(
    req: HttpRequest,
    service: web::Data<Arc<OrderService>>,
    path: web::Path<String>,
) -> HttpResponse {
    let tenant_id = match header_uuid(&req, TENANT_HEADER) {
        Ok(id) => id,
        Err(e) => return failure(&e),
    };
    let status: OrderStatus = match path.parse().map_err(OrderError::InvalidRequest) {
        Ok(status) => status,
        Err(e) => return failure(&e),
    };

    list_response(
        service
            .list_orders_by_tenant_and_status(tenant_id, status)
            .await,
    )
}

async fn list_orders_by_payment(
    service: web::Data<Arc<OrderService>>,
    path: web::Path<String>,
) -> HttpResponse {
    let payment_status: PaymentStatus = match path.parse().map_err(OrderError::InvalidRequest) {
        Ok(status) => status,
        Err(e) => return failure(&e),
    };

    list_response(service.list_orders_by_payment_status(payment_status).await)
}

async fn list_tenant_orders_by_payment(
    req: HttpRequest,
    service: web::Data<Arc<OrderService>>,
    path: web::Path<String>,
) -> HttpResponse {
    let tenant_id = match header_uuid(&req, TENANT_HEADER) {
        Ok(id) => id,
        Err(e) => return failure(&e),
    };
    let payment_status: PaymentStatus = match path.parse().map_err(OrderError::InvalidRequest) {
        Ok(status) => status,
        Err(e) => return failure(&e),
    };

    list_response(
        service
            .list_orders_by_tenant_and_payment_status(tenant_id, payment_status)
            .await,
    )
}

fn list_response(result: Result<Vec<Order>, OrderError>) -> HttpResponse {
    match result {
        Ok(orders) => HttpResponse::Ok().json(ApiResponse::ok(orders)),
        Err(e) => failure(&e),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};

    use crate::inventory::{InMemoryProductGateway, Product};
    use crate::messaging::InMemoryEventPublisher;
    use crate::metrics::Metrics;
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

    fn wired_service(products: Vec<Product>) -> Arc<OrderService> {
        Arc::new(OrderService::new(
            Arc::new(InMemoryOrderStore::new()),
            Arc::new(InMemoryProductGateway::with_products(products)),
            Arc::new(InMemoryEventPublisher::new()),
            Arc::new(Metrics::new().unwrap()),
            "order-events",
            10,
        ))
    }

    fn order_body() -> serde_json::Value {
        serde_json::json!({
            "items": [{"productId": "P1", "quantity": 2}],
            "shippingAddress": "1 Ship St",
            "billingAddress": "2 Bill Rd",
            "paymentMethod": "card"
        })
    }

    #[actix_web::test]
    async fn test_create_order_returns_envelope() {
        let service = wired_service(vec![product("P1", "Widget", "9.99", 10)]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service))
                .configure(routes),
        )
        .await;

        let user = Uuid::new_v4();
        let tenant = Uuid::new_v4();
        let req = test::TestRequest::post()
            .uri("/api/orders")
            .insert_header((USER_HEADER, user.to_string()))
            .insert_header((TENANT_HEADER, tenant.to_string()))
            .set_json(order_body())
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: ApiResponse<Order> = test::read_body_json(resp).await;
        assert!(body.success);
        assert_eq!(body.message.as_deref(), Some("Order created successfully"));

        let order = body.data.unwrap();
        assert_eq!(order.user_id, user);
        assert_eq!(order.tenant_id, tenant);
        assert_eq!(order.total_amount, "19.98".parse().unwrap());
    }

    #[actix_web::test]
    async fn test_missing_identity_header() {
        let service = wired_service(vec![product("P1", "Widget", "9.99", 10)]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .insert_header((TENANT_HEADER, Uuid::new_v4().to_string()))
            .set_json(order_body())
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ApiResponse<Order> = test::read_body_json(resp).await;
        assert!(!body.success);
        assert_eq!(body.message.as_deref(), Some("Missing header: X-User-ID"));
    }

    #[actix_web::test]
    async fn test_insufficient_stock_maps_to_bad_request() {
        let service = wired_service(vec![product("P1", "Widget", "9.99", 1)]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .insert_header((USER_HEADER, Uuid::new_v4().to_string()))
            .insert_header((TENANT_HEADER, Uuid::new_v4().to_string()))
            .set_json(order_body())
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ApiResponse<Order> = test::read_body_json(resp).await;
        assert_eq!(
            body.message.as_deref(),
            Some("Insufficient stock for product: Widget")
        );
    }

    #[actix_web::test]
    async fn test_status_update_round_trip() {
        let service = wired_service(vec![product("P1", "Widget", "9.99", 10)]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service.clone()))
                .configure(routes),
        )
        .await;

        let user = Uuid::new_v4();
        let tenant = Uuid::new_v4();
        let order = service
            .create_order(
                serde_json::from_value(order_body()).unwrap(),
                user,
                tenant,
            )
            .await
            .unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/api/orders/{}/status?status=confirmed", order.id))
            .insert_header((TENANT_HEADER, tenant.to_string()))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: ApiResponse<Order> = test::read_body_json(resp).await;
        assert_eq!(
            body.message.as_deref(),
            Some("Order status updated successfully")
        );
        assert_eq!(body.data.unwrap().status, OrderStatus::Confirmed);
    }

    #[actix_web::test]
    async fn test_read_responses_omit_message() {
        let service = wired_service(vec![product("P1", "Widget", "9.99", 10)]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service.clone()))
                .configure(routes),
        )
        .await;

        let user = Uuid::new_v4();
        let tenant = Uuid::new_v4();
        let order = service
            .create_order(serde_json::from_value(order_body()).unwrap(), user, tenant)
            .await
            .unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/api/orders/{}", order.id))
            .insert_header((TENANT_HEADER, tenant.to_string()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        // The message key is absent from the wire, not serialized as null.
        let raw = test::read_body(resp).await;
        assert!(!String::from_utf8_lossy(&raw).contains("\"message\""));
        let body: ApiResponse<Order> = serde_json::from_slice(&raw).unwrap();
        assert!(body.success);
        assert_eq!(body.data.unwrap().id, order.id);

        let req = test::TestRequest::get()
            .uri(&format!("/api/orders/number/{}", order.order_number))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body: ApiResponse<Order> = test::read_body_json(resp).await;
        assert!(body.message.is_none());

        let req = test::TestRequest::get()
            .uri("/api/orders/user")
            .insert_header((USER_HEADER, user.to_string()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body: ApiResponse<Vec<Order>> = test::read_body_json(resp).await;
        assert!(body.message.is_none());
        assert_eq!(body.data.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_invalid_status_parameter() {
        let service = wired_service(vec![]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::put()
            .uri(&format!(
                "/api/orders/{}/status?status=TELEPORTED",
                Uuid::new_v4()
            ))
            .insert_header((TENANT_HEADER, Uuid::new_v4().to_string()))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ApiResponse<Order> = test::read_body_json(resp).await;
        assert_eq!(
            body.message.as_deref(),
            Some("Invalid order status: TELEPORTED")
        );
    }

    #[actix_web::test]
    async fn test_foreign_tenant_get_is_rejected() {
        let service = wired_service(vec![product("P1", "Widget", "9.99", 10)]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service.clone()))
                .configure(routes),
        )
        .await;

        let order = service
            .create_order(
                serde_json::from_value(order_body()).unwrap(),
                Uuid::new_v4(),
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/api/orders/{}", order.id))
            .insert_header((TENANT_HEADER, Uuid::new_v4().to_string()))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ApiResponse<Order> = test::read_body_json(resp).await;
        assert_eq!(
            body.message.as_deref(),
            Some("Order does not belong to this tenant")
        );
    }

    #[actix_web::test]
    async fn test_user_list_respects_page_params() {
        let service = wired_service(vec![product("P1", "Widget", "9.99", 100)]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service.clone()))
                .configure(routes),
        )
        .await;

        let user = Uuid::new_v4();
        let tenant = Uuid::new_v4();
        for _ in 0..3 {
            service
                .create_order(serde_json::from_value(order_body()).unwrap(), user, tenant)
                .await
                .unwrap();
        }

        let req = test::TestRequest::get()
            .uri("/api/orders/user?page=0&size=2")
            .insert_header((USER_HEADER, user.to_string()))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: ApiResponse<Vec<Order>> = test::read_body_json(resp).await;
        assert_eq!(body.data.unwrap().len(), 2);
    }
}
