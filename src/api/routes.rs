use axum::{
    http::StatusCode,
    middleware::map_response,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

use crate::api::error::ApiError;
use crate::api::handlers;
use crate::config::ServerConfig;
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>() -> Router<Arc<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Customers
        .route("/customers", get(handlers::list_customers::<S>))
        .route("/customer-by-id", get(handlers::get_customer_by_id::<S>))
        .route("/search-customer", get(handlers::search_customers::<S>))
        // Employees
        .route("/employees", get(handlers::list_employees::<S>))
        .route(
            "/employee-with-recipient",
            get(handlers::get_employee_with_recipient::<S>),
        )
        // Suppliers
        .route("/suppliers", get(handlers::list_suppliers::<S>))
        .route("/supplier-by-id", get(handlers::get_supplier_by_id::<S>))
        // Products
        .route("/products", get(handlers::list_products::<S>))
        .route(
            "/product-with-supplier",
            get(handlers::get_product_with_supplier::<S>),
        )
        .route("/search-product", get(handlers::search_products::<S>))
        // Orders
        .route(
            "/orders-with-details",
            get(handlers::list_orders_with_details::<S>),
        )
        .route(
            "/order-with-details",
            get(handlers::get_order_with_details::<S>),
        )
        .route(
            "/order-with-details-and-products",
            get(handlers::get_order_with_details_and_products::<S>),
        )
        .fallback(handlers::not_found)
}

/// Router with shared state and the request timeout applied.
pub fn create_app<S: Store + 'static>(store: Arc<S>, server: &ServerConfig) -> Router {
    create_router::<S>()
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_secs,
        )))
        .layer(map_response(timeout_as_json))
        .with_state(store)
}

// TimeoutLayer answers with a bare 408; no handler produces that status itself.
async fn timeout_as_json(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return ApiError::Timeout.into_response();
    }
    response
}
