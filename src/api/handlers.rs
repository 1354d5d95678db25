use axum::{extract::State, http::Uri, response::Json};
use serde::Serialize;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::params::QueryParams;
use crate::model::{Customer, Employee, Order, OrderSummary, Product, Supplier};
use crate::store::traits::Store;

pub type AppState<S> = Arc<S>;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

// Customers

pub async fn list_customers<S: Store>(
    State(store): State<AppState<S>>,
    params: QueryParams,
) -> ApiResult<Vec<Customer>> {
    Ok(Json(store.list_customers(params.page()).await?))
}

pub async fn get_customer_by_id<S: Store>(
    State(store): State<AppState<S>>,
    params: QueryParams,
) -> ApiResult<Option<Customer>> {
    Ok(Json(store.get_customer(params.id()).await?))
}

pub async fn search_customers<S: Store>(
    State(store): State<AppState<S>>,
    params: QueryParams,
) -> ApiResult<Vec<Customer>> {
    Ok(Json(store.search_customers(&params.term()).await?))
}

// Employees

pub async fn list_employees<S: Store>(
    State(store): State<AppState<S>>,
    params: QueryParams,
) -> ApiResult<Vec<Employee>> {
    Ok(Json(store.list_employees(params.page()).await?))
}

pub async fn get_employee_with_recipient<S: Store>(
    State(store): State<AppState<S>>,
    params: QueryParams,
) -> ApiResult<Vec<Employee>> {
    Ok(Json(store.employee_with_recipient(params.id()).await?))
}

// Suppliers

pub async fn list_suppliers<S: Store>(
    State(store): State<AppState<S>>,
    params: QueryParams,
) -> ApiResult<Vec<Supplier>> {
    Ok(Json(store.list_suppliers(params.page()).await?))
}

pub async fn get_supplier_by_id<S: Store>(
    State(store): State<AppState<S>>,
    params: QueryParams,
) -> ApiResult<Option<Supplier>> {
    Ok(Json(store.get_supplier(params.id()).await?))
}

// Products

pub async fn list_products<S: Store>(
    State(store): State<AppState<S>>,
    params: QueryParams,
) -> ApiResult<Vec<Product>> {
    Ok(Json(store.list_products(params.page()).await?))
}

pub async fn get_product_with_supplier<S: Store>(
    State(store): State<AppState<S>>,
    params: QueryParams,
) -> ApiResult<Vec<Product>> {
    Ok(Json(store.product_with_supplier(params.id()).await?))
}

pub async fn search_products<S: Store>(
    State(store): State<AppState<S>>,
    params: QueryParams,
) -> ApiResult<Vec<Product>> {
    Ok(Json(store.search_products(&params.term()).await?))
}

// Orders

pub async fn list_orders_with_details<S: Store>(
    State(store): State<AppState<S>>,
    params: QueryParams,
) -> ApiResult<Vec<OrderSummary>> {
    Ok(Json(store.list_order_summaries(params.page()).await?))
}

pub async fn get_order_with_details<S: Store>(
    State(store): State<AppState<S>>,
    params: QueryParams,
) -> ApiResult<Vec<OrderSummary>> {
    Ok(Json(store.order_summary(params.id()).await?))
}

pub async fn get_order_with_details_and_products<S: Store>(
    State(store): State<AppState<S>>,
    params: QueryParams,
) -> ApiResult<Vec<Order>> {
    Ok(Json(
        store.order_with_details_and_products(params.id()).await?,
    ))
}
