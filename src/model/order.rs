use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Id, Product};

/// One order with aggregates rolled up over its line items.
///
/// An order without line items still produces a summary: `products_count` is 0
/// and both sums are `None`. Callers distinguish that from a missing order,
/// which produces no summary at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: Id,
    pub shipped_date: Option<NaiveDate>,
    pub ship_name: String,
    pub ship_city: String,
    pub ship_country: String,
    pub products_count: i32,
    pub quantity_sum: Option<i32>,
    /// Sum of quantity * unit price per line, discount not applied
    pub total_price: Option<f64>,
}

/// A line item. Identified by (order_id, product_id); `unit_price` is the price
/// at order time and may differ from the product's current price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub unit_price: f64,
    pub quantity: i32,
    pub discount: f64,
    pub order_id: Id,
    pub product_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Id,
    pub order_date: NaiveDate,
    pub required_date: NaiveDate,
    pub shipped_date: Option<NaiveDate>,
    pub ship_via: i32,
    pub freight: f64,
    pub ship_name: String,
    pub ship_city: String,
    pub ship_region: Option<String>,
    pub ship_postal_code: Option<String>,
    pub ship_country: String,
    pub customer_id: Id,
    pub employee_id: Id,
    #[sqlx(skip)]
    #[serde(default)]
    pub details: Vec<OrderDetail>,
}
