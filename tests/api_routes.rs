use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use northwind_api::api::routes::create_app;
use northwind_api::config::ServerConfig;
use northwind_api::model::{Customer, Employee, Id, Order, OrderSummary, Product, Supplier};
use northwind_api::seed;
use northwind_api::store::traits::{
    CustomerStore, EmployeeStore, OrderStore, ProductStore, Store, SupplierStore,
};
use northwind_api::store::{Page, SearchTerm};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt;

/// In-memory store over the seed dataset that records every call it gets.
#[derive(Default)]
struct FixtureStore {
    fail: bool,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl FixtureStore {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    fn record(&self, call: String) -> anyhow::Result<()> {
        self.calls.lock().push(call);
        if self.fail {
            return Err(anyhow::anyhow!("connection refused").context("Failed to query"));
        }
        Ok(())
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

fn paginate<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect()
}

// Every word of the term must prefix some word of the text.
fn prefix_match(text: &str, term: &SearchTerm) -> bool {
    !term.is_degenerate()
        && term.raw().split_whitespace().all(|needle| {
            let needle = needle.to_lowercase();
            text.split_whitespace()
                .any(|word| word.to_lowercase().starts_with(&needle))
        })
}

#[async_trait::async_trait]
impl CustomerStore for FixtureStore {
    async fn list_customers(&self, page: Page) -> anyhow::Result<Vec<Customer>> {
        self.record(format!("list_customers {} {}", page.limit, page.offset))?;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(paginate(seed::customers(), page))
    }

    async fn get_customer(&self, id: Id) -> anyhow::Result<Option<Customer>> {
        self.record(format!("get_customer {}", id))?;
        Ok(seed::customers().into_iter().find(|c| c.id == id))
    }

    async fn search_customers(&self, term: &SearchTerm) -> anyhow::Result<Vec<Customer>> {
        self.record(format!("search_customers {}", term.expression()))?;
        Ok(seed::customers()
            .into_iter()
            .filter(|c| prefix_match(&c.company_name, term))
            .collect())
    }
}

#[async_trait::async_trait]
impl EmployeeStore for FixtureStore {
    async fn list_employees(&self, page: Page) -> anyhow::Result<Vec<Employee>> {
        self.record(format!("list_employees {} {}", page.limit, page.offset))?;
        Ok(paginate(seed::employees(), page))
    }

    async fn employee_with_recipient(&self, id: Id) -> anyhow::Result<Vec<Employee>> {
        self.record(format!("employee_with_recipient {}", id))?;
        let all = seed::employees();
        Ok(all
            .iter()
            .filter(|e| e.id == id)
            .map(|e| {
                let recipient = e
                    .recipient_id
                    .and_then(|rid| all.iter().find(|r| r.id == rid).cloned());
                e.clone().with_recipient(recipient)
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl SupplierStore for FixtureStore {
    async fn list_suppliers(&self, page: Page) -> anyhow::Result<Vec<Supplier>> {
        self.record(format!("list_suppliers {} {}", page.limit, page.offset))?;
        Ok(paginate(seed::suppliers(), page))
    }

    async fn get_supplier(&self, id: Id) -> anyhow::Result<Option<Supplier>> {
        self.record(format!("get_supplier {}", id))?;
        Ok(seed::suppliers().into_iter().find(|s| s.id == id))
    }
}

#[async_trait::async_trait]
impl ProductStore for FixtureStore {
    async fn list_products(&self, page: Page) -> anyhow::Result<Vec<Product>> {
        self.record(format!("list_products {} {}", page.limit, page.offset))?;
        Ok(paginate(seed::products(), page))
    }

    async fn product_with_supplier(&self, id: Id) -> anyhow::Result<Vec<Product>> {
        self.record(format!("product_with_supplier {}", id))?;
        let suppliers = seed::suppliers();
        Ok(seed::products()
            .into_iter()
            .filter(|p| p.id == id)
            .map(|p| Product {
                supplier: suppliers.iter().find(|s| s.id == p.supplier_id).cloned(),
                ..p
            })
            .collect())
    }

    async fn search_products(&self, term: &SearchTerm) -> anyhow::Result<Vec<Product>> {
        self.record(format!("search_products {}", term.expression()))?;
        Ok(seed::products()
            .into_iter()
            .filter(|p| prefix_match(&p.name, term))
            .collect())
    }
}

fn summarize(order: &Order) -> OrderSummary {
    let has_items = !order.details.is_empty();
    OrderSummary {
        id: order.id,
        shipped_date: order.shipped_date,
        ship_name: order.ship_name.clone(),
        ship_city: order.ship_city.clone(),
        ship_country: order.ship_country.clone(),
        products_count: order.details.len() as i32,
        quantity_sum: has_items.then(|| order.details.iter().map(|d| d.quantity).sum()),
        total_price: has_items.then(|| {
            order
                .details
                .iter()
                .map(|d| d.quantity as f64 * d.unit_price)
                .sum()
        }),
    }
}

#[async_trait::async_trait]
impl OrderStore for FixtureStore {
    async fn list_order_summaries(&self, page: Page) -> anyhow::Result<Vec<OrderSummary>> {
        self.record(format!("list_order_summaries {} {}", page.limit, page.offset))?;
        Ok(paginate(seed::orders().iter().map(summarize).collect(), page))
    }

    async fn order_summary(&self, id: Id) -> anyhow::Result<Vec<OrderSummary>> {
        self.record(format!("order_summary {}", id))?;
        Ok(seed::orders()
            .iter()
            .filter(|o| o.id == id)
            .map(summarize)
            .collect())
    }

    async fn order_with_details_and_products(&self, id: Id) -> anyhow::Result<Vec<Order>> {
        self.record(format!("order_with_details_and_products {}", id))?;
        let products = seed::products();
        Ok(seed::orders()
            .into_iter()
            .filter(|o| o.id == id)
            .map(|mut order| {
                for detail in &mut order.details {
                    detail.product = products.iter().find(|p| p.id == detail.product_id).cloned();
                }
                order
            })
            .collect())
    }
}

impl Store for FixtureStore {}

fn app(store: Arc<FixtureStore>) -> Router {
    create_app(store, &ServerConfig::default())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(
        content_type.starts_with("application/json"),
        "unexpected content type {:?} for {}",
        content_type,
        uri
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_check() {
    let (status, body) = get(app(Arc::default()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_list_customers_paginates() {
    let store = Arc::new(FixtureStore::default());
    let (status, body) = get(app(store.clone()), "/customers?limit=2&offset=1").await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 3]);
    assert_eq!(store.calls(), vec!["list_customers 2 1"]);
}

#[tokio::test]
async fn test_malformed_pagination_coerces_to_zero() {
    let store = Arc::new(FixtureStore::default());
    let (status, body) = get(app(store.clone()), "/products?limit=ten&offset=-3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    assert_eq!(store.calls(), vec!["list_products 0 0"]);
}

#[tokio::test]
async fn test_missing_parameters_coerce_to_zero() {
    let store = Arc::new(FixtureStore::default());
    get(app(store.clone()), "/employees").await;
    get(app(store.clone()), "/supplier-by-id").await;
    get(app(store.clone()), "/search-customer").await;

    assert_eq!(
        store.calls(),
        vec!["list_employees 0 0", "get_supplier 0", "search_customers "]
    );
}

#[tokio::test]
async fn test_customer_by_id() {
    let (status, body) = get(app(Arc::default()), "/customer-by-id?id=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["companyName"], "Hungry Owl All-Night Grocers");
    assert!(body["postalCode"].is_null());
    assert_eq!(body["region"], "Co. Cork");
}

#[tokio::test]
async fn test_unknown_customer_is_null_not_error() {
    let (status, body) = get(app(Arc::default()), "/customer-by-id?id=999").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let (status, body) = get(app(Arc::default()), "/supplier-by-id?id=999").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());
}

#[tokio::test]
async fn test_search_passes_prefix_expression() {
    let store = Arc::new(FixtureStore::default());
    let (status, body) = get(app(store.clone()), "/search-product?term=chef").await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["Chef Anton's Cajun Seasoning", "Chef Anton's Gumbo Mix"]
    );
    assert_eq!(store.calls(), vec!["search_products 'chef':*"]);
}

#[tokio::test]
async fn test_search_without_match_is_empty() {
    let (status, body) = get(app(Arc::default()), "/search-customer?term=zzz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = get(app(Arc::default()), "/search-customer?term=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_multi_word_search_ands_prefixes() {
    let store = Arc::new(FixtureStore::default());
    let (status, body) = get(app(store.clone()), "/search-product?term=chef%20gum").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Chef Anton's Gumbo Mix");

    let (status, body) = get(app(store.clone()), "/search-product?term=zzz%20qqq").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    assert_eq!(
        store.calls(),
        vec![
            "search_products 'chef':* & 'gum':*",
            "search_products 'zzz':* & 'qqq':*"
        ]
    );
}

#[tokio::test]
async fn test_employee_without_recipient_omits_field() {
    let (status, body) = get(app(Arc::default()), "/employee-with-recipient?id=1").await;
    assert_eq!(status, StatusCode::OK);

    let employees = body.as_array().unwrap();
    assert_eq!(employees.len(), 1);
    assert!(employees[0].get("recipient").is_none());
    assert!(employees[0]["recipientId"].is_null());
}

#[tokio::test]
async fn test_employee_with_recipient_nests_manager_row() {
    let (_, manager) = get(app(Arc::default()), "/employees?limit=1&offset=1").await;
    let (status, body) = get(app(Arc::default()), "/employee-with-recipient?id=4").await;
    assert_eq!(status, StatusCode::OK);

    let employee = &body[0];
    assert_eq!(employee["recipientId"], 2);
    assert_eq!(employee["recipient"], manager[0]);
    assert!(employee["firstName"].is_null());
    assert_eq!(employee["birthDate"], "1955-03-04");
}

#[tokio::test]
async fn test_unknown_employee_is_empty_list() {
    let (status, body) = get(app(Arc::default()), "/employee-with-recipient?id=77").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_product_with_supplier() {
    let (status, body) = get(app(Arc::default()), "/product-with-supplier?id=4").await;
    assert_eq!(status, StatusCode::OK);

    let product = &body[0];
    assert_eq!(product["quantityPerUnit"], "48 - 6 oz jars");
    assert_eq!(product["supplier"]["companyName"], "New Orleans Cajun Delights");
    assert_eq!(product["supplier"]["id"], product["supplierId"]);
}

#[tokio::test]
async fn test_plain_product_list_has_no_supplier_field() {
    let (_, body) = get(app(Arc::default()), "/products?limit=10&offset=0").await;
    for product in body.as_array().unwrap() {
        assert!(product.get("supplier").is_none());
    }
}

#[tokio::test]
async fn test_orders_with_details_aggregates() {
    let (status, body) = get(app(Arc::default()), "/orders-with-details?limit=10&offset=0").await;
    assert_eq!(status, StatusCode::OK);

    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 3);
    assert_eq!(orders[0]["productsCount"], 3);
    assert_eq!(orders[0]["quantitySum"], 27);
    assert_eq!(orders[0]["totalPrice"], 438.0);

    // order without line items keeps its row with zero count and null sums
    assert_eq!(orders[2]["id"], 3);
    assert_eq!(orders[2]["productsCount"], 0);
    assert!(orders[2]["quantitySum"].is_null());
    assert!(orders[2]["totalPrice"].is_null());
}

#[tokio::test]
async fn test_order_with_details_single() {
    let (_, body) = get(app(Arc::default()), "/order-with-details?id=2").await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["productsCount"], 2);
    assert_eq!(body[0]["quantitySum"], 49);

    let (_, body) = get(app(Arc::default()), "/order-with-details?id=99").await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_order_with_details_and_products() {
    let (status, body) = get(app(Arc::default()), "/order-with-details-and-products?id=1").await;
    assert_eq!(status, StatusCode::OK);

    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    let details = orders[0]["details"].as_array().unwrap();
    assert_eq!(details.len(), 3);
    for detail in details {
        assert_eq!(detail["product"]["id"], detail["productId"]);
        assert_eq!(detail["orderId"], 1);
    }
}

#[tokio::test]
async fn test_order_without_items_keeps_empty_details() {
    let (_, body) = get(app(Arc::default()), "/order-with-details-and-products?id=3").await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["details"], json!([]));

    let (_, body) = get(app(Arc::default()), "/order-with-details-and-products?id=404").await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (status, body) = get(app(Arc::default()), "/invoices").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Cannot GET /invoices");
}

#[tokio::test]
async fn test_storage_failure_is_500_with_raw_message() {
    let store = Arc::new(FixtureStore::failing());
    let (status, body) = get(app(store.clone()), "/customers?limit=5").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to query: connection refused");
    assert_eq!(store.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_request_times_out_with_json_body() {
    let store = Arc::new(FixtureStore::slow(Duration::from_secs(5)));
    let server = ServerConfig {
        request_timeout_secs: 1,
        ..Default::default()
    };
    let (status, body) = get(create_app(store.clone(), &server), "/customers?limit=1").await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body["error"], "Request timed out");
    assert_eq!(store.calls(), vec!["list_customers 1 0"]);
}
