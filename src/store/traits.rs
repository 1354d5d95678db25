use crate::model::{Customer, Employee, Id, Order, OrderSummary, Product, Supplier};
use crate::store::catalog::{Page, SearchTerm};
use anyhow::Result;

#[async_trait::async_trait]
pub trait CustomerStore: Send + Sync {
    async fn list_customers(&self, page: Page) -> Result<Vec<Customer>>;
    /// `None` when no customer has this id
    async fn get_customer(&self, id: Id) -> Result<Option<Customer>>;
    /// Prefix match on company name; a degenerate term matches nothing
    async fn search_customers(&self, term: &SearchTerm) -> Result<Vec<Customer>>;
}

#[async_trait::async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn list_employees(&self, page: Page) -> Result<Vec<Employee>>;
    /// Zero or one employee, with its direct recipient nested when it has one
    async fn employee_with_recipient(&self, id: Id) -> Result<Vec<Employee>>;
}

#[async_trait::async_trait]
pub trait SupplierStore: Send + Sync {
    async fn list_suppliers(&self, page: Page) -> Result<Vec<Supplier>>;
    async fn get_supplier(&self, id: Id) -> Result<Option<Supplier>>;
}

#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    async fn list_products(&self, page: Page) -> Result<Vec<Product>>;
    /// Zero or one product, with its supplier nested
    async fn product_with_supplier(&self, id: Id) -> Result<Vec<Product>>;
    /// Prefix match on product name; a degenerate term matches nothing
    async fn search_products(&self, term: &SearchTerm) -> Result<Vec<Product>>;
}

#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    async fn list_order_summaries(&self, page: Page) -> Result<Vec<OrderSummary>>;
    /// Zero or one summary
    async fn order_summary(&self, id: Id) -> Result<Vec<OrderSummary>>;
    /// Zero or one order carrying every line item with its product
    async fn order_with_details_and_products(&self, id: Id) -> Result<Vec<Order>>;
}

pub trait Store:
    CustomerStore + EmployeeStore + SupplierStore + ProductStore + OrderStore + Send + Sync
{
}
