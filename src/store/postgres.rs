use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::DatabaseConfig;
use crate::model::{Customer, Employee, Id, Order, OrderSummary, Product, Supplier};
use crate::store::catalog::{self, Page, SearchTerm};
use crate::store::mapper::{
    assemble_order, collect_rows, map_optional_row, EmployeeWithRecipientRow, MapError,
    OrderDetailProductRow, OrderSummaryRow, ProductWithSupplierRow,
};
use crate::store::traits::{
    CustomerStore, EmployeeStore, OrderStore, ProductStore, Store, SupplierStore,
};

/// Catalog store backed by a shared PostgreSQL pool.
///
/// Every operation is a single read statement (two for the order detail
/// fetch) with no transaction and no retry.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create the pool from the database settings and check it with a ping
    pub async fn connect(database_url: &str, config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .max_lifetime(config.max_lifetime_secs.map(Duration::from_secs))
            .idle_timeout(config.idle_timeout_secs.map(Duration::from_secs))
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        let store = Self { pool };
        store.ping().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Unable to ping database")?;
        Ok(())
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait::async_trait]
impl CustomerStore for PostgresStore {
    async fn list_customers(&self, page: Page) -> Result<Vec<Customer>> {
        let entry = &catalog::LIST_CUSTOMERS;
        let rows = sqlx::query(entry.sql)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list customers")?;

        Ok(collect_rows(entry, rows, Ok::<Customer, MapError>))
    }

    async fn get_customer(&self, id: Id) -> Result<Option<Customer>> {
        let entry = &catalog::CUSTOMER_BY_ID;
        let row = sqlx::query(entry.sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch customer")?;

        Ok(map_optional_row(entry, row, Ok::<Customer, MapError>))
    }

    async fn search_customers(&self, term: &SearchTerm) -> Result<Vec<Customer>> {
        if term.is_degenerate() {
            log::debug!("search_customers: blank term, no lexeme to match");
            return Ok(Vec::new());
        }

        let entry = &catalog::SEARCH_CUSTOMERS;
        let rows = sqlx::query(entry.sql)
            .bind(term.expression())
            .fetch_all(&self.pool)
            .await
            .context("Failed to search customers")?;

        Ok(collect_rows(entry, rows, Ok::<Customer, MapError>))
    }
}

#[async_trait::async_trait]
impl EmployeeStore for PostgresStore {
    async fn list_employees(&self, page: Page) -> Result<Vec<Employee>> {
        let entry = &catalog::LIST_EMPLOYEES;
        let rows = sqlx::query(entry.sql)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list employees")?;

        Ok(collect_rows(entry, rows, Ok::<Employee, MapError>))
    }

    async fn employee_with_recipient(&self, id: Id) -> Result<Vec<Employee>> {
        let entry = &catalog::EMPLOYEE_WITH_RECIPIENT;
        let rows = sqlx::query(entry.sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch employee with recipient")?;

        Ok(collect_rows(
            entry,
            rows,
            EmployeeWithRecipientRow::into_employee,
        ))
    }
}

#[async_trait::async_trait]
impl SupplierStore for PostgresStore {
    async fn list_suppliers(&self, page: Page) -> Result<Vec<Supplier>> {
        let entry = &catalog::LIST_SUPPLIERS;
        let rows = sqlx::query(entry.sql)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list suppliers")?;

        Ok(collect_rows(entry, rows, Ok::<Supplier, MapError>))
    }

    async fn get_supplier(&self, id: Id) -> Result<Option<Supplier>> {
        let entry = &catalog::SUPPLIER_BY_ID;
        let row = sqlx::query(entry.sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch supplier")?;

        Ok(map_optional_row(entry, row, Ok::<Supplier, MapError>))
    }
}

#[async_trait::async_trait]
impl ProductStore for PostgresStore {
    async fn list_products(&self, page: Page) -> Result<Vec<Product>> {
        let entry = &catalog::LIST_PRODUCTS;
        let rows = sqlx::query(entry.sql)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list products")?;

        Ok(collect_rows(entry, rows, Ok::<Product, MapError>))
    }

    async fn product_with_supplier(&self, id: Id) -> Result<Vec<Product>> {
        let entry = &catalog::PRODUCT_WITH_SUPPLIER;
        let rows = sqlx::query(entry.sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch product with supplier")?;

        Ok(collect_rows(entry, rows, ProductWithSupplierRow::into_product))
    }

    async fn search_products(&self, term: &SearchTerm) -> Result<Vec<Product>> {
        if term.is_degenerate() {
            log::debug!("search_products: blank term, no lexeme to match");
            return Ok(Vec::new());
        }

        let entry = &catalog::SEARCH_PRODUCTS;
        let rows = sqlx::query(entry.sql)
            .bind(term.expression())
            .fetch_all(&self.pool)
            .await
            .context("Failed to search products")?;

        Ok(collect_rows(entry, rows, Ok::<Product, MapError>))
    }
}

#[async_trait::async_trait]
impl OrderStore for PostgresStore {
    async fn list_order_summaries(&self, page: Page) -> Result<Vec<OrderSummary>> {
        let entry = &catalog::LIST_ORDER_SUMMARIES;
        let rows = sqlx::query(entry.sql)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list orders with details")?;

        Ok(collect_rows(entry, rows, |row: OrderSummaryRow| {
            Ok(OrderSummary::from(row))
        }))
    }

    async fn order_summary(&self, id: Id) -> Result<Vec<OrderSummary>> {
        let entry = &catalog::ORDER_SUMMARY_BY_ID;
        let rows = sqlx::query(entry.sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch order with details")?;

        Ok(collect_rows(entry, rows, |row: OrderSummaryRow| {
            Ok(OrderSummary::from(row))
        }))
    }

    async fn order_with_details_and_products(&self, id: Id) -> Result<Vec<Order>> {
        let entry = &catalog::ORDER_BY_ID;
        let row = sqlx::query(entry.sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch order")?;

        let Some(order) = map_optional_row(entry, row, Ok::<Order, MapError>) else {
            return Ok(Vec::new());
        };

        let entry = &catalog::ORDER_DETAILS_WITH_PRODUCTS;
        let rows = sqlx::query(entry.sql)
            .bind(order.id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch order details with products")?;

        let details = collect_rows(entry, rows, OrderDetailProductRow::into_detail);
        Ok(assemble_order(Some(order), details))
    }
}

impl Store for PostgresStore {}
