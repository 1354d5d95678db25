//! Row to entity mapping for the catalog statements.
//!
//! Joined columns arrive with a prefix (`r_`, `s_`, `p_`) and are all nullable
//! because of the outer joins. A nested entity is built only when the joined
//! id is non-null; if the id is present but another required column is not,
//! the row is rejected with [`MapError::IncompleteJoin`].
//!
//! Rows that fail to decode or map are dropped by [`RowCollector`] instead of
//! failing the request.

use std::fmt::Display;

use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::FromRow;

use crate::model::{Employee, Id, Order, OrderDetail, OrderSummary, Product, Supplier};
use crate::store::catalog::CatalogEntry;

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("row decode failed: {0}")]
    Decode(#[from] sqlx::Error),
    #[error("joined {relation} has an id but column {column} is null")]
    IncompleteJoin {
        relation: &'static str,
        column: &'static str,
    },
}

fn joined<T>(value: Option<T>, relation: &'static str, column: &'static str) -> Result<T, MapError> {
    value.ok_or(MapError::IncompleteJoin { relation, column })
}

/// Employee row with its direct recipient from the self-join.
#[derive(Debug, Clone, FromRow)]
pub struct EmployeeWithRecipientRow {
    #[sqlx(flatten)]
    pub employee: Employee,
    pub r_id: Option<Id>,
    pub r_last_name: Option<String>,
    pub r_first_name: Option<String>,
    pub r_title: Option<String>,
    pub r_title_of_courtesy: Option<String>,
    pub r_birth_date: Option<NaiveDate>,
    pub r_hire_date: Option<NaiveDate>,
    pub r_address: Option<String>,
    pub r_city: Option<String>,
    pub r_postal_code: Option<String>,
    pub r_country: Option<String>,
    pub r_home_phone: Option<String>,
    pub r_extension: Option<i32>,
    pub r_notes: Option<String>,
    pub r_recipient_id: Option<Id>,
}

impl EmployeeWithRecipientRow {
    pub fn into_employee(self) -> Result<Employee, MapError> {
        const REL: &str = "recipient";

        let recipient = match self.r_id {
            None => None,
            Some(id) => Some(Employee {
                id,
                last_name: joined(self.r_last_name, REL, "last_name")?,
                first_name: self.r_first_name,
                title: joined(self.r_title, REL, "title")?,
                title_of_courtesy: joined(self.r_title_of_courtesy, REL, "title_of_courtesy")?,
                birth_date: joined(self.r_birth_date, REL, "birth_date")?,
                hire_date: joined(self.r_hire_date, REL, "hire_date")?,
                address: joined(self.r_address, REL, "address")?,
                city: joined(self.r_city, REL, "city")?,
                postal_code: joined(self.r_postal_code, REL, "postal_code")?,
                country: joined(self.r_country, REL, "country")?,
                home_phone: joined(self.r_home_phone, REL, "home_phone")?,
                extension: joined(self.r_extension, REL, "extension")?,
                notes: joined(self.r_notes, REL, "notes")?,
                recipient_id: self.r_recipient_id,
                recipient: None,
            }),
        };

        Ok(self.employee.with_recipient(recipient))
    }
}

/// Product row with its supplier from the outer join.
#[derive(Debug, Clone, FromRow)]
pub struct ProductWithSupplierRow {
    #[sqlx(flatten)]
    pub product: Product,
    pub s_id: Option<Id>,
    pub s_company_name: Option<String>,
    pub s_contact_name: Option<String>,
    pub s_contact_title: Option<String>,
    pub s_address: Option<String>,
    pub s_city: Option<String>,
    pub s_region: Option<String>,
    pub s_postal_code: Option<String>,
    pub s_country: Option<String>,
    pub s_phone: Option<String>,
}

impl ProductWithSupplierRow {
    pub fn into_product(self) -> Result<Product, MapError> {
        const REL: &str = "supplier";

        let supplier = match self.s_id {
            None => None,
            Some(id) => Some(Supplier {
                id,
                company_name: joined(self.s_company_name, REL, "company_name")?,
                contact_name: joined(self.s_contact_name, REL, "contact_name")?,
                contact_title: joined(self.s_contact_title, REL, "contact_title")?,
                address: joined(self.s_address, REL, "address")?,
                city: joined(self.s_city, REL, "city")?,
                region: self.s_region,
                postal_code: joined(self.s_postal_code, REL, "postal_code")?,
                country: joined(self.s_country, REL, "country")?,
                phone: joined(self.s_phone, REL, "phone")?,
            }),
        };

        Ok(Product {
            supplier,
            ..self.product
        })
    }
}

/// Aggregate columns are nullable: `COUNT` is never null in practice but is
/// still read as optional, and both `SUM`s are null for an order without items.
#[derive(Debug, Clone, FromRow)]
pub struct OrderSummaryRow {
    pub id: Id,
    pub shipped_date: Option<NaiveDate>,
    pub ship_name: String,
    pub ship_city: String,
    pub ship_country: String,
    pub products_count: Option<i32>,
    pub quantity_sum: Option<i32>,
    pub total_price: Option<f64>,
}

impl From<OrderSummaryRow> for OrderSummary {
    fn from(row: OrderSummaryRow) -> Self {
        Self {
            id: row.id,
            shipped_date: row.shipped_date,
            ship_name: row.ship_name,
            ship_city: row.ship_city,
            ship_country: row.ship_country,
            products_count: row.products_count.unwrap_or(0),
            quantity_sum: row.quantity_sum,
            total_price: row.total_price,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderDetailProductRow {
    pub unit_price: f64,
    pub quantity: i32,
    pub discount: f64,
    pub order_id: Id,
    pub product_id: Id,
    pub p_id: Option<Id>,
    pub p_name: Option<String>,
    pub p_qt_per_unit: Option<String>,
    pub p_unit_price: Option<f64>,
    pub p_units_in_stock: Option<i32>,
    pub p_units_on_order: Option<i32>,
    pub p_reorder_level: Option<i32>,
    pub p_discontinued: Option<i32>,
    pub p_supplier_id: Option<Id>,
}

impl OrderDetailProductRow {
    pub fn into_detail(self) -> Result<OrderDetail, MapError> {
        const REL: &str = "product";

        let product = match self.p_id {
            None => None,
            Some(id) => Some(Product {
                id,
                name: joined(self.p_name, REL, "name")?,
                quantity_per_unit: joined(self.p_qt_per_unit, REL, "qt_per_unit")?,
                unit_price: joined(self.p_unit_price, REL, "unit_price")?,
                units_in_stock: joined(self.p_units_in_stock, REL, "units_in_stock")?,
                units_on_order: joined(self.p_units_on_order, REL, "units_on_order")?,
                reorder_level: joined(self.p_reorder_level, REL, "reorder_level")?,
                discontinued: joined(self.p_discontinued, REL, "discontinued")?,
                supplier_id: joined(self.p_supplier_id, REL, "supplier_id")?,
                supplier: None,
            }),
        };

        Ok(OrderDetail {
            unit_price: self.unit_price,
            quantity: self.quantity,
            discount: self.discount,
            order_id: self.order_id,
            product_id: self.product_id,
            product,
        })
    }
}

/// Result of the two-step order fetch: nothing when the order does not exist,
/// otherwise exactly one order carrying all of its line items (possibly none).
pub fn assemble_order(order: Option<Order>, details: Vec<OrderDetail>) -> Vec<Order> {
    match order {
        None => Vec::new(),
        Some(order) => vec![Order { details, ..order }],
    }
}

/// Collects mapped rows, dropping the ones that fail.
///
/// A dropped row is logged with the entry name and the cause; [`finish`] logs
/// the total skipped count. The response never reflects skipped rows.
///
/// [`finish`]: RowCollector::finish
#[derive(Debug)]
pub struct RowCollector<T> {
    entry: &'static str,
    items: Vec<T>,
    skipped: usize,
}

impl<T> RowCollector<T> {
    pub fn new(entry: &CatalogEntry) -> Self {
        Self::named(entry.name)
    }

    pub fn named(entry: &'static str) -> Self {
        Self {
            entry,
            items: Vec::new(),
            skipped: 0,
        }
    }

    pub fn push<E: Display>(&mut self, result: Result<T, E>) {
        match result {
            Ok(item) => self.items.push(item),
            Err(e) => {
                self.skipped += 1;
                log::warn!("{}: dropping row: {}", self.entry, e);
            }
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn finish(self) -> Vec<T> {
        if self.skipped > 0 {
            log::warn!(
                "{}: skipped {} of {} rows",
                self.entry,
                self.skipped,
                self.skipped + self.items.len()
            );
        }
        self.items
    }
}

impl<T, E: Display> Extend<Result<T, E>> for RowCollector<T> {
    fn extend<I: IntoIterator<Item = Result<T, E>>>(&mut self, iter: I) {
        for result in iter {
            self.push(result);
        }
    }
}

/// Decode every row as `R`, map it to `T`, and keep the ones that succeed.
pub fn collect_rows<R, T, F>(entry: &CatalogEntry, rows: Vec<PgRow>, map: F) -> Vec<T>
where
    R: for<'r> FromRow<'r, PgRow>,
    F: Fn(R) -> Result<T, MapError>,
{
    let mut collector = RowCollector::new(entry);
    collector.extend(
        rows.iter()
            .map(|row| R::from_row(row).map_err(MapError::from).and_then(&map)),
    );
    collector.finish()
}

/// Single-row variant of [`collect_rows`]; a row that fails is treated as absent.
pub fn map_optional_row<R, T, F>(entry: &CatalogEntry, row: Option<PgRow>, map: F) -> Option<T>
where
    R: for<'r> FromRow<'r, PgRow>,
    F: Fn(R) -> Result<T, MapError>,
{
    collect_rows(entry, row.into_iter().collect(), map)
        .into_iter()
        .next()
}
