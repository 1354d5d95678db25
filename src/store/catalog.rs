//! Fixed set of parameterized statements served by the store.
//!
//! Every statement takes its inputs as bound `$n` parameters; nothing from a
//! request is ever spliced into SQL text. List statements order by id, the
//! aggregate statements order by their group key.

/// Declared input of a catalog entry, in bind order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Limit,
    Offset,
    Id,
    Term,
}

/// Declared row shape a catalog entry produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    Customer,
    Employee,
    EmployeeWithRecipient,
    Supplier,
    Product,
    ProductWithSupplier,
    OrderSummary,
    Order,
    OrderDetailWithProduct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPattern {
    Pagination,
    Lookup,
    TextSearch,
    SelfJoin,
    Composition,
    AggregateRollup,
    TwoStepFetch,
}

#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub pattern: QueryPattern,
    pub params: &'static [Param],
    pub shape: RowShape,
    pub sql: &'static str,
}

const PAGE: &[Param] = &[Param::Limit, Param::Offset];
const BY_ID: &[Param] = &[Param::Id];
const BY_TERM: &[Param] = &[Param::Term];

pub const LIST_CUSTOMERS: CatalogEntry = CatalogEntry {
    name: "list_customers",
    pattern: QueryPattern::Pagination,
    params: PAGE,
    shape: RowShape::Customer,
    sql: r#"
        SELECT id, company_name, contact_name, contact_title, address, city,
               postal_code, region, country, phone, fax
        FROM customers
        ORDER BY id
        LIMIT $1 OFFSET $2
    "#,
};

pub const CUSTOMER_BY_ID: CatalogEntry = CatalogEntry {
    name: "customer_by_id",
    pattern: QueryPattern::Lookup,
    params: BY_ID,
    shape: RowShape::Customer,
    sql: r#"
        SELECT id, company_name, contact_name, contact_title, address, city,
               postal_code, region, country, phone, fax
        FROM customers
        WHERE id = $1
    "#,
};

pub const SEARCH_CUSTOMERS: CatalogEntry = CatalogEntry {
    name: "search_customers",
    pattern: QueryPattern::TextSearch,
    params: BY_TERM,
    shape: RowShape::Customer,
    sql: r#"
        SELECT id, company_name, contact_name, contact_title, address, city,
               postal_code, region, country, phone, fax
        FROM customers
        WHERE to_tsvector('english', company_name) @@ to_tsquery('english', $1)
        ORDER BY id
    "#,
};

pub const LIST_EMPLOYEES: CatalogEntry = CatalogEntry {
    name: "list_employees",
    pattern: QueryPattern::Pagination,
    params: PAGE,
    shape: RowShape::Employee,
    sql: r#"
        SELECT id, last_name, first_name, title, title_of_courtesy, birth_date,
               hire_date, address, city, postal_code, country, home_phone,
               extension, notes, recipient_id
        FROM employees
        ORDER BY id
        LIMIT $1 OFFSET $2
    "#,
};

// One level only: the recipient's own recipient_id is returned but not followed.
pub const EMPLOYEE_WITH_RECIPIENT: CatalogEntry = CatalogEntry {
    name: "employee_with_recipient",
    pattern: QueryPattern::SelfJoin,
    params: BY_ID,
    shape: RowShape::EmployeeWithRecipient,
    sql: r#"
        SELECT e.id, e.last_name, e.first_name, e.title, e.title_of_courtesy,
               e.birth_date, e.hire_date, e.address, e.city, e.postal_code,
               e.country, e.home_phone, e.extension, e.notes, e.recipient_id,
               r.id AS r_id, r.last_name AS r_last_name,
               r.first_name AS r_first_name, r.title AS r_title,
               r.title_of_courtesy AS r_title_of_courtesy,
               r.birth_date AS r_birth_date, r.hire_date AS r_hire_date,
               r.address AS r_address, r.city AS r_city,
               r.postal_code AS r_postal_code, r.country AS r_country,
               r.home_phone AS r_home_phone, r.extension AS r_extension,
               r.notes AS r_notes, r.recipient_id AS r_recipient_id
        FROM employees e
        LEFT JOIN employees r ON r.id = e.recipient_id
        WHERE e.id = $1
    "#,
};

pub const LIST_SUPPLIERS: CatalogEntry = CatalogEntry {
    name: "list_suppliers",
    pattern: QueryPattern::Pagination,
    params: PAGE,
    shape: RowShape::Supplier,
    sql: r#"
        SELECT id, company_name, contact_name, contact_title, address, city,
               region, postal_code, country, phone
        FROM suppliers
        ORDER BY id
        LIMIT $1 OFFSET $2
    "#,
};

pub const SUPPLIER_BY_ID: CatalogEntry = CatalogEntry {
    name: "supplier_by_id",
    pattern: QueryPattern::Lookup,
    params: BY_ID,
    shape: RowShape::Supplier,
    sql: r#"
        SELECT id, company_name, contact_name, contact_title, address, city,
               region, postal_code, country, phone
        FROM suppliers
        WHERE id = $1
    "#,
};

pub const LIST_PRODUCTS: CatalogEntry = CatalogEntry {
    name: "list_products",
    pattern: QueryPattern::Pagination,
    params: PAGE,
    shape: RowShape::Product,
    sql: r#"
        SELECT id, name, qt_per_unit, unit_price, units_in_stock, units_on_order,
               reorder_level, discontinued, supplier_id
        FROM products
        ORDER BY id
        LIMIT $1 OFFSET $2
    "#,
};

// supplier_id is NOT NULL, the outer join only guards against a dangling key.
pub const PRODUCT_WITH_SUPPLIER: CatalogEntry = CatalogEntry {
    name: "product_with_supplier",
    pattern: QueryPattern::Composition,
    params: BY_ID,
    shape: RowShape::ProductWithSupplier,
    sql: r#"
        SELECT p.id, p.name, p.qt_per_unit, p.unit_price, p.units_in_stock,
               p.units_on_order, p.reorder_level, p.discontinued, p.supplier_id,
               s.id AS s_id, s.company_name AS s_company_name,
               s.contact_name AS s_contact_name,
               s.contact_title AS s_contact_title, s.address AS s_address,
               s.city AS s_city, s.region AS s_region,
               s.postal_code AS s_postal_code, s.country AS s_country,
               s.phone AS s_phone
        FROM products p
        LEFT JOIN suppliers s ON s.id = p.supplier_id
        WHERE p.id = $1
    "#,
};

pub const SEARCH_PRODUCTS: CatalogEntry = CatalogEntry {
    name: "search_products",
    pattern: QueryPattern::TextSearch,
    params: BY_TERM,
    shape: RowShape::Product,
    sql: r#"
        SELECT id, name, qt_per_unit, unit_price, units_in_stock, units_on_order,
               reorder_level, discontinued, supplier_id
        FROM products
        WHERE to_tsvector('english', name) @@ to_tsquery('english', $1)
        ORDER BY id
    "#,
};

pub const LIST_ORDER_SUMMARIES: CatalogEntry = CatalogEntry {
    name: "list_order_summaries",
    pattern: QueryPattern::AggregateRollup,
    params: PAGE,
    shape: RowShape::OrderSummary,
    sql: r#"
        SELECT o.id, o.shipped_date, o.ship_name, o.ship_city, o.ship_country,
               COUNT(d.product_id)::int AS products_count,
               SUM(d.quantity)::int AS quantity_sum,
               SUM(d.quantity * d.unit_price)::float8 AS total_price
        FROM orders o
        LEFT JOIN order_details d ON d.order_id = o.id
        GROUP BY o.id
        ORDER BY o.id
        LIMIT $1 OFFSET $2
    "#,
};

pub const ORDER_SUMMARY_BY_ID: CatalogEntry = CatalogEntry {
    name: "order_summary_by_id",
    pattern: QueryPattern::AggregateRollup,
    params: BY_ID,
    shape: RowShape::OrderSummary,
    sql: r#"
        SELECT o.id, o.shipped_date, o.ship_name, o.ship_city, o.ship_country,
               COUNT(d.product_id)::int AS products_count,
               SUM(d.quantity)::int AS quantity_sum,
               SUM(d.quantity * d.unit_price)::float8 AS total_price
        FROM orders o
        LEFT JOIN order_details d ON d.order_id = o.id
        WHERE o.id = $1
        GROUP BY o.id
        ORDER BY o.id
    "#,
};

/// First step of the order-with-details-and-products fetch.
pub const ORDER_BY_ID: CatalogEntry = CatalogEntry {
    name: "order_by_id",
    pattern: QueryPattern::TwoStepFetch,
    params: BY_ID,
    shape: RowShape::Order,
    sql: r#"
        SELECT id, order_date, required_date, shipped_date, ship_via, freight,
               ship_name, ship_city, ship_region, ship_postal_code, ship_country,
               customer_id, employee_id
        FROM orders
        WHERE id = $1
    "#,
};

/// Second step: every line item of one order with its product.
pub const ORDER_DETAILS_WITH_PRODUCTS: CatalogEntry = CatalogEntry {
    name: "order_details_with_products",
    pattern: QueryPattern::TwoStepFetch,
    params: BY_ID,
    shape: RowShape::OrderDetailWithProduct,
    sql: r#"
        SELECT d.unit_price, d.quantity, d.discount, d.order_id, d.product_id,
               p.id AS p_id, p.name AS p_name, p.qt_per_unit AS p_qt_per_unit,
               p.unit_price AS p_unit_price,
               p.units_in_stock AS p_units_in_stock,
               p.units_on_order AS p_units_on_order,
               p.reorder_level AS p_reorder_level,
               p.discontinued AS p_discontinued,
               p.supplier_id AS p_supplier_id
        FROM order_details d
        LEFT JOIN products p ON p.id = d.product_id
        WHERE d.order_id = $1
        ORDER BY d.product_id
    "#,
};

pub const ENTRIES: &[CatalogEntry] = &[
    LIST_CUSTOMERS,
    CUSTOMER_BY_ID,
    SEARCH_CUSTOMERS,
    LIST_EMPLOYEES,
    EMPLOYEE_WITH_RECIPIENT,
    LIST_SUPPLIERS,
    SUPPLIER_BY_ID,
    LIST_PRODUCTS,
    PRODUCT_WITH_SUPPLIER,
    SEARCH_PRODUCTS,
    LIST_ORDER_SUMMARIES,
    ORDER_SUMMARY_BY_ID,
    ORDER_BY_ID,
    ORDER_DETAILS_WITH_PRODUCTS,
];

/// `LIMIT`/`OFFSET` pair. No upper bound is applied to `limit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.max(0),
            offset: offset.max(0),
        }
    }
}

/// Marker appended to each lexeme so `to_tsquery` matches any lexeme
/// starting with it.
pub const PREFIX_MARKER: &str = ":*";

/// Prefix-match `tsquery` expression built from a raw search term.
///
/// Each whitespace-separated word becomes a quoted lexeme carrying the prefix
/// marker, and the words are ANDed. Quoting keeps operator characters
/// (`& | ! ( ) : <`) inside the lexeme, so no user input can produce a
/// malformed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    raw: String,
    expression: String,
}

impl SearchTerm {
    pub fn prefix(raw: &str) -> Self {
        let expression = raw
            .split_whitespace()
            .map(|word| format!("'{}'{}", quote_lexeme(word), PREFIX_MARKER))
            .collect::<Vec<_>>()
            .join(" & ");

        Self {
            raw: raw.to_string(),
            expression,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The value bound to the `to_tsquery` parameter.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// A blank term holds no lexeme and therefore matches no row.
    pub fn is_degenerate(&self) -> bool {
        self.expression.is_empty()
    }
}

// Inside a quoted tsquery lexeme only the quote and the backslash are special.
fn quote_lexeme(word: &str) -> String {
    word.replace('\\', "\\\\").replace('\'', "''")
}
