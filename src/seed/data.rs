use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::model::{Customer, Employee, Id, Order, OrderDetail, Product, Supplier};

/// Serializes concurrent seeders; taken per transaction.
const SEED_LOCK_KEY: i64 = 0x4e57_5345_4544;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

fn s(value: &str) -> String {
    value.to_string()
}

pub fn suppliers() -> Vec<Supplier> {
    vec![
        Supplier {
            id: 1,
            company_name: s("Exotic Liquids"),
            contact_name: s("Charlotte Cooper"),
            contact_title: s("Purchasing Manager"),
            address: s("49 Gilbert St."),
            city: s("London"),
            region: None,
            postal_code: s("EC1 4SD"),
            country: s("UK"),
            phone: s("(171) 555-2222"),
        },
        Supplier {
            id: 2,
            company_name: s("New Orleans Cajun Delights"),
            contact_name: s("Shelley Burke"),
            contact_title: s("Order Administrator"),
            address: s("P.O. Box 78934"),
            city: s("New Orleans"),
            region: Some(s("LA")),
            postal_code: s("70117"),
            country: s("USA"),
            phone: s("(100) 555-4822"),
        },
        Supplier {
            id: 3,
            company_name: s("Grandma Kelly's Homestead"),
            contact_name: s("Regina Murphy"),
            contact_title: s("Sales Representative"),
            address: s("707 Oxford Rd."),
            city: s("Ann Arbor"),
            region: Some(s("MI")),
            postal_code: s("48104"),
            country: s("USA"),
            phone: s("(313) 555-5735"),
        },
    ]
}

pub fn customers() -> Vec<Customer> {
    vec![
        Customer {
            id: 1,
            company_name: s("Alfreds Futterkiste"),
            contact_name: s("Maria Anders"),
            contact_title: s("Sales Representative"),
            address: s("Obere Str. 57"),
            city: s("Berlin"),
            postal_code: Some(s("12209")),
            region: None,
            country: s("Germany"),
            phone: s("030-0074321"),
            fax: Some(s("030-0076545")),
        },
        Customer {
            id: 2,
            company_name: s("Ana Trujillo Emparedados y helados"),
            contact_name: s("Ana Trujillo"),
            contact_title: s("Owner"),
            address: s("Avda. de la Constitución 2222"),
            city: s("México D.F."),
            postal_code: Some(s("05021")),
            region: None,
            country: s("Mexico"),
            phone: s("(5) 555-4729"),
            fax: Some(s("(5) 555-3745")),
        },
        Customer {
            id: 3,
            company_name: s("Antonio Moreno Taquería"),
            contact_name: s("Antonio Moreno"),
            contact_title: s("Owner"),
            address: s("Mataderos 2312"),
            city: s("México D.F."),
            postal_code: Some(s("05023")),
            region: None,
            country: s("Mexico"),
            phone: s("(5) 555-3932"),
            fax: None,
        },
        Customer {
            id: 4,
            company_name: s("Around the Horn"),
            contact_name: s("Thomas Hardy"),
            contact_title: s("Sales Representative"),
            address: s("120 Hanover Sq."),
            city: s("London"),
            postal_code: Some(s("WA1 1DP")),
            region: None,
            country: s("UK"),
            phone: s("(171) 555-7788"),
            fax: Some(s("(171) 555-6750")),
        },
        Customer {
            id: 5,
            company_name: s("Hungry Owl All-Night Grocers"),
            contact_name: s("Patricia McKenna"),
            contact_title: s("Sales Associate"),
            address: s("8 Johnstown Road"),
            city: s("Cork"),
            postal_code: None,
            region: Some(s("Co. Cork")),
            country: s("Ireland"),
            phone: s("2967 542"),
            fax: Some(s("2967 3333")),
        },
    ]
}

/// Reports-to chain: 4 -> 2 -> 1, and 3 -> 1. Employee 1 has no recipient.
pub fn employees() -> Vec<Employee> {
    vec![
        Employee {
            id: 1,
            last_name: s("Fuller"),
            first_name: Some(s("Andrew")),
            title: s("Vice President, Sales"),
            title_of_courtesy: s("Dr."),
            birth_date: date(1952, 2, 19),
            hire_date: date(1992, 8, 14),
            address: s("908 W. Capital Way"),
            city: s("Tacoma"),
            postal_code: s("98401"),
            country: s("USA"),
            home_phone: s("(206) 555-9482"),
            extension: 3457,
            notes: s("Andrew received his BTS commercial and a Ph.D. in international marketing."),
            recipient_id: None,
            recipient: None,
        },
        Employee {
            id: 2,
            last_name: s("Davolio"),
            first_name: Some(s("Nancy")),
            title: s("Sales Representative"),
            title_of_courtesy: s("Ms."),
            birth_date: date(1968, 12, 8),
            hire_date: date(1992, 5, 1),
            address: s("507 - 20th Ave. E."),
            city: s("Seattle"),
            postal_code: s("98122"),
            country: s("USA"),
            home_phone: s("(206) 555-9857"),
            extension: 5467,
            notes: s("Education includes a BA in psychology from Colorado State University."),
            recipient_id: Some(1),
            recipient: None,
        },
        Employee {
            id: 3,
            last_name: s("Leverling"),
            first_name: Some(s("Janet")),
            title: s("Sales Representative"),
            title_of_courtesy: s("Ms."),
            birth_date: date(1963, 8, 30),
            hire_date: date(1992, 4, 1),
            address: s("722 Moss Bay Blvd."),
            city: s("Kirkland"),
            postal_code: s("98033"),
            country: s("USA"),
            home_phone: s("(206) 555-3412"),
            extension: 3355,
            notes: s("Janet has a BS degree in chemistry from Boston College."),
            recipient_id: Some(1),
            recipient: None,
        },
        Employee {
            id: 4,
            last_name: s("Buchanan"),
            first_name: None,
            title: s("Sales Manager"),
            title_of_courtesy: s("Mrs."),
            birth_date: date(1955, 3, 4),
            hire_date: date(1993, 10, 17),
            address: s("14 Garrett Hill"),
            city: s("London"),
            postal_code: s("SW1 8JR"),
            country: s("UK"),
            home_phone: s("(71) 555-4848"),
            extension: 3453,
            notes: s("Graduated from St. Andrews University, Scotland, with a BSC degree."),
            recipient_id: Some(2),
            recipient: None,
        },
    ]
}

#[allow(clippy::too_many_arguments)]
fn product(
    id: Id,
    name: &str,
    quantity_per_unit: &str,
    unit_price: f64,
    units_in_stock: i32,
    units_on_order: i32,
    reorder_level: i32,
    discontinued: i32,
    supplier_id: Id,
) -> Product {
    Product {
        id,
        name: s(name),
        quantity_per_unit: s(quantity_per_unit),
        unit_price,
        units_in_stock,
        units_on_order,
        reorder_level,
        discontinued,
        supplier_id,
        supplier: None,
    }
}

pub fn products() -> Vec<Product> {
    vec![
        product(1, "Chai", "10 boxes x 20 bags", 18.0, 39, 0, 10, 0, 1),
        product(2, "Chang", "24 - 12 oz bottles", 19.0, 17, 40, 25, 0, 1),
        product(3, "Aniseed Syrup", "12 - 550 ml bottles", 10.0, 13, 70, 25, 0, 1),
        product(4, "Chef Anton's Cajun Seasoning", "48 - 6 oz jars", 22.0, 53, 0, 0, 0, 2),
        product(5, "Chef Anton's Gumbo Mix", "36 boxes", 21.35, 0, 0, 0, 1, 2),
        product(6, "Grandma's Boysenberry Spread", "12 - 8 oz jars", 25.0, 120, 0, 25, 0, 3),
    ]
}

fn detail(order_id: Id, product_id: Id, unit_price: f64, quantity: i32, discount: f64) -> OrderDetail {
    OrderDetail {
        unit_price,
        quantity,
        discount,
        order_id,
        product_id,
        product: None,
    }
}

/// Order 1 and 2 carry line items, order 3 has none.
pub fn orders() -> Vec<Order> {
    vec![
        Order {
            id: 1,
            order_date: date(2024, 7, 4),
            required_date: date(2024, 8, 1),
            shipped_date: Some(date(2024, 7, 16)),
            ship_via: 3,
            freight: 32.38,
            ship_name: s("Vins et alcools Chevalier"),
            ship_city: s("Reims"),
            ship_region: None,
            ship_postal_code: Some(s("51100")),
            ship_country: s("France"),
            customer_id: 1,
            employee_id: 2,
            details: vec![
                detail(1, 1, 14.0, 12, 0.0),
                detail(1, 2, 9.75, 10, 0.0),
                detail(1, 6, 34.5, 5, 0.15),
            ],
        },
        Order {
            id: 2,
            order_date: date(2024, 7, 5),
            required_date: date(2024, 8, 16),
            shipped_date: None,
            ship_via: 1,
            freight: 11.61,
            ship_name: s("Toms Spezialitäten"),
            ship_city: s("Münster"),
            ship_region: None,
            ship_postal_code: Some(s("44087")),
            ship_country: s("Germany"),
            customer_id: 2,
            employee_id: 3,
            details: vec![detail(2, 4, 18.0, 9, 0.0), detail(2, 5, 17.0, 40, 0.05)],
        },
        Order {
            id: 3,
            order_date: date(2024, 7, 8),
            required_date: date(2024, 8, 5),
            shipped_date: None,
            ship_via: 2,
            freight: 41.34,
            ship_name: s("Hanari Carnes"),
            ship_city: s("Rio de Janeiro"),
            ship_region: Some(s("RJ")),
            ship_postal_code: Some(s("05454-876")),
            ship_country: s("Brazil"),
            customer_id: 3,
            employee_id: 4,
            details: Vec::new(),
        },
    ]
}

/// Insert the demonstration dataset. Existing rows with the same ids are left
/// untouched, so loading twice is harmless.
pub async fn load_seed_data(pool: &PgPool) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to start seed transaction")?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(SEED_LOCK_KEY)
        .execute(&mut *tx)
        .await
        .context("Failed to take seed lock")?;

    for supplier in suppliers() {
        sqlx::query(
            r#"
            INSERT INTO suppliers (id, company_name, contact_name, contact_title, address, city, region, postal_code, country, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(supplier.id)
        .bind(&supplier.company_name)
        .bind(&supplier.contact_name)
        .bind(&supplier.contact_title)
        .bind(&supplier.address)
        .bind(&supplier.city)
        .bind(&supplier.region)
        .bind(&supplier.postal_code)
        .bind(&supplier.country)
        .bind(&supplier.phone)
        .execute(&mut *tx)
        .await
        .context("Failed to seed suppliers")?;
    }

    for customer in customers() {
        sqlx::query(
            r#"
            INSERT INTO customers (id, company_name, contact_name, contact_title, address, city, postal_code, region, country, phone, fax)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(customer.id)
        .bind(&customer.company_name)
        .bind(&customer.contact_name)
        .bind(&customer.contact_title)
        .bind(&customer.address)
        .bind(&customer.city)
        .bind(&customer.postal_code)
        .bind(&customer.region)
        .bind(&customer.country)
        .bind(&customer.phone)
        .bind(&customer.fax)
        .execute(&mut *tx)
        .await
        .context("Failed to seed customers")?;
    }

    // ids ascend along the reports-to chain, so recipients exist before use
    for employee in employees() {
        sqlx::query(
            r#"
            INSERT INTO employees (id, last_name, first_name, title, title_of_courtesy, birth_date, hire_date,
                                   address, city, postal_code, country, home_phone, extension, notes, recipient_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(employee.id)
        .bind(&employee.last_name)
        .bind(&employee.first_name)
        .bind(&employee.title)
        .bind(&employee.title_of_courtesy)
        .bind(employee.birth_date)
        .bind(employee.hire_date)
        .bind(&employee.address)
        .bind(&employee.city)
        .bind(&employee.postal_code)
        .bind(&employee.country)
        .bind(&employee.home_phone)
        .bind(employee.extension)
        .bind(&employee.notes)
        .bind(employee.recipient_id)
        .execute(&mut *tx)
        .await
        .context("Failed to seed employees")?;
    }

    for product in products() {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, qt_per_unit, unit_price, units_in_stock, units_on_order, reorder_level, discontinued, supplier_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.quantity_per_unit)
        .bind(product.unit_price)
        .bind(product.units_in_stock)
        .bind(product.units_on_order)
        .bind(product.reorder_level)
        .bind(product.discontinued)
        .bind(product.supplier_id)
        .execute(&mut *tx)
        .await
        .context("Failed to seed products")?;
    }

    for order in orders() {
        let inserted = sqlx::query(
            r#"
            INSERT INTO orders (id, order_date, required_date, shipped_date, ship_via, freight, ship_name, ship_city,
                                ship_region, ship_postal_code, ship_country, customer_id, employee_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(order.id)
        .bind(order.order_date)
        .bind(order.required_date)
        .bind(order.shipped_date)
        .bind(order.ship_via)
        .bind(order.freight)
        .bind(&order.ship_name)
        .bind(&order.ship_city)
        .bind(&order.ship_region)
        .bind(&order.ship_postal_code)
        .bind(&order.ship_country)
        .bind(order.customer_id)
        .bind(order.employee_id)
        .execute(&mut *tx)
        .await
        .context("Failed to seed orders")?;

        // order_details has no key to conflict on; only fill new orders
        if inserted.rows_affected() == 0 {
            continue;
        }

        for detail in &order.details {
            sqlx::query(
                r#"
                INSERT INTO order_details (unit_price, quantity, discount, order_id, product_id)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(detail.unit_price)
            .bind(detail.quantity)
            .bind(detail.discount)
            .bind(detail.order_id)
            .bind(detail.product_id)
            .execute(&mut *tx)
            .await
            .context("Failed to seed order details")?;
        }
    }

    for table in ["suppliers", "customers", "employees", "products", "orders"] {
        sqlx::query(&format!(
            "SELECT setval(pg_get_serial_sequence('{table}', 'id'), (SELECT MAX(id) FROM {table}))"
        ))
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to advance {} id sequence", table))?;
    }

    tx.commit().await.context("Failed to commit seed data")?;
    log::info!("Seed data loaded");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique_and_ascending() {
        let ids: Vec<Id> = customers().iter().map(|c| c.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));

        let ids: Vec<Id> = products().iter().map(|p| p.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_foreign_keys_resolve() {
        let supplier_ids: HashSet<Id> = suppliers().iter().map(|s| s.id).collect();
        assert!(products().iter().all(|p| supplier_ids.contains(&p.supplier_id)));

        let employee_ids: HashSet<Id> = employees().iter().map(|e| e.id).collect();
        assert!(employees()
            .iter()
            .filter_map(|e| e.recipient_id)
            .all(|id| employee_ids.contains(&id)));

        let product_ids: HashSet<Id> = products().iter().map(|p| p.id).collect();
        assert!(orders()
            .iter()
            .flat_map(|o| o.details.iter())
            .all(|d| product_ids.contains(&d.product_id)));
    }

    #[test]
    fn test_recipients_precede_their_reports() {
        for employee in employees() {
            if let Some(recipient_id) = employee.recipient_id {
                assert!(recipient_id < employee.id);
            }
        }
    }

    #[test]
    fn test_dataset_has_an_order_without_items() {
        assert!(orders().iter().any(|o| o.details.is_empty()));
    }
}
