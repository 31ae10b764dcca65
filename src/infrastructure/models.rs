use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::catalog::{Category, Customer, Product};
use crate::domain::order::OrderLineView;
use crate::schema::{categories, customers, order_details, orders, product_categories, products};

// ── Customers ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = customers)]
#[diesel(primary_key(customer_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerRow {
    pub customer_id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = customers)]
pub struct NewCustomerRow {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = customers)]
pub struct CustomerChangeset {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.customer_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            is_active: row.is_active,
        }
    }
}

// ── Categories ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = categories)]
#[diesel(primary_key(category_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CategoryRow {
    pub category_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = categories)]
pub struct NewCategoryRow {
    pub name: String,
    pub description: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.category_id,
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = product_categories)]
pub struct ProductCategoryRow {
    pub product_id: i32,
    pub category_id: i32,
}

// ── Products ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(primary_key(product_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub product_id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub name: String,
    pub price: BigDecimal,
    pub quantity: i32,
    pub is_active: bool,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = products)]
pub struct ProductChangeset {
    pub name: Option<String>,
    pub price: Option<BigDecimal>,
    pub is_active: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.product_id,
            name: row.name,
            price: row.price,
            quantity: row.quantity,
            is_active: row.is_active,
            updated_at: row.updated_at,
        }
    }
}

// ── Orders ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(primary_key(order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub order_id: i32,
    pub customer_id: i32,
    pub order_date: DateTime<Utc>,
    pub total_price: BigDecimal,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub modified_by: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub customer_id: i32,
    pub total_price: BigDecimal,
    pub created_by: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_details)]
#[diesel(primary_key(order_detail_id))]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderDetailRow {
    pub order_detail_id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub price_per_unit: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_details)]
pub struct NewOrderDetailRow {
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub price_per_unit: BigDecimal,
}

impl From<OrderDetailRow> for OrderLineView {
    fn from(row: OrderDetailRow) -> Self {
        OrderLineView {
            id: row.order_detail_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.price_per_unit,
        }
    }
}
