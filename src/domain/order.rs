use std::collections::HashSet;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use super::errors::{DomainError, Violations};
use super::pricing::check_price;

pub const DEFAULT_ACTOR: &str = "system";
const MAX_ACTOR_LEN: usize = 255;

/// Field path for a line item, matching the request body's `orderDetails` array.
pub(crate) fn line_field(idx: usize, name: &str) -> String {
    format!("orderDetails[{idx}].{name}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

/// A request to place an order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub customer_id: i32,
    pub lines: Vec<LineItem>,
    /// Recorded in the order's `created_by` audit field.
    pub placed_by: String,
}

impl PlaceOrder {
    /// Checks the request shape without touching storage.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut v = Violations::new();

        if self.customer_id <= 0 {
            v.push("customer_id", "must be a positive integer");
        }
        if self.placed_by.trim().is_empty() {
            v.push("placed_by", "must not be blank");
        } else if self.placed_by.len() > MAX_ACTOR_LEN {
            v.push("placed_by", "must be at most 255 characters");
        }
        if self.lines.is_empty() {
            v.push("orderDetails", "must contain at least one item");
        }

        let mut seen = HashSet::new();
        for (idx, line) in self.lines.iter().enumerate() {
            if line.product_id <= 0 {
                v.push(line_field(idx, "product_id"), "must be a positive integer");
            } else if !seen.insert(line.product_id) {
                v.push(
                    line_field(idx, "product_id"),
                    format!("product {} appears more than once", line.product_id),
                );
            }
            if line.quantity <= 0 {
                v.push(line_field(idx, "quantity"), "must be greater than 0");
            }
            check_price(&mut v, &line_field(idx, "price_per_unit"), &line.unit_price);
        }

        v.into_result()
    }
}

/// Order header plus details as handed to the persistence gateway.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: i32,
    pub total_price: BigDecimal,
    pub created_by: String,
    pub lines: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineView {
    pub id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderView {
    pub id: i32,
    pub customer_id: i32,
    pub order_date: DateTime<Utc>,
    pub total_price: BigDecimal,
    pub created_by: String,
    pub lines: Vec<OrderLineView>,
}

#[derive(Debug, Clone)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total: i64,
}
