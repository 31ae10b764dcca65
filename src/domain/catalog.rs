use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use super::errors::{DomainError, Violations};
use super::pricing::check_price;

const MAX_NAME_LEN: usize = 255;
const MAX_PHONE_LEN: usize = 50;

fn check_name(v: &mut Violations, field: &str, name: &str) {
    if name.trim().is_empty() {
        v.push(field, "must not be blank");
    } else if name.chars().count() > MAX_NAME_LEN {
        v.push(field, "must be at most 255 characters");
    }
}

fn check_stock(v: &mut Violations, field: &str, quantity: i32) {
    if quantity < 0 {
        v.push(field, "must not be negative");
    }
}

// ── Products ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub quantity: i32,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: BigDecimal,
    pub quantity: i32,
    pub is_active: bool,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut v = Violations::new();
        check_name(&mut v, "name", &self.name);
        check_price(&mut v, "price", &self.price);
        check_stock(&mut v, "quantity", self.quantity);
        v.into_result()
    }
}

/// Partial update of a product. Stock is changed through its own operation.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<BigDecimal>,
    pub is_active: Option<bool>,
}

impl ProductChanges {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut v = Violations::new();
        if self.name.is_none() && self.price.is_none() && self.is_active.is_none() {
            v.push("body", "at least one of name, price or is_active is required");
        }
        if let Some(name) = &self.name {
            check_name(&mut v, "name", name);
        }
        if let Some(price) = &self.price {
            check_price(&mut v, "price", price);
        }
        v.into_result()
    }
}

pub fn validate_stock_level(quantity: i32) -> Result<(), DomainError> {
    let mut v = Violations::new();
    check_stock(&mut v, "quantity", quantity);
    v.into_result()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProductFilter {
    pub category_id: Option<i32>,
}

// ── Categories ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

impl NewCategory {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut v = Violations::new();
        check_name(&mut v, "name", &self.name);
        v.into_result()
    }
}

// ── Customers ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl NewCustomer {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut v = Violations::new();
        check_name(&mut v, "name", &self.name);

        let email = self.email.trim();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !well_formed {
            v.push("email", "must be a valid email address");
        } else if email.len() > MAX_NAME_LEN {
            v.push("email", "must be at most 255 characters");
        }

        if let Some(phone) = &self.phone {
            if phone.len() > MAX_PHONE_LEN {
                v.push("phone", "must be at most 50 characters");
            }
        }
        v.into_result()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

impl CustomerChanges {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut v = Violations::new();
        if self.name.is_none() && self.phone.is_none() && self.is_active.is_none() {
            v.push("body", "at least one of name, phone or is_active is required");
        }
        if let Some(name) = &self.name {
            check_name(&mut v, "name", name);
        }
        if let Some(phone) = &self.phone {
            if phone.len() > MAX_PHONE_LEN {
                v.push("phone", "must be at most 50 characters");
            }
        }
        v.into_result()
    }
}
