pub mod categories;
pub mod customers;
pub mod orders;
pub mod products;

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::Value;
use utoipa::IntoParams;

use crate::domain::errors::Violations;
use crate::domain::pricing::PRICE_SCALE;

const MAX_PAGE_SIZE: i64 = 100;

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

pub(crate) fn default_page() -> i64 {
    1
}

pub(crate) fn default_limit() -> i64 {
    20
}

/// Clamps raw query values to `page >= 1` and `1 <= limit <= 100`.
pub(crate) fn page_bounds(page: i64, limit: i64) -> (i64, i64) {
    (page.max(1), limit.clamp(1, MAX_PAGE_SIZE))
}

// ── Money ────────────────────────────────────────────────────────────────────

/// Prices travel as decimal strings ("19.99") so no float rounding is involved.
pub(crate) fn parse_decimal(v: &mut Violations, field: &str, raw: &str) -> Option<BigDecimal> {
    match BigDecimal::from_str(raw.trim()) {
        Ok(value) => Some(value),
        Err(_) => {
            v.push(field, format!("'{raw}' is not a decimal number"));
            None
        }
    }
}

/// Accepts a decimal string or a JSON number. Numbers go through their JSON
/// text, so `19.99` parses as exactly 19.99.
pub(crate) fn parse_decimal_json(v: &mut Violations, field: &str, raw: &Value) -> Option<BigDecimal> {
    match raw {
        Value::String(s) => parse_decimal(v, field, s),
        Value::Number(n) => parse_decimal(v, field, &n.to_string()),
        other => {
            v.push(field, format!("expected a decimal string or number, got {other}"));
            None
        }
    }
}

pub(crate) fn money(value: &BigDecimal) -> String {
    value.with_scale(PRICE_SCALE).to_string()
}
