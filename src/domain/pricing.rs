use bigdecimal::BigDecimal;

use super::errors::{DomainError, FieldError, Violations};
use super::order::{line_field, LineItem};

/// Money columns are `NUMERIC(12, 2)`.
pub const PRICE_SCALE: i64 = 2;

/// Largest amount a `NUMERIC(12, 2)` column holds: 9999999999.99.
pub fn max_amount() -> BigDecimal {
    BigDecimal::new(999_999_999_999i64.into(), PRICE_SCALE)
}

/// Records a violation unless `price` is positive, fits a money column and
/// has at most two fraction digits.
pub fn check_price(violations: &mut Violations, field: &str, price: &BigDecimal) {
    if *price <= BigDecimal::from(0) {
        violations.push(field, "must be greater than 0");
    } else if *price > max_amount() {
        violations.push(field, format!("must not exceed {}", max_amount()));
    } else if price.with_scale(PRICE_SCALE) != *price {
        violations.push(field, "must have at most 2 decimal places");
    }
}

/// Sum of `quantity * unit_price` over all lines, in decimal arithmetic.
///
/// Lines with a non-positive quantity or price are rejected rather than
/// folded into a wrong total, as is a total too large for a money column.
pub fn total_price(lines: &[LineItem]) -> Result<BigDecimal, DomainError> {
    let mut violations = Violations::new();
    for (idx, line) in lines.iter().enumerate() {
        if line.quantity <= 0 {
            violations.push(line_field(idx, "quantity"), "must be greater than 0");
        }
        if line.unit_price <= BigDecimal::from(0) {
            violations.push(line_field(idx, "price_per_unit"), "must be greater than 0");
        }
    }
    violations.into_result()?;

    let total = lines.iter().fold(BigDecimal::from(0), |acc, line| {
        acc + BigDecimal::from(line.quantity) * &line.unit_price
    });
    if total > max_amount() {
        return Err(DomainError::Validation(vec![FieldError::new(
            "orderDetails",
            format!("order total {total} exceeds {}", max_amount()),
        )]));
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn line(product_id: i32, quantity: i32, price: &str) -> LineItem {
        LineItem {
            product_id,
            quantity,
            unit_price: BigDecimal::from_str(price).expect("valid decimal"),
        }
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    #[test]
    fn total_uses_exact_decimal_arithmetic() {
        let total = total_price(&[line(1, 3, "19.99"), line(2, 2, "5.00")]).expect("total");
        assert_eq!(total, dec("69.97"));
    }

    #[test]
    fn single_line_total() {
        let total = total_price(&[line(10, 2, "100.00")]).expect("total");
        assert_eq!(total, dec("200.00"));
    }

    #[test]
    fn empty_lines_total_zero() {
        assert_eq!(total_price(&[]).expect("total"), BigDecimal::from(0));
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let err = total_price(&[line(1, 1, "1.00"), line(2, -1, "1.00")]).unwrap_err();
        match err {
            DomainError::Validation(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "orderDetails[1].quantity");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_price() {
        let err = total_price(&[line(1, 1, "0.00")]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref f) if f[0].field == "orderDetails[0].price_per_unit"));
    }

    #[test]
    fn check_price_rejects_sub_cent_values() {
        let mut v = Violations::new();
        check_price(&mut v, "price", &dec("1.005"));
        assert!(v.into_result().is_err());
    }

    #[test]
    fn check_price_rejects_amounts_beyond_money_column() {
        let mut v = Violations::new();
        check_price(&mut v, "price", &dec("123456789012.00"));
        let err = v.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: price: must not exceed 9999999999.99"
        );
    }

    #[test]
    fn check_price_accepts_largest_money_value() {
        let mut v = Violations::new();
        check_price(&mut v, "price", &dec("9999999999.99"));
        assert!(v.into_result().is_ok());
    }

    #[test]
    fn rejects_total_beyond_money_column() {
        let err = total_price(&[line(1, 2_000_000, "99999.99")]).unwrap_err();
        match err {
            DomainError::Validation(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "orderDetails");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn check_price_accepts_trailing_zeros() {
        let mut v = Violations::new();
        check_price(&mut v, "price", &dec("19.900"));
        check_price(&mut v, "price", &dec("7"));
        assert!(v.into_result().is_ok());
    }
}
