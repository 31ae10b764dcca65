use super::errors::{DomainError, Entity};
use super::ports::UnitOfWork;

/// Takes `requested` units of a product out of stock and returns the new level.
///
/// The product row is read with a lock held for the rest of the transaction,
/// so two placements against the same product serialise on it and the stock
/// can never drop below zero. Nothing is written when the check fails.
pub fn adjust_stock(
    uow: &mut dyn UnitOfWork,
    product_id: i32,
    requested: i32,
) -> Result<i32, DomainError> {
    let product = uow
        .get_product(product_id)?
        .ok_or_else(|| DomainError::not_found(Entity::Product, product_id))?;

    if product.quantity < requested {
        return Err(DomainError::InsufficientStock {
            product_id,
            requested,
            available: product.quantity,
        });
    }

    let updated = uow.update_product_quantity(product_id, product.quantity - requested)?;
    Ok(updated.quantity)
}
