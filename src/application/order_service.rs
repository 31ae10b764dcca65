use crate::domain::errors::{DomainError, Entity};
use crate::domain::inventory::adjust_stock;
use crate::domain::order::{ListResult, NewOrder, OrderView, PlaceOrder};
use crate::domain::ports::OrderGateway;
use crate::domain::pricing::total_price;

pub struct OrderService<G> {
    gateway: G,
}

impl<G: OrderGateway> OrderService<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Places an order and takes its quantities out of stock.
    ///
    /// The customer check, every stock adjustment and the order insert run in
    /// one transaction. Any failure rolls all of it back, so a rejected
    /// placement leaves neither an order nor a changed stock level behind.
    pub fn place_order(&self, request: PlaceOrder) -> Result<OrderView, DomainError> {
        request.validate()?;
        let total = total_price(&request.lines)?;

        // Lock products in id order so two orders sharing products cannot deadlock.
        let mut lock_order: Vec<_> = request.lines.iter().collect();
        lock_order.sort_by_key(|line| line.product_id);

        let placed = self.gateway.transaction(|uow| {
            uow.get_customer(request.customer_id)?
                .ok_or_else(|| DomainError::not_found(Entity::Customer, request.customer_id))?;

            for line in &lock_order {
                let remaining = adjust_stock(uow, line.product_id, line.quantity)?;
                log::debug!(
                    "product {} stock reduced by {} to {}",
                    line.product_id,
                    line.quantity,
                    remaining
                );
            }

            uow.create_order_with_details(NewOrder {
                customer_id: request.customer_id,
                total_price: total.clone(),
                created_by: request.placed_by.clone(),
                lines: request.lines.clone(),
            })
        });

        match &placed {
            Ok(order) => log::info!(
                "order {} placed for customer {} ({} lines, total {})",
                order.id,
                order.customer_id,
                order.lines.len(),
                order.total_price
            ),
            Err(e @ DomainError::InsufficientStock { .. }) => {
                log::warn!("order for customer {} rejected: {e}", request.customer_id)
            }
            Err(_) => {}
        }
        placed
    }

    pub fn get_order(&self, id: i32) -> Result<Option<OrderView>, DomainError> {
        self.gateway.find_order(id)
    }

    pub fn list_orders(&self, page: i64, limit: i64) -> Result<ListResult<OrderView>, DomainError> {
        self.gateway.list_orders(page, limit)
    }
}
