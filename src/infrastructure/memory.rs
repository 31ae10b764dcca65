use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use crate::domain::catalog::{
    Category, Customer, CustomerChanges, NewCategory, NewCustomer, NewProduct, Product,
    ProductChanges, ProductFilter,
};
use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, NewOrder, OrderLineView, OrderView};
use crate::domain::ports::{CatalogRepository, OrderGateway, UnitOfWork};

#[derive(Debug, Clone, Default)]
struct Sequences {
    customer: i32,
    product: i32,
    category: i32,
    order: i32,
    order_detail: i32,
}

fn next(seq: &mut i32) -> i32 {
    *seq += 1;
    *seq
}

#[derive(Debug, Clone, Default)]
struct State {
    seq: Sequences,
    customers: BTreeMap<i32, Customer>,
    products: BTreeMap<i32, Product>,
    categories: BTreeMap<i32, Category>,
    product_categories: BTreeSet<(i32, i32)>,
    orders: BTreeMap<i32, OrderView>,
}

fn page_of<T: Clone>(items: Vec<T>, page: i64, limit: i64) -> ListResult<T> {
    let total = items.len() as i64;
    let skip = usize::try_from((page.max(1) - 1).saturating_mul(limit)).unwrap_or(usize::MAX);
    let take = usize::try_from(limit.max(0)).unwrap_or(0);
    ListResult {
        items: items.into_iter().skip(skip).take(take).collect(),
        total,
    }
}

/// Process-local store with the same contract as the Postgres gateway.
///
/// A transaction holds the store lock for its whole duration and works on a
/// copy of the state, which replaces the shared state only when the closure
/// succeeds. Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<Mutex<State>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, DomainError> {
        self.state
            .lock()
            .map_err(|_| DomainError::Internal("in-memory store lock poisoned".to_string()))
    }
}

struct MemoryUnitOfWork<'a> {
    state: &'a mut State,
}

impl UnitOfWork for MemoryUnitOfWork<'_> {
    fn get_customer(&mut self, id: i32) -> Result<Option<Customer>, DomainError> {
        Ok(self.state.customers.get(&id).cloned())
    }

    fn get_product(&mut self, id: i32) -> Result<Option<Product>, DomainError> {
        Ok(self.state.products.get(&id).cloned())
    }

    fn update_product_quantity(
        &mut self,
        id: i32,
        quantity: i32,
    ) -> Result<Product, DomainError> {
        if quantity < 0 {
            return Err(DomainError::Conflict(format!(
                "product {id} quantity cannot be negative"
            )));
        }
        let product = self
            .state
            .products
            .get_mut(&id)
            .ok_or_else(|| DomainError::Internal(format!("product {id} vanished")))?;
        product.quantity = quantity;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    fn create_order_with_details(&mut self, order: NewOrder) -> Result<OrderView, DomainError> {
        if !self.state.customers.contains_key(&order.customer_id) {
            return Err(DomainError::Conflict(format!(
                "customer {} does not exist",
                order.customer_id
            )));
        }
        if let Some(line) = order
            .lines
            .iter()
            .find(|l| !self.state.products.contains_key(&l.product_id))
        {
            return Err(DomainError::Conflict(format!(
                "product {} does not exist",
                line.product_id
            )));
        }

        let id = next(&mut self.state.seq.order);
        let lines = order
            .lines
            .into_iter()
            .map(|l| OrderLineView {
                id: next(&mut self.state.seq.order_detail),
                product_id: l.product_id,
                quantity: l.quantity,
                unit_price: l.unit_price,
            })
            .collect();
        let view = OrderView {
            id,
            customer_id: order.customer_id,
            order_date: Utc::now(),
            total_price: order.total_price,
            created_by: order.created_by,
            lines,
        };
        self.state.orders.insert(id, view.clone());
        Ok(view)
    }
}

impl OrderGateway for InMemoryGateway {
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, DomainError>,
    {
        let mut state = self.lock()?;
        let mut working = state.clone();
        let out = f(&mut MemoryUnitOfWork {
            state: &mut working,
        })?;
        *state = working;
        Ok(out)
    }

    fn find_order(&self, id: i32) -> Result<Option<OrderView>, DomainError> {
        Ok(self.lock()?.orders.get(&id).cloned())
    }

    fn list_orders(&self, page: i64, limit: i64) -> Result<ListResult<OrderView>, DomainError> {
        let state = self.lock()?;
        let newest_first = state
            .orders
            .values()
            .rev()
            .map(|o| OrderView {
                lines: vec![],
                ..o.clone()
            })
            .collect();
        Ok(page_of(newest_first, page, limit))
    }
}

impl CatalogRepository for InMemoryGateway {
    fn create_product(&self, product: NewProduct) -> Result<Product, DomainError> {
        let mut state = self.lock()?;
        let id = next(&mut state.seq.product);
        let row = Product {
            id,
            name: product.name,
            price: product.price,
            quantity: product.quantity,
            is_active: product.is_active,
            updated_at: Utc::now(),
        };
        state.products.insert(id, row.clone());
        Ok(row)
    }

    fn find_product(&self, id: i32) -> Result<Option<Product>, DomainError> {
        Ok(self.lock()?.products.get(&id).cloned())
    }

    fn list_products(
        &self,
        filter: ProductFilter,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<Product>, DomainError> {
        let state = self.lock()?;
        let items = state
            .products
            .values()
            .filter(|p| match filter.category_id {
                Some(category_id) => state.product_categories.contains(&(p.id, category_id)),
                None => true,
            })
            .cloned()
            .collect();
        Ok(page_of(items, page, limit))
    }

    fn update_product(
        &self,
        id: i32,
        changes: ProductChanges,
    ) -> Result<Option<Product>, DomainError> {
        let mut state = self.lock()?;
        let Some(product) = state.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(is_active) = changes.is_active {
            product.is_active = is_active;
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    fn set_product_quantity(
        &self,
        id: i32,
        quantity: i32,
    ) -> Result<Option<Product>, DomainError> {
        let mut state = self.lock()?;
        if !state.products.contains_key(&id) {
            return Ok(None);
        }
        MemoryUnitOfWork { state: &mut *state }
            .update_product_quantity(id, quantity)
            .map(Some)
    }

    fn create_category(&self, category: NewCategory) -> Result<Category, DomainError> {
        let mut state = self.lock()?;
        if state.categories.values().any(|c| c.name == category.name) {
            return Err(DomainError::Conflict(format!(
                "category '{}' already exists",
                category.name
            )));
        }
        let id = next(&mut state.seq.category);
        let row = Category {
            id,
            name: category.name,
            description: category.description,
        };
        state.categories.insert(id, row.clone());
        Ok(row)
    }

    fn find_category(&self, id: i32) -> Result<Option<Category>, DomainError> {
        Ok(self.lock()?.categories.get(&id).cloned())
    }

    fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        let state = self.lock()?;
        let mut items: Vec<Category> = state.categories.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    fn add_product_category(
        &self,
        product_id: i32,
        category_id: i32,
    ) -> Result<bool, DomainError> {
        Ok(self
            .lock()?
            .product_categories
            .insert((product_id, category_id)))
    }

    fn create_customer(&self, customer: NewCustomer) -> Result<Customer, DomainError> {
        let mut state = self.lock()?;
        if state.customers.values().any(|c| c.email == customer.email) {
            return Err(DomainError::Conflict(format!(
                "customer with email '{}' already exists",
                customer.email
            )));
        }
        let id = next(&mut state.seq.customer);
        let row = Customer {
            id,
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
            is_active: true,
        };
        state.customers.insert(id, row.clone());
        Ok(row)
    }

    fn find_customer(&self, id: i32) -> Result<Option<Customer>, DomainError> {
        Ok(self.lock()?.customers.get(&id).cloned())
    }

    fn list_customers(&self, page: i64, limit: i64) -> Result<ListResult<Customer>, DomainError> {
        let state = self.lock()?;
        Ok(page_of(state.customers.values().cloned().collect(), page, limit))
    }

    fn update_customer(
        &self,
        id: i32,
        changes: CustomerChanges,
    ) -> Result<Option<Customer>, DomainError> {
        let mut state = self.lock()?;
        let Some(customer) = state.customers.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            customer.name = name;
        }
        if let Some(phone) = changes.phone {
            customer.phone = Some(phone);
        }
        if let Some(is_active) = changes.is_active {
            customer.is_active = is_active;
        }
        Ok(Some(customer.clone()))
    }
}

#[cfg(test)]
impl InMemoryGateway {
    pub(crate) fn seed_customer(&self, name: &str) -> i32 {
        self.create_customer(NewCustomer {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
        })
        .expect("seed customer")
        .id
    }

    pub(crate) fn seed_product(&self, name: &str, price: &str, quantity: i32) -> i32 {
        use std::str::FromStr;
        self.create_product(NewProduct {
            name: name.to_string(),
            price: bigdecimal::BigDecimal::from_str(price).expect("valid decimal"),
            quantity,
            is_active: true,
        })
        .expect("seed product")
        .id
    }

    pub(crate) fn stock_of(&self, product_id: i32) -> Option<i32> {
        self.state
            .lock()
            .expect("lock")
            .products
            .get(&product_id)
            .map(|p| p.quantity)
    }

    pub(crate) fn order_count(&self) -> usize {
        self.state.lock().expect("lock").orders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_transaction_discards_writes() {
        let store = InMemoryGateway::new();
        let product = store.seed_product("Widget", "2.50", 5);

        let result: Result<(), DomainError> = store.transaction(|uow| {
            uow.update_product_quantity(product, 1)?;
            Err(DomainError::Conflict("abort".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(store.stock_of(product), Some(5));
    }

    #[test]
    fn committed_transaction_is_visible() {
        let store = InMemoryGateway::new();
        let product = store.seed_product("Widget", "2.50", 5);

        store
            .transaction(|uow| uow.update_product_quantity(product, 4).map(|_| ()))
            .expect("commit");

        assert_eq!(store.stock_of(product), Some(4));
    }

    #[test]
    fn huge_page_number_yields_an_empty_page() {
        let store = InMemoryGateway::new();
        store.seed_customer("Ada");

        let page = store.list_customers(i64::MAX, 100).expect("list");
        assert_eq!(page.total, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn list_orders_paginates_newest_first() {
        let store = InMemoryGateway::new();
        let customer = store.seed_customer("Ada");
        let product = store.seed_product("Widget", "1.00", 10);

        for _ in 0..3 {
            store
                .transaction(|uow| {
                    uow.create_order_with_details(NewOrder {
                        customer_id: customer,
                        total_price: bigdecimal::BigDecimal::from(1),
                        created_by: "system".to_string(),
                        lines: vec![crate::domain::order::LineItem {
                            product_id: product,
                            quantity: 1,
                            unit_price: bigdecimal::BigDecimal::from(1),
                        }],
                    })
                })
                .expect("create");
        }

        let page = store.list_orders(1, 2).expect("list");
        assert_eq!(page.total, 3);
        assert_eq!(page.items.iter().map(|o| o.id).collect::<Vec<_>>(), vec![3, 2]);
        assert!(page.items.iter().all(|o| o.lines.is_empty()));
    }

    #[test]
    fn duplicate_customer_email_conflicts() {
        let store = InMemoryGateway::new();
        store.seed_customer("Ada");
        let err = store
            .create_customer(NewCustomer {
                name: "Other".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }
}
