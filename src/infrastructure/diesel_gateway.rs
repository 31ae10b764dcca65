use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;

use crate::db::{DbConnection, DbPool};
use crate::domain::catalog::{
    Category, Customer, CustomerChanges, NewCategory, NewCustomer, NewProduct, Product,
    ProductChanges, ProductFilter,
};
use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, NewOrder, OrderLineView, OrderView};
use crate::domain::ports::{CatalogRepository, OrderGateway, UnitOfWork};
use crate::schema::{categories, customers, order_details, orders, product_categories, products};

use super::models::{
    CategoryRow, CustomerChangeset, CustomerRow, NewCategoryRow, NewCustomerRow,
    NewOrderDetailRow, NewOrderRow, NewProductRow, OrderDetailRow, OrderRow, ProductCategoryRow,
    ProductChangeset, ProductRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::DatabaseError(
                kind @ (DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::CheckViolation),
                info,
            ) => {
                log::debug!("constraint violation ({kind:?}): {}", info.message());
                DomainError::Conflict(info.message().to_string())
            }
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

/// Rows to skip for a 1-based page. Saturates so an absurd page is just empty.
fn offset_of(page: i64, limit: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(limit)
}

fn order_view(order: OrderRow, lines: Vec<OrderDetailRow>) -> OrderView {
    OrderView {
        id: order.order_id,
        customer_id: order.customer_id,
        order_date: order.order_date,
        total_price: order.total_price,
        created_by: order.created_by,
        lines: lines.into_iter().map(OrderLineView::from).collect(),
    }
}

// ── Unit of work ──────────────────────────────────────────────────────────────

struct DieselUnitOfWork<'a> {
    conn: &'a mut DbConnection,
}

impl UnitOfWork for DieselUnitOfWork<'_> {
    fn get_customer(&mut self, id: i32) -> Result<Option<Customer>, DomainError> {
        let row = customers::table
            .find(id)
            .select(CustomerRow::as_select())
            .first(self.conn)
            .optional()?;
        Ok(row.map(Customer::from))
    }

    fn get_product(&mut self, id: i32) -> Result<Option<Product>, DomainError> {
        // FOR UPDATE: concurrent placements on the same product wait here until
        // this transaction commits or rolls back, then see the new quantity.
        let row = products::table
            .find(id)
            .select(ProductRow::as_select())
            .for_update()
            .first(self.conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn update_product_quantity(
        &mut self,
        id: i32,
        quantity: i32,
    ) -> Result<Product, DomainError> {
        let row = diesel::update(products::table.find(id))
            .set((
                products::quantity.eq(quantity),
                products::updated_at.eq(Utc::now()),
            ))
            .returning(ProductRow::as_returning())
            .get_result(self.conn)?;
        Ok(row.into())
    }

    fn create_order_with_details(&mut self, order: NewOrder) -> Result<OrderView, DomainError> {
        let header = diesel::insert_into(orders::table)
            .values(&NewOrderRow {
                customer_id: order.customer_id,
                total_price: order.total_price,
                created_by: order.created_by,
            })
            .returning(OrderRow::as_returning())
            .get_result(self.conn)?;

        let details: Vec<NewOrderDetailRow> = order
            .lines
            .into_iter()
            .map(|l| NewOrderDetailRow {
                order_id: header.order_id,
                product_id: l.product_id,
                quantity: l.quantity,
                price_per_unit: l.unit_price,
            })
            .collect();
        let lines = diesel::insert_into(order_details::table)
            .values(&details)
            .returning(OrderDetailRow::as_returning())
            .get_results(self.conn)?;

        Ok(order_view(header, lines))
    }
}

// ── Gateway ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DieselGateway {
    pool: DbPool,
}

impl DieselGateway {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderGateway for DieselGateway {
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, DomainError>,
    {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| f(&mut DieselUnitOfWork { conn }))
    }

    fn find_order(&self, id: i32) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines = OrderDetailRow::belonging_to(&order)
            .select(OrderDetailRow::as_select())
            .order(order_details::order_detail_id.asc())
            .load(&mut conn)?;

        Ok(Some(order_view(order, lines)))
    }

    fn list_orders(&self, page: i64, limit: i64) -> Result<ListResult<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders::table.count().get_result(conn)?;

            let rows = orders::table
                .select(OrderRow::as_select())
                .order((orders::order_date.desc(), orders::order_id.desc()))
                .limit(limit)
                .offset(offset_of(page, limit))
                .load(conn)?;

            Ok(ListResult {
                items: rows.into_iter().map(|o| order_view(o, vec![])).collect(),
                total,
            })
        })
    }
}

impl CatalogRepository for DieselGateway {
    fn create_product(&self, product: NewProduct) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(products::table)
            .values(&NewProductRow {
                name: product.name,
                price: product.price,
                quantity: product.quantity,
                is_active: product.is_active,
            })
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn find_product(&self, id: i32) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn list_products(
        &self,
        filter: ProductFilter,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let filtered = || {
            let mut query = products::table.into_boxed::<Pg>();
            if let Some(category_id) = filter.category_id {
                query = query.filter(
                    products::product_id.eq_any(
                        product_categories::table
                            .filter(product_categories::category_id.eq(category_id))
                            .select(product_categories::product_id),
                    ),
                );
            }
            query
        };

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = filtered().count().get_result(conn)?;
            let rows = filtered()
                .select(ProductRow::as_select())
                .order(products::product_id.asc())
                .limit(limit)
                .offset(offset_of(page, limit))
                .load(conn)?;
            Ok(ListResult {
                items: rows.into_iter().map(Product::from).collect(),
                total,
            })
        })
    }

    fn update_product(
        &self,
        id: i32,
        changes: ProductChanges,
    ) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(products::table.find(id))
            .set(&ProductChangeset {
                name: changes.name,
                price: changes.price,
                is_active: changes.is_active,
                updated_at: Utc::now(),
            })
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn set_product_quantity(
        &self,
        id: i32,
        quantity: i32,
    ) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(products::table.find(id))
            .set((
                products::quantity.eq(quantity),
                products::updated_at.eq(Utc::now()),
            ))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn create_category(&self, category: NewCategory) -> Result<Category, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(categories::table)
            .values(&NewCategoryRow {
                name: category.name,
                description: category.description,
            })
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn find_category(&self, id: i32) -> Result<Option<Category>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = categories::table
            .find(id)
            .select(CategoryRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Category::from))
    }

    fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = categories::table
            .select(CategoryRow::as_select())
            .order(categories::name.asc())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    fn add_product_category(
        &self,
        product_id: i32,
        category_id: i32,
    ) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let inserted = diesel::insert_into(product_categories::table)
            .values(&ProductCategoryRow {
                product_id,
                category_id,
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)?;
        Ok(inserted == 1)
    }

    fn create_customer(&self, customer: NewCustomer) -> Result<Customer, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(customers::table)
            .values(&NewCustomerRow {
                name: customer.name,
                email: customer.email,
                phone: customer.phone,
            })
            .returning(CustomerRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn find_customer(&self, id: i32) -> Result<Option<Customer>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = customers::table
            .find(id)
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Customer::from))
    }

    fn list_customers(&self, page: i64, limit: i64) -> Result<ListResult<Customer>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = customers::table.count().get_result(conn)?;
            let rows = customers::table
                .select(CustomerRow::as_select())
                .order(customers::customer_id.asc())
                .limit(limit)
                .offset(offset_of(page, limit))
                .load(conn)?;
            Ok(ListResult {
                items: rows.into_iter().map(Customer::from).collect(),
                total,
            })
        })
    }

    fn update_customer(
        &self,
        id: i32,
        changes: CustomerChanges,
    ) -> Result<Option<Customer>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(customers::table.find(id))
            .set(&CustomerChangeset {
                name: changes.name,
                phone: changes.phone,
                is_active: changes.is_active,
                updated_at: Utc::now(),
            })
            .returning(CustomerRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Customer::from))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::time::Duration;

    use bigdecimal::BigDecimal;
    use diesel::prelude::*;

    use super::DieselGateway;
    use crate::domain::catalog::{NewCategory, NewCustomer, NewProduct, ProductFilter};
    use crate::domain::errors::DomainError;
    use crate::domain::inventory::adjust_stock;
    use crate::domain::order::{LineItem, NewOrder};
    use crate::domain::ports::{CatalogRepository, OrderGateway};
    use crate::infrastructure::test_db::{setup_db, setup_db_with};
    use crate::schema::products;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn seed(repo: &DieselGateway, stock: i32) -> (i32, i32) {
        let customer = repo
            .create_customer(NewCustomer {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
            })
            .expect("customer");
        let product = repo
            .create_product(NewProduct {
                name: "Widget".to_string(),
                price: dec("9.99"),
                quantity: stock,
                is_active: true,
            })
            .expect("product");
        (customer.id, product.id)
    }

    #[tokio::test]
    async fn create_and_find_order_roundtrip() {
        let (_container, pool) = setup_db().await;
        let repo = DieselGateway::new(pool);
        let (customer_id, product_id) = seed(&repo, 5);

        let created = repo
            .transaction(|uow| {
                uow.create_order_with_details(NewOrder {
                    customer_id,
                    total_price: dec("19.98"),
                    created_by: "system".to_string(),
                    lines: vec![LineItem {
                        product_id,
                        quantity: 2,
                        unit_price: dec("9.99"),
                    }],
                })
            })
            .expect("create failed");

        let found = repo
            .find_order(created.id)
            .expect("find failed")
            .expect("order should exist");

        assert_eq!(found, created);
        assert_eq!(found.lines.len(), 1);
        assert_eq!(found.lines[0].unit_price, dec("9.99"));
    }

    #[tokio::test]
    async fn rolled_back_transaction_leaves_no_trace() {
        let (_container, pool) = setup_db().await;
        let repo = DieselGateway::new(pool);
        let (_, product_id) = seed(&repo, 5);

        let result: Result<(), DomainError> = repo.transaction(|uow| {
            uow.update_product_quantity(product_id, 0)?;
            Err(DomainError::Conflict("abort".to_string()))
        });

        assert!(result.is_err());
        let product = repo.find_product(product_id).expect("find").expect("exists");
        assert_eq!(product.quantity, 5);
    }

    #[tokio::test]
    async fn negative_stock_is_rejected_by_the_database() {
        let (_container, pool) = setup_db().await;
        let repo = DieselGateway::new(pool);
        let (_, product_id) = seed(&repo, 1);

        let err = repo
            .transaction(|uow| uow.update_product_quantity(product_id, -1))
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn statement_timeout_rolls_back_earlier_stock_writes() {
        let (_container, pool) = setup_db_with(|config| {
            config.statement_timeout = Some(Duration::from_millis(300));
        })
        .await;
        let repo = DieselGateway::new(pool.clone());
        let (_, first) = seed(&repo, 5);
        let second = repo
            .create_product(NewProduct {
                name: "Gadget".to_string(),
                price: dec("2.00"),
                quantity: 5,
                is_active: true,
            })
            .expect("product")
            .id;

        // Another session holds the second product's row lock, so the
        // placement's locking read waits until its statement times out.
        let mut holder = pool.get().expect("connection");
        let result = holder
            .transaction::<_, diesel::result::Error, _>(|holder| {
                products::table
                    .find(second)
                    .select(products::product_id)
                    .for_update()
                    .first::<i32>(holder)?;
                Ok(repo.transaction(|uow| {
                    adjust_stock(uow, first, 1)?;
                    adjust_stock(uow, second, 1)
                }))
            })
            .expect("lock holder transaction");

        assert!(matches!(result, Err(DomainError::Internal(_))), "got {result:?}");
        let stock = |id| repo.find_product(id).expect("find").expect("exists").quantity;
        assert_eq!(stock(first), 5);
        assert_eq!(stock(second), 5);
    }

    #[tokio::test]
    async fn duplicate_customer_email_is_a_conflict() {
        let (_container, pool) = setup_db().await;
        let repo = DieselGateway::new(pool);
        seed(&repo, 1);

        let err = repo
            .create_customer(NewCustomer {
                name: "Ada again".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
            })
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn find_order_returns_none_for_unknown_id() {
        let (_container, pool) = setup_db().await;
        let repo = DieselGateway::new(pool);

        assert!(repo.find_order(999).expect("find should not error").is_none());
    }

    #[tokio::test]
    async fn list_products_filters_by_category() {
        let (_container, pool) = setup_db().await;
        let repo = DieselGateway::new(pool);
        let (_, widget) = seed(&repo, 1);
        repo.create_product(NewProduct {
            name: "Gadget".to_string(),
            price: dec("1.00"),
            quantity: 0,
            is_active: true,
        })
        .expect("product");
        let tools = repo
            .create_category(NewCategory {
                name: "Tools".to_string(),
                description: None,
            })
            .expect("category");

        assert!(repo.add_product_category(widget, tools.id).expect("assign"));
        assert!(!repo.add_product_category(widget, tools.id).expect("re-assign"));

        let all = repo
            .list_products(ProductFilter::default(), 1, 20)
            .expect("list");
        assert_eq!(all.total, 2);

        let in_tools = repo
            .list_products(
                ProductFilter {
                    category_id: Some(tools.id),
                },
                1,
                20,
            )
            .expect("list");
        assert_eq!(in_tools.total, 1);
        assert_eq!(in_tools.items[0].id, widget);
    }

    #[test]
    fn offset_of_saturates_for_huge_pages() {
        assert_eq!(super::offset_of(1, 20), 0);
        assert_eq!(super::offset_of(3, 20), 40);
        assert_eq!(super::offset_of(i64::MAX, 20), i64::MAX);
    }

    #[tokio::test]
    async fn list_orders_past_the_last_page_is_empty() {
        let (_container, pool) = setup_db().await;
        let repo = DieselGateway::new(pool);
        let (customer_id, product_id) = seed(&repo, 5);
        repo.transaction(|uow| {
            uow.create_order_with_details(NewOrder {
                customer_id,
                total_price: dec("1.00"),
                created_by: "system".to_string(),
                lines: vec![LineItem {
                    product_id,
                    quantity: 1,
                    unit_price: dec("1.00"),
                }],
            })
        })
        .expect("create failed");

        let page = repo.list_orders(i64::MAX, 100).expect("list should not error");
        assert_eq!(page.total, 1);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn list_orders_paginates_correctly() {
        let (_container, pool) = setup_db().await;
        let repo = DieselGateway::new(pool);
        let (customer_id, product_id) = seed(&repo, 100);

        for _ in 0..5 {
            repo.transaction(|uow| {
                uow.create_order_with_details(NewOrder {
                    customer_id,
                    total_price: dec("1.00"),
                    created_by: "system".to_string(),
                    lines: vec![LineItem {
                        product_id,
                        quantity: 1,
                        unit_price: dec("1.00"),
                    }],
                })
            })
            .expect("create failed");
        }

        let page1 = repo.list_orders(1, 3).expect("list page 1 failed");
        assert_eq!(page1.total, 5);
        assert_eq!(page1.items.len(), 3);

        let page2 = repo.list_orders(2, 3).expect("list page 2 failed");
        assert_eq!(page2.total, 5);
        assert_eq!(page2.items.len(), 2);
    }
}
