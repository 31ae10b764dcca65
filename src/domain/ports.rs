use super::catalog::{
    Category, Customer, CustomerChanges, NewCategory, NewCustomer, NewProduct, Product,
    ProductChanges, ProductFilter,
};
use super::errors::DomainError;
use super::order::{ListResult, NewOrder, OrderView};

/// Operations available inside an open transaction.
///
/// Everything written through a unit of work is committed or rolled back
/// together by [`OrderGateway::transaction`].
pub trait UnitOfWork {
    fn get_customer(&mut self, id: i32) -> Result<Option<Customer>, DomainError>;

    /// Reads a product and locks its row until the transaction ends.
    fn get_product(&mut self, id: i32) -> Result<Option<Product>, DomainError>;

    fn update_product_quantity(&mut self, id: i32, quantity: i32)
        -> Result<Product, DomainError>;

    fn create_order_with_details(&mut self, order: NewOrder) -> Result<OrderView, DomainError>;
}

pub trait OrderGateway: Send + Sync + 'static {
    /// Runs `f` in a single transaction: commit on `Ok`, roll back on `Err`.
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, DomainError>;

    fn find_order(&self, id: i32) -> Result<Option<OrderView>, DomainError>;

    /// Orders newest first, without their lines.
    fn list_orders(&self, page: i64, limit: i64) -> Result<ListResult<OrderView>, DomainError>;
}

pub trait CatalogRepository: Send + Sync + 'static {
    fn create_product(&self, product: NewProduct) -> Result<Product, DomainError>;
    fn find_product(&self, id: i32) -> Result<Option<Product>, DomainError>;
    fn list_products(
        &self,
        filter: ProductFilter,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<Product>, DomainError>;
    fn update_product(
        &self,
        id: i32,
        changes: ProductChanges,
    ) -> Result<Option<Product>, DomainError>;
    fn set_product_quantity(&self, id: i32, quantity: i32)
        -> Result<Option<Product>, DomainError>;

    fn create_category(&self, category: NewCategory) -> Result<Category, DomainError>;
    fn find_category(&self, id: i32) -> Result<Option<Category>, DomainError>;
    fn list_categories(&self) -> Result<Vec<Category>, DomainError>;
    /// Returns `false` when the product already belongs to the category.
    fn add_product_category(&self, product_id: i32, category_id: i32)
        -> Result<bool, DomainError>;

    fn create_customer(&self, customer: NewCustomer) -> Result<Customer, DomainError>;
    fn find_customer(&self, id: i32) -> Result<Option<Customer>, DomainError>;
    fn list_customers(&self, page: i64, limit: i64) -> Result<ListResult<Customer>, DomainError>;
    fn update_customer(
        &self,
        id: i32,
        changes: CustomerChanges,
    ) -> Result<Option<Customer>, DomainError>;
}
