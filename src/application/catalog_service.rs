use crate::domain::catalog::{
    validate_stock_level, Category, Customer, CustomerChanges, NewCategory, NewCustomer,
    NewProduct, Product, ProductChanges, ProductFilter,
};
use crate::domain::errors::{DomainError, Entity};
use crate::domain::order::ListResult;
use crate::domain::ports::CatalogRepository;

/// Product, category and customer management.
pub struct CatalogService<R> {
    repo: R,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_product(&self, product: NewProduct) -> Result<Product, DomainError> {
        product.validate()?;
        self.repo.create_product(product)
    }

    pub fn get_product(&self, id: i32) -> Result<Product, DomainError> {
        self.repo
            .find_product(id)?
            .ok_or_else(|| DomainError::not_found(Entity::Product, id))
    }

    pub fn list_products(
        &self,
        filter: ProductFilter,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<Product>, DomainError> {
        if let Some(category_id) = filter.category_id {
            self.repo
                .find_category(category_id)?
                .ok_or_else(|| DomainError::not_found(Entity::Category, category_id))?;
        }
        self.repo.list_products(filter, page, limit)
    }

    /// Name, price and active flag. Placed orders keep the price they were
    /// placed at.
    pub fn update_product(&self, id: i32, changes: ProductChanges) -> Result<Product, DomainError> {
        changes.validate()?;
        self.repo
            .update_product(id, changes)?
            .ok_or_else(|| DomainError::not_found(Entity::Product, id))
    }

    /// Overwrites the stock level (restock or stock-take).
    pub fn set_stock(&self, id: i32, quantity: i32) -> Result<Product, DomainError> {
        validate_stock_level(quantity)?;
        let product = self
            .repo
            .set_product_quantity(id, quantity)?
            .ok_or_else(|| DomainError::not_found(Entity::Product, id))?;
        log::info!("product {id} stock set to {quantity}");
        Ok(product)
    }

    pub fn create_category(&self, category: NewCategory) -> Result<Category, DomainError> {
        category.validate()?;
        self.repo.create_category(category)
    }

    pub fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        self.repo.list_categories()
    }

    pub fn assign_category(&self, product_id: i32, category_id: i32) -> Result<(), DomainError> {
        self.get_product(product_id)?;
        self.repo
            .find_category(category_id)?
            .ok_or_else(|| DomainError::not_found(Entity::Category, category_id))?;

        if self.repo.add_product_category(product_id, category_id)? {
            Ok(())
        } else {
            Err(DomainError::Conflict(format!(
                "product {product_id} is already in category {category_id}"
            )))
        }
    }

    pub fn create_customer(&self, customer: NewCustomer) -> Result<Customer, DomainError> {
        customer.validate()?;
        self.repo.create_customer(NewCustomer {
            email: customer.email.trim().to_lowercase(),
            ..customer
        })
    }

    pub fn get_customer(&self, id: i32) -> Result<Customer, DomainError> {
        self.repo
            .find_customer(id)?
            .ok_or_else(|| DomainError::not_found(Entity::Customer, id))
    }

    pub fn list_customers(&self, page: i64, limit: i64) -> Result<ListResult<Customer>, DomainError> {
        self.repo.list_customers(page, limit)
    }

    pub fn update_customer(
        &self,
        id: i32,
        changes: CustomerChanges,
    ) -> Result<Customer, DomainError> {
        changes.validate()?;
        self.repo
            .update_customer(id, changes)?
            .ok_or_else(|| DomainError::not_found(Entity::Customer, id))
    }
}
