use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::application::CatalogService;
use crate::domain::catalog::{NewProduct, Product, ProductChanges, ProductFilter};
use crate::domain::errors::{DomainError, Violations};
use crate::errors::AppError;
use crate::infrastructure::DieselGateway;

use super::{default_limit, default_page, money, page_bounds, parse_decimal};

pub type Catalog = web::Data<CatalogService<DieselGateway>>;

// ── Request / response DTOs ──────────────────────────────────────────────────

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    /// Decimal price as a string, e.g. "19.99"
    pub price: String,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl CreateProductRequest {
    fn into_domain(self) -> Result<NewProduct, DomainError> {
        let mut v = Violations::new();
        let price = parse_decimal(&mut v, "price", &self.price);
        v.into_result()?;
        Ok(NewProduct {
            name: self.name.trim().to_string(),
            price: price.unwrap_or_default(),
            quantity: self.quantity,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    /// Decimal price as a string. Existing orders keep their original price.
    pub price: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateProductRequest {
    fn into_domain(self) -> Result<ProductChanges, DomainError> {
        let mut v = Violations::new();
        let price = self
            .price
            .as_deref()
            .and_then(|raw| parse_decimal(&mut v, "price", raw));
        v.into_result()?;
        Ok(ProductChanges {
            name: self.name.map(|n| n.trim().to_string()),
            price,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStockRequest {
    pub quantity: i32,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListProductsParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Only products assigned to this category.
    pub category_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub product_id: i32,
    pub name: String,
    pub price: String,
    pub quantity: i32,
    pub is_active: bool,
    pub updated_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            product_id: p.id,
            name: p.name,
            price: money(&p.price),
            quantity: p.quantity,
            is_active: p.is_active,
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListProductsResponse {
    pub items: Vec<ProductResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid request"),
    ),
    tag = "products"
)]
pub async fn create_product(
    service: Catalog,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let product = body.into_inner().into_domain()?;
    let created = web::block(move || service.create_product(product)).await??;
    Ok(HttpResponse::Created().json(ProductResponse::from(created)))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(service: Catalog, path: web::Path<i32>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let product = web::block(move || service.get_product(id)).await??;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

#[utoipa::path(
    get,
    path = "/products",
    params(ListProductsParams),
    responses(
        (status = 200, description = "Paginated list of products", body = ListProductsResponse),
        (status = 404, description = "Category not found"),
    ),
    tag = "products"
)]
pub async fn list_products(
    service: Catalog,
    query: web::Query<ListProductsParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let (page, limit) = page_bounds(params.page, params.limit);
    let filter = ProductFilter {
        category_id: params.category_id,
    };

    let result = web::block(move || service.list_products(filter, page, limit)).await??;

    Ok(HttpResponse::Ok().json(ListProductsResponse {
        items: result.items.into_iter().map(ProductResponse::from).collect(),
        total: result.total,
        page,
        limit,
    }))
}

#[utoipa::path(
    patch,
    path = "/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn update_product(
    service: Catalog,
    path: web::Path<i32>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let changes = body.into_inner().into_domain()?;
    let product = web::block(move || service.update_product(id, changes)).await??;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// PUT /products/{id}/stock
///
/// Overwrites the quantity on hand, e.g. after a delivery or a stock-take.
#[utoipa::path(
    put,
    path = "/products/{id}/stock",
    params(("id" = i32, Path, description = "Product id")),
    request_body = SetStockRequest,
    responses(
        (status = 200, description = "Stock level set", body = ProductResponse),
        (status = 400, description = "Negative quantity"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn set_stock(
    service: Catalog,
    path: web::Path<i32>,
    body: web::Json<SetStockRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let quantity = body.quantity;
    let product = web::block(move || service.set_stock(id, quantity)).await??;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

#[utoipa::path(
    post,
    path = "/products/{id}/categories/{category_id}",
    params(
        ("id" = i32, Path, description = "Product id"),
        ("category_id" = i32, Path, description = "Category id"),
    ),
    responses(
        (status = 204, description = "Product assigned to category"),
        (status = 404, description = "Product or category not found"),
        (status = 409, description = "Already assigned"),
    ),
    tag = "products"
)]
pub async fn assign_category(
    service: Catalog,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, AppError> {
    let (product_id, category_id) = path.into_inner();
    web::block(move || service.assign_category(product_id, category_id)).await??;
    Ok(HttpResponse::NoContent().finish())
}
