use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::catalog::{Category, NewCategory};
use crate::errors::AppError;

use super::products::Catalog;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub category_id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        CategoryResponse {
            category_id: c.id,
            name: c.name,
            description: c.description,
        }
    }
}

#[utoipa::path(
    post,
    path = "/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Name already taken"),
    ),
    tag = "categories"
)]
pub async fn create_category(
    service: Catalog,
    body: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let category = NewCategory {
        name: body.name.trim().to_string(),
        description: body.description,
    };
    let created = web::block(move || service.create_category(category)).await??;
    Ok(HttpResponse::Created().json(CategoryResponse::from(created)))
}

#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "All categories by name", body = [CategoryResponse]),
    ),
    tag = "categories"
)]
pub async fn list_categories(service: Catalog) -> Result<HttpResponse, AppError> {
    let categories = web::block(move || service.list_categories()).await??;
    let body: Vec<CategoryResponse> = categories.into_iter().map(CategoryResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}
