use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::catalog::{Customer, CustomerChanges, NewCustomer};
use crate::errors::AppError;

use super::products::Catalog;
use super::{page_bounds, PageParams};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub customer_id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_active: bool,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        CustomerResponse {
            customer_id: c.id,
            name: c.name,
            email: c.email,
            phone: c.phone,
            is_active: c.is_active,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListCustomersResponse {
    pub items: Vec<CustomerResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[utoipa::path(
    post,
    path = "/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = CustomerResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered"),
    ),
    tag = "customers"
)]
pub async fn create_customer(
    service: Catalog,
    body: web::Json<CreateCustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let customer = NewCustomer {
        name: body.name.trim().to_string(),
        email: body.email,
        phone: body.phone,
    };
    let created = web::block(move || service.create_customer(customer)).await??;
    Ok(HttpResponse::Created().json(CustomerResponse::from(created)))
}

#[utoipa::path(
    get,
    path = "/customers/{id}",
    params(("id" = i32, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer found", body = CustomerResponse),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn get_customer(service: Catalog, path: web::Path<i32>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let customer = web::block(move || service.get_customer(id)).await??;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(customer)))
}

#[utoipa::path(
    get,
    path = "/customers",
    params(PageParams),
    responses(
        (status = 200, description = "Paginated list of customers", body = ListCustomersResponse),
    ),
    tag = "customers"
)]
pub async fn list_customers(
    service: Catalog,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, AppError> {
    let (page, limit) = page_bounds(query.page, query.limit);
    let result = web::block(move || service.list_customers(page, limit)).await??;
    Ok(HttpResponse::Ok().json(ListCustomersResponse {
        items: result.items.into_iter().map(CustomerResponse::from).collect(),
        total: result.total,
        page,
        limit,
    }))
}

#[utoipa::path(
    patch,
    path = "/customers/{id}",
    params(("id" = i32, Path, description = "Customer id")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = CustomerResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn update_customer(
    service: Catalog,
    path: web::Path<i32>,
    body: web::Json<UpdateCustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let changes = CustomerChanges {
        name: body.name.map(|n| n.trim().to_string()),
        phone: body.phone,
        is_active: body.is_active,
    };
    let customer = web::block(move || service.update_customer(id, changes)).await??;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(customer)))
}
