use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::application::OrderService;
use crate::domain::errors::{DomainError, Entity, Violations};
use crate::domain::order::{line_field, LineItem, OrderView, PlaceOrder, DEFAULT_ACTOR};
use crate::errors::AppError;
use crate::infrastructure::DieselGateway;

use super::{money, page_bounds, parse_decimal_json, PageParams};

pub type Orders = web::Data<OrderService<DieselGateway>>;

/// Header carrying the acting admin user, stored in the order's `created_by`.
pub const ACTOR_HEADER: &str = "x-actor";

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderDetailRequest {
    pub product_id: Option<i32>,
    pub quantity: Option<i32>,
    /// Decimal price, preferably as a string ("9.99"); JSON numbers are accepted too.
    #[schema(value_type = Option<String>, example = "9.99")]
    pub price_per_unit: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub customer_id: Option<i32>,
    #[serde(rename = "orderDetails")]
    pub order_details: Option<Vec<OrderDetailRequest>>,
}

impl PlaceOrderRequest {
    /// Reports missing and unparsable fields; range checks happen in the domain.
    fn into_domain(self, placed_by: String) -> Result<PlaceOrder, DomainError> {
        let mut v = Violations::new();

        let customer_id = self.customer_id;
        if customer_id.is_none() {
            v.push("customer_id", "is required");
        }

        let details = match self.order_details {
            Some(details) => details,
            None => {
                v.push("orderDetails", "is required");
                Vec::new()
            }
        };

        let mut lines = Vec::with_capacity(details.len());
        for (idx, detail) in details.into_iter().enumerate() {
            if detail.product_id.is_none() {
                v.push(line_field(idx, "product_id"), "is required");
            }
            if detail.quantity.is_none() {
                v.push(line_field(idx, "quantity"), "is required");
            }
            let price = match &detail.price_per_unit {
                Some(raw) => parse_decimal_json(&mut v, &line_field(idx, "price_per_unit"), raw),
                None => {
                    v.push(line_field(idx, "price_per_unit"), "is required");
                    None
                }
            };
            if let (Some(product_id), Some(quantity), Some(unit_price)) =
                (detail.product_id, detail.quantity, price)
            {
                lines.push(LineItem {
                    product_id,
                    quantity,
                    unit_price,
                });
            }
        }

        v.into_result()?;
        Ok(PlaceOrder {
            customer_id: customer_id.unwrap_or_default(),
            lines,
            placed_by,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetailResponse {
    pub order_detail_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub price_per_unit: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub order_id: i32,
    pub customer_id: i32,
    pub order_date: String,
    pub total_price: String,
    pub created_by: String,
    #[serde(rename = "orderDetails")]
    pub order_details: Vec<OrderDetailResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(order: OrderView) -> Self {
        OrderResponse {
            order_id: order.id,
            customer_id: order.customer_id,
            order_date: order.order_date.to_rfc3339(),
            total_price: money(&order.total_price),
            created_by: order.created_by,
            order_details: order
                .lines
                .into_iter()
                .map(|l| OrderDetailResponse {
                    order_detail_id: l.id,
                    product_id: l.product_id,
                    quantity: l.quantity,
                    price_per_unit: money(&l.unit_price),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

fn actor(req: &HttpRequest) -> String {
    req.headers()
        .get(ACTOR_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_ACTOR)
        .to_string()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Places an order. Stock for every line is checked and decremented in the
/// same transaction as the order insert; a rejected placement changes nothing.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = PlaceOrderRequest,
    params(
        ("x-actor" = Option<String>, Header, description = "Admin user recorded as created_by"),
    ),
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Customer or product not found"),
        (status = 409, description = "Insufficient stock"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn place_order(
    service: Orders,
    req: HttpRequest,
    body: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner().into_domain(actor(&req))?;

    let order = web::block(move || service.place_order(request)).await??;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /orders/{id}
///
/// Returns the order together with its line items.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = i32, Path, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(service: Orders, path: web::Path<i32>) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || service.get_order(order_id))
        .await??
        .ok_or_else(|| AppError::from(DomainError::not_found(Entity::Order, order_id)))?;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Returns a paginated list of orders, newest first, without their lines.
#[utoipa::path(
    get,
    path = "/orders",
    params(PageParams),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: Orders,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, AppError> {
    let (page, limit) = page_bounds(query.page, query.limit);

    let result = web::block(move || service.list_orders(page, limit)).await??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(OrderResponse::from).collect(),
        total: result.total,
        page,
        limit,
    }))
}
