use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;

use crate::domain::errors::{DomainError, FieldError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request")]
    BadRequest(Vec<FieldError>),

    #[error("{0}")]
    NotFound(String),

    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    OutOfStock {
        product_id: i32,
        requested: i32,
        available: i32,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Maps an unreadable JSON body to a 400 naming the body as the bad field.
    pub fn from_json_error(err: JsonPayloadError) -> Self {
        AppError::BadRequest(vec![FieldError::new("body", err.to_string())])
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(fields) => AppError::BadRequest(fields),
            e @ DomainError::NotFound { .. } => AppError::NotFound(e.to_string()),
            DomainError::InsufficientStock {
                product_id,
                requested,
                available,
            } => AppError::OutOfStock {
                product_id,
                requested,
                available,
            },
            DomainError::Conflict(msg) => AppError::Conflict(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::OutOfStock { .. } | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::BadRequest(fields) => json!({
                "error": self.to_string(),
                "fields": fields,
            }),
            AppError::OutOfStock {
                product_id,
                requested,
                available,
            } => json!({
                "error": self.to_string(),
                "product_id": product_id,
                "requested": requested,
                "available": available,
            }),
            AppError::NotFound(_) | AppError::Conflict(_) => json!({
                "error": self.to_string()
            }),
            AppError::Internal(detail) => {
                log::error!("request failed: {detail}");
                json!({ "error": "Internal server error" })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
