use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
    models::CartItemError,
    services::{cart_service::CartError, pricing::PricingError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::CartNotFound => AppError::NotFound(err.to_string()),
            CartError::Item(CartItemError::ItemNotFound) => AppError::NotFound(err.to_string()),
            CartError::Item(item) => {
                AppError::Validation(vec![FieldError::new("quantity", item.to_string())])
            }
            CartError::Conflict { .. } => AppError::Conflict(err.to_string()),
            CartError::Pricing(PricingError::Store(source)) | CartError::Store(source) => {
                AppError::Internal(anyhow::Error::new(source))
            }
            CartError::Pricing(pricing) => AppError::Internal(anyhow::Error::new(pricing)),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Server-side failures keep their detail in the logs only.
        let message = match &self {
            AppError::DbError(err) => {
                tracing::error!(error = %err, "database error");
                "Internal server error".to_string()
            }
            AppError::OrmError(err) => {
                tracing::error!(error = %err, "orm error");
                "Internal server error".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %format!("{err:#}"), "internal error");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let errors = match self {
            AppError::Validation(fields) => Some(fields),
            _ => None,
        };

        let body = ErrorBody {
            success: false,
            message,
            errors,
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
