//! API error handling

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use core_kernel::PortError;
use domain_inventory::InventoryError;
use domain_invoicing::InvoiceError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{message}")]
    InsufficientStock {
        message: String,
        product_id: String,
        requested: u32,
        available: u32,
    },

    #[error("{0}")]
    InvoiceImmutable(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InsufficientStock { .. } | ApiError::InvoiceImmutable(_) | ApiError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::Validation(_) => "validation_error",
            ApiError::InsufficientStock { .. } => "insufficient_stock",
            ApiError::InvoiceImmutable(_) => "invoice_immutable",
            ApiError::Conflict(_) => "conflict",
            ApiError::Unavailable(_) => "unavailable",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let (message, details) = match &self {
            ApiError::InsufficientStock {
                message,
                product_id,
                requested,
                available,
            } => (
                message.clone(),
                Some(serde_json::json!({
                    "product_id": product_id,
                    "requested": requested,
                    "available": available,
                })),
            ),
            // storage internals stay in the log
            ApiError::Internal(_) => ("Internal server error".to_string(), None),
            ApiError::NotFound(m)
            | ApiError::Validation(m)
            | ApiError::InvoiceImmutable(m)
            | ApiError::Conflict(m)
            | ApiError::Unavailable(m) => (m.clone(), None),
        };

        let body = ErrorResponse {
            error: self.kind().to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            PortError::Validation { message, .. } => ApiError::Validation(message),
            PortError::Conflict { message } => ApiError::Conflict(message),
            PortError::Connection { .. } | PortError::Timeout { .. } => ApiError::Unavailable(err.to_string()),
            PortError::Transformation { .. } | PortError::Internal { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::ProductNotFound(_) => ApiError::NotFound(err.to_string()),
            InventoryError::InsufficientStock {
                product_id,
                requested,
                available,
                ..
            } => ApiError::InsufficientStock {
                message: err.to_string(),
                product_id: product_id.as_uuid().to_string(),
                requested,
                available,
            },
            InventoryError::Validation(message) => ApiError::Validation(message),
            InventoryError::Port(e) => e.into(),
        }
    }
}

impl From<InvoiceError> for ApiError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::Validation(message) => ApiError::Validation(message),
            InvoiceError::ProductNotFound(_) | InvoiceError::InvoiceNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            InvoiceError::InsufficientStock {
                product_id,
                requested,
                available,
                ..
            } => ApiError::InsufficientStock {
                message: err.to_string(),
                product_id: product_id.as_uuid().to_string(),
                requested,
                available,
            },
            InvoiceError::InvoiceImmutable { .. } => ApiError::InvoiceImmutable(err.to_string()),
            InvoiceError::Money(e) => ApiError::Validation(e.to_string()),
            InvoiceError::Port(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}
