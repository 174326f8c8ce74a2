//! Error taxonomy for the storefront service.
//!
//! Every failure surfaced over HTTP maps to one of these variants; handlers
//! return `Result<_, StorefrontError>` and the `IntoResponse` impl renders
//! the JSON body storefront clients expect.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::payments::PaymentError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("{0}")]
    Validation(String),

    #[error("Product {0} not found")]
    ProductNotFound(String),

    #[error("Insufficient stock for {title}: available {available}, requested {requested}")]
    InsufficientStock {
        id: String,
        title: String,
        available: u32,
        requested: u64,
    },

    #[error("Upstream service unavailable: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<serde_json::Value>,
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let (status, metadata) = match &self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, None),
            Self::ProductNotFound(_) => (StatusCode::NOT_FOUND, None),
            Self::InsufficientStock {
                available,
                requested,
                ..
            } => (
                StatusCode::CONFLICT,
                Some(serde_json::json!({
                    "currentStock": available,
                    "requested": requested,
                })),
            ),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, None),
            Self::Configuration(_) | Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };

        let body = ErrorBody {
            error: self.to_string(),
            status: status.as_u16(),
            metadata,
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for StorefrontError {
    fn from(err: StoreError) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<PaymentError> for StorefrontError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::MissingCredentials => {
                Self::Configuration("payment provider secret key is not set".to_string())
            }
            other => Self::Upstream(other.to_string()),
        }
    }
}
