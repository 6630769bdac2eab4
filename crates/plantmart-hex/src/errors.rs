use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Error taxonomy for the cart/checkout core. Every variant maps to a
/// stable machine-readable code in the response body so clients can react
/// to the specific failure, not just the status class.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Cart mutation would push the merged line quantity past stock.
    #[error("requested quantity {requested} exceeds stock {available} for plant {item_id}")]
    StockExceeded {
        item_id: Uuid,
        requested: u32,
        available: u32,
    },

    /// Checkout asked for more units than the counter holds.
    #[error("insufficient stock for plant {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: Uuid,
        requested: u32,
        available: u32,
    },

    /// Submitted line price disagrees with the catalog (stale cache or
    /// tampering); always rejected before any mutation.
    #[error("submitted price {submitted_cents} does not match catalog price {catalog_cents} for plant {item_id}")]
    PriceMismatch {
        item_id: Uuid,
        submitted_cents: i64,
        catalog_cents: i64,
    },

    #[error("declared total {declared_cents} does not match computed total {computed_cents}")]
    AmountMismatch {
        declared_cents: i64,
        computed_cents: i64,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::NotFound(_) => "NotFound",
            Self::StockExceeded { .. } => "StockExceeded",
            Self::InsufficientStock { .. } => "InsufficientStock",
            Self::PriceMismatch { .. } => "PriceMismatch",
            Self::AmountMismatch { .. } => "AmountMismatch",
            Self::Unauthorized(_) => "Unauthorized",
            Self::Forbidden(_) => "Forbidden",
            Self::Internal(_) => "InternalError",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::StockExceeded { .. }
            | Self::InsufficientStock { .. }
            | Self::PriceMismatch { .. }
            | Self::AmountMismatch { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let msg = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        let body = serde_json::to_string(&ErrorBody {
            error: msg,
            code: self.code(),
        })
        .unwrap_or_else(|_| "{\"error\":\"internal serialization\"}".into());
        (self.status(), [("content-type", "application/json")], body).into_response()
    }
}
