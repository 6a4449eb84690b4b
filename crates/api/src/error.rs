//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dispatch::DispatchError;
use domain::OrderError;
use record_store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Coordinator error.
    Dispatch(DispatchError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Dispatch(err) => dispatch_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn dispatch_error_to_response(err: DispatchError) -> (StatusCode, String) {
    match &err {
        DispatchError::InsufficientStock { .. }
        | DispatchError::ActiveAssignmentExists { .. }
        | DispatchError::Assignment(_)
        | DispatchError::DriverUnavailable(_)
        | DispatchError::VehicleUnavailable(_) => (StatusCode::CONFLICT, err.to_string()),
        DispatchError::Order(order_err) => match order_err {
            OrderError::EmptyOrder
            | OrderError::InvalidQuantity { .. }
            | OrderError::InvalidPrice { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
            OrderError::InvalidTransition { .. }
            | OrderError::AlreadyPaid
            | OrderError::PaymentRequired
            | OrderError::NotCancellable { .. } => (StatusCode::CONFLICT, err.to_string()),
        },
        DispatchError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DispatchError::Store(StoreError::VersionConflict { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        _ => {
            tracing::error!(error = %err, "unexpected dispatch error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        ApiError::Dispatch(err)
    }
}

impl From<domain::DomainError> for ApiError {
    fn from(err: domain::DomainError) -> Self {
        ApiError::Dispatch(err.into())
    }
}
