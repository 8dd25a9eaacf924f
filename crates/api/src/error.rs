//! API error types with HTTP response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::IdParseError;
use workflow::WorkflowError;

use crate::response::ApiResponse;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// A path segment is not a well-formed identifier.
    InvalidId(IdParseError),
    /// Bad request from the client.
    BadRequest(String),
    /// Error raised by an order operation.
    Workflow(WorkflowError),
}

impl ApiError {
    /// Status code and client-facing message.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::InvalidId(err) => (StatusCode::NOT_FOUND, format!("Invalid {} ID", err.kind)),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Workflow(err) => workflow_error_to_response(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(error = ?self, "internal server error");
            metrics::counter!("http_server_errors_total").increment(1);
        }

        (status, Json(ApiResponse::error(message))).into_response()
    }
}

fn workflow_error_to_response(err: &WorkflowError) -> (StatusCode, String) {
    match err {
        WorkflowError::Validation(_)
        | WorkflowError::InsufficientStock { .. }
        | WorkflowError::InvalidOperation { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        WorkflowError::InvalidStatus(_) => (StatusCode::BAD_REQUEST, "Invalid status".to_string()),
        WorkflowError::InvalidPaymentStatus(_) => {
            (StatusCode::BAD_REQUEST, "Invalid payment status".to_string())
        }
        WorkflowError::OrderNotFound(_) => (StatusCode::NOT_FOUND, "Order not found".to_string()),
        WorkflowError::ProductNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        WorkflowError::ConcurrencyConflict(_) => (StatusCode::CONFLICT, err.to_string()),
        WorkflowError::Store(_) | WorkflowError::Serialization(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        ApiError::Workflow(err)
    }
}

impl From<IdParseError> for ApiError {
    fn from(err: IdParseError) -> Self {
        ApiError::InvalidId(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
