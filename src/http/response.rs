//! Error responses.
//!
//! Maps workflow and store errors onto status codes with a JSON
//! `{"detail": ...}` body:
//! - invalid request → 400
//! - order not found → 404
//! - bad upstream data → 502
//! - dependency unavailable / breaker open → 503
//! - store invariant breach → 500

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::orders::{ErrorKind, StoreError, WorkflowError};

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Errors returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
    Workflow(WorkflowError),
    OrderNotFound(u64),
}

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        ApiError::Workflow(e)
    }
}

/// A body that is not a well-formed order is an invalid request.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Workflow(WorkflowError::Validation(rejection.body_text()))
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => ApiError::OrderNotFound(id),
            other => ApiError::Workflow(WorkflowError::Store(other)),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::OrderNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Workflow(e) => match e.kind() {
                ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
                ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::BadUpstream => StatusCode::BAD_GATEWAY,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::OrderNotFound(_) => "order not found".to_string(),
            ApiError::Workflow(e) if e.kind() == ErrorKind::Internal => {
                "internal error".to_string()
            }
            ApiError::Workflow(e) => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorBody {
                detail: self.detail(),
            }),
        )
            .into_response()
    }
}
