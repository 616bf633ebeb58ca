use crate::store::StoreError;
use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The liveness probe could not complete a round-trip.
    #[error("Database connection failed: {0}")]
    Unavailable(StoreError),

    #[error("Database error: {0}")]
    Store(StoreError),

    #[error("{0}")]
    NotFound(String),

    /// The request body could not be decoded; carries the status axum chose
    /// (400 for malformed JSON, 415 for a wrong content type, 422 for a
    /// payload of the wrong shape).
    #[error("{message}")]
    InvalidRequest { status: StatusCode, message: String },
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Store(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InvalidRequest { status, .. } => *status,
            ServiceError::Unavailable(_) | ServiceError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            ServiceError::NotFound(_) => {}
            ServiceError::InvalidRequest { .. } => debug!(error = %self, "rejected request body"),
            _ => error!(error = %self, "request failed"),
        }

        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
