//! Service errors to HTTP responses.
//!
//! The status for a missing entity depends on the endpoint: lifecycle writes
//! (initiate, submit, delete, skip, reject, authorize) answer 400, reads,
//! approve, comments and orders answer 404. `From<RequisitionError>` is the
//! 404 mapping; [`ApiError::missing_as_400`] is the other one.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rqs_service::RequisitionError;
use serde_json::{json, Value};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiError {
    pub fn new(status: StatusCode, msg: impl std::fmt::Display) -> Self {
        Self {
            status,
            body: json!({ "error": msg.to_string() }),
        }
    }

    pub fn bad_request(msg: impl std::fmt::Display) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn missing_as_400(e: RequisitionError) -> Self {
        Self::map(e, StatusCode::BAD_REQUEST)
    }

    fn map(e: RequisitionError, not_found: StatusCode) -> Self {
        match e {
            RequisitionError::NotFound(msg) => Self::new(not_found, msg),
            RequisitionError::Validation { field, message } => {
                let mut body = serde_json::Map::new();
                body.insert(field, Value::String(message));
                Self {
                    status: StatusCode::BAD_REQUEST,
                    body: Value::Object(body),
                }
            }
            RequisitionError::InvalidTransition(msg)
            | RequisitionError::Conflict(msg)
            | RequisitionError::BadRequest(msg) => {
                tracing::warn!(error = %msg, "request refused");
                Self::bad_request(msg)
            }
            internal @ (RequisitionError::Store(_)
            | RequisitionError::ReferenceData(_)
            | RequisitionError::Export(_)) => {
                tracing::error!(error = %internal, "request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, internal)
            }
        }
    }
}

impl From<RequisitionError> for ApiError {
    fn from(e: RequisitionError) -> Self {
        Self::map(e, StatusCode::NOT_FOUND)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
