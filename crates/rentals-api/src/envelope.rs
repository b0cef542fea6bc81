//! JSON envelope shared by every endpoint.
//!
//! Success: `{"success": true, "data": ...}`.
//! Failure: `{"success": false, "error": {"message", "error_code", "suggestion", "details"}}`.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rentals_core::validate::ValidationError;
use rentals_core::{ErrorCode, RentalError};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, warn};

/// Successful response body.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

/// Wrap `data` in a 200 envelope.
#[must_use]
pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
    })
}

/// Wrap `data` in a 201 envelope.
#[must_use]
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, ok(data))
}

/// A structured error with optional suggestion and details.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub message: String,
    /// Machine-readable error code (`E####`).
    pub error_code: &'static str,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Per-field violations or other structured context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Error half of the envelope, carrying its HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    /// 400 with the invalid-payload code.
    #[must_use]
    pub fn bad_request(message: impl Into<String>, suggestion: Option<&str>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                message: message.into(),
                error_code: ErrorCode::InvalidPayload.code(),
                suggestion: suggestion.map(str::to_string),
                details: None,
            },
        }
    }

    /// 400 listing each violated field.
    #[must_use]
    pub fn from_validation(errors: Vec<ValidationError>) -> Self {
        RentalError::Validation(errors).into()
    }

    /// 404 for paths that match no route.
    #[must_use]
    pub fn route_not_found(path: &str) -> Self {
        let code = ErrorCode::RouteNotFound;
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorBody {
                message: format!("no route for {path}"),
                error_code: code.code(),
                suggestion: code.hint().map(str::to_string),
                details: None,
            },
        }
    }
}

/// HTTP status for each service error.
#[must_use]
pub const fn status_for(err: &RentalError) -> StatusCode {
    match err {
        RentalError::Validation(_) | RentalError::ReservedEventType { .. } => {
            StatusCode::BAD_REQUEST
        }
        RentalError::NotFound(_) | RentalError::NoFieldHistory { .. } => StatusCode::NOT_FOUND,
        RentalError::DuplicateAddress { .. }
        | RentalError::PropertyDeleted { .. }
        | RentalError::NoChanges { .. } => StatusCode::CONFLICT,
        RentalError::RecordLimitExceeded { .. } | RentalError::ExportTooLarge { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RentalError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn details_for(err: &RentalError) -> Option<Value> {
    match err {
        RentalError::Validation(errors) => serde_json::to_value(errors).ok(),
        RentalError::DuplicateAddress { existing_code } => {
            Some(json!({ "existing_code": existing_code }))
        }
        RentalError::NoFieldHistory { property_id, field } => {
            Some(json!({ "property_id": property_id, "field": field }))
        }
        RentalError::RecordLimitExceeded { code, limit } => {
            Some(json!({ "code": code, "limit": limit }))
        }
        RentalError::ExportTooLarge { count, limit } => {
            Some(json!({ "count": count, "limit": limit }))
        }
        _ => None,
    }
}

impl From<RentalError> for ApiError {
    fn from(err: RentalError) -> Self {
        let status = status_for(&err);
        let code = err.code();
        let message = if let RentalError::Internal(ref inner) = err {
            error!(error = %inner, "internal error while serving request");
            code.message().to_string()
        } else {
            err.to_string()
        };
        Self {
            status,
            body: ErrorBody {
                message,
                error_code: code.code(),
                suggestion: code.hint().map(str::to_string),
                details: details_for(&err),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(reason = %rejection.body_text(), "rejected request body");
        Self::bad_request(
            rejection.body_text(),
            Some("send a JSON object with Content-Type: application/json"),
        )
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(
            rejection.body_text(),
            Some("check the types of the query parameters"),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.body,
        });
        (self.status, Json(body)).into_response()
    }
}
