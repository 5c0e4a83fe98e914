use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::scoring::{FieldError, ScoringError};

/// Error responses of the scoring API
///
/// Client errors carry a `detail` list of `{loc, msg, type}` entries, the
/// format existing API consumers already parse.
#[derive(Debug)]
pub enum ApiError {
    /// Body could not be read as JSON
    Rejected { status: StatusCode, message: String },
    /// Field validation or out-of-range rejection
    Unprocessable(Vec<FieldError>),
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<ScoringError> for ApiError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::Validation(errors) => ApiError::Unprocessable(errors),
            ScoringError::OutOfRange(fields) => ApiError::Unprocessable(
                fields
                    .into_iter()
                    .map(|f| {
                        FieldError::new(
                            &["body", f.field.as_str()],
                            format!("Value {} is outside the trained bin ranges", f.value),
                            "out_of_range",
                        )
                    })
                    .collect(),
            ),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Rejected { status, message } => {
                let detail = vec![FieldError::new(&["body"], message, "json_invalid")];
                (status, Json(json!({ "detail": detail }))).into_response()
            }
            ApiError::Unprocessable(detail) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "detail": detail }))).into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "scoring failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
