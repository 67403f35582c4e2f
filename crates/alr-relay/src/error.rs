//! JSON error responses for the invocation API.

use alr_core::RelayError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// API error with status code and message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, code: "bad_request", message: msg.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "ok": false,
            "error": {
                "code": self.code,
                "message": self.message,
            }
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        let status = match &err {
            RelayError::Config(_) | RelayError::FilenameConvention { .. } => {
                StatusCode::BAD_REQUEST
            }
            RelayError::Fetch { .. } | RelayError::Publish { .. } => StatusCode::BAD_GATEWAY,
            RelayError::Decompression { .. }
            | RelayError::Decode { .. }
            | RelayError::MalformedRecord { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            RelayError::Io(_) | RelayError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, code: err.kind(), message: err.to_string() }
    }
}
