use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use serde_json::json;

/// Protocol-level failure of a webhook call, sent back as
/// `{"message": ..., "status": ...}` instead of an AdmissionReview.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub(crate) fn unsupported_review_version(api_version: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: format!("unsupported AdmissionReview apiVersion {api_version:?}"),
        }
    }

    pub(crate) fn no_validator(path: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("no validator serves {path}"),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let payload = json!({
            "message": self.message,
            "status": self.status.as_u16(),
        });

        (self.status, axum::Json(payload)).into_response()
    }
}
