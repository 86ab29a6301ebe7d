use axum::{
    Json,
    extract::{self, FromRequest, MatchedPath},
    http::StatusCode,
};
use stack_validator::admission_request::SUPPORTED_ADMISSION_API_VERSIONS;
use std::sync::Arc;
use tracing::debug;

use crate::api::{
    admission_review::{AdmissionReviewRequest, AdmissionReviewResponse},
    api_error::ApiError,
    populate_span_with_admission_request_data, populate_span_with_validation_results,
    service::evaluate,
    state::ApiServerState,
};

// create an extractor that internally uses `axum::Json` but has a custom rejection
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub(crate) struct JsonExtractor<T>(T);

#[tracing::instrument(
    name = "validation",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        webhook=matched_path.as_str(),
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        operation=tracing::field::Empty,
        dry_run=tracing::field::Empty,
        kind_group=tracing::field::Empty,
        kind_version=tracing::field::Empty,
        kind=tracing::field::Empty,
        allowed=tracing::field::Empty,
        warnings=tracing::field::Empty,
        response_code=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Validate the resource carried by an AdmissionReview against the checks
/// of its kind.
pub(crate) async fn validate_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    matched_path: MatchedPath,
    JsonExtractor(admission_review): JsonExtractor<AdmissionReviewRequest>,
) -> Result<Json<AdmissionReviewResponse>, ApiError> {
    let api_version = admission_review.api_version.as_deref();
    if let Some(api_version) =
        api_version.filter(|version| !SUPPORTED_ADMISSION_API_VERSIONS.contains(version))
    {
        return Err(ApiError::unsupported_review_version(api_version));
    }

    let validator = state
        .validators
        .get(matched_path.as_str())
        .ok_or_else(|| ApiError::no_validator(matched_path.as_str()))?;

    populate_span_with_admission_request_data(&admission_review.request);
    debug!("admission review received");

    let response = evaluate(validator.as_ref(), &admission_review.request);

    populate_span_with_validation_results(&response);
    debug!("admission review processed");

    Ok(Json(AdmissionReviewResponse::new(api_version, response)))
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}
