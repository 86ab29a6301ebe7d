use serde::{Deserialize, Serialize};
use stack_validator::AdmissionResponse;
use stack_validator::admission_request::{ADMISSION_API_VERSION_V1, ADMISSION_REVIEW_KIND};

pub use stack_validator::AdmissionReviewRequest;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    pub response: AdmissionResponse,
}

impl AdmissionReviewResponse {
    /// Wrap `response` in an envelope of the same revision as the request,
    /// `admission.k8s.io/v1` when the request did not say.
    pub fn new(request_api_version: Option<&str>, response: AdmissionResponse) -> Self {
        AdmissionReviewResponse {
            api_version: Some(
                request_api_version
                    .unwrap_or(ADMISSION_API_VERSION_V1)
                    .to_owned(),
            ),
            kind: Some(String::from(ADMISSION_REVIEW_KIND)),
            response,
        }
    }
}
