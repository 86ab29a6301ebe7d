use serde::{Deserialize, Serialize};

use crate::admission_request::GroupVersionKind;
use crate::field_error::{FieldError, FieldErrors};

/// This models the admission/v1/AdmissionResponse object of Kubernetes
/// See https://pkg.go.dev/k8s.io/kubernetes/pkg/apis/admission#AdmissionResponse
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// UID is an identifier for the individual request/response.
    /// This must be copied over from the corresponding AdmissionRequest.
    pub uid: String,

    /// Allowed indicates whether or not the admission request was permitted.
    pub allowed: bool,

    /// Status contains extra details into why an admission request was denied.
    /// This field IS NOT consulted in any way if "Allowed" is "true".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatus>,

    /// Warning messages returned to the requesting API client, whatever the decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

/// Values that Status.Status of an AdmissionResponse can have
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum AdmissionResponseStatusValue {
    Success,
    Failure,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub struct AdmissionResponseStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatusValue>,

    /// A human-readable description of the status of this operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// A machine-readable description of why this operation is in the
    /// "Failure" status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<StatusReason>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<StatusDetails>,

    /// Suggested HTTP return code for this status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

/// StatusReason is an enumeration of possible failure causes.
/// Each StatusReason maps to a single HTTP status code.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum StatusReason {
    /// The server has declined to indicate a specific reason.
    /// Status code 500.
    #[serde(rename = "")]
    Unknown,

    /// The server understood the request but refuses to take any further action.
    /// Status code 403.
    Forbidden,

    /// The create or update operation cannot be completed due to invalid data
    /// provided as part of the request.
    /// Status code 422.
    Invalid,

    /// The request itself was invalid.
    /// Status code 400.
    BadRequest,

    /// An internal error occurred.
    /// Status code 500.
    InternalError,
}

impl StatusReason {
    pub fn code(&self) -> u16 {
        match self {
            StatusReason::Forbidden => 403,
            StatusReason::Invalid => 422,
            StatusReason::BadRequest => 400,
            StatusReason::Unknown | StatusReason::InternalError => 500,
        }
    }
}

/// Additional information about a failure: the kind and name of the
/// rejected resource and the list of causes.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub struct StatusDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<StatusCause>,
}

/// StatusCause provides more information about a failure, one entry per
/// field error.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub struct StatusCause {
    // A machine-readable description of the cause of the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<CauseType>,

    // A human-readable description of the cause of the error, without the field path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    // The field of the resource that has caused this error, as named by its JSON
    // serialization, e.g. "spec.version".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// CauseType is a machine readable value providing more detail about what
/// occurred in a status response.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum CauseType {
    /// A required value was not provided.
    FieldValueRequired,

    /// A malformed value (e.g., failed regex match).
    FieldValueInvalid,

    /// A well formed value that cannot be handled (e.g., an out of range version).
    FieldValueNotSupported,

    /// A value that would be accepted under some conditions, but which is not
    /// permitted by the current conditions.
    FieldValueForbidden,

    /// The given value is too long.
    FieldValueTooLong,

    /// Errors that are not related to user input.
    InternalError,
}

impl AdmissionResponse {
    pub fn allow(uid: String, warnings: Vec<String>) -> AdmissionResponse {
        AdmissionResponse {
            uid,
            allowed: true,
            status: None,
            warnings: non_empty(warnings),
        }
    }

    fn reject(
        uid: String,
        reason: StatusReason,
        message: String,
        details: Option<StatusDetails>,
        warnings: Vec<String>,
    ) -> AdmissionResponse {
        AdmissionResponse {
            uid,
            allowed: false,
            status: Some(AdmissionResponseStatus {
                status: Some(AdmissionResponseStatusValue::Failure),
                message: Some(message),
                code: Some(reason.code()),
                reason: Some(reason),
                details,
            }),
            warnings: non_empty(warnings),
        }
    }

    /// Denial carrying one cause per field error, shaped like the API server's
    /// own `Invalid` errors: `<Kind>.<group> "<name>" is invalid: <errors>`
    pub fn invalid(
        uid: String,
        gvk: &GroupVersionKind,
        name: &str,
        warnings: Vec<String>,
        errors: &FieldErrors,
    ) -> AdmissionResponse {
        let message = format!("{} {name:?} is invalid: {errors}", gvk.group_kind());
        let details = StatusDetails {
            name: Some(name.to_owned()),
            group: Some(gvk.group.clone()),
            kind: Some(gvk.kind.clone()),
            causes: errors.iter().map(FieldError::to_cause).collect(),
        };

        AdmissionResponse::reject(uid, StatusReason::Invalid, message, Some(details), warnings)
    }

    pub fn bad_request(uid: String, message: String) -> AdmissionResponse {
        AdmissionResponse::reject(uid, StatusReason::BadRequest, message, None, Vec::new())
    }

    pub fn forbidden(uid: String, message: String) -> AdmissionResponse {
        AdmissionResponse::reject(uid, StatusReason::Forbidden, message, None, Vec::new())
    }

    /// Field errors carried by the status causes, in their original order
    pub fn field_errors(&self) -> FieldErrors {
        self.status
            .as_ref()
            .and_then(|status| status.details.as_ref())
            .map(|details| {
                details
                    .causes
                    .iter()
                    .filter_map(FieldError::from_cause)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn non_empty(warnings: Vec<String>) -> Option<Vec<String>> {
    if warnings.is_empty() {
        None
    } else {
        Some(warnings)
    }
}
