use serde_json::Value;
use stack_validator::{
    AdmissionRequest, AdmissionResponse, Operation, ValidationError, ValidationOutcome, Validator,
};
use tracing::{debug, warn};

/// Run the validation matching the operation of `request` and turn its
/// outcome into the admission response.
pub(crate) fn evaluate(validator: &dyn Validator, request: &AdmissionRequest) -> AdmissionResponse {
    let uid = request.uid.clone();
    let object = request.object.as_ref().map(|raw| &raw.0);
    let old_object = request.old_object.as_ref().map(|raw| &raw.0);

    let outcome = match request.operation {
        Operation::Create => match object {
            Some(object) => validator.validate_create(object),
            None => return missing_object(uid, "object"),
        },
        Operation::Update => match (old_object, object) {
            (Some(old), Some(object)) => validator.validate_update(old, object),
            (None, _) => return missing_object(uid, "oldObject"),
            (_, None) => return missing_object(uid, "object"),
        },
        Operation::Delete => validator.validate_delete(old_object.or(object)),
        Operation::Connect => {
            debug!(uid = uid.as_str(), "connect operation, nothing to validate");
            Ok(ValidationOutcome::default())
        }
    };

    match outcome {
        Ok(outcome) if outcome.is_admitted() => AdmissionResponse::allow(uid, outcome.warnings),
        Ok(outcome) => AdmissionResponse::invalid(
            uid,
            &validator.group_version_kind(),
            &resource_name(request),
            outcome.warnings,
            &outcome.errors,
        ),
        Err(error @ ValidationError::BadRequest(_)) => {
            debug!(uid = uid.as_str(), error = %error, "cannot decode the admission request");
            AdmissionResponse::bad_request(uid, error.to_string())
        }
        Err(error @ ValidationError::InternalCast(_)) => {
            warn!(uid = uid.as_str(), error = %error, "unexpected old object");
            AdmissionResponse::forbidden(uid, error.to_string())
        }
    }
}

fn missing_object(uid: String, field: &str) -> AdmissionResponse {
    AdmissionResponse::bad_request(
        uid,
        ValidationError::BadRequest(format!("{field} is missing from the admission request"))
            .to_string(),
    )
}

/// The name of the request, falling back to the one of the object: requests
/// creating objects through `generateName` are not named yet.
fn resource_name(request: &AdmissionRequest) -> String {
    request
        .name
        .clone()
        .filter(|name| !name.is_empty())
        .or_else(|| {
            request
                .object
                .as_ref()
                .and_then(|raw| raw.0.pointer("/metadata/name"))
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_default()
}
