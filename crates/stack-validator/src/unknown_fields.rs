use serde_json::Value;

use crate::field_error::{FieldError, FieldErrorKind, FieldPath};
use crate::schema::FieldSchema;

/// Annotation set by `kubectl apply` with the configuration it last applied.
pub const LAST_APPLIED_CONFIG_ANNOTATION: &str = "kubectl.kubernetes.io/last-applied-configuration";

fn annotation_path() -> FieldPath {
    FieldPath::new("metadata")
        .child("annotations")
        .key(LAST_APPLIED_CONFIG_ANNOTATION)
}

/// Look for a field of the last applied configuration that is not part of
/// the resource shape.
///
/// Only the first unknown field is reported. A missing annotation is not an
/// error, an annotation that is not a JSON object is.
pub fn detect(schema: &FieldSchema, last_applied: Option<&str>) -> Option<FieldError> {
    let raw = last_applied?;

    let document: Value = match serde_json::from_str(raw) {
        Ok(document) => document,
        Err(e) => return Some(unparseable(e.to_string())),
    };
    if !document.is_object() {
        return Some(unparseable("expected a JSON object".to_owned()));
    }

    find_unknown(schema, &document, FieldPath::default()).map(|(path, name)| {
        FieldError::invalid(
            path,
            name,
            format!("unknown field found in the {LAST_APPLIED_CONFIG_ANNOTATION} annotation is unknown"),
        )
    })
}

fn unparseable(reason: String) -> FieldError {
    FieldError {
        field: annotation_path(),
        kind: FieldErrorKind::Invalid,
        bad_value: None,
        detail: format!("cannot parse the last applied configuration: {reason}"),
    }
}

/// Depth-first walk, returns the path and the name of the first unknown key.
fn find_unknown(schema: &FieldSchema, value: &Value, path: FieldPath) -> Option<(FieldPath, String)> {
    match (schema, value) {
        (FieldSchema::Object(fields), Value::Object(entries)) => {
            entries.iter().find_map(|(name, entry)| match fields.get(name) {
                None => Some((path.child(name), name.clone())),
                Some(field) => find_unknown(field, entry, path.child(name)),
            })
        }
        (FieldSchema::Map(values), Value::Object(entries)) => entries
            .iter()
            .find_map(|(key, entry)| find_unknown(values, entry, path.key(key))),
        (FieldSchema::List(items), Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .find_map(|(idx, entry)| find_unknown(items, entry, path.key(&idx.to_string()))),
        // free-form values, scalars and type mismatches
        _ => None,
    }
}
