use itertools::Itertools;
use std::fmt;

use crate::admission_response::{CauseType, StatusCause};

/// Dotted path to a field of a resource, as named by its JSON serialization.
///
/// Examples: `spec.version`, `metadata.name`,
/// `metadata.annotations[kubectl.kubernetes.io/last-applied-configuration]`
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(root: &str) -> Self {
        FieldPath(root.to_owned())
    }

    pub fn child(&self, name: &str) -> Self {
        if self.0.is_empty() {
            FieldPath(name.to_owned())
        } else {
            FieldPath(format!("{}.{name}", self.0))
        }
    }

    pub fn key(&self, key: &str) -> Self {
        FieldPath(format!("{}[{key}]", self.0))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        FieldPath(path.to_owned())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldErrorKind {
    Invalid,
    TooLong,
    Forbidden,
    NotSupported,
    Required,
}

impl FieldErrorKind {
    pub fn cause_type(&self) -> CauseType {
        match self {
            FieldErrorKind::Invalid => CauseType::FieldValueInvalid,
            FieldErrorKind::TooLong => CauseType::FieldValueTooLong,
            FieldErrorKind::Forbidden => CauseType::FieldValueForbidden,
            FieldErrorKind::NotSupported => CauseType::FieldValueNotSupported,
            FieldErrorKind::Required => CauseType::FieldValueRequired,
        }
    }

    pub fn from_cause_type(cause_type: &CauseType) -> Option<Self> {
        match cause_type {
            CauseType::FieldValueInvalid => Some(FieldErrorKind::Invalid),
            CauseType::FieldValueTooLong => Some(FieldErrorKind::TooLong),
            CauseType::FieldValueForbidden => Some(FieldErrorKind::Forbidden),
            CauseType::FieldValueNotSupported => Some(FieldErrorKind::NotSupported),
            CauseType::FieldValueRequired => Some(FieldErrorKind::Required),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            FieldErrorKind::Invalid => "Invalid value",
            FieldErrorKind::TooLong => "Too long",
            FieldErrorKind::Forbidden => "Forbidden",
            FieldErrorKind::NotSupported => "Unsupported value",
            FieldErrorKind::Required => "Required value",
        }
    }
}

/// A single validation failure attached to a field of the resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldError {
    pub field: FieldPath,
    pub kind: FieldErrorKind,
    pub bad_value: Option<String>,
    pub detail: String,
}

impl FieldError {
    pub fn invalid(field: FieldPath, value: impl Into<String>, detail: impl Into<String>) -> Self {
        FieldError {
            field,
            kind: FieldErrorKind::Invalid,
            bad_value: Some(value.into()),
            detail: detail.into(),
        }
    }

    pub fn not_supported(
        field: FieldPath,
        value: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        FieldError {
            field,
            kind: FieldErrorKind::NotSupported,
            bad_value: Some(value.into()),
            detail: detail.into(),
        }
    }

    pub fn forbidden(field: FieldPath, detail: impl Into<String>) -> Self {
        FieldError {
            field,
            kind: FieldErrorKind::Forbidden,
            bad_value: None,
            detail: detail.into(),
        }
    }

    pub fn required(field: FieldPath, detail: impl Into<String>) -> Self {
        FieldError {
            field,
            kind: FieldErrorKind::Required,
            bad_value: None,
            detail: detail.into(),
        }
    }

    /// The offending value is deliberately not reported: it is too long to be useful.
    pub fn too_long(field: FieldPath, max_length: usize) -> Self {
        FieldError {
            field,
            kind: FieldErrorKind::TooLong,
            bad_value: None,
            detail: format!("may not be more than {max_length} bytes"),
        }
    }

    /// Everything but the field path, e.g. `Forbidden: Version downgrades are not supported`
    pub fn body(&self) -> String {
        match (&self.kind, &self.bad_value) {
            (FieldErrorKind::Invalid | FieldErrorKind::NotSupported, Some(value)) => {
                let quoted = serde_json::Value::String(value.clone());
                format!("{}: {quoted}: {}", self.kind.label(), self.detail)
            }
            _ => format!("{}: {}", self.kind.label(), self.detail),
        }
    }

    pub fn to_cause(&self) -> StatusCause {
        StatusCause {
            reason: Some(self.kind.cause_type()),
            message: Some(self.body()),
            field: Some(self.field.to_string()),
        }
    }

    /// Rebuild a field error out of a status cause produced by [`FieldError::to_cause`].
    pub fn from_cause(cause: &StatusCause) -> Option<Self> {
        let kind = FieldErrorKind::from_cause_type(cause.reason.as_ref()?)?;
        let field = FieldPath::from(cause.field.as_deref()?);
        let body = cause.message.as_deref()?;
        let rest = body.strip_prefix(kind.label())?.strip_prefix(": ")?;

        let (bad_value, detail) = match kind {
            FieldErrorKind::Invalid | FieldErrorKind::NotSupported if rest.starts_with('"') => {
                split_quoted_value(rest)?
            }
            _ => (None, rest.to_owned()),
        };

        Some(FieldError {
            field,
            kind,
            bad_value,
            detail,
        })
    }
}

/// Split `"<value>": <detail>`, the value being a JSON quoted string
fn split_quoted_value(rest: &str) -> Option<(Option<String>, String)> {
    let mut escaped = false;
    for (idx, c) in rest.char_indices().skip(1) {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => {
                let quoted = &rest[..=idx];
                let value: String = serde_json::from_str(quoted).ok()?;
                let detail = rest[idx + 1..].strip_prefix(": ")?;
                return Some((Some(value), detail.to_owned()));
            }
            _ => escaped = false,
        }
    }
    None
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.body())
    }
}

/// Ordered collection of field errors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        FieldErrors(Vec::new())
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// Append `other`, skipping errors that have already been collected.
    pub fn extend(&mut self, other: FieldErrors) {
        let merged = self.0.drain(..).chain(other.0).unique().collect();
        self.0 = merged;
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }
}

impl From<FieldError> for FieldErrors {
    fn from(error: FieldError) -> Self {
        FieldErrors(vec![error])
    }
}

impl From<Option<FieldError>> for FieldErrors {
    fn from(error: Option<FieldError>) -> Self {
        FieldErrors(error.into_iter().collect())
    }
}

impl FromIterator<FieldError> for FieldErrors {
    fn from_iter<T: IntoIterator<Item = FieldError>>(iter: T) -> Self {
        FieldErrors(iter.into_iter().unique().collect())
    }
}

impl IntoIterator for FieldErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for FieldErrors {
    /// Single errors are printed as they are, multiple ones as `[err1, err2]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "{single}"),
            errors => write!(f, "[{}]", errors.iter().join(", ")),
        }
    }
}
