//! Admission validation of the Elastic Stack custom resources.
//!
//! Every resource kind runs the same default checks (unknown fields, name
//! length, supported version, no downgrade) plus its own, see
//! [`resources`]. The entry point is the [`ValidatorRegistry`], which maps
//! webhook paths to the [`Validator`] of each kind.

pub mod admission_request;
pub mod admission_response;
pub mod errors;
pub mod field_error;
pub mod pipeline;
pub mod resources;
pub mod schema;
pub mod settings;
pub mod unknown_fields;
pub mod validator;
pub mod version;

pub use admission_request::{AdmissionRequest, AdmissionReviewRequest, GroupVersionKind, Operation};
pub use admission_response::AdmissionResponse;
pub use errors::ValidationError;
pub use field_error::{FieldError, FieldErrorKind, FieldErrors, FieldPath};
pub use pipeline::ValidationOutcome;
pub use settings::{KindSettings, ValidationSettings};
pub use validator::{ResourceValidator, Validator, ValidatorRegistry};
