//! Custom resources of the Elastic Stack and the checks shared by all of them.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::admission_request::GroupVersionKind;
use crate::field_error::{FieldError, FieldErrors, FieldPath};
use crate::pipeline::{Check, CheckContext};
use crate::settings::{KindSettings, ValidationSettings};
use crate::unknown_fields::{self, LAST_APPLIED_CONFIG_ANNOTATION};
use crate::version;

pub mod beat;
pub mod enterprise_search;
pub mod kibana;
pub mod monitoring;

pub use beat::Beat;
pub use enterprise_search::EnterpriseSearch;
pub use kibana::Kibana;

/// A resource kind the webhook knows how to validate.
pub trait StackResource: DeserializeOwned + JsonSchema + Send + Sync + 'static {
    const GROUP: &'static str;
    const VERSION: &'static str;
    const KIND: &'static str;
    const PLURAL: &'static str;

    fn metadata(&self) -> &ObjectMeta;

    /// The declared Stack version, `spec.version`
    fn version(&self) -> &str;

    /// The `kind` field of the serialized object, if set
    fn type_meta_kind(&self) -> Option<&str>;

    /// The `apiVersion` field of the serialized object, if set
    fn type_meta_api_version(&self) -> Option<&str>;

    fn settings(settings: &ValidationSettings) -> &KindSettings;

    /// Create-scoped checks specific to this kind, run after the default ones
    fn extra_checks() -> Vec<Check<Self>> {
        Vec::new()
    }

    fn gvk() -> GroupVersionKind {
        GroupVersionKind::new(Self::GROUP, Self::VERSION, Self::KIND)
    }

    fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata()
            .annotations
            .as_ref()
            .and_then(|annotations| annotations.get(key))
            .map(String::as_str)
    }
}

/// Checks every kind runs, in evaluation order, followed by the
/// kind-specific ones.
pub fn checks<K: StackResource>() -> Vec<Check<K>> {
    let mut checks = vec![
        Check::create("no-unknown-fields", check_no_unknown_fields::<K>),
        Check::create("name-length", check_name_length::<K>),
        Check::create("supported-version", check_supported_version::<K>),
        Check::update("no-downgrade", check_no_downgrade::<K>),
    ];
    checks.extend(K::extra_checks());
    checks
}

pub fn check_no_unknown_fields<K: StackResource>(
    ctx: &CheckContext<'_>,
    resource: &K,
) -> FieldErrors {
    unknown_fields::detect(
        ctx.schema,
        resource.annotation(LAST_APPLIED_CONFIG_ANNOTATION),
    )
    .into()
}

/// Names are used to build the names of the children resources, which are
/// capped at 63 characters.
pub fn check_name_length<K: StackResource>(ctx: &CheckContext<'_>, resource: &K) -> FieldErrors {
    let max = ctx.settings.max_name_length;
    if resource.name().len() > max {
        FieldError::too_long(FieldPath::new("metadata").child("name"), max).into()
    } else {
        FieldErrors::new()
    }
}

pub fn check_supported_version<K: StackResource>(
    ctx: &CheckContext<'_>,
    resource: &K,
) -> FieldErrors {
    version::check_supported_version(resource.version(), &ctx.settings.versions)
}

pub fn check_no_downgrade<K: StackResource>(
    ctx: &CheckContext<'_>,
    old: &K,
    new: &K,
) -> FieldErrors {
    if downgrade_validation_disabled(ctx.settings, new) {
        return FieldErrors::new();
    }
    version::check_no_downgrade(old.version(), new.version())
}

/// The override only counts when set to exactly `true`
fn downgrade_validation_disabled<K: StackResource>(
    settings: &KindSettings,
    resource: &K,
) -> bool {
    resource.annotation(&settings.downgrade_override_annotation) == Some("true")
}

/// Reference to another resource managed by the operator
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSelector {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    /// Secret holding the connection details of a resource not managed by the operator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyToPath {
    pub key: String,
    pub path: String,
}

/// Secret whose entries are loaded into the keystore of the application
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretSource {
    #[serde(default)]
    pub secret_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<KeyToPath>,
}

/// Secret holding the configuration of the application
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSource {
    #[serde(default)]
    pub secret_name: String,
}
