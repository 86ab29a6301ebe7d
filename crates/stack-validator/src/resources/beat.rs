use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use lazy_static::lazy_static;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::field_error::{FieldError, FieldErrors, FieldPath};
use crate::pipeline::{Check, CheckContext};
use crate::resources::monitoring::{self, Monitoring};
use crate::resources::{ConfigSource, ObjectSelector, SecretSource, StackResource};
use crate::settings::{KindSettings, ValidationSettings};

lazy_static! {
    static ref BEAT_TYPE_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9-]+$").unwrap();
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Beat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: BeatSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BeatSpec {
    /// Type of the Beat, e.g. `filebeat` or `metricbeat`
    #[serde(default, rename = "type")]
    pub beat_type: String,

    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elasticsearch_ref: Option<ObjectSelector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kibana_ref: Option<ObjectSelector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_ref: Option<ConfigSource>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secure_settings: Vec<SecretSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    /// Deploy the Beat as a DaemonSet, exclusive with `deployment`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daemon_set: Option<Value>,

    /// Deploy the Beat as a Deployment, exclusive with `daemonSet`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_history_limit: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring: Option<Monitoring>,
}

impl StackResource for Beat {
    const GROUP: &'static str = "beat.k8s.elastic.co";
    const VERSION: &'static str = "v1beta1";
    const KIND: &'static str = "Beat";
    const PLURAL: &'static str = "beats";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn version(&self) -> &str {
        &self.spec.version
    }

    fn type_meta_kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    fn type_meta_api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    fn settings(settings: &ValidationSettings) -> &KindSettings {
        &settings.beat
    }

    fn extra_checks() -> Vec<Check<Self>> {
        vec![
            Check::create("beat-type", check_beat_type),
            Check::create("single-deployment-method", check_single_deployment_method),
            Check::create("single-config-source", check_single_config_source),
            Check::create("stack-monitoring", check_monitoring),
        ]
    }
}

fn spec_path() -> FieldPath {
    FieldPath::new("spec")
}

fn check_beat_type(_: &CheckContext<'_>, beat: &Beat) -> FieldErrors {
    let beat_type = beat.spec.beat_type.as_str();
    let path = spec_path().child("type");

    if beat_type.is_empty() {
        FieldError::required(path, "Beat type is required").into()
    } else if !BEAT_TYPE_REGEX.is_match(beat_type) {
        FieldError::invalid(
            path,
            beat_type,
            format!("Beat type must match {}", BEAT_TYPE_REGEX.as_str()),
        )
        .into()
    } else {
        FieldErrors::new()
    }
}

fn check_single_deployment_method(_: &CheckContext<'_>, beat: &Beat) -> FieldErrors {
    match (&beat.spec.daemon_set, &beat.spec.deployment) {
        (Some(_), Some(_)) => FieldError::forbidden(
            spec_path(),
            "Specify either daemonSet or deployment, not both",
        )
        .into(),
        (None, None) => {
            FieldError::required(spec_path(), "Specify either daemonSet or deployment").into()
        }
        _ => FieldErrors::new(),
    }
}

fn check_single_config_source(_: &CheckContext<'_>, beat: &Beat) -> FieldErrors {
    if beat.spec.config.is_some() && beat.spec.config_ref.is_some() {
        FieldError::forbidden(spec_path(), "Specify at most one of config and configRef").into()
    } else {
        FieldErrors::new()
    }
}

fn check_monitoring(_: &CheckContext<'_>, beat: &Beat) -> FieldErrors {
    monitoring::validate(beat.spec.monitoring.as_ref(), &beat.spec.version)
}
