use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::field_error::FieldErrors;
use crate::pipeline::{Check, CheckContext};
use crate::resources::monitoring::{self, Monitoring};
use crate::resources::{ObjectSelector, SecretSource, StackResource};
use crate::settings::{KindSettings, ValidationSettings};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Kibana {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: KibanaSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KibanaSpec {
    /// Version of Kibana
    #[serde(default)]
    pub version: String,

    /// Container image, overriding the one derived from the version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elasticsearch_ref: Option<ObjectSelector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enterprise_search_ref: Option<ObjectSelector>,

    /// Free-form `kibana.yml` settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_template: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_history_limit: Option<i32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secure_settings: Vec<SecretSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring: Option<Monitoring>,
}

impl StackResource for Kibana {
    const GROUP: &'static str = "kibana.k8s.elastic.co";
    const VERSION: &'static str = "v1beta1";
    const KIND: &'static str = "Kibana";
    const PLURAL: &'static str = "kibanas";

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
        &settings.kibana
    }

    fn extra_checks() -> Vec<Check<Self>> {
        vec![Check::create("stack-monitoring", check_monitoring)]
    }
}

fn check_monitoring(_: &CheckContext<'_>, kb: &Kibana) -> FieldErrors {
    monitoring::validate(kb.spec.monitoring.as_ref(), &kb.spec.version)
}
