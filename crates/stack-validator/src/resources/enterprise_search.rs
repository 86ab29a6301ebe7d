use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resources::{ConfigSource, ObjectSelector, StackResource};
use crate::settings::{KindSettings, ValidationSettings};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnterpriseSearch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: EnterpriseSearchSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnterpriseSearchSpec {
    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i32>,

    /// Free-form `enterprise-search.yml` settings, merged with `configRef`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_ref: Option<ConfigSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elasticsearch_ref: Option<ObjectSelector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_template: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_history_limit: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
}

impl StackResource for EnterpriseSearch {
    const GROUP: &'static str = "enterprisesearch.k8s.elastic.co";
    const VERSION: &'static str = "v1beta1";
    const KIND: &'static str = "EnterpriseSearch";
    const PLURAL: &'static str = "enterprisesearches";

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
        &settings.enterprise_search
    }
}
