use serde_json::Value;
use std::{collections::HashMap, marker::PhantomData, sync::Arc};
use tracing::debug;

use crate::admission_request::GroupVersionKind;
use crate::errors::ValidationError;
use crate::pipeline::{CheckContext, CheckPipeline, ValidationOutcome};
use crate::resources::{self, Beat, EnterpriseSearch, Kibana, StackResource};
use crate::schema::FieldSchema;
use crate::settings::{KindSettings, ValidationSettings};

/// Validation entry points of a single resource kind. Objects are the raw
/// JSON documents carried by the admission request.
pub trait Validator: Send + Sync {
    fn group_version_kind(&self) -> GroupVersionKind;

    fn webhook_path(&self) -> String {
        self.group_version_kind().webhook_path()
    }

    fn validate_create(&self, object: &Value) -> Result<ValidationOutcome, ValidationError>;

    fn validate_update(
        &self,
        old: &Value,
        object: &Value,
    ) -> Result<ValidationOutcome, ValidationError>;

    fn validate_delete(&self, object: Option<&Value>)
    -> Result<ValidationOutcome, ValidationError>;
}

/// Validator of the resource kind `K`. The schema and the checks are built
/// once, when the validator is created.
pub struct ResourceValidator<K: StackResource> {
    settings: KindSettings,
    schema: FieldSchema,
    pipeline: CheckPipeline<K>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: StackResource> ResourceValidator<K> {
    pub fn new(settings: KindSettings) -> Self {
        ResourceValidator {
            settings,
            schema: FieldSchema::for_type::<K>(),
            pipeline: CheckPipeline::new(resources::checks::<K>()),
            _kind: PhantomData,
        }
    }

    fn context(&self) -> CheckContext<'_> {
        CheckContext {
            settings: &self.settings,
            schema: &self.schema,
        }
    }

    fn decode_new(object: &Value) -> Result<K, ValidationError> {
        let resource: K = serde_json::from_value(object.clone())
            .map_err(|e| ValidationError::BadRequest(format!("cannot decode {}: {e}", K::KIND)))?;
        if !names_this_kind::<K>(&resource) {
            return Err(ValidationError::BadRequest(format!(
                "object is not a {}",
                K::gvk().group_kind()
            )));
        }
        Ok(resource)
    }

    fn decode_old(object: &Value) -> Result<K, ValidationError> {
        let resource: K = serde_json::from_value(object.clone()).map_err(|e| {
            ValidationError::BadRequest(format!("cannot decode old {}: {e}", K::KIND))
        })?;
        if !names_this_kind::<K>(&resource) {
            return Err(ValidationError::InternalCast(K::KIND.to_owned()));
        }
        Ok(resource)
    }
}

/// Objects without type information are assumed to be of the expected kind.
fn names_this_kind<K: StackResource>(resource: &K) -> bool {
    let kind_matches = resource.type_meta_kind().is_none_or(|kind| kind == K::KIND);
    let group_matches = resource
        .type_meta_api_version()
        .is_none_or(|api_version| api_version.split('/').next() == Some(K::GROUP));
    kind_matches && group_matches
}

impl<K: StackResource> Validator for ResourceValidator<K> {
    fn group_version_kind(&self) -> GroupVersionKind {
        K::gvk()
    }

    fn validate_create(&self, object: &Value) -> Result<ValidationOutcome, ValidationError> {
        let resource = Self::decode_new(object)?;
        debug!(name = resource.name(), kind = K::KIND, "Validate create");

        Ok(self.pipeline.run(&self.context(), None, &resource))
    }

    fn validate_update(
        &self,
        old: &Value,
        object: &Value,
    ) -> Result<ValidationOutcome, ValidationError> {
        let resource = Self::decode_new(object)?;
        debug!(name = resource.name(), kind = K::KIND, "Validate update");
        let old = Self::decode_old(old)?;

        Ok(self.pipeline.run(&self.context(), Some(&old), &resource))
    }

    fn validate_delete(
        &self,
        object: Option<&Value>,
    ) -> Result<ValidationOutcome, ValidationError> {
        let name = object
            .and_then(|object| object.pointer("/metadata/name"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        debug!(name, kind = K::KIND, "Validate delete");

        Ok(ValidationOutcome::default())
    }
}

/// Validators indexed by the path of their webhook.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: HashMap<String, Arc<dyn Validator>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One validator per supported resource kind
    pub fn from_settings(settings: &ValidationSettings) -> Self {
        let mut registry = ValidatorRegistry::new();
        registry.register(ResourceValidator::<Kibana>::new(settings.kibana.clone()));
        registry.register(ResourceValidator::<EnterpriseSearch>::new(
            settings.enterprise_search.clone(),
        ));
        registry.register(ResourceValidator::<Beat>::new(settings.beat.clone()));
        registry
    }

    pub fn register(&mut self, validator: impl Validator + 'static) {
        self.validators
            .insert(validator.webhook_path(), Arc::new(validator));
    }

    pub fn get(&self, path: &str) -> Option<Arc<dyn Validator>> {
        self.validators.get(path).cloned()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn enterprise_search(version: &str) -> Value {
        json!({
            "apiVersion": "enterprisesearch.k8s.elastic.co/v1beta1",
            "kind": "EnterpriseSearch",
            "metadata": {"name": "webhook-test", "uid": "e7a18cfb-b017-475c-8da2-1ec941b1f285"},
            "spec": {"version": version}
        })
    }

    fn validator() -> ResourceValidator<EnterpriseSearch> {
        ResourceValidator::new(KindSettings::enterprise_search())
    }

    #[test]
    fn registry_paths() {
        let registry = ValidatorRegistry::from_settings(&ValidationSettings::default());
        let mut paths: Vec<&str> = registry.paths().collect();
        paths.sort();
        assert_eq!(
            paths,
            vec![
                "/validate-beat-k8s-elastic-co-v1beta1-beat",
                "/validate-enterprisesearch-k8s-elastic-co-v1beta1-enterprisesearch",
                "/validate-kibana-k8s-elastic-co-v1beta1-kibana",
            ]
        );
        assert!(registry.get("/validate-nothing").is_none());
    }

    #[test]
    fn create_valid() {
        let outcome = validator().validate_create(&enterprise_search("7.7.0")).unwrap();
        assert!(outcome.is_admitted());
        assert!(outcome.warnings.len() == 1);
    }

    #[test]
    fn update_collects_create_errors_after_passing_update_checks() {
        let mut object = enterprise_search("7.7.1");
        object["metadata"]["name"] = json!("x".repeat(100));

        let outcome = validator()
            .validate_update(&enterprise_search("7.7.0"), &object)
            .unwrap();
        assert_eq!(
            outcome.errors.to_string(),
            "metadata.name: Too long: may not be more than 36 bytes"
        );
    }

    #[test]
    fn downgrade_override_keeps_the_create_checks() {
        let mut object = enterprise_search("5.0.0");
        object["metadata"]["annotations"] =
            json!({"eck.k8s.elastic.co/disable-downgrade-validation": "true"});

        let outcome = validator()
            .validate_update(&enterprise_search("7.7.1"), &object)
            .unwrap();
        assert_eq!(
            outcome.errors.to_string(),
            r#"spec.version: Unsupported value: "5.0.0": Unsupported version: version 5.0.0 is lower than the lowest supported version"#
        );
    }

    #[rstest]
    #[case::undecodable(json!({"spec": {"version": 7}}))]
    #[case::other_kind(json!({"apiVersion": "kibana.k8s.elastic.co/v1beta1", "kind": "Kibana", "spec": {"version": "8.1.0"}}))]
    fn bad_new_object(#[case] object: Value) {
        let err = validator().validate_create(&object).unwrap_err();
        assert!(matches!(err, ValidationError::BadRequest(_)), "{err}");
    }

    #[test]
    fn old_object_of_another_kind() {
        let old = json!({
            "apiVersion": "kibana.k8s.elastic.co/v1beta1",
            "kind": "Kibana",
            "spec": {"version": "8.1.0"}
        });
        let err = validator()
            .validate_update(&old, &enterprise_search("8.1.0"))
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot cast old object to EnterpriseSearch type");
    }

    #[test]
    fn delete_is_always_admitted() {
        let outcome = validator()
            .validate_delete(Some(&enterprise_search("1.0.0")))
            .unwrap();
        assert!(outcome.is_admitted());
        assert!(outcome.warnings.is_empty());
        assert!(validator().validate_delete(None).unwrap().is_admitted());
    }
}
