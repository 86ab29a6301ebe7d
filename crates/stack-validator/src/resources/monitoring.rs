//! Stack monitoring: metrics and logs of an application shipped by sidecar
//! Beats to dedicated Elasticsearch clusters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::field_error::{FieldError, FieldErrors, FieldPath};
use crate::resources::ObjectSelector;
use crate::version::{ParsedVersion, version_path};

/// Oldest Stack version shipping the monitoring Beats configuration.
pub const MIN_STACK_MONITORING_VERSION: ParsedVersion = ParsedVersion::new(7, 14, 0);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Monitoring {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MonitoringTarget>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<MonitoringTarget>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringTarget {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elasticsearch_refs: Vec<ObjectSelector>,
}

impl Monitoring {
    fn metrics_refs(&self) -> &[ObjectSelector] {
        self.metrics
            .as_ref()
            .map(|target| target.elasticsearch_refs.as_slice())
            .unwrap_or_default()
    }

    fn logs_refs(&self) -> &[ObjectSelector] {
        self.logs
            .as_ref()
            .map(|target| target.elasticsearch_refs.as_slice())
            .unwrap_or_default()
    }

    pub fn is_enabled(&self) -> bool {
        !self.metrics_refs().is_empty() || !self.logs_refs().is_empty()
    }
}

/// Validate the monitoring section of a resource running `version`.
///
/// Nothing is checked when monitoring is not configured. An unparseable
/// version is left to the version checks.
pub fn validate(monitoring: Option<&Monitoring>, version: &str) -> FieldErrors {
    let Some(monitoring) = monitoring.filter(|m| m.is_enabled()) else {
        return FieldErrors::new();
    };

    let mut errors = FieldErrors::new();

    let too_old = ParsedVersion::parse(version)
        .is_ok_and(|parsed| parsed < MIN_STACK_MONITORING_VERSION);
    if too_old {
        errors.push(FieldError::invalid(
            version_path(),
            version,
            format!(
                "Unsupported version for Stack Monitoring. Required >= {MIN_STACK_MONITORING_VERSION}."
            ),
        ));
    }

    for (target, label, refs) in [
        ("metrics", "Metrics", monitoring.metrics_refs()),
        ("logs", "Logs", monitoring.logs_refs()),
    ] {
        if refs.len() > 1 {
            errors.push(FieldError::invalid(
                FieldPath::new("spec")
                    .child("monitoring")
                    .child(target)
                    .child("elasticsearchRefs"),
                refs.len().to_string(),
                format!("Only one Elasticsearch reference is supported for {label} Stack Monitoring"),
            ));
        }
    }

    errors
}
