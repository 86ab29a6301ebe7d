use serde::{Deserialize, Serialize};

use crate::version::{ParsedVersion, VersionRange};

/// Longest name whose generated children (services, secrets, config maps)
/// still fit the 63 characters limit of label values.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 36;

/// Annotation disabling the downgrade protection for a single update.
pub const DISABLE_DOWNGRADE_VALIDATION_ANNOTATION: &str =
    "eck.k8s.elastic.co/disable-downgrade-validation";

/// Validation settings of a single resource kind
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindSettings {
    pub versions: VersionRange,

    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,

    #[serde(default = "default_downgrade_override_annotation")]
    pub downgrade_override_annotation: String,
}

fn default_max_name_length() -> usize {
    DEFAULT_MAX_NAME_LENGTH
}

fn default_downgrade_override_annotation() -> String {
    DISABLE_DOWNGRADE_VALIDATION_ANNOTATION.to_owned()
}

impl KindSettings {
    fn with_versions(
        lowest: ParsedVersion,
        deprecated_below: ParsedVersion,
        highest: ParsedVersion,
    ) -> Self {
        KindSettings {
            versions: VersionRange::new(lowest, deprecated_below, highest)
                .expect("built-in version ranges must be consistent"),
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            downgrade_override_annotation: default_downgrade_override_annotation(),
        }
    }

    pub fn kibana() -> Self {
        Self::with_versions(
            ParsedVersion::new(6, 8, 0),
            ParsedVersion::new(8, 0, 0),
            ParsedVersion::new(9, 99, 99),
        )
    }

    pub fn enterprise_search() -> Self {
        Self::with_versions(
            ParsedVersion::new(7, 7, 0),
            ParsedVersion::new(8, 0, 0),
            ParsedVersion::new(8, 99, 99),
        )
    }

    pub fn beat() -> Self {
        Self::with_versions(
            ParsedVersion::new(7, 0, 0),
            ParsedVersion::new(8, 0, 0),
            ParsedVersion::new(9, 99, 99),
        )
    }
}

/// Process-wide validation configuration. Built once at startup and never
/// changed afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSettings {
    #[serde(default = "KindSettings::kibana")]
    pub kibana: KindSettings,

    #[serde(default = "KindSettings::enterprise_search")]
    pub enterprise_search: KindSettings,

    #[serde(default = "KindSettings::beat")]
    pub beat: KindSettings,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        ValidationSettings {
            kibana: KindSettings::kibana(),
            enterprise_search: KindSettings::enterprise_search(),
            beat: KindSettings::beat(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_fall_back_to_defaults() {
        let input = r#"
---
kibana:
  versions:
    lowestSupported: 7.17.0
    deprecatedBelow: 8.0.0
    highestSupported: 8.99.99
  maxNameLength: 20
"#;
        let settings: ValidationSettings = serde_yaml::from_str(input).unwrap();

        assert_eq!(settings.kibana.max_name_length, 20);
        assert_eq!(
            settings.kibana.versions.lowest_supported(),
            &ParsedVersion::new(7, 17, 0)
        );
        assert_eq!(
            settings.kibana.downgrade_override_annotation,
            DISABLE_DOWNGRADE_VALIDATION_ANNOTATION
        );
        assert_eq!(settings.beat, KindSettings::beat());
        assert_eq!(settings.enterprise_search, KindSettings::enterprise_search());
    }

    #[test]
    fn inconsistent_range_is_rejected() {
        let input = r#"
---
beat:
  versions:
    lowestSupported: 9.0.0
    deprecatedBelow: 8.0.0
    highestSupported: 9.99.99
"#;
        let err = serde_yaml::from_str::<ValidationSettings>(input).unwrap_err();
        assert!(err.to_string().contains("invalid version range"));
    }

    #[test]
    fn defaults_are_consistent() {
        let settings = ValidationSettings::default();
        for kind in [settings.kibana, settings.enterprise_search, settings.beat] {
            assert!(kind.versions.lowest_supported() <= kind.versions.deprecated_below());
            assert!(kind.versions.deprecated_below() <= kind.versions.highest_supported());
        }
    }
}
