use semver::Version;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, str::FromStr};

use crate::errors::{SettingsError, VersionError};
use crate::field_error::{FieldError, FieldErrors, FieldPath};

pub const DOWNGRADE_ERROR_MSG: &str = "Version downgrades are not supported";

/// Path of the version field, shared by every resource kind
pub fn version_path() -> FieldPath {
    FieldPath::new("spec").child("version")
}

/// A semantic version.
///
/// Equality and ordering follow semver precedence: build metadata is ignored
/// and a pre-release is lower than the matching release.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParsedVersion(Version);

impl ParsedVersion {
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        if input.is_empty() {
            return Err(VersionError::Empty);
        }

        let core = input.split(['-', '+']).next().unwrap_or_default();
        if core.split('.').count() != 3 {
            return Err(VersionError::NoMajorMinorPatch);
        }

        Version::parse(input)
            .map(ParsedVersion)
            .map_err(|e| VersionError::Semver(e.to_string()))
    }

    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        ParsedVersion(Version::new(major, minor, patch))
    }

}

/// Compare two versions using semver precedence.
pub fn compare(a: &ParsedVersion, b: &ParsedVersion) -> Ordering {
    a.0.cmp_precedence(&b.0)
}

impl PartialEq for ParsedVersion {
    fn eq(&self, other: &Self) -> bool {
        compare(self, other) == Ordering::Equal
    }
}

impl Eq for ParsedVersion {}

impl PartialOrd for ParsedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ParsedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ParsedVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParsedVersion::parse(s)
    }
}

impl TryFrom<String> for ParsedVersion {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ParsedVersion::parse(&value)
    }
}

impl From<ParsedVersion> for String {
    fn from(version: ParsedVersion) -> String {
        version.to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionClass {
    UnsupportedLow,
    UnsupportedHigh,
    Deprecated(String),
    Supported,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionRangeSpec {
    lowest_supported: String,
    deprecated_below: String,
    highest_supported: String,
}

/// Versions a resource kind can run.
///
/// Versions up to and including `deprecated_below` are still admitted, but
/// flagged as EOL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "VersionRangeSpec")]
pub struct VersionRange {
    lowest_supported: ParsedVersion,
    deprecated_below: ParsedVersion,
    highest_supported: ParsedVersion,
}

impl VersionRange {
    pub fn new(
        lowest_supported: ParsedVersion,
        deprecated_below: ParsedVersion,
        highest_supported: ParsedVersion,
    ) -> Result<Self, SettingsError> {
        if lowest_supported > deprecated_below {
            return Err(SettingsError::LowestAboveDeprecated {
                lowest: lowest_supported.to_string(),
                deprecated_below: deprecated_below.to_string(),
            });
        }
        if deprecated_below > highest_supported {
            return Err(SettingsError::DeprecatedAboveHighest {
                deprecated_below: deprecated_below.to_string(),
                highest: highest_supported.to_string(),
            });
        }

        Ok(VersionRange {
            lowest_supported,
            deprecated_below,
            highest_supported,
        })
    }

    pub fn lowest_supported(&self) -> &ParsedVersion {
        &self.lowest_supported
    }

    pub fn deprecated_below(&self) -> &ParsedVersion {
        &self.deprecated_below
    }

    pub fn highest_supported(&self) -> &ParsedVersion {
        &self.highest_supported
    }

    pub fn classify(&self, version: &ParsedVersion) -> VersionClass {
        if version < &self.lowest_supported {
            VersionClass::UnsupportedLow
        } else if version > &self.highest_supported {
            VersionClass::UnsupportedHigh
        } else if version <= &self.deprecated_below {
            VersionClass::Deprecated(format!(
                "Version {version} is EOL and support for it will be removed in a future release of the operator"
            ))
        } else {
            VersionClass::Supported
        }
    }
}

impl TryFrom<VersionRangeSpec> for VersionRange {
    type Error = SettingsError;

    fn try_from(spec: VersionRangeSpec) -> Result<Self, Self::Error> {
        let parse = |version: String| {
            ParsedVersion::parse(&version)
                .map_err(|source| SettingsError::InvalidVersion { version, source })
        };
        VersionRange::new(
            parse(spec.lowest_supported)?,
            parse(spec.deprecated_below)?,
            parse(spec.highest_supported)?,
        )
    }
}

fn parse_for_field(version: &str) -> Result<ParsedVersion, FieldError> {
    ParsedVersion::parse(version).map_err(|e| {
        FieldError::invalid(version_path(), version, format!("Invalid version: {e}"))
    })
}

/// Returns the EOL warning, if any. An unparseable version is reported as
/// an error; range violations are left to [`check_supported_version`].
pub fn check_deprecated_version(
    version: &str,
    range: &VersionRange,
) -> (Option<String>, FieldErrors) {
    match parse_for_field(version) {
        Err(e) => (None, e.into()),
        Ok(parsed) => match range.classify(&parsed) {
            VersionClass::Deprecated(warning) => (Some(warning), FieldErrors::new()),
            _ => (None, FieldErrors::new()),
        },
    }
}

pub fn check_supported_version(version: &str, range: &VersionRange) -> FieldErrors {
    let parsed = match parse_for_field(version) {
        Ok(parsed) => parsed,
        Err(e) => return e.into(),
    };

    match range.classify(&parsed) {
        VersionClass::UnsupportedLow => FieldError::not_supported(
            version_path(),
            version,
            format!(
                "Unsupported version: version {parsed} is lower than the lowest supported version"
            ),
        )
        .into(),
        VersionClass::UnsupportedHigh => FieldError::not_supported(
            version_path(),
            version,
            format!(
                "Unsupported version: version {parsed} is higher than the highest supported version"
            ),
        )
        .into(),
        VersionClass::Deprecated(_) | VersionClass::Supported => FieldErrors::new(),
    }
}

/// Reject `current` when it is lower than `previous`.
///
/// A previous version that cannot be parsed has nothing to be compared
/// against, the check is skipped.
pub fn check_no_downgrade(previous: &str, current: &str) -> FieldErrors {
    let Ok(previous) = ParsedVersion::parse(previous) else {
        return FieldErrors::new();
    };
    let current = match parse_for_field(current) {
        Ok(current) => current,
        Err(e) => return e.into(),
    };

    if compare(&current, &previous) == Ordering::Less {
        FieldError::forbidden(version_path(), DOWNGRADE_ERROR_MSG).into()
    } else {
        FieldErrors::new()
    }
}
