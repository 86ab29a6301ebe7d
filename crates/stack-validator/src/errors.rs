use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Version string empty")]
    Empty,

    #[error("No Major.Minor.Patch elements found")]
    NoMajorMinorPatch,

    #[error("{0}")]
    Semver(String),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("cannot cast old object to {0} type")]
    InternalCast(String),
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("invalid version range: lowest supported version {lowest} must not be greater than {deprecated_below} (deprecated below)")]
    LowestAboveDeprecated {
        lowest: String,
        deprecated_below: String,
    },

    #[error("invalid version range: deprecated below version {deprecated_below} must not be greater than the highest supported version {highest}")]
    DeprecatedAboveHighest {
        deprecated_below: String,
        highest: String,
    },

    #[error("invalid version {version:?}: {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: VersionError,
    },
}
