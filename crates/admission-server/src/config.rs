use anyhow::{Result, anyhow};
use clap::ArgMatches;
use lazy_static::lazy_static;
use stack_validator::ValidationSettings;
use std::fs::File;
use std::net::SocketAddr;
use std::path::Path;

pub static SERVICE_NAME: &str = "stack-admission-server";

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
}

pub struct Config {
    pub addr: SocketAddr,
    pub tls_config: Option<TlsConfig>,
    pub validation_settings: ValidationSettings,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
}

pub struct TlsConfig {
    pub cert_file: String,
    pub key_file: String,
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;

        let (cert_file, key_file) = tls_files(matches)?;
        let tls_config = if cert_file.is_empty() {
            None
        } else {
            Some(TlsConfig {
                cert_file,
                key_file,
            })
        };

        let validation_settings = match matches.get_one::<String>("validation-settings") {
            None => ValidationSettings::default(),
            Some(path) => read_validation_settings_file(Path::new(path)).map_err(|e| {
                anyhow!("error while loading validation settings from {path:?}: {e}")
            })?,
        };

        let log_level = matches
            .get_one::<String>("log-level")
            .expect("This should not happen, there's a default value for log-level")
            .to_owned();
        let log_fmt = matches
            .get_one::<String>("log-fmt")
            .expect("This should not happen, there's a default value for log-fmt")
            .to_owned();
        let log_no_color = matches
            .get_one::<bool>("log-no-color")
            .expect("clap should have assigned a default value")
            .to_owned();

        Ok(Self {
            addr,
            tls_config,
            validation_settings,
            log_level,
            log_fmt,
            log_no_color,
        })
    }
}

fn api_bind_address(matches: &ArgMatches) -> Result<SocketAddr> {
    format!(
        "{}:{}",
        matches
            .get_one::<String>("address")
            .expect("clap should have assigned a default value"),
        matches
            .get_one::<String>("port")
            .expect("clap should have assigned a default value")
    )
    .parse()
    .map_err(|e| anyhow!("error parsing arguments: {}", e))
}

fn tls_files(matches: &ArgMatches) -> Result<(String, String)> {
    let cert_file = matches
        .get_one::<String>("cert-file")
        .expect("clap should have assigned a default value")
        .to_owned();
    let key_file = matches
        .get_one::<String>("key-file")
        .expect("clap should have assigned a default value")
        .to_owned();
    if cert_file.is_empty() != key_file.is_empty() {
        Err(anyhow!(
            "error parsing arguments: either both --cert-file and --key-file must be provided, or neither"
        ))
    } else {
        Ok((cert_file, key_file))
    }
}

/// Read the validation settings from a YAML file. Kinds missing from the
/// file keep their default settings.
pub fn read_validation_settings_file(path: &Path) -> Result<ValidationSettings> {
    let settings_file = File::open(path)?;
    let settings: ValidationSettings = serde_yaml::from_reader(&settings_file)?;

    Ok(settings)
}
