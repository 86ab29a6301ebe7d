//! HTTP(S) server exposing one validating admission webhook per Elastic
//! Stack resource kind.
//!
//! The webhooks are registered with `failurePolicy: Ignore`: when this
//! server cannot be reached the API server admits the objects without
//! validating them. The validation is advisory, not a guarantee.

pub mod api;
pub mod cli;
pub mod config;
pub mod tracing;

use ::tracing::info;
use anyhow::{Result, anyhow};
use axum::{
    Router,
    routing::{get, post},
};
use axum_server::tls_rustls::RustlsConfig;
use stack_validator::ValidatorRegistry;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;

use crate::api::{
    handlers::{readiness_handler, validate_handler},
    state::ApiServerState,
};
use crate::config::{Config, TlsConfig};

pub struct AdmissionServer {
    router: Router,
    addr: SocketAddr,
    tls_config: Option<TlsConfig>,
}

impl AdmissionServer {
    pub fn new_from_config(config: Config) -> Result<Self> {
        let validators = ValidatorRegistry::from_settings(&config.validation_settings);
        if validators.is_empty() {
            return Err(anyhow!("no resource kind to validate"));
        }
        for path in validators.paths() {
            info!(path, "webhook registered");
        }

        Ok(Self {
            router: build_router(validators),
            addr: config.addr,
            tls_config: config.tls_config,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn run(self) -> Result<()> {
        match self.tls_config {
            Some(tls_config) => {
                let rustls_config =
                    RustlsConfig::from_pem_file(&tls_config.cert_file, &tls_config.key_file)
                        .await
                        .map_err(|e| anyhow!("cannot load the TLS certificate and key: {e}"))?;

                info!(address = %self.addr, "started HTTPS server");
                axum_server::bind_rustls(self.addr, rustls_config)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            None => {
                info!(address = %self.addr, "started HTTP server");
                axum_server::bind(self.addr)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        Ok(())
    }
}

fn build_router(validators: ValidatorRegistry) -> Router {
    let paths: Vec<String> = validators.paths().map(str::to_owned).collect();
    let state = Arc::new(ApiServerState { validators });

    let mut router = Router::new().route("/readiness", get(readiness_handler));
    for path in paths {
        router = router.route(&path, post(validate_handler));
    }

    router.with_state(state).layer(TraceLayer::new_for_http())
}
