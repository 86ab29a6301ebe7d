use admission_server::{AdmissionServer, cli, config, config::Config, tracing::setup_tracing};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let matches = cli::build_cli().get_matches();
    let config = match Config::from_args(&matches) {
        Ok(config) => config,
        Err(e) => fatal_error(e.to_string(), false),
    };

    if let Err(e) = setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color) {
        fatal_error(e.to_string(), false);
    }

    // axum-server relies on the process-wide crypto provider
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        fatal_error("cannot install the rustls crypto provider".to_owned(), true);
    }

    info!(service = config::SERVICE_NAME, version = env!("CARGO_PKG_VERSION"), "starting");

    let server = match AdmissionServer::new_from_config(config) {
        Ok(server) => server,
        Err(e) => fatal_error(e.to_string(), true),
    };
    if let Err(e) = server.run().await {
        fatal_error(e.to_string(), true);
    }
}

fn fatal_error(msg: String, trace_system_ready: bool) -> ! {
    if trace_system_ready {
        error!("{}", msg);
    } else {
        eprintln!("{msg}");
    }

    process::exit(1);
}
