use std::process;

use admission_gateway::{AdmissionGateway, cli, config, tracing::setup_tracing};
use anyhow::Result;
use tokio::runtime::Runtime;
use tracing::{debug, error};

fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = match config::Config::from_args(&matches) {
        Ok(config) => config,
        Err(err) => fatal_error(false, err.to_string()),
    };

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        fatal_error(false, "cannot install the ring crypto provider".to_owned());
    }

    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(err) => fatal_error(false, format!("error initializing tokio runtime: {err}")),
    };

    rt.block_on(async {
        // Setup the tracing system. This MUST be done inside of a tokio Runtime
        // because some collectors rely on it and would panic otherwise.
        if let Err(err) = setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)
        {
            fatal_error(false, err.to_string());
        }
        debug!("tracing system ready");

        let gateway = match AdmissionGateway::new_from_config(config).await {
            Ok(gateway) => gateway,
            Err(err) => fatal_error(true, err.to_string()),
        };

        if let Err(err) = gateway.run().await {
            fatal_error(true, err.to_string());
        }
    });

    Ok(())
}

fn fatal_error(trace_system_ready: bool, msg: String) -> ! {
    if trace_system_ready {
        error!("{}", msg);
    } else {
        eprintln!("{msg}");
    }

    process::exit(1);
}
