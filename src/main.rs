use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use smppsim::bootstrap::Server;
use smppsim::config::{Config, Overrides};
use smppsim::telemetry::{init_tracing, TracingConfig};

#[derive(Parser, Debug)]
#[command(name = "smppsim")]
#[command(author, version, about = "SMPP SMSC simulator with synthetic delivery receipts")]
struct Args {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(long = "bind", env = "SMPPSIM_BIND", value_name = "ADDR")]
    address: Option<IpAddr>,

    /// Listen port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Minimum receipt delay in seconds
    #[arg(long, env = "DDMIN", value_name = "SECONDS")]
    ddmin: Option<f64>,

    /// Maximum receipt delay in seconds
    #[arg(long, env = "DDMAX", value_name = "SECONDS")]
    ddmax: Option<f64>,

    /// Comma separated receipt outcomes, used round-robin
    #[arg(short, long, env = "STATUS", value_name = "LIST")]
    statuses: Option<String>,

    /// Credential table, `system_id:password,...`
    #[arg(long, env = "SMPPSIM_AUTH", value_name = "TABLE")]
    auth: Option<String>,

    /// Single accepted system_id
    #[arg(long, env = "ESME_USERNAME")]
    system_id: Option<String>,

    /// Password for --system-id
    #[arg(long, env = "PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON logs on the console
    #[arg(long)]
    json_logs: bool,

    /// Also write JSON logs to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Validate config and exit
    #[arg(long)]
    validate: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            address: self.address,
            port: self.port,
            min_delay_secs: self.ddmin,
            max_delay_secs: self.ddmax,
            statuses: self.statuses.clone(),
            auth: self.auth.clone(),
            system_id: self.system_id.clone(),
            password: self.password.clone(),
            log_level: self.log_level.clone(),
            json_logs: self.json_logs,
            log_file: self.log_file.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Load configuration first (to get log settings)
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let overridden = args.overrides().apply(&mut config);

    let tracing_config = TracingConfig {
        service_name: "smppsim".to_string(),
        log_level: config.telemetry.log_level.clone(),
        json_logs: config.telemetry.json_logs,
        log_file: config.telemetry.log_file.clone(),
    };
    let _guard = init_tracing(&tracing_config)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?args.config,
        "starting smppsim"
    );

    if let Err(e) = overridden.and_then(|()| config.validate()) {
        error!(error = %e, "invalid configuration");
        return Ok(ExitCode::FAILURE);
    }

    info!(
        address = %config.listen_addr(),
        statuses = ?config.delivery.statuses,
        credentials = config.auth.len(),
        "configuration loaded"
    );

    // Validate only mode
    if args.validate {
        info!("configuration is valid");
        return Ok(ExitCode::SUCCESS);
    }

    let server = Server::new(config)?;
    server.run().await?;

    Ok(ExitCode::SUCCESS)
}
