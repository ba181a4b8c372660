use std::{io, path::PathBuf};

use anyhow::Result;
use clap::{ArgAction, Parser};
use netdev_server::config::{self, CliServerOptions};
use tracing_subscriber::EnvFilter;

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "netdev-server", version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Path to a TOML file with a [server] table
    #[arg(long = "config", value_name = "FILE")]
    config_path: Option<PathBuf>,

    /// Host to bind (default: localhost)
    #[arg(long = "host", value_name = "HOST")]
    host: Option<String>,

    /// Port to bind (default: 8080)
    #[arg(long = "port", value_name = "PORT")]
    port: Option<u16>,

    /// Device log file (default: network_devices.log)
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Skip per-element field checks on PUT/PATCH
    #[arg(long = "lenient-batches", action = ArgAction::SetTrue)]
    lenient_batches: bool,

    /// Optional log filter (e.g. info, debug)
    #[arg(long = "log-level", value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.log_level.as_deref());
    tracing::info!("netdev-server {SERVER_VERSION}");

    let cli = CliServerOptions {
        host: args.host,
        port: args.port,
        log_file: args.log_file,
        lenient_batches: args.lenient_batches,
    };

    let file_config = config::load_file_config(args.config_path.as_deref())?;
    let server_config = config::resolve_config(&cli, file_config.as_ref());

    netdev_server::run_http_server(server_config).await
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
