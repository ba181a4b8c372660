use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use netdev_client::{default_scenario, Runner, RunnerConfig, DEFAULT_SERVER_URL};
use tracing_subscriber::EnvFilter;

const BANNER_RULE: &str = "========================================";

#[derive(Parser, Debug)]
#[command(name = "netdev-client", version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Server URL
    #[arg(long = "url", value_name = "URL", default_value = DEFAULT_SERVER_URL)]
    url: String,

    /// Pause between requests in milliseconds
    #[arg(long = "delay-ms", value_name = "MS", default_value_t = 500)]
    delay_ms: u64,

    /// Pause before the first request in milliseconds
    #[arg(long = "startup-delay-ms", value_name = "MS", default_value_t = 1000)]
    startup_delay_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long = "timeout-secs", value_name = "SECS", default_value_t = 10)]
    timeout_secs: u64,

    /// Optional log filter (e.g. warn, debug)
    #[arg(long = "log-level", value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    let runner = Runner::new(RunnerConfig {
        url: args.url,
        delay: Duration::from_millis(args.delay_ms),
        startup_delay: Duration::from_millis(args.startup_delay_ms),
        timeout: Duration::from_secs(args.timeout_secs),
    })?;

    let mut out = io::stdout();
    writeln!(out, "{BANNER_RULE}")?;
    writeln!(out, "HTTP Клієнт для тестування сервера")?;
    writeln!(out, "{BANNER_RULE}\n")?;

    let summary = runner
        .run(&default_scenario(), &mut out)
        .await
        .context("Failed to write client report")?;
    tracing::info!(
        completed = summary.completed,
        failed = summary.failed,
        "scenario finished"
    );

    writeln!(out, "\n{BANNER_RULE}")?;
    writeln!(out, "Тестування завершено успішно!")?;
    writeln!(out, "{BANNER_RULE}")?;

    Ok(())
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
