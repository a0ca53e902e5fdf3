use std::io::{self, BufReader};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use notify_core::config::DEFAULT_BASE_URL;
use notify_core::{Config, Dispatcher};
use notify_mcp::McpServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// MCP server exposing webhook notifications and channel management as tools
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the notification API
    #[arg(long, env = "NOTIFY_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// Admin token; enables the channel-management tools
    #[arg(long, env = "NOTIFY_ADMIN_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,

    /// Log debug output to stderr
    #[arg(long, env = "NOTIFY_DEBUG", value_parser = clap::builder::BoolishValueParser::new())]
    debug: bool,

    /// Timeout for each outbound request, in seconds
    #[arg(long, env = "NOTIFY_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::new(&cli.api_url)
        .with_admin_token(cli.admin_token)
        .with_debug(cli.debug)
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    init_tracing(config.debug);

    info!(
        api_url = %config.base_url,
        channel_management = config.capabilities().channel_management(),
        "starting notify-mcp on stdio"
    );

    let server = McpServer::new(Dispatcher::from_config(&config));
    server
        .serve(BufReader::new(io::stdin()), io::stdout())
        .context("stdio transport failed")?;

    info!("stdin closed, shutting down");
    Ok(())
}

// stdout carries protocol frames, so logs go to stderr.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
