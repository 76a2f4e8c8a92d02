use anyhow::Result;
use clap::Parser;
use eth_balance_scanner::config::Config;
use eth_balance_scanner::formatters::{OutputFormat, format_report};
use eth_balance_scanner::{HttpTransport, LedgerClient, Scanner, SelectionStrategy};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scanner")]
#[command(
    about = "Find the address with the largest balance change over recent blocks",
    long_about = None
)]
struct Cli {
    #[arg(long)]
    rpc_url: Option<String>,

    #[arg(long)]
    window: Option<u64>,

    #[arg(long)]
    interval_ms: Option<u64>,

    #[arg(short, long, default_value = "text")]
    format: String,

    #[arg(long, value_enum)]
    selection: Option<SelectionStrategy>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format.as_str());

    let mut config = Config::from_env()?;
    if let Some(url) = cli.rpc_url {
        config.json_rpc_url = url;
    }
    if let Some(window) = cli.window {
        anyhow::ensure!(window > 0, "--window must be at least 1");
        config.window_size = window;
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.rate_limit_interval = Duration::from_millis(interval_ms);
    }
    if let Some(selection) = cli.selection {
        config.selection = selection;
    }
    info!("Configuration loaded");
    info!(
        "Window: {} blocks, rate limit interval: {:?}",
        config.window_size, config.rate_limit_interval
    );

    let transport = HttpTransport::new(&config.json_rpc_url, &config.api_key)?;
    let client = LedgerClient::new(transport, config.request_id.clone());
    info!("RPC client ready for {}", config.json_rpc_url);

    let mut scanner = Scanner::new(client, &config);

    let report = match scanner.run().await {
        Ok(report) => report,
        Err(e) => {
            error!("Scan failed: {}", e);
            return Err(e.into());
        }
    };

    println!("{}", format_report(&report, &format));

    Ok(())
}
