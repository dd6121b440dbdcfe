//! Bridge relayer CLI
//!
//! ```text
//! bridge-relayer source       # relay Deposit events as wrap() on destination
//! bridge-relayer destination  # relay Unwrap events as withdraw() on source
//! ```

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use std::path::PathBuf;
use std::process::ExitCode;

use bridge_relayer::config::DEFAULT_CONTRACT_INFO_PATH;
use bridge_relayer::{Config, RelayOrchestrator, RpcConnector};

#[derive(Parser)]
#[command(name = "bridge-relayer")]
#[command(about = "Relay bridge events from one EVM chain to the other", long_about = None)]
struct Cli {
    /// Chain to scan: "source" or "destination"
    role: String,

    /// Path to the contract info document
    #[arg(long, default_value = DEFAULT_CONTRACT_INFO_PATH)]
    contract_info: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<ExitCode> {
    let config = Config::load()?;
    tracing::debug!(
        source_rpc = %config.source.rpc_url,
        destination_rpc = %config.destination.rpc_url,
        scan_window = config.relay.scan_window,
        "Configuration loaded"
    );

    let relay = config.relay.clone();
    let mut orchestrator =
        RelayOrchestrator::new(cli.contract_info, relay, RpcConnector::new(config));

    let report = match orchestrator.run(&cli.role).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(category = e.category().as_str(), error = %e, "Relay cycle aborted");
            return Err(eyre!(e));
        }
    };

    for failure in &report.failures {
        tracing::error!(key = %failure.key, error = %failure.error, "Event not relayed");
    }

    tracing::info!(
        role = %report.role,
        from_block = report.window.from_block,
        to_block = report.window.to_block,
        events = report.events_found,
        submitted = report.submitted.len(),
        failed = report.failures.len(),
        "Relay finished"
    );

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Initialize tracing/logging with structured output
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,bridge_relayer=debug"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}
