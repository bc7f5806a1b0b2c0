use std::path::PathBuf;

use clap::Parser;

use tron_watch::config::loader::{load_config, load_from_env};
use tron_watch::lifecycle::signals::wait_for_shutdown_signal;
use tron_watch::observability::{logging, metrics};
use tron_watch::{Shutdown, WatchService};

#[derive(Parser)]
#[command(name = "tron-watch")]
#[command(about = "Monitor TRON addresses for incoming and outgoing transfers", long_about = None)]
struct Args {
    /// TOML config file; environment variables alone are used when omitted
    #[arg(short, long, env = "TRON_WATCH_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => load_config(path),
        None => load_from_env(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging("info");
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("tron-watch v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        full_host = %config.rpc.full_host,
        poll_interval_ms = config.monitor.poll_interval_ms,
        watched = config.monitor.watch_addresses.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let service = WatchService::build(config)?;

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        trigger.trigger();
    });

    service.run(shutdown, args.config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
