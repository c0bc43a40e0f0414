use clap::Parser;
use monitor::{config::Config, metrics::Metrics, server, Monitor};
use prometheus::Registry;
use state::ClassificationStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use validator::NodeClient;

#[derive(Debug, Parser)]
#[command(about = "Faultproof withdrawal monitor")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("Starting faultproof withdrawal monitor");
    info!("Loading config: {:?}", cli.config);
    let config = Config::from_file(&cli.config)?;

    info!("  L1 RPC URL: {}", config.l1_rpc_url);
    info!("  L2 RPC URL: {}", config.l2_rpc_url);
    info!("  Metrics listen: {}", config.metrics_listen);

    let l1_provider = validator::create_provider(&config.l1_rpc_url)?;
    let l2_provider = validator::create_provider(&config.l2_rpc_url)?;
    let node = Arc::new(NodeClient::new(l1_provider, l2_provider));

    // Seeding heights is a hard startup requirement: if either chain cannot
    // be reached the monitor must not come up half-initialized.
    let store = Arc::new(ClassificationStore::new(node.as_ref()).await?);

    let registry = Registry::new();
    let metrics = Metrics::new(&registry)?;

    let listen = config.metrics_listen.clone();
    std::thread::spawn(move || {
        if let Err(e) = server::serve(&listen, registry) {
            error!(error = %e, "metrics server exited");
        }
    });

    let monitor = Monitor::new(
        store,
        metrics,
        node,
        Duration::from_secs(config.snapshot_interval_secs),
    );

    info!("Starting snapshot loop...");
    tokio::select! {
        () = monitor.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }

    Ok(())
}
