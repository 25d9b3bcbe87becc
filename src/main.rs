//! Container Pinger (v1)
//!
//! Periodically reconciles container reachability into a remote status store.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐   targets   ┌──────────────┐  results  ┌──────────────┐
//!   │  discovery   │────────────▶│ probe engine │──────────▶│  reconciler  │
//!   │ (docker.sock)│             │ (ICMP fan-out)│          │ publish + GC │
//!   └──────────────┘             └──────────────┘           └──────┬───────┘
//!                                                                  │ HTTP
//!        ┌───────────────────────────────────────┐                 ▼
//!        │ Cross-cutting: config, lifecycle,     │         ┌──────────────┐
//!        │ observability (logs + metrics)        │         │ status store │
//!        └───────────────────────────────────────┘         └──────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use container_pinger::config::load_config;
use container_pinger::discovery::DockerDiscovery;
use container_pinger::lifecycle::{spawn_signal_listener, Shutdown};
use container_pinger::observability::{logging, metrics};
use container_pinger::probe::IcmpProber;
use container_pinger::store::{HttpStatusStore, StoreHandles};
use container_pinger::{ReconcileLoop, Reconciler};

#[derive(Parser)]
#[command(name = "container-pinger", version)]
#[command(about = "Probes running containers and keeps their status store in sync", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "PINGER_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Override the configured log level.
    #[arg(long)]
    log_level: Option<String>,

    /// Run a single reconciliation cycle and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args.config)?;

    let level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.observability.log_level);
    logging::init_logging(level, config.observability.log_format)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        interval_secs = config.monitor.interval_secs,
        store = %config.store.base_url,
        socket = %config.discovery.socket_path,
        "container-pinger starting"
    );

    if config.store.api_key.is_empty() {
        tracing::warn!("No status store API key configured, requests will be unauthenticated");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // Construction failures are fatal and happen before the loop starts.
    let discovery = DockerDiscovery::new(&config.discovery)?;
    let prober = IcmpProber::new(&config.probe)?;
    let store = HttpStatusStore::new(&config.store)?;

    let reconciler = Arc::new(
        Reconciler::new(
            Arc::new(discovery),
            Arc::new(prober),
            StoreHandles::shared(Arc::new(store)),
        )
        .with_publish_concurrency(config.store.publish_concurrency),
    );

    if args.once {
        let report = reconciler.run_cycle().await?;
        println!("{:#?}", report);
        return Ok(());
    }

    let shutdown = Arc::new(Shutdown::new());
    let monitor_shutdown = shutdown.subscribe();
    spawn_signal_listener(shutdown.clone());

    let cycles = ReconcileLoop::new(reconciler, config.monitor.interval())
        .run(monitor_shutdown)
        .await;

    tracing::info!(cycles, "Shutdown complete");
    Ok(())
}
