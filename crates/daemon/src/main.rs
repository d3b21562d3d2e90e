//! Workpool - Main Entry Point
//! Hosts a QueueProcessor until Ctrl+C, then shuts it down cooperatively

mod demo;
mod logging;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

use logging::{init_logging, LogFormat};
use settings::Overrides;
use workpool_core::{AppError, QueueProcessor};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_CONFIG_PATH: &str = "~/.workpool/config.toml";

#[derive(Parser)]
#[command(name = "workpool")]
#[command(about = "Bounded background work queue daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (TOML, optional)
    #[arg(long, env = "WORKPOOL_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Queue capacity
    #[arg(short, long)]
    capacity: Option<usize>,

    /// Enqueue this many synthetic items at startup
    #[arg(long)]
    demo_items: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Initialize logging
    init_logging(LogFormat::from_env()).context("failed to initialize logging")?;
    info!("Workpool v{} starting...", VERSION);

    // 2. Load configuration
    let overrides = Overrides {
        worker_count: cli.workers,
        queue_capacity: cli.capacity,
        demo_items: cli.demo_items,
    };
    let settings = settings::load(&cli.config, &overrides)?;
    info!(
        capacity = settings.processor.queue_capacity(),
        workers = settings.processor.worker_count(),
        stop_timeout_ms = settings.stop_timeout_ms,
        "Settings loaded"
    );

    // 3. Build queue + processor and start the worker pool
    let processor = QueueProcessor::with_new_queue(settings.processor);
    processor.start()?;

    // 4. Optional synthetic load
    let mut producers = (settings.demo.items > 0)
        .then(|| demo::spawn_load(Arc::clone(processor.queue()), &settings.demo));

    info!("System ready. Waiting for work items...");
    info!("Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Graceful shutdown: refuse new items, then stop the pool
    processor.queue().close();
    if let Some(producers) = producers.as_mut() {
        while let Some(joined) = producers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Demo producer failed");
            }
        }
    }

    match processor.stop(Some(settings.stop_timeout())).await {
        Ok(()) => {}
        Err(AppError::StopTimeout { pending, .. }) => {
            warn!(pending, "Workers still busy at shutdown deadline; exiting anyway");
        }
        Err(e) => return Err(e.into()),
    }

    let stats = processor.stats();
    info!(
        executed = stats.finished(),
        failed = stats.failed + stats.panicked,
        "Shutdown complete."
    );

    Ok(())
}
