//! Daemon settings
//!
//! Layered with the `config` crate, later sources win:
//! 1. built-in defaults
//! 2. optional TOML file (`--config`, `~` expanded)
//! 3. `WORKPOOL__*` environment variables (e.g. `WORKPOOL__PROCESSOR__WORKER_COUNT=4`)
//! 4. command-line overrides

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;
use workpool_core::application::worker::constants::DEFAULT_STOP_TIMEOUT;
use workpool_core::domain::config::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKER_COUNT};
use workpool_core::ProcessorConfig;

const DEFAULT_DEMO_ITEM_DURATION_MS: i64 = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub processor: ProcessorConfig,
    /// Upper bound on waiting for workers at shutdown
    pub stop_timeout_ms: u64,
    pub demo: DemoSettings,
}

/// Synthetic load fed into the queue at startup
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DemoSettings {
    pub items: usize,
    pub item_duration_ms: u64,
    pub producers: usize,
}

impl Settings {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

/// Values supplied on the command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub worker_count: Option<usize>,
    pub queue_capacity: Option<usize>,
    pub demo_items: Option<usize>,
}

fn defaults() -> Result<ConfigBuilder<DefaultState>> {
    Ok(Config::builder()
        .set_default("processor.queue_capacity", DEFAULT_QUEUE_CAPACITY as i64)?
        .set_default("processor.worker_count", DEFAULT_WORKER_COUNT as i64)?
        .set_default("stop_timeout_ms", DEFAULT_STOP_TIMEOUT.as_millis() as i64)?
        .set_default("demo.items", 0_i64)?
        .set_default("demo.item_duration_ms", DEFAULT_DEMO_ITEM_DURATION_MS)?
        .set_default("demo.producers", 1_i64)?)
}

fn apply_overrides(
    builder: ConfigBuilder<DefaultState>,
    overrides: &Overrides,
) -> Result<ConfigBuilder<DefaultState>> {
    Ok(builder
        .set_override_option(
            "processor.worker_count",
            overrides.worker_count.map(|v| v as i64),
        )?
        .set_override_option(
            "processor.queue_capacity",
            overrides.queue_capacity.map(|v| v as i64),
        )?
        .set_override_option("demo.items", overrides.demo_items.map(|v| v as i64))?)
}

/// Load settings from every layer
pub fn load(config_path: &str, overrides: &Overrides) -> Result<Settings> {
    let path = shellexpand::tilde(config_path).into_owned();

    let builder = defaults()?
        .add_source(File::with_name(&path).format(FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix("WORKPOOL")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

    apply_overrides(builder, overrides)?
        .build()
        .with_context(|| format!("failed to read settings (file: {})", path))?
        .try_deserialize()
        .context("invalid settings")
}

/// Load settings from a TOML string on top of the defaults
#[cfg(test)]
fn from_toml_str(toml: &str, overrides: &Overrides) -> Result<Settings> {
    let builder = defaults()?.add_source(File::from_str(toml, FileFormat::Toml));
    apply_overrides(builder, overrides)?
        .build()?
        .try_deserialize()
        .context("invalid settings")
}
