//! Layered settings for the benchmark binary.
//!
//! Sources, lowest priority first:
//! - built-in defaults (the 20 accounts × 10 × 12 launches scenario)
//! - `config/lockbench.{toml,json,yaml}` if present, or an explicit file
//! - `LOCKBENCH__SECTION__KEY` environment variables

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::WorkloadConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub workload: WorkloadConfig,
    pub store: StoreSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    /// Simulated round trip charged on every in-memory storage call.
    pub latency_ms: u64,
}

impl StoreSettings {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("config/lockbench").required(false),
        };
        defaults()?
            .add_source(file)
            .add_source(
                Environment::with_prefix("LOCKBENCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("workload.account_count", 20)?
        .set_default("workload.initial_balance", 100)?
        .set_default("workload.decrement_amount", 1)?
        .set_default("workload.multiplier", 10)?
        .set_default("workload.launches", 12)?
        .set_default("store.latency_ms", 1)?
        .set_default("logging.filter", "info")
}
