//! Headless driver for the Clanfield simulation.
//!
//! Loads configuration, builds the engine, and steps it in real time until
//! a stopping rule fires, the configured tick bound is reached, or the
//! process receives Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `$CLANFIELD_CONFIG` or `clanfield-config.yaml`
//! 3. Build the engine (field, roster, execution mode)
//! 4. Run the tick loop
//! 5. Log the result and the run summary

mod error;
mod runner;

use std::path::PathBuf;
use std::sync::Arc;

use clanfield_core::{EngineHandle, SimulationConfig};
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::DriverError;
use crate::runner::LogCallback;

/// Default config file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "clanfield-config.yaml";

/// Ticks between progress lines.
const PROGRESS_EVERY: u64 = 50;

/// Application entry point for the driver.
///
/// # Errors
///
/// Returns an error if configuration, engine construction, or a tick fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("clanfield-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        seed = ?config.seed,
        width = config.field.width,
        height = config.field.height,
        mode = %config.mode.kind,
        dt = config.dt,
        tick_interval_ms = config.driver.tick_interval_ms,
        "Configuration loaded"
    );
    let driver = config.driver.clone();

    // 3. Build the engine.
    let mut handle = EngineHandle::new();
    handle.initialize(config)?;
    let engine = handle.engine().map_err(DriverError::from)?;
    info!(
        seed = engine.seed(),
        clans = engine.clans().len(),
        "Engine initialized"
    );
    let handle = Arc::new(Mutex::new(handle));

    // 4. Run until done or interrupted.
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C, running until done");
            std::future::pending::<()>().await;
        }
    };
    let mut callback = LogCallback::new(PROGRESS_EVERY);
    let result = runner::run_simulation(Arc::clone(&handle), &driver, &mut callback, shutdown)
        .await
        .map_err(DriverError::from)?;

    // 5. Log results.
    runner::log_run_end(&result);
    let summary = handle.lock().await.summary().map_err(DriverError::from)?;
    let summary_json = serde_json::to_string(&summary).map_err(DriverError::from)?;
    info!(summary = %summary_json, "clanfield-engine shutdown complete");

    Ok(())
}

/// Load the configuration named by `CLANFIELD_CONFIG`, falling back to
/// `clanfield-config.yaml` and then to built-in defaults.
fn load_config() -> Result<SimulationConfig, DriverError> {
    let path = std::env::var_os("CLANFIELD_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        Ok(SimulationConfig::from_file(&path)?)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(SimulationConfig::default())
    }
}
