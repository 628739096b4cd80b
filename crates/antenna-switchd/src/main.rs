//! Antenna switch daemon.
//!
//! Main entry point that wires the pin map, the GPIO driver, the
//! persisted selection, and the HTTP command endpoint together.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Resolve file locations from the environment
//! 3. Load and validate `antenna_switcher.cfg` (fatal on any error)
//! 4. Open the GPIO driver and claim every antenna pin as an output
//! 5. Restore the persisted selection, healing it to antenna 1 if absent
//!    or invalid
//! 6. Serve `POST /antenna_switch` on `127.0.0.1:8075` until `Ctrl-C`

mod error;
mod settings;

use std::sync::Arc;

use antenna_switch_api::{AppState, ServerConfig};
use antenna_switch_core::{AntennaConfig, FileStore, Selector};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::DaemonError;
use crate::settings::ServiceConfig;

/// Application entry point for the daemon.
///
/// # Errors
///
/// Returns an error if any startup step or the server itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("antenna-switchd starting");

    if let Err(e) = run().await {
        error!(error = %e, "antenna-switchd failed");
        return Err(e.into());
    }

    info!("antenna-switchd shutdown complete");
    Ok(())
}

async fn run() -> Result<(), DaemonError> {
    // 2. Resolve file locations.
    let settings = ServiceConfig::from_env();
    info!(
        config_path = %settings.config_path.display(),
        state_path = %settings.state_path.display(),
        "Service settings resolved"
    );

    // 3. Load the pin map.
    let config = Arc::new(AntennaConfig::from_file(&settings.config_path)?);
    info!(
        antennas = config.antenna_count(),
        pins = ?config.pins(),
        switch_order = %config.switch_order(),
        "Antenna configuration loaded"
    );

    // 4. Claim the pins.
    let pins = open_pins()?;
    let store = FileStore::new(settings.state_path);
    let mut selector = Selector::new(config, pins, store)?;

    // 5. Restore the selection.
    let active = selector.initialize()?;
    info!(antenna = %active, "Antenna selection initialized");

    // 6. Serve the command endpoint.
    let state = Arc::new(AppState::new(selector));
    antenna_switch_api::start_server(&ServerConfig::default(), state).await?;

    Ok(())
}

#[cfg(feature = "gpio")]
fn open_pins() -> Result<antenna_switch_core::GpioPins, DaemonError> {
    Ok(antenna_switch_core::GpioPins::new()?)
}

#[cfg(not(feature = "gpio"))]
#[allow(clippy::unnecessary_wraps)]
fn open_pins() -> Result<antenna_switch_core::SimulatedPins, DaemonError> {
    tracing::warn!("built without the gpio feature, driving simulated pins");
    Ok(antenna_switch_core::SimulatedPins::new())
}
