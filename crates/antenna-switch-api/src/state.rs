//! Shared application state for the command endpoint.
//!
//! [`AppState`] wraps the [`Selector`] in an async mutex. Every command
//! holds the lock for its whole read-check-write sequence, so at most
//! one switch is in flight and the persisted index never disagrees with
//! the driven pins because of interleaved requests.

use std::sync::Arc;

use antenna_switch_core::{AntennaConfig, Selector};
use tokio::sync::Mutex;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug)]
pub struct AppState {
    /// Immutable pin map, available without taking the selector lock.
    pub config: Arc<AntennaConfig>,
    /// The selection state machine.
    pub selector: Mutex<Selector>,
}

impl AppState {
    /// Create the application state around an initialized selector.
    pub fn new(selector: Selector) -> Self {
        Self {
            config: selector.shared_config(),
            selector: Mutex::new(selector),
        }
    }
}
