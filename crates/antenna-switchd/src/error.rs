//! Error types for the daemon binary.
//!
//! [`DaemonError`] is the top-level error type that wraps all possible
//! failure modes during startup and serving.

/// Top-level error for the daemon binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// The pin map could not be loaded.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: antenna_switch_core::ConfigError,
    },

    /// The GPIO controller could not be opened.
    #[error("gpio error: {source}")]
    Gpio {
        /// The underlying pin error.
        #[from]
        source: antenna_switch_core::PinError,
    },

    /// Pins could not be claimed or the selection could not be restored.
    #[error("startup selection failed: {source}")]
    Selection {
        /// The underlying selector error.
        #[from]
        source: antenna_switch_core::SelectError,
    },

    /// The HTTP endpoint failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: antenna_switch_api::ServerError,
    },
}
