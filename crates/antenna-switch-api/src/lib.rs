//! HTTP command endpoint for the antenna switch.
//!
//! This crate provides an Axum HTTP server exposing a single route,
//! `POST /antenna_switch`, used by the receiver's web UI to select an
//! antenna, poll the active one, and learn how many exist.
//!
//! # Architecture
//!
//! Handlers parse the command against the immutable
//! [`AntennaConfig`](antenna_switch_core::AntennaConfig), then run it on
//! the shared [`Selector`](antenna_switch_core::Selector) under an async
//! mutex. CORS is open to any origin; the server binds to loopback only.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{bind, serve, start_server, ServerConfig, ServerError};
pub use state::AppState;
