//! Axum router construction for the command endpoint.
//!
//! Assembles the single route into a [`Router`] with CORS middleware
//! enabled so the receiver's web UI can call it from any origin.

use std::sync::Arc;

use axum::routing::post;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Path of the command endpoint.
pub const SWITCH_PATH: &str = "/antenna_switch";

/// Build the complete Axum router.
///
/// The router includes:
/// - `POST /antenna_switch` -- select, query, or count antennas
///
/// CORS allows any origin, method, and header.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(SWITCH_PATH, post(handlers::antenna_switch))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
