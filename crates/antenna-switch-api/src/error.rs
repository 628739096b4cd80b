//! Error types for the command endpoint.
//!
//! [`ApiError`] unifies the endpoint's failure modes into a single enum
//! that converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.
//!
//! | Variant | Status | Body |
//! |---------|--------|------|
//! | `InvalidCommand` | 400 | `{"error": "Invalid command"}` |
//! | `Switch` | 500 | `{"payload": {"response": "0"}}` |
//!
//! The 500 body reuses the `"0"` sentinel the web UI already
//! understands. The cause is logged, never sent to the client.

use antenna_switch_core::SelectError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::handlers::{CommandResponse, NO_SELECTION};

/// Errors that can occur while handling a switch command.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body or command string was not understood.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The selector failed to read, drive, or persist the selection.
    #[error("switch failed: {0}")]
    Switch(#[from] SelectError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidCommand(reason) => {
                tracing::debug!(reason = %reason, "rejected command");
                let body = serde_json::json!({ "error": "Invalid command" });
                (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
            }
            Self::Switch(e) => {
                tracing::error!(error = %e, "antenna switch command failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(CommandResponse::new(NO_SELECTION)),
                )
                    .into_response()
            }
        }
    }
}
