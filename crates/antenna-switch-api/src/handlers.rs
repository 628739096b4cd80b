//! Command endpoint handler.
//!
//! # Endpoint
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `POST` | `/antenna_switch` | `{"command": "<1..N> \| s \| n"}` |
//!
//! Successful commands answer `{"payload": {"response": "<string>"}}`.

use std::sync::Arc;

use antenna_switch_core::Command;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::error::ApiError;
use crate::state::AppState;

/// Response value meaning "no antenna": nothing persisted yet, or a
/// failed switch.
pub const NO_SELECTION: &str = "0";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /antenna_switch`.
#[derive(Debug, serde::Deserialize)]
pub struct CommandRequest {
    /// The command string.
    pub command: String,
}

/// Response body for `POST /antenna_switch`.
#[derive(Debug, serde::Serialize)]
pub struct CommandResponse {
    /// Wrapper expected by the web UI.
    pub payload: Payload,
}

/// Inner payload of a [`CommandResponse`].
#[derive(Debug, serde::Serialize)]
pub struct Payload {
    /// Selected index, active index, or `n:<count>`.
    pub response: String,
}

impl CommandResponse {
    /// Wrap a response string.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            payload: Payload {
                response: response.into(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// POST /antenna_switch
// ---------------------------------------------------------------------------

/// Parse and execute one switch command.
///
/// A body that is not JSON, or lacks a string `command`, is treated the
/// same as an unknown command. The selector lock is held for the whole
/// command.
pub async fn antenna_switch(
    State(state): State<Arc<AppState>>,
    request: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Json<CommandResponse>, ApiError> {
    let Json(request) = request.map_err(|e| ApiError::InvalidCommand(e.body_text()))?;

    let command = Command::parse(&request.command, &state.config).ok_or_else(|| {
        ApiError::InvalidCommand(format!("unrecognized command {:?}", request.command))
    })?;

    let mut selector = state.selector.lock().await;
    let response = match command {
        Command::Select(index) => selector.select(&index)?,
        Command::Status => selector
            .current()?
            .unwrap_or_else(|| NO_SELECTION.to_owned()),
        Command::Count => selector.count(),
    };
    drop(selector);

    Ok(Json(CommandResponse::new(response)))
}
