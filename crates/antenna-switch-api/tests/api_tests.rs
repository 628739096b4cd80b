//! Integration tests for the antenna switch endpoint.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Pins are simulated and the selection store is
//! in memory (or a temp file for the restart scenario), so every test
//! can observe exactly what was driven and persisted.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::sync::Arc;

use antenna_switch_api::router::build_router;
use antenna_switch_api::state::AppState;
use antenna_switch_core::{
    AntennaConfig, FileStore, Level, MemoryStore, Selector, SimulatedPins, SwitchOrder,
};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

const PINS: [u8; 4] = [17, 18, 27, 22];

struct Harness {
    state: Arc<AppState>,
    pins: SimulatedPins,
    store: MemoryStore,
}

impl Harness {
    fn new(store: MemoryStore) -> Self {
        let config = Arc::new(AntennaConfig::new(PINS.to_vec(), SwitchOrder::default()).unwrap());
        let pins = SimulatedPins::new();
        let mut selector = Selector::new(config, pins.clone(), store.clone()).unwrap();
        selector.initialize().unwrap();
        Self {
            state: Arc::new(AppState::new(selector)),
            pins,
            store,
        }
    }

    fn router(&self) -> Router {
        build_router(Arc::clone(&self.state))
    }
}

fn command_request(body: &str) -> Request<Body> {
    Request::post("/antenna_switch")
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

async fn send(router: Router, command: &str) -> (StatusCode, Value) {
    let body = serde_json::json!({ "command": command }).to_string();
    send_raw(router, command_request(&body)).await
}

async fn send_raw(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_fresh_start_selects_first_antenna() {
    let harness = Harness::new(MemoryStore::new());

    assert_eq!(harness.pins.high_pins(), vec![17]);
    assert_eq!(harness.store.value().as_deref(), Some("1"));

    let (status, json) = send(harness.router(), "s").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["payload"]["response"], "1");
}

#[tokio::test]
async fn test_select_antenna() {
    let harness = Harness::new(MemoryStore::new());

    let (status, json) = send(harness.router(), "3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({ "payload": { "response": "3" } }));

    assert_eq!(harness.pins.high_pins(), vec![27]);
    for pin in [17, 18, 22] {
        assert_eq!(harness.pins.level(pin), Some(Level::Low));
    }
    assert_eq!(harness.store.value().as_deref(), Some("3"));
}

#[tokio::test]
async fn test_repeat_select_changes_nothing() {
    let harness = Harness::new(MemoryStore::new());

    let (_, first) = send(harness.router(), "3").await;
    let pin_writes = harness.pins.write_count();
    let store_writes = harness.store.write_count();

    let (status, second) = send(harness.router(), "3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(harness.pins.write_count(), pin_writes);
    assert_eq!(harness.store.write_count(), store_writes);
}

#[tokio::test]
async fn test_status_reports_selection() {
    let harness = Harness::new(MemoryStore::with_value("2"));

    let (status, json) = send(harness.router(), "s").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["payload"]["response"], "2");

    send(harness.router(), "4").await;
    let (_, json) = send(harness.router(), "s").await;
    assert_eq!(json["payload"]["response"], "4");
}

#[tokio::test]
async fn test_count_reports_antennas() {
    let harness = Harness::new(MemoryStore::new());

    let (status, json) = send(harness.router(), "n").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["payload"]["response"], "n:4");

    send(harness.router(), "2").await;
    let (_, json) = send(harness.router(), "n").await;
    assert_eq!(json["payload"]["response"], "n:4");
}

#[tokio::test]
async fn test_invalid_commands_are_rejected_without_side_effects() {
    let harness = Harness::new(MemoryStore::new());
    let pin_writes = harness.pins.write_count();
    let store_writes = harness.store.write_count();

    for command in ["0", "5", "abc", "", "S", "-1", "1.0"] {
        let (status, json) = send(harness.router(), command).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "command {command:?}");
        assert_eq!(json, serde_json::json!({ "error": "Invalid command" }));
    }

    assert_eq!(harness.pins.write_count(), pin_writes);
    assert_eq!(harness.store.write_count(), store_writes);
    assert_eq!(harness.store.value().as_deref(), Some("1"));
}

#[tokio::test]
async fn test_malformed_bodies_are_invalid_commands() {
    let harness = Harness::new(MemoryStore::new());

    for body in ["not json", "{}", r#"{"command": 3}"#, r#"{"cmd": "1"}"#] {
        let (status, json) = send_raw(harness.router(), command_request(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(json["error"], "Invalid command");
    }

    let no_content_type = Request::post("/antenna_switch")
        .body(Body::from(r#"{"command": "2"}"#))
        .unwrap();
    let (status, _) = send_raw(harness.router(), no_content_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(harness.pins.high_pins(), vec![17]);
}

#[tokio::test]
async fn test_hardware_failure_returns_zero_sentinel() {
    let harness = Harness::new(MemoryStore::new());
    harness.pins.fail_pin(22);

    let (status, json) = send(harness.router(), "4").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, serde_json::json!({ "payload": { "response": "0" } }));
    assert_eq!(harness.store.value().as_deref(), Some("1"));

    harness.pins.clear_faults();
    let (status, json) = send(harness.router(), "4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["payload"]["response"], "4");
    assert_eq!(harness.pins.high_pins(), vec![22]);
}

#[tokio::test]
async fn test_get_is_not_routed() {
    let harness = Harness::new(MemoryStore::new());
    let response = harness
        .router()
        .oneshot(Request::get("/antenna_switch").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let harness = Harness::new(MemoryStore::new());
    let request = Request::post("/antenna_switch")
        .header("content-type", "application/json")
        .header("origin", "http://receiver.local:8073")
        .body(Body::from(r#"{"command": "s"}"#))
        .unwrap();

    let response = harness.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let allow_origin = response
        .headers()
        .get("access-control-allow-origin")
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(allow_origin, "*");
}

#[tokio::test]
async fn test_concurrent_switches_leave_store_matching_pins() {
    let harness = Harness::new(MemoryStore::new());

    let mut tasks = Vec::new();
    for round in 0..20 {
        let router = harness.router();
        let command = ["1", "2", "3", "4"][round % 4];
        tasks.push(tokio::spawn(async move { send(router, command).await }));
    }
    for task in tasks {
        let (status, _) = task.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let stored: usize = harness.store.value().unwrap().parse().unwrap();
    assert_eq!(harness.pins.high_pins(), vec![PINS[stored - 1]]);
}

#[tokio::test]
async fn test_scenario_with_state_file_survives_restart() {
    let dir = std::env::temp_dir().join(format!(
        "antenna_switch_api_scenario_{}_{:?}",
        std::process::id(),
        std::thread::current().id(),
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let state_path = dir.join("ant");
    std::fs::remove_file(&state_path).ok();

    let config = Arc::new(
        AntennaConfig::parse("num_antennas=4\nantenna_pins=[17, 18, 27, 22]\n").unwrap(),
    );

    // First run: no state file.
    let pins = SimulatedPins::new();
    let mut selector =
        Selector::new(Arc::clone(&config), pins.clone(), FileStore::new(&state_path)).unwrap();
    selector.initialize().unwrap();
    assert_eq!(pins.high_pins(), vec![17]);
    assert_eq!(std::fs::read_to_string(&state_path).unwrap(), "1");

    let router = build_router(Arc::new(AppState::new(selector)));
    let (_, json) = send(router.clone(), "3").await;
    assert_eq!(json["payload"]["response"], "3");
    assert_eq!(pins.high_pins(), vec![27]);

    let (_, json) = send(router.clone(), "5").await;
    assert_eq!(json["error"], "Invalid command");
    drop(router);

    // Second run: the selection is restored from the file.
    let pins = SimulatedPins::new();
    let mut selector =
        Selector::new(Arc::clone(&config), pins.clone(), FileStore::new(&state_path)).unwrap();
    let restored = selector.initialize().unwrap();
    assert_eq!(restored.as_str(), "3");
    assert_eq!(pins.high_pins(), vec![27]);

    let router = build_router(Arc::new(AppState::new(selector)));
    let (_, json) = send(router, "s").await;
    assert_eq!(json["payload"]["response"], "3");
}
