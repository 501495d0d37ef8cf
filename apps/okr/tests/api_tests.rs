//! Integration tests for the OKR HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use okr::api::{AppState, HealthResponse, create_router};
use okr::config::SecurityConfig;
use okr_core::Workspace;
use serde_json::{Value, json};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// No auth and no rate limit.
fn open_security() -> SecurityConfig {
    SecurityConfig {
        api_key: None,
        rate_limit: 0,
        cors_origins: None,
    }
}

/// Create a test server over a fresh in-memory workspace.
fn create_test_server() -> TestServer {
    create_server_with(open_security())
}

fn create_server_with(security: SecurityConfig) -> TestServer {
    let state = AppState::new(Workspace::new());
    let router = create_router(state, &security);
    TestServer::new(router).unwrap()
}

/// `data` of a successful envelope.
fn data(body: &Value) -> &Value {
    assert_eq!(body["success"], json!(true), "unexpected envelope: {}", body);
    &body["data"]
}

async fn create_objective(server: &TestServer, body: Value) -> u64 {
    let response = server.post("/objectives").json(&body).await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    data(&body)["id"].as_u64().unwrap()
}

async fn create_key_result(server: &TestServer, objective_id: u64, body: Value) -> u64 {
    let response = server
        .post(&format!("/objectives/{}/key-results", objective_id))
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    data(&body)["id"].as_u64().unwrap()
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// STATUS TAXONOMY TESTS
// =============================================================================

#[tokio::test]
async fn test_statuses_lists_canonical_order() {
    let server = create_test_server();

    let response = server.get("/statuses").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let values: Vec<&str> = data(&body)
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["value"].as_str().unwrap())
        .collect();
    assert_eq!(
        values,
        vec![
            "Not Started",
            "In Progress",
            "At Risk",
            "Behind",
            "Completed",
            "Cancelled"
        ]
    );
}

#[tokio::test]
async fn test_statuses_allow_list() {
    let server = create_test_server();

    let response = server
        .get("/statuses")
        .add_query_param("allow", "Behind,in progress")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let options = data(&body).as_array().unwrap();
    assert_eq!(options.len(), 2);
    assert_eq!(options[0]["value"], "In Progress");
    assert_eq!(options[1]["value"], "Behind");
}

#[tokio::test]
async fn test_statuses_unknown_allow_label_rejected() {
    let server = create_test_server();

    let response = server
        .get("/statuses")
        .add_query_param("allow", "Blocked")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("Blocked"));
}

#[tokio::test]
async fn test_status_display_known_and_unknown() {
    let server = create_test_server();

    let known: Value = server.get("/statuses/at%20risk").await.json();
    assert_eq!(data(&known)["label"], "At Risk");
    assert_eq!(data(&known)["tone"], "warning");

    let unknown: Value = server.get("/statuses/Blocked").await.json();
    assert_eq!(data(&unknown)["label"], "Blocked");
    assert_eq!(data(&unknown)["tone"], "unknown");
    assert_eq!(data(&unknown)["description"], "Status unknown");
}

// =============================================================================
// OBJECTIVE ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_objective_crud() {
    let server = create_test_server();
    let id = create_objective(
        &server,
        json!({ "title": "Grow revenue", "status": "In Progress", "progress": 40 }),
    )
    .await;

    let body: Value = server.get(&format!("/objectives/{}", id)).await.json();
    let view = data(&body);
    assert_eq!(view["objective"]["title"], "Grow revenue");
    assert_eq!(view["progress_display"], 40);
    assert_eq!(view["status"]["label"], "In Progress");

    let response = server
        .put(&format!("/objectives/{}", id))
        .json(&json!({ "status": "Behind" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(data(&body)["status"], "Behind");
    assert_eq!(data(&body)["title"], "Grow revenue");

    let list: Value = server.get("/objectives").await.json();
    assert_eq!(data(&list).as_array().unwrap().len(), 1);

    let response = server.delete(&format!("/objectives/{}", id)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(data(&body)["deleted"], id);

    server
        .get(&format!("/objectives/{}", id))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_objective_empty_title_rejected() {
    let server = create_test_server();

    let response = server.post("/objectives").json(&json!({ "title": "  " })).await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_objective_inverted_period_rejected() {
    let server = create_test_server();

    let response = server
        .post("/objectives")
        .json(&json!({
            "title": "Backwards",
            "start_date": "2025-06-30",
            "end_date": "2025-04-01"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_objective_with_missing_team_is_invalid_reference() {
    let server = create_test_server();

    let response = server
        .post("/objectives")
        .json(&json!({ "title": "Orphan", "team_id": 99 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_missing_objective_not_found() {
    let server = create_test_server();

    let response = server
        .put("/objectives/42")
        .json(&json!({ "title": "Ghost" }))
        .await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["success"], json!(false));
}

// =============================================================================
// KEY RESULT & CHECK-IN TESTS
// =============================================================================

#[tokio::test]
async fn test_objective_progress_is_mean_of_key_results() {
    let server = create_test_server();
    let objective = create_objective(&server, json!({ "title": "Three KRs" })).await;
    for current in [10.0, 10.0, 0.0] {
        create_key_result(
            &server,
            objective,
            json!({
                "title": "KR",
                "start_value": 0,
                "target_value": 10,
                "current_value": current
            }),
        )
        .await;
    }

    let body: Value = server
        .get(&format!("/objectives/{}", objective))
        .await
        .json();
    let view = data(&body);
    assert_eq!(view["progress_display"], 67);
    assert_eq!(view["key_results"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_decreasing_key_result_progress() {
    let server = create_test_server();
    let objective = create_objective(&server, json!({ "title": "Reduce churn" })).await;
    let kr = create_key_result(
        &server,
        objective,
        json!({ "title": "Churn %", "start_value": 10, "target_value": 0, "current_value": 4 }),
    )
    .await;

    let body: Value = server
        .get(&format!("/objectives/{}/key-results", objective))
        .await
        .json();
    let krs = data(&body).as_array().unwrap();
    assert_eq!(krs.len(), 1);
    assert_eq!(krs[0]["key_result"]["id"], kr);
    assert_eq!(krs[0]["progress_display"], 60);
}

#[tokio::test]
async fn test_key_result_degenerate_range_rejected() {
    let server = create_test_server();
    let objective = create_objective(&server, json!({ "title": "Flat" })).await;

    let response = server
        .post(&format!("/objectives/{}/key-results", objective))
        .json(&json!({ "title": "Nothing to do", "start_value": 5, "target_value": 5 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_key_result_under_missing_objective_not_found() {
    let server = create_test_server();

    let response = server
        .post("/objectives/7/key-results")
        .json(&json!({ "title": "KR", "target_value": 1 }))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_check_in_updates_key_result() {
    let server = create_test_server();
    let objective = create_objective(
        &server,
        json!({ "title": "Ship", "status": "At Risk" }),
    )
    .await;
    let kr = create_key_result(
        &server,
        objective,
        json!({ "title": "Features", "target_value": 4, "unit": "features" }),
    )
    .await;

    let response = server
        .post(&format!("/key-results/{}/check-ins", kr))
        .json(&json!({ "new_value": 4, "note": "done", "confidence": "high" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let check_in = data(&body);
    assert_eq!(check_in["previous_value"], 0.0);
    assert_eq!(check_in["new_value"], 4.0);
    assert_eq!(check_in["new_progress"], 100.0);
    assert_eq!(check_in["improvement"], 100.0);
    assert_eq!(check_in["confidence"], "high");

    let history: Value = server
        .get(&format!("/key-results/{}/check-ins", kr))
        .await
        .json();
    assert_eq!(data(&history).as_array().unwrap().len(), 1);

    let body: Value = server
        .get(&format!("/objectives/{}", objective))
        .await
        .json();
    let view = data(&body);
    assert_eq!(view["progress_display"], 100);
    assert_eq!(view["key_results"][0]["key_result"]["is_completed"], true);
    // Status is never derived from progress
    assert_eq!(view["status"]["label"], "At Risk");
}

#[tokio::test]
async fn test_check_ins_for_missing_key_result_not_found() {
    let server = create_test_server();

    server
        .get("/key-results/3/check-ins")
        .await
        .assert_status_not_found();
    server
        .post("/key-results/3/check-ins")
        .json(&json!({ "new_value": 1 }))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_update_and_delete_key_result() {
    let server = create_test_server();
    let objective = create_objective(&server, json!({ "title": "Edit" })).await;
    let kr = create_key_result(&server, objective, json!({ "title": "KR", "target_value": 8 }))
        .await;

    let response = server
        .put(&format!("/key-results/{}", kr))
        .json(&json!({ "current_value": 2 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(data(&body)["progress"], 25.0);

    server
        .delete(&format!("/key-results/{}", kr))
        .await
        .assert_status_ok();
    server
        .delete(&format!("/key-results/{}", kr))
        .await
        .assert_status_not_found();
}

// =============================================================================
// CADENCE, TIMEFRAME & TEAM TESTS
// =============================================================================

#[tokio::test]
async fn test_timeframe_requires_cadence() {
    let server = create_test_server();

    let response = server
        .post("/timeframes")
        .json(&json!({
            "cadence_id": 9,
            "name": "Q1",
            "start_date": "2025-01-01",
            "end_date": "2025-03-31"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cadence_delete_removes_timeframes() {
    let server = create_test_server();

    let response = server
        .post("/cadences")
        .json(&json!({ "name": "Quarterly", "color": "#3B82F6" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let cadence = data(&body)["id"].as_u64().unwrap();
    assert_eq!(data(&body)["color"], "#3b82f6");

    server
        .post("/timeframes")
        .json(&json!({
            "cadence_id": cadence,
            "name": "Q1 2025",
            "start_date": "2025-01-01",
            "end_date": "2025-03-31",
            "is_active": true
        }))
        .await
        .assert_status(StatusCode::CREATED);

    server
        .delete(&format!("/cadences/{}", cadence))
        .await
        .assert_status_ok();

    let timeframes: Value = server.get("/timeframes").await.json();
    assert!(data(&timeframes).as_array().unwrap().is_empty());
    let cadences: Value = server.get("/cadences").await.json();
    assert!(data(&cadences).as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_team_delete_detaches_objectives() {
    let server = create_test_server();

    let response = server.post("/teams").json(&json!({ "name": "Growth" })).await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let team = data(&body)["id"].as_u64().unwrap();

    let objective =
        create_objective(&server, json!({ "title": "Owned", "team_id": team })).await;

    server
        .delete(&format!("/teams/{}", team))
        .await
        .assert_status_ok();

    let body: Value = server
        .get(&format!("/objectives/{}", objective))
        .await
        .json();
    assert_eq!(data(&body)["objective"]["team_id"], Value::Null);
}

// =============================================================================
// DASHBOARD, PREFERENCES & SEED TESTS
// =============================================================================

#[tokio::test]
async fn test_dashboard_summary() {
    let server = create_test_server();
    create_objective(
        &server,
        json!({ "title": "Done", "status": "Completed", "progress": 100 }),
    )
    .await;
    create_objective(
        &server,
        json!({ "title": "Late", "status": "Behind", "end_date": "2025-01-31" }),
    )
    .await;

    let response = server
        .get("/dashboard")
        .add_query_param("today", "2025-03-01")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let summary = data(&body);
    assert_eq!(summary["total_objectives"], 2);
    assert_eq!(summary["completed_objectives"], 1);
    assert_eq!(summary["at_risk_objectives"], 1);
    assert_eq!(summary["overdue_objectives"], 1);
    assert_eq!(summary["completion_rate"], 50.0);
    assert!(summary["current_timeframe"].is_null());
    assert!(summary["time_remaining"].is_null());

    server
        .post("/seed")
        .add_query_param("today", "2025-03-01")
        .await
        .assert_status_ok();
    let body: Value = server
        .get("/dashboard")
        .add_query_param("today", "2025-03-01")
        .await
        .json();
    let summary = data(&body);
    assert_eq!(summary["current_timeframe"]["name"], "Q1 2025");
    let elapsed = summary["time_elapsed"].as_f64().unwrap();
    let remaining = summary["time_remaining"].as_f64().unwrap();
    assert!(elapsed > 0.0 && remaining > 0.0);
    assert!((elapsed + remaining - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_preferences_default_and_update() {
    let server = create_test_server();

    let body: Value = server.get("/preferences").await.json();
    assert_eq!(data(&body)["theme"], "system");
    assert_eq!(data(&body)["sidebar_expanded"], true);

    let response = server
        .put("/preferences")
        .json(&json!({ "theme": "dark" }))
        .await;
    response.assert_status_ok();

    let body: Value = server.get("/preferences").await.json();
    assert_eq!(data(&body)["theme"], "dark");
    assert_eq!(data(&body)["sidebar_expanded"], true);
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let server = create_test_server();

    let first: Value = server
        .post("/seed")
        .add_query_param("today", "2025-05-10")
        .await
        .json();
    assert_eq!(data(&first)["cadences_created"], 3);
    assert_eq!(data(&first)["timeframes_created"], 1);

    let second: Value = server
        .post("/seed")
        .add_query_param("today", "2025-05-10")
        .await
        .json();
    assert_eq!(data(&second)["cadences_created"], 0);
    assert_eq!(data(&second)["timeframes_created"], 0);

    let timeframes: Value = server.get("/timeframes").await.json();
    let timeframes = data(&timeframes).as_array().unwrap();
    assert_eq!(timeframes.len(), 1);
    assert_eq!(timeframes[0]["name"], "Q2 2025");
    assert_eq!(timeframes[0]["start_date"], "2025-04-01");
    assert_eq!(timeframes[0]["end_date"], "2025-06-30");
}

// =============================================================================
// PROGRESS CALCULATOR TESTS
// =============================================================================

#[tokio::test]
async fn test_progress_calculator() {
    let server = create_test_server();

    let response = server
        .post("/progress/key-result")
        .json(&json!({ "start_value": 0, "target_value": 3, "current_value": 2 }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(data(&body)["display"], 67);
    assert_eq!(data(&body)["degenerate"], false);
}

#[tokio::test]
async fn test_progress_calculator_degenerate_range() {
    let server = create_test_server();

    let response = server
        .post("/progress/key-result")
        .json(&json!({ "start_value": 5, "target_value": 5, "current_value": 9 }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(data(&body)["progress"], Value::Null);
    assert_eq!(data(&body)["degenerate"], true);
}

// =============================================================================
// ERROR HANDLING TESTS
// =============================================================================

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let server = create_test_server();

    let response = server.get("/unknown").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let server = create_test_server();

    // /health is GET only
    let response = server.post("/health").await;
    assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_invalid_json_body() {
    let server = create_test_server();

    let response = server
        .post("/objectives")
        .text("not valid json")
        .content_type("application/json")
        .await;

    assert!(response.status_code().is_client_error());
}

// =============================================================================
// AUTHENTICATION MIDDLEWARE TESTS
// =============================================================================

fn create_auth_test_server(api_key: &str) -> TestServer {
    create_server_with(SecurityConfig {
        api_key: Some(api_key.to_string()),
        ..open_security()
    })
}

fn auth_header(value: &str) -> HeaderValue {
    value.parse::<HeaderValue>().unwrap()
}

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let api_key = "test-secret-key-12345";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/objectives")
        .add_header(header::AUTHORIZATION, auth_header(&format!("Bearer {}", api_key)))
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_valid_raw_token() {
    let api_key = "test-raw-key-67890";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/dashboard")
        .add_header(header::AUTHORIZATION, auth_header(api_key))
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let server = create_auth_test_server("correct-key");

    let response = server
        .get("/objectives")
        .add_header(header::AUTHORIZATION, auth_header("Bearer wrong-key"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let server = create_auth_test_server("correct-key");

    let response = server.get("/objectives").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_health_endpoint_bypasses_auth() {
    let server = create_auth_test_server("correct-key");

    let response = server.get("/health").await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_bearer_prefix_only_rejected() {
    let server = create_auth_test_server("correct-key");

    let response = server
        .get("/objectives")
        .add_header(header::AUTHORIZATION, auth_header("Bearer "))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_configured_key_disables_auth() {
    let server = create_server_with(SecurityConfig {
        api_key: Some(String::new()),
        ..open_security()
    });

    server.get("/objectives").await.assert_status_ok();
}

// =============================================================================
// RATE LIMIT TESTS
// =============================================================================

#[tokio::test]
async fn test_rate_limit_rejects_burst() {
    let server = create_server_with(SecurityConfig {
        rate_limit: 1,
        ..open_security()
    });

    server.get("/health").await.assert_status_ok();
    server
        .get("/health")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}
