//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use okr::api::{
    ApiResponse, DeletedResponse, HealthResponse, ProgressRequest, StatusesQuery, TodayQuery,
    status_for,
};
use okr_core::{
    Confidence, NewCheckIn, NewKeyResult, NewObjective, ObjectivePatch, OkrError, Percent,
    PreferencesPatch, Status, StatusLabel, Theme,
};

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_serialization() {
    let health = HealthResponse {
        status: "ok".to_string(),
        version: "0.4.2".to_string(),
    };

    let json = serde_json::to_string(&health).unwrap();
    assert!(json.contains("\"status\":\"ok\""));
    assert!(json.contains("\"version\":\"0.4.2\""));
}

// =============================================================================
// ENVELOPE TESTS
// =============================================================================

#[test]
fn test_success_envelope_serialization() {
    let response = ApiResponse::success(DeletedResponse { deleted: 7 });

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["deleted"], 7);
    assert!(json["error"].is_null());
}

#[test]
fn test_error_envelope_serialization() {
    let response = ApiResponse::<()>::error("objective 3 not found");

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["data"].is_null());
    assert_eq!(json["error"], "objective 3 not found");
}

#[test]
fn test_envelope_deserialization_without_optional_fields() {
    let response: ApiResponse<DeletedResponse> =
        serde_json::from_str(r#"{"success":true,"data":{"deleted":1}}"#).unwrap();
    assert!(response.success);
    assert_eq!(response.data, Some(DeletedResponse { deleted: 1 }));
    assert_eq!(response.error, None);
}

// =============================================================================
// ERROR MAPPING TESTS
// =============================================================================

#[test]
fn test_error_status_mapping() {
    assert_eq!(
        status_for(&OkrError::NotFound {
            kind: "objective",
            id: 1
        }),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status_for(&OkrError::validation("bad")),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_for(&OkrError::InvalidReference { kind: "team", id: 2 }),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_for(&OkrError::IoError("disk".into())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        status_for(&OkrError::SerializationError("bytes".into())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

// =============================================================================
// QUERY TESTS
// =============================================================================

#[test]
fn test_statuses_query_without_allow_list() {
    let query = StatusesQuery::default();
    assert_eq!(query.allow_list().unwrap(), None);
}

#[test]
fn test_statuses_query_parses_lenient_labels() {
    let query = StatusesQuery {
        allow: Some(" at_risk , COMPLETED,,".to_string()),
    };
    assert_eq!(
        query.allow_list().unwrap(),
        Some(vec![StatusLabel::AtRisk, StatusLabel::Completed])
    );
}

#[test]
fn test_statuses_query_rejects_unknown_label() {
    let query = StatusesQuery {
        allow: Some("Completed,Paused".to_string()),
    };
    assert!(matches!(query.allow_list(), Err(OkrError::Validation(_))));
}

#[test]
fn test_today_query_override() {
    let query: TodayQuery = serde_json::from_str(r#"{"today":"2025-02-14"}"#).unwrap();
    assert_eq!(
        query.resolve(),
        chrono::NaiveDate::from_ymd_opt(2025, 2, 14).unwrap()
    );
}

// =============================================================================
// PROGRESS CALCULATOR TESTS
// =============================================================================

#[test]
fn test_progress_request_defaults_missing_values_to_zero() {
    let request: ProgressRequest = serde_json::from_str(r#"{"target_value":4}"#).unwrap();
    assert_eq!(request.start_value, 0.0);
    assert_eq!(request.current_value, 0.0);

    let response = request.evaluate();
    assert_eq!(response.progress, Some(Percent::ZERO));
    assert_eq!(response.display, Some(0));
    assert!(!response.degenerate);
}

#[test]
fn test_progress_request_over_achievement_clamps() {
    let request = ProgressRequest {
        start_value: 0.0,
        target_value: 10.0,
        current_value: 25.0,
    };
    let response = request.evaluate();
    assert_eq!(response.progress, Some(Percent::FULL));
    assert_eq!(response.display, Some(100));
}

#[test]
fn test_progress_response_serialization_degenerate() {
    let response = ProgressRequest::default().evaluate();

    let json = serde_json::to_value(&response).unwrap();
    assert!(json["progress"].is_null());
    assert!(json["display"].is_null());
    assert_eq!(json["degenerate"], true);
}

// =============================================================================
// REQUEST BODY TESTS
// =============================================================================

#[test]
fn test_new_objective_minimal_body() {
    let request: NewObjective = serde_json::from_str(r#"{"title":"Grow"}"#).unwrap();
    assert_eq!(request.title, "Grow");
    assert_eq!(request.status, None);
    assert!(!request.is_company_objective);
}

#[test]
fn test_custom_status_survives_deserialization() {
    let request: NewObjective =
        serde_json::from_str(r#"{"title":"Legal","status":"Waiting on legal"}"#).unwrap();
    let status = request.status.unwrap();
    assert_eq!(status.known(), None);
    assert_eq!(status.as_str(), "Waiting on legal");

    let canonical: Status = serde_json::from_str(r#""at risk""#).unwrap();
    assert!(canonical.is(StatusLabel::AtRisk));
}

#[test]
fn test_new_key_result_requires_target() {
    assert!(serde_json::from_str::<NewKeyResult>(r#"{"title":"KR"}"#).is_err());

    let request: NewKeyResult =
        serde_json::from_str(r#"{"title":"KR","target_value":100,"unit":"%"}"#).unwrap();
    assert_eq!(request.start_value, 0.0);
    assert_eq!(request.current_value, None);
    assert_eq!(request.unit.as_deref(), Some("%"));
}

#[test]
fn test_check_in_confidence_snake_case() {
    let request: NewCheckIn =
        serde_json::from_str(r#"{"new_value":3.5,"confidence":"low"}"#).unwrap();
    assert_eq!(request.new_value, 3.5);
    assert_eq!(request.confidence, Some(Confidence::Low));
    assert_eq!(request.note, None);
}

#[test]
fn test_empty_patches_deserialize() {
    let patch: ObjectivePatch = serde_json::from_str("{}").unwrap();
    assert_eq!(patch.title, None);
    assert_eq!(patch.is_company_objective, None);

    let prefs: PreferencesPatch = serde_json::from_str(r#"{"theme":"light"}"#).unwrap();
    assert_eq!(prefs.theme, Some(Theme::Light));
    assert_eq!(prefs.sidebar_expanded, None);
}
