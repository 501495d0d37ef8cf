//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Every endpoint answers with the same envelope:
//! `{ "success": bool, "data": ..., "error": ... }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use okr_core::{OkrError, Percent, StatusLabel, key_result_progress};
use serde::{Deserialize, Serialize};

// =============================================================================
// RESPONSE ENVELOPE
// =============================================================================

/// Uniform response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Handler result: status code plus envelope, or an error response.
pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// `200 OK` with data.
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

/// `201 Created` with data.
pub fn created<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

// =============================================================================
// ERRORS
// =============================================================================

/// An engine error rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub OkrError);

impl From<OkrError> for ApiError {
    fn from(err: OkrError) -> Self {
        Self(err)
    }
}

/// HTTP status for an engine error.
#[must_use]
pub fn status_for(err: &OkrError) -> StatusCode {
    match err {
        OkrError::NotFound { .. } => StatusCode::NOT_FOUND,
        OkrError::Validation(_) | OkrError::InvalidReference { .. } => StatusCode::BAD_REQUEST,
        OkrError::SerializationError(_) | OkrError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, "Request rejected");
        }
        (status, Json(ApiResponse::<()>::error(self.0.to_string()))).into_response()
    }
}

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS QUERY
// =============================================================================

/// Query string of `GET /statuses`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusesQuery {
    /// Comma-separated allow-list of labels (`"At Risk,Behind"`).
    #[serde(default)]
    pub allow: Option<String>,
}

impl StatusesQuery {
    /// Parse the allow-list. Unknown labels are rejected.
    pub fn allow_list(&self) -> Result<Option<Vec<StatusLabel>>, OkrError> {
        let Some(raw) = &self.allow else {
            return Ok(None);
        };
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|label| {
                StatusLabel::parse(label).ok_or_else(|| {
                    OkrError::validation(format!("unknown status label '{}'", label))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

// =============================================================================
// DATE QUERY
// =============================================================================

/// Optional `?today=YYYY-MM-DD` override for date-dependent endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodayQuery {
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

impl TodayQuery {
    /// The given date, or the current UTC date.
    #[must_use]
    pub fn resolve(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Utc::now().date_naive())
    }
}

// =============================================================================
// PROGRESS CALCULATOR
// =============================================================================

/// Request of `POST /progress/key-result`. Missing values default to 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressRequest {
    #[serde(default)]
    pub start_value: f64,
    #[serde(default)]
    pub target_value: f64,
    #[serde(default)]
    pub current_value: f64,
}

/// Calculator result. `progress` is `null` for a degenerate range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub progress: Option<Percent>,
    pub display: Option<u8>,
    pub degenerate: bool,
}

impl ProgressRequest {
    #[must_use]
    pub fn evaluate(&self) -> ProgressResponse {
        let progress = key_result_progress(self.start_value, self.target_value, self.current_value);
        ProgressResponse {
            progress,
            display: progress.map(Percent::rounded),
            degenerate: progress.is_none(),
        }
    }
}

// =============================================================================
// DELETE RESPONSE
// =============================================================================

/// Acknowledgement of a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}
