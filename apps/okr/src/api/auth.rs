//! # Authentication Module
//!
//! Simple API key authentication for the OKR HTTP API.
//!
//! ## Configuration
//!
//! The key comes from `security.api_key` in `okr.toml` or from `OKR_API_KEY`.
//! When set, all requests except `/health` must carry it.
//!
//! ## Usage
//!
//! Send the API key in the Authorization header:
//! ```text
//! Authorization: Bearer <your-api-key>
//! ```

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

// =============================================================================
// API KEY AUTHENTICATION
// =============================================================================

/// The configured key, shared with the middleware through router state.
#[derive(Clone)]
pub struct ApiKey(Arc<str>);

impl ApiKey {
    #[must_use]
    pub fn new(key: &str) -> Self {
        Self(Arc::from(key))
    }

    /// Constant-time comparison against a provided key.
    ///
    /// Both keys are padded to the same length so `ct_eq` always runs over
    /// the same number of bytes.
    #[must_use]
    pub fn matches(&self, provided: &str) -> bool {
        let provided_bytes = provided.as_bytes();
        let expected_bytes = self.0.as_bytes();

        let max_len = provided_bytes.len().max(expected_bytes.len());
        let mut padded_provided = vec![0u8; max_len];
        let mut padded_expected = vec![0u8; max_len];
        padded_provided[..provided_bytes.len()].copy_from_slice(provided_bytes);
        padded_expected[..expected_bytes.len()].copy_from_slice(expected_bytes);

        let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
        bytes_match && provided_bytes.len() == expected_bytes.len()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// API key authentication middleware.
///
/// - `/health` is always allowed (for load balancer health checks)
/// - All other endpoints require `Authorization: Bearer <key>`
pub async fn api_key_auth_middleware(
    State(expected): State<ApiKey>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(header_value) => {
            // Both "Bearer <key>" and raw "<key>" are accepted
            let provided_key = header_value.strip_prefix("Bearer ").unwrap_or(header_value);

            if expected.matches(provided_key) {
                Ok(next.run(request).await)
            } else {
                tracing::warn!(
                    event = "auth_failure",
                    reason = "invalid_api_key",
                    "Authentication failed: invalid API key"
                );
                Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
            }
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                "Missing Authorization header"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
