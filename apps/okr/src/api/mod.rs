//! # OKR HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /statuses`, `GET /statuses/{label}` - Status taxonomy
//! - `GET|POST /objectives`, `GET|PUT|DELETE /objectives/{id}`
//! - `GET|POST /objectives/{id}/key-results`, `PUT|DELETE /key-results/{id}`
//! - `GET|POST /key-results/{id}/check-ins`
//! - `GET|POST /cadences`, `DELETE /cadences/{id}`
//! - `GET|POST /timeframes`, `DELETE /timeframes/{id}`
//! - `GET|POST /teams`, `DELETE /teams/{id}`
//! - `GET /dashboard` - Summary statistics
//! - `GET|PUT /preferences`
//! - `POST /progress/key-result` - Progress calculator
//! - `POST /seed` - Default cadences and current quarter
//!
//! ## Security Configuration
//!
//! Taken from [`SecurityConfig`]: optional bearer key, global rate limit,
//! and allowed CORS origins (localhost only when unset).

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::ApiKey;
pub use middleware::create_rate_limiter;
pub use types::{
    ApiError, ApiResponse, ApiResult, DeletedResponse, HealthResponse, ProgressRequest,
    ProgressResponse, StatusesQuery, TodayQuery, status_for,
};

use crate::config::SecurityConfig;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use okr_core::{OkrError, Workspace};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (2 MiB).
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

const CORS_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the workspace.
#[derive(Clone)]
pub struct AppState {
    pub workspace: Arc<RwLock<Workspace>>,
}

impl AppState {
    #[must_use]
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace: Arc::new(RwLock::new(workspace)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer.
///
/// - `"*"`: allows all origins (development only)
/// - unset: localhost only
/// - otherwise: comma-separated list of allowed origins
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins.map(str::trim) {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", origin);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                        None
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods(CORS_METHODS)
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(CORS_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting (if enabled)
/// 5. Authentication (if configured)
pub fn create_router(state: AppState, security: &SecurityConfig) -> Router {
    let cors = build_cors_layer(security.cors_origins.as_deref());

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/statuses", get(handlers::statuses_handler))
        .route("/statuses/{label}", get(handlers::status_display_handler))
        .route(
            "/objectives",
            get(handlers::list_objectives_handler).post(handlers::create_objective_handler),
        )
        .route(
            "/objectives/{id}",
            get(handlers::get_objective_handler)
                .put(handlers::update_objective_handler)
                .delete(handlers::delete_objective_handler),
        )
        .route(
            "/objectives/{id}/key-results",
            get(handlers::list_key_results_handler).post(handlers::create_key_result_handler),
        )
        .route(
            "/key-results/{id}",
            put(handlers::update_key_result_handler).delete(handlers::delete_key_result_handler),
        )
        .route(
            "/key-results/{id}/check-ins",
            get(handlers::list_check_ins_handler).post(handlers::create_check_in_handler),
        )
        .route(
            "/cadences",
            get(handlers::list_cadences_handler).post(handlers::create_cadence_handler),
        )
        .route("/cadences/{id}", delete(handlers::delete_cadence_handler))
        .route(
            "/timeframes",
            get(handlers::list_timeframes_handler).post(handlers::create_timeframe_handler),
        )
        .route("/timeframes/{id}", delete(handlers::delete_timeframe_handler))
        .route(
            "/teams",
            get(handlers::list_teams_handler).post(handlers::create_team_handler),
        )
        .route("/teams/{id}", delete(handlers::delete_team_handler))
        .route("/dashboard", get(handlers::dashboard_handler))
        .route(
            "/preferences",
            get(handlers::get_preferences_handler).put(handlers::update_preferences_handler),
        )
        .route("/progress/key-result", post(handlers::progress_handler))
        .route("/seed", post(handlers::seed_handler));

    // Authentication (innermost, runs last on request)
    match security.api_key() {
        Some(key) => {
            tracing::info!("API key authentication enabled");
            router = router.layer(axum_middleware::from_fn_with_state(
                ApiKey::new(key),
                auth::api_key_auth_middleware,
            ));
        }
        None => {
            tracing::warn!(
                "API key authentication DISABLED - all endpoints are publicly accessible! \
                 Set OKR_API_KEY or security.api_key to enable authentication."
            );
        }
    }

    if security.rate_limit > 0 {
        tracing::info!(
            "Rate limiting enabled: {} requests/second",
            security.rate_limit
        );
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(security.rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve the API until Ctrl-C.
///
/// The caller keeps its own clone of `state` to persist the workspace
/// after shutdown when needed.
pub async fn run_server(
    addr: &str,
    state: AppState,
    security: &SecurityConfig,
) -> Result<(), OkrError> {
    let router = create_router(state, security);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| OkrError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("OKR HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| OkrError::IoError(format!("Server error: {}", e)))?;

    tracing::info!("OKR HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

// =============================================================================
// TESTS
// =============================================================================
