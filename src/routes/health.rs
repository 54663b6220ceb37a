//! Health check endpoints
//!
//! - /health, /healthz - Liveness (process is up)
//! - /ready, /readyz   - Readiness (store answers a ping)
//! - /version          - Build information

use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::warn;

use crate::routes::response::{json_response, ok_json, BoxBody};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// Seconds since the server started
    pub uptime: u64,
    pub timestamp: String,
    /// "development" or "production"
    pub mode: &'static str,
    /// Persistence backend in use
    pub store: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn build_health_response(state: &AppState, error: Option<String>) -> HealthResponse {
    HealthResponse {
        healthy: error.is_none(),
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        store: state.store.backend(),
        error,
    }
}

/// Liveness: always 200 while the process serves requests
pub fn health_check(state: &AppState) -> Response<BoxBody> {
    ok_json(&build_health_response(state, None))
}

/// Readiness: 503 until the store answers
pub async fn readiness_check(state: &AppState) -> Response<BoxBody> {
    match state.store.ping().await {
        Ok(()) => ok_json(&build_health_response(state, None)),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                &build_health_response(state, Some(e.message())),
            )
        }
    }
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub commit: &'static str,
    pub commit_full: &'static str,
    pub build_time: &'static str,
    pub service: &'static str,
}

/// Build information for deployment verification
pub fn version_info() -> Response<BoxBody> {
    ok_json(&VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: env!("CARGO_PKG_NAME"),
    })
}
