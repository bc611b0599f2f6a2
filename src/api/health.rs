//! Health check endpoint

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// A conversation store is configured and answers
    pub persistence: bool,
    /// A synthesizer is attached and audio is enabled
    pub synthesis: bool,
}

/// Liveness plus collaborator status
///
/// Degraded collaborators never fail the health check; the service still answers.
async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        persistence: check_persistence(&state),
        synthesis: state.pipeline.synthesis_available(),
    })
}

/// Check database connectivity
fn check_persistence(state: &ApiState) -> bool {
    let Some(repo) = &state.repo else {
        return false;
    };

    match repo.ping() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "persistence health check failed");
            false
        }
    }
}

/// Build health router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}
