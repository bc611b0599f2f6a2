//! Audio artifact download

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use super::{ApiError, ApiState};

/// Build audio router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/audio/{artifact_id}", get(download))
        .with_state(state)
}

/// Serve a stored artifact with its content type
async fn download(
    State(state): State<Arc<ApiState>>,
    Path(artifact_id): Path<String>,
) -> Result<Response, ApiError> {
    let (audio, format) = state.pipeline.audio_store().load(&artifact_id).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, format.content_type())],
        audio,
    )
        .into_response())
}
