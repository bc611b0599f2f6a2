//! Dialogue endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState};
use crate::Error;
use crate::dialogue::{LanguageChoice, LanguageTag, MoodLabel, Utterance};

/// Build dialogue router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api", post(converse))
        .with_state(state)
}

/// Service banner
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub voice_profile: String,
    pub version: &'static str,
}

async fn root(State(state): State<Arc<ApiState>>) -> Json<RootResponse> {
    Json(RootResponse {
        status: "MINI brain active",
        message: "POST /api with JSON {input, lang} to receive a reply",
        voice_profile: state.voice_profile.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Dialogue request
#[derive(Debug, Deserialize)]
pub struct ConverseRequest {
    #[serde(default)]
    pub input: String,
    /// "auto", "en", "hi"; unsupported codes fall back to detection
    #[serde(default)]
    pub lang: Option<String>,
}

/// Dialogue response
#[derive(Debug, Serialize)]
pub struct ConverseResponse {
    pub reply: String,
    pub mood: MoodLabel,
    pub lang: LanguageTag,
    pub audio_url: Option<String>,
    pub voice_profile: String,
}

async fn converse(
    State(state): State<Arc<ApiState>>,
    body: Result<Json<ConverseRequest>, JsonRejection>,
) -> Result<Json<ConverseResponse>, ApiError> {
    let Json(request) = body.map_err(|e| Error::InvalidInput(e.body_text()))?;

    let requested_language = request
        .lang
        .as_deref()
        .map_or(state.default_language, LanguageChoice::parse);

    let outcome = state
        .pipeline
        .handle(&Utterance::new(request.input, requested_language))
        .await?;

    let audio_url = outcome
        .audio
        .as_ref()
        .map(|job| state.audio_url(&job.artifact_id));

    Ok(Json(ConverseResponse {
        reply: outcome.reply.text,
        mood: outcome.reply.mood,
        lang: outcome.reply.language,
        audio_url,
        voice_profile: state.voice_profile.clone(),
    }))
}
