//! HTTP API server for the MINI brain

pub mod audio;
pub mod brain;
pub mod health;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{Config, DEFAULT_PORT, DEFAULT_VOICE_PROFILE};
use crate::db::ConversationRepo;
use crate::dialogue::{DialoguePipeline, LanguageChoice};
use crate::{Error, Result};

/// Shared state for API handlers
pub struct ApiState {
    pub pipeline: Arc<DialoguePipeline>,
    /// Present only when persistence is configured
    pub repo: Option<ConversationRepo>,
    pub voice_profile: String,
    /// Used when a request carries no `lang`
    pub default_language: LanguageChoice,
    /// Absolute base for `audio_url`; relative URLs when `None`
    pub public_base_url: Option<String>,
}

impl ApiState {
    /// Public URL of an audio artifact
    #[must_use]
    pub fn audio_url(&self, artifact_id: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{base}/audio/{artifact_id}"),
            None => format!("/audio/{artifact_id}"),
        }
    }
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    pipeline: DialoguePipeline,
    repo: Option<ConversationRepo>,
    voice_profile: String,
    default_language: LanguageChoice,
    public_base_url: Option<String>,
    host: String,
    port: u16,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub fn new(pipeline: DialoguePipeline) -> Self {
        Self {
            pipeline,
            repo: None,
            voice_profile: DEFAULT_VOICE_PROFILE.to_string(),
            default_language: LanguageChoice::Auto,
            public_base_url: None,
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }

    /// Apply profile, language and listener settings from configuration
    #[must_use]
    pub fn config(mut self, config: &Config) -> Self {
        self.voice_profile.clone_from(&config.voice_profile);
        self.default_language = config.default_language;
        self.public_base_url.clone_from(&config.server.public_base_url);
        self.host.clone_from(&config.server.host);
        self.port = config.server.port;
        self
    }

    /// Attach the conversation repository used by health checks
    #[must_use]
    pub fn repo(mut self, repo: ConversationRepo) -> Self {
        self.repo = Some(repo);
        self
    }

    /// Set the voice profile label
    #[must_use]
    pub fn voice_profile(mut self, voice_profile: impl Into<String>) -> Self {
        self.voice_profile = voice_profile.into();
        self
    }

    /// Set the language used when a request names none
    #[must_use]
    pub fn default_language(mut self, language: LanguageChoice) -> Self {
        self.default_language = language;
        self
    }

    /// Set the absolute base for `audio_url`
    #[must_use]
    pub fn public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Set the bind address
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the listen port
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        ApiServer {
            state: Arc::new(ApiState {
                pipeline: Arc::new(self.pipeline),
                repo: self.repo,
                voice_profile: self.voice_profile,
                default_language: self.default_language,
                public_base_url: self.public_base_url,
            }),
            host: self.host,
            port: self.port,
        }
    }
}

/// HTTP API server
pub struct ApiServer {
    state: Arc<ApiState>,
    host: String,
    port: u16,
}

impl ApiServer {
    /// Shared handler state
    #[must_use]
    pub fn state(&self) -> Arc<ApiState> {
        self.state.clone()
    }

    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let router = Router::new()
            .merge(brain::router(self.state.clone()))
            .merge(audio::router(self.state.clone()))
            .merge(health::router(self.state.clone()));

        // CORS layer for cross-origin requests from browser clients
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(
            addr = %addr,
            synthesis = self.state.pipeline.synthesis_available(),
            persistence = self.state.pipeline.persistence_configured(),
            "API server listening"
        );

        axum::serve(listener, self.router())
            .await
            .map_err(|e| Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

/// Error returned by API handlers
///
/// Renders as `{"error": {"code", "message"}}`.
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self.0 {
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "invalid_input", msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Error::Synthesis(msg) => {
                tracing::warn!(error = %msg, "request failed on synthesis");
                (StatusCode::BAD_GATEWAY, "synthesis_failed", msg)
            }
            other => {
                tracing::error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal error".to_string(),
                )
            }
        };

        (
            status,
            axum::Json(ErrorResponse {
                error: ErrorBody { code, message },
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::AudioStore;

    fn state(public_base_url: Option<&str>) -> ApiState {
        let mut builder = ApiServerBuilder::new(
            DialoguePipeline::builder(AudioStore::new("/tmp/mini-audio-unused")).build(),
        );
        if let Some(url) = public_base_url {
            builder = builder.public_base_url(url);
        }
        let server = builder.build();
        Arc::try_unwrap(server.state).ok().unwrap()
    }

    #[test]
    fn test_audio_url_relative_by_default() {
        assert_eq!(state(None).audio_url("abc"), "/audio/abc");
    }

    #[test]
    fn test_audio_url_with_public_base() {
        assert_eq!(
            state(Some("https://mini.example.com/")).audio_url("abc"),
            "https://mini.example.com/audio/abc"
        );
    }

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (Error::Synthesis("x".into()), StatusCode::BAD_GATEWAY),
            (Error::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}
