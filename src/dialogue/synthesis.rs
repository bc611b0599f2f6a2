//! Audio synthesis requests
//!
//! Audio is an enhancement: [`SynthesisRequestBuilder::build`] always returns a
//! job, with `output_ref` left empty when synthesis was skipped or failed.
//! [`SynthesisRequestBuilder::try_build`] is the strict variant that reports
//! the failure instead.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

use super::language::LanguageTag;
use crate::voice::{AudioFormat, AudioStore};
use crate::{Error, Result};

/// Default upper bound on a single synthesis call
pub const DEFAULT_SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(10);

static ARTIFACT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("artifact id pattern is valid")
});

/// Generate a new artifact id: `<unix-millis>-<random hex>`
///
/// The random part is a v4 UUID, so ids never collide across concurrent
/// requests without any shared counter.
#[must_use]
pub fn new_artifact_id() -> String {
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

/// Whether `id` is safe to use as a file stem
#[must_use]
pub fn is_valid_artifact_id(id: &str) -> bool {
    ARTIFACT_ID.is_match(id)
}

/// A request to render reply text as audio
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesisJob {
    pub artifact_id: String,
    pub source_text: String,
    pub language: LanguageTag,
    /// Where the rendered audio lives; `None` when synthesis was skipped or failed
    pub output_ref: Option<PathBuf>,
}

impl SynthesisJob {
    /// Whether an audio artifact was produced
    #[must_use]
    pub const fn has_output(&self) -> bool {
        self.output_ref.is_some()
    }
}

/// Opaque text-to-speech engine
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Engine name for logs
    fn name(&self) -> &'static str;

    /// Container format of the returned bytes
    fn format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }

    /// Render `text` spoken in `language`
    async fn synthesize(&self, text: &str, language: LanguageTag) -> Result<Vec<u8>>;
}

/// Produces [`SynthesisJob`]s and stores their audio
#[derive(Clone)]
pub struct SynthesisRequestBuilder {
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    store: AudioStore,
    timeout: Duration,
}

impl fmt::Debug for SynthesisRequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisRequestBuilder")
            .field("synthesizer", &self.synthesizer.as_ref().map(|s| s.name()))
            .field("store", &self.store)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SynthesisRequestBuilder {
    /// Create a builder with no synthesizer; every job is skipped
    #[must_use]
    pub const fn new(store: AudioStore) -> Self {
        Self {
            synthesizer: None,
            store,
            timeout: DEFAULT_SYNTHESIS_TIMEOUT,
        }
    }

    /// Attach a synthesizer
    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Bound each synthesis call
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a synthesizer is attached
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.synthesizer.is_some()
    }

    /// Artifact storage
    #[must_use]
    pub const fn store(&self) -> &AudioStore {
        &self.store
    }

    /// Build a job, degrading to `output_ref: None` on any failure
    pub async fn build(&self, reply_text: &str, language: LanguageTag) -> SynthesisJob {
        let artifact_id = new_artifact_id();

        let output_ref = if self.synthesizer.is_none() {
            tracing::debug!(artifact_id = %artifact_id, "no synthesizer configured, skipping audio");
            None
        } else {
            match self.render(&artifact_id, reply_text, language).await {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(artifact_id = %artifact_id, error = %e, "audio synthesis failed, replying without audio");
                    None
                }
            }
        };

        SynthesisJob {
            artifact_id,
            source_text: reply_text.to_string(),
            language,
            output_ref,
        }
    }

    /// Build a job, failing if no audio could be produced
    ///
    /// # Errors
    ///
    /// Returns `Error::Synthesis` if no synthesizer is configured, or the
    /// synthesizer fails, times out, or the audio cannot be stored
    pub async fn try_build(&self, reply_text: &str, language: LanguageTag) -> Result<SynthesisJob> {
        let artifact_id = new_artifact_id();
        let path = self.render(&artifact_id, reply_text, language).await?;

        Ok(SynthesisJob {
            artifact_id,
            source_text: reply_text.to_string(),
            language,
            output_ref: Some(path),
        })
    }

    async fn render(&self, artifact_id: &str, text: &str, language: LanguageTag) -> Result<PathBuf> {
        let synthesizer = self
            .synthesizer
            .as_ref()
            .ok_or_else(|| Error::Synthesis("no synthesizer configured".to_string()))?;

        let audio = tokio::time::timeout(self.timeout, synthesizer.synthesize(text, language))
            .await
            .map_err(|_| {
                Error::Synthesis(format!(
                    "{} timed out after {:?}",
                    synthesizer.name(),
                    self.timeout
                ))
            })?
            .map_err(|e| match e {
                Error::Synthesis(_) => e,
                other => Error::Synthesis(other.to_string()),
            })?;

        if audio.is_empty() {
            return Err(Error::Synthesis(format!(
                "{} returned no audio",
                synthesizer.name()
            )));
        }

        let path = self
            .store
            .save(artifact_id, synthesizer.format(), &audio)
            .await
            .map_err(|e| Error::Synthesis(format!("failed to store audio: {e}")))?;

        tracing::debug!(
            artifact_id = %artifact_id,
            engine = synthesizer.name(),
            bytes = audio.len(),
            "audio synthesized"
        );

        Ok(path)
    }
}
