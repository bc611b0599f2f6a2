//! Request → reply orchestration

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use super::language::{LanguageChoice, LanguageClassifier, LanguageDetector, LanguageTag};
use super::mood::{MoodClassifier, MoodLabel};
use super::recorder::{ConversationEntry, ConversationRecorder, ConversationStore};
use super::reply::ReplyComposer;
use super::synthesis::{SpeechSynthesizer, SynthesisJob, SynthesisRequestBuilder};
use crate::config::Config;
use crate::voice::{AudioStore, TextToSpeech};
use crate::{Error, Result};

/// One unit of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub requested_language: LanguageChoice,
}

impl Utterance {
    /// Create an utterance
    #[must_use]
    pub fn new(text: impl Into<String>, requested_language: LanguageChoice) -> Self {
        Self {
            text: text.into(),
            requested_language,
        }
    }
}

/// The textual reply to an utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyRecord {
    pub text: String,
    pub language: LanguageTag,
    pub mood: MoodLabel,
}

/// Result of handling one utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogueOutcome {
    pub reply: ReplyRecord,
    /// Present only when an audio artifact was produced
    pub audio: Option<SynthesisJob>,
}

/// Policy switches for the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Attempt audio synthesis for each reply
    pub audio_enabled: bool,
    /// Fail the request when synthesis fails instead of replying without audio
    pub strict_synthesis: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            audio_enabled: true,
            strict_synthesis: false,
        }
    }
}

/// Turns an [`Utterance`] into a [`DialogueOutcome`]
///
/// Holds no per-request state; one instance serves concurrent requests.
#[derive(Debug, Clone)]
pub struct DialoguePipeline {
    detector: LanguageDetector,
    moods: MoodClassifier,
    composer: ReplyComposer,
    synthesis: SynthesisRequestBuilder,
    recorder: ConversationRecorder,
    options: PipelineOptions,
}

impl DialoguePipeline {
    /// Start building a pipeline that stores audio in `audio_store`
    #[must_use]
    pub fn builder(audio_store: AudioStore) -> DialoguePipelineBuilder {
        DialoguePipelineBuilder::new(audio_store)
    }

    /// Policy in effect
    #[must_use]
    pub const fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Whether a synthesizer is attached and audio is enabled
    #[must_use]
    pub const fn synthesis_available(&self) -> bool {
        self.options.audio_enabled && self.synthesis.is_available()
    }

    /// Whether a conversation store is attached
    #[must_use]
    pub const fn persistence_configured(&self) -> bool {
        self.recorder.is_configured()
    }

    /// Artifact storage shared with the audio endpoint
    #[must_use]
    pub const fn audio_store(&self) -> &AudioStore {
        self.synthesis.store()
    }

    /// Handle one utterance
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for empty or whitespace-only text, before
    /// any classification, synthesis or persistence happens. In strict
    /// synthesis mode a failure of the attached synthesizer is returned as
    /// `Error::Synthesis`; with no synthesizer attached audio is skipped.
    /// Nothing else fails a request.
    pub async fn handle(&self, utterance: &Utterance) -> Result<DialogueOutcome> {
        let text = utterance.text.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput("empty input".to_string()));
        }

        let language = self.detector.detect(text, utterance.requested_language).await;
        let mood = self.moods.classify(text);
        let (reply_text, source) = self.composer.compose_with_source(text, language, mood);

        tracing::debug!(
            language = %language,
            mood = %mood,
            source = ?source,
            "reply composed"
        );

        let audio = if self.options.audio_enabled {
            self.synthesize(&reply_text, language).await?
        } else {
            None
        };

        self.recorder.record(ConversationEntry {
            timestamp: Utc::now(),
            utterance_text: utterance.text.clone(),
            reply_text: reply_text.clone(),
            language,
            mood,
            artifact_id: audio.as_ref().map(|job| job.artifact_id.clone()),
        });

        Ok(DialogueOutcome {
            reply: ReplyRecord {
                text: reply_text,
                language,
                mood,
            },
            audio,
        })
    }

    /// Wait for background conversation writes to finish
    pub async fn drain(&self) {
        self.recorder.drain().await;
    }

    async fn synthesize(&self, text: &str, language: LanguageTag) -> Result<Option<SynthesisJob>> {
        // Strictness covers a configured synthesizer failing, not its absence
        if self.options.strict_synthesis && self.synthesis.is_available() {
            return self.synthesis.try_build(text, language).await.map(Some);
        }

        let job = self.synthesis.build(text, language).await;
        Ok(job.has_output().then_some(job))
    }
}

/// Builder for [`DialoguePipeline`]
pub struct DialoguePipelineBuilder {
    detector: LanguageDetector,
    composer: ReplyComposer,
    synthesis: SynthesisRequestBuilder,
    recorder: ConversationRecorder,
    options: PipelineOptions,
    classifier_timeout: Option<Duration>,
    record_timeout: Option<Duration>,
}

impl DialoguePipelineBuilder {
    /// Create a builder with default components and no optional collaborators
    #[must_use]
    pub fn new(audio_store: AudioStore) -> Self {
        Self {
            detector: LanguageDetector::default(),
            composer: ReplyComposer::default(),
            synthesis: SynthesisRequestBuilder::new(audio_store),
            recorder: ConversationRecorder::disabled(),
            options: PipelineOptions::default(),
            classifier_timeout: None,
            record_timeout: None,
        }
    }

    /// Builder pre-populated from configuration
    ///
    /// Attaches the configured TTS backend when one is available. The
    /// conversation store is attached separately since opening it can fail.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let store = AudioStore::new(config.audio.dir.clone())
            .with_max_artifacts(config.audio.max_artifacts);
        let mut builder = Self::new(store)
            .synthesis_timeout(config.audio.timeout)
            .classifier_timeout(config.classifier_timeout)
            .record_timeout(config.persistence.timeout)
            .options(PipelineOptions {
                audio_enabled: config.audio.enabled,
                strict_synthesis: config.audio.strict,
            });

        if let Some(tts) = TextToSpeech::from_config(&config.audio) {
            tracing::info!(provider = ?tts.provider(), "audio synthesis enabled");
            builder = builder.synthesizer(Arc::new(tts));
        } else if config.audio.enabled && config.audio.strict {
            tracing::warn!(
                provider = ?config.audio.provider,
                "strict audio requested but no API key is set, replies will be text only"
            );
        }

        builder
    }

    /// Replace the language classifier
    #[must_use]
    pub fn language_classifier(mut self, classifier: Arc<dyn LanguageClassifier>) -> Self {
        self.detector = LanguageDetector::new(classifier);
        self
    }

    /// Bound language classification
    #[must_use]
    pub fn classifier_timeout(mut self, timeout: Duration) -> Self {
        self.classifier_timeout = Some(timeout);
        self
    }

    /// Replace the reply composer
    #[must_use]
    pub fn reply_composer(mut self, composer: ReplyComposer) -> Self {
        self.composer = composer;
        self
    }

    /// Attach a speech synthesizer
    #[must_use]
    pub fn synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesis = self.synthesis.with_synthesizer(synthesizer);
        self
    }

    /// Bound audio synthesis
    #[must_use]
    pub fn synthesis_timeout(mut self, timeout: Duration) -> Self {
        self.synthesis = self.synthesis.with_timeout(timeout);
        self
    }

    /// Attach a conversation store
    #[must_use]
    pub fn conversation_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.recorder = ConversationRecorder::new(store);
        self
    }

    /// Bound conversation writes
    #[must_use]
    pub fn record_timeout(mut self, timeout: Duration) -> Self {
        self.record_timeout = Some(timeout);
        self
    }

    /// Set policy switches
    #[must_use]
    pub fn options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the pipeline
    #[must_use]
    pub fn build(self) -> DialoguePipeline {
        let detector = match self.classifier_timeout {
            Some(timeout) => self.detector.with_timeout(timeout),
            None => self.detector,
        };
        let recorder = match self.record_timeout {
            Some(timeout) => self.recorder.with_timeout(timeout),
            None => self.recorder,
        };

        DialoguePipeline {
            detector,
            moods: MoodClassifier,
            composer: self.composer,
            synthesis: self.synthesis,
            recorder,
            options: self.options,
        }
    }
}
