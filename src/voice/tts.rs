//! Text-to-speech (TTS) backends

use std::fmt;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::AudioConfig;
use crate::dialogue::{LanguageTag, SpeechSynthesizer};
use crate::{Error, Result};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// ElevenLabs model used when the configured one cannot speak Hindi
const ELEVENLABS_MULTILINGUAL_MODEL: &str = "eleven_multilingual_v2";

/// TTS provider backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    #[default]
    OpenAI,
    ElevenLabs,
}

impl TtsProvider {
    /// Parse a provider name
    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "elevenlabs" | "eleven_labs" => Some(Self::ElevenLabs),
            _ => None,
        }
    }
}

/// Synthesizes speech from text over HTTP
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    voice: String,
    speed: f32,
    model: String,
    base_url: String,
    provider: TtsProvider,
}

impl fmt::Debug for TextToSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextToSpeech")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TextToSpeech {
    /// Create a new TTS instance using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(api_key: String, voice: String, speed: f32, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: SecretString::from(api_key),
            voice,
            speed,
            model,
            base_url: OPENAI_BASE_URL.to_string(),
            provider: TtsProvider::OpenAI,
        })
    }

    /// Create a new TTS instance using ElevenLabs
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_elevenlabs(api_key: String, voice_id: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for TTS".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: SecretString::from(api_key),
            voice: voice_id,
            speed: 1.0, // ElevenLabs doesn't use speed in the same way
            model,
            base_url: ELEVENLABS_BASE_URL.to_string(),
            provider: TtsProvider::ElevenLabs,
        })
    }

    /// Point at an API-compatible server instead of the public endpoint
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the configured backend, if audio is enabled and a key is present
    ///
    /// Returns `None` when synthesis should be off; that is a normal operating
    /// mode, not an error.
    #[must_use]
    pub fn from_config(audio: &AudioConfig) -> Option<Self> {
        if !audio.enabled {
            return None;
        }

        let built = match audio.provider {
            TtsProvider::OpenAI => audio.openai_api_key.clone().map(|key| {
                #[allow(clippy::cast_possible_truncation)]
                let speed = audio.speed as f32;
                Self::new_openai(key, audio.voice.clone(), speed, audio.model.clone())
            }),
            TtsProvider::ElevenLabs => audio
                .elevenlabs_api_key
                .clone()
                .map(|key| Self::new_elevenlabs(key, audio.voice.clone(), audio.model.clone())),
        };

        match built {
            Some(Ok(tts)) => Some(match &audio.base_url {
                Some(url) => tts.with_base_url(url.clone()),
                None => tts,
            }),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "TTS misconfigured, audio disabled");
                None
            }
            None => {
                tracing::info!(provider = ?audio.provider, "no TTS API key, audio disabled");
                None
            }
        }
    }

    /// Provider in use
    #[must_use]
    pub const fn provider(&self) -> TtsProvider {
        self.provider
    }

    /// Synthesize using OpenAI TTS
    ///
    /// The model infers the language from the text itself.
    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    /// Synthesize using ElevenLabs TTS
    async fn synthesize_elevenlabs(&self, text: &str, language: LanguageTag) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let url = format!("{}/text-to-speech/{}", self.base_url, self.voice);

        let request = ElevenLabsRequest {
            text,
            model_id: self.elevenlabs_model(language),
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", self.api_key.expose_secret())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!("ElevenLabs TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    /// Monolingual ElevenLabs models only speak English
    fn elevenlabs_model(&self, language: LanguageTag) -> &str {
        if language != LanguageTag::En && self.model.contains("monolingual") {
            ELEVENLABS_MULTILINGUAL_MODEL
        } else {
            &self.model
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for TextToSpeech {
    fn name(&self) -> &'static str {
        match self.provider {
            TtsProvider::OpenAI => "openai-tts",
            TtsProvider::ElevenLabs => "elevenlabs-tts",
        }
    }

    async fn synthesize(&self, text: &str, language: LanguageTag) -> Result<Vec<u8>> {
        match self.provider {
            TtsProvider::OpenAI => self.synthesize_openai(text).await,
            TtsProvider::ElevenLabs => self.synthesize_elevenlabs(text, language).await,
        }
    }
}
