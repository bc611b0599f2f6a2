//! Companion client for a remote MINI brain

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Request timeout for brain calls
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Words that end an interactive session
pub const STOP_COMMANDS: &[&str] = &["stop", "sleep", "goodbye", "shutdown"];

/// Whether `command` ends an interactive session
///
/// The whole line must be a stop word; "stop the music" is a normal request.
#[must_use]
pub fn is_stop_command(command: &str) -> bool {
    let command = command.trim().to_lowercase();
    STOP_COMMANDS.contains(&command.as_str())
}

#[derive(Debug, Serialize)]
struct BrainRequest<'a> {
    input: &'a str,
    lang: &'a str,
}

/// Reply from `POST /api`
#[derive(Debug, Clone, Deserialize)]
pub struct BrainReply {
    #[serde(default = "default_reply")]
    pub reply: String,
    #[serde(default = "default_mood")]
    pub mood: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub voice_profile: Option<String>,
}

fn default_reply() -> String {
    "I didn't understand that.".to_string()
}

fn default_mood() -> String {
    "neutral".to_string()
}

/// HTTP client for a MINI brain
#[derive(Debug, Clone)]
pub struct BrainClient {
    client: Client,
    base_url: Url,
}

impl BrainClient {
    /// Create a client for the brain at `base_url`
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the URL is invalid
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_CLIENT_TIMEOUT)
    }

    /// Create a client with a custom request timeout
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the URL is invalid or the HTTP client cannot be built
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid brain URL {base_url}: {e}")))?;

        // Relative joins must keep any path prefix
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Base URL of the brain
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send one utterance and parse the reply
    ///
    /// # Errors
    ///
    /// Returns error if the brain is unreachable, answers with an error
    /// status, or returns a body that is not a reply
    pub async fn ask(&self, text: &str) -> Result<BrainReply> {
        let url = self
            .base_url
            .join("api")
            .map_err(|e| Error::Config(e.to_string()))?;

        let response = self
            .client
            .post(url)
            .json(&BrainRequest {
                input: text,
                lang: "auto",
            })
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    /// Resolve an `audio_url` from a reply against the brain's base URL
    ///
    /// Absolute URLs are used as is. Root-relative paths such as
    /// `/audio/<id>` stay under the base path, so a brain mounted at
    /// `http://host/mini/` serves `http://host/mini/audio/<id>`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the URL cannot be resolved
    pub fn resolve(&self, audio_url: &str) -> Result<Url> {
        if let Ok(absolute) = Url::parse(audio_url) {
            return Ok(absolute);
        }

        self.base_url
            .join(audio_url.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("invalid audio URL {audio_url}: {e}")))
    }

    /// Download the audio at `audio_url` into `dest`
    ///
    /// # Errors
    ///
    /// Returns error if the download fails or the file cannot be written
    pub async fn download_audio(&self, audio_url: &str, dest: &Path) -> Result<PathBuf> {
        let url = self.resolve(audio_url)?;
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;

        tracing::debug!(path = %dest.display(), bytes = bytes.len(), "audio downloaded");
        Ok(dest.to_path_buf())
    }
}
