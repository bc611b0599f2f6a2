//! Configuration file loading
//!
//! Supports `~/.config/mini/config.toml` as a persistent config source, and the
//! older flat `settings.json` layout. All fields are optional; the file is a
//! partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Top-level configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Language used when a request names none ("auto", "en", "hi")
    pub default_language: Option<String>,

    /// Voice profile label echoed in replies
    pub voice_profile: Option<String>,

    /// Accent label
    pub accent: Option<String>,

    /// Upper bound on language classification, in milliseconds
    pub classifier_timeout_ms: Option<u64>,

    /// Audio synthesis configuration
    #[serde(default)]
    pub audio: AudioFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Conversation log configuration
    #[serde(default)]
    pub persistence: PersistenceFileConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Audio synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct AudioFileConfig {
    /// Attempt synthesis for each reply
    pub enabled: Option<bool>,

    /// Fail requests whose synthesis fails
    pub strict: Option<bool>,

    /// Artifact directory
    pub dir: Option<PathBuf>,

    /// Upper bound on one synthesis call, in seconds
    pub timeout_secs: Option<u64>,

    /// TTS provider ("openai", "elevenlabs")
    pub provider: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub voice: Option<String>,

    /// TTS speed multiplier
    pub speed: Option<f64>,

    /// Override for the provider API base URL
    pub base_url: Option<String>,

    /// Artifacts kept on disk before the oldest are pruned (0 keeps all)
    pub max_artifacts: Option<usize>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Conversation log configuration
#[derive(Debug, Default, Deserialize)]
pub struct PersistenceFileConfig {
    /// SQLite database path; persistence is off when unset
    pub database_path: Option<PathBuf>,

    /// Upper bound on one write, in seconds
    pub timeout_secs: Option<u64>,
}

/// HTTP server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,

    /// Absolute base used when building `audio_url`
    pub public_base_url: Option<String>,
}

/// Parse a config file, choosing the format by extension
///
/// `.json` files are read with `serde_json`, everything else as TOML.
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config = if is_json {
        serde_json::from_str(&content)?
    } else {
        toml::from_str(&content)?
    };

    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Load the config file
///
/// An explicit `path` must load. Without one, the standard path is tried and
/// any problem with it is logged and replaced by defaults.
///
/// # Errors
///
/// Returns `Error::Config` if an explicitly named file cannot be loaded
pub fn load_config_file(path: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = path {
        return load_from_path(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())));
    }

    let Some(path) = config_file_path() else {
        return Ok(ConfigFile::default());
    };

    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            Ok(ConfigFile::default())
        }
    }
}

/// Return the config file path: `~/.config/mini/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("mini").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_toml_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "config.toml",
            r#"
default_language = "hi"

[audio]
enabled = false
voice = "nova"

[server]
port = 9000
"#,
        );

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.default_language.as_deref(), Some("hi"));
        assert_eq!(config.audio.enabled, Some(false));
        assert_eq!(config.audio.voice.as_deref(), Some("nova"));
        assert_eq!(config.server.port, Some(9000));
        assert!(config.persistence.database_path.is_none());
    }

    #[test]
    fn test_legacy_settings_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "settings.json",
            r#"{"voice_profile": "friday_female_uk", "default_language": "auto", "accent": "UK", "mood": "neutral"}"#,
        );

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.voice_profile.as_deref(), Some("friday_female_uk"));
        assert_eq!(config.accent.as_deref(), Some("UK"));
    }

    #[test]
    fn test_explicit_broken_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "config.toml", "this is = = not toml");

        let err = load_config_file(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(load_config_file(Some(&path)).is_err());
    }
}
