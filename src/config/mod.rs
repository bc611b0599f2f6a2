//! Configuration management for the MINI brain

pub mod file;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Result;
use crate::dialogue::LanguageChoice;
use crate::voice::TtsProvider;

pub use file::{ConfigFile, config_file_path, load_config_file};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8000;

/// Default voice profile label
pub const DEFAULT_VOICE_PROFILE: &str = "friday_female_uk";

/// MINI brain configuration
///
/// Built once at start-up (defaults → config file → environment) and passed
/// into constructors. Nothing reads the environment after this.
#[derive(Debug, Clone)]
pub struct Config {
    /// Language used when a request names none
    pub default_language: LanguageChoice,

    /// Voice profile label echoed in replies
    pub voice_profile: String,

    /// Accent label
    pub accent: String,

    /// Path to data directory (database, audio)
    pub data_dir: PathBuf,

    /// Audio synthesis configuration
    pub audio: AudioConfig,

    /// Conversation log configuration
    pub persistence: PersistenceConfig,

    /// Upper bound on language classification
    pub classifier_timeout: Duration,

    /// HTTP server configuration
    pub server: ServerConfig,
}

/// Audio synthesis configuration
#[derive(Clone)]
pub struct AudioConfig {
    /// Attempt synthesis for each reply
    pub enabled: bool,

    /// Fail requests whose synthesis fails instead of replying without audio
    pub strict: bool,

    /// Artifact directory
    pub dir: PathBuf,

    /// Artifacts kept on disk before the oldest are pruned (0 keeps all)
    pub max_artifacts: usize,

    /// Upper bound on one synthesis call
    pub timeout: Duration,

    /// TTS provider
    pub provider: TtsProvider,

    /// TTS model (e.g. "tts-1", "eleven_multilingual_v2")
    pub model: String,

    /// TTS voice identifier
    pub voice: String,

    /// TTS speed multiplier (0.25 to 4.0, `OpenAI` only)
    pub speed: f64,

    /// Override for the provider API base URL
    pub base_url: Option<String>,

    /// `OpenAI` API key
    pub openai_api_key: Option<String>,

    /// `ElevenLabs` API key
    pub elevenlabs_api_key: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strict: false,
            dir: default_data_dir().join("audio"),
            max_artifacts: crate::voice::DEFAULT_MAX_ARTIFACTS,
            timeout: crate::dialogue::synthesis::DEFAULT_SYNTHESIS_TIMEOUT,
            provider: TtsProvider::default(),
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            speed: 1.0,
            base_url: None,
            openai_api_key: None,
            elevenlabs_api_key: None,
        }
    }
}

impl fmt::Debug for AudioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "[redacted]");

        f.debug_struct("AudioConfig")
            .field("enabled", &self.enabled)
            .field("strict", &self.strict)
            .field("dir", &self.dir)
            .field("max_artifacts", &self.max_artifacts)
            .field("timeout", &self.timeout)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("speed", &self.speed)
            .field("base_url", &self.base_url)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("elevenlabs_api_key", &redact(&self.elevenlabs_api_key))
            .finish()
    }
}

/// Conversation log configuration
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// SQLite database path; persistence is off when `None`
    pub database_path: Option<PathBuf>,

    /// Upper bound on one write
    pub timeout: Duration,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            timeout: crate::dialogue::recorder::DEFAULT_RECORD_TIMEOUT,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Absolute base for `audio_url`; relative URLs are returned when unset
    pub public_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            public_base_url: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_language: LanguageChoice::Auto,
            voice_profile: DEFAULT_VOICE_PROFILE.to_string(),
            accent: "UK".to_string(),
            data_dir: default_data_dir(),
            audio: AudioConfig::default(),
            persistence: PersistenceConfig::default(),
            classifier_timeout: crate::dialogue::language::DEFAULT_CLASSIFIER_TIMEOUT,
            server: ServerConfig::default(),
        }
    }
}

/// Data directory: `~/.local/share/mini` on Linux
#[must_use]
pub fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(|| PathBuf::from(".mini"), |d| d.data_dir().join("mini"))
}

impl Config {
    /// Load configuration from the config file and process environment
    ///
    /// `path` names an explicit config file; otherwise `MINI_CONFIG`, then
    /// `~/.config/mini/config.toml` is used.
    ///
    /// # Errors
    ///
    /// Returns error if an explicitly named config file cannot be loaded
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var("MINI_CONFIG").ok().map(PathBuf::from);
        let path = path.or(env_path.as_deref());

        let fc = file::load_config_file(path)?;
        let config = Self::from_sources(fc, |key| std::env::var(key).ok());

        tracing::debug!(config = ?config, "configuration loaded");
        Ok(config)
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// Precedence is env > file > default.
    #[must_use]
    pub fn from_sources(fc: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let data_dir = defaults.data_dir;

        let default_language = non_empty("MINI_DEFAULT_LANGUAGE")
            .or(fc.default_language)
            .map_or(defaults.default_language, |s| LanguageChoice::parse(&s));

        let provider = match non_empty("MINI_TTS_PROVIDER").or(fc.audio.provider) {
            Some(name) => TtsProvider::from_name(&name).unwrap_or_else(|| {
                tracing::warn!(provider = %name, "unknown TTS provider, using openai");
                TtsProvider::default()
            }),
            None => TtsProvider::default(),
        };

        // Audio config (env > file > default)
        let audio_defaults = AudioConfig::default();
        let audio = AudioConfig {
            enabled: non_empty("MINI_AUDIO_ENABLED")
                .and_then(|v| parse_bool(&v))
                .or(fc.audio.enabled)
                .unwrap_or(audio_defaults.enabled),
            strict: non_empty("MINI_AUDIO_STRICT")
                .and_then(|v| parse_bool(&v))
                .or(fc.audio.strict)
                .unwrap_or(audio_defaults.strict),
            dir: non_empty("MINI_AUDIO_DIR")
                .map(PathBuf::from)
                .or(fc.audio.dir)
                .unwrap_or_else(|| data_dir.join("audio")),
            max_artifacts: fc
                .audio
                .max_artifacts
                .unwrap_or(audio_defaults.max_artifacts),
            timeout: fc
                .audio
                .timeout_secs
                .map_or(audio_defaults.timeout, Duration::from_secs),
            provider,
            model: fc.audio.model.unwrap_or(audio_defaults.model),
            voice: fc.audio.voice.unwrap_or(audio_defaults.voice),
            speed: fc.audio.speed.unwrap_or(audio_defaults.speed),
            base_url: fc.audio.base_url,
            openai_api_key: non_empty("OPENAI_API_KEY").or(fc.api_keys.openai),
            elevenlabs_api_key: non_empty("ELEVENLABS_API_KEY").or(fc.api_keys.elevenlabs),
        };

        let persistence = PersistenceConfig {
            database_path: non_empty("MINI_DATABASE_PATH")
                .map(PathBuf::from)
                .or(fc.persistence.database_path),
            timeout: fc
                .persistence
                .timeout_secs
                .map_or(defaults.persistence.timeout, Duration::from_secs),
        };

        let server = ServerConfig {
            host: non_empty("MINI_HOST")
                .or(fc.server.host)
                .unwrap_or(defaults.server.host),
            port: non_empty("MINI_PORT")
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(defaults.server.port),
            public_base_url: non_empty("MINI_PUBLIC_URL")
                .or(fc.server.public_base_url)
                .map(|url| url.trim_end_matches('/').to_string()),
        };

        Self {
            default_language,
            voice_profile: non_empty("MINI_VOICE_PROFILE")
                .or(fc.voice_profile)
                .unwrap_or(defaults.voice_profile),
            accent: non_empty("MINI_ACCENT")
                .or(fc.accent)
                .unwrap_or(defaults.accent),
            data_dir,
            audio,
            persistence,
            classifier_timeout: fc
                .classifier_timeout_ms
                .map_or(defaults.classifier_timeout, Duration::from_millis),
            server,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            tracing::warn!(value = %other, "ignoring unrecognized boolean");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::dialogue::LanguageTag;

    fn from_env(vars: &[(&str, &str)]) -> Config {
        from_file_and_env(ConfigFile::default(), vars)
    }

    fn from_file_and_env(fc: ConfigFile, vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_sources(fc, |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_env(&[]);
        assert_eq!(config.default_language, LanguageChoice::Auto);
        assert_eq!(config.voice_profile, "friday_female_uk");
        assert_eq!(config.accent, "UK");
        assert!(config.audio.enabled);
        assert!(!config.audio.strict);
        assert_eq!(config.audio.max_artifacts, 500);
        assert_eq!(config.audio.provider, TtsProvider::OpenAI);
        assert!(config.audio.openai_api_key.is_none());
        assert!(config.persistence.database_path.is_none());
        assert_eq!(config.classifier_timeout, Duration::from_millis(500));
        assert_eq!(config.server.port, 8000);
        assert!(config.server.public_base_url.is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let fc: ConfigFile = toml::from_str(
            r#"
default_language = "en"
voice_profile = "jarvis"

[audio]
max_artifacts = 20

[server]
port = 9000
"#,
        )
        .unwrap();

        let config = from_file_and_env(
            fc,
            &[("MINI_DEFAULT_LANGUAGE", "hi"), ("MINI_PORT", "8123")],
        );
        assert_eq!(config.default_language, LanguageChoice::Explicit(LanguageTag::Hi));
        assert_eq!(config.voice_profile, "jarvis");
        assert_eq!(config.audio.max_artifacts, 20);
        assert_eq!(config.server.port, 8123);
    }

    #[test]
    fn test_audio_settings() {
        let config = from_env(&[
            ("MINI_AUDIO_ENABLED", "false"),
            ("MINI_AUDIO_STRICT", "1"),
            ("MINI_TTS_PROVIDER", "elevenlabs"),
            ("ELEVENLABS_API_KEY", "el-key"),
            ("MINI_AUDIO_DIR", "/tmp/mini-audio"),
        ]);
        assert!(!config.audio.enabled);
        assert!(config.audio.strict);
        assert_eq!(config.audio.provider, TtsProvider::ElevenLabs);
        assert_eq!(config.audio.elevenlabs_api_key.as_deref(), Some("el-key"));
        assert_eq!(config.audio.dir, PathBuf::from("/tmp/mini-audio"));
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let config = from_env(&[("OPENAI_API_KEY", ""), ("MINI_PORT", "not-a-port")]);
        assert!(config.audio.openai_api_key.is_none());
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_public_url_trailing_slash() {
        let config = from_env(&[("MINI_PUBLIC_URL", "https://mini.example.com/")]);
        assert_eq!(
            config.server.public_base_url.as_deref(),
            Some("https://mini.example.com")
        );
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = from_env(&[("OPENAI_API_KEY", "sk-secret")]);
        let debug = format!("{:?}", config.audio);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
