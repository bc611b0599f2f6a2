//! Language resolution
//!
//! An explicit language on the request always wins. Otherwise a pluggable
//! classifier is consulted, and when it fails, times out, or names a language
//! we cannot answer in, the script-range fallback decides: any Devanagari
//! character means Hindi, everything else is English.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default upper bound on a single classifier call
pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_millis(500);

/// Languages the brain can reply in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    #[default]
    En,
    Hi,
}

impl LanguageTag {
    /// ISO 639-1 code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
        }
    }

    /// Human-readable name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Hi => "Hindi",
        }
    }

    /// All supported tags
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::En, Self::Hi]
    }

    /// Parse a code or language name (case-insensitive)
    #[must_use]
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "eng" | "english" | "en-us" | "en-gb" | "en-in" => Some(Self::En),
            "hi" | "hin" | "hindi" | "hi-in" => Some(Self::Hi),
            _ => None,
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LanguageTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_code(s).ok_or_else(|| Error::InvalidInput(format!("unsupported language: {s}")))
    }
}

/// Language requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageChoice {
    /// Detect from the text
    #[default]
    Auto,
    /// Use this language unchanged
    Explicit(LanguageTag),
}

impl LanguageChoice {
    /// Parse a request `lang` value
    ///
    /// Empty and `auto` mean detection. Codes we do not support also fall back
    /// to detection rather than rejecting the request.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            return Self::Auto;
        }

        LanguageTag::from_code(trimmed).map_or_else(
            || {
                tracing::debug!(lang = %trimmed, "unsupported language requested, detecting instead");
                Self::Auto
            },
            Self::Explicit,
        )
    }

    /// Label as it appears in requests and config
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Explicit(tag) => tag.code(),
        }
    }
}

/// Statistical or heuristic language classifier
///
/// Returns a raw language code, which may name a language the brain does not
/// support. Failures are absorbed by [`LanguageDetector`].
#[async_trait]
pub trait LanguageClassifier: Send + Sync {
    /// Classifier name for logs
    fn name(&self) -> &'static str;

    /// Guess the language of `text`
    async fn classify(&self, text: &str) -> Result<String>;
}

/// Romanized Hindi words that rarely appear in English text
const ROMAN_HINDI_MARKERS: &[&str] = &[
    "aap", "abhi", "acha", "accha", "bahut", "batao", "hai", "hain", "haan", "kaise", "kaisa",
    "kya", "kyun", "kyu", "mera", "mere", "mujhe", "nahi", "nahin", "namaste", "theek", "thik",
    "tum", "tumhara", "yaar",
];

/// Script-counting classifier with a romanized-Hindi word check
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

/// Unicode blocks the heuristic distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Latin,
    Devanagari,
    Bengali,
    Tamil,
    Telugu,
    Arabic,
}

impl Script {
    const fn of(c: char) -> Option<Self> {
        match c {
            'a'..='z' | 'A'..='Z' | '\u{00C0}'..='\u{024F}' => Some(Self::Latin),
            '\u{0900}'..='\u{097F}' => Some(Self::Devanagari),
            '\u{0980}'..='\u{09FF}' => Some(Self::Bengali),
            '\u{0B80}'..='\u{0BFF}' => Some(Self::Tamil),
            '\u{0C00}'..='\u{0C7F}' => Some(Self::Telugu),
            '\u{0600}'..='\u{06FF}' => Some(Self::Arabic),
            _ => None,
        }
    }

    const fn code(self) -> &'static str {
        match self {
            Self::Latin => "en",
            Self::Devanagari => "hi",
            Self::Bengali => "bn",
            Self::Tamil => "ta",
            Self::Telugu => "te",
            Self::Arabic => "ur",
        }
    }
}

impl HeuristicClassifier {
    /// Classify synchronously
    ///
    /// # Errors
    ///
    /// Returns `Error::Classification` when the text has no letters in any
    /// known script
    pub fn guess(text: &str) -> Result<String> {
        let mut counts: Vec<(Script, usize)> = Vec::new();
        for script in text.chars().filter_map(Script::of) {
            match counts.iter_mut().find(|(s, _)| *s == script) {
                Some((_, n)) => *n += 1,
                None => counts.push((script, 1)),
            }
        }

        let Some((dominant, _)) = counts.iter().copied().max_by_key(|(_, n)| *n) else {
            return Err(Error::Classification("no alphabetic content".to_string()));
        };

        if text.chars().any(is_devanagari) {
            return Ok(Script::Devanagari.code().to_string());
        }

        if dominant == Script::Latin && roman_hindi_hits(text) >= 2 {
            return Ok(Script::Devanagari.code().to_string());
        }

        Ok(dominant.code().to_string())
    }
}

fn roman_hindi_hits(text: &str) -> usize {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|w| ROMAN_HINDI_MARKERS.contains(w))
        .count()
}

#[async_trait]
impl LanguageClassifier for HeuristicClassifier {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn classify(&self, text: &str) -> Result<String> {
        Self::guess(text)
    }
}

/// Whether `c` falls in the Devanagari block
#[must_use]
pub const fn is_devanagari(c: char) -> bool {
    matches!(c, '\u{0900}'..='\u{097F}')
}

/// Script-range fallback: Hindi if any Devanagari character, else English
#[must_use]
pub fn script_fallback(text: &str) -> LanguageTag {
    if text.chars().any(is_devanagari) {
        LanguageTag::Hi
    } else {
        LanguageTag::En
    }
}

/// Resolves a concrete [`LanguageTag`] for an utterance
#[derive(Clone)]
pub struct LanguageDetector {
    classifier: Option<Arc<dyn LanguageClassifier>>,
    timeout: Duration,
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new(Arc::new(HeuristicClassifier))
    }
}

impl fmt::Debug for LanguageDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageDetector")
            .field("classifier", &self.classifier.as_ref().map(|c| c.name()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LanguageDetector {
    /// Create a detector backed by `classifier`
    #[must_use]
    pub fn new(classifier: Arc<dyn LanguageClassifier>) -> Self {
        Self {
            classifier: Some(classifier),
            timeout: DEFAULT_CLASSIFIER_TIMEOUT,
        }
    }

    /// Create a detector that only applies the script-range fallback
    #[must_use]
    pub const fn script_only() -> Self {
        Self {
            classifier: None,
            timeout: DEFAULT_CLASSIFIER_TIMEOUT,
        }
    }

    /// Bound each classifier call
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the language of `text`
    ///
    /// Never fails: an explicit choice is returned unchanged, text with any
    /// Devanagari resolves to Hindi without consulting the classifier, and
    /// any classifier problem degrades to [`script_fallback`].
    pub async fn detect(&self, text: &str, requested: LanguageChoice) -> LanguageTag {
        if let LanguageChoice::Explicit(tag) = requested {
            return tag;
        }

        if text.chars().any(is_devanagari) {
            return LanguageTag::Hi;
        }

        match self.classify(text).await {
            Ok(tag) => tag,
            Err(e) => {
                let tag = script_fallback(text);
                tracing::debug!(error = %e, fallback = %tag, "language classification degraded");
                tag
            }
        }
    }

    async fn classify(&self, text: &str) -> Result<LanguageTag> {
        let Some(classifier) = &self.classifier else {
            return Err(Error::Classification("no classifier configured".to_string()));
        };

        let code = tokio::time::timeout(self.timeout, classifier.classify(text))
            .await
            .map_err(|_| {
                Error::Classification(format!(
                    "{} timed out after {:?}",
                    classifier.name(),
                    self.timeout
                ))
            })??;

        LanguageTag::from_code(&code)
            .ok_or_else(|| Error::Classification(format!("unsupported language: {code}")))
    }
}
