//! Error types for the MINI brain

use thiserror::Error;

/// Result type alias for MINI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the MINI brain
///
/// Only [`Error::InvalidInput`] is ever surfaced to a caller of the dialogue
/// pipeline in its default mode. Classification, synthesis and persistence
/// failures are recovered where they occur and only logged.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Empty or otherwise unusable request input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Language classifier failed or timed out
    #[error("classification degraded: {0}")]
    Classification(String),

    /// Audio synthesis failed, timed out, or is not configured
    #[error("synthesis unavailable: {0}")]
    Synthesis(String),

    /// Conversation store unreachable or write failed
    #[error("persistence unavailable: {0}")]
    Persistence(String),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
