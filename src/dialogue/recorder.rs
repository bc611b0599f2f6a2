//! Best-effort conversation log
//!
//! Writes happen on a background task bounded by a timeout. Nothing a store
//! does can delay or alter a reply. Short-lived processes call
//! [`ConversationRecorder::drain`] before exiting so pending writes land.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::task::TaskTracker;

use super::language::LanguageTag;
use super::mood::MoodLabel;
use crate::Result;

/// Default upper bound on a single store write
pub const DEFAULT_RECORD_TIMEOUT: Duration = Duration::from_secs(5);

/// One completed exchange, written once and never read back by the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationEntry {
    pub timestamp: DateTime<Utc>,
    pub utterance_text: String,
    pub reply_text: String,
    pub language: LanguageTag,
    pub mood: MoodLabel,
    pub artifact_id: Option<String>,
}

/// Append-only sink for conversation entries
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Store name for logs
    fn name(&self) -> &'static str;

    /// Append one entry
    async fn insert(&self, entry: &ConversationEntry) -> Result<()>;
}

/// Forwards entries to an optional store, swallowing every failure
#[derive(Clone)]
pub struct ConversationRecorder {
    store: Option<Arc<dyn ConversationStore>>,
    timeout: Duration,
    pending: TaskTracker,
}

impl fmt::Debug for ConversationRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationRecorder")
            .field("store", &self.store.as_ref().map(|s| s.name()))
            .field("timeout", &self.timeout)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl Default for ConversationRecorder {
    fn default() -> Self {
        Self::disabled()
    }
}

impl ConversationRecorder {
    /// Recorder backed by `store`
    #[must_use]
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self {
            store: Some(store),
            timeout: DEFAULT_RECORD_TIMEOUT,
            pending: TaskTracker::new(),
        }
    }

    /// Recorder with no store; every call is a no-op
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            store: None,
            timeout: DEFAULT_RECORD_TIMEOUT,
            pending: TaskTracker::new(),
        }
    }

    /// Bound each write
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a store is configured
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    /// Record `entry` in the background
    ///
    /// Returns immediately. Must be called from within a Tokio runtime.
    pub fn record(&self, entry: ConversationEntry) {
        let Some(store) = self.store.clone() else {
            tracing::trace!("no conversation store configured, not recording");
            return;
        };
        let timeout = self.timeout;

        self.pending.spawn(async move {
            match tokio::time::timeout(timeout, store.insert(&entry)).await {
                Ok(Ok(())) => {
                    tracing::trace!(store = store.name(), "conversation recorded");
                }
                Ok(Err(e)) => {
                    tracing::warn!(store = store.name(), error = %e, "failed to record conversation");
                }
                Err(_) => {
                    tracing::warn!(store = store.name(), ?timeout, "conversation store timed out");
                }
            }
        });
    }

    /// Wait for every write started so far to finish or time out
    ///
    /// The recorder stays usable afterwards.
    pub async fn drain(&self) {
        self.pending.close();
        self.pending.wait().await;
        self.pending.reopen();
    }
}
