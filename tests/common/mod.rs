//! Shared test utilities
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use tokio::sync::mpsc;

use mini_brain::dialogue::{
    Chooser, Clock, ConversationEntry, ConversationStore, DialoguePipelineBuilder,
    LanguageClassifier, LanguageTag, ReplyComposer, SpeechSynthesizer,
};
use mini_brain::voice::{AudioFormat, AudioStore};
use mini_brain::{DbPool, Error, Result, db};

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// Always picks the same template
pub struct FixedChooser(pub usize);

impl Chooser for FixedChooser {
    fn choose(&self, _len: usize) -> usize {
        self.0
    }
}

/// Always 2026-10-19 15:07 local time
pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 10, 19, 15, 7, 0)
            .single()
            .expect("unambiguous local time")
    }
}

/// Returns the reply text as "audio"
pub struct ToneSynthesizer;

#[async_trait]
impl SpeechSynthesizer for ToneSynthesizer {
    fn name(&self) -> &'static str {
        "tone"
    }

    fn format(&self) -> AudioFormat {
        AudioFormat::Wav
    }

    async fn synthesize(&self, text: &str, _language: LanguageTag) -> Result<Vec<u8>> {
        Ok(text.as_bytes().to_vec())
    }
}

/// Always fails
pub struct BrokenSynthesizer;

#[async_trait]
impl SpeechSynthesizer for BrokenSynthesizer {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn synthesize(&self, _text: &str, _language: LanguageTag) -> Result<Vec<u8>> {
        Err(Error::Synthesis("engine unreachable".to_string()))
    }
}

/// Forwards entries to a channel the test can read
pub struct ChannelStore(pub mpsc::UnboundedSender<ConversationEntry>);

#[async_trait]
impl ConversationStore for ChannelStore {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn insert(&self, entry: &ConversationEntry) -> Result<()> {
        self.0
            .send(entry.clone())
            .map_err(|e| Error::Persistence(e.to_string()))
    }
}

/// Store whose backend is down
pub struct DownStore;

#[async_trait]
impl ConversationStore for DownStore {
    fn name(&self) -> &'static str {
        "down"
    }

    async fn insert(&self, _entry: &ConversationEntry) -> Result<()> {
        Err(Error::Persistence("connection refused".to_string()))
    }
}

/// Classifier that always fails
pub struct FailingClassifier;

#[async_trait]
impl LanguageClassifier for FailingClassifier {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn classify(&self, _text: &str) -> Result<String> {
        Err(Error::Classification("model not loaded".to_string()))
    }
}

/// Classifier that never answers in time
pub struct HangingClassifier;

#[async_trait]
impl LanguageClassifier for HangingClassifier {
    fn name(&self) -> &'static str {
        "hanging"
    }

    async fn classify(&self, _text: &str) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("en".to_string())
    }
}

/// Composer with a fixed clock and first-template chooser
#[must_use]
pub fn deterministic_composer() -> ReplyComposer {
    ReplyComposer::new()
        .with_chooser(Arc::new(FixedChooser(0)))
        .with_clock(Arc::new(FixedClock))
}

/// Pipeline builder with deterministic replies and audio under `dir`
#[must_use]
pub fn pipeline_builder(dir: &tempfile::TempDir) -> DialoguePipelineBuilder {
    DialoguePipelineBuilder::new(AudioStore::new(dir.path().join("audio")))
        .reply_composer(deterministic_composer())
}

/// Receive one recorded entry, failing the test after a second
pub async fn recv_entry(rx: &mut mpsc::UnboundedReceiver<ConversationEntry>) -> ConversationEntry {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("entry not recorded in time")
        .expect("store channel closed")
}

/// Assert nothing gets recorded within a short grace period
pub async fn assert_nothing_recorded(rx: &mut mpsc::UnboundedReceiver<ConversationEntry>) {
    let got = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(
        matches!(got, Err(_) | Ok(None)),
        "unexpected entry recorded: {got:?}"
    );
}
