//! Dialogue response pipeline
//!
//! ```text
//! Utterance ─▶ LanguageDetector ─▶ MoodClassifier ─▶ ReplyComposer
//!                                                        │
//!            DialogueOutcome ◀─ ConversationRecorder ◀─ SynthesisRequestBuilder
//! ```
//!
//! Each stage is pure or best-effort. Only empty input is rejected; a failing
//! classifier, synthesizer or store degrades the reply but never fails it.

pub mod language;
pub mod mood;
pub mod pipeline;
pub mod recorder;
pub mod reply;
pub mod synthesis;

pub use language::{
    HeuristicClassifier, LanguageChoice, LanguageClassifier, LanguageDetector, LanguageTag,
    script_fallback,
};
pub use mood::{MoodClassifier, MoodLabel};
pub use pipeline::{
    DialogueOutcome, DialoguePipeline, DialoguePipelineBuilder, PipelineOptions, ReplyRecord,
    Utterance,
};
pub use recorder::{ConversationEntry, ConversationRecorder, ConversationStore};
pub use reply::{
    Chooser, Clock, Intent, IntentResolver, KeywordIntentResolver, Localized, RandomChooser,
    ReplyComposer, ReplySource, SystemClock,
};
pub use synthesis::{
    SpeechSynthesizer, SynthesisJob, SynthesisRequestBuilder, is_valid_artifact_id,
    new_artifact_id,
};
