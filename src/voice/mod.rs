//! Voice output
//!
//! HTTP text-to-speech backends and the on-disk store that serves their audio
//! back to clients. Speech capture and local playback live on the client side
//! and are not part of the brain.

mod store;
mod tts;

pub use store::{AudioFormat, AudioStore, DEFAULT_MAX_ARTIFACTS};
pub use tts::{TextToSpeech, TtsProvider};
