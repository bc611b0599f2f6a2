//! MINI brain - dialogue response pipeline for a voice assistant
//!
//! This library provides the core functionality for the MINI brain:
//! - Language detection (English/Hindi) and lexical mood classification
//! - Template-based reply composition with mood and intent rules
//! - Best-effort audio synthesis and conversation logging
//! - HTTP surface and companion client
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Interfaces                        │
//! │      HTTP API (axum)   │   mini ask   │  mini chat   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                Dialogue Pipeline                     │
//! │  Language  │  Mood  │  Reply  │  Synthesis │ Record  │
//! └─────────┬───────────────────────────────┬───────────┘
//!           │                               │
//! ┌─────────▼──────────┐          ┌─────────▼───────────┐
//! │  TTS (OpenAI/11L)  │          │   SQLite (r2d2)     │
//! │  + audio store     │          │   conversations     │
//! └────────────────────┘          └─────────────────────┘
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod error;
pub mod voice;

pub use api::{ApiServer, ApiServerBuilder, ApiState};
pub use client::{BrainClient, BrainReply};
pub use config::Config;
pub use db::{ConversationRepo, DbConn, DbPool};
pub use dialogue::{
    DialogueOutcome, DialoguePipeline, DialoguePipelineBuilder, LanguageChoice, LanguageTag,
    MoodLabel, Utterance,
};
pub use error::{Error, Result};
