//! Sibyl - voice question-answering assistant with semantic memory
//!
//! This library provides the core functionality for the Sibyl assistant:
//! - Voice capture and playback (microphone in, speaker out)
//! - STT/TTS capability clients
//! - Token-bounded chunking of conversation history
//! - Semantic context retrieval over a persisted memory log
//! - LLM answer generation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     Session                          │
//! │  listen → retrieve → generate → speak → persist     │
//! └──────┬──────────┬───────────┬──────────┬────────────┘
//!        │          │           │          │
//! ┌──────▼───┐ ┌────▼─────┐ ┌───▼─────┐ ┌──▼──────────┐
//! │  Voice   │ │ Context  │ │ Answer  │ │   Memory    │
//! │ STT/TTS  │ │ Builder  │ │Generator│ │ Store+Chunk │
//! └──────────┘ └────┬─────┘ └───┬─────┘ └─────────────┘
//!                   │           │
//!             ┌─────▼───────────▼─────┐
//!             │  Embedding/Completion │
//!             │       endpoints       │
//!             └───────────────────────┘
//! ```

use std::time::Duration;

pub mod answer;
pub mod audio;
pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod memory;
pub mod session;
pub mod tokens;
pub mod voice;

/// Request timeout applied to every capability HTTP client
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub use answer::AnswerGenerator;
pub use config::Config;
pub use context::{ContextBuilder, cosine_distance};
pub use error::{CapabilityError, CapabilityResult, Error, Result};
pub use llm::{CompletionClient, CompletionModel, Embedder, EmbeddingClient};
pub use memory::{MemoryRecord, MemoryStore, split_into_chunks};
pub use session::{CycleOutcome, Session};
pub use tokens::{HeuristicTokenCounter, TokenCounter};
pub use voice::{SttClient, Synthesizer, Transcriber, TtsClient, VoiceInput, VoiceOutput};
