//! Configuration management for the Sibyl assistant
//!
//! Layered resolution: environment variables override the TOML file, which
//! overrides built-in defaults. The result is one immutable struct built at
//! startup and passed by reference into each capability client constructor.

pub mod file;

use std::path::PathBuf;

use crate::Result;

/// Default completion model (the completions-endpoint instruct family)
const DEFAULT_COMPLETION_MODEL: &str = "gpt-3.5-turbo-instruct";

/// Default embedding model
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Default Azure OpenAI API version
const DEFAULT_API_VERSION: &str = "2023-05-15";

/// Default instruction prepended to every prompt
const DEFAULT_PROMPT_GUIDE: &str = "Answer the question to the best of your abilities.";

/// Sibyl assistant configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API keys for external services
    pub api_keys: ApiKeys,

    /// LLM completion/embedding configuration
    pub llm: LlmConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Memory log configuration
    pub memory: MemoryConfig,

    /// Data directory (memory log default location)
    pub data_dir: PathBuf,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (completions, embeddings, Whisper, TTS)
    pub openai: Option<String>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<String>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<String>,
}

/// LLM endpoint flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// api.openai.com
    #[default]
    OpenAi,
    /// Azure OpenAI resource deployments
    Azure,
}

impl LlmProvider {
    /// Parse a provider name, defaulting to `OpenAi`
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("azure") {
            Self::Azure
        } else {
            Self::OpenAi
        }
    }
}

/// LLM completion/embedding configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Endpoint flavor
    pub provider: LlmProvider,

    /// Completion model, or deployment name under Azure
    pub completion_model: String,

    /// Embedding model, or deployment name under Azure
    pub embedding_model: String,

    /// Instruction prepended to every prompt
    pub prompt_guide: String,

    /// Response-length cap for generated answers
    pub answer_max_tokens: u32,

    /// Azure resource endpoint
    pub api_base: Option<String>,

    /// Azure API version
    pub api_version: String,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// STT model identifier
    pub stt_model: String,

    /// TTS model identifier
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier
    pub tts_speed: f32,

    /// Seconds to wait for speech before giving up on a cycle
    pub listen_timeout_secs: u64,
}

/// Memory log configuration
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Path of the persisted log
    pub log_path: PathBuf,

    /// Token budget per stored chunk
    pub chunk_max_tokens: usize,

    /// Token budget for the assembled context window
    pub max_context_tokens: usize,
}

impl Config {
    /// Load configuration (env > toml > default)
    ///
    /// # Errors
    ///
    /// Returns error if the data directory cannot be determined
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();

        let api_keys = ApiKeys {
            openai: std::env::var("OPENAI_API_KEY").ok().or(fc.api_keys.openai),
            deepgram: std::env::var("DEEPGRAM_API_KEY")
                .ok()
                .or(fc.api_keys.deepgram),
            elevenlabs: std::env::var("ELEVENLABS_API_KEY")
                .ok()
                .or(fc.api_keys.elevenlabs),
        };

        let llm = LlmConfig {
            provider: std::env::var("SIBYL_LLM_PROVIDER")
                .ok()
                .or(fc.llm.provider)
                .map(|s| LlmProvider::parse(&s))
                .unwrap_or_default(),
            completion_model: std::env::var("SIBYL_COMPLETION_MODEL")
                .ok()
                .or(fc.llm.completion_model)
                .unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string()),
            embedding_model: std::env::var("SIBYL_EMBEDDING_MODEL")
                .ok()
                .or(fc.llm.embedding_model)
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            prompt_guide: std::env::var("SIBYL_PROMPT_GUIDE")
                .ok()
                .or(fc.llm.prompt_guide)
                .unwrap_or_else(|| DEFAULT_PROMPT_GUIDE.to_string()),
            answer_max_tokens: std::env::var("SIBYL_ANSWER_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.llm.answer_max_tokens)
                .unwrap_or(150),
            api_base: std::env::var("OPENAI_API_BASE").ok().or(fc.llm.api_base),
            api_version: std::env::var("OPENAI_API_VERSION")
                .ok()
                .or(fc.llm.api_version)
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        };

        let voice = VoiceConfig {
            stt_model: std::env::var("SIBYL_STT_MODEL")
                .ok()
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| "whisper-1".to_string()),
            tts_model: std::env::var("SIBYL_TTS_MODEL")
                .ok()
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: std::env::var("SIBYL_TTS_VOICE")
                .ok()
                .or(fc.voice.tts_voice)
                .unwrap_or_else(|| "alloy".to_string()),
            tts_speed: std::env::var("SIBYL_TTS_SPEED")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.voice.tts_speed)
                .unwrap_or(1.0),
            listen_timeout_secs: std::env::var("SIBYL_LISTEN_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.voice.listen_timeout_secs)
                .unwrap_or(30),
        };

        // Data directory (~/.local/share/sibyl on Linux)
        let data_dir = directories::BaseDirs::new()
            .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("sibyl"));
        std::fs::create_dir_all(&data_dir).ok();

        let memory = MemoryConfig {
            log_path: std::env::var("SIBYL_MEMORY_PATH")
                .ok()
                .or(fc.memory.path)
                .map_or_else(|| data_dir.join("memory_log.csv"), PathBuf::from),
            chunk_max_tokens: std::env::var("SIBYL_CHUNK_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.memory.chunk_tokens)
                .unwrap_or(500),
            max_context_tokens: std::env::var("SIBYL_CONTEXT_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.memory.context_tokens)
                .unwrap_or(1800),
        };

        Ok(Self {
            api_keys,
            llm,
            voice,
            memory,
            data_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!(LlmProvider::parse("azure"), LlmProvider::Azure);
        assert_eq!(LlmProvider::parse("Azure"), LlmProvider::Azure);
        assert_eq!(LlmProvider::parse("openai"), LlmProvider::OpenAi);
        assert_eq!(LlmProvider::parse("standard"), LlmProvider::OpenAi);
    }
}
