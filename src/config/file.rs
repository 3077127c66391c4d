//! TOML configuration file loading
//!
//! Supports `~/.config/sibyl/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of
//! defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct SibylConfigFile {
    /// LLM configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Memory log configuration
    #[serde(default)]
    pub memory: MemoryFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Provider flavor ("openai" or "azure")
    pub provider: Option<String>,

    /// Completion model or Azure deployment name
    pub completion_model: Option<String>,

    /// Embedding model or Azure deployment name
    pub embedding_model: Option<String>,

    /// Instruction prepended to every prompt
    pub prompt_guide: Option<String>,

    /// Response-length cap for answers
    pub answer_max_tokens: Option<u32>,

    /// Azure resource endpoint (e.g. `https://my-resource.openai.azure.com`)
    pub api_base: Option<String>,

    /// Azure API version (e.g. "2023-05-15")
    pub api_version: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// STT model (e.g. "whisper-1", or "nova-2" with a Deepgram key)
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,

    /// Seconds to wait for speech before giving up on a cycle
    pub listen_timeout_secs: Option<u64>,
}

/// Memory log configuration
#[derive(Debug, Default, Deserialize)]
pub struct MemoryFileConfig {
    /// Path of the memory log file
    pub path: Option<String>,

    /// Token budget per stored chunk
    pub chunk_tokens: Option<usize>,

    /// Token budget for the assembled context window
    pub context_tokens: Option<usize>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub deepgram: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `SibylConfigFile::default()` if the file doesn't exist or can't
/// be parsed.
pub fn load_config_file() -> SibylConfigFile {
    let Some(path) = config_file_path() else {
        return SibylConfigFile::default();
    };

    if !path.exists() {
        return SibylConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                SibylConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            SibylConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/sibyl/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("sibyl").join("config.toml"))
}
