//! Voice capabilities: speech capture and synthesis
//!
//! [`Transcriber`] and [`Synthesizer`] are the narrow seams the session
//! consumes. The hardware-backed implementations pair the audio layer with
//! HTTP STT/TTS clients; tests substitute scripted implementations.

mod input;
mod output;
mod stt;
mod tts;

use async_trait::async_trait;

use crate::error::CapabilityResult;

pub use input::VoiceInput;
pub use output::VoiceOutput;
pub use stt::SttClient;
pub use tts::TtsClient;

/// Captures one spoken utterance and returns its transcript
///
/// Not `Send`: hardware-backed implementations hold audio streams that must
/// stay on the thread that opened them.
#[async_trait(?Send)]
pub trait Transcriber {
    /// Capture one utterance
    ///
    /// Returns `Ok(None)` when no speech was recognized (silence, timeout,
    /// or an empty transcript).
    ///
    /// # Errors
    ///
    /// Returns error if the audio device or the transcription service fails
    async fn capture(&mut self) -> CapabilityResult<Option<String>>;
}

/// Speaks text aloud
#[async_trait(?Send)]
pub trait Synthesizer {
    /// Synthesize and play `text`
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn speak(&mut self, text: &str) -> CapabilityResult<()>;
}
