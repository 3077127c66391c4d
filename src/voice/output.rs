//! Speaker-backed speech synthesis

use async_trait::async_trait;

use crate::audio::AudioPlayback;
use crate::error::CapabilityResult;
use crate::voice::{Synthesizer, TtsClient};
use crate::{CapabilityError, Result};

/// Synthesizes answers and plays them on the default output device
pub struct VoiceOutput {
    tts: TtsClient,
    playback: AudioPlayback,
}

impl VoiceOutput {
    /// Create a voice output bound to the default speaker
    ///
    /// # Errors
    ///
    /// Returns error if the audio device cannot be opened
    pub fn new(tts: TtsClient) -> Result<Self> {
        Ok(Self {
            tts,
            playback: AudioPlayback::new()?,
        })
    }
}

#[async_trait(?Send)]
impl Synthesizer for VoiceOutput {
    async fn speak(&mut self, text: &str) -> CapabilityResult<()> {
        if text.is_empty() {
            return Ok(());
        }

        tracing::debug!(chars = text.len(), "speaking");
        let audio = self.tts.synthesize(text).await?;
        self.playback
            .play_mp3(&audio)
            .await
            .map_err(|e| CapabilityError::Audio(e.to_string()))
    }
}
