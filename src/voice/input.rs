//! Microphone-backed speech capture

use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::audio::{AudioCapture, SAMPLE_RATE, UtteranceDetector, samples_to_wav};
use crate::error::CapabilityResult;
use crate::voice::{SttClient, Transcriber};
use crate::{CapabilityError, Result};

/// Polling interval for the capture buffer
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Captures one spoken question from the microphone and transcribes it
pub struct VoiceInput {
    capture: AudioCapture,
    detector: UtteranceDetector,
    stt: SttClient,
    listen_timeout: Duration,
}

impl VoiceInput {
    /// Create a voice input bound to the default microphone
    ///
    /// `listen_timeout` bounds how long to wait for speech to start before
    /// giving up on the cycle.
    ///
    /// # Errors
    ///
    /// Returns error if the audio device cannot be opened
    pub fn new(stt: SttClient, listen_timeout: Duration) -> Result<Self> {
        Ok(Self {
            capture: AudioCapture::new()?,
            detector: UtteranceDetector::new(),
            stt,
            listen_timeout,
        })
    }
}

#[async_trait(?Send)]
impl Transcriber for VoiceInput {
    async fn capture(&mut self) -> CapabilityResult<Option<String>> {
        self.capture
            .start()
            .map_err(|e| CapabilityError::Audio(e.to_string()))?;
        self.detector.reset();

        tracing::info!("listening");
        let started = Instant::now();

        let utterance = loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            let samples = self.capture.take_buffer();
            if self.detector.feed(&samples) {
                break self.detector.take_utterance();
            }

            // Only time out while waiting for speech to begin
            if !self.detector.is_capturing() && started.elapsed() > self.listen_timeout {
                self.capture.stop();
                tracing::debug!("listen timeout, no speech started");
                return Ok(None);
            }
        };

        self.capture.stop();

        let wav = samples_to_wav(&utterance, SAMPLE_RATE)
            .map_err(|e| CapabilityError::Audio(e.to_string()))?;
        let transcript = self.stt.transcribe(&wav).await?;
        let transcript = transcript.trim();

        if transcript.is_empty() {
            tracing::debug!("empty transcript");
            Ok(None)
        } else {
            Ok(Some(transcript.to_string()))
        }
    }
}
