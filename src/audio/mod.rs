//! Audio hardware layer
//!
//! Microphone capture, speaker playback, and utterance endpointing. STT and
//! TTS are HTTP capabilities (see `voice`); this module only moves samples.

mod capture;
mod playback;
mod utterance;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use playback::AudioPlayback;
pub use utterance::{ListenState, UtteranceDetector};
