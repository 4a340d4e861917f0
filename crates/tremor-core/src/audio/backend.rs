//! Audio system lifecycle
//!
//! `start_audio_system` opens the output stream and hands back everything
//! the playback facade needs: the stream handle (dropping it stops audio),
//! the engine link, and the negotiated stream parameters.

use cpal::traits::StreamTrait;

use super::config::AudioConfig;
use super::cpal_backend;
use super::error::{AudioError, AudioResult};
use crate::engine::EngineLink;

/// Handle to the running output stream
///
/// Keep this alive for as long as audio should run. Suspend and resume
/// map to stream pause/play so a force-resume seek can wake a suspended
/// device before the engine command lands.
pub struct AudioHandle {
    stream: cpal::Stream,
    sample_rate: u32,
    buffer_size: u32,
}

impl AudioHandle {
    pub(super) fn new(stream: cpal::Stream, sample_rate: u32, buffer_size: u32) -> Self {
        Self {
            stream,
            sample_rate,
            buffer_size,
        }
    }

    /// Negotiated hardware sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Negotiated buffer size in frames
    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    /// Output latency of one hardware block in milliseconds
    pub fn latency_ms(&self) -> f32 {
        self.buffer_size as f32 / self.sample_rate as f32 * 1000.0
    }

    /// Stop the hardware callback without tearing the stream down
    pub fn suspend(&self) -> AudioResult<()> {
        self.stream
            .pause()
            .map_err(|e| AudioError::StreamPauseError(e.to_string()))
    }

    /// Restart a suspended hardware callback
    pub fn resume(&self) -> AudioResult<()> {
        self.stream
            .play()
            .map_err(|e| AudioError::StreamPlayError(e.to_string()))
    }
}

/// Everything a caller needs after starting the audio system
pub struct AudioSystemResult {
    /// Keep-alive handle for the output stream
    pub handle: AudioHandle,
    /// Command, event, and fact channels wired to the renderer
    pub link: EngineLink,
    /// Negotiated sample rate in Hz
    pub sample_rate: u32,
    /// Negotiated buffer size in frames
    pub buffer_size: u32,
    /// Output latency in milliseconds
    pub latency_ms: f32,
}

/// Start the audio output system
///
/// Resolves the configured device (or the system default), negotiates a
/// stream configuration, and starts the renderer inside the hardware
/// callback.
pub fn start_audio_system(config: &AudioConfig) -> AudioResult<AudioSystemResult> {
    cpal_backend::start(config)
}
