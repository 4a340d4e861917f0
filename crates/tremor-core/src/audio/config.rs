//! Audio backend configuration
//!
//! Device selection and buffer settings for the single stereo output the
//! playback engine drives. Serializable so operator choices persist in
//! the player configuration.

use serde::{Deserialize, Serialize};

/// Largest block the backend will pre-allocate for (frames)
pub const MAX_BUFFER_SIZE: usize = 8192;

/// Buffer size requested when the operator expresses no preference (frames)
pub const DEFAULT_BUFFER_SIZE: u32 = 512;

/// Buffer size used by low-latency mode (frames)
///
/// Seek and ramp gestures feel immediate at ~5 ms while staying stable
/// on ordinary consumer interfaces.
pub const LOW_LATENCY_BUFFER_SIZE: u32 = 256;

/// Sample rate requested from the device (48 kHz)
///
/// The renderer never resamples datasets; a device that runs at another
/// rate simply changes the engine speed multiplier.
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Preferred buffer size for the output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BufferSize {
    /// Let the backend pick [`DEFAULT_BUFFER_SIZE`]
    #[default]
    Default,
    /// Request an exact frame count, clamped to what the device allows
    Fixed(u32),
    /// Trade throughput margin for responsiveness
    LowLatency,
}

/// Audio device identifier
///
/// Carries the host backend alongside the device name so "default" on
/// JACK and "default" on ALSA stay distinguishable in saved settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceId {
    /// Device name as reported by the host
    pub name: String,
    /// Host backend name ("JACK", "ALSA", ..); None picks the preferred host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl DeviceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: None,
        }
    }

    pub fn with_host(name: &str, host: &str) -> Self {
        Self {
            name: name.to_string(),
            host: Some(host.to_string()),
        }
    }

    /// Label for logs and error messages, host included when known
    pub fn display_label(&self) -> String {
        match &self.host {
            Some(host) => format!("[{}] {}", host, self.name),
            None => self.name.clone(),
        }
    }
}

/// Configuration for the audio backend
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Output device (None = system default)
    pub output_device: Option<DeviceId>,
    /// Preferred buffer size
    pub buffer_size: BufferSize,
    /// Preferred sample rate (None = request the 48 kHz default)
    pub sample_rate: Option<u32>,
}

impl AudioConfig {
    /// Set the output device
    pub fn with_output_device(mut self, device: DeviceId) -> Self {
        self.output_device = Some(device);
        self
    }

    /// Set the preferred buffer size
    pub fn with_buffer_size(mut self, size: BufferSize) -> Self {
        self.buffer_size = size;
        self
    }
}
