//! Cross-platform audio output for the playback engine
//!
//! A single stereo output stream drives the sample renderer from the
//! hardware callback. The design is lock-free across thread boundaries:
//!
//! - **UI thread**: sends `EngineCommand`s through an SPSC ring buffer
//! - **Audio thread**: owns the renderer exclusively and drains the
//!   command ring at block boundaries, so every command applies at a
//!   block edge and never mid-buffer
//! - **Feedback**: position facts flow back through relaxed atomics and
//!   an SPSC event ring, never through locks
//!
//! Device selection covers every available host, not just the platform
//! default, so an operator can route the audified output into JACK on a
//! machine where ALSA is the default host.

mod backend;
mod config;
mod cpal_backend;
mod device;
mod error;

pub use backend::{start_audio_system, AudioHandle, AudioSystemResult};
pub use config::{
    AudioConfig, BufferSize, DeviceId, DEFAULT_BUFFER_SIZE, DEFAULT_SAMPLE_RATE,
    LOW_LATENCY_BUFFER_SIZE, MAX_BUFFER_SIZE,
};
pub use device::{
    available_output_devices, default_output_device, find_device_by_id, OutputDevice,
};
pub use error::{AudioError, AudioResult};
