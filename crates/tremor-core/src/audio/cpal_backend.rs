//! cpal output stream hosting the sample renderer
//!
//! The hardware callback owns the renderer behind an `Arc<Mutex<..>>`.
//! Nothing else ever locks that mutex after startup, so the lock is
//! uncontended in steady state; all cross-thread traffic goes through
//! the rings and atomics inside the renderer itself.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, StreamTrait};

use super::backend::{AudioHandle, AudioSystemResult};
use super::config::{
    AudioConfig, BufferSize, DEFAULT_BUFFER_SIZE, DEFAULT_SAMPLE_RATE, LOW_LATENCY_BUFFER_SIZE,
    MAX_BUFFER_SIZE,
};
use super::error::{AudioError, AudioResult};
use crate::engine::{EngineLink, Renderer};
use crate::types::StereoBuffer;

/// Callback-side state: the renderer plus its pre-allocated block buffer
struct RenderState {
    renderer: Renderer,
    buffer: StereoBuffer,
}

impl RenderState {
    fn new(renderer: Renderer) -> Self {
        Self {
            renderer,
            buffer: StereoBuffer::silence(MAX_BUFFER_SIZE),
        }
    }

    /// Render one hardware block, clamped to the pre-allocated capacity
    fn process(&mut self, frames: usize) -> &StereoBuffer {
        self.buffer.set_len_from_capacity(frames.min(MAX_BUFFER_SIZE));
        self.renderer.process(&mut self.buffer);
        &self.buffer
    }
}

/// Pick a stream configuration the device supports
///
/// Prefers f32 stereo at the requested rate, falls back to any f32
/// stereo config, then to whatever the device offers. Returns the
/// stream config plus the negotiated sample rate and buffer frames.
fn negotiate_output_config(
    device: &cpal::Device,
    config: &AudioConfig,
) -> AudioResult<(cpal::StreamConfig, u32, u32)> {
    let supported: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| AudioError::ConfigError(format!("Cannot query output configs: {e}")))?
        .collect();
    if supported.is_empty() {
        return Err(AudioError::ConfigError(
            "Device reports no output configurations".to_string(),
        ));
    }

    let requested_rate = config.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);

    let range = supported
        .iter()
        .find(|c| {
            c.sample_format() == cpal::SampleFormat::F32
                && c.channels() >= 2
                && c.min_sample_rate().0 <= requested_rate
                && requested_rate <= c.max_sample_rate().0
        })
        .or_else(|| {
            supported
                .iter()
                .find(|c| c.sample_format() == cpal::SampleFormat::F32 && c.channels() >= 2)
        })
        .or_else(|| {
            supported
                .iter()
                .find(|c| c.sample_format() == cpal::SampleFormat::F32)
        })
        .ok_or_else(|| {
            AudioError::ConfigError("Device offers no f32 output format".to_string())
        })?;

    let sample_rate = requested_rate.clamp(range.min_sample_rate().0, range.max_sample_rate().0);
    if sample_rate != requested_rate {
        log::warn!("Device cannot run at {requested_rate} Hz, using {sample_rate} Hz");
    }
    if range.channels() < 2 {
        log::warn!("Output device is mono, right channel will be dropped");
    }

    let buffer_frames = match config.buffer_size {
        BufferSize::Default => DEFAULT_BUFFER_SIZE,
        BufferSize::Fixed(frames) => {
            let clamped = frames.clamp(64, MAX_BUFFER_SIZE as u32);
            if clamped != frames {
                log::warn!("Buffer size {frames} out of range, using {clamped}");
            }
            clamped
        }
        BufferSize::LowLatency => LOW_LATENCY_BUFFER_SIZE,
    };

    let stream_config = cpal::StreamConfig {
        channels: range.channels(),
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Fixed(buffer_frames),
    };

    Ok((stream_config, sample_rate, buffer_frames))
}

fn build_output_stream(
    device: &cpal::Device,
    stream_config: &cpal::StreamConfig,
    state: Arc<Mutex<RenderState>>,
) -> AudioResult<cpal::Stream> {
    let channels = stream_config.channels as usize;

    device
        .build_output_stream(
            stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut state = state.lock().unwrap();
                let rendered = state.process(data.len() / channels);
                if channels == 2 && data.len() == rendered.len() * 2 {
                    // Plain stereo device: one interleaved memcpy.
                    data.copy_from_slice(rendered.as_interleaved());
                    return;
                }
                let rendered = rendered.as_slice();
                for (i, frame) in data.chunks_mut(channels).enumerate() {
                    match rendered.get(i) {
                        Some(sample) => {
                            frame[0] = sample.left;
                            if channels > 1 {
                                frame[1] = sample.right;
                            }
                            for extra in frame.iter_mut().skip(2) {
                                *extra = 0.0;
                            }
                        }
                        None => frame.fill(0.0),
                    }
                }
            },
            move |err| {
                log::error!("Audio output stream error: {err}");
            },
            None,
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))
}

/// Open the configured device and start the renderer stream
pub(super) fn start(config: &AudioConfig) -> AudioResult<AudioSystemResult> {
    let device = match &config.output_device {
        Some(id) => super::device::find_device_by_id(id)?,
        None => super::device::default_output_device()?,
    };
    let device_name = device.name().unwrap_or_else(|_| "<unnamed>".to_string());

    let (stream_config, sample_rate, buffer_size) = negotiate_output_config(&device, config)?;
    let latency_ms = buffer_size as f32 / sample_rate as f32 * 1000.0;
    log::info!(
        "Audio output: {device_name} ({} ch, {sample_rate} Hz, {buffer_size} frames, ~{latency_ms:.1} ms)",
        stream_config.channels
    );

    let (link, renderer) = EngineLink::with_renderer(sample_rate);
    let state = Arc::new(Mutex::new(RenderState::new(renderer)));
    let stream = build_output_stream(&device, &stream_config, state)?;
    stream
        .play()
        .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;

    Ok(AudioSystemResult {
        handle: AudioHandle::new(stream, sample_rate, buffer_size),
        link,
        sample_rate,
        buffer_size,
        latency_ms,
    })
}
