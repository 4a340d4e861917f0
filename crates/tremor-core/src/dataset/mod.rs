//! Dataset loading and the audio-thread buffer type
//!
//! An audified dataset arrives as a WAV or FLAC file rendered upstream
//! from the raw instrument feed. Loading decodes it to mono f32, derives
//! the playback rate from the recording's wall-clock span (never from the
//! file's nominal rate), and wraps the buffer in `basedrop::Shared` so
//! ownership can move to the audio thread and be dropped there without a
//! real-time free.

pub mod export;

use std::path::{Path, PathBuf};

use basedrop::Shared;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::engine::gc::gc_handle;
use crate::timeline::DatasetInfo;

/// Errors at the dataset boundary
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unsupported dataset format: {0}")]
    UnsupportedFormat(String),

    #[error("Dataset decoded to zero samples")]
    EmptyDataset,

    #[error("Dataset time range is empty or inverted")]
    InvalidTimeRange,

    #[error("No selection to export")]
    NoSelection,

    #[error("Failed to write export: {0}")]
    ExportError(String),
}

pub type DatasetResult<T> = Result<T, DatasetError>;

/// Mono dataset samples plus the derived playback rate
///
/// Owned by the audio thread while loaded; the `Shared` wrapper defers
/// the final drop to the collector thread.
pub struct DatasetBuffer {
    /// Audified samples, mono
    pub samples: Vec<f32>,
    /// Derived playback rate in samples per playback-domain second
    pub samples_per_second: f64,
}

impl DatasetBuffer {
    pub fn new(samples: Vec<f32>, samples_per_second: f64) -> Self {
        Self {
            samples,
            samples_per_second,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A decoded dataset ready to hand to the player
pub struct LoadedDataset {
    pub buffer: Shared<DatasetBuffer>,
    pub info: DatasetInfo,
}

/// Decode a dataset file and derive its playback geometry
///
/// `start_time` and `end_time` are the wall-clock bounds of the recording.
/// The playback rate falls out of the decoded sample count over that span;
/// the rate stamped in the file is logged but never trusted for geometry,
/// so resampled exports keep their timeline alignment.
pub fn load_dataset(
    path: &Path,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> DatasetResult<LoadedDataset> {
    if end_time <= start_time {
        return Err(DatasetError::InvalidTimeRange);
    }

    let (samples, source_rate, channels) = decode_audio(path)?;
    if samples.is_empty() {
        return Err(DatasetError::EmptyDataset);
    }
    let mono = downmix_mono(&samples, channels);

    let info = DatasetInfo::new(mono.len() as u64, start_time, end_time);
    log::info!(
        "Loaded dataset {}: {} samples over {:.1}s ({:.1} samples/s, file said {} Hz)",
        path.display(),
        mono.len(),
        info.span_seconds(),
        info.playback_rate(),
        source_rate
    );

    let buffer = Shared::new(&gc_handle(), DatasetBuffer::new(mono, info.playback_rate()));
    Ok(LoadedDataset { buffer, info })
}

/// Average interleaved channels down to mono
fn downmix_mono(interleaved: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    let channels = channels as usize;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Decode an audio file to interleaved f32 samples using Symphonia
fn decode_audio(path: &Path) -> DatasetResult<(Vec<f32>, u32, u16)> {
    use std::fs::File;
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let file = File::open(path).map_err(|e| DatasetError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Create a hint with the file extension
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    // Probe the media source
    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DatasetError::UnsupportedFormat(e.to_string()))?;

    let mut format = probed.format;

    // Find the first audio track
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| DatasetError::UnsupportedFormat("No audio track found".to_string()))?;

    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DatasetError::UnsupportedFormat("Unknown sample rate".to_string()))?;

    let channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(1);

    // Create decoder
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DatasetError::UnsupportedFormat(e.to_string()))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    // Decode all packets
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                log::warn!("Error reading packet: {}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(e) => {
                log::warn!("Error decoding packet: {}", e);
                continue;
            }
        };

        // Initialize sample buffer on first decode
        if sample_buf.is_none() {
            let spec = *decoded.spec();
            let duration = decoded.capacity() as u64;
            sample_buf = Some(SampleBuffer::new(duration, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    Ok((samples, sample_rate, channels))
}
