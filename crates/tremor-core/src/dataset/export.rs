//! WAV export of an audified selection
//!
//! Writes the samples under a selection as a mono float WAV at the
//! dataset's rounded playback rate, so the clip plays at the audified
//! pace in any external editor.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use super::{DatasetBuffer, DatasetError, DatasetResult};

/// Write the selection `[start_seconds, end_seconds]` to `path`
///
/// Bounds are normalized and clamped to the dataset; returns the number
/// of samples written.
pub fn write_selection_wav(
    buffer: &DatasetBuffer,
    start_seconds: f64,
    end_seconds: f64,
    path: &Path,
) -> DatasetResult<u64> {
    let rate = buffer.samples_per_second;
    if rate <= 0.0 || buffer.is_empty() {
        return Err(DatasetError::EmptyDataset);
    }

    let total = buffer.len();
    let lo = start_seconds.min(end_seconds).max(0.0);
    let hi = start_seconds.max(end_seconds);
    let start = ((lo * rate).round() as usize).min(total);
    let end = ((hi * rate).round() as usize).min(total);
    if start >= end {
        return Err(DatasetError::InvalidTimeRange);
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate: rate.round().max(1.0) as u32,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer =
        WavWriter::create(path, spec).map_err(|e| DatasetError::ExportError(e.to_string()))?;
    for &sample in &buffer.samples[start..end] {
        writer
            .write_sample(sample)
            .map_err(|e| DatasetError::ExportError(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| DatasetError::ExportError(e.to_string()))?;

    let written = (end - start) as u64;
    log::info!("Exported {} samples to {}", written, path.display());
    Ok(written)
}
