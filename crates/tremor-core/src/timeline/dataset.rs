//! Immutable description of a loaded dataset
//!
//! The playback sample rate is never stored. It is derived from the total
//! sample count and the wall-clock span of the recording, so conversions
//! stay correct when a dataset has been resampled upstream.

use chrono::{DateTime, Utc};

/// Convert a chrono delta to fractional seconds
pub(crate) fn delta_seconds(delta: chrono::Duration) -> f64 {
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 * 1e-9,
        // Spans beyond ~292 years overflow the nanosecond count
        None => delta.num_milliseconds() as f64 * 1e-3,
    }
}

/// Convert fractional seconds to a chrono delta (nanosecond resolution)
pub(crate) fn seconds_delta(seconds: f64) -> chrono::Duration {
    chrono::Duration::nanoseconds((seconds * 1e9).round() as i64)
}

/// Reference data for one loaded dataset, immutable once created
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetInfo {
    total_samples: u64,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

impl DatasetInfo {
    pub fn new(total_samples: u64, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            total_samples,
            start_time,
            end_time,
        }
    }

    #[inline]
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    #[inline]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    #[inline]
    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    /// Wall-clock span of the recording in seconds (0 for degenerate ranges)
    pub fn span_seconds(&self) -> f64 {
        delta_seconds(self.end_time - self.start_time).max(0.0)
    }

    /// Total playback duration in seconds
    ///
    /// Playback-domain time runs 1:1 with the wall-clock offset, so the
    /// duration IS the recording span.
    #[inline]
    pub fn duration_seconds(&self) -> f64 {
        self.span_seconds()
    }

    /// Derived playback rate in samples per playback-domain second
    ///
    /// Returns 0.0 for degenerate spans; callers treat that as "convert
    /// everything to position zero".
    pub fn playback_rate(&self) -> f64 {
        let span = self.span_seconds();
        if span <= 0.0 {
            return 0.0;
        }
        self.total_samples as f64 / span
    }
}
