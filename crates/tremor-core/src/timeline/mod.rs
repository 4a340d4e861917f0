//! Coordinate authority for the audified timeline
//!
//! Four coordinate systems describe the same instant: absolute sample
//! index, playback-domain seconds, wall-clock timestamp, and screen pixel.
//! This module is the single place conversions between them live.
//!
//! Rules that keep the systems mutually consistent:
//! - The playback rate is DERIVED: `total_samples / wall_clock_span`.
//!   The audio hardware rate never enters a conversion here.
//! - Timestamps are the canonical persisted coordinate. Sample and pixel
//!   positions are always computed, never stored.
//! - Every pixel conversion composes through timestamp. There is exactly
//!   one function per domain pair and no shortcut paths, so a viewport
//!   zoom is picked up by every consumer at once.
//!
//! All conversion inputs are clamped, and degenerate spans fall back to
//! zero instead of producing NaN or infinity.

mod dataset;
mod viewport;

pub use dataset::DatasetInfo;
pub use viewport::{RegionId, Viewport, ViewportMode};

use chrono::{DateTime, Utc};

use dataset::{delta_seconds, seconds_delta};

/// Conversion authority over one loaded dataset and its viewport
#[derive(Debug, Clone)]
pub struct Timeline {
    info: DatasetInfo,
    viewport: Viewport,
}

impl Timeline {
    /// Create a timeline for a freshly loaded dataset, viewing everything
    pub fn new(info: DatasetInfo) -> Self {
        let viewport = Viewport::full_view(&info);
        Self { info, viewport }
    }

    #[inline]
    pub fn dataset(&self) -> &DatasetInfo {
        &self.info
    }

    #[inline]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[inline]
    pub fn total_samples(&self) -> u64 {
        self.info.total_samples()
    }

    #[inline]
    pub fn duration_seconds(&self) -> f64 {
        self.info.duration_seconds()
    }

    // ─── Viewport mutation (the only two mutators) ───────────────────────

    /// Zoom the viewport to a wall-clock sub-range
    pub fn set_viewport_to_region(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        id: RegionId,
    ) {
        self.viewport = Viewport::region(start, end, id);
    }

    /// Restore the full-dataset viewport
    pub fn set_viewport_to_full(&mut self) {
        self.viewport = Viewport::full_view(&self.info);
    }

    // ─── Sample ↔ playback seconds ───────────────────────────────────────

    /// Playback-domain seconds for an absolute sample index
    pub fn sample_to_seconds(&self, sample: u64) -> f64 {
        let rate = self.info.playback_rate();
        if rate <= 0.0 {
            return 0.0;
        }
        sample as f64 / rate
    }

    /// Absolute sample index for a playback-domain time
    ///
    /// Rounds to the nearest sample and clamps to `[0, total_samples]`.
    /// Non-finite input maps to sample 0.
    pub fn seconds_to_sample(&self, seconds: f64) -> u64 {
        if !seconds.is_finite() {
            log::debug!("seconds_to_sample: non-finite input {seconds}, using 0");
            return 0;
        }
        let rate = self.info.playback_rate();
        if rate <= 0.0 {
            return 0;
        }
        let total = self.info.total_samples();
        let sample = (seconds * rate).round();
        if sample <= 0.0 {
            0
        } else if sample >= total as f64 {
            total
        } else {
            sample as u64
        }
    }

    // ─── Playback seconds ↔ wall-clock timestamp ─────────────────────────

    /// Wall-clock timestamp at a playback-domain time
    #[inline]
    pub fn seconds_to_timestamp(&self, seconds: f64) -> DateTime<Utc> {
        self.info.start_time() + seconds_delta(seconds)
    }

    /// Playback-domain time of a wall-clock timestamp (seconds from start)
    #[inline]
    pub fn timestamp_to_seconds(&self, ts: DateTime<Utc>) -> f64 {
        delta_seconds(ts - self.info.start_time())
    }

    // ─── Pixel ↔ wall-clock timestamp (the canonical pixel mapping) ──────

    /// Timestamp under a pixel, given the drawing width
    ///
    /// Progress along the width is clamped to `[0, 1]`; a degenerate
    /// viewport or width maps every pixel to the viewport start.
    pub fn pixel_to_timestamp(&self, x: f32, width: f32) -> DateTime<Utc> {
        let span = self.viewport.span_seconds();
        if span <= 0.0 || width <= 0.0 || !x.is_finite() {
            log::debug!("pixel_to_timestamp: degenerate input (x={x}, width={width})");
            return self.viewport.start();
        }
        let progress = (x / width).clamp(0.0, 1.0) as f64;
        self.viewport.start() + seconds_delta(progress * span)
    }

    /// Pixel position of a timestamp, given the drawing width
    ///
    /// Timestamps outside the viewport clamp to its edges; a degenerate
    /// viewport maps everything to pixel 0.
    pub fn timestamp_to_pixel(&self, ts: DateTime<Utc>, width: f32) -> f32 {
        let span = self.viewport.span_seconds();
        if span <= 0.0 || width <= 0.0 {
            log::debug!("timestamp_to_pixel: degenerate viewport span or width");
            return 0.0;
        }
        let offset = delta_seconds(ts - self.viewport.start());
        let progress = (offset / span).clamp(0.0, 1.0);
        (progress * width as f64) as f32
    }

    // ─── Compositions (always via timestamp, never direct) ───────────────

    /// Pixel position of an absolute sample index
    pub fn sample_to_pixel(&self, sample: u64, width: f32) -> f32 {
        let ts = self.seconds_to_timestamp(self.sample_to_seconds(sample));
        self.timestamp_to_pixel(ts, width)
    }

    /// Absolute sample index under a pixel
    pub fn pixel_to_sample(&self, x: f32, width: f32) -> u64 {
        let ts = self.pixel_to_timestamp(x, width);
        self.seconds_to_sample(self.timestamp_to_seconds(ts))
    }

    // ─── Viewport queries ────────────────────────────────────────────────

    /// Magnification of the current viewport (1.0 at full view)
    pub fn zoom_level(&self) -> f64 {
        let total = self.info.span_seconds();
        let view = self.viewport.span_seconds();
        if total <= 0.0 || view <= 0.0 {
            return 1.0;
        }
        total / view
    }

    /// Whether a sample range intersects the samples implied by the viewport
    pub fn is_range_visible(&self, start_sample: u64, end_sample: u64) -> bool {
        let (lo, hi) = if start_sample <= end_sample {
            (start_sample, end_sample)
        } else {
            (end_sample, start_sample)
        };
        let view_start = self.seconds_to_sample(self.timestamp_to_seconds(self.viewport.start()));
        let view_end = self.seconds_to_sample(self.timestamp_to_seconds(self.viewport.end()));
        hi >= view_start && lo <= view_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2011, 3, 11, 5, 46, 24).unwrap()
    }

    /// 100 s of wall clock audified into 44_100 samples (441 samples/s)
    fn timeline_100s() -> Timeline {
        let info = DatasetInfo::new(44_100, t0(), t0() + chrono::Duration::seconds(100));
        Timeline::new(info)
    }

    #[test]
    fn test_derived_playback_rate() {
        let tl = timeline_100s();
        assert!((tl.dataset().playback_rate() - 441.0).abs() < 1e-9);
        assert!((tl.duration_seconds() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_time_inverse() {
        let tl = timeline_100s();
        for sample in [0u64, 1, 440, 441, 12_345, 44_099, 44_100] {
            let secs = tl.sample_to_seconds(sample);
            let back = tl.seconds_to_sample(secs);
            assert!(
                back.abs_diff(sample) <= 1,
                "sample {sample} round-tripped to {back}"
            );
        }
    }

    #[test]
    fn test_time_to_sample_clamps() {
        let tl = timeline_100s();
        assert_eq!(tl.seconds_to_sample(-5.0), 0);
        assert_eq!(tl.seconds_to_sample(1000.0), 44_100);
        assert_eq!(tl.seconds_to_sample(f64::NAN), 0);
        assert_eq!(tl.seconds_to_sample(f64::INFINITY), 0);
    }

    #[test]
    fn test_pixel_round_trip_full_view() {
        let tl = timeline_100s();
        let width = 1000.0;
        for x in [0.0f32, 1.0, 237.0, 499.5, 500.0, 871.0, 1000.0] {
            let ts = tl.pixel_to_timestamp(x, width);
            let back = tl.timestamp_to_pixel(ts, width);
            assert!((back - x).abs() <= 1.0, "pixel {x} round-tripped to {back}");
        }
    }

    #[test]
    fn test_pixel_round_trip_region_view() {
        let mut tl = timeline_100s();
        tl.set_viewport_to_region(
            t0() + chrono::Duration::seconds(40),
            t0() + chrono::Duration::seconds(60),
            RegionId(7),
        );
        let width = 1000.0;
        for x in [0.0f32, 250.0, 333.3, 500.0, 750.0, 1000.0] {
            let ts = tl.pixel_to_timestamp(x, width);
            let back = tl.timestamp_to_pixel(ts, width);
            assert!((back - x).abs() <= 1.0, "pixel {x} round-tripped to {back}");
        }
    }

    #[test]
    fn test_zoomed_region_pixel_mapping() {
        // Full span [T0, T0+100s], zoomed to [T0+40s, T0+60s]: the midpoint
        // pixel of a 1000px strip must land on T0+50s and map back to 500.
        let mut tl = timeline_100s();
        tl.set_viewport_to_region(
            t0() + chrono::Duration::seconds(40),
            t0() + chrono::Duration::seconds(60),
            RegionId(1),
        );
        let ts = tl.pixel_to_timestamp(500.0, 1000.0);
        assert_eq!(ts, t0() + chrono::Duration::seconds(50));
        let px = tl.timestamp_to_pixel(ts, 1000.0);
        assert!((px - 500.0).abs() <= 1.0);
    }

    #[test]
    fn test_pixel_conversions_clamp_out_of_range() {
        let tl = timeline_100s();
        assert_eq!(tl.pixel_to_timestamp(-50.0, 1000.0), t0());
        assert_eq!(
            tl.pixel_to_timestamp(2000.0, 1000.0),
            t0() + chrono::Duration::seconds(100)
        );
        let before = t0() - chrono::Duration::seconds(10);
        assert_eq!(tl.timestamp_to_pixel(before, 1000.0), 0.0);
        let after = t0() + chrono::Duration::seconds(500);
        assert_eq!(tl.timestamp_to_pixel(after, 1000.0), 1000.0);
    }

    #[test]
    fn test_zero_duration_viewport_falls_back_to_zero() {
        let mut tl = timeline_100s();
        let at = t0() + chrono::Duration::seconds(30);
        tl.set_viewport_to_region(at, at, RegionId(2));
        assert_eq!(tl.timestamp_to_pixel(at, 1000.0), 0.0);
        assert_eq!(tl.pixel_to_timestamp(400.0, 1000.0), at);
        assert_eq!(tl.zoom_level(), 1.0);
    }

    #[test]
    fn test_zoom_level() {
        let mut tl = timeline_100s();
        assert!((tl.zoom_level() - 1.0).abs() < 1e-9);
        tl.set_viewport_to_region(
            t0() + chrono::Duration::seconds(40),
            t0() + chrono::Duration::seconds(60),
            RegionId(3),
        );
        assert!((tl.zoom_level() - 5.0).abs() < 1e-9);
        tl.set_viewport_to_full();
        assert!((tl.zoom_level() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_pixel_composition() {
        let tl = timeline_100s();
        // Sample at 25 s sits a quarter of the way across the full view.
        let sample = tl.seconds_to_sample(25.0);
        let px = tl.sample_to_pixel(sample, 1000.0);
        assert!((px - 250.0).abs() <= 1.0);
        let back = tl.pixel_to_sample(px, 1000.0);
        assert!(back.abs_diff(sample) <= 1);
    }

    #[test]
    fn test_is_range_visible() {
        let mut tl = timeline_100s();
        assert!(tl.is_range_visible(0, 100));
        tl.set_viewport_to_region(
            t0() + chrono::Duration::seconds(40),
            t0() + chrono::Duration::seconds(60),
            RegionId(4),
        );
        let s40 = tl.seconds_to_sample(40.0);
        let s60 = tl.seconds_to_sample(60.0);
        assert!(tl.is_range_visible(s40, s60));
        assert!(tl.is_range_visible(s40 - 100, s40 + 100));
        assert!(!tl.is_range_visible(0, s40 - 100));
        assert!(!tl.is_range_visible(s60 + 100, s60 + 200));
        // Swapped bounds are normalized, not rejected.
        assert!(tl.is_range_visible(s60, s40));
    }
}
