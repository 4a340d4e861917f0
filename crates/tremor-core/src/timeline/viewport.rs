//! Visible time window over a dataset
//!
//! Timestamps are the only coordinate a viewport stores. Sample indices
//! and pixel positions are always derived on demand, never cached, so a
//! zoom change can never leave a stale coordinate behind.

use chrono::{DateTime, Utc};

use super::dataset::{delta_seconds, DatasetInfo};

/// Identifier for a zoomed sub-region created by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(pub u64);

/// Whether the viewport shows the whole dataset or a zoomed sub-region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportMode {
    Full,
    Region(RegionId),
}

/// The current visible window, in wall-clock timestamps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    mode: ViewportMode,
}

impl Viewport {
    /// Viewport covering the full dataset span
    pub fn full_view(info: &DatasetInfo) -> Self {
        Self {
            start: info.start_time(),
            end: info.end_time(),
            mode: ViewportMode::Full,
        }
    }

    /// Viewport over a sub-region; bounds are normalized so start <= end
    pub fn region(start: DateTime<Utc>, end: DateTime<Utc>, id: RegionId) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
            mode: ViewportMode::Region(id),
        }
    }

    #[inline]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[inline]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    #[inline]
    pub fn mode(&self) -> ViewportMode {
        self.mode
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.mode == ViewportMode::Full
    }

    /// Visible span in seconds (0 for a degenerate window)
    pub fn span_seconds(&self) -> f64 {
        delta_seconds(self.end - self.start).max(0.0)
    }
}
