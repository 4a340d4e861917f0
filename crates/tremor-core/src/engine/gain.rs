//! Gain envelope evaluated on the renderer's sample clock
//!
//! Ramps are scheduled in frames against a monotonic frame counter, not
//! against wall-clock timers, so a dropped buffer or a stalled device
//! delays a ramp instead of snapping it. The counter keeps advancing
//! while output is silent; a ramp scheduled just before a pause still
//! completes on time.

use crate::engine::command::RampCurve;

/// Minimum audible gain, the floor every transitional ramp heads for.
///
/// Exponential ramps clamp both endpoints here: an equal-ratio approach
/// to literal zero never terminates, and anything below -80 dBFS is
/// inaudible anyway.
pub const MIN_GAIN: f32 = 1e-4;

struct ActiveRamp {
    start_gain: f32,
    target: f32,
    start_frame: u64,
    end_frame: u64,
    curve: RampCurve,
}

/// Per-frame gain with at most one ramp in flight
///
/// A new ramp always starts from the current gain, so back-to-back
/// transitions (pause during a crossfade, say) stay continuous.
pub struct GainStage {
    current: f32,
    frame: u64,
    ramp: Option<ActiveRamp>,
}

impl GainStage {
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial.clamp(0.0, 1.0),
            frame: 0,
            ramp: None,
        }
    }

    #[inline]
    pub fn gain(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn is_ramping(&self) -> bool {
        self.ramp.is_some()
    }

    /// Schedule a ramp from the current gain, replacing any in flight
    ///
    /// A zero-length window applies the target immediately.
    pub fn begin_ramp(&mut self, target: f32, frames: u64, curve: RampCurve) {
        let target = if target.is_finite() { target.clamp(0.0, 1.0) } else { self.current };
        if frames == 0 {
            self.current = target;
            self.ramp = None;
            return;
        }
        self.ramp = Some(ActiveRamp {
            start_gain: self.current,
            target,
            start_frame: self.frame,
            end_frame: self.frame + frames,
            curve,
        });
    }

    /// Advance one frame and return the gain to apply to it
    #[inline]
    pub fn next(&mut self) -> f32 {
        self.frame += 1;
        self.settle();
        self.current
    }

    /// Advance the clock over a silent stretch without per-frame work
    pub fn advance(&mut self, frames: u64) {
        self.frame = self.frame.saturating_add(frames);
        self.settle();
    }

    fn settle(&mut self) {
        let Some(ramp) = &self.ramp else {
            return;
        };
        if self.frame >= ramp.end_frame {
            self.current = ramp.target;
            self.ramp = None;
            return;
        }
        let span = (ramp.end_frame - ramp.start_frame) as f32;
        let t = (self.frame - ramp.start_frame) as f32 / span;
        self.current = match ramp.curve {
            RampCurve::Linear => ramp.start_gain + (ramp.target - ramp.start_gain) * t,
            RampCurve::Exponential => {
                let start = ramp.start_gain.max(MIN_GAIN);
                let target = ramp.target.max(MIN_GAIN);
                start * (target / start).powf(t)
            }
        };
    }
}
