//! Transport value object
//!
//! Single owner of "where we are and whether we are moving". Position is
//! kept as an anchor pair (seconds at an `Instant`) and extrapolated by
//! elapsed wall-clock time while playing, so the UI never polls the audio
//! thread per frame. The renderer's periodic position reports re-anchor
//! the pair and keep drift bounded.

use std::time::Instant;

use crate::types::PlayState;

/// Positions this close to the end restart playback from zero
pub const NEAR_END_EPSILON: f64 = 0.1;

/// A user selection in playback-domain seconds, always normalized
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub start: f64,
    pub end: f64,
}

impl Selection {
    /// Build a normalized selection (start <= end, non-finite bounds to 0)
    pub fn new(a: f64, b: f64) -> Self {
        let a = if a.is_finite() { a } else { 0.0 };
        let b = if b.is_finite() { b } else { 0.0 };
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Clamp a time into the selection
    #[inline]
    pub fn clamp(&self, seconds: f64) -> f64 {
        seconds.clamp(self.start, self.end)
    }
}

/// Playback transport state: play state, anchored position, rates,
/// volume, selection, and loop flag
#[derive(Debug, Clone)]
pub struct Transport {
    state: PlayState,
    /// Playback-domain seconds at `anchor`
    position: f64,
    anchor: Instant,
    /// Dataset duration in seconds, 0 while nothing is loaded
    duration: f64,
    /// Playback-domain seconds consumed per wall-clock second while playing
    advance_rate: f64,
    base_speed: f64,
    volume: f32,
    selection: Option<Selection>,
    loop_enabled: bool,
}

impl Transport {
    pub fn new() -> Self {
        Self {
            state: PlayState::Stopped,
            position: 0.0,
            anchor: Instant::now(),
            duration: 0.0,
            advance_rate: 1.0,
            base_speed: 1.0,
            volume: 1.0,
            selection: None,
            loop_enabled: false,
        }
    }

    #[inline]
    pub fn state(&self) -> PlayState {
        self.state
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    #[inline]
    pub fn base_speed(&self) -> f64 {
        self.base_speed
    }

    #[inline]
    pub fn volume(&self) -> f32 {
        self.volume
    }

    #[inline]
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    #[inline]
    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Enter a new play state; position bookkeeping is left to the caller
    pub fn set_state(&mut self, state: PlayState) {
        self.state = state;
    }

    /// Reset for a freshly loaded dataset, keeping speed and volume
    pub fn reset_for_load(&mut self, duration: f64, now: Instant) {
        self.state = PlayState::Stopped;
        self.position = 0.0;
        self.anchor = now;
        self.duration = duration.max(0.0);
        self.selection = None;
        self.loop_enabled = false;
    }

    /// Extrapolated position at `now`
    ///
    /// While playing this advances the anchor by elapsed wall time at the
    /// current advance rate; otherwise the anchor position holds. The
    /// result always respects the position invariant (inside the dataset,
    /// and inside the selection when looping is armed).
    pub fn position_at(&self, now: Instant) -> f64 {
        let mut position = self.position;
        if self.state.is_playing() {
            let elapsed = now.saturating_duration_since(self.anchor).as_secs_f64();
            position += elapsed * self.advance_rate;
        }
        self.clamp_position(position)
    }

    pub fn position_now(&self) -> f64 {
        self.position_at(Instant::now())
    }

    /// Move the anchor to an explicit position (seek, position report)
    pub fn anchor_position(&mut self, seconds: f64, now: Instant) {
        let seconds = if seconds.is_finite() { seconds } else { 0.0 };
        self.position = self.clamp_position(seconds);
        self.anchor = now;
    }

    /// Materialize the extrapolated position into the anchor
    ///
    /// Call before any change to state or rates so the elapsed time under
    /// the old rate is not re-interpreted under the new one.
    pub fn freeze_at(&mut self, now: Instant) {
        self.position = self.position_at(now);
        self.anchor = now;
    }

    /// Install new speed values, freezing the position first
    pub fn set_rates(&mut self, base_speed: f64, advance_rate: f64, now: Instant) {
        self.freeze_at(now);
        if base_speed.is_finite() && base_speed > 0.0 {
            self.base_speed = base_speed;
        }
        if advance_rate.is_finite() && advance_rate >= 0.0 {
            self.advance_rate = advance_rate;
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { self.volume };
    }

    /// Install a normalized selection clamped into the dataset, returning it
    pub fn set_selection(&mut self, a: f64, b: f64) -> Selection {
        let mut selection = Selection::new(a, b);
        if self.duration > 0.0 {
            selection.start = selection.start.clamp(0.0, self.duration);
            selection.end = selection.end.clamp(0.0, self.duration);
        }
        self.selection = Some(selection);
        selection
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn set_loop(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
    }

    /// Active playback bounds: the selection when set, else the dataset
    pub fn active_bounds(&self) -> (f64, f64) {
        match self.selection {
            Some(selection) => (selection.start, selection.end),
            None => (0.0, self.duration.max(0.0)),
        }
    }

    /// Clamp a seek target to the selection if set, else to the dataset
    pub fn clamp_seek_target(&self, seconds: f64) -> f64 {
        if !seconds.is_finite() {
            log::debug!("clamp_seek_target: non-finite target {seconds}, using 0");
            return self.clamp_seek_target(0.0);
        }
        match self.selection {
            Some(selection) => selection.clamp(seconds),
            None => seconds.clamp(0.0, self.duration.max(0.0)),
        }
    }

    /// Where playback starts when leaving rest: the selection start if one
    /// exists, else the current position, else 0 when parked near the end
    pub fn resume_start_position(&self, now: Instant) -> f64 {
        if let Some(selection) = self.selection {
            return selection.start;
        }
        let position = self.position_at(now);
        if self.duration > 0.0 && position >= self.duration - NEAR_END_EPSILON {
            0.0
        } else {
            position
        }
    }

    fn clamp_position(&self, position: f64) -> f64 {
        if self.loop_enabled {
            if let Some(selection) = self.selection {
                return selection.clamp(position);
            }
        }
        position.clamp(0.0, self.duration.max(0.0))
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn loaded_transport(now: Instant) -> Transport {
        let mut transport = Transport::new();
        transport.reset_for_load(100.0, now);
        transport
    }

    #[test]
    fn test_position_extrapolates_while_playing() {
        let t0 = Instant::now();
        let mut transport = loaded_transport(t0);
        transport.set_rates(2.0, 2.0, t0);
        transport.anchor_position(10.0, t0);
        transport.set_state(PlayState::Playing);

        let pos = transport.position_at(t0 + Duration::from_millis(1500));
        assert!((pos - 13.0).abs() < 1e-9, "expected 13.0, got {pos}");
    }

    #[test]
    fn test_position_holds_while_paused() {
        let t0 = Instant::now();
        let mut transport = loaded_transport(t0);
        transport.anchor_position(25.0, t0);
        transport.set_state(PlayState::Paused);

        let pos = transport.position_at(t0 + Duration::from_secs(5));
        assert!((pos - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_position_clamped_to_duration() {
        let t0 = Instant::now();
        let mut transport = loaded_transport(t0);
        transport.anchor_position(99.5, t0);
        transport.set_state(PlayState::Playing);

        let pos = transport.position_at(t0 + Duration::from_secs(10));
        assert!((pos - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_loop_clamps_into_selection() {
        let t0 = Instant::now();
        let mut transport = loaded_transport(t0);
        transport.set_selection(10.0, 20.0);
        transport.set_loop(true);
        transport.anchor_position(19.9, t0);
        transport.set_state(PlayState::Playing);

        let pos = transport.position_at(t0 + Duration::from_secs(3));
        assert!((pos - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_rates_freezes_elapsed_time_first() {
        let t0 = Instant::now();
        let mut transport = loaded_transport(t0);
        transport.anchor_position(0.0, t0);
        transport.set_state(PlayState::Playing);

        // Two seconds at 1x, then drop the advance rate to zero. The two
        // elapsed seconds must stay banked at the old rate.
        let t1 = t0 + Duration::from_secs(2);
        transport.set_rates(1.0, 0.0, t1);
        let pos = transport.position_at(t1 + Duration::from_secs(5));
        assert!((pos - 2.0).abs() < 1e-9, "expected 2.0, got {pos}");
    }

    #[test]
    fn test_selection_is_normalized_and_clamped() {
        let t0 = Instant::now();
        let mut transport = loaded_transport(t0);
        let selection = transport.set_selection(120.0, 30.0);
        assert!((selection.start - 30.0).abs() < 1e-9);
        assert!((selection.end - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_seek_target() {
        let t0 = Instant::now();
        let mut transport = loaded_transport(t0);
        assert!((transport.clamp_seek_target(-4.0) - 0.0).abs() < 1e-9);
        assert!((transport.clamp_seek_target(400.0) - 100.0).abs() < 1e-9);

        transport.set_selection(10.0, 20.0);
        assert!((transport.clamp_seek_target(5.0) - 10.0).abs() < 1e-9);
        assert!((transport.clamp_seek_target(25.0) - 20.0).abs() < 1e-9);
        assert!((transport.clamp_seek_target(15.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_active_bounds() {
        let t0 = Instant::now();
        let mut transport = loaded_transport(t0);
        assert_eq!(transport.active_bounds(), (0.0, 100.0));

        transport.set_selection(10.0, 20.0);
        assert_eq!(transport.active_bounds(), (10.0, 20.0));

        transport.clear_selection();
        assert_eq!(transport.active_bounds(), (0.0, 100.0));
    }

    #[test]
    fn test_resume_start_position() {
        let t0 = Instant::now();
        let mut transport = loaded_transport(t0);

        transport.anchor_position(40.0, t0);
        assert!((transport.resume_start_position(t0) - 40.0).abs() < 1e-9);

        // Parked within the near-end window restarts from zero.
        transport.anchor_position(99.95, t0);
        assert!((transport.resume_start_position(t0) - 0.0).abs() < 1e-9);

        // A selection always wins.
        transport.set_selection(10.0, 20.0);
        assert!((transport.resume_start_position(t0) - 10.0).abs() < 1e-9);
    }
}
