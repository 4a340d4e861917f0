//! Crossfade seek orchestration
//!
//! A seek while audio is audible never jumps the cursor directly: the
//! gain ramps linearly to the floor over a short window, the jump fires
//! as a deferred task, and the gain ramps back as the new material starts.
//! The deferred half re-clamps its target against the bounds current at
//! fire time, so a selection redefined mid-flight wins over the stale
//! target. A seek from rest skips the window; there is nothing audible
//! to protect.

use std::time::Instant;

use crate::engine::{EngineCommand, RampCurve, MIN_GAIN};
use crate::types::PlayState;

use super::tasks::DeferredAction;
use super::{ramp_duration, Player, CROSSFADE_MS};

impl Player {
    /// Seek to a playback-domain position
    ///
    /// `resume` makes playback start even from rest. The target is
    /// clamped to the selection when one is set, else to the dataset.
    pub fn seek_to(&mut self, seconds: f64, resume: bool) {
        self.seek_to_at(seconds, resume, Instant::now());
    }

    pub fn seek_to_at(&mut self, seconds: f64, resume: bool, now: Instant) {
        if !self.ensure_loaded("seek_to") {
            return;
        }
        self.tasks.invalidate();

        if self.transport.is_playing() {
            self.send(EngineCommand::RampGain {
                target: MIN_GAIN,
                millis: CROSSFADE_MS,
                curve: RampCurve::Linear,
            });
            self.tasks.schedule(
                DeferredAction::CompleteSeek {
                    target_seconds: seconds,
                    resume,
                },
                now + ramp_duration(CROSSFADE_MS),
            );
        } else {
            self.complete_seek_at(seconds, resume, now);
        }
    }

    /// Seek from a UI click; whether playback starts follows the
    /// operator's play-on-seek setting
    pub fn click_seek(&mut self, seconds: f64) {
        self.click_seek_at(seconds, Instant::now());
    }

    pub fn click_seek_at(&mut self, seconds: f64, now: Instant) {
        let resume = self.config.play_on_seek;
        self.seek_to_at(seconds, resume, now);
    }

    /// Seek from a click at pixel `x` on a waveform `width` pixels wide
    ///
    /// The pixel resolves through the viewport, so clicking a zoomed view
    /// lands inside the zoomed region.
    pub fn click_seek_pixel(&mut self, x: f32, width: f32) {
        self.click_seek_pixel_at(x, width, Instant::now());
    }

    pub fn click_seek_pixel_at(&mut self, x: f32, width: f32, now: Instant) {
        let Some(seconds) = self
            .timeline
            .as_ref()
            .map(|tl| tl.timestamp_to_seconds(tl.pixel_to_timestamp(x, width)))
        else {
            log::debug!("click_seek_pixel: no dataset loaded");
            return;
        };
        self.click_seek_at(seconds, now);
    }

    /// Deferred half of a crossfade seek; the whole of a seek from rest
    ///
    /// Clamps against the bounds current right now, transitions to
    /// playing before the engine command when asked to resume, and
    /// anchors the position in the same turn as the command send.
    pub(super) fn complete_seek_at(&mut self, seconds: f64, resume: bool, now: Instant) {
        let target = self.transport.clamp_seek_target(seconds);
        let Some(sample) = self
            .timeline
            .as_ref()
            .map(|tl| tl.seconds_to_sample(target))
        else {
            return;
        };

        if resume && !self.transport.is_playing() {
            self.resume_output();
            self.transport.set_state(PlayState::Playing);
        }
        self.transport.anchor_position(target, now);
        self.send(EngineCommand::Seek {
            sample_position: sample,
            force_resume: resume,
        });
        self.send(EngineCommand::RampGain {
            target: self.transport.volume(),
            millis: CROSSFADE_MS,
            curve: RampCurve::Linear,
        });
    }
}
