//! UI-facing playback facade
//!
//! `Player` owns the transport, the coordinate authority, and the engine
//! link. Every user gesture lands here, mutates transport state, and fans
//! out to the renderer as ring messages in the fixed transition order:
//! gain down, state update, transport command, gain up. Nothing blocks;
//! the deferred halves of pause and crossfade-seek transitions sit on the
//! task queue until the host's tick loop fires them.
//!
//! A player without an engine link (`disconnected`) absorbs every
//! engine-bound message, so UI development needs no audio device.

mod seek;
mod tasks;
mod tick;

pub use tasks::{DeferredAction, TaskQueue};
pub use tick::TickSnapshot;

use std::path::Path;
use std::time::{Duration, Instant};

use basedrop::Shared;
use chrono::{DateTime, Utc};

use crate::audio::{start_audio_system, AudioHandle, AudioResult, DEFAULT_SAMPLE_RATE};
use crate::config::PlayerConfig;
use crate::dataset::export::write_selection_wav;
use crate::dataset::{DatasetBuffer, DatasetError, DatasetResult, LoadedDataset};
use crate::engine::{EngineCommand, EngineLink, RampCurve, MIN_GAIN};
use crate::timeline::{RegionId, Timeline};
use crate::transport::{base_speed, engine_speed, Selection, Transport, NEAR_END_EPSILON};
use crate::types::PlayState;

/// Gain ramp window for pause, stop, resume, and volume moves, in ms
pub const TRANSITION_RAMP_MS: f32 = 50.0;

/// Crossfade window protecting audible content across a seek, in ms
pub const CROSSFADE_MS: f32 = 20.0;

fn ramp_duration(millis: f32) -> Duration {
    Duration::from_secs_f64(f64::from(millis) / 1000.0)
}

/// Playback facade the UI drives
pub struct Player {
    transport: Transport,
    timeline: Option<Timeline>,
    dataset: Option<Shared<DatasetBuffer>>,
    link: Option<EngineLink>,
    output: Option<AudioHandle>,
    tasks: TaskQueue,
    config: PlayerConfig,
    hardware_rate: u32,
}

impl Player {
    /// Start the audio system and wire a player to it
    pub fn connect(config: PlayerConfig) -> AudioResult<Self> {
        let system = start_audio_system(&config.audio)?;
        let mut player = Self::with_link(system.link, system.sample_rate, config);
        player.output = Some(system.handle);
        Ok(player)
    }

    /// A player with no renderer attached
    ///
    /// Transport and timeline behave normally; engine-bound messages are
    /// dropped with a debug log.
    pub fn disconnected(config: PlayerConfig) -> Self {
        let mut player = Self {
            transport: Transport::new(),
            timeline: None,
            dataset: None,
            link: None,
            output: None,
            tasks: TaskQueue::new(),
            config,
            hardware_rate: DEFAULT_SAMPLE_RATE,
        };
        player.transport.set_volume(player.config.volume);
        player
    }

    /// Wire a player to an existing engine link
    ///
    /// For hosts that run their own output backend; `hardware_rate` is the
    /// rate the renderer's output actually runs at.
    pub fn with_link(link: EngineLink, hardware_rate: u32, config: PlayerConfig) -> Self {
        let mut player = Self::disconnected(config);
        player.link = Some(link);
        player.hardware_rate = hardware_rate.max(1);
        player.sync_engine();
        player
    }

    // ─── Dataset lifecycle ───────────────────────────────────────────────

    /// Install a decoded dataset and hand its buffer to the renderer
    ///
    /// Resets the transport to stopped at position zero; speed and volume
    /// carry over. The timeline becomes the coordinate authority for the
    /// new dataset immediately.
    pub fn load(&mut self, dataset: LoadedDataset) {
        self.load_at(dataset, Instant::now());
    }

    pub fn load_at(&mut self, dataset: LoadedDataset, now: Instant) {
        let LoadedDataset { buffer, info } = dataset;
        self.tasks.invalidate();
        self.transport.reset_for_load(info.duration_seconds(), now);
        self.timeline = Some(Timeline::new(info));
        let base = self.transport.base_speed();
        let advance = self.advance_rate_for(base);
        self.transport.set_rates(base, advance, now);
        self.dataset = Some(buffer.clone());
        self.send(EngineCommand::LoadDataset(Box::new(buffer)));
    }

    /// Drop the dataset; the audio-side buffer is freed off-thread
    pub fn unload(&mut self) {
        self.unload_at(Instant::now());
    }

    pub fn unload_at(&mut self, now: Instant) {
        self.tasks.invalidate();
        self.transport.reset_for_load(0.0, now);
        self.timeline = None;
        self.dataset = None;
        self.send(EngineCommand::Unload);
    }

    // ─── Transport flow ──────────────────────────────────────────────────

    /// Toggle between playing and not playing
    pub fn toggle_play_pause(&mut self) {
        self.toggle_play_pause_at(Instant::now());
    }

    pub fn toggle_play_pause_at(&mut self, now: Instant) {
        if !self.ensure_loaded("toggle_play_pause") {
            return;
        }
        if self.transport.is_playing() {
            self.pause_at(now);
        } else {
            self.resume_at(now);
        }
    }

    /// Pause playback: ramp the gain down, then stop consuming
    ///
    /// Idempotent; pausing while paused or stopped issues nothing.
    pub fn pause(&mut self) {
        self.pause_at(Instant::now());
    }

    pub fn pause_at(&mut self, now: Instant) {
        if !self.ensure_loaded("pause") {
            return;
        }
        if !self.transport.is_playing() {
            return;
        }
        self.tasks.invalidate();
        self.transport.freeze_at(now);
        self.transport.set_state(PlayState::Paused);
        self.send(EngineCommand::RampGain {
            target: MIN_GAIN,
            millis: TRANSITION_RAMP_MS,
            curve: RampCurve::Exponential,
        });
        self.tasks.schedule(
            DeferredAction::StopConsuming,
            now + ramp_duration(TRANSITION_RAMP_MS),
        );
    }

    /// Leave rest
    ///
    /// From paused, playback continues in place, except that parking
    /// within the near-end window restarts from the active start bound.
    /// From stopped, playback starts at the selection start, else the held
    /// position, else zero when parked near the end.
    pub fn resume(&mut self) {
        self.resume_at(Instant::now());
    }

    pub fn resume_at(&mut self, now: Instant) {
        if !self.ensure_loaded("resume") {
            return;
        }
        if self.transport.is_playing() {
            return;
        }
        self.tasks.invalidate();

        let position = self.transport.position_at(now);
        let (bound_start, bound_end) = self.transport.active_bounds();
        let start = match self.transport.state() {
            PlayState::Stopped => self.transport.resume_start_position(now),
            _ => {
                if bound_end > 0.0 && position >= bound_end - NEAR_END_EPSILON {
                    bound_start
                } else {
                    position
                }
            }
        };
        let jump =
            self.transport.state() == PlayState::Stopped || (start - position).abs() > 1e-9;

        self.resume_output();
        self.transport.set_state(PlayState::Playing);
        self.transport.anchor_position(start, now);

        if jump {
            // The renderer cursor is somewhere else; land it exactly
            let sample = self
                .timeline
                .as_ref()
                .map(|tl| tl.seconds_to_sample(start))
                .unwrap_or(0);
            self.send(EngineCommand::Seek {
                sample_position: sample,
                force_resume: true,
            });
        } else {
            self.send(EngineCommand::Resume);
        }
        self.send(EngineCommand::RampGain {
            target: self.transport.volume(),
            millis: TRANSITION_RAMP_MS,
            curve: RampCurve::Exponential,
        });
    }

    /// Stop playback, keeping the position for a later resume
    pub fn stop(&mut self) {
        self.stop_at(Instant::now());
    }

    pub fn stop_at(&mut self, now: Instant) {
        if !self.ensure_loaded("stop") {
            return;
        }
        if self.transport.state() == PlayState::Stopped {
            return;
        }
        self.tasks.invalidate();
        self.transport.freeze_at(now);
        self.transport.set_state(PlayState::Stopped);
        self.send(EngineCommand::RampGain {
            target: MIN_GAIN,
            millis: TRANSITION_RAMP_MS,
            curve: RampCurve::Exponential,
        });
        self.tasks.schedule(
            DeferredAction::StopConsuming,
            now + ramp_duration(TRANSITION_RAMP_MS),
        );
    }

    // ─── Parameters ──────────────────────────────────────────────────────

    /// Set playback speed from the raw control value (0..=100)
    ///
    /// Moves both derived values together: the transport's advance rate
    /// for the position indicator and the renderer's engine speed. Does
    /// not disturb a pending crossfade seek.
    pub fn set_speed(&mut self, control: f64) {
        self.set_speed_at(control, Instant::now());
    }

    pub fn set_speed_at(&mut self, control: f64, now: Instant) {
        if !self.ensure_loaded("set_speed") {
            return;
        }
        let base = base_speed(control);
        let advance = self.advance_rate_for(base);
        self.transport.set_rates(base, advance, now);
        let speed = self.engine_speed();
        self.send(EngineCommand::SetSpeed { speed });
    }

    /// Set the output volume; a short linear ramp avoids zipper noise
    pub fn set_volume(&mut self, volume: f32) {
        if !self.ensure_loaded("set_volume") {
            return;
        }
        self.transport.set_volume(volume);
        self.config.volume = self.transport.volume();
        self.send(EngineCommand::RampGain {
            target: self.transport.volume(),
            millis: TRANSITION_RAMP_MS,
            curve: RampCurve::Linear,
        });
    }

    /// Operator toggle: clicking to seek also starts playback
    pub fn set_play_on_seek(&mut self, enabled: bool) {
        self.config.play_on_seek = enabled;
    }

    // ─── Selection and loop ──────────────────────────────────────────────

    /// Select a playback region; bounds may arrive in either order
    ///
    /// Does not cancel a pending seek: the seek re-clamps against these
    /// bounds when it fires.
    pub fn set_selection(&mut self, a: f64, b: f64) {
        if !self.ensure_loaded("set_selection") {
            return;
        }
        let selection = self.transport.set_selection(a, b);
        self.send_selection(Some(selection));
    }

    /// Clear the selection; looping then covers the whole dataset
    pub fn clear_selection(&mut self) {
        if !self.ensure_loaded("clear_selection") {
            return;
        }
        self.transport.clear_selection();
        self.send_selection(None);
    }

    /// Arm or disarm looping over the active bounds
    pub fn set_loop(&mut self, enabled: bool) {
        if !self.ensure_loaded("set_loop") {
            return;
        }
        self.transport.set_loop(enabled);
        self.send_selection(self.transport.selection());
    }

    /// One message carries bounds and flag so the renderer never observes
    /// a half-updated pair
    fn send_selection(&mut self, selection: Option<Selection>) {
        let loop_enabled = self.transport.loop_enabled();
        self.send(EngineCommand::SetSelection {
            start: selection.map(|s| s.start),
            end: selection.map(|s| s.end),
            loop_enabled,
        });
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    /// Zoom the coordinate authority to a wall-clock region
    pub fn zoom_to_region(&mut self, start: DateTime<Utc>, end: DateTime<Utc>, id: RegionId) {
        if let Some(timeline) = self.timeline.as_mut() {
            timeline.set_viewport_to_region(start, end, id);
        }
    }

    /// Restore the full-dataset view
    pub fn zoom_to_full(&mut self) {
        if let Some(timeline) = self.timeline.as_mut() {
            timeline.set_viewport_to_full();
        }
    }

    // ─── Export ──────────────────────────────────────────────────────────

    /// Write the selected span of the loaded dataset as a WAV file
    ///
    /// Returns the number of samples written.
    pub fn export_selection(&self, path: &Path) -> DatasetResult<u64> {
        let Some(buffer) = &self.dataset else {
            return Err(DatasetError::EmptyDataset);
        };
        let Some(selection) = self.transport.selection() else {
            return Err(DatasetError::NoSelection);
        };
        write_selection_wav(buffer, selection.start, selection.end, path)
    }

    // ─── Snapshot accessors ──────────────────────────────────────────────

    pub fn state(&self) -> PlayState {
        self.transport.state()
    }

    pub fn is_loaded(&self) -> bool {
        self.timeline.is_some()
    }

    /// Extrapolated playback position in playback-domain seconds
    pub fn position(&self) -> f64 {
        self.transport.position_now()
    }

    pub fn position_at(&self, now: Instant) -> f64 {
        self.transport.position_at(now)
    }

    pub fn volume(&self) -> f32 {
        self.transport.volume()
    }

    /// Display speed: the base multiplier before rate correction
    pub fn base_speed(&self) -> f64 {
        self.transport.base_speed()
    }

    /// Dataset samples consumed per output frame at the current base speed
    pub fn engine_speed(&self) -> f64 {
        engine_speed(
            self.transport.base_speed(),
            self.config.nominal_sample_rate,
            self.hardware_rate,
        )
    }

    pub fn selection(&self) -> Option<Selection> {
        self.transport.selection()
    }

    pub fn loop_enabled(&self) -> bool {
        self.transport.loop_enabled()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.transport.duration()
    }

    /// Coordinate authority for the loaded dataset
    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Output stream handle when this player started the audio system
    pub fn output(&self) -> Option<&AudioHandle> {
        self.output.as_ref()
    }

    // ─── Internals ───────────────────────────────────────────────────────

    /// Playback-domain seconds the indicator advances per wall-clock second
    ///
    /// The renderer eats `engine_speed` dataset samples per output frame;
    /// dividing the resulting samples per second by the dataset's playback
    /// rate lands back in playback-domain time.
    fn advance_rate_for(&self, base: f64) -> f64 {
        let Some(timeline) = &self.timeline else {
            return 0.0;
        };
        let playback_rate = timeline.dataset().playback_rate();
        if playback_rate <= 0.0 {
            return 0.0;
        }
        base * f64::from(self.config.nominal_sample_rate) / playback_rate
    }

    /// Align renderer gain and speed with the transport at hookup
    fn sync_engine(&mut self) {
        let speed = self.engine_speed();
        let volume = self.transport.volume();
        self.send(EngineCommand::SetSpeed { speed });
        self.send(EngineCommand::RampGain {
            target: volume,
            millis: 0.0,
            curve: RampCurve::Linear,
        });
    }

    fn ensure_loaded(&self, op: &str) -> bool {
        if self.timeline.is_some() {
            true
        } else {
            log::debug!("{op}: no dataset loaded");
            false
        }
    }

    fn send(&mut self, command: EngineCommand) {
        let Some(link) = self.link.as_mut() else {
            log::debug!("engine command dropped: no renderer attached");
            return;
        };
        if link.commands.send(command).is_err() {
            log::warn!("engine command dropped: ring full");
        }
    }

    /// Wake a suspended output device before production starts
    fn resume_output(&self) {
        if let Some(output) = &self.output {
            if let Err(e) = output.resume() {
                log::warn!("Cannot resume output stream: {e}");
            }
        }
    }
}
