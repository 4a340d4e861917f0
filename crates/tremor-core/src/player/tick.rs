//! Host-driven indicator loop
//!
//! The renderer never calls back into the UI; the host polls `tick`
//! instead, typically once per frame while the snapshot asks for it.
//! Each tick drains renderer events, fires whichever deferred tasks
//! have come due, and reports the extrapolated position alongside a
//! reschedule flag. When the flag goes false the loop can stop
//! entirely; the next user gesture restarts it.

use std::time::Instant;

use crate::engine::{EngineCommand, EngineEvent};
use crate::types::PlayState;

use super::tasks::DeferredAction;
use super::Player;

/// What one tick observed, for repaint and scheduling decisions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSnapshot {
    /// Extrapolated playback position in playback-domain seconds
    pub position_seconds: f64,
    pub state: PlayState,
    /// Whether another tick is worth scheduling
    pub reschedule: bool,
}

impl Player {
    /// One pass of the indicator loop
    pub fn tick(&mut self) -> TickSnapshot {
        self.tick_at(Instant::now())
    }

    /// Events drain before tasks fire, so a position report queued ahead
    /// of a pending seek cannot overwrite the seek's fresh anchor.
    pub fn tick_at(&mut self, now: Instant) -> TickSnapshot {
        self.drain_events(now);
        self.fire_due_tasks(now);
        TickSnapshot {
            position_seconds: self.transport.position_at(now),
            state: self.transport.state(),
            reschedule: self.transport.is_playing() || self.tasks.has_pending(),
        }
    }

    fn drain_events(&mut self, now: Instant) {
        loop {
            let Some(event) = self.link.as_mut().and_then(|link| link.events.poll()) else {
                break;
            };
            match event {
                EngineEvent::PositionReport { sample_position } => {
                    let Some(seconds) = self
                        .timeline
                        .as_ref()
                        .map(|tl| tl.sample_to_seconds(sample_position))
                    else {
                        continue;
                    };
                    self.transport.anchor_position(seconds, now);
                }
                EngineEvent::SelectionEndReached => {
                    // The renderer stopped itself at the active end bound;
                    // park the indicator there rather than extrapolate past
                    // it. Paused, not stopped: the position stays meaningful.
                    let (_, end) = self.transport.active_bounds();
                    self.transport.anchor_position(end, now);
                    self.transport.set_state(PlayState::Paused);
                }
            }
        }
    }

    fn fire_due_tasks(&mut self, now: Instant) {
        for action in self.tasks.take_due(now) {
            match action {
                DeferredAction::StopConsuming => self.send(EngineCommand::Pause),
                DeferredAction::CompleteSeek {
                    target_seconds,
                    resume,
                } => self.complete_seek_at(target_seconds, resume, now),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::super::support::{dataset_100s, drain, harness};
    use super::*;
    use crate::config::PlayerConfig;
    use crate::engine::EngineLink;
    use crate::types::StereoBuffer;

    #[test]
    fn position_reports_re_anchor_the_indicator() {
        let (mut player, mut rx, mut events) = harness();
        let t0 = Instant::now();
        player.load_at(dataset_100s(), t0);
        player.resume_at(t0);
        let _ = drain(&mut rx);

        // Extrapolation alone would say 10 s; the renderer reports 5 s
        events
            .push(EngineEvent::PositionReport {
                sample_position: 2_205,
            })
            .unwrap();
        let t1 = t0 + Duration::from_millis(100);
        let snapshot = player.tick_at(t1);
        assert_eq!(snapshot.state, PlayState::Playing);
        assert!(snapshot.reschedule);
        assert!((snapshot.position_seconds - 5.0).abs() < 1e-9);

        // Extrapolation continues from the corrected anchor
        let pos = player.position_at(t1 + Duration::from_millis(10));
        assert!((pos - 6.0).abs() < 1e-6);
    }

    #[test]
    fn end_of_data_parks_paused_not_stopped() {
        let (mut player, mut rx, mut events) = harness();
        let t0 = Instant::now();
        player.load_at(dataset_100s(), t0);
        player.resume_at(t0);
        let _ = drain(&mut rx);

        events.push(EngineEvent::SelectionEndReached).unwrap();
        let snapshot = player.tick_at(t0 + Duration::from_millis(500));

        assert_eq!(snapshot.state, PlayState::Paused);
        assert!((snapshot.position_seconds - 100.0).abs() < 1e-9);
        assert!(!snapshot.reschedule, "nothing left for the loop to do");
        // Parking is UI-side only; the renderer already stopped itself
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn end_inside_a_selection_parks_at_the_selection_end() {
        let (mut player, mut rx, mut events) = harness();
        let t0 = Instant::now();
        player.load_at(dataset_100s(), t0);
        player.set_selection(10.0, 20.0);
        player.resume_at(t0);
        let _ = drain(&mut rx);

        events.push(EngineEvent::SelectionEndReached).unwrap();
        let snapshot = player.tick_at(t0 + Duration::from_secs(1));
        assert_eq!(snapshot.state, PlayState::Paused);
        assert!((snapshot.position_seconds - 20.0).abs() < 1e-9);

        // Resuming from the parked end restarts at the selection start
        player.toggle_play_pause_at(t0 + Duration::from_secs(2));
        let sent = drain(&mut rx);
        assert!(matches!(
            sent[0],
            EngineCommand::Seek {
                sample_position: 4_410,
                force_resume: true
            }
        ));
        assert_eq!(player.state(), PlayState::Playing);
    }

    #[test]
    fn resume_after_natural_end_restarts_from_zero() {
        let (mut player, mut rx, mut events) = harness();
        let t0 = Instant::now();
        player.load_at(dataset_100s(), t0);
        player.resume_at(t0);
        let _ = drain(&mut rx);

        events.push(EngineEvent::SelectionEndReached).unwrap();
        player.tick_at(t0 + Duration::from_secs(1));

        player.toggle_play_pause_at(t0 + Duration::from_secs(2));
        let sent = drain(&mut rx);
        assert!(matches!(
            sent[0],
            EngineCommand::Seek {
                sample_position: 0,
                force_resume: true
            }
        ));
        assert_eq!(player.state(), PlayState::Playing);
    }

    #[test]
    fn stale_report_cannot_overwrite_a_fired_seek() {
        let (mut player, mut rx, mut events) = harness();
        let t0 = Instant::now();
        player.load_at(dataset_100s(), t0);
        player.resume_at(t0);
        let _ = drain(&mut rx);

        let t1 = t0 + Duration::from_millis(100);
        player.seek_to_at(42.0, true, t1);
        let _ = drain(&mut rx);

        // A report the renderer queued before it saw the seek
        events
            .push(EngineEvent::PositionReport {
                sample_position: 2_205,
            })
            .unwrap();

        let snapshot = player.tick_at(t1 + Duration::from_millis(25));
        assert!(
            (snapshot.position_seconds - 42.0).abs() < 1e-9,
            "seek anchor must win over the stale report, got {}",
            snapshot.position_seconds
        );
        let sent = drain(&mut rx);
        assert!(matches!(
            sent[0],
            EngineCommand::Seek {
                sample_position: 18_522,
                force_resume: true
            }
        ));
    }

    #[test]
    fn indicator_loop_reschedules_only_while_work_is_pending() {
        let (mut player, mut rx, _events) = harness();
        let t0 = Instant::now();
        player.load_at(dataset_100s(), t0);
        let _ = drain(&mut rx);

        assert!(!player.tick_at(t0).reschedule);

        player.resume_at(t0);
        let _ = drain(&mut rx);
        assert!(player.tick_at(t0 + Duration::from_millis(5)).reschedule);

        // Paused with the stop still deferred: keep ticking
        player.pause_at(t0 + Duration::from_millis(10));
        let _ = drain(&mut rx);
        assert!(player.tick_at(t0 + Duration::from_millis(20)).reschedule);

        // Past the ramp window the stop fires and the loop can rest
        let snapshot = player.tick_at(t0 + Duration::from_millis(100));
        assert_eq!(snapshot.state, PlayState::Paused);
        assert!(!snapshot.reschedule);
        let sent = drain(&mut rx);
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0], EngineCommand::Pause));
    }

    #[test]
    fn tick_without_a_dataset_is_inert() {
        let (mut player, mut rx, _events) = harness();
        let _ = drain(&mut rx);

        let snapshot = player.tick_at(Instant::now());
        assert_eq!(snapshot.state, PlayState::Stopped);
        assert_eq!(snapshot.position_seconds, 0.0);
        assert!(!snapshot.reschedule);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn renderer_reports_flow_back_through_the_link() {
        let (link, mut renderer) = EngineLink::with_renderer(48_000);
        let mut player = Player::with_link(link, 48_000, PlayerConfig::default());
        let t0 = Instant::now();
        player.load_at(dataset_100s(), t0);
        player.seek_to_at(42.0, true, t0);

        // One hardware block applies the queued load and seek, then reports
        let mut block = StereoBuffer::silence(256);
        renderer.process(&mut block);

        let snapshot = player.tick_at(t0 + Duration::from_millis(1));
        assert_eq!(snapshot.state, PlayState::Playing);
        assert!((snapshot.position_seconds - 42.0).abs() < 1e-9);
        assert!(snapshot.reschedule);
    }
}
