//! Deferred transport actions
//!
//! Pause, stop, and crossfade seeks finish after a gain-ramp window has
//! run. Every scheduled action carries the queue's generation counter at
//! schedule time; transport-flow commands bump the generation, so an
//! action superseded mid-flight is discarded when it comes due instead
//! of firing against state it no longer matches.

use std::time::Instant;

/// An action deferred past a gain-ramp window
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeferredAction {
    /// Tell the renderer to stop consuming once the down-ramp has run
    StopConsuming,
    /// Finish a crossfade seek: re-clamp the target and jump
    CompleteSeek { target_seconds: f64, resume: bool },
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTask {
    due: Instant,
    generation: u64,
    action: DeferredAction,
}

/// Single-shot action queue with generation invalidation
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: Vec<ScheduledTask>,
    generation: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an action to fire at `due`
    pub fn schedule(&mut self, action: DeferredAction, due: Instant) {
        self.tasks.push(ScheduledTask {
            due,
            generation: self.generation,
            action,
        });
    }

    /// Invalidate every currently pending action
    ///
    /// Entries stay queued but their generation no longer matches; they
    /// are swept out on the next `take_due`.
    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Whether any still-valid action is pending
    pub fn has_pending(&self) -> bool {
        self.tasks
            .iter()
            .any(|task| task.generation == self.generation)
    }

    /// When the next valid action comes due, if any
    pub fn next_due(&self) -> Option<Instant> {
        self.tasks
            .iter()
            .filter(|task| task.generation == self.generation)
            .map(|task| task.due)
            .min()
    }

    /// Remove and return every action due by `now`, in schedule order
    ///
    /// Stale entries from older generations are dropped along the way.
    pub fn take_due(&mut self, now: Instant) -> Vec<DeferredAction> {
        let generation = self.generation;
        let mut due = Vec::new();
        self.tasks.retain(|task| {
            if task.generation != generation {
                return false;
            }
            if task.due <= now {
                due.push(task.action);
                return false;
            }
            true
        });
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn fires_once_when_due() {
        let t0 = Instant::now();
        let mut queue = TaskQueue::new();
        queue.schedule(DeferredAction::StopConsuming, t0 + Duration::from_millis(50));

        assert!(queue.take_due(t0).is_empty());
        assert!(queue.has_pending());

        let fired = queue.take_due(t0 + Duration::from_millis(50));
        assert_eq!(fired, vec![DeferredAction::StopConsuming]);
        assert!(!queue.has_pending());
        assert!(queue.take_due(t0 + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn invalidation_discards_pending_actions() {
        let t0 = Instant::now();
        let mut queue = TaskQueue::new();
        queue.schedule(DeferredAction::StopConsuming, t0 + Duration::from_millis(50));
        queue.invalidate();

        assert!(!queue.has_pending());
        assert_eq!(queue.next_due(), None);
        assert!(queue.take_due(t0 + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn actions_scheduled_after_invalidation_still_fire() {
        let t0 = Instant::now();
        let mut queue = TaskQueue::new();
        queue.schedule(DeferredAction::StopConsuming, t0 + Duration::from_millis(20));
        queue.invalidate();
        let replacement = DeferredAction::CompleteSeek {
            target_seconds: 12.0,
            resume: true,
        };
        queue.schedule(replacement, t0 + Duration::from_millis(20));

        let fired = queue.take_due(t0 + Duration::from_millis(25));
        assert_eq!(fired, vec![replacement]);
    }

    #[test]
    fn due_actions_fire_in_schedule_order() {
        let t0 = Instant::now();
        let mut queue = TaskQueue::new();
        let first = DeferredAction::CompleteSeek {
            target_seconds: 1.0,
            resume: false,
        };
        queue.schedule(first, t0 + Duration::from_millis(30));
        queue.schedule(DeferredAction::StopConsuming, t0 + Duration::from_millis(10));

        // Both due; the earlier-scheduled one still comes out first.
        let fired = queue.take_due(t0 + Duration::from_millis(40));
        assert_eq!(fired, vec![first, DeferredAction::StopConsuming]);
    }

    #[test]
    fn next_due_reports_the_earliest_valid_entry() {
        let t0 = Instant::now();
        let mut queue = TaskQueue::new();
        queue.schedule(DeferredAction::StopConsuming, t0 + Duration::from_millis(80));
        queue.schedule(
            DeferredAction::CompleteSeek {
                target_seconds: 3.0,
                resume: false,
            },
            t0 + Duration::from_millis(20),
        );
        assert_eq!(queue.next_due(), Some(t0 + Duration::from_millis(20)));
    }
}
