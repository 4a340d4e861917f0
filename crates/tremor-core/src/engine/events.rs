//! Lifecycle events from the renderer back to the transport
//!
//! Continuous facts (cursor position, consuming flag) are published as
//! relaxed atomics and can be read at any rate. The ring here carries the
//! edge-triggered facts a poll can miss: a seek landed, the selection end
//! was crossed. Pushing never blocks; when the ring is full the event is
//! dropped, because the atomics stay authoritative for continuous state.

/// Capacity of the renderer → UI event ring
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Facts the renderer reports between blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// The cursor is at this dataset sample; re-anchors the transport.
    /// Emitted after an applied seek, after a loop wrap, and periodically
    /// while consuming.
    PositionReport { sample_position: u64 },
    /// The end bound was crossed with looping off; the renderer stopped
    /// consuming on its own
    SelectionEndReached,
}

/// Create the event ring
///
/// Returns the renderer-side producer and the UI-side receiver.
pub fn event_channel() -> (rtrb::Producer<EngineEvent>, EventReceiver) {
    let (producer, consumer) = rtrb::RingBuffer::new(EVENT_QUEUE_CAPACITY);
    (producer, EventReceiver { consumer })
}

/// Event receiver for the UI thread
pub struct EventReceiver {
    consumer: rtrb::Consumer<EngineEvent>,
}

impl EventReceiver {
    /// Take the next pending event, if any
    pub fn poll(&mut self) -> Option<EngineEvent> {
        self.consumer.pop().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_round_trip() {
        let (mut tx, mut rx) = event_channel();
        tx.push(EngineEvent::PositionReport { sample_position: 99 }).unwrap();
        tx.push(EngineEvent::SelectionEndReached).unwrap();

        assert_eq!(rx.poll(), Some(EngineEvent::PositionReport { sample_position: 99 }));
        assert_eq!(rx.poll(), Some(EngineEvent::SelectionEndReached));
        assert_eq!(rx.poll(), None);
    }
}
