//! Command protocol between the UI thread and the renderer
//!
//! Commands travel over a lock-free SPSC ring (`rtrb`) and are drained by
//! the renderer at the start of every audio block, so a command never
//! lands mid-block. Gain ramps ride the same ring as transport commands:
//! the fixed ordering a glitch-free transition needs (ramp down, update,
//! command, ramp up) is then a property of the FIFO itself rather than a
//! calling convention every call site must remember.

use basedrop::Shared;

use crate::dataset::DatasetBuffer;

/// Capacity of the UI → renderer command ring
///
/// Transport gestures are low-rate; 64 slots is deep enough that only a
/// wedged audio thread can fill it.
pub const COMMAND_QUEUE_CAPACITY: usize = 64;

/// Shape of a scheduled gain ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampCurve {
    /// Constant slope; used for seek crossfades and volume moves
    Linear,
    /// Equal ratio per frame toward the gain floor; used for pause/resume
    Exponential,
}

/// Commands the renderer applies between blocks
///
/// The dataset payload is boxed, keeping the enum small for
/// cache-efficient lock-free queueing.
pub enum EngineCommand {
    /// Stop consuming samples after the current block
    Pause,
    /// Resume consuming samples
    Resume,
    /// Jump the cursor to an absolute dataset sample; `force_resume`
    /// starts production even from rest
    Seek {
        sample_position: u64,
        force_resume: bool,
    },
    /// Dataset samples consumed per output frame (base rate already folded
    /// through the nominal/hardware multiplier)
    SetSpeed { speed: f64 },
    /// Selection bounds in playback-domain seconds plus the loop flag.
    /// One message, so bounds and flag can never be observed half-updated.
    SetSelection {
        start: Option<f64>,
        end: Option<f64>,
        loop_enabled: bool,
    },
    /// Schedule a gain ramp on the renderer's sample clock
    RampGain {
        target: f32,
        millis: f32,
        curve: RampCurve,
    },
    /// Hand a decoded dataset to the audio thread
    LoadDataset(Box<Shared<DatasetBuffer>>),
    /// Drop the current dataset (freed on the collector thread)
    Unload,
}

/// Create the command ring
///
/// Returns the UI-side sender and the renderer-side consumer.
pub fn command_channel() -> (CommandSender, rtrb::Consumer<EngineCommand>) {
    let (producer, consumer) = rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY);
    (CommandSender { producer }, consumer)
}

/// Command sender for the UI thread
pub struct CommandSender {
    producer: rtrb::Producer<EngineCommand>,
}

impl CommandSender {
    /// Send a command to the renderer
    ///
    /// Returns Err with the command if the queue is full (command dropped)
    pub fn send(&mut self, cmd: EngineCommand) -> Result<(), EngineCommand> {
        self.producer.push(cmd).map_err(|e| match e {
            rtrb::PushError::Full(value) => value,
        })
    }

    /// Check if there's space in the queue
    pub fn has_space(&self) -> bool {
        self.producer.slots() > 0
    }
}
