//! Audio engine: the command/event link, gain envelope, GC, and the
//! autonomous renderer the output callback drives

pub mod command;
pub mod events;
pub mod gain;
pub mod gc;
pub mod renderer;

pub use command::{command_channel, CommandSender, EngineCommand, RampCurve, COMMAND_QUEUE_CAPACITY};
pub use events::{event_channel, EngineEvent, EventReceiver, EVENT_QUEUE_CAPACITY};
pub use gain::{GainStage, MIN_GAIN};
pub use gc::gc_handle;
pub use renderer::{EngineLink, Renderer, RendererAtomics, POSITION_REPORT_INTERVAL};
