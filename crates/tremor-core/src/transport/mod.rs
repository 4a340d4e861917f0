//! Playback transport: play state, anchored position, and the speed curve

mod speed;
mod state;

pub use speed::{base_speed, engine_speed, MAX_SPEED, MIN_SPEED, SPEED_CONTROL_MAX, SPEED_CONTROL_MIDPOINT};
pub use state::{Selection, Transport, NEAR_END_EPSILON};
