//! Tremor Core - playback engine for audified seismic time-series

pub mod audio;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod player;
pub mod timeline;
pub mod transport;
pub mod types;

pub use types::*;
