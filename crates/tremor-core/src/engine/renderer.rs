//! The autonomous sample consumer
//!
//! Runs on the audio callback thread and owns the dataset exclusively.
//! Commands are drained at the start of every block; production then
//! walks a fractional cursor through the dataset at the commanded speed,
//! linearly interpolating between neighbors, applying the gain envelope,
//! and duplicating the mono value onto the stereo bus.
//!
//! Continuous facts go out through relaxed atomics every block; the
//! edge-triggered facts (seek landed, end bound crossed, loop wrapped)
//! go out as events. Nothing here allocates or frees: datasets arrive as
//! `basedrop::Shared` and their drops are deferred to the GC thread.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use basedrop::Shared;

use crate::dataset::DatasetBuffer;
use crate::engine::command::{command_channel, CommandSender, EngineCommand};
use crate::engine::events::{event_channel, EngineEvent, EventReceiver};
use crate::engine::gain::GainStage;
use crate::types::{StereoBuffer, StereoSample};

/// Output frames between periodic position reports (~85 ms at 48 kHz)
pub const POSITION_REPORT_INTERVAL: u64 = 4096;

/// Lock-free facts the UI may read at any rate
pub struct RendererAtomics {
    /// Current cursor position in dataset samples (fraction truncated)
    pub position: AtomicU64,
    /// Whether the renderer is consuming samples
    pub consuming: AtomicBool,
    /// Total samples in the loaded dataset (0 when none)
    pub total_samples: AtomicU64,
}

impl RendererAtomics {
    pub fn new() -> Self {
        Self {
            position: AtomicU64::new(0),
            consuming: AtomicBool::new(false),
            total_samples: AtomicU64::new(0),
        }
    }

    /// Get the current cursor position
    #[inline]
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    /// Check if the renderer is consuming
    #[inline]
    pub fn is_consuming(&self) -> bool {
        self.consuming.load(Ordering::Relaxed)
    }

    /// Get the loaded dataset length
    #[inline]
    pub fn total_samples(&self) -> u64 {
        self.total_samples.load(Ordering::Relaxed)
    }
}

impl Default for RendererAtomics {
    fn default() -> Self {
        Self::new()
    }
}

/// UI-side bundle for driving one renderer
pub struct EngineLink {
    pub commands: CommandSender,
    pub events: EventReceiver,
    pub atomics: Arc<RendererAtomics>,
}

impl EngineLink {
    /// Build a renderer and the link that drives it
    pub fn with_renderer(sample_rate: u32) -> (Self, Renderer) {
        let (commands, command_rx) = command_channel();
        let (event_tx, events) = event_channel();
        let atomics = Arc::new(RendererAtomics::new());
        let renderer = Renderer::new(command_rx, event_tx, Arc::clone(&atomics), sample_rate);
        let link = Self {
            commands,
            events,
            atomics,
        };
        (link, renderer)
    }
}

/// Audio-thread playback state machine
///
/// Owns all playback data exclusively; the UI reaches it only through
/// the command ring.
pub struct Renderer {
    /// Command receiver from the UI
    command_rx: rtrb::Consumer<EngineCommand>,
    /// Event producer back to the UI (full ring drops the event)
    events: rtrb::Producer<EngineEvent>,
    /// Facts for the UI to read between events
    atomics: Arc<RendererAtomics>,
    /// Hardware output rate, fixed at stream build time
    sample_rate: u32,
    /// Current dataset (owned by the audio thread)
    dataset: Option<Shared<DatasetBuffer>>,
    /// Fractional cursor in dataset samples
    cursor: f64,
    /// Whether samples are being consumed
    consuming: bool,
    /// Dataset samples consumed per output frame
    speed: f64,
    /// Selection bounds in playback-domain seconds, as last commanded
    selection: Option<(f64, f64)>,
    loop_enabled: bool,
    gain: GainStage,
    frames_since_report: u64,
}

impl Renderer {
    pub fn new(
        command_rx: rtrb::Consumer<EngineCommand>,
        events: rtrb::Producer<EngineEvent>,
        atomics: Arc<RendererAtomics>,
        sample_rate: u32,
    ) -> Self {
        Self {
            command_rx,
            events,
            atomics,
            sample_rate,
            dataset: None,
            cursor: 0.0,
            consuming: false,
            speed: 1.0,
            selection: None,
            loop_enabled: false,
            gain: GainStage::new(1.0),
            frames_since_report: 0,
        }
    }

    /// Process pending commands from the UI
    ///
    /// Runs at block boundaries only, so every command applies between
    /// blocks, never inside one.
    fn process_commands(&mut self) {
        while let Ok(cmd) = self.command_rx.pop() {
            match cmd {
                EngineCommand::Pause => {
                    self.consuming = false;
                }
                EngineCommand::Resume => {
                    if self.dataset.is_some() {
                        self.consuming = true;
                    }
                }
                EngineCommand::Seek {
                    sample_position,
                    force_resume,
                } => {
                    let limit = self.dataset_len();
                    self.cursor = sample_position.min(limit) as f64;
                    if force_resume && self.dataset.is_some() {
                        self.consuming = true;
                    }
                    self.frames_since_report = 0;
                    let _ = self.events.push(EngineEvent::PositionReport {
                        sample_position: self.cursor as u64,
                    });
                }
                EngineCommand::SetSpeed { speed } => {
                    if speed.is_finite() && speed >= 0.0 {
                        self.speed = speed;
                    }
                }
                EngineCommand::SetSelection {
                    start,
                    end,
                    loop_enabled,
                } => {
                    self.selection = match (start, end) {
                        (Some(start), Some(end)) => Some((start, end)),
                        _ => None,
                    };
                    self.loop_enabled = loop_enabled;
                }
                EngineCommand::RampGain {
                    target,
                    millis,
                    curve,
                } => {
                    let frames =
                        (millis.max(0.0) as f64 * self.sample_rate as f64 / 1000.0).round() as u64;
                    self.gain.begin_ramp(target, frames, curve);
                }
                EngineCommand::LoadDataset(dataset) => {
                    self.atomics
                        .total_samples
                        .store(dataset.len() as u64, Ordering::Relaxed);
                    self.dataset = Some(*dataset);
                    self.reset_cursor();
                }
                EngineCommand::Unload => {
                    // Shared drop defers the free to the GC thread
                    self.dataset = None;
                    self.atomics.total_samples.store(0, Ordering::Relaxed);
                    self.reset_cursor();
                }
            }
        }
    }

    fn reset_cursor(&mut self) {
        self.cursor = 0.0;
        self.consuming = false;
        self.selection = None;
        self.loop_enabled = false;
        self.frames_since_report = 0;
        self.atomics.position.store(0, Ordering::Relaxed);
        self.atomics.consuming.store(false, Ordering::Relaxed);
    }

    fn dataset_len(&self) -> u64 {
        self.dataset.as_ref().map(|d| d.len() as u64).unwrap_or(0)
    }

    /// Render one block into a pre-sized output buffer
    pub fn process(&mut self, output: &mut StereoBuffer) {
        self.process_commands();

        let frames = output.len();
        let Some(dataset) = self.dataset.as_ref() else {
            output.fill_silence();
            self.gain.advance(frames as u64);
            self.publish();
            return;
        };
        if !self.consuming {
            output.fill_silence();
            self.gain.advance(frames as u64);
            self.publish();
            return;
        }

        // Active bounds: the selection when set, else the whole dataset.
        let total = dataset.len() as f64;
        let rate = dataset.samples_per_second;
        let (start_bound, end_bound) = match self.selection {
            Some((start, end)) if rate > 0.0 => {
                let a = (start * rate).clamp(0.0, total);
                let b = (end * rate).clamp(0.0, total);
                (a.min(b), a.max(b))
            }
            _ => (0.0, total),
        };

        let out = output.as_mut_slice();
        let mut produced = 0;
        while produced < frames {
            let gain = self.gain.next();
            out[produced] = StereoSample::mono(sample_at(dataset, self.cursor) * gain);
            self.cursor += self.speed;
            produced += 1;

            if self.cursor >= end_bound {
                if self.loop_enabled && end_bound > start_bound {
                    self.cursor = start_bound;
                    self.frames_since_report = 0;
                    let _ = self.events.push(EngineEvent::PositionReport {
                        sample_position: start_bound as u64,
                    });
                } else {
                    self.consuming = false;
                    self.cursor = end_bound;
                    let _ = self.events.push(EngineEvent::SelectionEndReached);
                    break;
                }
            }
        }

        // Silence the tail if the end bound stopped production early
        if produced < frames {
            for frame in &mut out[produced..] {
                *frame = StereoSample::silence();
            }
            self.gain.advance((frames - produced) as u64);
        }

        if self.consuming {
            self.frames_since_report += frames as u64;
            if self.frames_since_report >= POSITION_REPORT_INTERVAL {
                self.frames_since_report = 0;
                let _ = self.events.push(EngineEvent::PositionReport {
                    sample_position: self.cursor as u64,
                });
            }
        }

        self.publish();
    }

    fn publish(&self) {
        self.atomics
            .position
            .store(self.cursor as u64, Ordering::Relaxed);
        self.atomics
            .consuming
            .store(self.consuming, Ordering::Relaxed);
    }
}

/// Linear interpolation between adjacent dataset samples
#[inline]
fn sample_at(dataset: &DatasetBuffer, cursor: f64) -> f32 {
    let samples = dataset.samples.as_slice();
    if samples.is_empty() {
        return 0.0;
    }
    if cursor <= 0.0 {
        return samples[0];
    }
    let last = samples.len() - 1;
    let index = cursor as usize;
    if index >= last {
        return samples[last];
    }
    let frac = (cursor - index as f64) as f32;
    samples[index] + (samples[index + 1] - samples[index]) * frac
}
