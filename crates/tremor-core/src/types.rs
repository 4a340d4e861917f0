//! Shared audio types
//!
//! The stereo frame and block buffer that travel between the renderer
//! and the output backend, plus the transport play state.

use std::ops::Index;

/// Audio sample type (32-bit float for processing)
pub type Sample = f32;

/// One output frame, left and right
///
/// `#[repr(C)]` fixes the layout to `[left, right]`, so a run of frames
/// is byte-compatible with interleaved f32 and the output callback can
/// hand a whole block to the device without touching each frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StereoSample {
    pub left: Sample,
    pub right: Sample,
}

impl StereoSample {
    #[inline]
    pub fn new(left: Sample, right: Sample) -> Self {
        Self { left, right }
    }

    /// A silent frame
    #[inline]
    pub fn silence() -> Self {
        Self::default()
    }

    /// Same value on both channels
    ///
    /// Audified datasets are mono; this is how they reach the stereo bus.
    #[inline]
    pub fn mono(value: Sample) -> Self {
        Self { left: value, right: value }
    }

    /// Peak amplitude across the two channels
    #[inline]
    pub fn peak(&self) -> Sample {
        self.left.abs().max(self.right.abs())
    }
}

/// A block of stereo frames
///
/// Allocated once at startup; the callback adjusts the working length
/// per block with [`StereoBuffer::set_len_from_capacity`] so the render
/// path never allocates.
#[derive(Debug, Clone)]
pub struct StereoBuffer {
    samples: Vec<StereoSample>,
}

impl StereoBuffer {
    /// A buffer of `len` silent frames
    pub fn silence(len: usize) -> Self {
        Self {
            samples: vec![StereoSample::silence(); len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Change the working length without reallocating
    ///
    /// Newly exposed frames are silenced. Must stay within the capacity
    /// reserved at construction; debug builds assert this.
    #[inline]
    pub fn set_len_from_capacity(&mut self, new_len: usize) {
        if new_len > self.samples.len() {
            debug_assert!(
                new_len <= self.samples.capacity(),
                "set_len_from_capacity beyond reserved capacity"
            );
            self.samples.resize(new_len, StereoSample::silence());
        } else {
            self.samples.truncate(new_len);
        }
    }

    /// Overwrite every frame with silence
    pub fn fill_silence(&mut self) {
        self.samples.fill(StereoSample::silence());
    }

    #[inline]
    pub fn as_slice(&self) -> &[StereoSample] {
        &self.samples
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [StereoSample] {
        &mut self.samples
    }

    /// View the frames as interleaved f32 `[L, R, L, R, ..]`
    ///
    /// Zero-copy; this is the path a plain stereo device takes in the
    /// output callback.
    #[inline]
    pub fn as_interleaved(&self) -> &[Sample] {
        bytemuck::cast_slice(&self.samples)
    }

    /// Peak amplitude across the whole buffer
    pub fn peak(&self) -> Sample {
        self.samples.iter().map(|s| s.peak()).fold(0.0, Sample::max)
    }
}

impl Index<usize> for StereoBuffer {
    type Output = StereoSample;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.samples[index]
    }
}

/// Playback state of the transport
///
/// `Stopped` is the initial state and is re-entered only by an explicit
/// stop; running out of data parks the transport in `Paused`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlayState {
    /// Whether the transport is actively advancing
    #[inline]
    pub fn is_playing(&self) -> bool {
        matches!(self, PlayState::Playing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_fans_out_to_both_channels() {
        let frame = StereoSample::mono(0.3);
        assert_eq!(frame.left, 0.3);
        assert_eq!(frame.right, 0.3);
        assert_eq!(StereoSample::new(-0.8, 0.2).peak(), 0.8);
    }

    #[test]
    fn test_interleaved_view_matches_frame_layout() {
        let mut buffer = StereoBuffer::silence(3);
        buffer.as_mut_slice()[0] = StereoSample::new(1.0, 2.0);
        buffer.as_mut_slice()[2] = StereoSample::new(5.0, 6.0);

        assert_eq!(buffer.as_interleaved(), &[1.0, 2.0, 0.0, 0.0, 5.0, 6.0]);
        assert_eq!(buffer[2].right, 6.0);
    }

    #[test]
    fn test_set_len_from_capacity_keeps_the_allocation() {
        let mut buffer = StereoBuffer::silence(64);
        buffer.set_len_from_capacity(16);
        assert_eq!(buffer.len(), 16);
        buffer.set_len_from_capacity(64);
        assert_eq!(buffer.len(), 64);
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn test_play_state_default() {
        assert_eq!(PlayState::default(), PlayState::Stopped);
        assert!(!PlayState::Paused.is_playing());
        assert!(PlayState::Playing.is_playing());
    }
}
