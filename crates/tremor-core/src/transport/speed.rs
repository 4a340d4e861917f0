//! Playback speed curve
//!
//! The speed slider runs 0..=100 with 1.0x pinned to the midpoint. Both
//! halves are logarithmic so equal slider travel feels like equal rate
//! change: the lower half sweeps 0.1x..1.0x, the upper half 1.0x..15x.

/// Upper bound of the speed control range
pub const SPEED_CONTROL_MAX: f64 = 100.0;

/// Control value that maps to exactly 1.0x
pub const SPEED_CONTROL_MIDPOINT: f64 = 50.0;

/// Slowest audification rate (control 0)
pub const MIN_SPEED: f64 = 0.1;

/// Fastest audification rate (control 100)
pub const MAX_SPEED: f64 = 15.0;

/// Map a speed control value to the displayed base rate multiplier
///
/// Lower segment: `0.1 * 10^(control / 50)`. Upper segment:
/// `15^((control - 50) / 50)`. The midpoint lands in the upper segment
/// where `15^0` is exactly 1.0. Out-of-range and non-finite controls
/// clamp rather than error.
pub fn base_speed(control: f64) -> f64 {
    let control = if control.is_finite() {
        control.clamp(0.0, SPEED_CONTROL_MAX)
    } else {
        log::debug!("base_speed: non-finite control {control}, using midpoint");
        SPEED_CONTROL_MIDPOINT
    };
    if control < SPEED_CONTROL_MIDPOINT {
        MIN_SPEED * 10f64.powf(control / SPEED_CONTROL_MIDPOINT)
    } else {
        MAX_SPEED.powf((control - SPEED_CONTROL_MIDPOINT) / (SPEED_CONTROL_MAX - SPEED_CONTROL_MIDPOINT))
    }
}

/// Convert a displayed base rate into the value the renderer consumes
///
/// The renderer advances `speed` dataset samples per output frame, so the
/// base rate is scaled by the operator's nominal rate over the actual
/// hardware rate. Display 1.0x at 44.1k nominal on a 48k device is
/// 0.91875 dataset samples per frame.
pub fn engine_speed(base: f64, nominal_rate: u32, hardware_rate: u32) -> f64 {
    if hardware_rate == 0 {
        log::warn!("engine_speed: hardware rate is 0, passing base rate through");
        return base;
    }
    base * nominal_rate as f64 / hardware_rate as f64
}
