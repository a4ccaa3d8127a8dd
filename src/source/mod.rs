//! Brightness sources: the algorithms that decide what a monitor's
//! brightness should be.
//!
//! Each source implements [`BrightnessSource::compute_target`], a pure
//! decision over the monitor's state, the current minute of day, and one
//! set of external readings. Sources never touch hardware; the dispatcher
//! stores their answer as the monitor's transition target and the
//! transition engine walks the hardware there. Adding a fourth source is
//! one new variant implementing the trait, not an edit at every call site.

pub mod follow;
pub mod schedule;
pub mod sensor;

pub use follow::FollowSource;
pub use schedule::{ScheduleEntry, ScheduleSource};
pub use sensor::{CurvePoint, SensorSource};

use crate::monitor::Monitor;

/// External readings gathered once per evaluation cycle and shared by all
/// monitors in that cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Readings {
    /// Ambient illuminance in lux, when a sensor is present and readable.
    pub lux: Option<f64>,
    /// Companion backlight level as a percentage, when readable.
    pub backlight_percent: Option<u8>,
}

/// A strategy computing the desired brightness for one monitor.
pub trait BrightnessSource {
    /// Compute the desired brightness, or `None` when this source proposes
    /// no change this cycle (missing reading, inside a dead zone, empty
    /// schedule). The previous target stays in place on `None`.
    fn compute_target(
        &self,
        monitor: &mut Monitor,
        now_minutes: u16,
        readings: &Readings,
    ) -> Option<u8>;
}

/// Linear interpolation between `(x0, y0)` and `(x1, y1)`, truncated to an
/// integer. Inputs outside the segment clamp to the nearer endpoint.
pub(crate) fn interpolate(x: f64, x0: f64, x1: f64, y0: u8, y1: u8) -> u8 {
    if x <= x0 {
        return y0;
    }
    if x >= x1 {
        return y1;
    }
    let ratio = (x - x0) / (x1 - x0);
    (f64::from(y0) + ratio * (f64::from(y1) - f64::from(y0))) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolate_truncates_toward_zero() {
        // 20 + (1/3) * 10 = 23.33 -> 23
        assert_eq!(interpolate(1.0, 0.0, 3.0, 20, 30), 23);
    }

    #[test]
    fn interpolate_clamps_outside_segment() {
        assert_eq!(interpolate(-5.0, 0.0, 10.0, 20, 30), 20);
        assert_eq!(interpolate(15.0, 0.0, 10.0, 20, 30), 30);
    }

    #[test]
    fn interpolate_handles_descending_values() {
        assert_eq!(interpolate(5.0, 0.0, 10.0, 90, 50), 70);
    }
}
