//! Follow-main source: mirror the companion backlight onto a monitor.
//!
//! Target = backlight percentage plus the monitor's own offset, clamped
//! into 0..=100. The offset lets a user keep an external panel a fixed
//! amount brighter or dimmer than the laptop screen.

use super::{BrightnessSource, Readings};
use crate::monitor::Monitor;

#[derive(Debug, Clone, Copy, Default)]
pub struct FollowSource;

impl BrightnessSource for FollowSource {
    fn compute_target(
        &self,
        monitor: &mut Monitor,
        _now_minutes: u16,
        readings: &Readings,
    ) -> Option<u8> {
        let percent = readings.backlight_percent?;
        let target = i32::from(percent) + monitor.brightness_offset();
        Some(target.clamp(0, 100) as u8)
    }
}
