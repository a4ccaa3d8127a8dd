//! Monitor records and the in-memory registry.
//!
//! A `Monitor` is created wholesale by discovery on every successful probe
//! and discarded wholesale on the next one; the only identity that survives
//! a refresh is the `device_path`, and callers re-resolve by it rather than
//! holding indices across a refresh. Brightness-valued fields are either in
//! `0..=100` or exactly the `-1` sentinel.

use serde::{Deserialize, Serialize};

use crate::constants::{BRIGHTNESS_UNKNOWN, LUX_UNKNOWN, OFFSET_RANGE};

/// Which brightness source drives a monitor, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoMode {
    #[default]
    Disabled,
    Schedule,
    Sensor,
    #[serde(rename = "follow")]
    FollowMain,
}

impl AutoMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutoMode::Disabled => "disabled",
            AutoMode::Schedule => "schedule",
            AutoMode::Sensor => "sensor",
            AutoMode::FollowMain => "follow",
        }
    }
}

/// One controllable monitor and its mutable control state.
#[derive(Debug, Clone)]
pub struct Monitor {
    /// Stable unique identifier, e.g. `/dev/i2c-4`.
    pub device_path: String,
    /// Human-readable name shown in logs, e.g. `DELL U2720Q (/dev/i2c-4)`.
    pub display_name: String,
    /// Wired to a built-in panel connector (eDP/LVDS/DSI).
    pub is_internal: bool,
    /// Cleared when a read or write fails; restored by the next probe.
    pub available: bool,
    /// Last brightness actually accepted by the hardware, or -1.
    pub current_brightness: i16,
    /// Pending transition target, or -1 when none.
    pub target_brightness: i16,
    /// Lux value the last applied sensor decision was based on, or -1.0.
    pub stable_lux: f64,
    pub auto_mode: AutoMode,
    brightness_offset: i32,
}

impl Monitor {
    pub fn new(device_path: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            device_path: device_path.into(),
            display_name: display_name.into(),
            is_internal: false,
            available: true,
            current_brightness: BRIGHTNESS_UNKNOWN,
            target_brightness: BRIGHTNESS_UNKNOWN,
            stable_lux: LUX_UNKNOWN,
            auto_mode: AutoMode::Disabled,
            brightness_offset: 0,
        }
    }

    /// Follow-mode offset, always within [-20, 20].
    pub fn brightness_offset(&self) -> i32 {
        self.brightness_offset
    }

    /// Set the follow-mode offset, clamping any input into range.
    pub fn set_brightness_offset(&mut self, offset: i32) {
        self.brightness_offset = offset.clamp(OFFSET_RANGE.0, OFFSET_RANGE.1);
    }

    /// Whether a transition toward a different value is pending.
    pub fn transition_pending(&self) -> bool {
        self.target_brightness != BRIGHTNESS_UNKNOWN
            && self.target_brightness != self.current_brightness
    }
}

/// Ordered collection of monitor records; the only cross-component mutable
/// state. Written exclusively by the control-loop thread.
#[derive(Debug, Default)]
pub struct MonitorRegistry {
    monitors: Vec<Monitor>,
}

impl MonitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole monitor set with a fresh probe result.
    ///
    /// Per-monitor settings do not survive here; the caller re-applies
    /// mode and offset from configuration by matching device paths.
    pub fn replace(&mut self, monitors: Vec<Monitor>) {
        self.monitors = monitors;
    }

    pub fn clear(&mut self) {
        self.monitors.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Monitor> {
        self.monitors.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Monitor> {
        self.monitors.iter_mut()
    }

    /// Re-resolve a monitor by its stable identifier. This is the lookup
    /// callers use after any refresh instead of retaining a handle.
    pub fn get(&self, device_path: &str) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.device_path == device_path)
    }

    pub fn get_mut(&mut self, device_path: &str) -> Option<&mut Monitor> {
        self.monitors
            .iter_mut()
            .find(|m| m.device_path == device_path)
    }

    /// Mark one monitor unavailable after a failed hardware call.
    pub fn mark_unavailable(&mut self, device_path: &str) {
        if let Some(monitor) = self.get_mut(device_path) {
            monitor.available = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_clamped_on_assignment() {
        let mut monitor = Monitor::new("/dev/i2c-4", "Test");
        monitor.set_brightness_offset(500);
        assert_eq!(monitor.brightness_offset(), 20);
        monitor.set_brightness_offset(-500);
        assert_eq!(monitor.brightness_offset(), -20);
        monitor.set_brightness_offset(7);
        assert_eq!(monitor.brightness_offset(), 7);
    }

    #[test]
    fn new_monitor_starts_unknown() {
        let monitor = Monitor::new("/dev/i2c-4", "Test");
        assert_eq!(monitor.current_brightness, -1);
        assert_eq!(monitor.target_brightness, -1);
        assert_eq!(monitor.stable_lux, -1.0);
        assert!(monitor.available);
        assert!(!monitor.transition_pending());
    }

    #[test]
    fn registry_lookup_by_device_path() {
        let mut registry = MonitorRegistry::new();
        registry.replace(vec![
            Monitor::new("/dev/i2c-4", "A"),
            Monitor::new("/dev/i2c-5", "B"),
        ]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("/dev/i2c-5").unwrap().display_name, "B");
        assert!(registry.get("/dev/i2c-6").is_none());

        registry.mark_unavailable("/dev/i2c-4");
        assert!(!registry.get("/dev/i2c-4").unwrap().available);
    }
}
