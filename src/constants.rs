//! Central timing, retry, and default-value constants.

use std::time::Duration;

/// Cadence of the mode dispatcher (slow tick): how often every monitor's
/// active brightness source is re-evaluated.
pub const DISPATCH_INTERVAL: Duration = Duration::from_secs(60);

/// Cadence of the transition engine (fast tick): one ±1% brightness step
/// per tick toward each monitor's target.
pub const TRANSITION_INTERVAL: Duration = Duration::from_millis(500);

/// Detection retry schedule. Each entry is the delay from the *previous*
/// failed attempt, so from a failed startup probe the retries land at
/// +30s, +90s, and +180s. After the last one fails the controller stops
/// scheduling automatic re-probes.
pub const DETECTION_RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(30),
    Duration::from_secs(60),
    Duration::from_secs(90),
];

/// Debounce before re-probing after a hotplug add event.
pub const HOTPLUG_ADD_DEBOUNCE: Duration = Duration::from_secs(2);

/// Debounce before re-probing after a hotplug remove event.
pub const HOTPLUG_REMOVE_DEBOUNCE: Duration = Duration::from_secs(1);

/// Default lux dead zone for sensor mode. Readings within this distance of
/// the last applied decision's lux propose no change.
pub const DEFAULT_HYSTERESIS_LUX: f64 = 5.0;

/// Valid range for the sensor hysteresis setting.
pub const HYSTERESIS_RANGE: (f64, f64) = (0.0, 100.0);

/// Follow-mode brightness offset is clamped into this range.
pub const OFFSET_RANGE: (i32, i32) = (-20, 20);

/// Default lux -> brightness calibration curve used when the configuration
/// holds fewer than two valid points.
pub const DEFAULT_CURVE: [(f64, u8); 5] =
    [(0.0, 20), (50.0, 40), (200.0, 70), (500.0, 90), (1000.0, 100)];

/// Sentinel for "unknown brightness" / "no pending transition".
pub const BRIGHTNESS_UNKNOWN: i16 = -1;

/// Sentinel for "no lux decision applied yet".
pub const LUX_UNKNOWN: f64 = -1.0;

/// VCP feature code for monitor luminance, passed to ddccontrol.
pub const VCP_BRIGHTNESS: &str = "0x10";
