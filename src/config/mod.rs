//! Configuration for ddcbright: TOML model, per-field fallback, save-back.
//!
//! All settings live in `ddcbright.toml`:
//!
//! ```toml
//! hysteresis = 5.0            # lux dead zone for sensor mode (0-100)
//! start_minimized = false     # UI collaborators read these two toggles
//! show_brightness_in_tray = false
//!
//! [monitors."/dev/i2c-4"]
//! mode = "schedule"           # "disabled" | "schedule" | "sensor" | "follow"
//! offset = 0                  # follow-mode offset, clamped to [-20, 20]
//!
//! [schedule]                  # "HH:MM" = brightness
//! "09:00" = 70
//! "19:00" = 50
//!
//! [[curve]]                   # lux -> brightness calibration, >= 2 points
//! lux = 0.0
//! brightness = 20
//! ```
//!
//! Loading is never fatal: a malformed value falls back to the documented
//! default for that field alone, with a logged warning. Unknown monitor
//! modes become `disabled`, out-of-range offsets clamp, bad schedule
//! entries are skipped, and a curve with fewer than two valid points is
//! replaced by the default five-point curve.

pub mod loading;
#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_HYSTERESIS_LUX, HYSTERESIS_RANGE, OFFSET_RANGE};
use crate::monitor::AutoMode;
use crate::source::{CurvePoint, ScheduleEntry, ScheduleSource, SensorSource};

pub use loading::{config_path, load, load_from_path, save_to_path, set_config_dir};

/// Per-monitor persisted settings, keyed by device path.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonitorSettings {
    pub mode: AutoMode,
    pub offset: i32,
}

/// Sanitized application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub hysteresis: f64,
    pub start_minimized: bool,
    pub show_brightness_in_tray: bool,
    pub monitors: BTreeMap<String, MonitorSettings>,
    pub schedule: Vec<ScheduleEntry>,
    pub curve: Vec<CurvePoint>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hysteresis: DEFAULT_HYSTERESIS_LUX,
            start_minimized: false,
            show_brightness_in_tray: false,
            monitors: BTreeMap::new(),
            schedule: Vec::new(),
            curve: Vec::new(),
        }
    }
}

impl Config {
    /// Load from the default location, creating a default file if missing.
    pub fn load() -> anyhow::Result<Self> {
        load()
    }

    /// Settings for one monitor, defaulting to disabled/0 when unknown.
    pub fn monitor_settings(&self, device_path: &str) -> MonitorSettings {
        self.monitors.get(device_path).copied().unwrap_or_default()
    }

    pub fn set_monitor_mode(&mut self, device_path: &str, mode: AutoMode) {
        self.monitors.entry(device_path.to_string()).or_default().mode = mode;
    }

    pub fn set_monitor_offset(&mut self, device_path: &str, offset: i32) {
        self.monitors.entry(device_path.to_string()).or_default().offset =
            offset.clamp(OFFSET_RANGE.0, OFFSET_RANGE.1);
    }

    /// Build the schedule source from the stored entries.
    pub fn schedule_source(&self) -> ScheduleSource {
        ScheduleSource::new(self.schedule.clone())
    }

    /// Build the sensor source from the stored curve and hysteresis.
    pub fn sensor_source(&self) -> SensorSource {
        SensorSource::new(self.curve.clone(), self.hysteresis)
    }

    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");
        log_indented!("hysteresis: {} lux", self.hysteresis);
        log_indented!("schedule entries: {}", self.schedule.len());
        log_indented!(
            "curve points: {}",
            if self.curve.is_empty() {
                "default".to_string()
            } else {
                self.curve.len().to_string()
            }
        );
        for (device_path, settings) in &self.monitors {
            log_indented!(
                "{device_path}: mode {}, offset {}",
                settings.mode.as_str(),
                settings.offset
            );
        }
    }
}

/// Raw TOML shape before per-field sanitizing. Every field optional so a
/// partially corrupt file still yields everything that did parse.
#[derive(Debug, Default, Deserialize, Serialize)]
pub(crate) struct ConfigFile {
    hysteresis: Option<f64>,
    start_minimized: Option<bool>,
    show_brightness_in_tray: Option<bool>,
    monitors: Option<BTreeMap<String, MonitorSettingsFile>>,
    schedule: Option<BTreeMap<String, i64>>,
    curve: Option<Vec<CurvePointFile>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub(crate) struct MonitorSettingsFile {
    mode: Option<String>,
    offset: Option<i64>,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct CurvePointFile {
    lux: f64,
    brightness: i64,
}

impl ConfigFile {
    /// Sanitize into a `Config`, substituting per-field defaults.
    pub(crate) fn sanitize(self) -> Config {
        let hysteresis = match self.hysteresis {
            Some(h) if (HYSTERESIS_RANGE.0..=HYSTERESIS_RANGE.1).contains(&h) => h,
            Some(h) => {
                log_pipe!();
                log_warning!(
                    "hysteresis {h} outside {}..={}, using {DEFAULT_HYSTERESIS_LUX}",
                    HYSTERESIS_RANGE.0,
                    HYSTERESIS_RANGE.1
                );
                DEFAULT_HYSTERESIS_LUX
            }
            None => DEFAULT_HYSTERESIS_LUX,
        };

        let monitors = self
            .monitors
            .unwrap_or_default()
            .into_iter()
            .map(|(device_path, raw)| {
                let mode = match raw.mode.as_deref() {
                    None | Some("disabled") => AutoMode::Disabled,
                    Some("schedule") => AutoMode::Schedule,
                    Some("sensor") => AutoMode::Sensor,
                    Some("follow") => AutoMode::FollowMain,
                    Some(other) => {
                        log_pipe!();
                        log_warning!("Unknown mode {other:?} for {device_path}, using disabled");
                        AutoMode::Disabled
                    }
                };
                let offset = raw
                    .offset
                    .unwrap_or(0)
                    .clamp(i64::from(OFFSET_RANGE.0), i64::from(OFFSET_RANGE.1))
                    as i32;
                (device_path, MonitorSettings { mode, offset })
            })
            .collect();

        let mut schedule: Vec<ScheduleEntry> = self
            .schedule
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(key, brightness)| {
                let Some(minute_of_day) = parse_schedule_key(&key) else {
                    log_pipe!();
                    log_warning!("Skipping schedule entry {key:?}: expected HH:MM");
                    return None;
                };
                if !(0..=100).contains(&brightness) {
                    log_pipe!();
                    log_warning!("Skipping schedule entry {key:?}: brightness {brightness} out of range");
                    return None;
                }
                Some(ScheduleEntry {
                    minute_of_day,
                    brightness: brightness as u8,
                })
            })
            .collect();
        schedule.sort_by_key(|e| e.minute_of_day);

        let curve: Vec<CurvePoint> = self
            .curve
            .unwrap_or_default()
            .into_iter()
            .filter_map(|point| {
                if point.lux < 0.0 || !(0..=100).contains(&point.brightness) {
                    log_pipe!();
                    log_warning!(
                        "Skipping curve point ({}, {}): out of range",
                        point.lux,
                        point.brightness
                    );
                    return None;
                }
                Some(CurvePoint {
                    lux: point.lux,
                    brightness: point.brightness as u8,
                })
            })
            .collect();
        let curve = if curve.len() >= 2 {
            curve
        } else {
            if !curve.is_empty() {
                log_pipe!();
                log_warning!("Curve needs at least 2 points, using the default curve");
            }
            Vec::new()
        };

        Config {
            hysteresis,
            start_minimized: self.start_minimized.unwrap_or(false),
            show_brightness_in_tray: self.show_brightness_in_tray.unwrap_or(false),
            monitors,
            schedule,
            curve,
        }
    }

    pub(crate) fn from_config(config: &Config) -> Self {
        Self {
            hysteresis: Some(config.hysteresis),
            start_minimized: Some(config.start_minimized),
            show_brightness_in_tray: Some(config.show_brightness_in_tray),
            monitors: Some(
                config
                    .monitors
                    .iter()
                    .map(|(device_path, settings)| {
                        (
                            device_path.clone(),
                            MonitorSettingsFile {
                                mode: Some(settings.mode.as_str().to_string()),
                                offset: Some(i64::from(settings.offset)),
                            },
                        )
                    })
                    .collect(),
            ),
            schedule: Some(
                config
                    .schedule
                    .iter()
                    .map(|e| (format_schedule_key(e.minute_of_day), i64::from(e.brightness)))
                    .collect(),
            ),
            curve: Some(
                config
                    .curve
                    .iter()
                    .map(|p| CurvePointFile {
                        lux: p.lux,
                        brightness: i64::from(p.brightness),
                    })
                    .collect(),
            ),
        }
    }
}

/// Parse an `HH:MM` schedule key into minutes since midnight.
fn parse_schedule_key(key: &str) -> Option<u16> {
    let (hour, minute) = key.split_once(':')?;
    let hour: u16 = hour.parse().ok()?;
    let minute: u16 = minute.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(hour * 60 + minute)
}

fn format_schedule_key(minute_of_day: u16) -> String {
    format!("{:02}:{:02}", minute_of_day / 60, minute_of_day % 60)
}
