//! Companion backlight: the main display's own brightness, read-only.
//!
//! Follow-main mode mirrors the laptop panel's backlight percentage onto
//! external monitors. Detection picks the first usable device under
//! `/sys/class/backlight`; change notifications come from a filesystem
//! watch on the `brightness` attribute.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::core::ControlEvent;
use crate::error::SensorError;

pub struct LaptopBacklight {
    device_path: PathBuf,
    max_brightness: u32,
}

impl LaptopBacklight {
    /// Detect the first backlight device under `/sys/class/backlight`.
    pub fn detect() -> Option<Self> {
        Self::detect_in("/sys/class/backlight")
    }

    /// Detect against an alternate backlight root (fake sysfs in tests).
    pub fn detect_in(root: impl Into<PathBuf>) -> Option<Self> {
        let root = root.into();
        let entries = std::fs::read_dir(&root).ok()?;

        for entry in entries.flatten() {
            let device_path = entry.path();
            let Some(max_brightness) = read_attr(&device_path, "max_brightness") else {
                continue;
            };
            if max_brightness == 0 || read_attr(&device_path, "brightness").is_none() {
                continue;
            }
            log_block_start!(
                "Laptop backlight detected: {} (max {max_brightness})",
                device_path.display()
            );
            return Some(Self {
                device_path,
                max_brightness,
            });
        }

        None
    }

    pub fn device_path(&self) -> &Path {
        &self.device_path
    }

    /// Current backlight level as a percentage (0-100).
    pub fn read_percent(&self) -> Result<u8, SensorError> {
        let path = self.device_path.join("brightness");
        let text = std::fs::read_to_string(&path).map_err(|e| SensorError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let current: u32 = text
            .trim()
            .parse()
            .map_err(|_| SensorError::Parse(path.display().to_string()))?;

        Ok(((current * 100) / self.max_brightness).min(100) as u8)
    }

    /// Watch the brightness attribute and emit `BacklightChanged` events.
    ///
    /// The watcher delivers on its own thread; the closure only forwards
    /// into the control channel. Returns the watcher handle, which must be
    /// kept alive for the watch to stay active.
    pub fn watch(&self, events: Sender<ControlEvent>) -> anyhow::Result<RecommendedWatcher> {
        let brightness_path = self.device_path.join("brightness");
        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                if let Ok(event) = result {
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        let _ = events.send(ControlEvent::BacklightChanged);
                    }
                }
            },
            notify::Config::default(),
        )?;
        watcher.watch(&brightness_path, RecursiveMode::NonRecursive)?;
        Ok(watcher)
    }
}

fn read_attr(device_path: &Path, attr: &str) -> Option<u32> {
    std::fs::read_to_string(device_path.join(attr))
        .ok()?
        .trim()
        .parse()
        .ok()
}
