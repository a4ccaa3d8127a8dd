//! Ambient light sensor access through the IIO sysfs interface.
//!
//! Detection scans `iio:device*` entries for a name identifying an ambient
//! light sensor and a readable `in_illuminance_raw` attribute.
//! `lux = raw * scale`, with the scale defaulting to 1.0 when the attribute
//! is absent or unparsable.

use std::path::PathBuf;

use crate::error::SensorError;

pub struct AmbientLightSensor {
    device_path: PathBuf,
}

impl AmbientLightSensor {
    /// Detect the first ambient light sensor under `/sys/bus/iio/devices`.
    pub fn detect() -> Option<Self> {
        Self::detect_in("/sys/bus/iio/devices")
    }

    /// Detect against an alternate IIO root (fake sysfs in tests).
    pub fn detect_in(iio_root: impl Into<PathBuf>) -> Option<Self> {
        let iio_root = iio_root.into();
        let entries = std::fs::read_dir(&iio_root).ok()?;

        for entry in entries.flatten() {
            let file_name = entry.file_name();
            if !file_name.to_string_lossy().starts_with("iio:device") {
                continue;
            }
            let device_path = entry.path();
            let Ok(name) = std::fs::read_to_string(device_path.join("name")) else {
                continue;
            };
            let name = name.trim();
            if !(name == "als" || name.contains("light") || name.contains("als")) {
                continue;
            }
            if device_path.join("in_illuminance_raw").is_file() {
                log_block_start!("Light sensor detected: {}", device_path.display());
                return Some(Self { device_path });
            }
        }

        None
    }

    pub fn device_path(&self) -> &std::path::Path {
        &self.device_path
    }

    /// Read the current illuminance in lux.
    pub fn read_lux(&self) -> Result<f64, SensorError> {
        let raw_path = self.device_path.join("in_illuminance_raw");
        let raw_text = std::fs::read_to_string(&raw_path).map_err(|e| SensorError::Read {
            path: raw_path.display().to_string(),
            source: e,
        })?;
        let raw: i64 = raw_text
            .trim()
            .parse()
            .map_err(|_| SensorError::Parse(raw_path.display().to_string()))?;

        Ok(raw as f64 * self.read_scale())
    }

    /// Scale factor, defaulting to 1.0 when missing or unparsable.
    fn read_scale(&self) -> f64 {
        let scale_path = self.device_path.join("in_illuminance_scale");
        match std::fs::read_to_string(&scale_path) {
            Ok(text) => match text.trim().parse::<f64>() {
                Ok(scale) if scale != 0.0 => scale,
                _ => {
                    log_warning!(
                        "Unparsable sensor scale in {}, using 1.0",
                        scale_path.display()
                    );
                    1.0
                }
            },
            Err(_) => 1.0,
        }
    }
}
