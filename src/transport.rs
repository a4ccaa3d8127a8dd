//! Hardware transport: brightness reads and writes through `ddccontrol`.
//!
//! This is the only boundary that touches real hardware. The subprocess
//! call blocks the control-loop thread; at DDC/CI bus latencies of tens of
//! milliseconds that is acceptable, but a hung `ddccontrol` stalls the
//! loop (documented limitation, no timeout is applied).

use std::process::{Command, Stdio};

use regex::Regex;

use crate::constants::VCP_BRIGHTNESS;
use crate::error::TransportError;
use crate::monitor::Monitor;

/// Read/write of one monitor's brightness, abstracted so tests can
/// substitute a fake that never spawns a subprocess.
pub trait DdcTransport {
    /// Read the current brightness (0-100) of the monitor at `device_path`.
    fn read(&self, device_path: &str) -> Result<u8, TransportError>;

    /// Write a brightness value (0-100) to the monitor at `device_path`.
    fn write(&self, device_path: &str, value: u8) -> Result<(), TransportError>;
}

/// Production transport shelling out to the `ddccontrol` utility.
pub struct Ddccontrol {
    value_regex: Regex,
}

impl Ddccontrol {
    pub fn new() -> Self {
        Self {
            // "Control 0x10: +/<current>/<max> [...]"
            value_regex: Regex::new(r"Control 0x10: \+/(\d+)/(\d+)")
                .expect("brightness regex is valid"),
        }
    }

    /// Parse one `ddccontrol -r` output blob into the current brightness.
    fn parse_read_output(&self, output: &str) -> Result<u8, TransportError> {
        for line in output.lines() {
            if let Some(caps) = self.value_regex.captures(line) {
                let current: i32 = caps[1].parse().map_err(|_| TransportError::Unparsable)?;
                if !(0..=100).contains(&current) {
                    return Err(TransportError::OutOfRange(current));
                }
                return Ok(current as u8);
            }
        }
        Err(TransportError::Unparsable)
    }
}

impl Default for Ddccontrol {
    fn default() -> Self {
        Self::new()
    }
}

impl DdcTransport for Ddccontrol {
    fn read(&self, device_path: &str) -> Result<u8, TransportError> {
        let output = Command::new("ddccontrol")
            .arg("-r")
            .arg(VCP_BRIGHTNESS)
            .arg(format!("dev:{device_path}"))
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(TransportError::ExitStatus(
                output.status.code().unwrap_or(-1),
            ));
        }

        self.parse_read_output(&String::from_utf8_lossy(&output.stdout))
    }

    fn write(&self, device_path: &str, value: u8) -> Result<(), TransportError> {
        let output = Command::new("ddccontrol")
            .arg("-r")
            .arg(VCP_BRIGHTNESS)
            .arg("-w")
            .arg(value.to_string())
            .arg(format!("dev:{device_path}"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(TransportError::ExitStatus(
                output.status.code().unwrap_or(-1),
            ));
        }

        Ok(())
    }
}

/// Read a monitor's brightness, demoting it to unavailable on failure.
pub fn read_monitor(
    transport: &dyn DdcTransport,
    monitor: &mut Monitor,
) -> Result<u8, TransportError> {
    match transport.read(&monitor.device_path) {
        Ok(value) => Ok(value),
        Err(e) => {
            monitor.available = false;
            Err(e)
        }
    }
}

/// Write a monitor's brightness with the redundant-command skip.
///
/// If `value` already equals the last value the hardware accepted, the
/// subprocess is not invoked at all. `current_brightness` is updated only
/// on a successful write; failure demotes the monitor to unavailable.
pub fn write_monitor(
    transport: &dyn DdcTransport,
    monitor: &mut Monitor,
    value: u8,
) -> Result<(), TransportError> {
    if i16::from(value) == monitor.current_brightness {
        return Ok(());
    }

    match transport.write(&monitor.device_path, value) {
        Ok(()) => {
            monitor.current_brightness = i16::from(value);
            Ok(())
        }
        Err(e) => {
            monitor.available = false;
            Err(e)
        }
    }
}
