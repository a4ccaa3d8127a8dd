//! Monitor discovery: probing with `ddccontrol -p` and classifying results.
//!
//! The probe output is parsed line by line; one logical record starts at
//! each `Device:` line and is finalized when the next one appears or the
//! input ends. Records without DDC/CI support are discarded. Surviving
//! devices are classified internal when their i2c bus is wired to a
//! built-in DRM connector (eDP/LVDS/DSI); classification failure defaults
//! to external. The final list is stably sorted so external monitors come
//! first, since they are the ones this tool exists to control.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use regex::Regex;

use crate::error::DiscoveryError;
use crate::monitor::Monitor;

/// One raw record parsed out of the probe output.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRecord {
    pub device_path: String,
    pub name: Option<String>,
    pub ddc_supported: bool,
}

/// Parse `ddccontrol -p` output into raw records.
///
/// Lines that fit no known pattern are ignored, so a mangled record
/// corrupts at most itself, never the batch.
pub fn parse_probe_output(output: &str) -> Vec<ProbeRecord> {
    let device_regex = Regex::new(r"Device: dev:(/dev/i2c-\d+)").expect("device regex is valid");
    let name_regex = Regex::new(r"Monitor Name: (.+)").expect("name regex is valid");

    let mut records = Vec::new();
    let mut current: Option<ProbeRecord> = None;

    for line in output.lines() {
        if let Some(caps) = device_regex.captures(line) {
            if let Some(record) = current.take() {
                records.push(record);
            }
            current = Some(ProbeRecord {
                device_path: caps[1].to_string(),
                name: None,
                ddc_supported: false,
            });
            continue;
        }

        let Some(record) = current.as_mut() else {
            continue;
        };

        if line.contains("DDC/CI supported: Yes") {
            record.ddc_supported = true;
        } else if let Some(caps) = name_regex.captures(line) {
            record.name = Some(caps[1].trim().to_string());
        }
    }

    if let Some(record) = current.take() {
        records.push(record);
    }

    records
}

/// Build monitor records from probe records and the set of i2c bus numbers
/// wired to built-in panel connectors.
pub fn assemble_monitors(records: Vec<ProbeRecord>, internal_buses: &HashSet<u32>) -> Vec<Monitor> {
    let mut monitors: Vec<Monitor> = records
        .into_iter()
        .filter(|r| r.ddc_supported)
        .map(|r| {
            let display_name = match &r.name {
                Some(name) => format!("{name} ({})", r.device_path),
                None => format!("Monitor ({})", r.device_path),
            };
            let mut monitor = Monitor::new(&r.device_path, display_name);
            monitor.is_internal = bus_number(&r.device_path)
                .map(|n| internal_buses.contains(&n))
                .unwrap_or(false);
            monitor
        })
        .collect();

    // Stable sort: externals first, relative order preserved in each group.
    monitors.sort_by_key(|m| m.is_internal);
    monitors
}

/// Extract the bus number from a `/dev/i2c-N` device path.
fn bus_number(device_path: &str) -> Option<u32> {
    device_path.rsplit('-').next()?.parse().ok()
}

/// Probes for DDC/CI monitors and classifies internal panels against the
/// DRM connector tree.
pub struct MonitorDiscovery {
    drm_root: PathBuf,
}

impl MonitorDiscovery {
    pub fn new() -> Self {
        Self {
            drm_root: PathBuf::from("/sys/class/drm"),
        }
    }

    /// Use an alternate connector tree root (fake sysfs in tests).
    pub fn with_drm_root(drm_root: impl Into<PathBuf>) -> Self {
        Self {
            drm_root: drm_root.into(),
        }
    }

    /// Run one full probe, producing zero or more monitors.
    pub fn probe(&self) -> Result<Vec<Monitor>, DiscoveryError> {
        let output = Command::new("ddccontrol")
            .arg("-p")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DiscoveryError::ToolMissing
                } else {
                    DiscoveryError::Probe(e)
                }
            })?;

        // ddccontrol -p exits non-zero when it finds nothing; its stdout is
        // still the authoritative record of what it saw.
        let records = parse_probe_output(&String::from_utf8_lossy(&output.stdout));
        let internal_buses = self.internal_bus_numbers();
        Ok(assemble_monitors(records, &internal_buses))
    }

    /// Collect the i2c bus numbers reachable from built-in DRM connectors.
    ///
    /// Any sysfs read failure just leaves buses out of the set, which makes
    /// the affected monitors classify as external.
    pub fn internal_bus_numbers(&self) -> HashSet<u32> {
        let mut buses = HashSet::new();
        let Ok(entries) = std::fs::read_dir(&self.drm_root) else {
            return buses;
        };

        for entry in entries.flatten() {
            let connector = entry.file_name().to_string_lossy().into_owned();
            if !is_builtin_connector(&connector) {
                continue;
            }
            if let Some(bus) = connector_bus_number(&entry.path()) {
                buses.insert(bus);
            }
        }

        buses
    }
}

impl Default for MonitorDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

/// Connector directory names look like `card0-eDP-1`; everything after the
/// card prefix is the connector type.
fn is_builtin_connector(connector: &str) -> bool {
    let Some(rest) = connector
        .strip_prefix("card")
        .and_then(|r| r.split_once('-'))
        .map(|(_, rest)| rest)
    else {
        return false;
    };
    rest.starts_with("eDP") || rest.starts_with("LVDS") || rest.starts_with("DSI")
}

/// Resolve the i2c bus a connector is wired to, via its `ddc` symlink or
/// an `i2c-N` subdirectory.
fn connector_bus_number(connector_dir: &Path) -> Option<u32> {
    let ddc = connector_dir.join("ddc");
    if let Ok(target) = std::fs::read_link(&ddc) {
        if let Some(bus) = target.file_name().and_then(|n| bus_from_name(n.to_str()?)) {
            return Some(bus);
        }
    }
    // Some drivers expose the adapter as a child directory instead.
    for entry in std::fs::read_dir(connector_dir).ok()?.flatten() {
        if let Some(bus) = bus_from_name(&entry.file_name().to_string_lossy()) {
            return Some(bus);
        }
    }
    None
}

fn bus_from_name(name: &str) -> Option<u32> {
    name.strip_prefix("i2c-")?.parse().ok()
}
