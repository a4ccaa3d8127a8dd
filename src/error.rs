//! Error taxonomy for the brightness engine.
//!
//! None of these abort the process. A `TransportError` demotes a single
//! monitor to unavailable and triggers re-detection, a `DiscoveryError`
//! surfaces as "no monitors found", and a `SensorError` skips one
//! evaluation cycle while the previous target stays in place.

use thiserror::Error;

/// Failure talking to one monitor through the external DDC utility.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to run ddccontrol: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("ddccontrol exited with status {0}")]
    ExitStatus(i32),
    #[error("could not parse brightness from ddccontrol output")]
    Unparsable,
    #[error("brightness value {0} out of range 0-100")]
    OutOfRange(i32),
}

/// Failure probing for monitors.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("ddccontrol not found in PATH")]
    ToolMissing,
    #[error("failed to run ddccontrol -p: {0}")]
    Probe(#[from] std::io::Error),
}

/// Ambient light sensor or companion backlight read failure.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("unparsable value in {0}")]
    Parse(String),
}
