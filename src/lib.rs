//! # ddcbright Library
//!
//! Internal library for the ddcbright binary. It exists so the control
//! logic can be tested without the binary's process plumbing (lock file,
//! signal handlers, CLI dispatch).
//!
//! ## Architecture
//!
//! - **Core Loop**: `core` owns all mutable state and interleaves the
//!   fast transition tick, the slow dispatch tick, and detection retries
//!   on a single thread fed by an event channel
//! - **Hardware**: `transport` wraps the `ddccontrol` subprocess behind
//!   a trait, `discovery` probes the bus and classifies internal panels,
//!   `detection` runs the retry and debounce state machine
//! - **Brightness Sources**: `source` holds the schedule, ambient-sensor,
//!   and follow-main policies behind one trait; `dispatcher` routes each
//!   monitor to its active source
//! - **Peripherals**: `sensor` (IIO ambient light), `backlight` (laptop
//!   panel readback plus change watching), `hotplug` (udev events)
//! - **Configuration**: `config` for TOML settings with per-field
//!   fallback on invalid values
//! - **Infrastructure**: logging, signal handling, lock file, CLI args

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod backlight;
pub mod config;
pub mod constants;
pub mod core;
pub mod detection;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod hotplug;
pub mod lock;
pub mod monitor;
pub mod sensor;
pub mod signals;
pub mod source;
pub mod transition;
pub mod transport;

pub use crate::core::{ControlEvent, Core, CoreParams};
pub use monitor::{AutoMode, Monitor, MonitorRegistry};
