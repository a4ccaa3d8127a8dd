//! Transition engine: gradual brightness stepping on the fast tick.
//!
//! Every tick, each monitor with a pending target moves exactly one unit
//! toward it, so changes are perceptually smooth (never more than 1% per
//! half second) and a target is reached in exactly `|current - target|`
//! ticks with no overshoot. The one exception is a monitor whose current
//! brightness is still unknown, which jumps straight to its target in a
//! single write.
//!
//! A failed write demotes the monitor and records its device path; the
//! caller triggers the failure refresh only after the iteration, and then
//! re-resolves monitors by device path, so no handle is held across a
//! registry rebuild.

use crate::constants::BRIGHTNESS_UNKNOWN;
use crate::monitor::MonitorRegistry;
use crate::transport::{DdcTransport, write_monitor};

/// What one fast tick did.
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// Monitors whose write failed this tick, by device path. The caller
    /// should trigger a failure refresh when this is non-empty.
    pub failed: Vec<String>,
    /// Number of successful hardware steps taken.
    pub steps: usize,
}

#[derive(Debug, Default)]
pub struct TransitionEngine;

impl TransitionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Step every transitioning monitor once, in registry order.
    pub fn tick(&self, transport: &dyn DdcTransport, registry: &mut MonitorRegistry) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        for monitor in registry.iter_mut() {
            if monitor.target_brightness == BRIGHTNESS_UNKNOWN || !monitor.available {
                continue;
            }
            if monitor.target_brightness == monitor.current_brightness {
                monitor.target_brightness = BRIGHTNESS_UNKNOWN;
                continue;
            }

            let target = monitor.target_brightness;
            let next = if monitor.current_brightness == BRIGHTNESS_UNKNOWN {
                // Unknown starting point: no meaningful ramp, jump straight there.
                target
            } else if target > monitor.current_brightness {
                monitor.current_brightness + 1
            } else {
                monitor.current_brightness - 1
            };

            match write_monitor(transport, monitor, next as u8) {
                Ok(()) => {
                    outcome.steps += 1;
                    if monitor.current_brightness == target {
                        monitor.target_brightness = BRIGHTNESS_UNKNOWN;
                        log_block_start!(
                            "{} reached {}%",
                            monitor.display_name,
                            monitor.current_brightness
                        );
                    }
                }
                Err(e) => {
                    log_pipe!();
                    log_warning!(
                        "Brightness write failed for {}: {e}",
                        monitor.display_name
                    );
                    outcome.failed.push(monitor.device_path.clone());
                }
            }
        }

        outcome
    }
}
