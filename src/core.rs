//! Core control loop: one thread, two tick cadences, one event channel.
//!
//! The loop owns all mutable state (registry, detection controller,
//! dispatcher, transition engine) and interleaves three time sources:
//!
//! - the slow dispatch tick (60s) re-evaluates every monitor's source,
//! - the fast transition tick (0.5s) steps brightness toward targets,
//! - the detection controller's retry deadline, when one is pending.
//!
//! Between deadlines the loop blocks on `recv_timeout` over the control
//! channel, which the signal, hotplug, and backlight-watch threads feed.
//! All hardware I/O happens as blocking calls on this thread; dispatcher
//! writes therefore happen-before the next transition tick reads them,
//! and the registry is never mutated concurrently.
//!
//! Presentation collaborators read registry state between ticks and push
//! changes through the command methods (`set_monitor_mode`,
//! `set_manual_brightness`, `request_refresh`); they never touch timers.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Instant;

use anyhow::Result;
use chrono::{Local, Timelike};

use crate::backlight::LaptopBacklight;
use crate::config::Config;
use crate::constants::{BRIGHTNESS_UNKNOWN, DISPATCH_INTERVAL, TRANSITION_INTERVAL};
use crate::detection::{DetectionController, DetectionState, MonitorProbe};
use crate::dispatcher::ModeDispatcher;
use crate::monitor::{AutoMode, MonitorRegistry};
use crate::sensor::AmbientLightSensor;
use crate::source::Readings;
use crate::transition::TransitionEngine;
use crate::transport::{DdcTransport, read_monitor};

/// Events delivered to the control loop from helper threads and
/// collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Terminate the loop cleanly.
    Shutdown,
    /// A device appeared on a display-related bus.
    HotplugAdded,
    /// A device disappeared from a display-related bus.
    HotplugRemoved,
    /// The companion backlight's brightness attribute changed.
    BacklightChanged,
}

/// Everything the core needs, bundled to keep the constructor readable.
pub struct CoreParams {
    pub transport: Box<dyn DdcTransport>,
    pub probe: Box<dyn MonitorProbe>,
    pub config: Config,
    pub sensor: Option<AmbientLightSensor>,
    pub backlight: Option<LaptopBacklight>,
    pub events: Receiver<ControlEvent>,
    pub debug_enabled: bool,
}

pub struct Core {
    transport: Box<dyn DdcTransport>,
    controller: DetectionController,
    registry: MonitorRegistry,
    dispatcher: ModeDispatcher,
    engine: TransitionEngine,
    config: Config,
    sensor: Option<AmbientLightSensor>,
    backlight: Option<LaptopBacklight>,
    events: Receiver<ControlEvent>,
    debug_enabled: bool,
    next_dispatch: Instant,
    next_transition: Instant,
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        let dispatcher = ModeDispatcher::new(
            params.config.schedule_source(),
            params.config.sensor_source(),
        );
        let now = Instant::now();
        Self {
            transport: params.transport,
            controller: DetectionController::new(params.probe),
            registry: MonitorRegistry::new(),
            dispatcher,
            engine: TransitionEngine::new(),
            config: params.config,
            sensor: params.sensor,
            backlight: params.backlight,
            events: params.events,
            debug_enabled: params.debug_enabled,
            next_dispatch: now,
            next_transition: now + TRANSITION_INTERVAL,
        }
    }

    pub fn registry(&self) -> &MonitorRegistry {
        &self.registry
    }

    pub fn detection_state(&self) -> DetectionState {
        self.controller.state()
    }

    /// Run until shutdown. Never returns an error for hardware trouble;
    /// everything degrades to "skip this cycle" or "demote one monitor".
    pub fn run(mut self) -> Result<()> {
        if self.controller.start(&mut self.registry, Instant::now()) {
            self.apply_settings();
        }

        loop {
            let now = Instant::now();

            if self.controller.poll(&mut self.registry, now) {
                // Registry was rebuilt; fresh records need their settings
                // back and an immediate evaluation.
                self.apply_settings();
                self.dispatch(now_minutes());
            }

            if now >= self.next_dispatch {
                self.dispatch(now_minutes());
                self.next_dispatch = now + DISPATCH_INTERVAL;
            }

            if now >= self.next_transition {
                self.transition_tick();
                self.next_transition = now + TRANSITION_INTERVAL;
            }

            let deadline = self.next_deadline();
            let timeout = deadline.saturating_duration_since(Instant::now());
            match self.events.recv_timeout(timeout) {
                Ok(ControlEvent::Shutdown) => break,
                Ok(event) => self.handle_event(event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        log_block_start!("Shutting down");
        Ok(())
    }

    /// Change a monitor's auto mode: persist it, apply it, and evaluate
    /// once immediately instead of waiting for the next slow tick.
    pub fn set_monitor_mode(&mut self, device_path: &str, mode: AutoMode) {
        self.config.set_monitor_mode(device_path, mode);
        if let Err(e) = crate::config::loading::save(&self.config) {
            log_pipe!();
            log_warning!("Could not save configuration: {e}");
        }

        // Mode activation re-reads schedule and calibration from config.
        self.dispatcher = ModeDispatcher::new(
            self.config.schedule_source(),
            self.config.sensor_source(),
        );

        let readings = self.gather_readings();
        let minutes = now_minutes();
        if let Some(monitor) = self.registry.get_mut(device_path) {
            monitor.auto_mode = mode;
            if mode != AutoMode::Disabled {
                self.dispatcher.evaluate_monitor(monitor, minutes, &readings);
            }
        }
    }

    /// Manual brightness override: replaces any pending target and lets
    /// the transition engine walk the hardware there.
    pub fn set_manual_brightness(&mut self, device_path: &str, value: u8) {
        if let Some(monitor) = self.registry.get_mut(device_path) {
            monitor.target_brightness = i16::from(value.min(100));
        }
    }

    /// Explicit re-probe request. Returns false when no monitors were
    /// found, so the caller can tell the user instead of silently waiting.
    pub fn request_refresh(&mut self) -> bool {
        let found = self.controller.manual_refresh(&mut self.registry);
        if found {
            self.apply_settings();
            self.dispatch(now_minutes());
        }
        found
    }

    fn next_deadline(&self) -> Instant {
        let mut deadline = self.next_dispatch.min(self.next_transition);
        if let Some(retry) = self.controller.next_deadline() {
            deadline = deadline.min(retry);
        }
        deadline
    }

    fn handle_event(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::HotplugAdded => {
                if self.debug_enabled {
                    log_pipe!();
                    log_debug!("Hotplug add event");
                }
                self.controller.on_hotplug_added(Instant::now());
            }
            ControlEvent::HotplugRemoved => {
                if self.debug_enabled {
                    log_pipe!();
                    log_debug!("Hotplug remove event");
                }
                self.controller.on_hotplug_removed(Instant::now());
            }
            ControlEvent::BacklightChanged => self.evaluate_follow_monitors(),
            ControlEvent::Shutdown => unreachable!("handled by the run loop"),
        }
    }

    /// Evaluate every monitor's active source once.
    fn dispatch(&mut self, minutes: u16) {
        let readings = self.gather_readings();
        self.dispatcher
            .evaluate_all(&mut self.registry, minutes, &readings);
    }

    /// Out-of-cycle evaluation for follow-main monitors only, triggered
    /// by a backlight change notification.
    fn evaluate_follow_monitors(&mut self) {
        let readings = self.gather_readings();
        let minutes = now_minutes();
        for monitor in self.registry.iter_mut() {
            if monitor.available && monitor.auto_mode == AutoMode::FollowMain {
                self.dispatcher.evaluate_monitor(monitor, minutes, &readings);
            }
        }
    }

    fn transition_tick(&mut self) {
        let outcome = self.engine.tick(self.transport.as_ref(), &mut self.registry);
        if !outcome.failed.is_empty()
            && self.controller.refresh_after_failure(&mut self.registry)
        {
            self.apply_settings();
        }
    }

    /// Re-apply persisted per-monitor settings to freshly probed records
    /// and prime their current brightness with a hardware read. A failed
    /// read leaves the sentinel in place; the transition engine then jumps
    /// on the first successful write instead of ramping.
    fn apply_settings(&mut self) {
        for monitor in self.registry.iter_mut() {
            let settings = self.config.monitor_settings(&monitor.device_path);
            monitor.auto_mode = settings.mode;
            monitor.set_brightness_offset(settings.offset);

            if monitor.available && monitor.current_brightness == BRIGHTNESS_UNKNOWN {
                match read_monitor(self.transport.as_ref(), monitor) {
                    Ok(value) => monitor.current_brightness = i16::from(value),
                    Err(e) => {
                        log_pipe!();
                        log_warning!(
                            "Initial brightness read failed for {}: {e}",
                            monitor.display_name
                        );
                    }
                }
            }
        }
    }

    /// Read the sensor and backlight once for this evaluation cycle.
    fn gather_readings(&self) -> Readings {
        let lux = self.sensor.as_ref().and_then(|sensor| match sensor.read_lux() {
            Ok(lux) => Some(lux),
            Err(e) => {
                if self.debug_enabled {
                    log_pipe!();
                    log_debug!("Sensor read failed: {e}");
                }
                None
            }
        });
        let backlight_percent =
            self.backlight
                .as_ref()
                .and_then(|backlight| match backlight.read_percent() {
                    Ok(percent) => Some(percent),
                    Err(e) => {
                        if self.debug_enabled {
                            log_pipe!();
                            log_debug!("Backlight read failed: {e}");
                        }
                        None
                    }
                });

        Readings {
            lux,
            backlight_percent,
        }
    }
}

/// Current local time as minutes since midnight.
fn now_minutes() -> u16 {
    let now = Local::now();
    (now.hour() * 60 + now.minute()) as u16
}
