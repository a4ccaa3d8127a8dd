//! Detection controller: discovery retries, hotplug re-probes, and the
//! "monitors found?" status.
//!
//! The controller is the only component with a retry state machine:
//!
//! ```text
//! Idle -> Searching(attempt 1..=3) -> Found | NotFound
//! ```
//!
//! A failed startup probe schedules re-probes at +30s, then +60s and +90s
//! after the previous attempt (t0+30, t0+90, t0+180). When the third
//! attempt fails the controller goes `NotFound` and stops scheduling; only
//! an external trigger (hotplug add, manual refresh) restarts it. All
//! methods take an explicit `now` so tests drive time without sleeping.

use std::time::Instant;

use crate::constants::{DETECTION_RETRY_DELAYS, HOTPLUG_ADD_DEBOUNCE, HOTPLUG_REMOVE_DEBOUNCE};
use crate::error::DiscoveryError;
use crate::monitor::{Monitor, MonitorRegistry};

/// Source of probe results, abstracted so tests can script outcomes.
pub trait MonitorProbe {
    fn probe(&self) -> Result<Vec<Monitor>, DiscoveryError>;
}

impl MonitorProbe for crate::discovery::MonitorDiscovery {
    fn probe(&self) -> Result<Vec<Monitor>, DiscoveryError> {
        self.probe()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionState {
    /// No probe has run yet.
    Idle,
    /// A probe found nothing; re-probes are scheduled with backoff.
    Searching { attempt: u8 },
    /// At least one monitor is in the registry.
    Found,
    /// All automatic retries exhausted; waiting for an external trigger.
    NotFound,
}

/// Why the pending probe was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeKind {
    /// Part of the backoff ladder; a failure advances the attempt counter.
    Attempt(u8),
    /// Hotplug debounce; a failure falls back into the ladder if one was
    /// in progress, otherwise goes straight to `NotFound`.
    Debounce,
}

pub struct DetectionController {
    probe: Box<dyn MonitorProbe>,
    state: DetectionState,
    pending: Option<(Instant, ProbeKind)>,
    /// Held while a failure-triggered refresh runs, so registry population
    /// side effects cannot recursively trigger another refresh.
    refreshing: bool,
}

impl DetectionController {
    pub fn new(probe: Box<dyn MonitorProbe>) -> Self {
        Self {
            probe,
            state: DetectionState::Idle,
            pending: None,
            refreshing: false,
        }
    }

    pub fn state(&self) -> DetectionState {
        self.state
    }

    /// When the next scheduled re-probe is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|(deadline, _)| deadline)
    }

    /// Run the startup probe. Zero monitors enters the backoff ladder.
    pub fn start(&mut self, registry: &mut MonitorRegistry, now: Instant) -> bool {
        let found = self.run_probe(registry);
        if found {
            self.state = DetectionState::Found;
        } else {
            self.enter_searching(1, now, DETECTION_RETRY_DELAYS[0]);
        }
        found
    }

    /// Run the pending probe if its deadline has passed.
    ///
    /// Returns true when a probe actually ran (the registry may have been
    /// repopulated and callers must re-resolve monitors by device path).
    pub fn poll(&mut self, registry: &mut MonitorRegistry, now: Instant) -> bool {
        let Some((deadline, kind)) = self.pending else {
            return false;
        };
        if now < deadline {
            return false;
        }
        self.pending = None;

        let found = self.run_probe(registry);
        if found {
            self.state = DetectionState::Found;
            return true;
        }

        match kind {
            ProbeKind::Attempt(attempt) if (attempt as usize) < DETECTION_RETRY_DELAYS.len() => {
                let next = attempt + 1;
                self.enter_searching(next, now, DETECTION_RETRY_DELAYS[next as usize - 1]);
            }
            ProbeKind::Attempt(_) => {
                log_block_start!("No monitors found after final retry, giving up");
                log_decorated!("Will re-probe on hotplug or manual refresh");
                self.state = DetectionState::NotFound;
            }
            ProbeKind::Debounce => {
                // Resume the ladder if one was in progress, otherwise the
                // hardware really is gone.
                if let DetectionState::Searching { attempt } = self.state {
                    if (attempt as usize) < DETECTION_RETRY_DELAYS.len() {
                        let next = attempt + 1;
                        self.enter_searching(next, now, DETECTION_RETRY_DELAYS[next as usize - 1]);
                    } else {
                        self.state = DetectionState::NotFound;
                    }
                } else {
                    self.state = DetectionState::NotFound;
                }
            }
        }
        true
    }

    /// A display-related device appeared.
    pub fn on_hotplug_added(&mut self, now: Instant) {
        if self.state == DetectionState::NotFound {
            // Restart the ladder from attempt 1, but probe quickly.
            self.state = DetectionState::Searching { attempt: 1 };
            self.pending = Some((now + HOTPLUG_ADD_DEBOUNCE, ProbeKind::Attempt(1)));
        } else {
            self.schedule_debounce(now + HOTPLUG_ADD_DEBOUNCE);
        }
    }

    /// A display-related device disappeared. Re-probe after a short
    /// debounce in every state, regardless of the attempt counter.
    pub fn on_hotplug_removed(&mut self, now: Instant) {
        self.schedule_debounce(now + HOTPLUG_REMOVE_DEBOUNCE);
    }

    /// Explicit refresh request: cancel any pending timer, probe now,
    /// bypass the backoff counter. Returns whether monitors were found so
    /// the caller can surface "no monitors" instead of silently retrying.
    pub fn manual_refresh(&mut self, registry: &mut MonitorRegistry) -> bool {
        self.pending = None;
        let found = self.run_probe(registry);
        self.state = if found {
            DetectionState::Found
        } else {
            DetectionState::NotFound
        };
        found
    }

    /// Refresh triggered from within a failed read/write.
    ///
    /// Guarded against re-entry: if a refresh is already in flight the call
    /// is a no-op returning false. After this returns, any previously held
    /// monitor reference is stale; re-resolve by `device_path`.
    pub fn refresh_after_failure(&mut self, registry: &mut MonitorRegistry) -> bool {
        if self.refreshing {
            return false;
        }
        self.refreshing = true;
        log_block_start!("Hardware I/O failed, re-probing monitors");
        let found = self.manual_refresh(registry);
        if !found {
            log_warning!("Re-probe found no monitors");
        }
        self.refreshing = false;
        found
    }

    fn enter_searching(&mut self, attempt: u8, now: Instant, delay: std::time::Duration) {
        log_block_start!(
            "No monitors found, retrying in {}s (attempt {attempt} of {})",
            delay.as_secs(),
            DETECTION_RETRY_DELAYS.len()
        );
        self.state = DetectionState::Searching { attempt };
        self.pending = Some((now + delay, ProbeKind::Attempt(attempt)));
    }

    fn schedule_debounce(&mut self, deadline: Instant) {
        // An earlier pending deadline wins; a debounce never delays the ladder.
        match self.pending {
            Some((existing, _)) if existing <= deadline => {}
            _ => self.pending = Some((deadline, ProbeKind::Debounce)),
        }
    }

    /// Probe and repopulate the registry wholesale. Returns whether the
    /// new set is non-empty.
    fn run_probe(&mut self, registry: &mut MonitorRegistry) -> bool {
        let was_populated = !registry.is_empty();
        let monitors = match self.probe.probe() {
            Ok(monitors) => monitors,
            Err(e) => {
                log_pipe!();
                log_warning!("Monitor probe failed: {e}");
                Vec::new()
            }
        };

        if monitors.is_empty() {
            if was_populated {
                log_block_start!("All monitors disappeared, clearing registry");
            }
            registry.clear();
            return false;
        }

        log_block_start!("Found {} monitor(s)", monitors.len());
        for monitor in &monitors {
            log_indented!(
                "{}{}",
                monitor.display_name,
                if monitor.is_internal { " [internal]" } else { "" }
            );
        }
        registry.replace(monitors);
        true
    }
}
