//! Integration tests for brightness transitions, detection retries, and
//! per-monitor offset handling, driven without real hardware or sleeps.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use proptest::prelude::*;

use ddcbright::constants::BRIGHTNESS_UNKNOWN;
use ddcbright::detection::{DetectionController, DetectionState, MonitorProbe};
use ddcbright::error::{DiscoveryError, TransportError};
use ddcbright::logger::Log;
use ddcbright::monitor::{Monitor, MonitorRegistry};
use ddcbright::transition::TransitionEngine;
use ddcbright::transport::DdcTransport;

/// Records writes instead of touching hardware.
#[derive(Default)]
struct RecordingTransport {
    writes: RefCell<Vec<(String, u8)>>,
}

impl DdcTransport for RecordingTransport {
    fn read(&self, _device_path: &str) -> Result<u8, TransportError> {
        Ok(50)
    }

    fn write(&self, device_path: &str, value: u8) -> Result<(), TransportError> {
        self.writes.borrow_mut().push((device_path.to_string(), value));
        Ok(())
    }
}

/// Scripted probe results, consumed front to back; the last one repeats.
struct ScriptedProbe {
    results: RefCell<Vec<Vec<Monitor>>>,
}

impl ScriptedProbe {
    fn new(results: Vec<Vec<Monitor>>) -> Self {
        Self {
            results: RefCell::new(results),
        }
    }
}

impl MonitorProbe for ScriptedProbe {
    fn probe(&self) -> Result<Vec<Monitor>, DiscoveryError> {
        let mut results = self.results.borrow_mut();
        if results.len() > 1 {
            Ok(results.remove(0))
        } else {
            Ok(results[0].clone())
        }
    }
}

fn known_monitor(device_path: &str, current: i16, target: i16) -> Monitor {
    let mut monitor = Monitor::new(device_path, format!("Test ({device_path})"));
    monitor.current_brightness = current;
    monitor.target_brightness = target;
    monitor
}

proptest! {
    /// From any known starting brightness, the engine reaches the target
    /// in exactly `|current - target|` steps of exactly one unit each,
    /// then clears the target on the following tick.
    #[test]
    fn transition_converges_one_unit_per_tick(
        current in 0i16..=100,
        target in 0i16..=100,
    ) {
        Log::set_enabled(false);
        let transport = RecordingTransport::default();
        let engine = TransitionEngine::new();
        let mut registry = MonitorRegistry::new();
        registry.replace(vec![known_monitor("/dev/i2c-4", current, target)]);

        let distance = (current - target).unsigned_abs() as usize;
        for _ in 0..distance {
            engine.tick(&transport, &mut registry);
        }

        let monitor = registry.get("/dev/i2c-4").unwrap();
        prop_assert_eq!(monitor.current_brightness, target);

        let writes = transport.writes.borrow().clone();
        prop_assert_eq!(writes.len(), distance);
        let mut expected = current;
        for (_, value) in &writes {
            expected += if target > current { 1 } else { -1 };
            prop_assert_eq!(i16::from(*value), expected);
        }

        // The pending target is cleared on arrival (or on the next tick
        // when there was no distance to cover).
        engine.tick(&transport, &mut registry);
        prop_assert_eq!(
            registry.get("/dev/i2c-4").unwrap().target_brightness,
            BRIGHTNESS_UNKNOWN
        );
    }
}

#[test]
fn unknown_brightness_jumps_in_a_single_write() {
    Log::set_enabled(false);
    let transport = RecordingTransport::default();
    let engine = TransitionEngine::new();
    let mut registry = MonitorRegistry::new();
    registry.replace(vec![known_monitor("/dev/i2c-4", BRIGHTNESS_UNKNOWN, 70)]);

    engine.tick(&transport, &mut registry);

    assert_eq!(registry.get("/dev/i2c-4").unwrap().current_brightness, 70);
    assert_eq!(
        transport.writes.borrow().as_slice(),
        [("/dev/i2c-4".to_string(), 70)]
    );
}

#[test]
fn detection_retries_follow_the_backoff_ladder() {
    Log::set_enabled(false);
    let probe = ScriptedProbe::new(vec![vec![]]);
    let mut controller = DetectionController::new(Box::new(probe));
    let mut registry = MonitorRegistry::new();

    let t0 = Instant::now();
    assert!(!controller.start(&mut registry, t0));
    assert_eq!(controller.state(), DetectionState::Searching { attempt: 1 });
    assert_eq!(controller.next_deadline(), Some(t0 + Duration::from_secs(30)));

    // Nothing happens before the deadline.
    assert!(!controller.poll(&mut registry, t0 + Duration::from_secs(29)));

    assert!(controller.poll(&mut registry, t0 + Duration::from_secs(30)));
    assert_eq!(controller.state(), DetectionState::Searching { attempt: 2 });
    assert_eq!(controller.next_deadline(), Some(t0 + Duration::from_secs(90)));

    assert!(controller.poll(&mut registry, t0 + Duration::from_secs(90)));
    assert_eq!(controller.state(), DetectionState::Searching { attempt: 3 });
    assert_eq!(
        controller.next_deadline(),
        Some(t0 + Duration::from_secs(180))
    );

    // Third failure gives up until an external trigger.
    assert!(controller.poll(&mut registry, t0 + Duration::from_secs(180)));
    assert_eq!(controller.state(), DetectionState::NotFound);
    assert_eq!(controller.next_deadline(), None);
}

#[test]
fn hotplug_add_restarts_an_exhausted_search() {
    Log::set_enabled(false);
    let probe = ScriptedProbe::new(vec![
        vec![],
        vec![],
        vec![],
        vec![],
        vec![known_monitor("/dev/i2c-4", BRIGHTNESS_UNKNOWN, BRIGHTNESS_UNKNOWN)],
    ]);
    let mut controller = DetectionController::new(Box::new(probe));
    let mut registry = MonitorRegistry::new();

    let t0 = Instant::now();
    controller.start(&mut registry, t0);
    controller.poll(&mut registry, t0 + Duration::from_secs(30));
    controller.poll(&mut registry, t0 + Duration::from_secs(90));
    controller.poll(&mut registry, t0 + Duration::from_secs(180));
    assert_eq!(controller.state(), DetectionState::NotFound);

    let plug = t0 + Duration::from_secs(200);
    controller.on_hotplug_added(plug);

    // The debounced probe runs two seconds after the event.
    assert!(!controller.poll(&mut registry, plug + Duration::from_secs(1)));
    assert!(controller.poll(&mut registry, plug + Duration::from_secs(2)));
    assert_eq!(controller.state(), DetectionState::Found);
    assert!(registry.get("/dev/i2c-4").is_some());
}

#[test]
fn follow_offset_clamps_to_supported_range() {
    let mut monitor = known_monitor("/dev/i2c-4", 50, BRIGHTNESS_UNKNOWN);

    monitor.set_brightness_offset(35);
    assert_eq!(monitor.brightness_offset(), 20);

    monitor.set_brightness_offset(-35);
    assert_eq!(monitor.brightness_offset(), -20);

    monitor.set_brightness_offset(7);
    assert_eq!(monitor.brightness_offset(), 7);
}
