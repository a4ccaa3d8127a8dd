//! Mode dispatcher: periodic evaluation of each monitor's active source.
//!
//! Runs on the slow tick over every monitor in registry order. The
//! dispatcher never writes hardware; it only stores the chosen source's
//! answer as the monitor's transition target, which the transition engine
//! then walks toward on the fast tick. A mode change gets one immediate
//! out-of-cycle evaluation instead of waiting for the next tick.

use crate::monitor::{AutoMode, Monitor, MonitorRegistry};
use crate::source::{BrightnessSource, FollowSource, Readings, ScheduleSource, SensorSource};

pub struct ModeDispatcher {
    schedule: ScheduleSource,
    sensor: SensorSource,
    follow: FollowSource,
}

impl ModeDispatcher {
    pub fn new(schedule: ScheduleSource, sensor: SensorSource) -> Self {
        Self {
            schedule,
            sensor,
            follow: FollowSource,
        }
    }

    pub fn schedule(&self) -> &ScheduleSource {
        &self.schedule
    }

    pub fn schedule_mut(&mut self) -> &mut ScheduleSource {
        &mut self.schedule
    }

    pub fn sensor(&self) -> &SensorSource {
        &self.sensor
    }

    /// Replace the sensor calibration (curve edit or hysteresis change).
    pub fn set_sensor(&mut self, sensor: SensorSource) {
        self.sensor = sensor;
    }

    /// Evaluate every available monitor with a non-disabled mode.
    pub fn evaluate_all(
        &self,
        registry: &mut MonitorRegistry,
        now_minutes: u16,
        readings: &Readings,
    ) {
        for monitor in registry.iter_mut() {
            if monitor.available {
                self.evaluate_monitor(monitor, now_minutes, readings);
            }
        }
    }

    /// Evaluate one monitor, storing the result as its transition target.
    pub fn evaluate_monitor(&self, monitor: &mut Monitor, now_minutes: u16, readings: &Readings) {
        let source: &dyn BrightnessSource = match monitor.auto_mode {
            AutoMode::Disabled => return,
            AutoMode::Schedule => &self.schedule,
            AutoMode::Sensor => &self.sensor,
            AutoMode::FollowMain => &self.follow,
        };

        if let Some(target) = source.compute_target(monitor, now_minutes, readings) {
            if i16::from(target) != monitor.target_brightness {
                log_block_start!(
                    "{} mode set target {target}% for {}",
                    monitor.auto_mode.as_str(),
                    monitor.display_name
                );
            }
            monitor.target_brightness = i16::from(target);
        }
    }
}

impl Default for ModeDispatcher {
    fn default() -> Self {
        Self::new(ScheduleSource::default(), SensorSource::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::Log;
    use crate::source::ScheduleEntry;

    fn dispatcher() -> ModeDispatcher {
        ModeDispatcher::new(
            ScheduleSource::new(vec![
                ScheduleEntry {
                    minute_of_day: 540,
                    brightness: 70,
                },
                ScheduleEntry {
                    minute_of_day: 780,
                    brightness: 90,
                },
            ]),
            SensorSource::default(),
        )
    }

    #[test]
    fn disabled_monitors_are_left_alone() {
        Log::set_enabled(false);
        let mut monitor = Monitor::new("/dev/i2c-4", "Test");
        dispatcher().evaluate_monitor(&mut monitor, 660, &Readings::default());
        assert_eq!(monitor.target_brightness, -1);
    }

    #[test]
    fn schedule_mode_stores_target_without_touching_current() {
        Log::set_enabled(false);
        let mut monitor = Monitor::new("/dev/i2c-4", "Test");
        monitor.auto_mode = AutoMode::Schedule;
        monitor.current_brightness = 30;

        // 11:00 -> halfway through 9:00..13:00 -> 80
        dispatcher().evaluate_monitor(&mut monitor, 660, &Readings::default());
        assert_eq!(monitor.target_brightness, 80);
        assert_eq!(monitor.current_brightness, 30);
    }

    #[test]
    fn source_returning_none_keeps_previous_target() {
        Log::set_enabled(false);
        let mut monitor = Monitor::new("/dev/i2c-4", "Test");
        monitor.auto_mode = AutoMode::FollowMain;
        monitor.target_brightness = 55;

        // No backlight reading: follow proposes nothing.
        dispatcher().evaluate_monitor(&mut monitor, 0, &Readings::default());
        assert_eq!(monitor.target_brightness, 55);
    }

    #[test]
    fn unavailable_monitors_are_skipped_in_bulk_evaluation() {
        Log::set_enabled(false);
        let mut registry = MonitorRegistry::new();
        let mut up = Monitor::new("/dev/i2c-4", "Up");
        up.auto_mode = AutoMode::Schedule;
        let mut down = Monitor::new("/dev/i2c-5", "Down");
        down.auto_mode = AutoMode::Schedule;
        down.available = false;
        registry.replace(vec![up, down]);

        dispatcher().evaluate_all(&mut registry, 660, &Readings::default());
        assert_eq!(registry.get("/dev/i2c-4").unwrap().target_brightness, 80);
        assert_eq!(registry.get("/dev/i2c-5").unwrap().target_brightness, -1);
    }
}
