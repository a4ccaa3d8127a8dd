//! Time-of-day schedule source.
//!
//! A schedule is a set of `(minute_of_day, brightness)` entries with unique
//! times, kept sorted ascending. Between two entries the brightness is
//! linearly interpolated; before the first entry and after the last one
//! the schedule wraps to the last entry's value, treating it as cyclic
//! over 24 hours (the stretch before the first entry belongs to the
//! previous day's last value).

use super::{BrightnessSource, Readings, interpolate};
use crate::monitor::Monitor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    /// Minutes since midnight, 0..=1439.
    pub minute_of_day: u16,
    pub brightness: u8,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleSource {
    entries: Vec<ScheduleEntry>,
}

impl ScheduleSource {
    pub fn new(mut entries: Vec<ScheduleEntry>) -> Self {
        entries.sort_by_key(|e| e.minute_of_day);
        entries.dedup_by_key(|e| e.minute_of_day);
        Self { entries }
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// Insert or update the entry at `minute_of_day`, keeping order.
    pub fn set_entry(&mut self, minute_of_day: u16, brightness: u8) {
        match self
            .entries
            .binary_search_by_key(&minute_of_day, |e| e.minute_of_day)
        {
            Ok(i) => self.entries[i].brightness = brightness,
            Err(i) => self.entries.insert(
                i,
                ScheduleEntry {
                    minute_of_day,
                    brightness,
                },
            ),
        }
    }

    pub fn remove_entry(&mut self, minute_of_day: u16) {
        self.entries.retain(|e| e.minute_of_day != minute_of_day);
    }

    /// Brightness for the given minute of day, `None` on an empty schedule.
    pub fn brightness_at(&self, now_minutes: u16) -> Option<u8> {
        let (first, last) = (self.entries.first()?, self.entries.last()?);
        if self.entries.len() == 1 {
            return Some(first.brightness);
        }

        // Before (or at) the first entry and after the last entry the
        // previous day's final value still applies.
        if now_minutes <= first.minute_of_day || now_minutes > last.minute_of_day {
            return Some(last.brightness);
        }

        let next_index = self
            .entries
            .iter()
            .position(|e| now_minutes <= e.minute_of_day)?;
        let next = self.entries[next_index];
        let prev = self.entries[next_index - 1];

        Some(interpolate(
            f64::from(now_minutes),
            f64::from(prev.minute_of_day),
            f64::from(next.minute_of_day),
            prev.brightness,
            next.brightness,
        ))
    }
}

impl BrightnessSource for ScheduleSource {
    fn compute_target(
        &self,
        _monitor: &mut Monitor,
        now_minutes: u16,
        _readings: &Readings,
    ) -> Option<u8> {
        self.brightness_at(now_minutes)
    }
}
