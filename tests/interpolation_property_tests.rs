//! Property tests for the schedule and sensor-curve interpolation math.

use proptest::prelude::*;

use ddcbright::source::{CurvePoint, ScheduleEntry, ScheduleSource, SensorSource};

/// Generate a sorted, deduplicated schedule with at least two entries.
fn schedule_strategy() -> impl Strategy<Value = Vec<ScheduleEntry>> {
    proptest::collection::btree_map(0u16..1440, 0u8..=100, 2..10).prop_map(|map| {
        map.into_iter()
            .map(|(minute_of_day, brightness)| ScheduleEntry {
                minute_of_day,
                brightness,
            })
            .collect()
    })
}

/// Generate a calibration curve with at least two distinct lux points.
fn curve_strategy() -> impl Strategy<Value = Vec<CurvePoint>> {
    proptest::collection::btree_map(0u32..100_000, 0u8..=100, 2..8).prop_map(|map| {
        map.into_iter()
            .map(|(lux, brightness)| CurvePoint {
                lux: f64::from(lux) / 10.0,
                brightness,
            })
            .collect()
    })
}

proptest! {
    /// Interpolated schedule brightness never leaves the range spanned by
    /// the configured entries.
    #[test]
    fn schedule_output_stays_within_entry_range(
        entries in schedule_strategy(),
        now in 0u16..1440,
    ) {
        let min = entries.iter().map(|e| e.brightness).min().unwrap();
        let max = entries.iter().map(|e| e.brightness).max().unwrap();
        let source = ScheduleSource::new(entries);

        let value = source.brightness_at(now).unwrap();
        prop_assert!(value >= min && value <= max,
            "brightness {value} outside [{min}, {max}] at minute {now}");
    }

    /// Exactly at a non-wrapping entry's time, the schedule returns that
    /// entry's configured brightness.
    #[test]
    fn schedule_hits_entries_exactly(entries in schedule_strategy()) {
        let source = ScheduleSource::new(entries.clone());
        for entry in entries.iter().skip(1) {
            prop_assert_eq!(
                source.brightness_at(entry.minute_of_day),
                Some(entry.brightness)
            );
        }
    }

    /// Before the first entry and after the last, the schedule holds the
    /// last entry's brightness (overnight wrap).
    #[test]
    fn schedule_wraps_to_last_entry(entries in schedule_strategy()) {
        let source = ScheduleSource::new(entries.clone());
        let first = entries.first().unwrap();
        let last = entries.last().unwrap();

        prop_assert_eq!(source.brightness_at(first.minute_of_day), Some(last.brightness));
        if first.minute_of_day > 0 {
            prop_assert_eq!(source.brightness_at(0), Some(last.brightness));
        }
        if last.minute_of_day < 1439 {
            prop_assert_eq!(source.brightness_at(1439), Some(last.brightness));
        }
    }

    /// Between two adjacent entries the schedule is monotonic in the
    /// direction of the segment.
    #[test]
    fn schedule_is_monotonic_between_entries(entries in schedule_strategy()) {
        let source = ScheduleSource::new(entries.clone());
        for pair in entries.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let mut previous = None;
            for minute in (a.minute_of_day + 1)..=b.minute_of_day {
                let value = source.brightness_at(minute).unwrap();
                if let Some(previous) = previous {
                    if a.brightness <= b.brightness {
                        prop_assert!(value >= previous);
                    } else {
                        prop_assert!(value <= previous);
                    }
                }
                previous = Some(value);
            }
        }
    }

    /// Curve output never leaves the range spanned by the configured
    /// points, including lux readings beyond either end.
    #[test]
    fn curve_output_stays_within_point_range(
        points in curve_strategy(),
        lux in 0.0f64..20_000.0,
    ) {
        let min = points.iter().map(|p| p.brightness).min().unwrap();
        let max = points.iter().map(|p| p.brightness).max().unwrap();
        let source = SensorSource::new(points, 5.0);

        let value = source.brightness_for_lux(lux);
        prop_assert!(value >= min && value <= max,
            "brightness {value} outside [{min}, {max}] at {lux} lux");
    }

    /// Lux readings below the first point clamp to its brightness, and
    /// readings above the last point clamp to the last one's.
    #[test]
    fn curve_clamps_at_both_ends(points in curve_strategy()) {
        let source = SensorSource::new(points, 5.0);
        let first = source.points().first().copied().unwrap();
        let last = source.points().last().copied().unwrap();

        prop_assert_eq!(source.brightness_for_lux(first.lux), first.brightness);
        prop_assert_eq!(source.brightness_for_lux(last.lux + 1.0), last.brightness);
        if first.lux > 0.0 {
            prop_assert_eq!(source.brightness_for_lux(0.0), first.brightness);
        }
    }
}
