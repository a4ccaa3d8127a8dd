//! Ambient-light sensor source: lux calibration curve with hysteresis.
//!
//! The curve maps lux to brightness by piecewise-linear interpolation,
//! clamped at both ends. Hysteresis is a dead zone around the last
//! *applied* decision's lux (`Monitor::stable_lux`), not a smoothing
//! filter: a reading inside the zone proposes no change at all, and one
//! outside it produces exactly one new decision and moves the zone there.
//! The comparison uses the newest raw reading, so a noisy sample
//! straddling the threshold can still flip the decision; that matches the
//! long-standing behavior and is kept deliberately.

use super::{BrightnessSource, Readings, interpolate};
use crate::constants::{DEFAULT_CURVE, DEFAULT_HYSTERESIS_LUX, HYSTERESIS_RANGE, LUX_UNKNOWN};
use crate::monitor::Monitor;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub lux: f64,
    pub brightness: u8,
}

#[derive(Debug, Clone)]
pub struct SensorSource {
    points: Vec<CurvePoint>,
    hysteresis: f64,
}

impl SensorSource {
    /// Build from calibration points; fewer than two valid points falls
    /// back to the default curve.
    pub fn new(mut points: Vec<CurvePoint>, hysteresis: f64) -> Self {
        points.retain(|p| p.lux >= 0.0);
        points.sort_by(|a, b| a.lux.total_cmp(&b.lux));
        points.dedup_by(|a, b| a.lux == b.lux);
        if points.len() < 2 {
            points = default_curve();
        }
        Self {
            points,
            hysteresis: hysteresis.clamp(HYSTERESIS_RANGE.0, HYSTERESIS_RANGE.1),
        }
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn hysteresis(&self) -> f64 {
        self.hysteresis
    }

    /// Interpolate the curve at `lux`, clamped below the first point and
    /// above the last.
    pub fn brightness_for_lux(&self, lux: f64) -> u8 {
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if lux <= first.lux {
            return first.brightness;
        }
        if lux >= last.lux {
            return last.brightness;
        }

        for pair in self.points.windows(2) {
            if lux <= pair[1].lux {
                return interpolate(
                    lux,
                    pair[0].lux,
                    pair[1].lux,
                    pair[0].brightness,
                    pair[1].brightness,
                );
            }
        }
        last.brightness
    }
}

impl Default for SensorSource {
    fn default() -> Self {
        Self::new(default_curve(), DEFAULT_HYSTERESIS_LUX)
    }
}

fn default_curve() -> Vec<CurvePoint> {
    DEFAULT_CURVE
        .iter()
        .map(|&(lux, brightness)| CurvePoint { lux, brightness })
        .collect()
}

impl BrightnessSource for SensorSource {
    fn compute_target(
        &self,
        monitor: &mut Monitor,
        _now_minutes: u16,
        readings: &Readings,
    ) -> Option<u8> {
        let lux = readings.lux?;

        // First evaluation, or the reading left the dead zone: make one
        // decision and anchor the zone at this lux.
        if monitor.stable_lux == LUX_UNKNOWN || (lux - monitor.stable_lux).abs() > self.hysteresis {
            monitor.stable_lux = lux;
            return Some(self.brightness_for_lux(lux));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_point_source(hysteresis: f64) -> SensorSource {
        SensorSource::new(
            vec![
                CurvePoint {
                    lux: 0.0,
                    brightness: 20,
                },
                CurvePoint {
                    lux: 200.0,
                    brightness: 70,
                },
                CurvePoint {
                    lux: 1000.0,
                    brightness: 100,
                },
            ],
            hysteresis,
        )
    }

    #[test]
    fn curve_interpolates_between_points() {
        // 20 + (100/200) * (70-20) = 45
        assert_eq!(three_point_source(5.0).brightness_for_lux(100.0), 45);
    }

    #[test]
    fn curve_clamps_at_both_ends() {
        let source = three_point_source(5.0);
        assert_eq!(source.brightness_for_lux(-10.0), 20);
        assert_eq!(source.brightness_for_lux(0.0), 20);
        assert_eq!(source.brightness_for_lux(5000.0), 100);
    }

    #[test]
    fn too_few_points_falls_back_to_default_curve() {
        let source = SensorSource::new(
            vec![CurvePoint {
                lux: 10.0,
                brightness: 50,
            }],
            5.0,
        );
        assert_eq!(source.points().len(), 5);
        assert_eq!(source.brightness_for_lux(0.0), 20);
    }

    #[test]
    fn first_evaluation_always_decides() {
        let source = three_point_source(5.0);
        let mut monitor = Monitor::new("/dev/i2c-4", "Test");
        let readings = Readings {
            lux: Some(100.0),
            backlight_percent: None,
        };

        assert_eq!(source.compute_target(&mut monitor, 0, &readings), Some(45));
        assert_eq!(monitor.stable_lux, 100.0);
    }

    #[test]
    fn readings_inside_dead_zone_propose_nothing() {
        let source = three_point_source(5.0);
        let mut monitor = Monitor::new("/dev/i2c-4", "Test");
        let decide = |m: &mut Monitor, lux: f64| {
            source.compute_target(
                m,
                0,
                &Readings {
                    lux: Some(lux),
                    backlight_percent: None,
                },
            )
        };

        assert!(decide(&mut monitor, 100.0).is_some());
        // Within +-5 lux of the applied decision: no change, anchor stays.
        assert_eq!(decide(&mut monitor, 104.9), None);
        assert_eq!(decide(&mut monitor, 95.1), None);
        assert_eq!(decide(&mut monitor, 105.0), None);
        assert_eq!(monitor.stable_lux, 100.0);

        // Outside the zone: one new decision, zone moves.
        assert!(decide(&mut monitor, 106.0).is_some());
        assert_eq!(monitor.stable_lux, 106.0);
    }

    #[test]
    fn missing_reading_proposes_nothing() {
        let source = three_point_source(5.0);
        let mut monitor = Monitor::new("/dev/i2c-4", "Test");
        assert_eq!(
            source.compute_target(&mut monitor, 0, &Readings::default()),
            None
        );
        assert_eq!(monitor.stable_lux, -1.0);
    }

    #[test]
    fn hysteresis_is_clamped_to_range() {
        assert_eq!(three_point_source(-3.0).hysteresis(), 0.0);
        assert_eq!(three_point_source(250.0).hysteresis(), 100.0);
    }
}
