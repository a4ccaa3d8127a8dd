use super::*;
use crate::logger::Log;
use serial_test::serial;

fn parse(text: &str) -> Config {
    Log::set_enabled(false);
    let file: ConfigFile = toml::from_str(text).unwrap();
    file.sanitize()
}

#[test]
fn full_config_round_trips() {
    let config = parse(
        r#"
hysteresis = 8.5
start_minimized = true
show_brightness_in_tray = true

[monitors."/dev/i2c-4"]
mode = "sensor"
offset = 5

[monitors."/dev/i2c-6"]
mode = "follow"
offset = -10

[schedule]
"09:00" = 70
"19:00" = 50

[[curve]]
lux = 0.0
brightness = 20

[[curve]]
lux = 1000.0
brightness = 100
"#,
    );

    assert_eq!(config.hysteresis, 8.5);
    assert!(config.start_minimized);
    assert_eq!(config.monitors.len(), 2);
    assert_eq!(
        config.monitor_settings("/dev/i2c-4").mode,
        crate::monitor::AutoMode::Sensor
    );
    assert_eq!(config.monitor_settings("/dev/i2c-6").offset, -10);
    assert_eq!(config.schedule.len(), 2);
    assert_eq!(config.schedule[0].minute_of_day, 540);
    assert_eq!(config.curve.len(), 2);

    // Serialize and re-sanitize: identical.
    let text = toml::to_string_pretty(&ConfigFile::from_config(&config)).unwrap();
    assert_eq!(parse(&text), config);
}

#[test]
fn empty_config_yields_defaults() {
    let config = parse("");
    assert_eq!(config.hysteresis, 5.0);
    assert!(!config.start_minimized);
    assert!(config.monitors.is_empty());
    assert!(config.schedule.is_empty());
    assert!(config.curve.is_empty());
}

#[test]
fn out_of_range_hysteresis_falls_back() {
    assert_eq!(parse("hysteresis = 300.0").hysteresis, 5.0);
    assert_eq!(parse("hysteresis = -1.0").hysteresis, 5.0);
}

#[test]
fn unknown_mode_falls_back_to_disabled() {
    let config = parse(
        r#"
[monitors."/dev/i2c-4"]
mode = "psychic"
"#,
    );
    assert_eq!(
        config.monitor_settings("/dev/i2c-4").mode,
        crate::monitor::AutoMode::Disabled
    );
}

#[test]
fn stored_offset_is_clamped() {
    let config = parse(
        r#"
[monitors."/dev/i2c-4"]
offset = 999
"#,
    );
    assert_eq!(config.monitor_settings("/dev/i2c-4").offset, 20);
}

#[test]
fn bad_schedule_entries_are_skipped_individually() {
    let config = parse(
        r#"
[schedule]
"09:00" = 70
"25:00" = 50
"nine" = 60
"12:30" = 150
"#,
    );
    assert_eq!(config.schedule.len(), 1);
    assert_eq!(config.schedule[0].minute_of_day, 540);
    assert_eq!(config.schedule[0].brightness, 70);
}

#[test]
fn short_curve_falls_back_to_default() {
    let config = parse(
        r#"
[[curve]]
lux = 0.0
brightness = 20
"#,
    );
    // Empty stored curve means "use the built-in default".
    assert!(config.curve.is_empty());
    assert_eq!(config.sensor_source().points().len(), 5);
}

#[test]
fn negative_lux_points_are_dropped() {
    let config = parse(
        r#"
[[curve]]
lux = -5.0
brightness = 20

[[curve]]
lux = 0.0
brightness = 30

[[curve]]
lux = 100.0
brightness = 60
"#,
    );
    assert_eq!(config.curve.len(), 2);
    assert_eq!(config.curve[0].lux, 0.0);
}

#[test]
#[serial]
fn load_from_path_survives_unparsable_file() {
    Log::set_enabled(false);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ddcbright.toml");
    std::fs::write(&path, "this is { not toml").unwrap();

    let config = load_from_path(&path);
    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn save_and_reload_preserves_settings() {
    Log::set_enabled(false);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ddcbright.toml");

    let mut config = Config::default();
    config.set_monitor_mode("/dev/i2c-4", crate::monitor::AutoMode::Schedule);
    config.set_monitor_offset("/dev/i2c-4", 12);
    config.schedule.push(crate::source::ScheduleEntry {
        minute_of_day: 540,
        brightness: 70,
    });
    save_to_path(&config, &path).unwrap();

    let reloaded = load_from_path(&path);
    assert_eq!(reloaded.monitor_settings("/dev/i2c-4").mode, crate::monitor::AutoMode::Schedule);
    assert_eq!(reloaded.monitor_settings("/dev/i2c-4").offset, 12);
    assert_eq!(reloaded.schedule, config.schedule);
}
