//! Binary entry point: CLI dispatch and process plumbing.
//!
//! Everything interesting lives in the library; this file parses the
//! command line, claims the single-instance lock, wires up the helper
//! threads (signals, hotplug, backlight watch), and hands control to
//! [`ddcbright::Core`].

use std::sync::mpsc;

use anyhow::Result;

use ddcbright::args::{self, CliAction, ParsedArgs};
use ddcbright::backlight::LaptopBacklight;
use ddcbright::discovery::MonitorDiscovery;
use ddcbright::logger::Log;
use ddcbright::sensor::AmbientLightSensor;
use ddcbright::transport::Ddccontrol;
use ddcbright::{
    Core, CoreParams, config, hotplug, lock, log_block_start, log_end, log_version, signals,
};

fn main() -> Result<()> {
    let parsed_args = ParsedArgs::parse(std::env::args().skip(1));

    match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(1);
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
            log_file,
        } => run(debug_enabled, config_dir, log_file),
    }
}

fn run(debug_enabled: bool, config_dir: Option<String>, log_file: Option<String>) -> Result<()> {
    // The guard keeps the writer thread alive for the whole run.
    let _file_logger = log_file.map(Log::start_file_logging).transpose()?;

    log_version!();

    if let Some(dir) = config_dir {
        config::set_config_dir(dir);
    }

    let _lock = lock::acquire_lock()?;

    let config = config::load()?;
    config.log_config();

    let (events_tx, events_rx) = mpsc::channel();
    signals::setup_signal_handler(events_tx.clone())?;
    hotplug::spawn_hotplug_monitor(events_tx.clone());

    let sensor = AmbientLightSensor::detect();
    match &sensor {
        Some(sensor) => {
            log_block_start!(
                "Ambient light sensor: {}",
                sensor.device_path().display()
            );
        }
        None => {
            log_block_start!("No ambient light sensor found");
        }
    }

    let backlight = LaptopBacklight::detect();
    // Keep the inotify watcher alive for the whole run.
    let _backlight_watcher = match &backlight {
        Some(backlight) => {
            log_block_start!(
                "Laptop backlight: {}",
                backlight.device_path().display()
            );
            Some(backlight.watch(events_tx.clone())?)
        }
        None => {
            log_block_start!("No laptop backlight found");
            None
        }
    };

    let core = Core::new(CoreParams {
        transport: Box::new(Ddccontrol::new()),
        probe: Box::new(MonitorDiscovery::new()),
        config,
        sensor,
        backlight,
        events: events_rx,
        debug_enabled,
    });
    core.run()?;

    log_end!();
    Ok(())
}
