//! Shutdown signal handling.
//!
//! A signal-hook iterator thread translates SIGTERM, SIGINT, and SIGHUP
//! into a shutdown event on the control channel, so the main loop can
//! finish its current tick and release the lock file cleanly.

use std::sync::mpsc::Sender;
use std::thread;

use anyhow::Result;
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
};

use crate::core::ControlEvent;

pub fn setup_signal_handler(events: Sender<ControlEvent>) -> Result<()> {
    let mut signals = Signals::new([SIGTERM, SIGINT, SIGHUP])?;

    thread::spawn(move || {
        for signal in signals.forever() {
            log_block_start!("Received signal {signal}, shutting down");
            if events.send(ControlEvent::Shutdown).is_err() {
                break;
            }
        }
    });

    Ok(())
}
