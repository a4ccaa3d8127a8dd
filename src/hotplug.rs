//! Hotplug notifications from udev.
//!
//! A dedicated thread watches the device-event stream for the subsystems
//! that carry monitor connectivity: `drm` (display connectors), `usb`
//! (docks and adapters), and `i2c` (the DDC buses themselves). Add and
//! remove actions are forwarded into the control channel; everything else
//! is ignored. Failure to open the udev socket degrades to "no hotplug
//! events" with a warning, it never stops the daemon.

use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use crate::core::ControlEvent;

const WATCHED_SUBSYSTEMS: [&str; 3] = ["drm", "usb", "i2c"];

/// Spawn the udev monitor thread. The thread exits when the receiving
/// side of the channel is dropped.
pub fn spawn_hotplug_monitor(events: Sender<ControlEvent>) {
    thread::spawn(move || {
        let socket = udev::MonitorBuilder::new()
            .and_then(|builder| {
                WATCHED_SUBSYSTEMS
                    .iter()
                    .try_fold(builder, |b, subsystem| b.match_subsystem(subsystem))
            })
            .and_then(|b| b.listen());

        let socket = match socket {
            Ok(socket) => socket,
            Err(e) => {
                log_pipe!();
                log_warning!("Could not open udev monitor: {e}");
                log_decorated!("Monitor hotplug will not be detected automatically");
                return;
            }
        };

        loop {
            for event in socket.iter() {
                let forwarded = match event.event_type() {
                    udev::EventType::Add => events.send(ControlEvent::HotplugAdded),
                    udev::EventType::Remove => events.send(ControlEvent::HotplugRemoved),
                    _ => Ok(()),
                };
                if forwarded.is_err() {
                    return;
                }
            }
            // The socket is non-blocking; idle between polls.
            thread::sleep(Duration::from_millis(200));
        }
    });
}
