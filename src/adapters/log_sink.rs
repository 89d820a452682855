//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART in production).  Runs alongside
//! the report sink; it never produces user-facing lines.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { angle, sensor } => {
                info!("START | door={}\u{00b0} | sensor={}", angle, sensor);
            }
            AppEvent::DoorMoving { from, to } => {
                info!("DOOR | moving {}\u{00b0} -> {}\u{00b0}", from, to);
            }
            AppEvent::DoorOpened { angle } => {
                info!("DOOR | opened at {}\u{00b0}", angle);
            }
            AppEvent::DoorClosed { angle } => {
                info!("DOOR | closed at {}\u{00b0}", angle);
            }
            AppEvent::SensorReport { sensor, reading } => {
                info!(
                    "CLIMATE | sensor={} | T={:.1}\u{00b0}C | RH={:.1}%",
                    sensor, reading.temperature_c, reading.humidity_pct
                );
            }
            AppEvent::SensorReadFailed { sensor } => {
                warn!("CLIMATE | sensor={} | read failed", sensor);
            }
            AppEvent::CommandIgnored(byte) => {
                debug!("CMD | ignored byte {:#04x}", byte);
            }
        }
    }
}
