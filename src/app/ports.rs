//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DoorController (domain)
//! ```
//!
//! Driven adapters (servo, sensors, serial links, log) implement these
//! traits.  The [`DoorController`](super::service::DoorController) consumes
//! them via generics, so the domain core never touches hardware directly.
//! Timing for blocking motion comes in through `embedded_hal::delay::DelayNs`.

use super::events::{AppEvent, LineEnding};
use crate::sensors::{ClimateSample, SensorId};

// ───────────────────────────────────────────────────────────────
// Actuator port (domain → servo)
// ───────────────────────────────────────────────────────────────

/// Absolute-position servo output.  Open-loop: no feedback.
pub trait ServoPort {
    fn write_angle(&mut self, degrees: u8);
}

// ───────────────────────────────────────────────────────────────
// Climate port (sensors → domain)
// ───────────────────────────────────────────────────────────────

/// On-demand temperature / humidity polling.
pub trait ClimatePort {
    /// Read `sensor` now.  A failed read returns NaN in either field
    /// (see [`ClimateSample::FAILED`]).
    fn read(&mut self, sensor: SensorId) -> ClimateSample;
}

// ───────────────────────────────────────────────────────────────
// Command source (wireless link → domain)
// ───────────────────────────────────────────────────────────────

/// Byte-at-a-time input stream.
pub trait CommandSource {
    /// Consume one byte if any is available.  Never blocks.
    fn poll_byte(&mut self) -> Option<u8>;
}

// ───────────────────────────────────────────────────────────────
// Output ports (domain → console / wireless / log)
// ───────────────────────────────────────────────────────────────

/// A text output that takes whole lines.  `line` carries no terminator;
/// the sink writes `ending` after it.
pub trait LineSink {
    fn write_line(&mut self, line: &str, ending: LineEnding);
}

/// The domain emits structured [`AppEvent`]s through this port.  Adapters
/// decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

/// Fan one event out to two sinks, in order.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &AppEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: &AppEvent) {
        (**self).emit(event);
    }
}

impl<S: LineSink + ?Sized> LineSink for &mut S {
    fn write_line(&mut self, line: &str, ending: LineEnding) {
        (**self).write_line(line, ending);
    }
}
