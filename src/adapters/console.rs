//! Local debug console.
//!
//! On ESP-IDF, stdout is routed to UART0 at 115200 baud, so plain
//! `println!` reaches the USB serial monitor.  On the host it is the
//! terminal.

use std::io::Write;

use crate::app::events::LineEnding;
use crate::app::ports::LineSink;

/// [`LineSink`] that prints each line to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    lines: u32,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `line` followed by its terminator, then flush.
    fn write_to(out: &mut impl Write, line: &str, ending: LineEnding) -> std::io::Result<()> {
        out.write_all(line.as_bytes())?;
        out.write_all(ending.as_str().as_bytes())?;
        out.flush()
    }

    /// Lines written since startup.
    pub fn lines_written(&self) -> u32 {
        self.lines
    }
}

impl LineSink for ConsoleSink {
    fn write_line(&mut self, line: &str, ending: LineEnding) {
        // A console write failure has nowhere else to be reported.
        let _ = Self::write_to(&mut std::io::stdout().lock(), line, ending);
        self.lines = self.lines.wrapping_add(1);
    }
}
