//! Report fan-out.
//!
//! Every user-visible line goes to the local console first and then to
//! the wireless peer, with identical text.

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, LineSink};

/// [`EventSink`] that renders [`AppEvent::report_line`] to two line sinks.
pub struct ReportSink<C, W> {
    console: C,
    wireless: W,
}

impl<C: LineSink, W: LineSink> ReportSink<C, W> {
    pub fn new(console: C, wireless: W) -> Self {
        Self { console, wireless }
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    pub fn wireless(&self) -> &W {
        &self.wireless
    }

    pub fn wireless_mut(&mut self) -> &mut W {
        &mut self.wireless
    }
}

impl<C: LineSink, W: LineSink> EventSink for ReportSink<C, W> {
    fn emit(&mut self, event: &AppEvent) {
        if let Some(line) = event.report_line() {
            let ending = event.line_ending();
            self.console.write_line(&line, ending);
            self.wireless.write_line(&line, ending);
        }
    }
}
