//! Fuzz target: `DoorController::handle_command`
//!
//! Feeds arbitrary byte streams through the controller in both motion
//! modes and asserts that the door only ever rests at the open or closed
//! angle and that no servo write leaves that range.
//!
//! cargo fuzz run fuzz_command_stream

#![no_main]

use embedded_hal::delay::DelayNs;
use libfuzzer_sys::fuzz_target;
use medbox::app::commands::Command;
use medbox::app::events::AppEvent;
use medbox::app::ports::{ClimatePort, EventSink, ServoPort};
use medbox::app::service::DoorController;
use medbox::config::{MotionMode, SystemConfig};
use medbox::sensors::{ClimateSample, SensorId};

struct Rig {
    max_written: u8,
}

impl ServoPort for Rig {
    fn write_angle(&mut self, degrees: u8) {
        self.max_written = self.max_written.max(degrees);
    }
}

impl ClimatePort for Rig {
    fn read(&mut self, sensor: SensorId) -> ClimateSample {
        match sensor {
            SensorId::Two => ClimateSample::FAILED,
            _ => ClimateSample::new(40.0, 20.0),
        }
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

struct Lines(usize);

impl EventSink for Lines {
    fn emit(&mut self, event: &AppEvent) {
        if event.report_line().is_some() {
            self.0 += 1;
        }
    }
}

fuzz_target!(|data: &[u8]| {
    for mode in [MotionMode::Blocking, MotionMode::Ticked] {
        let config = SystemConfig {
            motion_mode: mode,
            ..SystemConfig::default()
        };
        let mut ctl = DoorController::new(&config);
        let mut rig = Rig { max_written: 0 };
        let mut sink = Lines(0);
        ctl.start(&mut rig, &mut NoDelay, &mut sink);

        let mut now = 0u64;
        for &byte in data {
            ctl.handle_command(Command::decode(byte), &mut rig, &mut NoDelay, &mut sink);
            ctl.tick(now, &mut rig, &mut sink);
            now += 7;
        }
        while ctl.tick(now, &mut rig, &mut sink) {
            now += 20;
        }

        assert!(matches!(ctl.current_angle(), 0 | 90));
        assert!(rig.max_written <= 90);
        assert!(sink.0 <= data.len());
    }
});
