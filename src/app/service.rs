//! Door controller, the hexagonal core.
//!
//! [`DoorController`] owns the two pieces of device state (current door
//! angle and selected sensor) and dispatches decoded commands.  All I/O
//! flows through port traits injected at call sites, making the whole
//! controller testable with mock adapters.
//!
//! ```text
//!  CommandSource ──▶ ┌──────────────────────┐ ──▶ EventSink
//!                    │    DoorController    │
//!    ServoPort  ◀──  │  angle · sensor sel  │ ◀── ClimatePort
//!                    └──────────────────────┘
//! ```
//!
//! Door motion runs in one of two modes (see [`MotionMode`]).  In blocking
//! mode the whole ramp executes inside [`DoorController::handle_command`];
//! nothing else is read until it finishes.  In ticked mode the command only
//! installs a [`ServoRamp`] and [`DoorController::tick`] advances it.

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::config::{MotionMode, SystemConfig};
use crate::control::motion::{RampStep, ServoRamp};
use crate::sensors::SensorId;

use super::commands::Command;
use super::events::AppEvent;
use super::ports::{ClimatePort, CommandSource, EventSink, ServoPort};

/// Which end position a motion is heading for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorGoal {
    Open,
    Close,
}

/// A ramp in flight (ticked mode only).
#[derive(Debug, Clone)]
struct ActiveMotion {
    ramp: ServoRamp,
    goal: DoorGoal,
    /// Uptime at which the next step may run; `None` means immediately.
    next_due_ms: Option<u64>,
}

/// The controller orchestrates all domain logic.
pub struct DoorController {
    open_angle: u8,
    close_angle: u8,
    step_degrees: f32,
    step_delay_ms: u32,
    settle_ms: u32,
    mode: MotionMode,

    current_angle: u8,
    selected: SensorId,
    motion: Option<ActiveMotion>,
    commands_handled: u32,
}

impl DoorController {
    /// Construct the controller from configuration.
    ///
    /// The door is assumed closed and sensor 1 selected.  Call
    /// [`start`](Self::start) to actually park the servo.
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            open_angle: config.open_angle,
            close_angle: config.close_angle,
            step_degrees: config.step_degrees,
            step_delay_ms: config.step_delay_ms,
            settle_ms: config.settle_ms,
            mode: config.motion_mode,
            current_angle: config.close_angle,
            selected: SensorId::default(),
            motion: None,
            commands_handled: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive the servo straight to the closed angle and give it time to
    /// get there.  No ramp: the real position is unknown at power-on.
    pub fn start(
        &mut self,
        servo: &mut impl ServoPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) {
        servo.write_angle(self.close_angle);
        delay.delay_ms(self.settle_ms);
        self.current_angle = self.close_angle;
        self.motion = None;
        sink.emit(&AppEvent::Started {
            angle: self.current_angle,
            sensor: self.selected,
        });
        info!(
            "DoorController started: door at {}°, sensor {} selected, {:?} motion",
            self.current_angle, self.selected, self.mode
        );
    }

    // ── Command reader ────────────────────────────────────────

    /// One iteration of the command reader: if a byte is waiting, consume
    /// exactly that byte and dispatch it to completion.
    pub fn poll(
        &mut self,
        rx: &mut impl CommandSource,
        hw: &mut (impl ServoPort + ClimatePort),
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> Option<Command> {
        let byte = rx.poll_byte()?;
        let cmd = Command::decode(byte);
        self.handle_command(cmd, hw, delay, sink);
        Some(cmd)
    }

    /// Execute one decoded command.
    ///
    /// The `hw` parameter satisfies **both** [`ServoPort`] and
    /// [`ClimatePort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn handle_command(
        &mut self,
        cmd: Command,
        hw: &mut (impl ServoPort + ClimatePort),
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) {
        self.commands_handled = self.commands_handled.wrapping_add(1);
        debug!("Command {:?}", cmd);

        match cmd {
            Command::Open => self.drive(DoorGoal::Open, hw, delay, sink),
            Command::Close => self.drive(DoorGoal::Close, hw, delay, sink),
            Command::SelectSensor(id) => {
                self.selected = id;
                self.report(id, hw, sink);
            }
            Command::ReadSelected => self.report(self.selected, hw, sink),
            Command::Unrecognized(byte) => {
                debug!("Ignoring byte {:#04x}", byte);
                sink.emit(&AppEvent::CommandIgnored(byte));
            }
        }
    }

    // ── Door actuator ─────────────────────────────────────────

    fn drive(
        &mut self,
        goal: DoorGoal,
        servo: &mut impl ServoPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) {
        match self.mode {
            MotionMode::Blocking => {
                self.move_blocking(goal, servo, delay, sink);
            }
            MotionMode::Ticked => self.begin_motion(goal, sink),
        }
    }

    /// Run a full ramp to `goal`, sleeping `step_delay_ms` after every
    /// intermediate step.  Returns the number of intermediate steps.
    pub fn move_blocking(
        &mut self,
        goal: DoorGoal,
        servo: &mut impl ServoPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> usize {
        let target = self.angle_for(goal);
        let from = self.current_angle;
        self.motion = None;
        sink.emit(&AppEvent::DoorMoving { from, to: target });

        let mut steps = 0;
        for step in ServoRamp::new(f32::from(from), target, self.step_degrees) {
            servo.write_angle(step.angle());
            if let RampStep::Move(_) = step {
                delay.delay_ms(self.step_delay_ms);
                steps += 1;
            }
        }

        self.arrive(target, goal, sink);
        steps
    }

    /// Install a ramp toward `goal` without moving yet.  A ramp already in
    /// flight is replaced, starting from its last written position and
    /// keeping its step deadline.
    pub fn begin_motion(&mut self, goal: DoorGoal, sink: &mut impl EventSink) {
        let target = self.angle_for(goal);
        let (start, next_due_ms) = self.motion.as_ref().map_or(
            (f32::from(self.current_angle), None),
            |m| (m.ramp.position(), m.next_due_ms),
        );

        sink.emit(&AppEvent::DoorMoving {
            from: start as u8,
            to: target,
        });
        self.motion = Some(ActiveMotion {
            ramp: ServoRamp::new(start, target, self.step_degrees),
            goal,
            next_due_ms,
        });
    }

    /// Advance the ramp in flight by at most one step, if its step period
    /// has elapsed at `now_ms`.  Returns `true` while the door is moving.
    pub fn tick(
        &mut self,
        now_ms: u64,
        servo: &mut impl ServoPort,
        sink: &mut impl EventSink,
    ) -> bool {
        let Some(motion) = self.motion.as_mut() else {
            return false;
        };
        if motion.next_due_ms.is_some_and(|due| now_ms < due) {
            return true;
        }

        match motion.ramp.next() {
            Some(RampStep::Move(angle)) => {
                servo.write_angle(angle);
                motion.next_due_ms = Some(now_ms + u64::from(self.step_delay_ms));
                true
            }
            Some(RampStep::Arrive(angle)) => {
                servo.write_angle(angle);
                let goal = motion.goal;
                self.motion = None;
                self.arrive(angle, goal, sink);
                false
            }
            None => {
                self.motion = None;
                false
            }
        }
    }

    fn arrive(&mut self, target: u8, goal: DoorGoal, sink: &mut impl EventSink) {
        self.current_angle = target;
        info!("Door at {}° ({:?})", target, goal);
        let event = match goal {
            DoorGoal::Open => AppEvent::DoorOpened { angle: target },
            DoorGoal::Close => AppEvent::DoorClosed { angle: target },
        };
        sink.emit(&event);
    }

    fn angle_for(&self, goal: DoorGoal) -> u8 {
        match goal {
            DoorGoal::Open => self.open_angle,
            DoorGoal::Close => self.close_angle,
        }
    }

    // ── Sensor reporter ───────────────────────────────────────

    /// Read `sensor` once and emit either a report or a failure event.
    pub fn report(
        &mut self,
        sensor: SensorId,
        climate: &mut impl ClimatePort,
        sink: &mut impl EventSink,
    ) {
        let event = match climate.read(sensor).validate() {
            Ok(reading) => AppEvent::SensorReport { sensor, reading },
            Err(e) => {
                debug!("Sensor {} sample rejected: {}", sensor, e);
                AppEvent::SensorReadFailed { sensor }
            }
        };
        sink.emit(&event);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Last angle the door arrived at.
    pub fn current_angle(&self) -> u8 {
        self.current_angle
    }

    pub fn selected_sensor(&self) -> SensorId {
        self.selected
    }

    pub fn mode(&self) -> MotionMode {
        self.mode
    }

    /// Whether a ticked ramp is still in flight.
    pub fn is_moving(&self) -> bool {
        self.motion.is_some()
    }

    /// Target of the ramp in flight, if any.
    pub fn motion_target(&self) -> Option<u8> {
        self.motion.as_ref().map(|m| m.ramp.target())
    }

    /// Total commands dispatched since startup (including ignored bytes).
    pub fn commands_handled(&self) -> u32 {
        self.commands_handled
    }
}
