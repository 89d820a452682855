//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`ServoDriver`] and the [`SensorBank`], exposing them through
//! [`ServoPort`] and [`ClimatePort`].  This is the only module in the
//! system that touches actual hardware.  The drivers are generic over
//! `embedded-hal` traits, so host tests plug in mock pins instead.
//!
//! Driver errors stop here: a failed PWM write is logged and the door
//! command completes anyway (open-loop servo), and a failed sensor read
//! becomes [`ClimateSample::FAILED`].

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::{ClimatePort, ServoPort};
use crate::drivers::servo::ServoDriver;
use crate::error::SensorError;
use crate::sensors::{ClimateSample, SensorBank, SensorId};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<S, P, D> {
    servo: ServoDriver<S>,
    sensors: SensorBank<P>,
    /// Microsecond-accurate delay for the DHT22 bit timing.
    bit_delay: D,
}

impl<S, P, D> HardwareAdapter<S, P, D>
where
    S: SetDutyCycle,
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(servo: ServoDriver<S>, sensors: SensorBank<P>, bit_delay: D) -> Self {
        Self {
            servo,
            sensors,
            bit_delay,
        }
    }

    /// Release the sensor data lines.
    pub fn begin(&mut self) -> Result<(), SensorError> {
        self.sensors.begin()
    }

    /// Angle last written to the servo, if any.
    pub fn servo_angle(&self) -> Option<u8> {
        self.servo.angle()
    }
}

// ── ServoPort implementation ──────────────────────────────────

impl<S, P, D> ServoPort for HardwareAdapter<S, P, D>
where
    S: SetDutyCycle,
{
    fn write_angle(&mut self, degrees: u8) {
        if let Err(e) = self.servo.set_angle(degrees) {
            warn!("Servo write {}° failed: {}", degrees, e);
        }
    }
}

// ── ClimatePort implementation ────────────────────────────────

impl<S, P, D> ClimatePort for HardwareAdapter<S, P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn read(&mut self, sensor: SensorId) -> ClimateSample {
        let result = self.sensors.read(sensor, &mut self.bit_delay);
        if let Err(e) = result {
            warn!("DHT22 #{} read error: {}", sensor, e);
        }
        ClimateSample::from(result)
    }
}
