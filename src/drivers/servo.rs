//! Hobby servo driver (SG90 / MG996R class) on a PWM channel.
//!
//! The servo reads the pulse width of a 50 Hz frame: 500 µs is 0°, 2400 µs
//! is 180°, linear in between.  This driver only converts angles to duty
//! values; the channel is configured by the caller (LEDC timer 0, 14-bit,
//! on the ESP32).
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal::pwm::SetDutyCycle`.  On ESP-IDF that is an
//! `esp_idf_hal::ledc::LedcDriver`; on host/test a recording mock.

use embedded_hal::pwm::SetDutyCycle;

use crate::config::{SERVO_MAX_ANGLE, SystemConfig};
use crate::error::ActuatorError;

/// Pulse-width calibration for one servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseRange {
    pub min_us: u32,
    pub max_us: u32,
    pub period_us: u32,
}

impl PulseRange {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            min_us: config.servo_min_pulse_us,
            max_us: config.servo_max_pulse_us,
            period_us: config.servo_period_us(),
        }
    }

    /// Pulse width for `angle`, clamped to the servo's travel.
    pub fn pulse_us(&self, angle: u8) -> u32 {
        let angle = u32::from(angle.min(SERVO_MAX_ANGLE));
        self.min_us + angle * (self.max_us - self.min_us) / u32::from(SERVO_MAX_ANGLE)
    }

    /// Duty register value for `angle` given the channel's full scale.
    pub fn duty(&self, angle: u8, max_duty: u16) -> u16 {
        let duty = u64::from(self.pulse_us(angle)) * u64::from(max_duty)
            / u64::from(self.period_us.max(1));
        duty.min(u64::from(max_duty)) as u16
    }
}

pub struct ServoDriver<P> {
    pwm: P,
    range: PulseRange,
    angle: Option<u8>,
}

impl<P: SetDutyCycle> ServoDriver<P> {
    pub fn new(pwm: P, range: PulseRange) -> Self {
        Self {
            pwm,
            range,
            angle: None,
        }
    }

    /// Command an absolute angle (0-180).
    pub fn set_angle(&mut self, angle: u8) -> Result<(), ActuatorError> {
        let angle = angle.min(SERVO_MAX_ANGLE);
        let duty = self.range.duty(angle, self.pwm.max_duty_cycle());
        self.pwm
            .set_duty_cycle(duty)
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        self.angle = Some(angle);
        Ok(())
    }

    /// Last angle successfully written, if the output is active.
    pub fn angle(&self) -> Option<u8> {
        self.angle
    }
}
